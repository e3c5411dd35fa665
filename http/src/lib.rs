use reqwest::{
    Client, Method, RequestBuilder, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, InvalidHeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

const REQUEST_TIMEOUT_SEC: u64 = 30;

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("invalid base url '{url}': {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid authorization header: {0}")]
    Authorization(#[source] InvalidHeaderValue),

    #[error("Failed to build HTTP client: {0}")]
    BuildClient(#[source] reqwest::Error),

    #[error("HTTP request error: {method} {url}: {source}")]
    Request {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {method} {url}: {body}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("failed to decode response from {method} {url}: {source}")]
    Decode {
        method: Method,
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Scheme, host and optional path prefix, e.g. `https://pve.lan:8006/api2/json`.
    pub base_url: String,
    /// Full value of the `Authorization` header.
    pub authorization: String,
    pub verify_tls: bool,
}

/// JSON-over-HTTP client bound to one API base url.
///
/// Every call has a fixed timeout and is attempted exactly once; any
/// non-success status is returned as [`HttpError::Status`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(options: HttpOptions) -> Result<Self, HttpError> {
        let HttpOptions {
            base_url,
            authorization,
            verify_tls,
        } = options;

        let parsed = Url::parse(&base_url).map_err(|source| HttpError::BaseUrl {
            url: base_url.clone(),
            source,
        })?;

        let mut auth = HeaderValue::from_str(&authorization).map_err(HttpError::Authorization)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SEC))
            .default_headers(headers)
            .danger_accept_invalid_certs(!verify_tls)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(HttpError::BuildClient)?;

        Ok(HttpClient {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, HttpError> {
        let url = self.url(path);
        let request = self.client.get(&url).query(query);
        self.send(Method::GET, url, request).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, HttpError> {
        let url = self.url(path);
        let request = self.client.post(&url).json(body);
        self.send(Method::POST, url, request).await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, HttpError> {
        let url = self.url(path);
        let request = self.client.patch(&url).json(body);
        self.send(Method::PATCH, url, request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: String,
        request: RequestBuilder,
    ) -> Result<T, HttpError> {
        debug!(%method, %url, "sending request");

        let resp = match request.send().await {
            Ok(resp) => resp,
            Err(source) => return Err(HttpError::Request { method, url, source }),
        };

        let status = resp.status();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(source) => return Err(HttpError::Request { method, url, source }),
        };

        if !status.is_success() {
            return Err(HttpError::Status {
                method,
                url,
                status,
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| HttpError::Decode {
            method,
            url,
            source,
        })
    }
}
