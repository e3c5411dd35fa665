mod client;
mod diff;
mod mapping;
mod record;

pub use crate::client::{NetBoxClient, NetBoxConfig};
pub use crate::diff::{Fields, diff};
pub use crate::mapping::{
    DEFAULT_STATUS, MappingConfig, MappingConfigError, PlatformTable, VmPayload, normalize_slug,
    platform_display_name,
};
pub use crate::record::{ExistingVm, NewPlatform, Page, Platform};

use pni_http::HttpError;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetBoxError {
    #[error("netbox: {0}")]
    Http(#[from] HttpError),

    #[error("netbox returned a record without a numeric id: {0}")]
    InvalidRecord(Value),
}
