mod client;
pub mod parse;
mod vm;

pub use crate::client::{ProxmoxClient, ProxmoxConfig};
pub use crate::vm::{CanonicalVm, NodeListItem, VmConfig, VmListItem};

use pni_http::HttpError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxmoxError {
    #[error("proxmox: {0}")]
    Http(#[from] HttpError),
}
