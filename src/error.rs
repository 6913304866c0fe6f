//! Programmer-facing errors. Field-level runtime failures are data, see
//! [`crate::fill::fill_model::FieldFailure`].

use thiserror::Error;

use crate::dom::NodeId;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Container {0} is not an attached element")]
    InvalidContainer(NodeId),

    #[error("Invalid page snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Invalid value bag: {0}")]
    ValueBag(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
