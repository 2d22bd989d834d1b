use serde_json::Value;
use shared::{domain::CallId, error::ProtocolError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelationError {
    #[error("no pending call for response id {id}")]
    UnknownCall { id: CallId },
    #[error("call id {id} is already pending")]
    DuplicateCall { id: CallId },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized request action: {action}")]
pub struct UnrecognizedActionError {
    pub action: String,
}

/// Why an awaited correlated call did not produce a value.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("call rejected by the far side: {0}")]
    Rejected(Value),
    #[error("call abandoned before a response arrived")]
    Abandoned,
    #[error("call {id} timed out")]
    TimedOut { id: CallId },
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Correlation(#[from] CorrelationError),
    #[error(transparent)]
    UnrecognizedAction(#[from] UnrecognizedActionError),
    #[error(transparent)]
    Call(#[from] CallError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("failed to encode boundary payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("boundary channel closed")]
    BoundaryClosed,
    #[error("startup failed: {message}")]
    StartupFatal { message: String },
    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}
