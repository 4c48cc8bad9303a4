use std::time::Duration;

use thiserror::Error;

use crate::rpc::{ApiError, RpcError};
use crate::types::TransactionStatus;

/// Error types for the Chert SDK
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to marshal RPC request: {0}")]
    Marshal(#[source] serde_json::Error),

    #[error("RPC request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("failed to decode RPC response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// Error object returned by the node, unmodified.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// The result payload did not match the expected shape.
    #[error("unexpected RPC result shape: {0}")]
    ResultShape(#[source] serde_json::Error),

    #[error("invalid {0} response")]
    InvalidResponse(String),

    #[error("account does not have a private key")]
    MissingPrivateKey,

    #[error("key derivation error: {0}")]
    KeyDerivation(String),

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("transaction {hash} {status}")]
    TransactionFailed {
        hash: String,
        status: TransactionStatus,
    },

    /// No terminal status was observed within the budget. The transaction
    /// may still be included later; its on-chain outcome is unknown.
    #[error("transaction {hash} confirmation timeout after {waited:?}")]
    ConfirmationTimeout { hash: String, waited: Duration },
}

impl Error {
    /// The node-reported error code, if this is a protocol error.
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            Error::Rpc(err) => Some(err.code),
            _ => None,
        }
    }

    /// Whether the caller's context aborted the operation.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Error::InvalidParameter(format!("invalid hex: {}", err))
    }
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_code_only_for_protocol_errors() {
        let err = Error::Rpc(RpcError {
            code: -32601,
            message: "Method not found".to_string(),
            data: None,
        });
        assert_eq!(err.rpc_code(), Some(-32601));
        assert_eq!(err.to_string(), "JSON-RPC error -32601: Method not found");

        assert_eq!(Error::Cancelled.rpc_code(), None);
        assert!(Error::DeadlineExceeded.is_cancellation());
        assert!(!Error::MissingPrivateKey.is_cancellation());
    }

    #[test]
    fn test_lifecycle_messages() {
        let err = Error::TransactionFailed {
            hash: "0xabc".to_string(),
            status: TransactionStatus::Rejected,
        };
        assert_eq!(err.to_string(), "transaction 0xabc rejected");
        assert_eq!(
            Error::InvalidResponse("transaction".to_string()).to_string(),
            "invalid transaction response"
        );
    }

    #[test]
    fn test_precondition_messages() {
        assert_eq!(
            Error::KeyDerivation("bad length".to_string()).to_string(),
            "key derivation error: bad length"
        );
        assert_eq!(
            Error::Crypto("tag mismatch".to_string()).to_string(),
            "cryptography error: tag mismatch"
        );
        assert_eq!(
            Error::InvalidParameter("timeout".to_string()).to_string(),
            "invalid parameter: timeout"
        );
        assert_eq!(
            Error::MissingPrivateKey.to_string(),
            "account does not have a private key"
        );
    }
}
