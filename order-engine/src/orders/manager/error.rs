use super::super::storage::StorageError;
use super::super::traits::OrderError;
use crate::auth::AuthError;
use crate::services::{CatalogError, PaymentError};
use shared::order::{CommandError, CommandErrorCode};
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Bad input, illegal transition, minimum order unmet, out of stock...
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    Authorization(String),

    /// Gateway declined, errored or timed out; the placement was rolled back
    #[error("Payment failed: {0}")]
    Payment(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Map a storage error to an error code (clients localize the message)
fn classify_storage_error(e: &StorageError) -> CommandErrorCode {
    if let StorageError::Serialization(_) = e {
        return CommandErrorCode::InternalError;
    }

    // redb errors are classified by message
    let err_str = e.to_string().to_lowercase();

    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
    {
        return CommandErrorCode::StorageFull;
    }

    if err_str.contains("out of memory") || err_str.contains("cannot allocate") {
        return CommandErrorCode::OutOfMemory;
    }

    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return CommandErrorCode::StorageCorrupted;
    }

    // Remaining Database/Transaction/Table/Storage/Commit errors
    CommandErrorCode::SystemBusy
}

impl From<ManagerError> for CommandError {
    fn from(err: ManagerError) -> Self {
        let (code, message) = match err {
            ManagerError::Storage(e) => {
                let code = classify_storage_error(&e);
                let message = e.to_string();
                tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
                (code, message)
            }
            ManagerError::Validation(msg) => (CommandErrorCode::ValidationFailed, msg),
            ManagerError::NotFound(msg) => (CommandErrorCode::NotFound, msg),
            ManagerError::Authorization(msg) => (
                CommandErrorCode::PermissionDenied,
                format!("Permission denied: {}", msg),
            ),
            ManagerError::Payment(msg) => (
                CommandErrorCode::PaymentFailed,
                format!("Payment failed: {}", msg),
            ),
            ManagerError::Internal(msg) => (CommandErrorCode::InternalError, msg),
        };
        CommandError::new(code, message)
    }
}

impl From<OrderError> for ManagerError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation(msg) => ManagerError::Validation(msg),
            OrderError::NotFound(msg) => ManagerError::NotFound(msg),
            OrderError::Authorization(msg) => ManagerError::Authorization(msg),
            OrderError::Payment(msg) => ManagerError::Payment(msg),
            OrderError::Storage(msg) => ManagerError::Internal(msg),
        }
    }
}

impl From<AuthError> for ManagerError {
    fn from(err: AuthError) -> Self {
        ManagerError::Authorization(err.to_string())
    }
}

impl From<CatalogError> for ManagerError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::MenuItemNotFound(_) => ManagerError::NotFound(err.to_string()),
            CatalogError::InsufficientStock { .. } => ManagerError::Validation(err.to_string()),
        }
    }
}

impl From<PaymentError> for ManagerError {
    fn from(err: PaymentError) -> Self {
        ManagerError::Payment(err.to_string())
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
