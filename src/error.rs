use thiserror::Error;

use crate::amount::Amount;

/// Shown to the user for every infrastructure failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "Payment failed, please try again.";

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientFunds { available: Amount, requested: Amount },

    #[error("No authenticated user")]
    Unauthenticated,

    #[error("Wallet not found for user {user_id}")]
    WalletNotFound { user_id: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Rollback failed after {original}: {rollback}")]
    RollbackFailed {
        original: Box<LedgerError>,
        rollback: Box<LedgerError>,
    },

    #[error("Notification failed: {message}")]
    NotificationFailed { message: String },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::StoreUnavailable {
            message: err.to_string(),
        }
    }
}

impl LedgerError {
    pub fn invalid_amount(message: impl Into<String>) -> Self {
        Self::InvalidAmount {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn wallet_not_found(user_id: impl Into<String>) -> Self {
        Self::WalletNotFound {
            user_id: user_id.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn notification_failed(message: impl Into<String>) -> Self {
        Self::NotificationFailed {
            message: message.into(),
        }
    }

    /// Only store faults are worth retrying; domain errors will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::StoreUnavailable { .. })
    }

    /// Errors caused by the caller's input or session, reported to the user verbatim.
    pub fn is_domain_error(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidAmount { .. }
                | LedgerError::InsufficientFunds { .. }
                | LedgerError::Unauthenticated
                | LedgerError::InvalidInput { .. }
                | LedgerError::NotFound { .. }
        )
    }

    /// Message safe to present to the end user. Infrastructure detail stays in the log.
    pub fn user_message(&self) -> String {
        if self.is_domain_error() {
            self.to_string()
        } else {
            GENERIC_FAILURE_MESSAGE.to_string()
        }
    }

    /// Unwrap a `RollbackFailed` to the error that triggered the compensation.
    pub fn into_original(self) -> LedgerError {
        match self {
            LedgerError::RollbackFailed { original, .. } => *original,
            other => other,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LedgerError::InvalidAmount { .. } => ErrorSeverity::Low,
            LedgerError::InvalidInput { .. } => ErrorSeverity::Low,
            LedgerError::InsufficientFunds { .. } => ErrorSeverity::Low,
            LedgerError::Unauthenticated => ErrorSeverity::Medium,
            LedgerError::NotFound { .. } => ErrorSeverity::Medium,
            LedgerError::NotificationFailed { .. } => ErrorSeverity::Medium,
            LedgerError::WalletNotFound { .. } => ErrorSeverity::High,
            LedgerError::StoreUnavailable { .. } => ErrorSeverity::High,
            LedgerError::RollbackFailed { .. } => ErrorSeverity::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "LOW"),
            ErrorSeverity::Medium => write!(f, "MEDIUM"),
            ErrorSeverity::High => write!(f, "HIGH"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
