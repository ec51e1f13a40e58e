//! Errors raised by the ledger and how the API renders them.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::schemas::MemberId;
use crate::store::StoreError;

/// The first precondition an input failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title is required")]
    MissingTitle,
    #[error("Title must be at most {0} characters")]
    TitleTooLong(usize),
    #[error("Description must be at most {0} characters")]
    DescriptionTooLong(usize),
    #[error("Amount must be greater than 0")]
    NonPositiveAmount,
    #[error("Amount must not exceed {0}")]
    AmountTooLarge(u64),
    #[error("`{0}` is not a valid currency code")]
    InvalidCurrency(String),
    #[error("Conversion rate must not be negative")]
    NegativeRate,
    #[error("Conversion rate must not exceed {0}")]
    RateTooLarge(u64),
    #[error("Converted amount must not exceed {0}")]
    BaseAmountTooLarge(u64),
    #[error("Expenses in {0} cannot carry a conversion rate")]
    BaseCurrencyRate(String),
    #[error("Payer `{0}` is not a member of this group")]
    PayerNotMember(MemberId),
    #[error("An expense must be split between at least one member")]
    EmptySplit,
    #[error("`{0}` appears more than once in the split")]
    DuplicateSplitMember(MemberId),
    #[error("`{0}` is not a member of this group")]
    SplitMemberNotInGroup(MemberId),
    #[error("Group name is required")]
    MissingGroupName,
    #[error("Group name must be at most {0} characters")]
    GroupNameTooLong(usize),
    #[error("Member id is required")]
    MissingMemberId,
    #[error("Display name is required")]
    MissingDisplayName,
    #[error("`{0}` is already a member of this group")]
    AlreadyMember(MemberId),
    #[error("Cannot remove the group creator")]
    CreatorRemoval,
    #[error("Invalid or expired share link")]
    InvalidShareLink,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Not authorized: {0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("{0}")]
    Unauthenticated(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Ledger(err.into())
    }
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Ledger(LedgerError::Validation(_)) => "validation_error",
            ApiError::Ledger(LedgerError::Forbidden(_)) => "forbidden",
            ApiError::Ledger(LedgerError::NotFound(_)) => "not_found",
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::Store(_) => "store_error",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Ledger(LedgerError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(LedgerError::Forbidden(_)) => StatusCode::FORBIDDEN,
            ApiError::Ledger(LedgerError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::Store(err) => {
                tracing::error!(error = %err, "store operation failed");
                "Server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.code(),
            "message": message,
        }))
    }
}
