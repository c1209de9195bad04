use common::AccountId;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// The username is already registered.
    #[error("username is already taken")]
    UsernameTaken,

    /// The email address is already registered.
    #[error("email is already registered")]
    EmailTaken,

    /// A required field is blank.
    #[error("{0} must not be blank")]
    BlankField(&'static str),

    /// The email address does not look like one.
    #[error("invalid email address")]
    InvalidEmail,

    /// The phone number has too few or too many digits.
    #[error("invalid phone number")]
    InvalidPhone,

    /// The account does not exist.
    #[error("account not found: {0}")]
    NotFound(AccountId),

    /// An error occurred in the store.
    #[error(transparent)]
    Store(#[from] StoreError),
}
