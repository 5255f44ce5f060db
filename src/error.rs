use crate::models::Money;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Serialize)]
pub enum DivvyError {
    /// Split requested with a non-positive amount or an empty participant set
    #[error("Invalid split input: {0}")]
    InvalidSplitInput(String),

    /// Ledger balances do not sum to zero; a conservation violation upstream
    #[error("Unbalanced ledger: residual {0}")]
    UnbalancedLedger(Money),

    /// User with given ID not found
    #[error("User {0} not found")]
    UserNotFound(Uuid),

    /// Group with given ID not found
    #[error("Group {0} not found")]
    GroupNotFound(Uuid),

    /// Expense with given ID not found
    #[error("Expense {0} not found")]
    ExpenseNotFound(Uuid),

    /// User is not a member of the group
    #[error("User {0} is not a group member")]
    NotGroupMember(Uuid),

    /// User is already a member of the group
    #[error("User {0} is already a group member")]
    AlreadyGroupMember(Uuid),

    /// Acting user lacks the role the operation requires
    #[error("Not authorized")]
    NotAuthorized,

    /// Expense has already been soft-deleted
    #[error("Expense {0} already deleted")]
    AlreadyDeleted(Uuid),

    /// Email is already registered
    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),

    /// Email format is invalid
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    /// Amount is not a valid monetary value
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Text field is empty, too long, or contains control characters
    #[error("Invalid input for field `{0}`: {1}")]
    InvalidInput(String, String),

    /// Storage operation failed
    #[error("Storage error: {0}")]
    StorageError(String),
}
