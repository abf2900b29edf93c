use thiserror::Error;

use parley_context::BudgetExceeded;
use parley_providers::{ParamsError, TransportError};
use parley_types::ValidationError;

/// Why a [`Session::send`](crate::Session::send) call failed.
///
/// `Validation` and `Budget` are returned before anything is written or sent.
/// `Params` is returned after the caller's message was appended but before the
/// transport is contacted. `Transport` is returned after whatever streamed so
/// far has been committed.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid message: {0}")]
    Validation(#[from] ValidationError),
    #[error("message does not fit the context budget: {0}")]
    Budget(#[from] BudgetExceeded),
    #[error(transparent)]
    Params(#[from] ParamsError),
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),
}
