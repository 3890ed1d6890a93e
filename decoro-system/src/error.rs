use thiserror::Error;

use crate::backend::BackendError;

/// Convenience alias for system-layer results.
pub type SystemResult<T> = Result<T, SystemError>;

/// Error type for the Decoro system layer.
///
/// Only startup preconditions (atom resolution with no windowing-system
/// connection) surface as hard errors; everything reachable from the
/// event path degrades to a logged no-op instead.
#[derive(Error, Debug)]
pub enum SystemError {
    /// A windowing-backend operation failed.
    #[error("Windowing backend error: {0}")]
    Backend(#[from] BackendError),
}
