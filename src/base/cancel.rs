//! Cooperative cancellation.
//!
//! Long traversals poll a [`CancellationToken`] between top-level nodes.
//! When the token fires, the traversal finishes the node it is visiting and
//! returns [`OperationCancelled`] instead of a partial result.

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Outcome of a traversal that observed a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct OperationCancelled;

/// Checkpoint: fail with [`OperationCancelled`] if `cancel` has fired.
#[inline]
pub fn check_cancelled(cancel: &CancellationToken) -> Result<(), OperationCancelled> {
    if cancel.is_cancelled() {
        tracing::trace!("cancellation observed at checkpoint");
        Err(OperationCancelled)
    } else {
        Ok(())
    }
}
