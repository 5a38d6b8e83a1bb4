//! Detached execution for bounded calls.
//!
//! # Responsibilities
//! - Run a processor call on its own task
//! - Let the caller stop waiting without aborting the call
//! - Re-raise a panic from the call on the waiting task
//!
//! # Design Decisions
//! - Dropping the waiting future detaches the task; a late result is discarded
//! - A panic is not a processing failure: it crosses back as a panic so the
//!   worker crashes and supervision takes over

use std::fmt;
use std::future::Future;

/// Spawn `call` and wait for its result.
///
/// If the returned future is dropped (for example because an enclosing
/// timeout fired), the spawned task keeps running to completion.
pub async fn detached<F, T, E>(call: F) -> Result<T, String>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: fmt::Display + Send + 'static,
{
    match tokio::spawn(call).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(format!("processor task cancelled: {e}")),
    }
}
