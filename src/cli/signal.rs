//! Ctrl-C handling
//!
//! Lets the binary stop a session run on interrupt and still fall through to
//! closing the tool host session.

use std::future::Future;

/// How a session run ended
#[derive(Debug, PartialEq, Eq)]
pub enum RunEnd<T> {
    /// The run completed on its own
    Finished(T),
    /// The interrupt fired first; the run was dropped
    Interrupted,
}

/// Drive `work` until it completes or `interrupt` resolves
pub async fn run_until_interrupted<F, I>(work: F, interrupt: I) -> RunEnd<F::Output>
where
    F: Future,
    I: Future<Output = ()>,
{
    tokio::select! {
        output = work => RunEnd::Finished(output),
        _ = interrupt => RunEnd::Interrupted,
    }
}

/// Resolves on Ctrl-C
///
/// Never resolves when the signal cannot be watched.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
