//! Cancellation scope composition.
//!
//! Every long-running operation takes a [CancellationToken]. A derived
//! scope is cancelled as soon as any of its inputs is: the parent token,
//! an additional token, or a local timeout. Cancelling a derived scope
//! never cancels its parent.
//!
//! Scopes that are derived with a timeout or from a second token keep a
//! small watcher task alive until the scope is cancelled, so callers
//! should cancel them once done (e.g. by holding [CancellationToken::drop_guard]).

use std::time::Duration;

pub use tokio_util::sync::{CancellationToken, DropGuard};

/// Derive a child scope of `parent` that is also cancelled once `timeout`
/// has elapsed.
pub fn with_timeout(
    parent: &CancellationToken,
    timeout: Duration,
) -> CancellationToken {
    let child = parent.child_token();
    let watch = child.clone();
    tokio::task::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(timeout) => watch.cancel(),
            _ = watch.cancelled() => (),
        }
    });
    child
}

/// Derive a child scope of `parent` that is also cancelled when `other`
/// is cancelled.
pub fn joined(
    parent: &CancellationToken,
    other: &CancellationToken,
) -> CancellationToken {
    let child = parent.child_token();
    if other.is_cancelled() {
        child.cancel();
        return child;
    }
    let watch = child.clone();
    let other = other.clone();
    tokio::task::spawn(async move {
        tokio::select! {
            _ = other.cancelled() => watch.cancel(),
            _ = watch.cancelled() => (),
        }
    });
    child
}
