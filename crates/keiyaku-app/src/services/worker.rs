// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request isolation. Extraction and comparison are blocking (OCR can take
// seconds per page), so each request runs on tokio's blocking pool under a
// deadline.

use std::future::Future;
use std::time::Duration;

use keiyaku_core::KeiyakuError;
use tracing::{error, warn};

/// What a request was doing, which decides the error a timeout becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Extraction,
    Comparison,
}

/// Run `job` on the blocking pool, giving up after `limit`.
///
/// `subject` names the file(s) involved and ends up in the error on timeout
/// or panic. A timed-out job is abandoned, not cancelled: its thread keeps
/// running until the engine returns, so the runtime must be shut down with
/// [`block_on_detached`] for the process to exit promptly.
pub async fn run_isolated<T, F>(
    kind: RequestKind,
    subject: &str,
    limit: Duration,
    job: F,
) -> Result<T, KeiyakuError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, KeiyakuError> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(job);

    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => {
            error!(subject, error = %join_err, "worker failed");
            let reason = if join_err.is_panic() {
                "worker panicked".to_string()
            } else {
                format!("worker was cancelled: {join_err}")
            };
            Err(KeiyakuError::ExtractionFailed {
                path: subject.to_string(),
                reason,
            })
        }
        Err(_) => {
            let limit = format_limit(limit);
            warn!(subject, %limit, ?kind, "request timed out");
            Err(match kind {
                RequestKind::Extraction => KeiyakuError::ExtractionFailed {
                    path: subject.to_string(),
                    reason: format!("timed out after {limit}"),
                },
                RequestKind::Comparison => {
                    KeiyakuError::ComparisonFailed(format!("{subject} timed out after {limit}"))
                }
            })
        }
    }
}

/// `300s`, or `250ms` below a second.
fn format_limit(limit: Duration) -> String {
    if limit.as_secs() == 0 {
        format!("{}ms", limit.as_millis())
    } else if limit.subsec_millis() == 0 {
        format!("{}s", limit.as_secs())
    } else {
        format!("{:.1}s", limit.as_secs_f64())
    }
}

/// Drive `future` to completion on a fresh multi-threaded runtime, then shut
/// the runtime down without waiting for abandoned blocking workers.
pub fn block_on_detached<F: Future>(future: F) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}
