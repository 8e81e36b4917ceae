//! Per-call context handed to every gateway call.

use std::future::Future;

use tokio_util::sync::CancellationToken;

/// Carries the cancellation token of one lifecycle call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an externally owned token (e.g. one cancelled on Ctrl-C).
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run `fut` until it completes or the call is cancelled.
    ///
    /// Returns `None` on cancellation; `fut` is dropped at that point.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            out = fut => Some(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_completes_when_not_cancelled() {
        let ctx = CallContext::new();
        assert_eq!(ctx.run(async { 7 }).await, Some(7));
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let token = CancellationToken::new();
        let ctx = CallContext::with_cancellation(token.clone());
        token.cancel();

        let out = ctx.run(std::future::pending::<()>()).await;
        assert!(out.is_none());
        assert!(ctx.is_cancelled());
    }
}
