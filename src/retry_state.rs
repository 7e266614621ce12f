//! Retry operator states.

/// State of a retry operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
  /// Forwarding events.
  Active,
  /// Evaluating a failure.
  Recovering,
  /// Retries exhausted; the failure was forwarded downstream.
  TerminallyFailed,
  /// Upstream completed normally.
  Completed,
}
