//! Operator lifecycle states.

/// Lifecycle of an operator slot.
///
/// The terminal transition happens exactly once per attachment; a retry rewind re-arms the
/// slot through a logically new attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorLifecycle {
  /// Created at build time, not yet wired into a running pipeline.
  Unsubscribed,
  /// Attached to its upstream links and accepting deliveries.
  Subscribed,
  /// Completed or errored; no further deliveries happen.
  Terminal,
}

impl OperatorLifecycle {
  /// Returns `true` when the operator reached its terminal state.
  #[must_use]
  pub const fn is_terminal(&self) -> bool {
    matches!(self, Self::Terminal)
  }
}
