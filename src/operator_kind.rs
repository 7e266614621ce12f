//! Operator slot classification.

/// Kind of an operator slot in the pipeline arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
  /// Externally pushed, multicast, non-buffering origin.
  HotSource,
  /// Single-upstream transformation or side-effect stage.
  Stage,
  /// Multi-upstream combinator (merge, concat, zip, join).
  FanIn,
}

impl OperatorKind {
  /// Returns `true` when a fresh downstream link may be attached after cancellation.
  ///
  /// Push-capable sources qualify as retry rewind targets; pull-only transformation stages do
  /// not, since rewinding them requires the source itself.
  #[must_use]
  pub const fn is_reattachable(&self) -> bool {
    matches!(self, Self::HotSource)
  }
}
