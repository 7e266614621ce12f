//! Operator identifier type.

/// Stable index of an operator slot inside a pipeline arena.
///
/// Identifiers are never reused; back-references such as a retry operator's root are plain
/// index lookups, so the arena holds no cyclic ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperatorId(usize);

impl OperatorId {
  pub(crate) const fn new(index: usize) -> Self {
    Self(index)
  }

  /// Returns the arena index of this operator.
  #[must_use]
  pub const fn index(&self) -> usize {
    self.0
  }
}

impl core::fmt::Display for OperatorId {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(f, "#{}", self.0)
  }
}
