//! Pass-through stage logic.

use crate::operator_logic::OperatorLogic;

/// Logic that forwards everything unchanged.
///
/// Used for hot-source slots (which are driven by external pushes, never by upstream
/// deliveries) and for dispatcher hand-off stages.
pub struct PassthroughLogic {
  name: &'static str,
}

impl PassthroughLogic {
  /// Creates a pass-through logic with the given stage name.
  #[must_use]
  pub const fn new(name: &'static str) -> Self {
    Self { name }
  }
}

impl OperatorLogic for PassthroughLogic {
  fn name(&self) -> &'static str {
    self.name
  }
}
