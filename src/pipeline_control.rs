//! Control handle returned from subscribing.

use std::sync::Arc;

use crate::{operator_id::OperatorId, pipeline::PipelineCore};

/// Handle over a running pipeline instance.
///
/// Cancellation propagates upstream from the terminal subscriber, is idempotent and safe from
/// any thread; producers whose consumers are all gone are cancelled transitively.
pub struct PipelineControl {
  core: Arc<PipelineCore>,
  tail: OperatorId,
}

impl PipelineControl {
  pub(crate) fn new(core: Arc<PipelineCore>, tail: OperatorId) -> Self {
    Self { core, tail }
  }

  /// Returns the identifier of the terminal subscriber slot.
  #[must_use]
  pub const fn operator_id(&self) -> OperatorId {
    self.tail
  }

  /// Cancels the whole pipeline. Idempotent; never blocks.
  pub fn cancel(&self) {
    self.core.cancel_from(self.tail);
  }

  /// Renders the pipeline topology for diagnostics, one operator per line.
  #[must_use]
  pub fn describe(&self) -> String {
    self.core.describe(self.tail)
  }
}
