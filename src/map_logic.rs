//! Transformation stage logic.

use crate::{
  event::Event, operator_context::OperatorContext, operator_logic::OperatorLogic, stream_error::StreamError,
};

type TransformFn = Box<dyn FnMut(&Event) -> Result<Event, StreamError> + Send>;

/// Stage applying a fallible transformation to every event.
///
/// A transformation failure is routed into this operator's own error channel and propagates
/// downstream with the original cause intact.
pub struct MapLogic {
  transform: TransformFn,
}

impl MapLogic {
  /// Creates a transformation stage from the provided function.
  #[must_use]
  pub fn new(transform: impl FnMut(&Event) -> Result<Event, StreamError> + Send + 'static) -> Self {
    Self { transform: Box::new(transform) }
  }
}

impl OperatorLogic for MapLogic {
  fn name(&self) -> &'static str {
    "map"
  }

  fn on_next(&mut self, ctx: &mut OperatorContext<'_>, _from: usize, event: Event) -> Result<(), StreamError> {
    let mapped = (self.transform)(&event)?;
    ctx.emit(mapped);
    Ok(())
  }
}
