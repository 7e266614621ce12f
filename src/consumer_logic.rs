//! Terminal subscriber stage logic.

use crate::{
  event::Event, operator_context::OperatorContext, operator_logic::OperatorLogic, signal::Signal,
  stream_error::StreamError,
};

type SignalFn = Box<dyn FnMut(Signal<Event>) + Send>;

/// Terminal stage delivering [`Signal`]s to a subscriber callback.
///
/// The initial demand is requested once at subscribe time; a bounded subscriber therefore
/// receives at most that many events, which is what the demand-invariant tests rely on.
pub struct ConsumerLogic {
  initial_demand: u64,
  callback:       SignalFn,
}

impl ConsumerLogic {
  /// Creates a terminal stage requesting `initial_demand` events at subscribe time.
  #[must_use]
  pub fn new(initial_demand: u64, callback: impl FnMut(Signal<Event>) + Send + 'static) -> Self {
    Self { initial_demand, callback: Box::new(callback) }
  }
}

impl OperatorLogic for ConsumerLogic {
  fn name(&self) -> &'static str {
    "subscriber"
  }

  fn on_subscribe(&mut self, ctx: &mut OperatorContext<'_>) {
    if self.initial_demand > 0 {
      ctx.request_upstream(0, self.initial_demand);
    }
  }

  fn on_next(&mut self, _ctx: &mut OperatorContext<'_>, _from: usize, event: Event) -> Result<(), StreamError> {
    (self.callback)(Signal::Next(event));
    Ok(())
  }

  fn on_complete(&mut self, ctx: &mut OperatorContext<'_>, _from: usize) -> Result<(), StreamError> {
    (self.callback)(Signal::Complete);
    ctx.complete();
    Ok(())
  }

  fn on_error(&mut self, ctx: &mut OperatorContext<'_>, _from: usize, error: StreamError) -> Result<(), StreamError> {
    (self.callback)(Signal::Error(error.clone()));
    ctx.error(error);
    Ok(())
  }
}
