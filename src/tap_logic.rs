//! Side-effect stage logic.

use crate::{
  event::Event, operator_context::OperatorContext, operator_logic::OperatorLogic, stream_error::StreamError,
};

type EffectFn = Box<dyn FnMut(&Event) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;

/// Side-effect-only stage.
///
/// Runs the injected effect for every event and forwards the event unchanged; an optional
/// completion effect runs before completion is forwarded. The stage never retains or mutates
/// events.
pub struct TapLogic {
  effect:          Option<EffectFn>,
  complete_effect: Option<CompleteFn>,
}

impl TapLogic {
  /// Creates a tap running `effect` for every event.
  #[must_use]
  pub fn new(effect: impl FnMut(&Event) + Send + 'static) -> Self {
    Self { effect: Some(Box::new(effect)), complete_effect: None }
  }

  /// Creates a tap running `effect` when the stream completes.
  #[must_use]
  pub fn on_complete(effect: impl FnMut() + Send + 'static) -> Self {
    Self { effect: None, complete_effect: Some(Box::new(effect)) }
  }
}

impl OperatorLogic for TapLogic {
  fn name(&self) -> &'static str {
    "tap"
  }

  fn on_next(&mut self, ctx: &mut OperatorContext<'_>, _from: usize, event: Event) -> Result<(), StreamError> {
    if let Some(effect) = &mut self.effect {
      effect(&event);
    }
    ctx.emit(event);
    Ok(())
  }

  fn on_complete(&mut self, ctx: &mut OperatorContext<'_>, _from: usize) -> Result<(), StreamError> {
    if let Some(effect) = &mut self.complete_effect {
      effect();
    }
    ctx.complete();
    Ok(())
  }
}
