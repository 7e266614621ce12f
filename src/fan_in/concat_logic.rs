
use crate::{
  event::Event, operator_context::OperatorContext, operator_logic::OperatorLogic, stream_error::StreamError,
};

/// Consumes sources strictly in sequence.
///
/// Demand is forwarded only to the active source; source *i + 1* sees its first request after
/// source *i* completed. Per-source completion is an internal signal; the combinator's own
/// completion fires once the last source completed. Sources that completed before becoming
/// active are skipped.
pub struct ConcatLogic {
  active:    usize,
  completed: Vec<bool>,
  pending:   u64,
}

impl ConcatLogic {
  /// Creates a concat over `sources` upstream links.
  #[must_use]
  pub fn new(sources: usize) -> Self {
    Self { active: 0, completed: vec![false; sources], pending: 0 }
  }

  fn advance(&mut self, ctx: &mut OperatorContext<'_>) {
    self.active = self.active.saturating_add(1);
    while self.active < self.completed.len() && self.completed[self.active] {
      self.active = self.active.saturating_add(1);
    }
    if self.active >= self.completed.len() {
      ctx.complete();
    } else if self.pending > 0 {
      ctx.request_upstream(self.active, self.pending);
    }
  }
}

impl OperatorLogic for ConcatLogic {
  fn name(&self) -> &'static str {
    "concat"
  }

  fn on_next(&mut self, ctx: &mut OperatorContext<'_>, from: usize, event: Event) -> Result<(), StreamError> {
    if from != self.active {
      tracing::warn!(from, active = self.active, "event from inactive concat source dropped");
      return Ok(());
    }
    self.pending = self.pending.saturating_sub(1);
    ctx.emit(event);
    Ok(())
  }

  fn on_complete(&mut self, ctx: &mut OperatorContext<'_>, from: usize) -> Result<(), StreamError> {
    if let Some(flag) = self.completed.get_mut(from) {
      *flag = true;
    }
    if from == self.active {
      self.advance(ctx);
    }
    Ok(())
  }

  fn on_request(&mut self, ctx: &mut OperatorContext<'_>, demand: u64) -> Result<(), StreamError> {
    self.pending = self.pending.saturating_add(demand);
    if self.active < self.completed.len() {
      ctx.request_upstream(self.active, demand);
    }
    Ok(())
  }
}
