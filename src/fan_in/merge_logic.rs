
use crate::{
  demand_counter::DemandCounter, event::Event, operator_context::OperatorContext, operator_logic::OperatorLogic,
  stream_error::StreamError,
};

/// Interleaves events from every source in arrival order.
///
/// Downstream demand is split across sources deterministically by index so the total never
/// exceeds what downstream asked for. Completion fires only when every source completed; an
/// error from any source terminates the combinator immediately (fail-fast, via the default
/// error forwarding).
pub struct MergeLogic {
  completed: Vec<bool>,
}

impl MergeLogic {
  /// Creates a merge over `sources` upstream links.
  #[must_use]
  pub fn new(sources: usize) -> Self {
    Self { completed: vec![false; sources] }
  }
}

impl OperatorLogic for MergeLogic {
  fn name(&self) -> &'static str {
    "merge"
  }

  fn on_next(&mut self, ctx: &mut OperatorContext<'_>, _from: usize, event: Event) -> Result<(), StreamError> {
    ctx.emit(event);
    Ok(())
  }

  fn on_complete(&mut self, ctx: &mut OperatorContext<'_>, from: usize) -> Result<(), StreamError> {
    if let Some(flag) = self.completed.get_mut(from) {
      *flag = true;
    }
    if self.completed.iter().all(|done| *done) {
      ctx.complete();
    }
    Ok(())
  }

  fn on_request(&mut self, ctx: &mut OperatorContext<'_>, demand: u64) -> Result<(), StreamError> {
    let sources = self.completed.len() as u64;
    if sources == 0 {
      return Ok(());
    }
    if demand == DemandCounter::UNBOUNDED {
      for upstream in 0..self.completed.len() {
        ctx.request_upstream(upstream, DemandCounter::UNBOUNDED);
      }
      return Ok(());
    }
    // Split demand by index so the per-source sum equals the downstream request.
    let base = demand / sources;
    let remainder = demand % sources;
    for upstream in 0..self.completed.len() {
      let extra = u64::from((upstream as u64) < remainder);
      let amount = base + extra;
      if amount > 0 {
        ctx.request_upstream(upstream, amount);
      }
    }
    Ok(())
  }
}
