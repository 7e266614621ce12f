#[cfg(test)]
mod tests;

use super::CombineFn;
use crate::{
  event::Event, operator_context::OperatorContext, operator_logic::OperatorLogic, stream_error::StreamError,
};

/// Sampling combination: every new arrival is combined with the most recent value of each
/// other source.
///
/// Unlike [`ZipLogic`](super::ZipLogic), pairing windows are asymmetric; values are retained
/// after a combination is emitted. Completes as soon as any source completes. A combination
/// forming while downstream demand is spent is not emitted (the latest values are kept), and
/// upstream credit is re-granted only while demand remains to back a future combination.
pub struct JoinLogic {
  latest:  Vec<Option<Event>>,
  combine: CombineFn,
  armed:   bool,
  done:    bool,
}

impl JoinLogic {
  /// Creates a join over `sources` upstream links using `combine` to build the output event.
  #[must_use]
  pub fn new(sources: usize, combine: impl FnMut(&[Event]) -> Result<Event, StreamError> + Send + 'static) -> Self {
    Self { latest: (0..sources).map(|_| None).collect(), combine: Box::new(combine), armed: false, done: false }
  }
}

impl OperatorLogic for JoinLogic {
  fn name(&self) -> &'static str {
    "join"
  }

  fn on_resubscribe(&mut self) {
    for slot in &mut self.latest {
      *slot = None;
    }
    self.armed = false;
    self.done = false;
  }

  fn on_next(&mut self, ctx: &mut OperatorContext<'_>, from: usize, event: Event) -> Result<(), StreamError> {
    if self.done {
      return Ok(());
    }
    match self.latest.get_mut(from) {
      | Some(slot) => *slot = Some(event),
      | None => return Ok(()),
    }
    let demand = ctx.downstream_demand();
    let mut emitted = false;
    if demand > 0 && self.latest.iter().all(Option::is_some) {
      let events: Vec<Event> = self.latest.iter().filter_map(|slot| slot.clone()).collect();
      let combined = (self.combine)(&events)?;
      ctx.emit(combined);
      emitted = true;
    }
    // Sampling consumes upstream events freely, but credit is re-granted only while
    // downstream demand remains to back a future combination.
    let remaining = if emitted { demand - 1 } else { demand };
    if remaining > 0 {
      ctx.request_upstream(from, 1);
    }
    Ok(())
  }

  fn on_complete(&mut self, ctx: &mut OperatorContext<'_>, from: usize) -> Result<(), StreamError> {
    let _ = from;
    if !self.done {
      self.done = true;
      ctx.complete();
    }
    Ok(())
  }

  fn on_request(&mut self, ctx: &mut OperatorContext<'_>, demand: u64) -> Result<(), StreamError> {
    let _ = demand;
    if !self.armed && !self.done {
      for upstream in 0..self.latest.len() {
        ctx.request_upstream(upstream, 1);
      }
      self.armed = true;
    }
    Ok(())
  }
}
