
use super::CombineFn;
use crate::{
  event::Event, operator_context::OperatorContext, operator_logic::OperatorLogic, stream_error::StreamError,
};

/// Pairs the *k*-th event of every source positionally.
///
/// Holds at most one pending event per source; once every slot is filled the combined event is
/// emitted and all slots are released. Completes as soon as any source completes, since no
/// further full combination can form (documented policy choice).
pub struct ZipLogic {
  slots:   Vec<Option<Event>>,
  combine: CombineFn,
  armed:   bool,
  done:    bool,
}

impl ZipLogic {
  /// Creates a zip over `sources` upstream links using `combine` to build the output event.
  #[must_use]
  pub fn new(sources: usize, combine: impl FnMut(&[Event]) -> Result<Event, StreamError> + Send + 'static) -> Self {
    Self { slots: (0..sources).map(|_| None).collect(), combine: Box::new(combine), armed: false, done: false }
  }

  fn arm(&mut self, ctx: &mut OperatorContext<'_>) {
    if self.armed || self.done {
      return;
    }
    for upstream in 0..self.slots.len() {
      ctx.request_upstream(upstream, 1);
    }
    self.armed = true;
  }
}

impl OperatorLogic for ZipLogic {
  fn name(&self) -> &'static str {
    "zip"
  }

  fn on_resubscribe(&mut self) {
    for slot in &mut self.slots {
      *slot = None;
    }
    self.armed = false;
    self.done = false;
  }

  fn on_next(&mut self, ctx: &mut OperatorContext<'_>, from: usize, event: Event) -> Result<(), StreamError> {
    if self.done {
      return Ok(());
    }
    match self.slots.get_mut(from) {
      | Some(slot) => {
        if slot.replace(event).is_some() {
          tracing::warn!(from, "zip slot was already occupied; latest event kept");
        }
      },
      | None => return Ok(()),
    }
    if self.slots.iter().all(Option::is_some) {
      let events: Vec<Event> = self.slots.iter_mut().filter_map(Option::take).collect();
      let combined = (self.combine)(&events)?;
      ctx.emit(combined);
      self.armed = false;
      // The pending emission claims one unit of the sampled demand.
      if ctx.downstream_demand() > 1 {
        self.arm(ctx);
      }
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
    self.arm(ctx);
    Ok(())
  }
}
