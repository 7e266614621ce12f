//! Pipeline construction API.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::{
  consumer_logic::ConsumerLogic,
  dispatcher::Dispatcher,
  event::{downcast_event, Event},
  fan_in::{ConcatLogic, JoinLogic, MergeLogic, ZipLogic},
  map_logic::MapLogic,
  operator_id::OperatorId,
  operator_kind::OperatorKind,
  operator_logic::OperatorLogic,
  passthrough_logic::PassthroughLogic,
  pipeline::PipelineCore,
  pipeline_control::PipelineControl,
  retry_logic::RetryLogic,
  signal::Signal,
  stream_error::StreamError,
  tap_logic::TapLogic,
};

/// Build-time handle to the tail of a pipeline under construction.
///
/// Each combinator appends an unsubscribed operator slot downstream of the current tail and
/// returns a new handle; nothing runs until [`subscribe`](Self::subscribe) wires up the chain.
/// Handles are cheap to clone, and cloning before appending lets several branches share a
/// common prefix.
pub struct Stream {
  core:       Arc<PipelineCore>,
  tail:       OperatorId,
  dispatcher: Option<Arc<dyn Dispatcher>>,
}

impl Clone for Stream {
  fn clone(&self) -> Self {
    Self { core: self.core.clone(), tail: self.tail, dispatcher: self.dispatcher.clone() }
  }
}

impl Stream {
  pub(crate) fn new(core: Arc<PipelineCore>, tail: OperatorId) -> Self {
    Self { core, tail, dispatcher: None }
  }

  fn extend(&self, tail: OperatorId) -> Self {
    Self { core: self.core.clone(), tail, dispatcher: self.dispatcher.clone() }
  }

  /// Returns the identifier of the current tail operator.
  #[must_use]
  pub const fn operator_id(&self) -> OperatorId {
    self.tail
  }

  fn stage(&self, logic: Box<dyn OperatorLogic>) -> Self {
    let id = self.core.add_slot(OperatorKind::Stage, logic, self.dispatcher.clone(), &[self.tail]);
    self.extend(id)
  }

  fn fan_in(&self, others: &[Self], logic: Box<dyn OperatorLogic>) -> Self {
    let mut upstreams = vec![self.tail];
    upstreams.extend(others.iter().map(|stream| stream.tail));
    let id = self.core.add_slot(OperatorKind::FanIn, logic, self.dispatcher.clone(), &upstreams);
    self.extend(id)
  }

  /// Appends a custom operator stage.
  #[must_use]
  pub fn via(&self, logic: impl OperatorLogic + 'static) -> Self {
    self.stage(Box::new(logic))
  }

  /// Appends a transformation stage over payloads of type `T`.
  ///
  /// A mismatched payload type or a transformation failure terminates this pipeline instance
  /// with the cause intact.
  #[must_use]
  pub fn map<T, U>(&self, mut transform: impl FnMut(&T) -> Result<U, StreamError> + Send + 'static) -> Self
  where
    T: Send + Sync + 'static,
    U: Send + Sync + 'static, {
    self.stage(Box::new(MapLogic::new(move |event: &Event| {
      let value = downcast_event::<T>(event)?;
      let mapped = transform(value)?;
      Ok(Arc::new(mapped) as Event)
    })))
  }

  /// Appends a side-effect stage; events flow through unchanged.
  ///
  /// Events carrying a payload other than `T` pass through without running the effect.
  #[must_use]
  pub fn tap<T>(&self, mut effect: impl FnMut(&T) + Send + 'static) -> Self
  where
    T: Send + Sync + 'static, {
    self.stage(Box::new(TapLogic::new(move |event: &Event| {
      if let Ok(value) = downcast_event::<T>(event) {
        effect(value);
      }
    })))
  }

  /// Appends a stage running `effect` once when the stream completes.
  #[must_use]
  pub fn on_complete(&self, effect: impl FnMut() + Send + 'static) -> Self {
    self.stage(Box::new(TapLogic::on_complete(effect)))
  }

  /// Appends a retry operator bounded by `max_retries` consecutive failures.
  ///
  /// A rewind re-attaches the chain's original source for the whole arena, so a chain feeding
  /// several terminal subscribers would be rewound for all of them; pipelines containing a
  /// retry operator are expected to have a single terminal subscriber.
  #[must_use]
  pub fn retry(&self, max_retries: u64) -> Self {
    self.stage(Box::new(RetryLogic::new(max_retries)))
  }

  /// Appends a retry operator that keeps retrying failures matching `predicate` without bound.
  #[must_use]
  pub fn retry_when(&self, max_retries: u64, predicate: impl Fn(&StreamError) -> bool + Send + 'static) -> Self {
    self.stage(Box::new(RetryLogic::with_predicate(max_retries, predicate)))
  }

  /// Appends an explicit dispatcher hand-off: every stage appended after this point runs in
  /// `dispatcher`'s serialization domain.
  #[must_use]
  pub fn dispatch_on(&self, dispatcher: Arc<dyn Dispatcher>) -> Self {
    let id = self.core.add_slot(
      OperatorKind::Stage,
      Box::new(PassthroughLogic::new("async_boundary")),
      Some(dispatcher.clone()),
      &[self.tail],
    );
    Self { core: self.core.clone(), tail: id, dispatcher: Some(dispatcher) }
  }

  /// Interleaves this stream with `others` in arrival order.
  #[must_use]
  pub fn merge_with(&self, others: &[Self]) -> Self {
    self.fan_in(others, Box::new(MergeLogic::new(others.len() + 1)))
  }

  /// Drains this stream to completion, then each of `others` in turn.
  #[must_use]
  pub fn concat_with(&self, others: &[Self]) -> Self {
    self.fan_in(others, Box::new(ConcatLogic::new(others.len() + 1)))
  }

  /// Pairs events positionally across this stream and `others`, combining each tuple with
  /// `combine`. Slot `0` of the combine input is this stream's event.
  #[must_use]
  pub fn zip_with(
    &self,
    others: &[Self],
    combine: impl FnMut(&[Event]) -> Result<Event, StreamError> + Send + 'static,
  ) -> Self {
    self.fan_in(others, Box::new(ZipLogic::new(others.len() + 1, combine)))
  }

  /// Combines every new arrival with the most recent value of each other source.
  #[must_use]
  pub fn join_with(
    &self,
    others: &[Self],
    combine: impl FnMut(&[Event]) -> Result<Event, StreamError> + Send + 'static,
  ) -> Self {
    self.fan_in(others, Box::new(JoinLogic::new(others.len() + 1, combine)))
  }

  /// Attaches a terminal subscriber requesting `initial_demand` events, wires up the whole
  /// chain and returns its control handle.
  ///
  /// Root resolution for retry operators happens here, lazily, by walking the chain that was
  /// just built.
  pub fn subscribe(&self, initial_demand: u64, callback: impl FnMut(Signal<Event>) + Send + 'static) -> PipelineControl {
    let id = self.core.add_slot(
      OperatorKind::Stage,
      Box::new(ConsumerLogic::new(initial_demand, callback)),
      self.dispatcher.clone(),
      &[self.tail],
    );
    self.core.activate(id);
    PipelineControl::new(self.core.clone(), id)
  }
}
