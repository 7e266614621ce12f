//! Execution context handed to operator logic callbacks.

use crate::{event::Event, operator_id::OperatorId, root_ref::RootRef, stream_error::StreamError};

/// Action recorded by operator logic, applied by the pipeline after the slot lock is released.
///
/// Collecting actions instead of calling back into the arena keeps each slot single-writer and
/// free of re-entrant locking while logic runs.
pub(crate) enum PendingAction {
  Emit(Event),
  Complete,
  Error(StreamError),
  Request { upstream: usize, amount: u64 },
  Rewind { root: RootRef },
}

/// View of an operator slot exposed to [`OperatorLogic`](crate::operator_logic::OperatorLogic).
pub struct OperatorContext<'a> {
  id:                OperatorId,
  capacity:          u64,
  upstream_count:    usize,
  downstream_demand: u64,
  root:              Option<RootRef>,
  actions:           &'a mut Vec<PendingAction>,
}

impl<'a> OperatorContext<'a> {
  pub(crate) fn new(
    id: OperatorId,
    capacity: u64,
    upstream_count: usize,
    downstream_demand: u64,
    root: Option<RootRef>,
    actions: &'a mut Vec<PendingAction>,
  ) -> Self {
    Self { id, capacity, upstream_count, downstream_demand, root, actions }
  }

  /// Returns the identifier of the operator being driven.
  #[must_use]
  pub const fn operator_id(&self) -> OperatorId {
    self.id
  }

  /// Returns the configured request-batch capacity.
  #[must_use]
  pub const fn capacity(&self) -> u64 {
    self.capacity
  }

  /// Returns the number of upstream links attached to this operator.
  #[must_use]
  pub const fn upstream_count(&self) -> usize {
    self.upstream_count
  }

  /// Returns the smallest remaining demand across downstream links, sampled before this
  /// delivery's own emissions are claimed.
  #[must_use]
  pub const fn downstream_demand(&self) -> u64 {
    self.downstream_demand
  }

  /// Returns the root reference resolved at subscribe time, when the logic asked for one.
  #[must_use]
  pub fn root(&self) -> Option<RootRef> {
    self.root.clone()
  }

  /// Emits an event to every downstream consumer with remaining demand.
  pub fn emit(&mut self, event: Event) {
    self.actions.push(PendingAction::Emit(event));
  }

  /// Forwards completion downstream and marks this operator terminal.
  pub fn complete(&mut self) {
    self.actions.push(PendingAction::Complete);
  }

  /// Forwards a failure downstream and marks this operator terminal.
  pub fn error(&mut self, error: StreamError) {
    self.actions.push(PendingAction::Error(error));
  }

  /// Requests `amount` more events from the upstream link at `upstream`.
  pub fn request_upstream(&mut self, upstream: usize, amount: u64) {
    self.actions.push(PendingAction::Request { upstream, amount });
  }

  /// Rewinds the pipeline back to `root` by re-attaching its original source.
  ///
  /// No event delivery interleaves between cancelling the root's current source link and the
  /// re-attachment; the fresh link starts without demand until it is re-requested.
  pub fn rewind(&mut self, root: RootRef) {
    self.actions.push(PendingAction::Rewind { root });
  }
}
