//! Pipeline arena and delivery runtime.


use std::{
  any::Any,
  fmt::Write as _,
  panic::{catch_unwind, AssertUnwindSafe},
  sync::Arc,
};

use spin::Mutex;

use crate::{
  demand_counter::DemandCounter,
  dispatcher::Dispatcher,
  event::Event,
  hot_source::HotSource,
  link::Link,
  operator_context::{OperatorContext, PendingAction},
  operator_id::OperatorId,
  operator_kind::OperatorKind,
  operator_lifecycle::OperatorLifecycle,
  operator_logic::OperatorLogic,
  passthrough_logic::PassthroughLogic,
  pipeline_config::PipelineConfig,
  root_ref::RootRef,
  stream_error::StreamError,
};

/// Handle to a pipeline arena.
///
/// Operators live in a pipeline-wide arena addressed by stable [`OperatorId`] indices, so
/// back-references (a retry operator's root, broadcast targets) are index lookups rather than
/// owning pointers. Each slot is guarded individually; the registry lock is held only to fetch
/// slot handles, never across logic callbacks.
pub struct Pipeline {
  core: Arc<PipelineCore>,
}

impl Pipeline {
  /// Creates a pipeline whose operators run on `dispatcher` by default.
  #[must_use]
  pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
    Self::with_config(PipelineConfig::default(), dispatcher)
  }

  /// Creates a pipeline with an explicit configuration.
  #[must_use]
  pub fn with_config(config: PipelineConfig, dispatcher: Arc<dyn Dispatcher>) -> Self {
    Self { core: Arc::new(PipelineCore { slots: Mutex::new(Vec::new()), config, default_dispatcher: dispatcher }) }
  }

  /// Creates a hot source: a multicast, non-buffering origin pushed by external callers.
  #[must_use]
  pub fn hot_source<T>(&self) -> HotSource<T>
  where
    T: Send + Sync + 'static, {
    let id =
      self.core.add_slot(OperatorKind::HotSource, Box::new(PassthroughLogic::new("hot_source")), None, &[]);
    HotSource::new(self.core.clone(), id)
  }
}

impl Clone for Pipeline {
  fn clone(&self) -> Self {
    Self { core: self.core.clone() }
  }
}

pub(crate) struct PipelineCore {
  slots:              Mutex<Vec<Arc<Mutex<OperatorSlot>>>>,
  config:             PipelineConfig,
  default_dispatcher: Arc<dyn Dispatcher>,
}

struct OperatorSlot {
  kind:       OperatorKind,
  lifecycle:  OperatorLifecycle,
  logic:      Box<dyn OperatorLogic>,
  upstreams:  Vec<Link>,
  downstream: Vec<Link>,
  dispatcher: Arc<dyn Dispatcher>,
  capacity:   u64,
}

#[derive(Clone)]
enum TerminalSignal {
  Complete,
  Error(StreamError),
}

impl PipelineCore {
  fn slot(&self, id: OperatorId) -> Option<Arc<Mutex<OperatorSlot>>> {
    self.slots.lock().get(id.index()).cloned()
  }

  fn dispatcher_of(&self, id: OperatorId) -> Option<Arc<dyn Dispatcher>> {
    self.slot(id).map(|slot| slot.lock().dispatcher.clone())
  }

  /// Adds an operator slot and wires it downstream of `upstreams`, in index order.
  pub(crate) fn add_slot(
    &self,
    kind: OperatorKind,
    logic: Box<dyn OperatorLogic>,
    dispatcher: Option<Arc<dyn Dispatcher>>,
    upstreams: &[OperatorId],
  ) -> OperatorId {
    let id = {
      let mut slots = self.slots.lock();
      let id = OperatorId::new(slots.len());
      slots.push(Arc::new(Mutex::new(OperatorSlot {
        kind,
        lifecycle: OperatorLifecycle::Unsubscribed,
        logic,
        upstreams: Vec::new(),
        downstream: Vec::new(),
        dispatcher: dispatcher.unwrap_or_else(|| self.default_dispatcher.clone()),
        capacity: self.config.capacity,
      })));
      id
    };
    for upstream in upstreams {
      let link = Link::new(*upstream, id);
      if let Some(slot) = self.slot(*upstream) {
        slot.lock().downstream.push(link.clone());
      }
      if let Some(slot) = self.slot(id) {
        slot.lock().upstreams.push(link);
      }
    }
    id
  }

  /// Wires up the whole chain ending at `tail`: every ancestor transitions to subscribed,
  /// oldest first, and root references are resolved for the logic that asked for one.
  pub(crate) fn activate(self: &Arc<Self>, tail: OperatorId) {
    for id in self.ancestry(tail) {
      let needs_root = match self.slot(id) {
        | Some(slot) => slot.lock().logic.needs_root(),
        | None => continue,
      };
      let root = needs_root.then(|| self.resolve_root(id));
      let mut actions = Vec::new();
      if let Some(slot) = self.slot(id) {
        let mut guard = slot.lock();
        if guard.lifecycle == OperatorLifecycle::Unsubscribed {
          guard.lifecycle = OperatorLifecycle::Subscribed;
          let capacity = guard.capacity;
          let upstream_count = guard.upstreams.len();
          let downstream_demand = min_downstream_demand(&guard.downstream);
          let mut ctx = OperatorContext::new(id, capacity, upstream_count, downstream_demand, root, &mut actions);
          guard.logic.on_subscribe(&mut ctx);
        }
      }
      self.apply_actions(id, actions);
    }
  }

  fn ancestry(&self, tail: OperatorId) -> Vec<OperatorId> {
    let mut order = Vec::new();
    self.visit_ancestors(tail, &mut order);
    order
  }

  fn visit_ancestors(&self, id: OperatorId, order: &mut Vec<OperatorId>) {
    if order.contains(&id) {
      return;
    }
    let producers: Vec<OperatorId> = match self.slot(id) {
      | Some(slot) => slot.lock().upstreams.iter().map(Link::producer).collect(),
      | None => return,
    };
    for producer in producers {
      self.visit_ancestors(producer, order);
    }
    if !order.contains(&id) {
      order.push(id);
    }
  }

  /// Walks the first-upstream ancestry of `from` to its oldest operator ancestor.
  fn resolve_root(&self, from: OperatorId) -> RootRef {
    let mut current = from;
    loop {
      let producer = match self.slot(current) {
        | Some(slot) => slot.lock().upstreams.first().map(Link::producer),
        | None => None,
      };
      let Some(producer) = producer else {
        return RootRef { root: current, source: None };
      };
      match self.slot(producer).map(|slot| slot.lock().kind) {
        | Some(kind) if kind.is_reattachable() => return RootRef { root: current, source: Some(producer) },
        | Some(_) => current = producer,
        | None => return RootRef { root: current, source: None },
      }
    }
  }

  fn apply_actions(self: &Arc<Self>, id: OperatorId, actions: Vec<PendingAction>) {
    for action in actions {
      match action {
        | PendingAction::Emit(event) => self.broadcast_next(id, event),
        | PendingAction::Complete => self.broadcast_terminal(id, &TerminalSignal::Complete),
        | PendingAction::Error(error) => self.broadcast_terminal(id, &TerminalSignal::Error(error)),
        | PendingAction::Request { upstream, amount } => self.request_upstream(id, upstream, amount),
        | PendingAction::Rewind { root } => self.rewind(id, &root),
      }
    }
  }

  /// Emits `event` to every downstream consumer of `producer` with remaining demand.
  ///
  /// Consumers of a hot source without demand simply do not receive the event (documented
  /// policy). For any other producer an emission beyond demand is a protocol fault: it is
  /// reported and terminates the affected consumer's pipeline instance.
  pub(crate) fn broadcast_next(self: &Arc<Self>, producer: OperatorId, event: Event) {
    let Some(slot) = self.slot(producer) else {
      return;
    };
    let (kind, links) = {
      let mut guard = slot.lock();
      if guard.lifecycle.is_terminal() {
        tracing::error!(producer = producer.index(), "push after terminal signal ignored (protocol fault)");
        return;
      }
      guard.downstream.retain(|link| !link.is_cancelled());
      (guard.kind, guard.downstream.clone())
    };
    for link in links {
      if link.is_terminated() {
        continue;
      }
      let consumer = link.consumer();
      if link.try_claim() {
        let Some(dispatcher) = self.dispatcher_of(consumer) else {
          continue;
        };
        let core = Arc::clone(self);
        let event = event.clone();
        dispatcher.try_sync_dispatch(Box::new(move || core.deliver_next(consumer, &link, event)));
      } else if kind == OperatorKind::HotSource {
        tracing::trace!(
          producer = producer.index(),
          consumer = consumer.index(),
          "event dropped: consumer has no remaining demand"
        );
      } else {
        tracing::error!(
          producer = producer.index(),
          consumer = consumer.index(),
          "emission beyond demand (protocol fault)"
        );
        if link.finish().is_ok() {
          let Some(dispatcher) = self.dispatcher_of(consumer) else {
            continue;
          };
          let core = Arc::clone(self);
          dispatcher.try_sync_dispatch(Box::new(move || {
            core.deliver_terminal(consumer, &link, &TerminalSignal::Error(StreamError::EmitWithoutDemand));
          }));
        }
      }
    }
  }

  /// Forwards a terminal signal to every downstream consumer and marks `producer` terminal.
  fn broadcast_terminal(self: &Arc<Self>, producer: OperatorId, signal: &TerminalSignal) {
    let Some(slot) = self.slot(producer) else {
      return;
    };
    let links = {
      let mut guard = slot.lock();
      if guard.lifecycle.is_terminal() {
        tracing::error!(producer = producer.index(), "second terminal signal ignored (protocol fault)");
        return;
      }
      guard.lifecycle = OperatorLifecycle::Terminal;
      guard.downstream.clone()
    };
    for link in links {
      if link.is_cancelled() {
        continue;
      }
      match link.finish() {
        | Ok(()) => {
          let consumer = link.consumer();
          let Some(dispatcher) = self.dispatcher_of(consumer) else {
            continue;
          };
          let core = Arc::clone(self);
          let signal = signal.clone();
          dispatcher.try_sync_dispatch(Box::new(move || core.deliver_terminal(consumer, &link, &signal)));
        },
        | Err(_) => {
          tracing::error!(
            producer = producer.index(),
            consumer = link.consumer().index(),
            "terminal signal already delivered on link (protocol fault)"
          );
        },
      }
    }
  }

  fn deliver_next(self: &Arc<Self>, consumer: OperatorId, link: &Link, event: Event) {
    let Some(slot) = self.slot(consumer) else {
      return;
    };
    let mut actions = Vec::new();
    let outcome = {
      let mut guard = slot.lock();
      if guard.lifecycle != OperatorLifecycle::Subscribed || link.is_cancelled() {
        return;
      }
      let from = guard.upstreams.iter().position(|candidate| candidate.same_link(link)).unwrap_or(0);
      let capacity = guard.capacity;
      let upstream_count = guard.upstreams.len();
      let downstream_demand = min_downstream_demand(&guard.downstream);
      let mut ctx = OperatorContext::new(consumer, capacity, upstream_count, downstream_demand, None, &mut actions);
      let logic = &mut guard.logic;
      catch_unwind(AssertUnwindSafe(|| logic.on_next(&mut ctx, from, event)))
    };
    match outcome {
      | Ok(Ok(())) => self.apply_actions(consumer, actions),
      | Ok(Err(error)) => self.fail_operator(consumer, error),
      | Err(payload) => self.fail_operator(consumer, StreamError::Task(panic_message(payload))),
    }
  }

  fn deliver_terminal(self: &Arc<Self>, consumer: OperatorId, link: &Link, signal: &TerminalSignal) {
    let Some(slot) = self.slot(consumer) else {
      return;
    };
    let mut actions = Vec::new();
    let outcome = {
      let mut guard = slot.lock();
      if guard.lifecycle != OperatorLifecycle::Subscribed || link.is_cancelled() {
        return;
      }
      let from = guard.upstreams.iter().position(|candidate| candidate.same_link(link)).unwrap_or(0);
      let capacity = guard.capacity;
      let upstream_count = guard.upstreams.len();
      let downstream_demand = min_downstream_demand(&guard.downstream);
      let mut ctx = OperatorContext::new(consumer, capacity, upstream_count, downstream_demand, None, &mut actions);
      let logic = &mut guard.logic;
      match signal {
        | TerminalSignal::Complete => catch_unwind(AssertUnwindSafe(|| logic.on_complete(&mut ctx, from))),
        | TerminalSignal::Error(error) => {
          let error = error.clone();
          catch_unwind(AssertUnwindSafe(|| logic.on_error(&mut ctx, from, error)))
        },
      }
    };
    match outcome {
      | Ok(Ok(())) => self.apply_actions(consumer, actions),
      | Ok(Err(error)) => self.broadcast_terminal(consumer, &TerminalSignal::Error(error)),
      | Err(payload) => {
        self.broadcast_terminal(consumer, &TerminalSignal::Error(StreamError::Task(panic_message(payload))));
      },
    }
  }

  /// Routes a failure into the operator's own error channel, as if its upstream had failed.
  fn fail_operator(self: &Arc<Self>, id: OperatorId, error: StreamError) {
    let Some(slot) = self.slot(id) else {
      return;
    };
    let mut actions = Vec::new();
    let outcome = {
      let mut guard = slot.lock();
      if guard.lifecycle.is_terminal() {
        return;
      }
      let capacity = guard.capacity;
      let upstream_count = guard.upstreams.len();
      let downstream_demand = min_downstream_demand(&guard.downstream);
      let mut ctx = OperatorContext::new(id, capacity, upstream_count, downstream_demand, None, &mut actions);
      let logic = &mut guard.logic;
      let error = error.clone();
      catch_unwind(AssertUnwindSafe(|| logic.on_error(&mut ctx, 0, error)))
    };
    match outcome {
      | Ok(Ok(())) => self.apply_actions(id, actions),
      | _ => self.broadcast_terminal(id, &TerminalSignal::Error(error)),
    }
  }

  /// Adds demand on the upstream link at `upstream` and notifies its producer.
  pub(crate) fn request_upstream(self: &Arc<Self>, id: OperatorId, upstream: usize, amount: u64) {
    if amount == 0 {
      return;
    }
    let link = match self.slot(id) {
      | Some(slot) => slot.lock().upstreams.get(upstream).cloned(),
      | None => None,
    };
    let Some(link) = link else {
      return;
    };
    if link.is_cancelled() || link.is_terminated() {
      return;
    }
    if let Err(error) = link.request(amount) {
      tracing::warn!(operator = id.index(), %error, "demand request rejected");
      return;
    }
    let producer = link.producer();
    let Some(dispatcher) = self.dispatcher_of(producer) else {
      return;
    };
    let core = Arc::clone(self);
    dispatcher.try_sync_dispatch(Box::new(move || core.deliver_request(producer, amount)));
  }

  fn deliver_request(self: &Arc<Self>, producer: OperatorId, amount: u64) {
    let Some(slot) = self.slot(producer) else {
      return;
    };
    let mut actions = Vec::new();
    let outcome = {
      let mut guard = slot.lock();
      if guard.lifecycle.is_terminal() {
        return;
      }
      let capacity = guard.capacity;
      let upstream_count = guard.upstreams.len();
      let downstream_demand = min_downstream_demand(&guard.downstream);
      let mut ctx = OperatorContext::new(producer, capacity, upstream_count, downstream_demand, None, &mut actions);
      let logic = &mut guard.logic;
      catch_unwind(AssertUnwindSafe(|| logic.on_request(&mut ctx, amount)))
    };
    match outcome {
      | Ok(Ok(())) => self.apply_actions(producer, actions),
      | Ok(Err(error)) => self.fail_operator(producer, error),
      | Err(payload) => self.fail_operator(producer, StreamError::Task(panic_message(payload))),
    }
  }

  /// Cancels every link upstream of `tail`; producers whose consumers are all gone are
  /// cancelled transitively. Idempotent, never blocks, safe from any thread.
  pub(crate) fn cancel_from(&self, tail: OperatorId) {
    let mut stack = vec![tail];
    let mut visited = Vec::new();
    while let Some(id) = stack.pop() {
      if visited.contains(&id) {
        continue;
      }
      visited.push(id);
      let upstream_links: Vec<Link> = match self.slot(id) {
        | Some(slot) => slot.lock().upstreams.clone(),
        | None => continue,
      };
      for link in upstream_links {
        link.cancel();
        let producer = link.producer();
        let orphaned = self
          .slot(producer)
          .map(|slot| slot.lock().downstream.iter().all(Link::is_cancelled))
          .unwrap_or(false);
        if orphaned {
          stack.push(producer);
        }
      }
    }
    tracing::debug!(tail = tail.index(), "pipeline cancelled");
  }

  /// Rewinds the chain between `root` and the retry stage at `retry`, re-attaching the root to
  /// its original source through fresh links.
  ///
  /// The root's current source link is cancelled before anything is re-attached and the fresh
  /// links carry no demand until re-requested, so no event delivery interleaves with the
  /// rewind.
  fn rewind(self: &Arc<Self>, retry: OperatorId, root: &RootRef) {
    let Some(source) = root.source else {
      tracing::warn!(retry = retry.index(), "rewind without re-attachable source ignored");
      return;
    };
    let mut path = vec![retry];
    let mut current = retry;
    while current != root.root {
      let producer = match self.slot(current) {
        | Some(slot) => slot.lock().upstreams.first().map(Link::producer),
        | None => None,
      };
      let Some(producer) = producer else {
        break;
      };
      path.push(producer);
      current = producer;
    }
    path.reverse();
    if path.first() != Some(&root.root) {
      tracing::warn!(retry = retry.index(), root = root.root.index(), "rewind root not reachable; ignored");
      return;
    }

    self.reattach(source, root.root);
    for pair in path.windows(2) {
      self.reattach(pair[0], pair[1]);
    }

    if let Some(slot) = self.slot(source) {
      let mut guard = slot.lock();
      if guard.lifecycle.is_terminal() {
        guard.lifecycle = OperatorLifecycle::Subscribed;
      }
    }
    for id in &path {
      if let Some(slot) = self.slot(*id) {
        let mut guard = slot.lock();
        guard.lifecycle = OperatorLifecycle::Subscribed;
        guard.logic.on_resubscribe();
      }
    }
    tracing::debug!(
      retry = retry.index(),
      root = root.root.index(),
      source = source.index(),
      "pipeline rewound to source"
    );
  }

  /// Replaces the link between `producer` and `consumer` with a fresh, demand-less one.
  fn reattach(&self, producer: OperatorId, consumer: OperatorId) {
    let fresh = Link::new(producer, consumer);
    if let Some(slot) = self.slot(producer) {
      let mut guard = slot.lock();
      match guard.downstream.iter().position(|link| link.consumer() == consumer) {
        | Some(index) => {
          guard.downstream[index].cancel();
          guard.downstream[index] = fresh.clone();
        },
        | None => guard.downstream.push(fresh.clone()),
      }
    }
    if let Some(slot) = self.slot(consumer) {
      let mut guard = slot.lock();
      match guard.upstreams.iter().position(|link| link.producer() == producer) {
        | Some(index) => {
          guard.upstreams[index].cancel();
          guard.upstreams[index] = fresh;
        },
        | None => guard.upstreams.push(fresh),
      }
    }
  }

  /// Pushes a completion signal from a hot source.
  pub(crate) fn push_complete(self: &Arc<Self>, source: OperatorId) {
    self.broadcast_terminal(source, &TerminalSignal::Complete);
  }

  /// Pushes a failure signal from a hot source.
  pub(crate) fn push_error(self: &Arc<Self>, source: OperatorId, error: StreamError) {
    self.broadcast_terminal(source, &TerminalSignal::Error(error));
  }

  /// Renders the upstream topology of `tail`, one operator per line with link diagnostics.
  pub(crate) fn describe(&self, tail: OperatorId) -> String {
    let mut output = String::new();
    self.describe_into(tail, 0, None, &mut output);
    output
  }

  fn describe_into(&self, id: OperatorId, depth: usize, via: Option<&Link>, output: &mut String) {
    let Some(slot) = self.slot(id) else {
      return;
    };
    let (name, lifecycle, upstreams) = {
      let guard = slot.lock();
      (guard.logic.name(), guard.lifecycle, guard.upstreams.clone())
    };
    for _ in 0..depth {
      output.push_str("  ");
    }
    let _ = write!(output, "{name}{id} [{lifecycle:?}]");
    if let Some(link) = via {
      let _ = write!(output, " demand={}", format_demand(link.demand()));
      if link.is_cancelled() {
        output.push_str(" cancelled");
      }
    }
    output.push('\n');
    for link in &upstreams {
      self.describe_into(link.producer(), depth + 1, Some(link), output);
    }
  }
}

fn min_downstream_demand(links: &[Link]) -> u64 {
  links
    .iter()
    .filter(|link| !link.is_cancelled())
    .map(Link::demand)
    .min()
    .unwrap_or(DemandCounter::UNBOUNDED)
}

fn format_demand(value: u64) -> String {
  if value == DemandCounter::UNBOUNDED {
    "unbounded".into()
  } else {
    value.to_string()
  }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
  payload
    .downcast_ref::<&str>()
    .map(|message| (*message).into())
    .or_else(|| payload.downcast_ref::<String>().cloned())
    .unwrap_or_else(|| "task panicked".into())
}
