//! Producer/consumer link implementing the flow-control protocol.


use std::sync::Arc;

use portable_atomic::{AtomicBool, Ordering};

use crate::{demand_counter::DemandCounter, operator_id::OperatorId, stream_error::StreamError};

/// One-to-one relationship between a producer and a consumer.
///
/// The link carries the outstanding-demand counter, a monotonic cancelled flag and an
/// at-most-once terminal flag. Both sides hold the same shared state, so `Link` is cheap to
/// clone. A cancelled link stays cancelled; at most one in-flight event may still be delivered
/// after cancellation is observed (tolerated race, not eliminated).
#[derive(Debug, Clone)]
pub struct Link {
  state: Arc<LinkState>,
}

#[derive(Debug)]
struct LinkState {
  demand:     DemandCounter,
  cancelled:  AtomicBool,
  terminated: AtomicBool,
  producer:   OperatorId,
  consumer:   OperatorId,
}

impl Link {
  pub(crate) fn new(producer: OperatorId, consumer: OperatorId) -> Self {
    Self {
      state: Arc::new(LinkState {
        demand: DemandCounter::new(),
        cancelled: AtomicBool::new(false),
        terminated: AtomicBool::new(false),
        producer,
        consumer,
      }),
    }
  }

  /// Returns the producer side of the link.
  #[must_use]
  pub fn producer(&self) -> OperatorId {
    self.state.producer
  }

  /// Returns the consumer side of the link.
  #[must_use]
  pub fn consumer(&self) -> OperatorId {
    self.state.consumer
  }

  /// Adds consumer demand and returns the new total.
  ///
  /// # Errors
  ///
  /// Returns [`StreamError::InvalidDemand`] when `amount` is zero.
  pub fn request(&self, amount: u64) -> Result<u64, StreamError> {
    self.state.demand.request(amount)
  }

  /// Returns the remaining demand.
  #[must_use]
  pub fn demand(&self) -> u64 {
    self.state.demand.current()
  }

  /// Claims one unit of demand for an emission.
  ///
  /// Returns `false` when the link is cancelled or no demand remains.
  #[must_use]
  pub fn try_claim(&self) -> bool {
    !self.is_cancelled() && self.state.demand.try_claim()
  }

  /// Cancels the link. Idempotent and safe to call from any thread.
  pub fn cancel(&self) {
    self.state.cancelled.store(true, Ordering::Release);
  }

  /// Returns `true` once the link has been cancelled.
  #[must_use]
  pub fn is_cancelled(&self) -> bool {
    self.state.cancelled.load(Ordering::Acquire)
  }

  /// Returns `true` once a terminal signal passed through the link.
  #[must_use]
  pub fn is_terminated(&self) -> bool {
    self.state.terminated.load(Ordering::Acquire)
  }

  /// Marks the link terminal.
  ///
  /// # Errors
  ///
  /// Returns [`StreamError::DoubleTerminal`] when a terminal signal was already delivered.
  pub(crate) fn finish(&self) -> Result<(), StreamError> {
    self
      .state
      .terminated
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .map(|_| ())
      .map_err(|_| StreamError::DoubleTerminal)
  }

  /// Returns `true` when both handles refer to the same link.
  #[must_use]
  pub fn same_link(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.state, &other.state)
  }
}
