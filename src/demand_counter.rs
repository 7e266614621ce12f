//! Saturating demand accounting.


use portable_atomic::{AtomicU64, Ordering};

use crate::stream_error::StreamError;

/// Tracks outstanding downstream demand on a link.
///
/// Demand accumulates across requests and saturates at [`DemandCounter::UNBOUNDED`] instead of
/// overflowing; a saturated counter behaves as unbounded and is never decremented by claims.
/// All operations are lock-free so demand may be granted and claimed from different threads.
#[derive(Debug)]
pub struct DemandCounter {
  current: AtomicU64,
}

impl DemandCounter {
  /// Saturation point of the counter, treated as unbounded demand.
  pub const UNBOUNDED: u64 = u64::MAX;

  /// Creates a counter with zero demand.
  #[must_use]
  pub const fn new() -> Self {
    Self { current: AtomicU64::new(0) }
  }

  /// Returns the current outstanding demand.
  #[must_use]
  pub fn current(&self) -> u64 {
    self.current.load(Ordering::Acquire)
  }

  /// Adds demand to the counter and returns the new total.
  ///
  /// # Errors
  ///
  /// Returns [`StreamError::InvalidDemand`] when `amount` is zero.
  pub fn request(&self, amount: u64) -> Result<u64, StreamError> {
    if amount == 0 {
      return Err(StreamError::InvalidDemand);
    }
    let previous = self
      .current
      .fetch_update(Ordering::AcqRel, Ordering::Acquire, |value| Some(value.saturating_add(amount)))
      .unwrap_or(0);
    Ok(previous.saturating_add(amount))
  }

  /// Claims a single unit of demand when available.
  ///
  /// Returns `false` when no demand remains. A saturated counter always grants the claim.
  #[must_use]
  pub fn try_claim(&self) -> bool {
    self
      .current
      .fetch_update(Ordering::AcqRel, Ordering::Acquire, |value| match value {
        | 0 => None,
        | Self::UNBOUNDED => Some(Self::UNBOUNDED),
        | remaining => Some(remaining - 1),
      })
      .is_ok()
  }
}

impl Default for DemandCounter {
  fn default() -> Self {
    Self::new()
  }
}
