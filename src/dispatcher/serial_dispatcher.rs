
use std::collections::VecDeque;

use portable_atomic::{AtomicBool, Ordering};
use spin::Mutex;

use super::{Dispatcher, Task};

/// Trampoline dispatcher draining its queue on the calling thread.
///
/// The first caller to find the trampoline idle becomes the drainer and runs queued tasks in
/// submission order; tasks submitted re-entrantly (or from another thread while draining) are
/// appended and executed by the active drainer. This guarantees ordered, non-overlapping
/// execution without a dedicated worker.
pub struct SerialDispatcher {
  queue:    Mutex<VecDeque<Task>>,
  draining: AtomicBool,
}

impl SerialDispatcher {
  /// Creates an idle trampoline dispatcher.
  #[must_use]
  pub const fn new() -> Self {
    Self { queue: Mutex::new(VecDeque::new()), draining: AtomicBool::new(false) }
  }

  fn drain(&self) {
    if self.draining.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
      return;
    }
    loop {
      let task = self.queue.lock().pop_front();
      match task {
        | Some(task) => task(),
        | None => {
          self.draining.store(false, Ordering::Release);
          // Re-acquire only if work raced in after we went idle.
          if self.queue.lock().is_empty()
            || self.draining.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err()
          {
            return;
          }
        },
      }
    }
  }
}

impl Default for SerialDispatcher {
  fn default() -> Self {
    Self::new()
  }
}

impl Dispatcher for SerialDispatcher {
  fn dispatch(&self, task: Task) {
    self.queue.lock().push_back(task);
    self.drain();
  }
}
