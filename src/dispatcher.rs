//! Dispatching primitives serializing event delivery.
//!
//! A dispatcher is a serialization domain: tasks submitted for the same consumer execute in
//! submission order and never overlap, while different dispatchers run independently.
//! Crossing from one dispatcher's domain to another is an explicit hand-off, not an implicit
//! blocking call. Dispatchers are created explicitly and injected by handle; operator code has
//! no singleton access to them.

/// Serial trampoline dispatcher.
mod serial_dispatcher;
/// Dedicated worker-thread dispatcher.
mod thread_dispatcher;

pub use serial_dispatcher::SerialDispatcher;
pub use thread_dispatcher::ThreadDispatcher;

/// Unit of work submitted to a dispatcher.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Serialized execution context for event delivery.
pub trait Dispatcher: Send + Sync {
  /// Schedules `task` under the serialization guarantee.
  fn dispatch(&self, task: Task);

  /// Attempts the synchronous fast path, falling back to an asynchronous enqueue.
  ///
  /// The fast path is taken only when the calling context is allowed to run tasks for this
  /// dispatcher right now (idle trampoline, or already on the owning worker); otherwise the
  /// task is enqueued and runs after the tasks submitted before it.
  fn try_sync_dispatch(&self, task: Task) {
    self.dispatch(task);
  }
}
