
use std::{
  panic::{catch_unwind, AssertUnwindSafe},
  sync::mpsc::{channel, Receiver, Sender},
  thread,
  thread::{JoinHandle, ThreadId},
};

use super::{Dispatcher, Task};

enum WorkerCommand {
  Run(Task),
  Shutdown,
}

/// Dispatcher owning a dedicated OS worker thread.
///
/// Tasks are executed by the worker in submission order. `try_sync_dispatch` runs the task
/// inline only when called from the worker itself (already inside the serialization domain);
/// every other caller crosses an asynchronous boundary. A panicking task is contained and
/// logged; the worker loop keeps running.
pub struct ThreadDispatcher {
  sender:    Sender<WorkerCommand>,
  worker:    Option<JoinHandle<()>>,
  worker_id: ThreadId,
}

impl ThreadDispatcher {
  /// Spawns a named worker thread and returns the dispatcher bound to it.
  ///
  /// # Panics
  ///
  /// Panics when the OS refuses to spawn the worker thread.
  #[must_use]
  pub fn new(name: &str) -> Self {
    let (sender, receiver) = channel();
    let worker = thread::Builder::new()
      .name(name.into())
      .spawn(move || Self::worker_loop(&receiver))
      .unwrap_or_else(|error| panic!("failed to spawn dispatcher worker: {error}"));
    let worker_id = worker.thread().id();
    Self { sender, worker: Some(worker), worker_id }
  }

  fn worker_loop(receiver: &Receiver<WorkerCommand>) {
    while let Ok(command) = receiver.recv() {
      match command {
        | WorkerCommand::Run(task) => {
          if catch_unwind(AssertUnwindSafe(task)).is_err() {
            tracing::error!("dispatcher task panicked; worker continues");
          }
        },
        | WorkerCommand::Shutdown => break,
      }
    }
  }
}

impl Dispatcher for ThreadDispatcher {
  fn dispatch(&self, task: Task) {
    if self.sender.send(WorkerCommand::Run(task)).is_err() {
      tracing::warn!("dispatcher worker is gone; task dropped");
    }
  }

  fn try_sync_dispatch(&self, task: Task) {
    if thread::current().id() == self.worker_id {
      task();
    } else {
      self.dispatch(task);
    }
  }
}

impl Drop for ThreadDispatcher {
  fn drop(&mut self) {
    let _ = self.sender.send(WorkerCommand::Shutdown);
    if thread::current().id() != self.worker_id {
      if let Some(worker) = self.worker.take() {
        let _ = worker.join();
      }
    }
  }
}
