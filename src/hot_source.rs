//! Externally-pushed multicast source.


use std::{marker::PhantomData, sync::Arc};

use crate::{operator_id::OperatorId, pipeline::PipelineCore, stream::Stream, stream_error::StreamError};

/// Imperative, multicast event origin with no internal buffering.
///
/// Events are pushed by external callers rather than pulled by demand: every currently
/// attached consumer with remaining demand receives the event, consumers without demand do
/// not (the event is dropped for them — documented policy, there is no replay). The handle is
/// cheap to clone and pushes are safe from any thread.
pub struct HotSource<T> {
  core:    Arc<PipelineCore>,
  id:      OperatorId,
  _marker: PhantomData<fn(T)>,
}

impl<T> Clone for HotSource<T> {
  fn clone(&self) -> Self {
    Self { core: self.core.clone(), id: self.id, _marker: PhantomData }
  }
}

impl<T> HotSource<T>
where
  T: Send + Sync + 'static,
{
  pub(crate) fn new(core: Arc<PipelineCore>, id: OperatorId) -> Self {
    Self { core, id, _marker: PhantomData }
  }

  /// Returns the identifier of the source's operator slot.
  #[must_use]
  pub const fn operator_id(&self) -> OperatorId {
    self.id
  }

  /// Opens a stream builder rooted at this source.
  #[must_use]
  pub fn stream(&self) -> Stream {
    Stream::new(self.core.clone(), self.id)
  }

  /// Pushes one event to every attached consumer with remaining demand.
  pub fn push(&self, value: T) {
    self.core.broadcast_next(self.id, Arc::new(value));
  }

  /// Pushes the completion signal; the source accepts no further pushes afterwards.
  pub fn complete(&self) {
    self.core.push_complete(self.id);
  }

  /// Pushes a failure signal; the source accepts no further pushes afterwards unless a
  /// downstream retry rewinds the pipeline back onto it.
  pub fn fail(&self, error: StreamError) {
    self.core.push_error(self.id, error);
  }
}
