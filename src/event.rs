//! Type-erased event values.

use std::{any::Any, sync::Arc};

use crate::stream_error::StreamError;

/// Shared, type-erased event flowing through a pipeline.
///
/// Events are reference counted so a broadcast to several consumers never copies the payload.
pub type Event = Arc<dyn Any + Send + Sync>;

/// Downcasts an event to a concrete payload reference.
///
/// # Errors
///
/// Returns [`StreamError::TypeMismatch`] when the event holds a different type.
pub fn downcast_event<T>(event: &Event) -> Result<&T, StreamError>
where
  T: Send + Sync + 'static, {
  event.downcast_ref::<T>().ok_or(StreamError::TypeMismatch)
}
