//! Terminal subscriber signal type.

use crate::stream_error::StreamError;

/// Signal delivered to a terminal subscriber.
///
/// Exactly one of [`Complete`](Self::Complete) or [`Error`](Self::Error) is delivered per
/// subscription, after which no further signals arrive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal<T> {
  /// Next event in the stream.
  Next(T),
  /// The stream completed successfully.
  Complete,
  /// The stream terminated with a failure.
  Error(StreamError),
}

impl<T> Signal<T> {
  /// Returns `true` when the signal is terminal.
  #[must_use]
  pub const fn is_terminal(&self) -> bool {
    matches!(self, Self::Complete | Self::Error(_))
  }
}
