//! Stream error definitions.


/// Errors produced by pipeline operations.
///
/// The variants split into three groups: protocol faults
/// ([`InvalidDemand`](Self::InvalidDemand), [`EmitWithoutDemand`](Self::EmitWithoutDemand),
/// [`DoubleTerminal`](Self::DoubleTerminal)), data errors carrying the original cause text
/// ([`Source`](Self::Source), [`Transform`](Self::Transform)), and faults raised while a
/// dispatcher task executed ([`Task`](Self::Task)).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
  /// Demand request must be a positive amount.
  #[error("demand request must be positive")]
  InvalidDemand,
  /// A producer emitted without remaining demand.
  #[error("emit without remaining demand")]
  EmitWithoutDemand,
  /// A second terminal signal was delivered on the same link.
  #[error("terminal signal already delivered")]
  DoubleTerminal,
  /// Event could not be downcast to the expected type.
  #[error("event type mismatch")]
  TypeMismatch,
  /// Failure signalled by an event source.
  #[error("source failure: {0}")]
  Source(String),
  /// Failure raised by a transformation function.
  #[error("transform failure: {0}")]
  Transform(String),
  /// A dispatcher task raised an unhandled fault.
  #[error("dispatcher task fault: {0}")]
  Task(String),
}
