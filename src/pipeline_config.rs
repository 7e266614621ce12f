//! Pipeline configuration.

/// Configuration shared by every operator created from a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
  /// Request-batch size used when resuming flow, e.g. after a retry rewind.
  pub capacity: u64,
}

impl PipelineConfig {
  /// Creates a configuration with the provided capacity.
  #[must_use]
  pub const fn new(capacity: u64) -> Self {
    Self { capacity }
  }
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self { capacity: 256 }
  }
}
