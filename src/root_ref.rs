//! Resolved root reference for retry rewinds.

use crate::operator_id::OperatorId;

/// Oldest ancestor of an operator chain, resolved lazily at subscribe time.
///
/// `source` names the push-capable producer feeding the root, when one exists; without it a
/// rewind cannot be performed and failures are forwarded unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootRef {
  /// Oldest ancestor operator in the chain.
  pub root:   OperatorId,
  /// Re-attachable producer feeding the root, if its link is push-capable.
  pub source: Option<OperatorId>,
}
