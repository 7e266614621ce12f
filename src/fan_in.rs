//! Fan-in combinators.
//!
//! Each combinator owns N ≥ 2 upstream links with independent demand accounting and combines
//! them under a single downstream demand contract. Ties between simultaneously ready sources
//! are broken by source index order, which is stable and deterministic.

/// Sequential concatenation combinator.
mod concat_logic;
/// Sampling combination combinator.
mod join_logic;
/// Interleaving combinator.
mod merge_logic;
/// Positional pairing combinator.
mod zip_logic;

pub use concat_logic::ConcatLogic;
pub use join_logic::JoinLogic;
pub use merge_logic::MergeLogic;
pub use zip_logic::ZipLogic;

use crate::{event::Event, stream_error::StreamError};

/// Combination function turning one event per source into a single output event.
pub type CombineFn = Box<dyn FnMut(&[Event]) -> Result<Event, StreamError> + Send>;
