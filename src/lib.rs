//! In-process reactive-stream processing engine.
//!
//! Pipelines are built from operators connected by demand-controlled links: events flow
//! downstream, demand flows upstream, and a consumer never receives more events than it has
//! requested. Operators run under single-writer dispatchers, failures propagate downstream as
//! terminal signals unless a retry operator intercepts them and rewinds the whole chain back
//! to its source, and fan-in combinators merge several sources under one demand contract.
//!
//! ```
//! use std::sync::Arc;
//!
//! use fluxon::{downcast_event, Pipeline, SerialDispatcher, Signal};
//!
//! let pipeline = Pipeline::new(Arc::new(SerialDispatcher::new()));
//! let source = pipeline.hot_source::<u32>();
//! let control = source
//!   .stream()
//!   .map(|value: &u32| Ok(value * 2))
//!   .subscribe(10, |signal| {
//!     if let Signal::Next(event) = signal {
//!       if let Ok(value) = downcast_event::<u32>(&event) {
//!         println!("got {value}");
//!       }
//!     }
//!   });
//! source.push(21);
//! control.cancel();
//! ```

/// Terminal subscriber stage logic.
mod consumer_logic;
/// Saturating demand accounting.
mod demand_counter;
/// Task dispatchers and serialization domains.
mod dispatcher;
/// Type-erased event values.
mod event;
/// Fan-in combinator logics.
mod fan_in;
/// Externally-pushed multicast source.
mod hot_source;
/// Producer/consumer flow-control link.
mod link;
/// Transformation stage logic.
mod map_logic;
/// Execution context handed to operator logic.
mod operator_context;
/// Operator slot identifier.
mod operator_id;
/// Operator slot kinds.
mod operator_kind;
/// Operator lifecycle states.
mod operator_lifecycle;
/// Operator capability trait.
mod operator_logic;
/// Pass-through stage logic.
mod passthrough_logic;
/// Pipeline arena and delivery runtime.
mod pipeline;
/// Pipeline configuration.
mod pipeline_config;
/// Control handle returned from subscribing.
mod pipeline_control;
/// Retry operator state machine.
mod retry_logic;
/// Retry machine states.
mod retry_state;
/// Resolved chain-root reference.
mod root_ref;
/// Subscriber-facing signal type.
mod signal;
/// Pipeline construction API.
mod stream;
/// Stream error definitions.
mod stream_error;
/// Side-effect stage logic.
mod tap_logic;

pub use consumer_logic::ConsumerLogic;
pub use demand_counter::DemandCounter;
pub use dispatcher::{Dispatcher, SerialDispatcher, Task, ThreadDispatcher};
pub use event::{downcast_event, Event};
pub use fan_in::{CombineFn, ConcatLogic, JoinLogic, MergeLogic, ZipLogic};
pub use hot_source::HotSource;
pub use link::Link;
pub use map_logic::MapLogic;
pub use operator_context::OperatorContext;
pub use operator_id::OperatorId;
pub use operator_kind::OperatorKind;
pub use operator_lifecycle::OperatorLifecycle;
pub use operator_logic::OperatorLogic;
pub use passthrough_logic::PassthroughLogic;
pub use pipeline::Pipeline;
pub use pipeline_config::PipelineConfig;
pub use pipeline_control::PipelineControl;
pub use retry_logic::RetryLogic;
pub use retry_state::RetryState;
pub use root_ref::RootRef;
pub use signal::Signal;
pub use stream::Stream;
pub use stream_error::StreamError;
pub use tap_logic::TapLogic;
