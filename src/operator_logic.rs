//! Operator capability trait.

use crate::{event::Event, operator_context::OperatorContext, stream_error::StreamError};

/// Processing logic of a pipeline stage.
///
/// All callbacks run under the owning dispatcher's serialization guarantee: no two callbacks
/// for the same operator execute concurrently, and deliveries arrive in submission order.
/// Default implementations forward events, completion and failures unchanged and propagate
/// downstream demand upstream one-to-one.
pub trait OperatorLogic: Send {
  /// Returns the stage name used in topology descriptions.
  fn name(&self) -> &'static str;

  /// Returns `true` when the logic needs its chain root resolved at subscribe time.
  fn needs_root(&self) -> bool {
    false
  }

  /// Called once when the operator is attached to its upstream links.
  fn on_subscribe(&mut self, ctx: &mut OperatorContext<'_>) {
    let _ = ctx;
  }

  /// Called after a rewind re-attached this operator through a fresh link.
  ///
  /// Stateful logic should reset per-attachment state here.
  fn on_resubscribe(&mut self) {}

  /// Called for every event delivered by the upstream link at `from`.
  ///
  /// # Errors
  ///
  /// Returning an error routes the failure into this operator's own error channel.
  fn on_next(&mut self, ctx: &mut OperatorContext<'_>, from: usize, event: Event) -> Result<(), StreamError> {
    let _ = from;
    ctx.emit(event);
    Ok(())
  }

  /// Called at most once when the upstream link at `from` completes.
  ///
  /// # Errors
  ///
  /// Returning an error routes the failure into this operator's own error channel.
  fn on_complete(&mut self, ctx: &mut OperatorContext<'_>, from: usize) -> Result<(), StreamError> {
    let _ = from;
    ctx.complete();
    Ok(())
  }

  /// Called at most once when the upstream link at `from` fails.
  ///
  /// The default forwards the failure downstream terminally; operators may intercept.
  ///
  /// # Errors
  ///
  /// Returning an error replaces the in-flight failure with the returned one.
  fn on_error(&mut self, ctx: &mut OperatorContext<'_>, from: usize, error: StreamError) -> Result<(), StreamError> {
    let _ = from;
    ctx.error(error);
    Ok(())
  }

  /// Called when downstream demand arrives; default propagates it to every upstream.
  ///
  /// # Errors
  ///
  /// Returning an error routes the failure into this operator's own error channel.
  fn on_request(&mut self, ctx: &mut OperatorContext<'_>, demand: u64) -> Result<(), StreamError> {
    for upstream in 0..ctx.upstream_count() {
      ctx.request_upstream(upstream, demand);
    }
    Ok(())
  }
}
