//! Retry operator state machine.

#[cfg(test)]
mod tests;

use crate::{
  event::Event, operator_context::OperatorContext, operator_logic::OperatorLogic, retry_state::RetryState,
  root_ref::RootRef, stream_error::StreamError,
};

type RetryPredicate = Box<dyn Fn(&StreamError) -> bool + Send>;

/// Operator that recovers from upstream failures by rewinding the whole pipeline.
///
/// The failure counter follows a sliding policy: any successful event resets it, so only
/// consecutive failures count against the bound. A failure beyond the bound is forwarded with
/// its original cause intact. When a predicate is supplied and matches the cause, the retry
/// keeps rewinding regardless of the bound.
///
/// Rewinding restarts the chain from its original source rather than this stage alone, since
/// upstream stages may hold state derived from events that were already consumed. The root and
/// its re-attachable source are resolved once, at subscribe time; without a push-capable
/// source the failure is forwarded unchanged (logged, documented limitation). The resume
/// request after a rewind is capped at the remaining downstream demand; when that demand is
/// already spent the request is deferred to the next downstream `request`.
pub struct RetryLogic {
  max_retries: u64,
  predicate:   Option<RetryPredicate>,
  failures:    u64,
  state:       RetryState,
  root:        Option<RootRef>,
}

impl RetryLogic {
  /// Creates a retry operator bounded by `max_retries` consecutive failures.
  #[must_use]
  pub fn new(max_retries: u64) -> Self {
    Self { max_retries, predicate: None, failures: 0, state: RetryState::Active, root: None }
  }

  /// Creates a retry operator whose predicate keeps retrying matching failures unbounded.
  #[must_use]
  pub fn with_predicate(max_retries: u64, predicate: impl Fn(&StreamError) -> bool + Send + 'static) -> Self {
    Self { max_retries, predicate: Some(Box::new(predicate)), failures: 0, state: RetryState::Active, root: None }
  }

  /// Returns the current state of the retry machine.
  #[must_use]
  pub const fn state(&self) -> RetryState {
    self.state
  }

  /// Returns the number of consecutive failures observed since the last successful event.
  #[must_use]
  pub const fn failures(&self) -> u64 {
    self.failures
  }
}

impl OperatorLogic for RetryLogic {
  fn name(&self) -> &'static str {
    "retry"
  }

  fn needs_root(&self) -> bool {
    true
  }

  fn on_subscribe(&mut self, ctx: &mut OperatorContext<'_>) {
    self.root = ctx.root();
  }

  fn on_next(&mut self, ctx: &mut OperatorContext<'_>, _from: usize, event: Event) -> Result<(), StreamError> {
    self.failures = 0;
    self.state = RetryState::Active;
    ctx.emit(event);
    Ok(())
  }

  fn on_complete(&mut self, ctx: &mut OperatorContext<'_>, _from: usize) -> Result<(), StreamError> {
    self.state = RetryState::Completed;
    ctx.complete();
    Ok(())
  }

  fn on_error(&mut self, ctx: &mut OperatorContext<'_>, _from: usize, error: StreamError) -> Result<(), StreamError> {
    self.state = RetryState::Recovering;
    self.failures = self.failures.saturating_add(1);

    let exhausted = self.failures > self.max_retries;
    let matched = self.predicate.as_ref().is_some_and(|predicate| predicate(&error));
    if exhausted && !matched {
      tracing::debug!(failures = self.failures, max = self.max_retries, "retries exhausted; forwarding failure");
      self.state = RetryState::TerminallyFailed;
      self.failures = 0;
      ctx.error(error);
      return Ok(());
    }

    match self.root.clone() {
      | Some(root) if root.source.is_some() => {
        tracing::debug!(attempt = self.failures, root = root.root.index(), "rewinding pipeline to root");
        // Resume with at most the demand downstream still holds; requesting the full
        // capacity would let the resumed flow emit beyond what the subscriber asked for.
        let resume = ctx.capacity().min(ctx.downstream_demand());
        ctx.rewind(root);
        if resume > 0 {
          ctx.request_upstream(0, resume);
        }
        self.state = RetryState::Active;
      },
      | _ => {
        tracing::warn!("no re-attachable source available; forwarding failure unchanged");
        self.state = RetryState::TerminallyFailed;
        ctx.error(error);
      },
    }
    Ok(())
  }
}
