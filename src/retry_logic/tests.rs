use std::sync::Arc;

use super::RetryLogic;
use crate::{
  operator_context::{OperatorContext, PendingAction},
  operator_id::OperatorId,
  operator_logic::OperatorLogic,
  retry_state::RetryState,
  root_ref::RootRef,
  stream_error::StreamError,
};

const CAPACITY: u64 = 8;

fn root() -> RootRef {
  RootRef { root: OperatorId::new(1), source: Some(OperatorId::new(0)) }
}

fn ctx<'a>(root: Option<RootRef>, actions: &'a mut Vec<PendingAction>) -> OperatorContext<'a> {
  OperatorContext::new(OperatorId::new(2), CAPACITY, 1, 10, root, actions)
}

fn subscribed(logic: &mut RetryLogic, root: Option<RootRef>) {
  let mut actions = Vec::new();
  logic.on_subscribe(&mut ctx(root, &mut actions));
}

fn fail(logic: &mut RetryLogic) -> Vec<PendingAction> {
  let mut actions = Vec::new();
  logic.on_error(&mut ctx(None, &mut actions), 0, StreamError::Source("boom".into())).expect("error");
  actions
}

#[test]
fn rewinds_within_the_retry_bound() {
  let mut logic = RetryLogic::new(2);
  subscribed(&mut logic, Some(root()));
  let actions = fail(&mut logic);
  assert!(matches!(
    actions.as_slice(),
    [PendingAction::Rewind { root: RootRef { source: Some(_), .. } }, PendingAction::Request { upstream: 0, amount: CAPACITY }]
  ));
  assert_eq!(logic.state(), RetryState::Active);
  assert_eq!(logic.failures(), 1);
}

#[test]
fn resume_request_never_exceeds_downstream_demand() {
  let mut logic = RetryLogic::new(3);
  subscribed(&mut logic, Some(root()));
  let mut actions = Vec::new();
  let mut ctx = OperatorContext::new(OperatorId::new(2), CAPACITY, 1, 2, None, &mut actions);
  logic.on_error(&mut ctx, 0, StreamError::Source("boom".into())).expect("error");
  assert!(matches!(
    actions.as_slice(),
    [PendingAction::Rewind { .. }, PendingAction::Request { upstream: 0, amount: 2 }]
  ));
}

#[test]
fn rewind_with_spent_demand_defers_the_resume_request() {
  let mut logic = RetryLogic::new(3);
  subscribed(&mut logic, Some(root()));
  let mut actions = Vec::new();
  let mut ctx = OperatorContext::new(OperatorId::new(2), CAPACITY, 1, 0, None, &mut actions);
  logic.on_error(&mut ctx, 0, StreamError::Source("boom".into())).expect("error");
  assert!(matches!(actions.as_slice(), [PendingAction::Rewind { .. }]));
  assert_eq!(logic.state(), RetryState::Active);
}

#[test]
fn exhaustion_forwards_the_original_cause() {
  let mut logic = RetryLogic::new(1);
  subscribed(&mut logic, Some(root()));
  assert!(matches!(fail(&mut logic).as_slice(), [PendingAction::Rewind { .. }, PendingAction::Request { .. }]));
  let actions = fail(&mut logic);
  match actions.as_slice() {
    | [PendingAction::Error(StreamError::Source(cause))] => assert_eq!(cause, "boom"),
    | _ => panic!("expected the original failure to surface"),
  }
  assert_eq!(logic.state(), RetryState::TerminallyFailed);
}

#[test]
fn successful_events_reset_the_failure_counter() {
  let mut logic = RetryLogic::new(1);
  subscribed(&mut logic, Some(root()));
  assert!(matches!(fail(&mut logic).as_slice(), [PendingAction::Rewind { .. }, PendingAction::Request { .. }]));
  let mut actions = Vec::new();
  logic.on_next(&mut ctx(None, &mut actions), 0, Arc::new(1_u32)).expect("next");
  assert_eq!(logic.failures(), 0);
  // The bound applies to consecutive failures, so one more rewind is available.
  assert!(matches!(fail(&mut logic).as_slice(), [PendingAction::Rewind { .. }, PendingAction::Request { .. }]));
}

#[test]
fn matching_predicate_retries_beyond_the_bound() {
  let mut logic = RetryLogic::with_predicate(0, |error| matches!(error, StreamError::Source(_)));
  subscribed(&mut logic, Some(root()));
  for _ in 0..5 {
    assert!(matches!(fail(&mut logic).as_slice(), [PendingAction::Rewind { .. }, PendingAction::Request { .. }]));
  }
}

#[test]
fn non_matching_predicate_keeps_the_bound() {
  let mut logic = RetryLogic::with_predicate(0, |error| matches!(error, StreamError::TypeMismatch));
  subscribed(&mut logic, Some(root()));
  assert!(matches!(fail(&mut logic).as_slice(), [PendingAction::Error(_)]));
  assert_eq!(logic.state(), RetryState::TerminallyFailed);
}

#[test]
fn missing_source_forwards_the_failure() {
  let mut logic = RetryLogic::new(3);
  subscribed(&mut logic, Some(RootRef { root: OperatorId::new(1), source: None }));
  assert!(matches!(fail(&mut logic).as_slice(), [PendingAction::Error(_)]));
  assert_eq!(logic.state(), RetryState::TerminallyFailed);
}

#[test]
fn completion_moves_the_machine_to_completed() {
  let mut logic = RetryLogic::new(3);
  subscribed(&mut logic, Some(root()));
  let mut actions = Vec::new();
  logic.on_complete(&mut ctx(None, &mut actions), 0).expect("complete");
  assert!(matches!(actions.as_slice(), [PendingAction::Complete]));
  assert_eq!(logic.state(), RetryState::Completed);
}
