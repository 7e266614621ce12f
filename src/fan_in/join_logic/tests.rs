use std::sync::Arc;

use super::JoinLogic;
use crate::{
  event::{downcast_event, Event},
  operator_context::{OperatorContext, PendingAction},
  operator_id::OperatorId,
  operator_logic::OperatorLogic,
  stream_error::StreamError,
};

fn ctx<'a>(demand: u64, actions: &'a mut Vec<PendingAction>) -> OperatorContext<'a> {
  OperatorContext::new(OperatorId::new(9), 256, 2, demand, None, actions)
}

fn pair() -> impl FnMut(&[Event]) -> Result<Event, StreamError> + Send + 'static {
  |events: &[Event]| {
    let left = *downcast_event::<u32>(&events[0])?;
    let right = *downcast_event::<u32>(&events[1])?;
    Ok(Arc::new((left, right)))
  }
}

#[test]
fn keeps_a_source_flowing_before_the_first_combination() {
  let mut logic = JoinLogic::new(2, pair());
  let mut actions = Vec::new();
  logic.on_request(&mut ctx(10, &mut actions), 10).expect("request");
  actions.clear();
  logic.on_next(&mut ctx(10, &mut actions), 0, Arc::new(1_u32)).expect("next");
  assert!(matches!(actions.as_slice(), [PendingAction::Request { upstream: 0, amount: 1 }]));
}

#[test]
fn combines_each_arrival_with_latest_values() {
  let mut logic = JoinLogic::new(2, pair());
  let mut actions = Vec::new();
  logic.on_request(&mut ctx(10, &mut actions), 10).expect("request");
  logic.on_next(&mut ctx(10, &mut actions), 0, Arc::new(1_u32)).expect("next");
  actions.clear();
  logic.on_next(&mut ctx(10, &mut actions), 1, Arc::new(2_u32)).expect("next");
  match actions.first() {
    | Some(PendingAction::Emit(event)) => {
      assert_eq!(downcast_event::<(u32, u32)>(event).expect("pair"), &(1, 2));
    },
    | _ => panic!("expected an emission"),
  }
  actions.clear();
  // Retained values pair with the new arrival.
  logic.on_next(&mut ctx(10, &mut actions), 0, Arc::new(3_u32)).expect("next");
  match actions.first() {
    | Some(PendingAction::Emit(event)) => {
      assert_eq!(downcast_event::<(u32, u32)>(event).expect("pair"), &(3, 2));
    },
    | _ => panic!("expected an emission"),
  }
}

#[test]
fn spent_downstream_demand_stops_emission_and_credit() {
  let mut logic = JoinLogic::new(2, pair());
  let mut actions = Vec::new();
  logic.on_request(&mut ctx(1, &mut actions), 1).expect("request");
  logic.on_next(&mut ctx(1, &mut actions), 0, Arc::new(1_u32)).expect("next");
  actions.clear();
  logic.on_next(&mut ctx(1, &mut actions), 1, Arc::new(10_u32)).expect("next");
  // The emission spends the last unit of demand, so no credit is re-granted.
  assert!(matches!(actions.as_slice(), [PendingAction::Emit(_)]));
  actions.clear();
  logic.on_next(&mut ctx(0, &mut actions), 0, Arc::new(2_u32)).expect("next");
  assert!(actions.is_empty());
}

#[test]
fn completes_when_any_source_completes() {
  let mut logic = JoinLogic::new(2, pair());
  let mut actions = Vec::new();
  logic.on_complete(&mut ctx(10, &mut actions), 0).expect("complete");
  assert!(matches!(actions.as_slice(), [PendingAction::Complete]));
  actions.clear();
  logic.on_complete(&mut ctx(10, &mut actions), 1).expect("complete");
  assert!(actions.is_empty());
}
