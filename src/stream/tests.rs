use std::{
  sync::{mpsc, Arc, Mutex},
  time::{Duration, Instant},
};

use crate::{
  demand_counter::DemandCounter,
  dispatcher::{SerialDispatcher, ThreadDispatcher},
  event::{downcast_event, Event},
  pipeline::Pipeline,
  signal::Signal,
  stream_error::StreamError,
};

type Signals = Arc<Mutex<Vec<Signal<Event>>>>;

fn pipeline() -> Pipeline {
  let _ = tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).try_init();
  Pipeline::new(Arc::new(SerialDispatcher::new()))
}

fn collector() -> (Signals, impl FnMut(Signal<Event>) + Send + 'static) {
  let signals: Signals = Arc::new(Mutex::new(Vec::new()));
  let sink = signals.clone();
  (signals, move |signal| sink.lock().expect("signals lock").push(signal))
}

fn values(signals: &Signals) -> Vec<u32> {
  signals
    .lock()
    .expect("signals lock")
    .iter()
    .filter_map(|signal| match signal {
      | Signal::Next(event) => downcast_event::<u32>(event).ok().copied(),
      | _ => None,
    })
    .collect()
}

fn completed(signals: &Signals) -> bool {
  signals.lock().expect("signals lock").iter().any(|signal| matches!(signal, Signal::Complete))
}

fn errors(signals: &Signals) -> Vec<StreamError> {
  signals
    .lock()
    .expect("signals lock")
    .iter()
    .filter_map(|signal| match signal {
      | Signal::Error(error) => Some(error.clone()),
      | _ => None,
    })
    .collect()
}

#[test]
fn map_transforms_each_event() {
  let pipeline = pipeline();
  let source = pipeline.hot_source::<u32>();
  let (signals, callback) = collector();
  let _control = source.stream().map(|value: &u32| Ok(value * 2)).subscribe(10, callback);
  source.push(1);
  source.push(2);
  assert_eq!(values(&signals), vec![2, 4]);
}

#[test]
fn map_failure_terminates_with_cause() {
  let pipeline = pipeline();
  let source = pipeline.hot_source::<u32>();
  let (signals, callback) = collector();
  let _control = source
    .stream()
    .map(|value: &u32| if *value == 2 { Err(StreamError::Transform("odd only".into())) } else { Ok(*value) })
    .subscribe(10, callback);
  source.push(1);
  source.push(2);
  source.push(3);
  assert_eq!(values(&signals), vec![1]);
  assert_eq!(errors(&signals), vec![StreamError::Transform("odd only".into())]);
}

#[test]
fn mismatched_payload_type_surfaces_as_error() {
  let pipeline = pipeline();
  let source = pipeline.hot_source::<u32>();
  let (signals, callback) = collector();
  let _control = source.stream().map(|text: &String| Ok(text.len() as u32)).subscribe(10, callback);
  source.push(1);
  assert_eq!(errors(&signals), vec![StreamError::TypeMismatch]);
}

#[test]
fn tap_observes_events_without_changing_them() {
  let pipeline = pipeline();
  let source = pipeline.hot_source::<u32>();
  let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
  let observed = seen.clone();
  let (signals, callback) = collector();
  let _control = source
    .stream()
    .tap(move |value: &u32| observed.lock().expect("seen lock").push(*value))
    .subscribe(10, callback);
  source.push(4);
  source.push(5);
  assert_eq!(*seen.lock().expect("seen lock"), vec![4, 5]);
  assert_eq!(values(&signals), vec![4, 5]);
}

#[test]
fn completion_effect_runs_before_completion_is_forwarded() {
  let pipeline = pipeline();
  let source = pipeline.hot_source::<u32>();
  let fired: Arc<Mutex<u32>> = Arc::new(Mutex::new(0));
  let counter = fired.clone();
  let (signals, callback) = collector();
  let _control = source
    .stream()
    .on_complete(move || *counter.lock().expect("fired lock") += 1)
    .subscribe(10, callback);
  source.complete();
  assert_eq!(*fired.lock().expect("fired lock"), 1);
  assert!(completed(&signals));
}

#[test]
fn retry_rewinds_to_the_source_and_resumes() {
  let pipeline = pipeline();
  let source = pipeline.hot_source::<u32>();
  let (signals, callback) = collector();
  let _control = source.stream().map(|value: &u32| Ok(*value)).retry(2).subscribe(10, callback);
  source.push(1);
  source.fail(StreamError::Source("transient".into()));
  source.push(2);
  assert_eq!(values(&signals), vec![1, 2]);
  assert!(errors(&signals).is_empty());
  assert!(!completed(&signals));
}

#[test]
fn resumed_flow_respects_the_subscribers_remaining_demand() {
  let pipeline = pipeline();
  let source = pipeline.hot_source::<u32>();
  let (signals, callback) = collector();
  let _control = source.stream().retry(5).subscribe(3, callback);
  source.push(1);
  source.fail(StreamError::Source("transient".into()));
  source.push(2);
  source.push(3);
  // Demand is spent; the resumed flow must drop this like any bounded hot consumer.
  source.push(4);
  assert_eq!(values(&signals), vec![1, 2, 3]);
  assert!(errors(&signals).is_empty());
}

#[test]
fn retry_exhaustion_surfaces_the_original_cause() {
  let pipeline = pipeline();
  let source = pipeline.hot_source::<u32>();
  let (signals, callback) = collector();
  let _control = source.stream().retry(1).subscribe(10, callback);
  source.fail(StreamError::Source("down".into()));
  source.fail(StreamError::Source("down".into()));
  assert_eq!(errors(&signals), vec![StreamError::Source("down".into())]);
}

#[test]
fn predicate_retries_are_unbounded_until_success() {
  let pipeline = pipeline();
  let source = pipeline.hot_source::<u32>();
  let (signals, callback) = collector();
  let _control = source
    .stream()
    .retry_when(0, |error| matches!(error, StreamError::Source(_)))
    .subscribe(10, callback);
  for _ in 0..4 {
    source.fail(StreamError::Source("flaky".into()));
  }
  source.push(9);
  assert_eq!(values(&signals), vec![9]);
  assert!(errors(&signals).is_empty());
}

#[test]
fn concat_emits_sources_strictly_in_sequence() {
  let pipeline = pipeline();
  let first = pipeline.hot_source::<u32>();
  let second = pipeline.hot_source::<u32>();
  let (signals, callback) = collector();
  let _control = first.stream().concat_with(&[second.stream()]).subscribe(10, callback);
  // The second source has no demand yet; its early push is dropped, not buffered.
  second.push(99);
  first.push(1);
  first.push(2);
  first.complete();
  second.push(3);
  second.push(4);
  second.complete();
  assert_eq!(values(&signals), vec![1, 2, 3, 4]);
  assert!(completed(&signals));
}

#[test]
fn zip_pairs_positionally_and_completes_without_a_partner() {
  let pipeline = pipeline();
  let left = pipeline.hot_source::<u32>();
  let right = pipeline.hot_source::<u32>();
  let (signals, callback) = collector();
  let _control = left
    .stream()
    .zip_with(&[right.stream()], |events| {
      let a = *downcast_event::<u32>(&events[0])?;
      let b = *downcast_event::<u32>(&events[1])?;
      Ok(Arc::new(a + b))
    })
    .subscribe(10, callback);
  left.push(1);
  right.push(10);
  left.push(2);
  right.push(20);
  left.push(3);
  right.complete();
  assert_eq!(values(&signals), vec![11, 22]);
  assert!(completed(&signals));
}

#[test]
fn merge_interleaves_and_completes_after_every_source() {
  let pipeline = pipeline();
  let left = pipeline.hot_source::<u32>();
  let right = pipeline.hot_source::<u32>();
  let (signals, callback) = collector();
  let _control = left.stream().merge_with(&[right.stream()]).subscribe(10, callback);
  left.push(1);
  right.push(10);
  left.push(2);
  left.complete();
  assert!(!completed(&signals));
  right.complete();
  assert_eq!(values(&signals), vec![1, 10, 2]);
  assert!(completed(&signals));
}

#[test]
fn merge_fails_fast_when_any_source_fails() {
  let pipeline = pipeline();
  let left = pipeline.hot_source::<u32>();
  let right = pipeline.hot_source::<u32>();
  let (signals, callback) = collector();
  let _control = left.stream().merge_with(&[right.stream()]).subscribe(10, callback);
  left.push(1);
  right.fail(StreamError::Source("right gone".into()));
  left.push(2);
  assert_eq!(values(&signals), vec![1]);
  assert_eq!(errors(&signals), vec![StreamError::Source("right gone".into())]);
}

#[test]
fn join_samples_the_latest_value_of_each_source() {
  let pipeline = pipeline();
  let left = pipeline.hot_source::<u32>();
  let right = pipeline.hot_source::<u32>();
  let (signals, callback) = collector();
  let _control = left
    .stream()
    .join_with(&[right.stream()], |events| {
      let a = *downcast_event::<u32>(&events[0])?;
      let b = *downcast_event::<u32>(&events[1])?;
      Ok(Arc::new(a * 100 + b))
    })
    .subscribe(10, callback);
  left.push(1);
  assert!(values(&signals).is_empty());
  right.push(10);
  left.push(2);
  assert_eq!(values(&signals), vec![110, 210]);
}

#[test]
fn join_drops_combinations_beyond_downstream_demand() {
  let pipeline = pipeline();
  let left = pipeline.hot_source::<u32>();
  let right = pipeline.hot_source::<u32>();
  let (signals, callback) = collector();
  let _control = left
    .stream()
    .join_with(&[right.stream()], |events| {
      let a = *downcast_event::<u32>(&events[0])?;
      let b = *downcast_event::<u32>(&events[1])?;
      Ok(Arc::new(a * 100 + b))
    })
    .subscribe(1, callback);
  left.push(1);
  right.push(10);
  left.push(2);
  assert_eq!(values(&signals), vec![110]);
  assert!(errors(&signals).is_empty());
}

#[test]
fn async_boundary_crosses_into_the_worker_dispatcher() {
  let pipeline = pipeline();
  let source = pipeline.hot_source::<u32>();
  let worker = Arc::new(ThreadDispatcher::new("stream-worker"));
  let (sender, receiver) = mpsc::channel();
  let control = source
    .stream()
    .dispatch_on(worker)
    .map(|value: &u32| Ok(value + 1))
    .subscribe(DemandCounter::UNBOUNDED, move |signal| {
      if let Signal::Next(event) = signal {
        if let Ok(value) = downcast_event::<u32>(&event) {
          let _ = sender.send(*value);
        }
      }
    });
  // Demand registration crosses the worker asynchronously; keep pushing until it lands.
  let deadline = Instant::now() + Duration::from_secs(5);
  let received = loop {
    source.push(41);
    match receiver.recv_timeout(Duration::from_millis(20)) {
      | Ok(value) => break Some(value),
      | Err(_) if Instant::now() < deadline => continue,
      | Err(_) => break None,
    }
  };
  assert_eq!(received, Some(42));
  control.cancel();
}
