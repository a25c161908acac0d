use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use cbt_flow::{
    AnswerValue, CaptureFields, FlowState, MemoryStore, Mode, Phase, ResultSink, ResultSource,
    SessionResult, SessionRunner, StoreError, Template,
};

fn check_in_fixture() -> Template {
    serde_json::from_value(json!({
        "id": "tmpl_check_in",
        "title": "Daily check-in",
        "version": 3,
        "questions": [
            {
                "id": "q1",
                "type": "single_choice",
                "prompt": "Did anything upsetting happen today?",
                "required": true,
                "options": [
                    { "id": "yes", "label": "Yes", "value": "Yes" },
                    { "id": "no", "label": "No", "value": "No" }
                ],
                "branches": [
                    { "option_id": "yes", "target_question_id": "q3" }
                ]
            },
            { "id": "q2", "type": "scale", "prompt": "Energy level", "range": { "min": 1, "max": 10 } },
            { "id": "q3", "type": "text", "prompt": "Anything else?" }
        ]
    }))
    .expect("fixture should deserialize")
}

#[derive(Default)]
struct CountingSink {
    calls: AtomicUsize,
}

impl ResultSink for CountingSink {
    fn save_result(&self, _result: &SessionResult) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FailingSink;

impl ResultSink for FailingSink {
    fn save_result(&self, _result: &SessionResult) -> Result<(), StoreError> {
        Err(StoreError::Io {
            path: PathBuf::from("results"),
            source: io::Error::other("disk full"),
        })
    }
}

fn walk_to_capture(runner: &mut SessionRunner) {
    runner.answer(AnswerValue::choice("No")).expect("answer q1");
    assert_eq!(runner.advance().expect("q1 -> q2"), Phase::InQuestion);
    runner.answer(AnswerValue::Scale(6.0)).expect("answer q2");
    assert_eq!(runner.advance().expect("q2 -> q3"), Phase::InQuestion);
    assert_eq!(
        runner.advance().expect("q3 -> capture"),
        Phase::SupplementalCapture
    );
}

#[test]
fn live_completion_saves_once_and_records_capture() {
    let sink = Arc::new(CountingSink::default());
    let mut runner =
        SessionRunner::start(check_in_fixture(), Mode::Live, sink.clone()).expect("start");
    walk_to_capture(&mut runner);

    let result = runner
        .complete_capture(CaptureFields::new(4, "felt okay"))
        .expect("complete");
    assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    assert_eq!(runner.phase(), Phase::Completed);
    assert_eq!(result.template_id, "tmpl_check_in");
    assert_eq!(result.template_title, "Daily check-in");
    assert_eq!(result.template_version, 3);
    assert_eq!(result.mode, Mode::Live);
    assert_eq!(result.capture, CaptureFields::new(4, "felt okay"));
    assert_eq!(result.path_taken, ["q1", "q2", "q3", "q3"]);
    assert_eq!(result.answers.get("q2"), Some(&AnswerValue::Scale(6.0)));

    let flat = result.flattened_answers();
    assert_eq!(flat["_capturePrimary"], json!(4));
    assert_eq!(flat["_captureNote"], json!("felt okay"));
    assert_eq!(flat["q1"], json!("No"));
    assert_eq!(flat["q2"], json!(6));
}

#[test]
fn second_completion_is_rejected_without_saving() {
    let sink = Arc::new(CountingSink::default());
    let mut runner =
        SessionRunner::start(check_in_fixture(), Mode::Live, sink.clone()).expect("start");
    walk_to_capture(&mut runner);
    runner
        .complete_capture(CaptureFields::new(3, ""))
        .expect("first completion");

    let err = runner
        .complete_capture(CaptureFields::new(5, "again"))
        .expect_err("second completion");
    assert_eq!(err.code(), "already_completed");
    assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    assert_eq!(runner.phase(), Phase::Completed);
    assert!(!runner.can_go_back());
    assert!(!runner.back());
}

#[test]
fn preview_completion_returns_result_but_never_saves() {
    let sink = Arc::new(CountingSink::default());
    let mut runner =
        SessionRunner::start(check_in_fixture(), Mode::Preview, sink.clone()).expect("start");
    walk_to_capture(&mut runner);

    let result = runner
        .complete_capture(CaptureFields::new(2, "preview"))
        .expect("complete");
    assert_eq!(result.mode, Mode::Preview);
    assert_eq!(sink.calls.load(Ordering::SeqCst), 0);

    runner.restart().expect("restart preview");
    assert_eq!(runner.phase(), Phase::InQuestion);
    assert_eq!(runner.state().current_question_id(), "q1");
    assert!(runner.state().answers().is_empty());
}

#[test]
fn capture_before_questions_are_exhausted_is_refused() {
    let state = FlowState::new(check_in_fixture(), Mode::Live).expect("start");
    let err = state
        .complete_capture(CaptureFields::new(3, ""))
        .expect_err("still in questions");
    assert_eq!(err.code(), "capture_not_ready");
}

#[test]
fn completed_state_stays_completed() {
    let capture = FlowState::new(check_in_fixture(), Mode::Preview)
        .and_then(|state| state.answer(AnswerValue::choice("Yes")))
        .and_then(|state| state.advance())
        .and_then(|state| state.advance())
        .expect("walk");
    assert_eq!(capture.phase(), Phase::SupplementalCapture);

    let done = capture
        .complete_capture(CaptureFields::new(1, "rough"))
        .expect("complete");
    assert_eq!(done.result.path_taken, ["q1", "q3", "q3"]);
    assert_eq!(done.state.history(), ["q1", "q3"]);
    assert_eq!(done.state.phase(), Phase::Completed);
    assert_eq!(done.state.back().phase(), Phase::Completed);
    assert_eq!(
        done.state
            .complete_capture(CaptureFields::new(1, "rough"))
            .expect_err("single use")
            .code(),
        "already_completed"
    );
    // the capture-phase value is still usable by its owner
    assert_eq!(capture.phase(), Phase::SupplementalCapture);
}

#[test]
fn sink_failure_keeps_run_in_capture() {
    let mut runner =
        SessionRunner::start(check_in_fixture(), Mode::Live, Arc::new(FailingSink)).expect("start");
    walk_to_capture(&mut runner);

    let err = runner
        .complete_capture(CaptureFields::new(3, ""))
        .expect_err("sink fails");
    assert_eq!(err.code(), "io");
    assert_eq!(runner.phase(), Phase::SupplementalCapture);
}

#[test]
fn deep_link_opens_template_by_id() {
    let store = Arc::new(MemoryStore::with_templates([check_in_fixture()]));
    let mut runner =
        SessionRunner::open(store.as_ref(), "tmpl_check_in", Mode::Live, store.clone())
            .expect("open");
    walk_to_capture(&mut runner);
    let result = runner
        .complete_capture(CaptureFields::new(5, "great"))
        .expect("complete");

    let saved = store.list_results(Some("tmpl_check_in")).expect("list");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].session_id, result.session_id);
    assert!(store.list_results(Some("other")).expect("list").is_empty());

    let missing = SessionRunner::open(store.as_ref(), "nope", Mode::Live, store.clone())
        .err()
        .expect("unknown template");
    assert_eq!(missing.code(), "not_found");
}

#[test]
fn path_taken_is_history_plus_final_question() {
    let sink = Arc::new(MemoryStore::new());
    let mut runner =
        SessionRunner::start(check_in_fixture(), Mode::Live, sink.clone()).expect("start");
    walk_to_capture(&mut runner);
    assert_eq!(runner.state().history(), ["q1", "q2", "q3"]);

    let result = runner
        .complete_capture(CaptureFields::new(4, "felt okay"))
        .expect("complete");
    let mut expected = runner.state().history().to_vec();
    expected.push("q3".to_string());
    assert_eq!(result.path_taken, expected);
    assert_eq!(sink.list_results(None).expect("list")[0].path_taken, expected);
}
