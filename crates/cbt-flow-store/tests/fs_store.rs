use std::fs;
use std::sync::Arc;

use cbt_flow::{
    AnswerValue, Answers, CaptureFields, Mode, Phase, ResultSink, ResultSource, SessionResult,
    SessionRunner, StoreError, Template, TemplateStore,
};
use cbt_flow_store::FsStore;
use tempfile::TempDir;
use time::OffsetDateTime;
use uuid::Uuid;

fn open_store() -> (TempDir, FsStore) {
    let temp = TempDir::new().expect("temp dir");
    let store = FsStore::open(temp.path().join("data")).expect("open store");
    (temp, store)
}

fn result_at(template_id: &str, unix: i64) -> SessionResult {
    SessionResult {
        session_id: Uuid::new_v4(),
        template_id: template_id.into(),
        template_title: "Title".into(),
        template_version: 1,
        completed_at: OffsetDateTime::from_unix_timestamp(unix).expect("timestamp"),
        mode: Mode::Live,
        answers: Answers::new(),
        capture: CaptureFields::new(3, ""),
        path_taken: vec!["q1".into()],
    }
}

#[test]
fn open_creates_layout() {
    let (_temp, store) = open_store();
    assert!(store.root().join("templates").is_dir());
    assert!(store.root().join("results").is_dir());
}

#[test]
fn seeding_happens_only_into_an_empty_store() {
    let (_temp, store) = open_store();
    assert_eq!(store.seed_builtin().expect("seed"), 3);
    assert_eq!(store.seed_builtin().expect("seed again"), 0);

    let ids: Vec<_> = store
        .list_templates()
        .expect("list")
        .into_iter()
        .map(|template| template.id)
        .collect();
    assert_eq!(
        ids,
        ["tmpl_anxiety_001", "tmpl_depression_001", "tmpl_stress_001"]
    );
}

#[test]
fn template_crud_round_trips() {
    let (_temp, store) = open_store();
    let template: Template = serde_json::from_value(serde_json::json!({
        "id": "tmpl_custom",
        "title": "Custom",
        "updated_at": "2026-10-01T09:30:00Z",
        "questions": [ { "id": "q1", "type": "text", "prompt": "Hello?" } ]
    }))
    .expect("fixture");

    store.save_template(&template).expect("save");
    assert_eq!(store.get_template("tmpl_custom").expect("get"), template);
    assert!(store.delete_template("tmpl_custom").expect("delete"));
    assert!(!store.delete_template("tmpl_custom").expect("delete twice"));
    assert!(matches!(
        store.get_template("tmpl_custom"),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn path_like_ids_are_rejected() {
    let (_temp, store) = open_store();
    assert!(matches!(
        store.get_template("../secrets"),
        Err(StoreError::InvalidId(_))
    ));
    let template = Template::new("a/b", "Bad", Vec::new());
    assert!(matches!(
        store.save_template(&template),
        Err(StoreError::InvalidId(_))
    ));
}

#[test]
fn unreadable_templates_are_skipped_when_listing() {
    let (_temp, store) = open_store();
    store.seed_builtin().expect("seed");
    fs::write(store.root().join("templates/broken.json"), "{ not json").expect("write");
    assert_eq!(store.list_templates().expect("list").len(), 3);
    assert_eq!(
        store.get_template("broken").expect_err("broken").code(),
        "json"
    );
}

#[test]
fn results_are_filtered_and_ordered_by_completion() {
    let (_temp, store) = open_store();
    store.save_result(&result_at("b", 300)).expect("save");
    store.save_result(&result_at("a", 200)).expect("save");
    store.save_result(&result_at("a", 100)).expect("save");

    let all = store.list_results(None).expect("list");
    let stamps: Vec<_> = all
        .iter()
        .map(|result| result.completed_at.unix_timestamp())
        .collect();
    assert_eq!(stamps, [100, 200, 300]);
    assert_eq!(store.list_results(Some("a")).expect("list").len(), 2);
}

#[test]
fn unreadable_results_are_skipped_when_listing() {
    let (_temp, store) = open_store();
    store.save_result(&result_at("a", 100)).expect("save");
    fs::write(store.root().join("results/broken.json"), "{").expect("write");
    fs::write(store.root().join("templates/broken.json"), "{").expect("write");

    assert!(store.list_templates().expect("templates").is_empty());
    let results = store.list_results(None).expect("results");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].template_id, "a");
    assert_eq!(store.list_results(Some("a")).expect("filtered").len(), 1);
}

#[test]
fn live_run_persists_through_the_store() {
    let (_temp, store) = open_store();
    store.seed_builtin().expect("seed");
    let store = Arc::new(store);

    let mut runner = SessionRunner::open(
        store.as_ref(),
        "tmpl_anxiety_001",
        Mode::Live,
        store.clone(),
    )
    .expect("open");
    runner.answer(AnswerValue::choice("1")).expect("anx_q1");
    runner.advance().expect("to anx_q2");
    runner.answer(AnswerValue::choice("yes")).expect("anx_q2");
    runner.advance().expect("branch to panic");
    assert_eq!(runner.state().current_question_id(), "anx_q3_panic");
    runner
        .answer(AnswerValue::text("on the train"))
        .expect("anx_q3_panic");
    runner.advance().expect("to anx_q4_worry");
    runner.advance().expect("to anx_q5");
    assert_eq!(runner.advance().expect("exhausted"), Phase::SupplementalCapture);
    let result = runner
        .complete_capture(CaptureFields::new(2, "tired"))
        .expect("complete");

    let saved = store.list_results(Some("tmpl_anxiety_001")).expect("list");
    assert_eq!(saved, [result]);
    assert_eq!(
        saved[0].path_taken,
        ["anx_q1", "anx_q2", "anx_q3_panic", "anx_q4_worry", "anx_q5", "anx_q5"]
    );
}
