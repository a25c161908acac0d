use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::answers::Answers;
use crate::state::Mode;

/// Legacy flat-map key for the capture score.
pub const CAPTURE_PRIMARY_KEY: &str = "_capturePrimary";
/// Legacy flat-map key for the capture note.
pub const CAPTURE_NOTE_KEY: &str = "_captureNote";

/// Values collected by the post-questionnaire check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureFields {
    pub primary: i64,
    #[serde(default)]
    pub note: String,
}

impl CaptureFields {
    pub fn new(primary: i64, note: impl Into<String>) -> Self {
        Self {
            primary,
            note: note.into(),
        }
    }
}

/// Immutable record of one completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub session_id: Uuid,
    pub template_id: String,
    pub template_title: String,
    pub template_version: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub completed_at: OffsetDateTime,
    pub mode: Mode,
    pub answers: Answers,
    pub capture: CaptureFields,
    pub path_taken: Vec<String>,
}

impl SessionResult {
    /// Untyped answers plus the reserved capture keys, as older consumers expect them.
    pub fn flattened_answers(&self) -> Map<String, Value> {
        let mut map: Map<String, Value> = self
            .answers
            .iter()
            .map(|(id, answer)| (id.clone(), answer.to_json()))
            .collect();
        map.insert(
            CAPTURE_PRIMARY_KEY.into(),
            Value::Number(self.capture.primary.into()),
        );
        map.insert(
            CAPTURE_NOTE_KEY.into(),
            Value::String(self.capture.note.clone()),
        );
        map
    }
}
