use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::answers::{AnswerValue, Answers};
use crate::error::{FatalCode, FlowError};
use crate::progress::{progress_percent, resolve_next};
use crate::result::{CaptureFields, SessionResult};
use crate::spec::question::Question;
use crate::spec::template::Template;
use crate::store::TemplateStore;
use crate::validate::check_required;

/// Whether a run persists its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Live,
    Preview,
}

/// Lifecycle phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    InQuestion,
    SupplementalCapture,
    Completed,
}

/// Output of a successful `complete_capture`.
#[derive(Debug, Clone)]
pub struct Completion {
    pub state: FlowState,
    pub result: SessionResult,
}

/// Run-time state of one questionnaire traversal.
///
/// Every operation borrows the state and returns a new one; a value is never
/// changed after construction. `history` holds the ids the user departed from,
/// so `back` replays the literal path while `advance` recomputes branches.
#[derive(Debug, Clone)]
pub struct FlowState {
    template: Arc<Template>,
    mode: Mode,
    phase: Phase,
    current_question_id: String,
    history: Vec<String>,
    answers: Answers,
}

impl FlowState {
    /// Starts a run at the first question. Fails with `empty_template` when there is none.
    pub fn new(template: impl Into<Arc<Template>>, mode: Mode) -> Result<Self, FlowError> {
        let template = template.into();
        let first = template
            .first_question()
            .ok_or(FatalCode::EmptyTemplate)?
            .id
            .clone();
        debug!(template_id = %template.id, ?mode, first = %first, "flow started");
        Ok(Self {
            template,
            mode,
            phase: Phase::InQuestion,
            current_question_id: first,
            history: Vec::new(),
            answers: Answers::new(),
        })
    }

    /// Deep-link entry: loads `template_id` from `store` and starts a run.
    pub fn from_store(
        store: &dyn TemplateStore,
        template_id: &str,
        mode: Mode,
    ) -> Result<Self, FlowError> {
        let template = store.get_template(template_id)?;
        Self::new(template, mode)
    }

    /// Fresh run over the same template and mode.
    pub fn restart(&self) -> Result<Self, FlowError> {
        Self::new(Arc::clone(&self.template), self.mode)
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_question_id(&self) -> &str {
        &self.current_question_id
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.template.question(&self.current_question_id)
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&AnswerValue> {
        self.answers.get(question_id)
    }

    /// 1-based position of the current question along the path taken.
    pub fn step_number(&self) -> usize {
        self.history.len() + 1
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty() && self.phase != Phase::Completed
    }

    /// Cosmetic estimate; reaches 100 once the questions are exhausted.
    pub fn progress_percent(&self) -> u8 {
        match self.phase {
            Phase::InQuestion => progress_percent(self.history.len(), self.template.len()),
            Phase::SupplementalCapture | Phase::Completed => 100,
        }
    }

    /// Records `value` for the current question. No validation happens here.
    pub fn answer(&self, value: AnswerValue) -> Result<Self, FlowError> {
        self.ensure_in_question()?;
        let mut next = self.clone();
        next.answers.insert(self.current_question_id.clone(), value);
        Ok(next)
    }

    /// Drops the answer of the current question.
    pub fn clear_answer(&self) -> Result<Self, FlowError> {
        self.ensure_in_question()?;
        let mut next = self.clone();
        next.answers.remove(&self.current_question_id);
        Ok(next)
    }

    /// Validates the current question and moves to the resolved next one, or
    /// to supplemental capture when the template is exhausted.
    pub fn advance(&self) -> Result<Self, FlowError> {
        self.ensure_in_question()?;
        let question = self
            .current_question()
            .ok_or(FatalCode::NotInQuestion)?;
        check_required(question, &self.answers)?;

        let target = resolve_next(&self.template, &self.answers, &self.current_question_id)
            .map(str::to_owned);
        let mut next = self.clone();
        next.history.push(self.current_question_id.clone());
        match target {
            Some(id) => {
                debug!(from = %self.current_question_id, to = %id, "advanced");
                next.current_question_id = id;
            }
            None => {
                debug!(from = %self.current_question_id, "questions exhausted");
                next.phase = Phase::SupplementalCapture;
            }
        }
        Ok(next)
    }

    /// Returns to the question the user last departed from. Without history this is a no-op.
    pub fn back(&self) -> Self {
        let mut next = self.clone();
        if self.phase == Phase::Completed {
            return next;
        }
        if let Some(previous) = next.history.pop() {
            debug!(from = %self.current_question_id, to = %previous, "went back");
            next.current_question_id = previous;
            next.phase = Phase::InQuestion;
        }
        next
    }

    /// Finishes the run. The returned state is `Completed`; a completed state rejects a second call.
    pub fn complete_capture(&self, capture: CaptureFields) -> Result<Completion, FlowError> {
        match self.phase {
            Phase::InQuestion => return Err(FatalCode::CaptureNotReady.into()),
            Phase::Completed => return Err(FatalCode::AlreadyCompleted.into()),
            Phase::SupplementalCapture => {}
        }

        // History already ends with the last question; the final id is appended regardless.
        let mut path_taken = self.history.clone();
        path_taken.push(self.current_question_id.clone());

        let result = SessionResult {
            session_id: Uuid::new_v4(),
            template_id: self.template.id.clone(),
            template_title: self.template.title.clone(),
            template_version: self.template.version,
            completed_at: OffsetDateTime::now_utc(),
            mode: self.mode,
            answers: self.answers.clone(),
            capture,
            path_taken,
        };

        let mut state = self.clone();
        state.phase = Phase::Completed;
        Ok(Completion { state, result })
    }

    fn ensure_in_question(&self) -> Result<(), FlowError> {
        if self.phase == Phase::InQuestion {
            Ok(())
        } else {
            Err(FatalCode::NotInQuestion.into())
        }
    }
}
