#![allow(missing_docs)]

pub mod answers;
pub mod error;
pub mod progress;
pub mod result;
pub mod runner;
pub mod schema;
pub mod spec;
pub mod state;
pub mod store;
pub mod validate;

pub use answers::{AnswerShapeError, AnswerValue, Answers};
pub use error::{FatalCode, FlowError, StoreError, ValidationCode};
pub use progress::{BranchFallback, NextStep, Via, explain_next, progress_percent, resolve_next};
pub use result::{CAPTURE_NOTE_KEY, CAPTURE_PRIMARY_KEY, CaptureFields, SessionResult};
pub use runner::SessionRunner;
pub use schema::{answers_schema, template_schema};
pub use spec::{Branch, ChoiceOption, Question, QuestionKind, ScaleRange, Template};
pub use state::{Completion, FlowState, Mode, Phase};
pub use store::{MemoryStore, ResultSink, ResultSource, TemplateStore};
pub use validate::{Severity, TemplateIssue, check_required, is_valid_id, lint_template};
