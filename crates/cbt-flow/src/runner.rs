use std::sync::Arc;

use tracing::{debug, info};

use crate::answers::AnswerValue;
use crate::error::FlowError;
use crate::result::{CaptureFields, SessionResult};
use crate::spec::question::Question;
use crate::spec::template::Template;
use crate::state::{Completion, FlowState, Mode, Phase};
use crate::store::{ResultSink, TemplateStore};

/// Owner of one run: holds the current [`FlowState`] and hands live results to a sink.
///
/// Calls must be serialized by the caller; the runner performs no locking.
pub struct SessionRunner {
    state: FlowState,
    sink: Arc<dyn ResultSink>,
}

impl SessionRunner {
    pub fn new(state: FlowState, sink: Arc<dyn ResultSink>) -> Self {
        info!(
            template_id = %state.template().id,
            mode = ?state.mode(),
            questions = state.template().len(),
            "session started"
        );
        Self { state, sink }
    }

    pub fn start(
        template: impl Into<Arc<Template>>,
        mode: Mode,
        sink: Arc<dyn ResultSink>,
    ) -> Result<Self, FlowError> {
        Ok(Self::new(FlowState::new(template, mode)?, sink))
    }

    /// Deep-link entry by template id.
    pub fn open(
        store: &dyn TemplateStore,
        template_id: &str,
        mode: Mode,
        sink: Arc<dyn ResultSink>,
    ) -> Result<Self, FlowError> {
        Ok(Self::new(FlowState::from_store(store, template_id, mode)?, sink))
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.state.current_question()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn progress_percent(&self) -> u8 {
        self.state.progress_percent()
    }

    pub fn can_go_back(&self) -> bool {
        self.state.can_go_back()
    }

    pub fn answer(&mut self, value: AnswerValue) -> Result<(), FlowError> {
        self.state = self.state.answer(value)?;
        Ok(())
    }

    pub fn clear_answer(&mut self) -> Result<(), FlowError> {
        self.state = self.state.clear_answer()?;
        Ok(())
    }

    /// Returns the phase after the move. On error the state is left as it was.
    pub fn advance(&mut self) -> Result<Phase, FlowError> {
        self.state = self.state.advance()?;
        Ok(self.state.phase())
    }

    /// Returns whether the current question changed.
    pub fn back(&mut self) -> bool {
        if !self.state.can_go_back() {
            return false;
        }
        self.state = self.state.back();
        true
    }

    /// Completes the run. Live results go to the sink before the state becomes
    /// `Completed`; a sink failure leaves the run in supplemental capture.
    pub fn complete_capture(&mut self, capture: CaptureFields) -> Result<SessionResult, FlowError> {
        let Completion { state, result } = self.state.complete_capture(capture)?;
        match state.mode() {
            Mode::Live => {
                self.sink.save_result(&result)?;
                info!(
                    session_id = %result.session_id,
                    template_id = %result.template_id,
                    steps = result.path_taken.len(),
                    "session result saved"
                );
            }
            Mode::Preview => {
                debug!(template_id = %result.template_id, "preview run finished; result discarded");
            }
        }
        self.state = state;
        Ok(result)
    }

    /// Starts over with a fresh state for the same template.
    pub fn restart(&mut self) -> Result<(), FlowError> {
        self.state = self.state.restart()?;
        Ok(())
    }
}
