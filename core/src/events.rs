use triad_types::MethodIndex;

/// Input events the brainstorm flow reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    SubmitProblem(String),
    TriggerGenerateMethods,
    SelectMethod(MethodIndex),
    TriggerFollowup,
    SubmitChatMessage(String),
}

impl UiEvent {
    /// Whether handling this event calls the model.
    #[must_use]
    pub fn calls_model(&self) -> bool {
        matches!(
            self,
            UiEvent::TriggerGenerateMethods | UiEvent::TriggerFollowup | UiEvent::SubmitChatMessage(_)
        )
    }
}
