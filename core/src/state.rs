//! Conversation state for the brainstorm flow.
//!
//! [`ConversationState`] is a plain value owned by the session controller.
//! It holds the submitted problem, the current [`MethodSet`], the selected
//! method and one append-only [`Transcript`] per method. Mutators are
//! crate-private: only the controller changes state, and only after a call
//! has succeeded.

use triad_types::{MethodIndex, NonEmptyString};

use crate::segment::MethodSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Speaker,
    pub content: String,
}

impl Turn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered turns for one method. Turns are never edited or removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The follow-up is the opening assistant turn, when there is one.
    #[must_use]
    pub fn followup(&self) -> Option<&Turn> {
        self.turns
            .first()
            .filter(|turn| turn.speaker == Speaker::Assistant)
    }

    #[must_use]
    pub fn is_followup(&self, position: usize) -> bool {
        position == 0 && self.followup().is_some()
    }

    #[must_use]
    pub fn has_user_turns(&self) -> bool {
        self.turns.iter().any(|turn| turn.speaker == Speaker::User)
    }

    fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }
}

/// Where the brainstorm flow currently is. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    MethodsGenerated,
    MethodSelected,
    FollowupReceived,
    Chatting,
}

/// A method set together with the problem it was generated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMethods {
    pub problem: NonEmptyString,
    pub methods: MethodSet,
}

#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    problem: String,
    generated: Option<GeneratedMethods>,
    selected: Option<MethodIndex>,
    transcripts: [Transcript; 3],
}

impl ConversationState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently submitted problem text (may be blank).
    #[must_use]
    pub fn problem(&self) -> &str {
        &self.problem
    }

    #[must_use]
    pub fn generated(&self) -> Option<&GeneratedMethods> {
        self.generated.as_ref()
    }

    #[must_use]
    pub fn methods(&self) -> Option<&MethodSet> {
        self.generated.as_ref().map(|g| &g.methods)
    }

    #[must_use]
    pub fn selected(&self) -> Option<MethodIndex> {
        self.selected
    }

    #[must_use]
    pub fn transcript(&self, index: MethodIndex) -> &Transcript {
        &self.transcripts[index.position()]
    }

    /// Transcript of the selected method.
    #[must_use]
    pub fn active_transcript(&self) -> Option<&Transcript> {
        self.selected.map(|index| self.transcript(index))
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.generated.is_none() {
            return Phase::Empty;
        }
        let Some(transcript) = self.active_transcript() else {
            return Phase::MethodsGenerated;
        };
        if transcript.has_user_turns() {
            Phase::Chatting
        } else if transcript.followup().is_some() {
            Phase::FollowupReceived
        } else {
            Phase::MethodSelected
        }
    }

    pub(crate) fn set_problem(&mut self, problem: String) {
        self.problem = problem;
    }

    /// Replace the method set wholesale. Selection and every transcript reset.
    pub(crate) fn install_methods(&mut self, generated: GeneratedMethods) {
        self.generated = Some(generated);
        self.selected = None;
        self.transcripts = Default::default();
    }

    pub(crate) fn select(&mut self, index: MethodIndex) {
        self.selected = Some(index);
    }

    pub(crate) fn append_assistant(&mut self, index: MethodIndex, content: String) {
        self.transcripts[index.position()].push(Turn::assistant(content));
    }

    /// Commit a question and its answer together.
    pub(crate) fn append_exchange(&mut self, index: MethodIndex, question: String, answer: String) {
        let transcript = &mut self.transcripts[index.position()];
        transcript.push(Turn::user(question));
        transcript.push(Turn::assistant(answer));
    }
}
