//! View model: screens, focus, editor drafts and the busy flag.
//!
//! Conversation data lives in the session controller. This only holds what
//! the terminal needs on top of it.

use triad_types::MethodIndex;

use crate::draft::DraftInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Brainstorm,
    Practice,
}

impl Screen {
    #[must_use]
    pub fn toggle(self) -> Self {
        match self {
            Screen::Brainstorm => Screen::Practice,
            Screen::Practice => Screen::Brainstorm,
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Screen::Brainstorm => "Brainstorm",
            Screen::Practice => "Practice",
        }
    }

    /// Editors on this screen, top to bottom.
    #[must_use]
    pub fn fields(self) -> &'static [Field] {
        match self {
            Screen::Brainstorm => &[Field::Problem, Field::Chat],
            Screen::Practice => &[Field::CustomProblem, Field::Steps, Field::Reason],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Problem,
    Chat,
    CustomProblem,
    Steps,
    Reason,
}

impl Field {
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Field::Problem => "Problem",
            Field::Chat => "Ask about the selected method",
            Field::CustomProblem => "Your own problem (overrides the sample)",
            Field::Steps => "Steps",
            Field::Reason => "Why this order and approach",
        }
    }

    #[must_use]
    pub fn placeholder(self) -> &'static str {
        match self {
            Field::Problem => {
                "e.g. Remove duplicates from a daily CSV before loading it into the database"
            }
            Field::Chat => "Select a method, then type a question",
            Field::CustomProblem => "e.g. Sort records by date",
            Field::Steps => "Describe the algorithm in plain words or pseudocode",
            Field::Reason => "Explain why you chose these steps",
        }
    }

    fn slot(self) -> usize {
        match self {
            Field::Problem => 0,
            Field::Chat => 1,
            Field::CustomProblem => 2,
            Field::Steps => 3,
            Field::Reason => 4,
        }
    }
}

/// Something only the session controller can carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GenerateMethods { problem: String },
    SelectMethod(MethodIndex),
    RequestFollowup,
    SendChat(String),
    GeneratePracticeProblem,
    CycleSample,
    SetCustomProblem(String),
    RequestFeedback {
        custom: String,
        steps: String,
        reason: String,
    },
}

impl Command {
    /// Status text while the model call for this command is in flight.
    #[must_use]
    pub fn busy_label(&self) -> Option<&'static str> {
        match self {
            Command::GenerateMethods { .. } => Some("Generating three methods"),
            Command::RequestFollowup => Some("Writing the follow-up"),
            Command::SendChat(_) => Some("Waiting for the reply"),
            Command::GeneratePracticeProblem => Some("Thinking of a problem"),
            Command::RequestFeedback { .. } => Some("Reviewing your steps"),
            Command::SelectMethod(_) | Command::CycleSample | Command::SetCustomProblem(_) => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct App {
    screen: Screen,
    focus: Option<Field>,
    drafts: [DraftInput; 5],
    busy: Option<&'static str>,
    high_contrast: bool,
    model_label: String,
    scroll: u16,
    scroll_max: u16,
    follow_tail: bool,
    should_quit: bool,
}

impl App {
    #[must_use]
    pub fn new(model_label: impl Into<String>, high_contrast: bool) -> Self {
        Self {
            model_label: model_label.into(),
            high_contrast,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn toggle_screen(&mut self) {
        self.screen = self.screen.toggle();
        self.focus = None;
        self.scroll_to_top();
    }

    #[must_use]
    pub fn focus(&self) -> Option<Field> {
        self.focus
    }

    pub fn set_focus(&mut self, field: Option<Field>) {
        self.focus = field;
    }

    /// Move focus to the next editor on the current screen, wrapping.
    pub fn focus_next(&mut self) {
        let fields = self.screen.fields();
        let next = match self.focus.and_then(|f| fields.iter().position(|x| *x == f)) {
            Some(i) => fields[(i + 1) % fields.len()],
            None => fields[0],
        };
        self.focus = Some(next);
    }

    #[must_use]
    pub fn draft(&self, field: Field) -> &DraftInput {
        &self.drafts[field.slot()]
    }

    pub fn draft_mut(&mut self, field: Field) -> &mut DraftInput {
        &mut self.drafts[field.slot()]
    }

    #[must_use]
    pub fn busy(&self) -> Option<&'static str> {
        self.busy
    }

    pub fn set_busy(&mut self, label: &'static str) {
        self.busy = Some(label);
    }

    pub fn clear_busy(&mut self) {
        self.busy = None;
    }

    #[must_use]
    pub fn high_contrast(&self) -> bool {
        self.high_contrast
    }

    #[must_use]
    pub fn model_label(&self) -> &str {
        &self.model_label
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        if self.follow_tail {
            self.scroll = self.scroll_max;
            self.follow_tail = false;
        }
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.scroll_max);
        self.follow_tail = self.scroll == self.scroll_max && self.scroll_max > 0;
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
        self.follow_tail = false;
    }

    /// Keep the newest content in view until the user scrolls.
    pub fn scroll_to_bottom(&mut self) {
        self.follow_tail = true;
    }

    pub(crate) fn update_scroll_max(&mut self, max: u16) {
        self.scroll_max = max;
        if self.follow_tail {
            self.scroll = max;
        } else {
            self.scroll = self.scroll.min(max);
        }
    }

    #[must_use]
    pub fn scroll_offset(&self) -> u16 {
        self.scroll
    }
}
