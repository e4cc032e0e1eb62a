//! Algorithmic-thinking practice: pick a problem, describe the steps and the
//! reasoning behind them, get a critique back.

use triad_types::{ChatMessage, NonEmptyString};

use crate::errors::ValidationError;
use crate::prompts::PromptTemplates;

pub const SAMPLE_PROBLEMS: [&str; 4] = [
    "Find the most frequent element in a list",
    "Find the maximum value in an array",
    "Decide whether a string is a palindrome",
    "Remove consecutive duplicate values",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProblemSource {
    /// A built-in sample, unless the learner typed their own problem.
    #[default]
    Sample,
    /// The last problem the model generated.
    Generated,
}

/// The problem feedback will be requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveProblem<'a> {
    pub text: &'a str,
    pub user_authored: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PracticeSession {
    source: ProblemSource,
    sample: usize,
    custom: String,
    generated: Option<NonEmptyString>,
    feedback: Option<NonEmptyString>,
}

impl PracticeSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn source(&self) -> ProblemSource {
        self.source
    }

    #[must_use]
    pub fn sample(&self) -> &'static str {
        SAMPLE_PROBLEMS[self.sample % SAMPLE_PROBLEMS.len()]
    }

    /// Advance to the next sample problem and make samples the active source.
    pub fn cycle_sample(&mut self) {
        self.sample = (self.sample + 1) % SAMPLE_PROBLEMS.len();
        self.source = ProblemSource::Sample;
    }

    #[must_use]
    pub fn custom_problem(&self) -> &str {
        &self.custom
    }

    /// A newly typed problem overrides the selected sample and any generated one.
    ///
    /// Re-submitting the same text keeps the current source.
    pub fn set_custom_problem(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.custom && !text.trim().is_empty() {
            self.source = ProblemSource::Sample;
        }
        self.custom = text;
    }

    #[must_use]
    pub fn generated_problem(&self) -> Option<&str> {
        self.generated.as_deref()
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    #[must_use]
    pub fn active_problem(&self) -> Option<ActiveProblem<'_>> {
        match self.source {
            ProblemSource::Sample => {
                let custom = self.custom.trim();
                if custom.is_empty() {
                    Some(ActiveProblem {
                        text: self.sample(),
                        user_authored: false,
                    })
                } else {
                    Some(ActiveProblem {
                        text: custom,
                        user_authored: true,
                    })
                }
            }
            ProblemSource::Generated => self.generated.as_deref().map(|text| ActiveProblem {
                text,
                user_authored: false,
            }),
        }
    }

    pub(crate) fn problem_request(prompts: &impl PromptTemplates) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(prompts.practice_instruction()),
            ChatMessage::user(prompts.practice_problem_request()),
        ]
    }

    /// Validate the inputs and build the critique request. Nothing changes on error.
    pub(crate) fn feedback_request(
        &self,
        prompts: &impl PromptTemplates,
        steps: &str,
        reason: &str,
    ) -> Result<Vec<ChatMessage>, ValidationError> {
        let problem = self.active_problem();
        let steps = steps.trim();
        let reason = reason.trim();

        let missing: Vec<&'static str> = [
            (problem.is_none(), "problem"),
            (steps.is_empty(), "steps"),
            (reason.is_empty(), "reason"),
        ]
        .into_iter()
        .filter_map(|(missing, name)| missing.then_some(name))
        .collect();

        let Some(problem) = problem.filter(|_| missing.is_empty()) else {
            return Err(ValidationError::IncompletePractice { missing });
        };

        Ok(vec![
            ChatMessage::system(prompts.practice_instruction()),
            ChatMessage::user(prompts.practice_feedback(
                problem.text,
                steps,
                reason,
                problem.user_authored,
            )),
        ])
    }

    pub(crate) fn install_generated(&mut self, problem: NonEmptyString) {
        self.generated = Some(problem);
        self.source = ProblemSource::Generated;
    }

    pub(crate) fn install_feedback(&mut self, feedback: NonEmptyString) {
        self.feedback = Some(feedback);
    }
}

/// Strip whitespace and any wrapping quotes from a generated title.
#[must_use]
pub fn clean_problem_title(raw: &str) -> &str {
    raw.trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '\u{201c}' | '\u{201d}'))
        .trim()
}
