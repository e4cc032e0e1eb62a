//! Core domain logic for Triad.
//!
//! - [`segment`] splits one method reply into a [`MethodSet`].
//! - [`state`] holds the problem, the methods, the selection and one
//!   append-only transcript per method.
//! - [`session`] drives the transitions, one model call per action.
//! - [`practice`] is the algorithm-critique flow.
//! - [`prompts`] holds the wording; [`errors`] the failure taxonomy.

pub mod errors;
mod events;
pub mod practice;
pub mod prompts;
pub mod segment;
pub mod session;
pub mod state;

pub use errors::{Notice, SessionError, Severity, ValidationError, format_session_error};
pub use events::UiEvent;
pub use practice::{ActiveProblem, PracticeSession, ProblemSource, SAMPLE_PROBLEMS};
pub use prompts::{DefaultPrompts, PromptTemplates};
pub use segment::{MethodSet, MethodText, NOT_GENERATED_PLACEHOLDER, ResponseSegmenter};
pub use session::SessionController;
pub use state::{ConversationState, GeneratedMethods, Phase, Speaker, Transcript, Turn};
