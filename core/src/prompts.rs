//! Prompt wording.
//!
//! The controller only needs each template to return one string for a
//! message body. [`DefaultPrompts`] is the built-in English wording; swap in
//! another [`PromptTemplates`] to change tone or language.

use crate::segment::{METHOD_A_MARKER, METHOD_B_MARKER, METHOD_C_MARKER};

pub trait PromptTemplates: Send + Sync {
    /// System message for the brainstorm flow.
    fn system_instruction(&self) -> &str;

    /// User message asking for three labelled methods.
    fn generate_methods(&self, problem: &str) -> String;

    /// User message asking for a detailed follow-up on one method.
    fn followup(&self, problem: &str, method: &str) -> String;

    /// System note that grounds a chat turn in the selected method.
    fn method_note(&self, method: &str) -> String;

    /// System message for the practice flow.
    fn practice_instruction(&self) -> &str;

    /// User message asking for a single fresh exercise title.
    fn practice_problem_request(&self) -> String;

    /// User message asking for critique of the learner's steps.
    fn practice_feedback(
        &self,
        problem: &str,
        steps: &str,
        reason: &str,
        comment_on_problem: bool,
    ) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPrompts;

const SYSTEM_INSTRUCTION: &str = "You are a pragmatic senior engineer helping a developer \
solve a concrete problem. Propose realistic approaches, be specific about tools and trade-offs, \
and keep answers well structured.";

const PRACTICE_INSTRUCTION: &str = "You are a teaching assistant who builds logical thinking \
in beginning developers. For the problem and algorithm steps the learner gives you:\n\
1. point out what is well structured and what is missing\n\
2. suggest alternatives that improve efficiency or convenience\n\
3. ask questions that deepen their thinking\n\
Use everyday analogies where they help.";

impl PromptTemplates for DefaultPrompts {
    fn system_instruction(&self) -> &str {
        SYSTEM_INSTRUCTION
    }

    fn generate_methods(&self, problem: &str) -> String {
        format!(
            "Problem:\n{problem}\n\n\
             Propose exactly three different approaches to solve it. \
             Start each approach on its own line with these exact labels:\n\
             {METHOD_A_MARKER} <name>\n\
             {METHOD_B_MARKER} <name>\n\
             {METHOD_C_MARKER} <name>\n\
             Under each label give a short overview, the main steps, and the pros and cons."
        )
    }

    fn followup(&self, problem: &str, method: &str) -> String {
        format!(
            "Problem:\n{problem}\n\nChosen approach:\n{method}\n\n\
             Explain how to implement this approach in detail: the concrete steps, \
             recommended libraries or tools, pitfalls to watch for, and how to verify the result."
        )
    }

    fn method_note(&self, method: &str) -> String {
        format!("The user selected the following approach.\n\n{method}")
    }

    fn practice_instruction(&self) -> &str {
        PRACTICE_INSTRUCTION
    }

    fn practice_problem_request(&self) -> String {
        "Generate exactly one algorithm exercise title for beginning developers, in the style of \
         \"Find the most frequent element in a list\". Avoid the usual textbook problems \
         (maximum, mode, sorting) and pick a theme that needs some creativity. \
         Reply with the title only, no commentary."
            .to_string()
    }

    fn practice_feedback(
        &self,
        problem: &str,
        steps: &str,
        reason: &str,
        comment_on_problem: bool,
    ) -> String {
        let note = if comment_on_problem {
            ""
        } else {
            "Skip any commentary on the problem itself.\n"
        };
        format!(
            "Problem: {problem}\n\
             Steps: {steps}\n\
             Reasoning: {reason}\n\
             {note}\
             Using the information above, review the structure of the algorithm and give:\n\
             1. strengths and improvements\n\
             2. alternatives or hints\n\
             3. questions that deepen the thinking"
        )
    }
}
