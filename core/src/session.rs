//! The session controller.
//!
//! Every action issues at most one [`ChatClient`] call and touches
//! [`ConversationState`] only after that call succeeds. A failed action
//! leaves the state exactly as it was and records a [`Notice`]. Nothing is
//! retried here; transport retry belongs to the client.

use triad_providers::{ChatClient, ChatError, ChatRequest};
use triad_types::{ChatMessage, GenerationProfile, MethodIndex, NonEmptyString, Provider};

use crate::errors::{Notice, SessionError, ValidationError};
use crate::events::UiEvent;
use crate::practice::{PracticeSession, clean_problem_title};
use crate::prompts::{DefaultPrompts, PromptTemplates};
use crate::segment::ResponseSegmenter;
use crate::state::{ConversationState, GeneratedMethods, Speaker};

pub struct SessionController<C, P = DefaultPrompts> {
    client: C,
    prompts: P,
    segmenter: ResponseSegmenter,
    generation: GenerationProfile,
    provider: Provider,
    state: ConversationState,
    practice: PracticeSession,
    last_error: Option<Notice>,
}

impl<C: ChatClient> SessionController<C> {
    #[must_use]
    pub fn new(client: C, generation: GenerationProfile) -> Self {
        Self {
            client,
            prompts: DefaultPrompts,
            segmenter: ResponseSegmenter::default(),
            generation,
            provider: Provider::default(),
            state: ConversationState::new(),
            practice: PracticeSession::new(),
            last_error: None,
        }
    }
}

impl<C: ChatClient, P: PromptTemplates> SessionController<C, P> {
    #[must_use]
    pub fn with_prompts<Q: PromptTemplates>(self, prompts: Q) -> SessionController<C, Q> {
        SessionController {
            client: self.client,
            prompts,
            segmenter: self.segmenter,
            generation: self.generation,
            provider: self.provider,
            state: self.state,
            practice: self.practice,
            last_error: self.last_error,
        }
    }

    /// Provider named in authentication hints.
    #[must_use]
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    #[must_use]
    pub fn with_segmenter(mut self, segmenter: ResponseSegmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    #[must_use]
    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    #[must_use]
    pub fn practice(&self) -> &PracticeSession {
        &self.practice
    }

    /// Local practice edits (sample choice, typed problem). No calls are made.
    pub fn practice_mut(&mut self) -> &mut PracticeSession {
        &mut self.practice
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&Notice> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    pub async fn dispatch(&mut self, event: UiEvent) -> Result<(), SessionError> {
        match event {
            UiEvent::SubmitProblem(text) => {
                self.submit_problem(text);
                Ok(())
            }
            UiEvent::TriggerGenerateMethods => self.generate_methods().await,
            UiEvent::SelectMethod(index) => self.select_method(index),
            UiEvent::TriggerFollowup => self.request_followup().await,
            UiEvent::SubmitChatMessage(text) => self.send_chat_turn(&text).await,
        }
    }

    pub fn submit_problem(&mut self, text: impl Into<String>) {
        self.state.set_problem(text.into());
        self.last_error = None;
    }

    pub async fn generate_methods(&mut self) -> Result<(), SessionError> {
        let result = self.try_generate_methods().await;
        self.settle(result)
    }

    async fn try_generate_methods(&mut self) -> Result<(), SessionError> {
        let problem =
            NonEmptyString::trimmed(self.state.problem()).map_err(|_| ValidationError::EmptyProblem)?;

        let request = ChatRequest::new(
            vec![
                ChatMessage::system(self.prompts.system_instruction()),
                ChatMessage::user(self.prompts.generate_methods(problem.as_str())),
            ],
            self.generation.methods,
        );
        let reply = self.client.complete(&request).await?;
        let methods = self.segmenter.segment(&reply);

        tracing::info!(
            generated = methods.generated_count(),
            "Generated methods"
        );
        self.state
            .install_methods(GeneratedMethods { problem, methods });
        Ok(())
    }

    /// Selecting never clears a transcript, including the one being re-selected.
    pub fn select_method(&mut self, index: MethodIndex) -> Result<(), SessionError> {
        let result = if self.state.methods().is_some() {
            self.state.select(index);
            tracing::info!(method = %index, "Selected method");
            Ok(())
        } else {
            Err(ValidationError::NoMethods.into())
        };
        self.settle(result)
    }

    pub async fn request_followup(&mut self) -> Result<(), SessionError> {
        let result = self.try_request_followup().await;
        self.settle(result)
    }

    async fn try_request_followup(&mut self) -> Result<(), SessionError> {
        let (index, request) = {
            let (index, generated) = self.selection()?;
            let method = generated.methods.get(index).text().unwrap_or_default();
            let request = ChatRequest::new(
                vec![
                    ChatMessage::system(self.prompts.system_instruction()),
                    ChatMessage::user(self.prompts.followup(generated.problem.as_str(), method)),
                ],
                self.generation.followup,
            );
            (index, request)
        };

        let reply = non_empty_reply(self.client.complete(&request).await?)?;
        tracing::info!(method = %index, "Received follow-up");
        self.state.append_assistant(index, reply);
        Ok(())
    }

    /// Send one chat message for the selected method.
    ///
    /// The question and the answer are appended together. When the call
    /// fails neither is kept.
    pub async fn send_chat_turn(&mut self, text: &str) -> Result<(), SessionError> {
        let result = self.try_send_chat_turn(text).await;
        self.settle(result)
    }

    async fn try_send_chat_turn(&mut self, text: &str) -> Result<(), SessionError> {
        let question =
            NonEmptyString::trimmed(text).map_err(|_| ValidationError::EmptyChatMessage)?;

        let (index, request) = {
            let (index, generated) = self.selection()?;
            let method = generated.methods.get(index).text().unwrap_or_default();
            let transcript = self.state.transcript(index);

            let mut messages = Vec::with_capacity(transcript.len() + 3);
            messages.push(ChatMessage::system(self.prompts.system_instruction()));
            messages.push(ChatMessage::system(self.prompts.method_note(method)));
            messages.extend(transcript.turns().iter().map(|turn| match turn.speaker {
                Speaker::User => ChatMessage::user(turn.content.clone()),
                Speaker::Assistant => ChatMessage::assistant(turn.content.clone()),
            }));
            messages.push(ChatMessage::user(question.as_str()));
            (index, ChatRequest::new(messages, self.generation.chat))
        };

        tracing::debug!(method = %index, messages = request.messages.len(), "Sending chat turn");
        let reply = non_empty_reply(self.client.complete(&request).await?)?;
        self.state
            .append_exchange(index, question.into_inner(), reply);
        Ok(())
    }

    /// Ask the model for a fresh practice problem.
    pub async fn generate_practice_problem(&mut self) -> Result<(), SessionError> {
        let result = self.try_generate_practice_problem().await;
        self.settle(result)
    }

    async fn try_generate_practice_problem(&mut self) -> Result<(), SessionError> {
        let request = ChatRequest::new(
            PracticeSession::problem_request(&self.prompts),
            self.generation.practice_problem,
        );
        let reply = self.client.complete(&request).await?;
        let title = NonEmptyString::new(clean_problem_title(&reply))
            .map_err(|_| ChatError::EmptyReply { finish_reason: None })?;
        tracing::info!(problem = %title, "Generated practice problem");
        self.practice.install_generated(title);
        Ok(())
    }

    /// Critique the learner's steps for the active practice problem.
    pub async fn request_practice_feedback(
        &mut self,
        steps: &str,
        reason: &str,
    ) -> Result<(), SessionError> {
        let result = self.try_request_practice_feedback(steps, reason).await;
        self.settle(result)
    }

    async fn try_request_practice_feedback(
        &mut self,
        steps: &str,
        reason: &str,
    ) -> Result<(), SessionError> {
        let messages = self.practice.feedback_request(&self.prompts, steps, reason)?;
        let request = ChatRequest::new(messages, self.generation.practice_feedback);
        let reply = self.client.complete(&request).await?;
        let feedback = NonEmptyString::new(reply)
            .map_err(|_| ChatError::EmptyReply { finish_reason: None })?;
        tracing::info!("Received practice feedback");
        self.practice.install_feedback(feedback);
        Ok(())
    }

    fn selection(&self) -> Result<(MethodIndex, &GeneratedMethods), ValidationError> {
        let generated = self.state.generated().ok_or(ValidationError::NoMethods)?;
        let index = self.state.selected().ok_or(ValidationError::NoSelection)?;
        Ok((index, generated))
    }

    fn settle(&mut self, result: Result<(), SessionError>) -> Result<(), SessionError> {
        match &result {
            Ok(()) => self.last_error = None,
            Err(err) => {
                if err.is_validation() {
                    tracing::warn!("Action rejected: {err}");
                } else {
                    tracing::error!("Model call failed: {err}");
                }
                self.last_error = Some(Notice::from_error(err, self.provider));
            }
        }
        result
    }
}

fn non_empty_reply(reply: String) -> Result<String, ChatError> {
    if reply.trim().is_empty() {
        Err(ChatError::EmptyReply {
            finish_reason: None,
        })
    } else {
        Ok(reply)
    }
}
