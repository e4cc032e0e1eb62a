//! Chat wire types shared by the client and the session layer.
//!
//! A request to the model is an ordered list of role-tagged [`ChatMessage`]s
//! plus [`GenerationParams`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One role-tagged message, serialized as `{"role": ..., "content": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("temperature must be within [0, 1], got {0}")]
pub struct TemperatureError(pub f32);

/// Sampling temperature, validated to lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(into = "f32")]
pub struct Temperature(f32);

impl Temperature {
    pub fn new(value: f32) -> Result<Self, TemperatureError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(TemperatureError(value))
        }
    }

    /// Compile-time constructor for known-good literals.
    #[must_use]
    pub const fn from_const(value: f32) -> Self {
        assert!(value >= 0.0 && value <= 1.0, "temperature out of range");
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> f32 {
        self.0
    }
}

impl From<Temperature> for f32 {
    fn from(value: Temperature) -> Self {
        value.0
    }
}

impl<'de> Deserialize<'de> for Temperature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = f32::deserialize(deserializer)?;
        Temperature::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Per-call generation knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_output_tokens: u32,
    pub temperature: Temperature,
}

impl GenerationParams {
    #[must_use]
    pub const fn new(max_output_tokens: u32, temperature: Temperature) -> Self {
        Self {
            max_output_tokens,
            temperature,
        }
    }
}

/// Generation parameters for every kind of call the application makes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationProfile {
    pub methods: GenerationParams,
    pub followup: GenerationParams,
    pub chat: GenerationParams,
    pub practice_problem: GenerationParams,
    pub practice_feedback: GenerationParams,
}

impl Default for GenerationProfile {
    fn default() -> Self {
        let warm = Temperature::from_const(0.7);
        Self {
            methods: GenerationParams::new(1000, warm),
            followup: GenerationParams::new(2000, warm),
            chat: GenerationParams::new(1500, warm),
            practice_problem: GenerationParams::new(200, warm),
            practice_feedback: GenerationParams::new(800, Temperature::from_const(0.6)),
        }
    }
}
