//! Correction agent: prompt assembly around a language model
//!
//! The agent turns an ordered list of (header, body) pairs into a single
//! prompt, sends it to a [`CompletionModel`] and hands the raw completion to
//! an extractor chosen by the caller.
//!
//! # Backends
//!
//! - **OpenAI-compatible**: any server exposing `/v1/chat/completions`
//!   (OpenAI, llama.cpp server, Ollama, vLLM)

pub mod openai;

use crate::error::AgentError;
use std::time::Instant;

pub use openai::OpenAiModel;

/// A blocking text completion backend
pub trait CompletionModel: Send {
    /// Complete `prompt` and return the raw model output
    fn complete(&self, prompt: &str) -> Result<String, AgentError>;

    /// Human-readable name for logging
    fn name(&self) -> &str;
}

/// Join header/body pairs into one prompt
///
/// Each pair renders as the header line followed by the body; a pair with an
/// empty header renders as the body alone. Pairs are separated by a blank
/// line.
pub fn format_prompt(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(header, body)| {
            if header.is_empty() {
                body.to_string()
            } else {
                format!("{}\n{}", header, body)
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Prompt-driven agent over a completion model
pub struct LlmAgent {
    model: Box<dyn CompletionModel>,
}

impl LlmAgent {
    pub fn new(model: Box<dyn CompletionModel>) -> Self {
        Self { model }
    }

    /// Send the pairs as one prompt and apply `extract` to the completion
    ///
    /// Model failures propagate to the caller unchanged.
    pub fn interact<T, F>(&self, pairs: &[(&str, &str)], extract: F) -> Result<T, AgentError>
    where
        F: FnOnce(&str) -> T,
    {
        let prompt = format_prompt(pairs);
        tracing::debug!("Prompt for {}:\n{}", self.model.name(), prompt);

        let start = Instant::now();
        let completion = self.model.complete(&prompt)?;
        tracing::info!(
            "{} answered in {:.2}s ({} chars)",
            self.model.name(),
            start.elapsed().as_secs_f32(),
            completion.chars().count()
        );
        tracing::debug!("Completion:\n{}", completion);

        Ok(extract(&completion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct ScriptedModel {
        reply: Result<String, String>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl CompletionModel for ScriptedModel {
        fn complete(&self, prompt: &str) -> Result<String, AgentError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(AgentError::Network)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn agent(reply: Result<&str, &str>) -> (LlmAgent, Arc<Mutex<Vec<String>>>) {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let model = ScriptedModel {
            reply: reply.map(str::to_string).map_err(str::to_string),
            prompts: prompts.clone(),
        };
        (LlmAgent::new(Box::new(model)), prompts)
    }

    #[test]
    fn test_format_prompt() {
        let prompt = format_prompt(&[("header1", "body1"), ("", "body2"), ("header3", "")]);
        assert_eq!(prompt, "header1\nbody1\n\nbody2\n\nheader3\n");
    }

    #[test]
    fn test_format_prompt_empty() {
        assert_eq!(format_prompt(&[]), "");
    }

    #[test]
    fn test_interact_calls_model_once_and_extracts() {
        let (agent, prompts) = agent(Ok("(pre)corrected"));
        let mut seen = Vec::new();
        let result = agent
            .interact(&[("header1", "body1"), ("header2", "body2")], |raw| {
                seen.push(raw.to_string());
                raw.trim_start_matches("(pre)").to_string()
            })
            .unwrap();

        assert_eq!(result, "corrected");
        assert_eq!(seen, vec!["(pre)corrected".to_string()]);
        assert_eq!(
            *prompts.lock().unwrap(),
            vec!["header1\nbody1\n\nheader2\nbody2".to_string()]
        );
    }

    #[test]
    fn test_interact_propagates_model_failure() {
        let (agent, _) = agent(Err("connection refused"));
        let mut called = false;
        let err = agent
            .interact(&[("", "text")], |_| called = true)
            .unwrap_err();
        assert!(matches!(err, AgentError::Network(_)));
        assert!(!called);
    }
}
