// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OpenAI-compatible chat client that turns a task brief into site files.
//!
//! Handles:
//! - Attachment summaries for the prompt
//! - A single chat-completions call producing `index.html`
//! - Cleanup of stray markdown fences in the model output

use crate::config::Config;
use crate::error::AppError;
use crate::models::Attachment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

const TEMPERATURE: f32 = 0.25;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Repository-relative path → file contents.
pub type GeneratedFiles = BTreeMap<String, String>;

/// Chat-completions client.
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl LlmClient {
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.openai_base_url.clone(),
            config.openai_api_key.clone(),
            config.llm_model.clone(),
        )
    }

    /// Generate the site files for a brief.
    ///
    /// `LICENSE` is a placeholder here; the deployer swaps in the full text.
    pub async fn generate_files(
        &self,
        brief: &str,
        attachments: &[Attachment],
    ) -> Result<GeneratedFiles, AppError> {
        let summary = summarize_attachments(attachments);

        let html = self
            .chat(&build_system_prompt(&summary), &build_user_prompt(brief))
            .await?;
        let html = strip_code_fences(&html);

        let mut files = GeneratedFiles::new();
        files.insert("index.html".to_string(), html);
        files.insert("README.md".to_string(), build_readme(brief, &summary));
        files.insert("LICENSE".to_string(), "MIT License\n\nCopyright (c) 2025".to_string());
        Ok(files)
    }

    /// Send one system + user exchange and return the assistant text.
    pub async fn chat(&self, system: &str, user: &str) -> Result<String, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Llm("AIPIPE_TOKEN or OPENAI_API_KEY not set".to_string()))?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.trim(),
                },
                ChatMessage {
                    role: "user",
                    content: user.trim(),
                },
            ],
            temperature: TEMPERATURE,
        };

        tracing::debug!(
            model = %self.model,
            prompt_length = request.messages[1].content.len(),
            "Sending chat completion request"
        );

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Llm(format!("HTTP {}: {}", status, body)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("JSON parse error: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .ok_or_else(|| AppError::Llm("No content in LLM response".to_string()))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// One line per attachment, classified by what its URL mentions.
pub fn summarize_attachments(attachments: &[Attachment]) -> String {
    if attachments.is_empty() {
        return "No attachments were provided.".to_string();
    }

    attachments
        .iter()
        .map(|a| {
            let name = &a.name;
            if a.url.contains("image") {
                format!("- Image file: {name} (type: image, to be displayed or used for demo)")
            } else if a.url.contains("text/csv") {
                format!("- CSV file: {name} (data file to read or process)")
            } else if a.url.contains("text/markdown") {
                format!("- Markdown file: {name} (text content to render)")
            } else if a.url.contains("application/json") {
                format!("- JSON file: {name} (data config or conversion rates)")
            } else {
                format!("- File: {name} (type inferred from brief)")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_system_prompt(attachment_summary: &str) -> String {
    format!(
        r#"You are an autonomous web app generator for an LLM code deployment platform.

Your task:
- Read the 'brief' describing what the app must do.
- Review the attachments (summarized below).
- Generate working static web app files (HTML, JS, CSS).

Attachment Summary:
{attachment_summary}

Rules:
- Output must be plain text (no code fences, no markdown formatting).
- Write valid, minimal HTML5 with <html>, <head>, and <body>.
- Include external libraries (Bootstrap, marked.js, highlight.js, etc.) from CDN links only.
- Match element IDs and behavior exactly as described in the brief.
- If the brief mentions an attachment, use its data URL directly in your HTML or JavaScript.
- If data is to be fetched (e.g., CSV or JSON), use 'fetch()' with the data URI.
- If an image is attached, show it by default in an <img> element.
- Always produce functional code that would pass automated tests.
- No comments or explanations, just clean code."#
    )
}

pub fn build_user_prompt(brief: &str) -> String {
    format!(
        r#"Task brief:
{brief}

Generate the required web application based on the above brief and attachments.
Return only the contents of index.html as plain text."#
    )
}

fn build_readme(brief: &str, attachment_summary: &str) -> String {
    format!(
        "# Auto-generated App\n\n**Brief:** {brief}\n\nAttachments:\n{attachment_summary}\n\nGenerated automatically by the LLM code deployment service."
    )
}

/// Remove a markdown code fence wrapped around model output.
pub fn strip_code_fences(text: &str) -> String {
    let text = text.trim();
    if !text.starts_with("```") {
        return text.to_string();
    }

    let inner = text.trim_matches('`');
    let inner = inner.strip_prefix("html").unwrap_or(inner);
    inner.trim().to_string()
}
