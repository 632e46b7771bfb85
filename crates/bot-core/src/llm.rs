use std::future::Future;
use std::pin::Pin;

use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::agent::config::LlmSettings;
use crate::agent::harness::LlmClient;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Sends a system + user instruction pair to an Ollama-style
/// `POST /api/generate` endpoint and returns the raw response text.
pub async fn query_generate(
    system: &str,
    prompt: &str,
    settings: &LlmSettings,
) -> anyhow::Result<String> {
    let client = Client::new();
    query_generate_with(&client, system, prompt, settings).await
}

async fn query_generate_with(
    client: &Client,
    system: &str,
    prompt: &str,
    settings: &LlmSettings,
) -> anyhow::Result<String> {
    let request = GenerateRequest {
        model: &settings.model,
        system,
        prompt,
        stream: false,
    };

    let res = client
        .post(&settings.endpoint)
        .json(&request)
        .send()
        .await
        .context("llm request failed")?
        .error_for_status()
        .context("llm non-2xx response")?
        .json::<GenerateResponse>()
        .await
        .context("llm response decode failed")?;

    Ok(res.response)
}

/// Reusable client wrapper implementing the agent's [`LlmClient`] boundary.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    settings: LlmSettings,
}

impl OllamaClient {
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }
}

impl LlmClient for OllamaClient {
    fn complete<'a>(
        &'a self,
        system: String,
        prompt: String,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            query_generate_with(&self.client, &system, &prompt, &self.settings).await
        })
    }
}
