use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(30);

/// One completion request sent to a language model
#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub prompt: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

/// Optional text-generation capability used for summaries and intents
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Return the raw completion text for a prompt
    async fn complete(&self, request: &PromptRequest) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LLMProvider {
    Ollama,
    OpenAI,
}

impl LLMProvider {
    /// Unrecognised names fall back to the local provider
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "openai" => LLMProvider::OpenAI,
            _ => LLMProvider::Ollama,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            LLMProvider::Ollama => "http://localhost:11434",
            LLMProvider::OpenAI => "https://api.openai.com",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LLMProvider::Ollama => "llama3.2:3b",
            LLMProvider::OpenAI => "gpt-4o-mini",
        }
    }
}

/// Model endpoint settings, read from `SNAPMARK_LLM_*`
#[derive(Debug, Clone)]
pub struct LLMConfig {
    pub provider: LLMProvider,
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self::for_provider(LLMProvider::Ollama)
    }
}

impl LLMConfig {
    pub fn for_provider(provider: LLMProvider) -> Self {
        Self {
            provider,
            api_key: None,
            base_url: provider.default_base_url().to_string(),
            model: provider.default_model().to_string(),
            timeout: DEFAULT_MODEL_TIMEOUT,
        }
    }

    /// `SNAPMARK_LLM_PROVIDER`, `SNAPMARK_LLM_URL`, `SNAPMARK_LLM_MODEL`,
    /// `SNAPMARK_LLM_API_KEY` (required for OpenAI), `SNAPMARK_LLM_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let provider = LLMProvider::parse(&env_or("SNAPMARK_LLM_PROVIDER", "ollama"));
        let mut config = Self::for_provider(provider);

        if let Ok(url) = std::env::var("SNAPMARK_LLM_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("SNAPMARK_LLM_MODEL") {
            config.model = model;
        }
        if let Some(secs) = std::env::var("SNAPMARK_LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&secs| secs > 0)
        {
            config.timeout = Duration::from_secs(secs);
        }

        config.api_key = std::env::var("SNAPMARK_LLM_API_KEY").ok();
        if provider == LLMProvider::OpenAI && config.api_key.is_none() {
            bail!("SNAPMARK_LLM_API_KEY required for the OpenAI provider");
        }

        Ok(config)
    }
}

fn env_or(name: &str, fallback: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| fallback.to_string())
}

/// HTTP client for Ollama or OpenAI-compatible completion endpoints
pub struct LLMClient {
    config: LLMConfig,
    client: Client,
}

impl LLMClient {
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build model HTTP client")?;

        Ok(Self { config, client })
    }

    /// Client configured from the environment, or `None` unless `SNAPMARK_USE_LLM` is on
    pub fn from_env_optional() -> Option<Self> {
        let enabled = env_or("SNAPMARK_USE_LLM", "false").to_lowercase();
        if !matches!(enabled.as_str(), "true" | "1" | "yes") {
            return None;
        }

        match LLMConfig::from_env().and_then(Self::new) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Model client disabled: {}", e);
                None
            }
        }
    }

    pub fn config(&self) -> &LLMConfig {
        &self.config
    }

    /// Call Ollama API
    async fn call_ollama(&self, request: &PromptRequest) -> Result<String> {
        let url = format!("{}/api/generate", self.config.base_url);

        let request_body = json!({
            "model": self.config.model,
            "prompt": request.prompt,
            "stream": false,
            "options": {
                "temperature": request.temperature,
                "num_predict": request.max_output_tokens,
            }
        });

        debug!("Calling Ollama at {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .context("Failed to call Ollama API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama API error {}: {}", status, error_text);
        }

        #[derive(Deserialize)]
        struct OllamaResponse {
            response: String,
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(ollama_response.response)
    }

    /// Call OpenAI API
    async fn call_openai(&self, request: &PromptRequest) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);

        let request_body = json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You summarize and classify web pages. Reply with JSON only."
                },
                {
                    "role": "user",
                    "content": request.prompt
                }
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_output_tokens,
        });

        debug!("Calling OpenAI at {}", url);

        let mut http_request = self.client.post(&url).json(&request_body);

        if let Some(ref api_key) = self.config.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let response = http_request
            .send()
            .await
            .context("Failed to call OpenAI API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error {}: {}", status, error_text);
        }

        #[derive(Deserialize)]
        struct OpenAIResponse {
            choices: Vec<OpenAIChoice>,
        }

        #[derive(Deserialize)]
        struct OpenAIChoice {
            message: OpenAIMessage,
        }

        #[derive(Deserialize)]
        struct OpenAIMessage {
            content: Option<String>,
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        openai_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("No response from OpenAI"))
    }
}

#[async_trait]
impl LanguageModel for LLMClient {
    async fn complete(&self, request: &PromptRequest) -> Result<String> {
        match self.config.provider {
            LLMProvider::Ollama => self.call_ollama(request).await,
            LLMProvider::OpenAI => self.call_openai(request).await,
        }
    }
}
