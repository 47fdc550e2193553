use anyhow::{bail, Result};
use jotter_core::{GenerationError, TextGenerator};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::AuthState;
use crate::config::LlmSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAI,
}

impl Provider {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "openai" | "openai-compatible" => Ok(Provider::OpenAI),
            other => bail!("unknown llm provider '{other}' (expected openai or anthropic)"),
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            Provider::Anthropic => "https://api.anthropic.com",
            Provider::OpenAI => "https://api.openai.com",
        }
    }
}

/// Everything needed to reach a model, resolved up front from config + auth.
#[derive(Clone)]
pub struct LlmConfig {
    pub provider: Provider,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl LlmConfig {
    /// Combine the `[llm]` section with stored credentials.
    /// `Ok(None)` means the configured provider has no key yet.
    pub fn resolve(section: &LlmSection, auth: &AuthState) -> Result<Option<Self>> {
        let provider = Provider::parse(&section.provider)?;
        let key = match provider {
            Provider::Anthropic => auth.anthropic_token.clone(),
            Provider::OpenAI => auth.openai_api_key.clone(),
        };
        let Some(api_key) = key.filter(|k| !k.trim().is_empty()) else {
            return Ok(None);
        };

        let base_url = section
            .base_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| provider.default_base_url().to_string());

        Ok(Some(Self {
            provider,
            model: section.model.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            temperature: section.temperature,
            max_tokens: section.max_tokens,
        }))
    }
}

/// Blocking text generator over the provider's HTTP API.
pub struct LlmClient {
    cfg: LlmConfig,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(cfg: LlmConfig) -> Self {
        Self {
            cfg,
            http: reqwest::Client::new(),
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!(provider = ?self.cfg.provider, model = %self.cfg.model, "calling model");
        match self.cfg.provider {
            Provider::Anthropic => self.anthropic_complete(prompt).await,
            Provider::OpenAI => self.openai_complete(prompt).await,
        }
    }

    async fn anthropic_complete(&self, prompt: &str) -> Result<String, GenerationError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            max_tokens: u32,
            temperature: f32,
            messages: Vec<Msg<'a>>,
        }

        #[derive(Deserialize)]
        struct Resp {
            content: Vec<ContentBlock>,
        }

        #[derive(Deserialize)]
        struct ContentBlock {
            #[serde(rename = "type")]
            t: String,
            text: Option<String>,
        }

        let body = Req {
            model: &self.cfg.model,
            max_tokens: self.cfg.max_tokens,
            temperature: self.cfg.temperature,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.cfg.api_key)
                .map_err(|e| GenerationError::NotConfigured(format!("invalid anthropic key: {e}")))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self
            .http
            .post(format!("{}/v1/messages", self.cfg.base_url))
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(format!("anthropic request: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Provider {
                status: status.as_u16(),
                body: txt,
            });
        }

        let out: Resp = resp
            .json()
            .await
            .map_err(|e| GenerationError::Transport(format!("parse anthropic response: {e}")))?;
        let mut s = String::new();
        for b in out.content {
            if b.t == "text" {
                if let Some(t) = b.text {
                    s.push_str(&t);
                }
            }
        }
        Ok(s.trim().to_string())
    }

    async fn openai_complete(&self, prompt: &str) -> Result<String, GenerationError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct ResponseFormat {
            #[serde(rename = "type")]
            t: &'static str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
            response_format: ResponseFormat,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let body = Req {
            model: &self.cfg.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature: self.cfg.temperature,
            max_tokens: self.cfg.max_tokens,
            response_format: ResponseFormat { t: "json_object" },
        };

        let resp = self
            .http
            .post(format!("{}/v1/chat/completions", self.cfg.base_url))
            .bearer_auth(&self.cfg.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(format!("openai request: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Provider {
                status: status.as_u16(),
                body: txt,
            });
        }

        let out: Resp = resp
            .json()
            .await
            .map_err(|e| GenerationError::Transport(format!("parse openai response: {e}")))?;
        let content = out
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }
}

impl TextGenerator for LlmClient {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        // The CLI runs under #[tokio::main], so a runtime is usually already
        // running and a nested block_on would panic.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| handle.block_on(self.complete(prompt)))
        } else {
            let rt = tokio::runtime::Runtime::new()
                .map_err(|e| GenerationError::Transport(format!("create tokio runtime: {e}")))?;
            rt.block_on(self.complete(prompt))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_with_openai() -> AuthState {
        AuthState {
            anthropic_token: None,
            openai_api_key: Some("sk-test".to_string()),
        }
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(Provider::parse("OpenAI").unwrap(), Provider::OpenAI);
        assert_eq!(Provider::parse(" anthropic ").unwrap(), Provider::Anthropic);
        assert!(Provider::parse("gemini").is_err());
    }

    #[test]
    fn test_resolve_uses_provider_default_url() {
        let cfg = LlmConfig::resolve(&LlmSection::default(), &auth_with_openai())
            .unwrap()
            .unwrap();
        assert_eq!(cfg.provider, Provider::OpenAI);
        assert_eq!(cfg.base_url, "https://api.openai.com");
        assert_eq!(cfg.api_key, "sk-test");
    }

    #[test]
    fn test_resolve_honours_base_url_override() {
        let section = LlmSection {
            base_url: Some("http://localhost:11434/".to_string()),
            ..LlmSection::default()
        };
        let cfg = LlmConfig::resolve(&section, &auth_with_openai()).unwrap().unwrap();
        assert_eq!(cfg.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_resolve_without_key_is_none() {
        let section = LlmSection {
            provider: "anthropic".to_string(),
            ..LlmSection::default()
        };
        assert!(LlmConfig::resolve(&section, &auth_with_openai()).unwrap().is_none());
    }

    #[test]
    fn test_debug_redacts_key() {
        let cfg = LlmConfig::resolve(&LlmSection::default(), &auth_with_openai())
            .unwrap()
            .unwrap();
        let s = format!("{cfg:?}");
        assert!(!s.contains("sk-test"));
    }
}
