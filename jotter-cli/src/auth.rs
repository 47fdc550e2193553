use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::prompt::prompt_secret;
use crate::state::ensure_jotter_home;

/// Model provider credentials, kept apart from config.toml.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AuthState {
    pub anthropic_token: Option<String>,
    pub openai_api_key: Option<String>,
}

fn auth_path() -> Result<PathBuf> {
    Ok(ensure_jotter_home()?.join("auth.json"))
}

pub fn load_auth() -> Result<AuthState> {
    load_auth_from(&auth_path()?)
}

pub fn load_auth_from(p: &Path) -> Result<AuthState> {
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_auth(auth: &AuthState) -> Result<()> {
    let p = auth_path()?;
    let s = serde_json::to_string_pretty(auth)?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn anthropic_paste_token() -> Result<PathBuf> {
    let mut auth = load_auth()?;
    let token = prompt_secret("Paste Anthropic token (starts with sk-ant-)")?;
    if !token.starts_with("sk-ant-") {
        bail!("token didn't look like an Anthropic token (expected prefix sk-ant-)");
    }
    auth.anthropic_token = Some(token);
    save_auth(&auth)?;
    auth_path()
}

pub fn openai_paste_api_key() -> Result<PathBuf> {
    let mut auth = load_auth()?;
    let key = prompt_secret("Paste OpenAI API key (starts with sk-)")?;
    if !key.starts_with("sk-") {
        bail!("key didn't look like an OpenAI API key (expected prefix sk-)");
    }
    auth.openai_api_key = Some(key);
    save_auth(&auth)?;
    auth_path()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_auth_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let a = load_auth_from(&dir.path().join("auth.json")).unwrap();
        assert_eq!(a, AuthState::default());
    }

    #[test]
    fn test_partial_auth_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("auth.json");
        fs::write(&p, r#"{"openai_api_key":"sk-test"}"#).unwrap();
        let a = load_auth_from(&p).unwrap();
        assert_eq!(a.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(a.anthropic_token, None);
    }
}
