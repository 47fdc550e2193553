use anyhow::{Context, Result};

/// Read a secret (password, API key) from the terminal without echoing it.
pub fn prompt_secret(label: &str) -> Result<String> {
    let s = rpassword::prompt_password(format!("{label}: ")).context("read secret from terminal")?;
    Ok(s.trim().to_string())
}
