use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$JOTTER_HOME`, else `$HOME/.jotter`.
pub fn jotter_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("JOTTER_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".jotter"))
}

pub fn ensure_jotter_home() -> Result<PathBuf> {
    let dir = jotter_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn store_path() -> Result<PathBuf> {
    Ok(ensure_jotter_home()?.join("store.json"))
}

pub fn session_path() -> Result<PathBuf> {
    Ok(ensure_jotter_home()?.join("session.json"))
}
