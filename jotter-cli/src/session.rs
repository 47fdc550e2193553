use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::state::session_path;

/// The logged-in user, persisted between invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: u64,
    pub username: String,
}

pub fn load_session() -> Result<Option<Session>> {
    load_session_from(&session_path()?)
}

pub fn load_session_from(p: &Path) -> Result<Option<Session>> {
    if !p.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    Ok(Some(serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))?))
}

pub fn save_session(session: &Session) -> Result<()> {
    save_session_to(session, &session_path()?)
}

pub fn save_session_to(session: &Session, p: &Path) -> Result<()> {
    let s = serde_json::to_string_pretty(session)?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Remove the session file. Returns whether someone was logged in.
pub fn clear_session() -> Result<bool> {
    let p = session_path()?;
    if !p.exists() {
        return Ok(false);
    }
    fs::remove_file(&p).with_context(|| format!("remove {}", p.display()))?;
    Ok(true)
}

pub fn require_session() -> Result<Session> {
    load_session()?.ok_or_else(|| anyhow!("not logged in; run: jotter login"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("session.json");
        assert_eq!(load_session_from(&p).unwrap(), None);

        let s = Session {
            user_id: 7,
            username: "ada".to_string(),
        };
        save_session_to(&s, &p).unwrap();
        assert_eq!(load_session_from(&p).unwrap(), Some(s));
    }
}
