//! File-backed record store for users and their todos.
//!
//! One JSON document, rewritten after every mutation (temp file + rename).
//! Every todo operation is scoped to its owner: another user's todo is
//! reported as not found.
//!
//! A mutation is staged on a copy of the data and only replaces the in-memory
//! state once the file write has succeeded, so a failed save leaves the
//! `Store` exactly as it was.
//!
//! Single writer: there is no file lock. Two processes that open the same file
//! and both mutate it will race, and the last rename wins.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::password::{hash_password, verify_password};
use crate::task::{StructuredTask, Todo};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreData {
    next_user_id: u64,
    next_todo_id: u64,
    users: Vec<User>,
    todos: Vec<Todo>,
}

impl StoreData {
    fn todo_mut(&mut self, user_id: u64, id: u64) -> Result<&mut Todo> {
        self.todos
            .iter_mut()
            .find(|t| t.id == id && t.user_id == user_id)
            .ok_or_else(|| anyhow::anyhow!("todo {id} not found"))
    }
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            next_user_id: 1,
            next_todo_id: 1,
            users: Vec::new(),
            todos: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    data: StoreData,
}

impl Store {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let s = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
            serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?
        } else {
            StoreData::default()
        };
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist `next`, then make it the live state.
    fn commit(&mut self, next: StoreData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let s = serde_json::to_string_pretty(&next)?;
        fs::write(&tmp, s).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), self.path.display()))?;
        self.data = next;
        Ok(())
    }

    // --- users ---

    pub fn register_user(&mut self, new: NewUser) -> Result<User> {
        let username = new.username.trim();
        let email = new.email.trim();
        if username.is_empty() || new.password.is_empty() {
            bail!("username and password are required");
        }
        let taken = self.data.users.iter().any(|u| {
            u.username == username || u.email.eq_ignore_ascii_case(email)
        });
        if taken {
            bail!("username or email already exists");
        }

        let mut next = self.data.clone();
        let user = User {
            id: next.next_user_id,
            first_name: new.first_name.trim().to_string(),
            last_name: new.last_name.trim().to_string(),
            email: email.to_string(),
            username: username.to_string(),
            password_hash: hash_password(&new.password),
            created_at: Utc::now(),
        };
        next.next_user_id += 1;
        next.users.push(user.clone());
        self.commit(next)?;
        debug!(user_id = user.id, username = %user.username, "registered user");
        Ok(user)
    }

    pub fn find_user_by_username(&self, username: &str) -> Option<&User> {
        self.data.users.iter().find(|u| u.username == username)
    }

    pub fn user(&self, id: u64) -> Option<&User> {
        self.data.users.iter().find(|u| u.id == id)
    }

    /// Check credentials. Unknown user and wrong password fail the same way.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<&User> {
        match self.find_user_by_username(username.trim()) {
            Some(u) if verify_password(password, &u.password_hash) => Ok(u),
            _ => bail!("invalid username or password"),
        }
    }

    // --- todos ---

    pub fn add_todo(&mut self, user_id: u64, task: StructuredTask) -> Result<Todo> {
        if self.user(user_id).is_none() {
            bail!("user {user_id} not found");
        }
        let mut next = self.data.clone();
        let todo = Todo::new(next.next_todo_id, user_id, task, Utc::now());
        next.next_todo_id += 1;
        next.todos.push(todo.clone());
        self.commit(next)?;
        debug!(user_id, todo_id = todo.id, "added todo");
        Ok(todo)
    }

    /// All todos owned by `user_id`, ordered by id.
    pub fn todos_for(&self, user_id: u64) -> Vec<&Todo> {
        let mut out: Vec<&Todo> = self
            .data
            .todos
            .iter()
            .filter(|t| t.user_id == user_id)
            .collect();
        out.sort_by_key(|t| t.id);
        out
    }

    pub fn todo(&self, user_id: u64, id: u64) -> Option<&Todo> {
        self.data
            .todos
            .iter()
            .find(|t| t.id == id && t.user_id == user_id)
    }

    pub fn set_done(&mut self, user_id: u64, id: u64, done: bool) -> Result<Todo> {
        let mut next = self.data.clone();
        let todo = next.todo_mut(user_id, id)?;
        todo.done = done;
        let out = todo.clone();
        self.commit(next)?;
        debug!(user_id, todo_id = id, done, "updated status");
        Ok(out)
    }

    pub fn update_todo(&mut self, user_id: u64, id: u64, task: StructuredTask) -> Result<Todo> {
        let mut next = self.data.clone();
        let todo = next.todo_mut(user_id, id)?;
        todo.apply(task);
        let out = todo.clone();
        self.commit(next)?;
        debug!(user_id, todo_id = id, "edited todo");
        Ok(out)
    }

    pub fn delete_todo(&mut self, user_id: u64, id: u64) -> Result<()> {
        let mut next = self.data.clone();
        next.todos.retain(|t| !(t.id == id && t.user_id == user_id));
        if next.todos.len() == self.data.todos.len() {
            bail!("todo {id} not found");
        }
        self.commit(next)?;
        debug!(user_id, todo_id = id, "deleted todo");
        Ok(())
    }
}
