use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::ValueEnum;
use jotter_core::{reference_date_in, Store, StructuredTask, TaskNormalizer, TextGenerator, Todo};
use tracing::info;

use crate::auth::load_auth;
use crate::config::Config;
use crate::llm::{LlmClient, LlmConfig};
use crate::session::require_session;
use crate::state::store_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ListFilter {
    #[default]
    All,
    Pending,
    Done,
}

impl ListFilter {
    fn keeps(self, todo: &Todo) -> bool {
        match self {
            ListFilter::All => true,
            ListFilter::Pending => !todo.done,
            ListFilter::Done => todo.done,
        }
    }
}

fn open_store() -> Result<Store> {
    Store::open(store_path()?)
}

/// Turn typed text into the task to store. `None` stores it as typed.
pub fn build_task<G: TextGenerator>(
    text: &str,
    normalizer: Option<&TaskNormalizer<G>>,
    today: NaiveDate,
) -> Result<StructuredTask> {
    let text = text.trim();
    if text.is_empty() {
        bail!("task text is empty");
    }
    match normalizer {
        None => Ok(StructuredTask::raw(text)),
        Some(n) => n
            .normalize(text, today)
            .context("could not normalize task (pass --raw to store it as typed)"),
    }
}

fn model_normalizer(cfg: &Config) -> Result<TaskNormalizer<LlmClient>> {
    let auth = load_auth()?;
    let Some(llm) = LlmConfig::resolve(&cfg.llm, &auth)? else {
        bail!(
            "no API key for llm provider '{}'.\n\
Run: jotter auth paste-openai-api-key (or paste-anthropic-token),\n\
or pass --raw to store the task as typed.",
            cfg.llm.provider
        );
    };
    Ok(TaskNormalizer::new(LlmClient::new(llm))?)
}

fn today(cfg: &Config) -> Result<NaiveDate> {
    reference_date_in(Utc::now(), &cfg.tasks.timezone)
}

fn prepare(cfg: &Config, text: &str, raw: bool) -> Result<StructuredTask> {
    if raw || !cfg.tasks.normalize {
        return build_task::<LlmClient>(text, None, today(cfg)?);
    }
    if text.trim().is_empty() {
        bail!("task text is empty");
    }
    let normalizer = model_normalizer(cfg)?;
    build_task(text, Some(&normalizer), today(cfg)?)
}

pub fn format_todo(t: &Todo) -> String {
    let check = if t.done { "x" } else { " " };
    let due = t
        .due_date
        .map(|d| format!(", due {}", d.format("%Y-%m-%d")))
        .unwrap_or_default();
    format!(
        "[{check}] #{:<4} {}  ({}, {}{due})",
        t.id, t.task, t.category, t.priority
    )
}

pub fn add(cfg: &Config, text: &str, raw: bool) -> Result<()> {
    let session = require_session()?;
    let task = prepare(cfg, text, raw)?;
    let mut store = open_store()?;
    let todo = store.add_todo(session.user_id, task)?;
    info!(todo_id = todo.id, "added");
    println!("Added {}", format_todo(&todo));
    Ok(())
}

pub fn edit(cfg: &Config, id: u64, text: &str, raw: bool) -> Result<()> {
    let session = require_session()?;
    let mut store = open_store()?;
    if store.todo(session.user_id, id).is_none() {
        bail!("todo {id} not found");
    }
    let task = prepare(cfg, text, raw)?;
    let todo = store.update_todo(session.user_id, id, task)?;
    println!("Updated {}", format_todo(&todo));
    Ok(())
}

pub fn list(filter: ListFilter) -> Result<()> {
    let session = require_session()?;
    let store = open_store()?;
    let todos: Vec<&Todo> = store
        .todos_for(session.user_id)
        .into_iter()
        .filter(|t| filter.keeps(t))
        .collect();

    if todos.is_empty() {
        println!("No todos. Add one: jotter add \"call the dentist tomorrow\"");
        return Ok(());
    }
    for t in todos {
        println!("{}", format_todo(t));
    }
    Ok(())
}

pub fn set_done(id: u64, done: bool) -> Result<()> {
    let session = require_session()?;
    let mut store = open_store()?;
    let todo = store.set_done(session.user_id, id, done)?;
    println!("{}", format_todo(&todo));
    Ok(())
}

pub fn delete(id: u64) -> Result<()> {
    let session = require_session()?;
    let mut store = open_store()?;
    store.delete_todo(session.user_id, id)?;
    println!("Deleted #{id}");
    Ok(())
}

/// Show what normalization would store, without storing anything.
pub fn preview(cfg: &Config, text: &str, date: Option<NaiveDate>) -> Result<()> {
    let normalizer = model_normalizer(cfg)?;
    let day = match date {
        Some(d) => d,
        None => today(cfg)?,
    };
    let task = build_task(text, Some(&normalizer), day)?;
    println!("{}", serde_json::to_string_pretty(&task)?);
    Ok(())
}
