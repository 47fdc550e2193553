//! Task model: the normalized task record plus the persisted todo row.
//!
//! `StructuredTask` is what the normalizer hands back; it has no identity.
//! `Todo` is the stored form, owned by a user and keyed by an autoincrement id.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Work,
    #[default]
    Personal,
    Shopping,
    Health,
    Study,
    Finance,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Work,
        Category::Personal,
        Category::Shopping,
        Category::Health,
        Category::Study,
        Category::Finance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Personal => "Personal",
            Category::Shopping => "Shopping",
            Category::Health => "Health",
            Category::Study => "Study",
            Category::Finance => "Finance",
        }
    }

    /// Exact (case-sensitive) match against the closed set, after trimming.
    pub fn parse_exact(s: &str) -> Option<Category> {
        let s = s.trim();
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    /// Case-insensitive match, after trimming.
    pub fn parse_loose(s: &str) -> Option<Priority> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of normalization, handed straight to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredTask {
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
}

impl StructuredTask {
    /// Unnormalized task: the text as typed, default category/priority, no date.
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            description: text.into(),
            category: Category::default(),
            priority: Priority::default(),
            due_date: None,
        }
    }
}

/// Stored todo row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u64,
    pub user_id: u64,
    pub task: String,
    pub category: Category,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub done: bool,
    pub created_at: DateTime<Utc>,
}

impl Todo {
    pub fn new(id: u64, user_id: u64, task: StructuredTask, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            task: task.description,
            category: task.category,
            priority: task.priority,
            due_date: task.due_date,
            done: false,
            created_at,
        }
    }

    /// Overwrite the normalized fields, keeping identity and status.
    pub fn apply(&mut self, task: StructuredTask) {
        self.task = task.description;
        self.category = task.category;
        self.priority = task.priority;
        self.due_date = task.due_date;
    }
}
