use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::cmp::Ordering;
use uuid::Uuid;

use validator::Validate;

use crate::validation::rules::{calendar_date, not_in_past, parse_calendar_date, title_present};
use crate::validation::Form;

/// A todo item as stored and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Unique identifier for the todo (UUID v4).
    pub id: Uuid,
    /// Between 3 and 100 characters.
    pub title: String,
    /// At most 500 characters.
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    /// Identifier of the owning user.
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a todo for an owner.
#[derive(Debug, Clone)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub user_id: Uuid,
}

impl Todo {
    /// Creates a new, not yet completed `Todo` with a fresh id and timestamps.
    pub fn new(input: NewTodo) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            due_date: input.due_date,
            completed: false,
            user_id: input.user_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Body of `POST /todos` and `PUT /todos/{id}`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TodoRequest {
    /// Between 3 and 100 characters. A missing title is checked as empty.
    #[serde(default)]
    #[validate(
        custom = "title_present",
        length(min = 3, max = 100, message = "Title must be between 3 and 100 characters")
    )]
    pub title: String,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    pub description: Option<String>,
    /// ISO 8601 date or date-time, not in the past.
    #[validate(custom = "calendar_date", custom = "not_in_past")]
    pub due_date: Option<String>,
    /// Only honoured on update.
    pub completed: Option<bool>,
}

impl Form for TodoRequest {}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl TodoRequest {
    fn due(&self) -> Option<DateTime<Utc>> {
        self.due_date.as_deref().and_then(parse_calendar_date)
    }

    pub fn into_new_todo(self, owner: Uuid) -> NewTodo {
        NewTodo {
            due_date: self.due(),
            title: self.title,
            description: non_empty(self.description),
            user_id: owner,
        }
    }

    /// Empty strings never overwrite stored values.
    pub fn into_changes(self) -> TodoChanges {
        TodoChanges {
            due_date: self.due(),
            title: non_empty(Some(self.title)),
            description: non_empty(self.description),
            completed: self.completed,
        }
    }
}

/// Partial update of a todo; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: Option<bool>,
}

impl TodoChanges {
    pub fn apply(self, todo: &mut Todo) {
        if let Some(title) = self.title {
            todo.title = title;
        }
        if let Some(description) = self.description {
            todo.description = Some(description);
        }
        if let Some(due_date) = self.due_date {
            todo.due_date = Some(due_date);
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        todo.updated_at = Utc::now();
    }
}

/// Field a todo listing is sorted by, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TodoSort {
    #[default]
    DueDate,
    CreatedAt,
    UpdatedAt,
    Title,
    Completed,
}

impl TodoSort {
    /// Column name used in SQL `ORDER BY`.
    /// SQL sort expression. Titles compare byte-wise, like [`TodoSort::compare`].
    pub fn column(&self) -> &'static str {
        match self {
            TodoSort::DueDate => "due_date",
            TodoSort::CreatedAt => "created_at",
            TodoSort::UpdatedAt => "updated_at",
            TodoSort::Title => "title COLLATE \"C\"",
            TodoSort::Completed => "completed",
        }
    }

    /// Listing order: the sort key ascending (missing due dates first), then newest first.
    pub fn compare(&self, a: &Todo, b: &Todo) -> Ordering {
        let primary = match self {
            TodoSort::DueDate => a.due_date.cmp(&b.due_date),
            TodoSort::CreatedAt => a.created_at.cmp(&b.created_at),
            TodoSort::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            TodoSort::Title => a.title.cmp(&b.title),
            TodoSort::Completed => a.completed.cmp(&b.completed),
        };
        primary.then_with(|| b.created_at.cmp(&a.created_at))
    }
}

/// Query string of `GET /todos`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoListQuery {
    /// `"true"` selects completed todos, any other value the open ones.
    pub completed: Option<String>,
    pub sort_by: Option<TodoSort>,
}

impl TodoListQuery {
    pub fn into_filter(self) -> TodoFilter {
        TodoFilter {
            completed: self.completed.map(|value| value == "true"),
            sort: self.sort_by.unwrap_or_default(),
        }
    }
}

/// Store-level filter for an owner's todos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoFilter {
    pub completed: Option<bool>,
    pub sort: TodoSort,
}

impl TodoFilter {
    pub fn matches(&self, todo: &Todo) -> bool {
        self.completed.map_or(true, |completed| todo.completed == completed)
    }
}

/// Query string of `GET /todos/date-range`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Public part of a todo's owner, embedded in the admin listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoOwner {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoWithOwner {
    #[serde(flatten)]
    pub todo: Todo,
    pub user: TodoOwner,
}

/// Aggregate counts shown to administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub users: i64,
    pub todos: i64,
    pub completed_todos: i64,
}
