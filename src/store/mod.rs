//! Persistence collaborators.
//!
//! Handlers and gates only see the [`UserStore`] and [`TodoStore`] traits. [`PgStore`]
//! backs them with PostgreSQL, [`MemoryStore`] keeps everything in process.
//! Every todo operation except the admin listing and the counters is scoped by owner.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Credentials, NewTodo, NewUser, Todo, TodoChanges, TodoFilter, TodoWithOwner, User,
    UserChanges,
};

pub const DUPLICATE_EMAIL: &str = "User with this email already exists";

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, AppError>;

    async fn list_users(&self) -> Result<Vec<User>, AppError>;

    /// Fails with `Conflict` when the new email is taken by another user.
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError>;

    async fn count_users(&self) -> Result<i64, AppError>;
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn create_todo(&self, todo: NewTodo) -> Result<Todo, AppError>;

    async fn find_todo(&self, owner: Uuid, id: Uuid) -> Result<Option<Todo>, AppError>;

    async fn list_todos(&self, owner: Uuid, filter: TodoFilter) -> Result<Vec<Todo>, AppError>;

    /// Todos due within `[start, end]`, earliest first.
    async fn list_todos_due_between(
        &self,
        owner: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Todo>, AppError>;

    async fn update_todo(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: TodoChanges,
    ) -> Result<Option<Todo>, AppError>;

    /// Flips `completed` and returns the updated todo.
    async fn toggle_todo(&self, owner: Uuid, id: Uuid) -> Result<Option<Todo>, AppError>;

    /// Returns whether a todo was deleted.
    async fn delete_todo(&self, owner: Uuid, id: Uuid) -> Result<bool, AppError>;

    /// Every todo of every user, newest first.
    async fn list_all_todos(&self) -> Result<Vec<TodoWithOwner>, AppError>;

    async fn count_todos(&self, completed: Option<bool>) -> Result<i64, AppError>;
}

/// The complete document store the application runs against.
pub trait Store: UserStore + TodoStore {}

impl<T: UserStore + TodoStore> Store for T {}
