use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{TodoStore, UserStore, DUPLICATE_EMAIL};
use crate::error::AppError;
use crate::models::{
    Credentials, NewTodo, NewUser, Todo, TodoChanges, TodoFilter, TodoOwner, TodoWithOwner,
    User, UserChanges,
};

const USER_COLUMNS: &str = "id, name, email, role, created_at, updated_at";
const TODO_COLUMNS: &str =
    "id, title, description, due_date, completed, user_id, created_at, updated_at";

/// PostgreSQL-backed store. Uniqueness of `users.email` is enforced by the schema.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

/// Maps a unique-key violation on `users.email` to the duplicate email conflict.
fn email_conflict(error: sqlx::Error) -> AppError {
    match error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(DUPLICATE_EMAIL.into())
        }
        other => other.into(),
    }
}

/// Maps a foreign-key violation on `todos.user_id` to the missing owner.
fn missing_owner(error: sqlx::Error) -> AppError {
    match error {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::NotFound("User not found".into())
        }
        other => other.into(),
    }
}

#[derive(FromRow)]
struct TodoOwnerRow {
    #[sqlx(flatten)]
    todo: Todo,
    owner_name: String,
    owner_email: String,
}

impl From<TodoOwnerRow> for TodoWithOwner {
    fn from(row: TodoOwnerRow) -> Self {
        let user = TodoOwner {
            id: row.todo.user_id,
            name: row.owner_name,
            email: row.owner_email,
        };
        TodoWithOwner {
            todo: row.todo,
            user,
        }
    }
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and applies pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to run migrations: {}", e)))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let credentials = user.into_credentials();
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(credentials.user.id)
            .bind(&credentials.user.name)
            .bind(&credentials.user.email)
            .bind(&credentials.password_hash)
            .bind(credentials.user.role)
            .bind(credentials.user.created_at)
            .bind(credentials.user.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(email_conflict)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, AppError> {
        let sql = format!(
            "SELECT {}, password_hash FROM users WHERE email = $1",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, Credentials>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {} FROM users ORDER BY created_at", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError> {
        let sql = format!(
            "UPDATE users
             SET name = COALESCE($2, name),
                 email = COALESCE($3, email),
                 role = COALESCE($4, role),
                 updated_at = now()
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.email)
            .bind(changes.role)
            .fetch_optional(&self.pool)
            .await
            .map_err(email_conflict)
    }

    async fn count_users(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?)
    }
}

#[async_trait]
impl TodoStore for PgStore {
    async fn create_todo(&self, todo: NewTodo) -> Result<Todo, AppError> {
        let todo = Todo::new(todo);
        let sql = format!(
            "INSERT INTO todos (id, title, description, due_date, completed, user_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {}",
            TODO_COLUMNS
        );

        Ok(sqlx::query_as::<_, Todo>(&sql)
            .bind(todo.id)
            .bind(&todo.title)
            .bind(&todo.description)
            .bind(todo.due_date)
            .bind(todo.completed)
            .bind(todo.user_id)
            .bind(todo.created_at)
            .bind(todo.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(missing_owner)?)
    }

    async fn find_todo(&self, owner: Uuid, id: Uuid) -> Result<Option<Todo>, AppError> {
        let sql = format!(
            "SELECT {} FROM todos WHERE id = $1 AND user_id = $2",
            TODO_COLUMNS
        );
        Ok(sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_todos(&self, owner: Uuid, filter: TodoFilter) -> Result<Vec<Todo>, AppError> {
        // The sort column comes from a closed enum, never from user text.
        let sql = format!(
            "SELECT {} FROM todos
             WHERE user_id = $1 AND ($2::boolean IS NULL OR completed = $2)
             ORDER BY {} ASC NULLS FIRST, created_at DESC",
            TODO_COLUMNS,
            filter.sort.column()
        );
        Ok(sqlx::query_as::<_, Todo>(&sql)
            .bind(owner)
            .bind(filter.completed)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_todos_due_between(
        &self,
        owner: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Todo>, AppError> {
        let sql = format!(
            "SELECT {} FROM todos
             WHERE user_id = $1 AND due_date >= $2 AND due_date <= $3
             ORDER BY due_date ASC",
            TODO_COLUMNS
        );
        Ok(sqlx::query_as::<_, Todo>(&sql)
            .bind(owner)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_todo(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: TodoChanges,
    ) -> Result<Option<Todo>, AppError> {
        let sql = format!(
            "UPDATE todos
             SET title = COALESCE($3, title),
                 description = COALESCE($4, description),
                 due_date = COALESCE($5, due_date),
                 completed = COALESCE($6, completed),
                 updated_at = now()
             WHERE id = $1 AND user_id = $2
             RETURNING {}",
            TODO_COLUMNS
        );
        Ok(sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .bind(owner)
            .bind(changes.title)
            .bind(changes.description)
            .bind(changes.due_date)
            .bind(changes.completed)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn toggle_todo(&self, owner: Uuid, id: Uuid) -> Result<Option<Todo>, AppError> {
        let sql = format!(
            "UPDATE todos SET completed = NOT completed, updated_at = now()
             WHERE id = $1 AND user_id = $2
             RETURNING {}",
            TODO_COLUMNS
        );
        Ok(sqlx::query_as::<_, Todo>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_todo(&self, owner: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_all_todos(&self) -> Result<Vec<TodoWithOwner>, AppError> {
        let rows = sqlx::query_as::<_, TodoOwnerRow>(
            "SELECT t.id, t.title, t.description, t.due_date, t.completed, t.user_id,
                    t.created_at, t.updated_at, u.name AS owner_name, u.email AS owner_email
             FROM todos t
             JOIN users u ON u.id = t.user_id
             ORDER BY t.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TodoWithOwner::from).collect())
    }

    async fn count_todos(&self, completed: Option<bool>) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM todos WHERE ($1::boolean IS NULL OR completed = $1)",
        )
        .bind(completed)
        .fetch_one(&self.pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use std::env;

    // Needs a migrated PostgreSQL database in DATABASE_URL.
    #[ignore]
    #[actix_rt::test]
    async fn test_user_and_todo_round_trip() {
        dotenv::dotenv().ok();
        let store = PgStore::connect(&env::var("DATABASE_URL").expect("DATABASE_URL not set"))
            .await
            .unwrap();

        let email = format!("pg_{}@example.com", Uuid::new_v4().simple());
        let user = store
            .create_user(NewUser {
                name: "Pg User".into(),
                email: email.clone(),
                password_hash: "hash".into(),
                role: Role::User,
            })
            .await
            .unwrap();

        let duplicate = store
            .create_user(NewUser {
                name: "Pg User".into(),
                email: email.clone(),
                password_hash: "hash".into(),
                role: Role::User,
            })
            .await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));

        let todo = store
            .create_todo(NewTodo {
                title: "Persisted".into(),
                description: None,
                due_date: None,
                user_id: user.id,
            })
            .await
            .unwrap();
        let toggled = store.toggle_todo(user.id, todo.id).await.unwrap().unwrap();
        assert!(toggled.completed);

        let orphan = store
            .create_todo(NewTodo {
                title: "Orphan".into(),
                description: None,
                due_date: None,
                user_id: Uuid::new_v4(),
            })
            .await;
        assert!(matches!(orphan, Err(AppError::NotFound(message)) if message == "User not found"));

        let _ = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user.id)
            .execute(store.pool())
            .await;
    }

    #[test]
    fn test_missing_owner_passes_other_errors_through() {
        assert!(matches!(
            missing_owner(sqlx::Error::RowNotFound),
            AppError::NotFound(message) if message == "Record not found"
        ));
        assert!(matches!(
            missing_owner(sqlx::Error::PoolTimedOut),
            AppError::Internal(_)
        ));
    }
}
