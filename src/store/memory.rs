use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::{TodoStore, UserStore, DUPLICATE_EMAIL};
use crate::error::AppError;
use crate::models::{
    Credentials, NewTodo, NewUser, Todo, TodoChanges, TodoFilter, TodoOwner, TodoWithOwner,
    User, UserChanges,
};

/// In-process store for tests and local runs. Data is lost on restart.
///
/// Locks are never held across an `.await`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, Credentials>>,
    todos: RwLock<HashMap<Uuid, Todo>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn owned<'a>(todos: &'a HashMap<Uuid, Todo>, owner: Uuid, id: Uuid) -> Option<&'a Todo> {
        todos.get(&id).filter(|todo| todo.user_id == owner)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write();
        if users.values().any(|c| c.user.email == user.email) {
            return Err(AppError::Conflict(DUPLICATE_EMAIL.into()));
        }
        let credentials = user.into_credentials();
        let created = credentials.user.clone();
        users.insert(created.id, credentials);
        Ok(created)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().get(&id).map(|c| c.user.clone()))
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>, AppError> {
        Ok(self.users.read()
            .values()
            .find(|c| c.user.email == email)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.users.read().values().map(|c| c.user.clone()).collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError> {
        let mut users = self.users.write();
        if let Some(email) = &changes.email {
            if users.values().any(|c| c.user.id != id && &c.user.email == email) {
                return Err(AppError::Conflict(DUPLICATE_EMAIL.into()));
            }
        }
        Ok(users.get_mut(&id).map(|credentials| {
            changes.apply(&mut credentials.user);
            credentials.user.clone()
        }))
    }

    async fn count_users(&self) -> Result<i64, AppError> {
        Ok(self.users.read().len() as i64)
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn create_todo(&self, todo: NewTodo) -> Result<Todo, AppError> {
        if !self.users.read().contains_key(&todo.user_id) {
            return Err(AppError::NotFound("User not found".into()));
        }
        let todo = Todo::new(todo);
        self.todos.write().insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn find_todo(&self, owner: Uuid, id: Uuid) -> Result<Option<Todo>, AppError> {
        Ok(Self::owned(&self.todos.read(), owner, id).cloned())
    }

    async fn list_todos(&self, owner: Uuid, filter: TodoFilter) -> Result<Vec<Todo>, AppError> {
        let mut todos: Vec<Todo> = self.todos.read()
            .values()
            .filter(|todo| todo.user_id == owner && filter.matches(todo))
            .cloned()
            .collect();
        todos.sort_by(|a, b| filter.sort.compare(a, b));
        Ok(todos)
    }

    async fn list_todos_due_between(
        &self,
        owner: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Todo>, AppError> {
        let mut todos: Vec<Todo> = self.todos.read()
            .values()
            .filter(|todo| todo.user_id == owner)
            .filter(|todo| todo.due_date.map_or(false, |due| start <= due && due <= end))
            .cloned()
            .collect();
        todos.sort_by(|a, b| a.due_date.cmp(&b.due_date));
        Ok(todos)
    }

    async fn update_todo(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: TodoChanges,
    ) -> Result<Option<Todo>, AppError> {
        let mut todos = self.todos.write();
        Ok(todos
            .get_mut(&id)
            .filter(|todo| todo.user_id == owner)
            .map(|todo| {
                changes.apply(todo);
                todo.clone()
            }))
    }

    async fn toggle_todo(&self, owner: Uuid, id: Uuid) -> Result<Option<Todo>, AppError> {
        let mut todos = self.todos.write();
        Ok(todos
            .get_mut(&id)
            .filter(|todo| todo.user_id == owner)
            .map(|todo| {
                todo.completed = !todo.completed;
                todo.updated_at = Utc::now();
                todo.clone()
            }))
    }

    async fn delete_todo(&self, owner: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut todos = self.todos.write();
        if Self::owned(&todos, owner, id).is_none() {
            return Ok(false);
        }
        Ok(todos.remove(&id).is_some())
    }

    async fn list_all_todos(&self) -> Result<Vec<TodoWithOwner>, AppError> {
        let users = self.users.read();
        let mut todos: Vec<TodoWithOwner> = self.todos.read()
            .values()
            .filter_map(|todo| {
                users.get(&todo.user_id).map(|owner| TodoWithOwner {
                    todo: todo.clone(),
                    user: TodoOwner {
                        id: owner.user.id,
                        name: owner.user.name.clone(),
                        email: owner.user.email.clone(),
                    },
                })
            })
            .collect();
        todos.sort_by(|a, b| b.todo.created_at.cmp(&a.todo.created_at));
        Ok(todos)
    }

    async fn count_todos(&self, completed: Option<bool>) -> Result<i64, AppError> {
        Ok(self.todos.read()
            .values()
            .filter(|todo| completed.map_or(true, |c| todo.completed == c))
            .count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, TodoSort};
    use chrono::Duration;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Jo Doe".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role: Role::User,
        }
    }

    fn new_todo(owner: Uuid, title: &str, due_in_days: Option<i64>) -> NewTodo {
        NewTodo {
            title: title.into(),
            description: None,
            due_date: due_in_days.map(|d| Utc::now() + Duration::days(d)),
            user_id: owner,
        }
    }

    #[actix_rt::test]
    async fn test_email_uniqueness() {
        let store = MemoryStore::new();
        let first = store.create_user(new_user("a@b.com")).await.unwrap();
        let second = store.create_user(new_user("c@d.com")).await.unwrap();

        match store.create_user(new_user("a@b.com")).await {
            Err(AppError::Conflict(msg)) => assert_eq!(msg, DUPLICATE_EMAIL),
            other => panic!("expected Conflict, got {:?}", other),
        }

        let changes = UserChanges {
            email: Some("a@b.com".into()),
            ..Default::default()
        };
        assert!(matches!(
            store.update_user(second.id, changes).await,
            Err(AppError::Conflict(_))
        ));

        let same = UserChanges {
            email: Some("a@b.com".into()),
            ..Default::default()
        };
        assert!(store.update_user(first.id, same).await.unwrap().is_some());
        assert_eq!(store.count_users().await.unwrap(), 2);
    }

    #[actix_rt::test]
    async fn test_credentials_lookup() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@b.com")).await.unwrap();

        let credentials = store.find_credentials("a@b.com").await.unwrap().unwrap();
        assert_eq!(credentials.user.id, user.id);
        assert_eq!(credentials.password_hash, "hash");
        assert!(store.find_credentials("x@y.com").await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_todos_are_scoped_by_owner() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice@example.com")).await.unwrap();
        let bob = store.create_user(new_user("bob@example.com")).await.unwrap();
        let todo = store.create_todo(new_todo(alice.id, "Alice's", None)).await.unwrap();

        assert!(store.find_todo(bob.id, todo.id).await.unwrap().is_none());
        assert!(store.toggle_todo(bob.id, todo.id).await.unwrap().is_none());
        assert!(!store.delete_todo(bob.id, todo.id).await.unwrap());
        assert!(store
            .list_todos(bob.id, TodoFilter::default())
            .await
            .unwrap()
            .is_empty());

        assert!(store.delete_todo(alice.id, todo.id).await.unwrap());
        assert!(store.find_todo(alice.id, todo.id).await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_toggle_twice_restores_flag() {
        let store = MemoryStore::new();
        let owner = store.create_user(new_user("a@b.com")).await.unwrap();
        let todo = store.create_todo(new_todo(owner.id, "Flip", None)).await.unwrap();

        let once = store.toggle_todo(owner.id, todo.id).await.unwrap().unwrap();
        let twice = store.toggle_todo(owner.id, todo.id).await.unwrap().unwrap();
        assert!(once.completed);
        assert_eq!(twice.completed, todo.completed);
    }

    #[actix_rt::test]
    async fn test_listing_filters_and_ranges() {
        let store = MemoryStore::new();
        let owner = store.create_user(new_user("a@b.com")).await.unwrap();
        let later = store.create_todo(new_todo(owner.id, "Later", Some(10))).await.unwrap();
        let soon = store.create_todo(new_todo(owner.id, "Soon", Some(1))).await.unwrap();
        let undated = store.create_todo(new_todo(owner.id, "Undated", None)).await.unwrap();
        store.toggle_todo(owner.id, soon.id).await.unwrap();

        let all = store.list_todos(owner.id, TodoFilter::default()).await.unwrap();
        let ids: Vec<Uuid> = all.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![undated.id, soon.id, later.id]);

        let done = TodoFilter {
            completed: Some(true),
            sort: TodoSort::Title,
        };
        let completed = store.list_todos(owner.id, done).await.unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, soon.id);

        let in_range = store
            .list_todos_due_between(owner.id, Utc::now(), Utc::now() + Duration::days(5))
            .await
            .unwrap();
        assert_eq!(in_range.len(), 1);
        assert_eq!(in_range[0].id, soon.id);

        assert_eq!(store.count_todos(None).await.unwrap(), 3);
        assert_eq!(store.count_todos(Some(true)).await.unwrap(), 1);

        let everything = store.list_all_todos().await.unwrap();
        assert_eq!(everything.len(), 3);
        assert!(everything.iter().all(|t| t.user.email == "a@b.com"));
    }

    #[actix_rt::test]
    async fn test_title_sort_is_case_sensitive() {
        let store = MemoryStore::new();
        let owner = store.create_user(new_user("a@b.com")).await.unwrap();
        for title in ["apple", "Zebra", "banana"] {
            store.create_todo(new_todo(owner.id, title, None)).await.unwrap();
        }

        let by_title = TodoFilter {
            completed: None,
            sort: TodoSort::Title,
        };
        let titles: Vec<String> = store
            .list_todos(owner.id, by_title)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["Zebra", "apple", "banana"]);
    }

    #[actix_rt::test]
    async fn test_todo_for_missing_owner_is_not_found() {
        let store = MemoryStore::new();
        match store.create_todo(new_todo(Uuid::new_v4(), "Orphan", None)).await {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "User not found"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[actix_rt::test]
    async fn test_store_stays_usable_after_a_writer_panics() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let held = std::sync::Arc::clone(&store);
        let crashed = std::thread::spawn(move || {
            let _guard = held.users.write();
            panic!("writer crashed while holding the lock");
        })
        .join();
        assert!(crashed.is_err());

        store.create_user(new_user("a@b.com")).await.unwrap();
        assert_eq!(store.count_users().await.unwrap(), 1);
    }
}
