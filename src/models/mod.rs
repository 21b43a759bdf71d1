pub mod todo;
pub mod user;

pub use todo::{
    DateRangeQuery, NewTodo, Stats, Todo, TodoChanges, TodoFilter, TodoListQuery, TodoOwner,
    TodoRequest, TodoSort, TodoWithOwner,
};
pub use user::{AdminUserUpdateRequest, Credentials, NewUser, Role, User, UserChanges};
