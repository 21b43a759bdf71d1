#![doc = "The `todoforge` library crate."]
#![doc = ""]
#![doc = "A multi-tenant to-do list service: accounts with bcrypt-hashed passwords, HS256"]
#![doc = "bearer tokens, owner-scoped todo CRUD and role-gated admin views. The binary"]
#![doc = "(`main.rs`) reads the configuration, opens the store and serves [`routes::config`]."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod response;
pub mod routes;
pub mod state;
pub mod store;
pub mod validation;

pub use crate::error::AppError;
pub use crate::state::AppState;
