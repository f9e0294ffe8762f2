//! Native client for the Student Employment System auth and profile API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `token_store` persists credentials, `api` talks to the REST service,
//! `session` owns the auth lifecycle on top of both, and `guard` turns the
//! session state into route decisions.

pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod session;
pub mod token_store;
pub mod types;

pub use api::{ApiClient, AuthApi, StudentsApi};
pub use config::ClientConfig;
pub use error::{ApiError, SessionError, TokenStoreError};
pub use session::{Session, SessionManager, SessionState};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
