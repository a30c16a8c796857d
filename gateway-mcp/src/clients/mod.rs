//! Backend REST collaborator.
//!
//! The dispatcher never talks HTTP itself; tools, resources and prompts in
//! `crate::tools` call the project-management backend through this client.

pub mod backend;
pub mod config;

pub use backend::{BackendClient, BackendError, NewProject, NewStory};
pub use config::BackendConfig;
