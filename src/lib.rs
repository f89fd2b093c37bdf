pub mod adapters;
pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod repository;
pub mod usecase;
pub mod validation;
pub mod worker;

pub use cli::Cli;
pub use config::Config;
pub use error::{GophermartError, Result};
