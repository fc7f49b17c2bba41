pub mod admin;
pub mod config;
pub mod db;
pub mod error;
pub mod web;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
