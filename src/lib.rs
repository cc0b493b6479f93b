pub mod analytics;
pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod state;
