// src/github/mod.rs

pub mod client;
pub mod error;
pub mod retry;
pub mod types;

pub use client::GitHubClient;
pub use error::ApiError;
pub use retry::RetryPolicy;
