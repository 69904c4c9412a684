// src/lib.rs
//! Helpers behind the `branch-creator`, `issue-creator` and `project-manager` binaries

pub mod cli;
pub mod config;
pub mod credentials;
pub mod git;
pub mod github;
pub mod scripts;
