// src/scripts/mod.rs
pub mod branch;
pub mod issues;
pub mod projects;
