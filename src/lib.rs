//! Lingo-Lah library
//!
//! Exposes the glossary, explanation cache, fetch coordination and provider
//! modules for the binary and for integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod glossary;
pub mod logging;
pub mod provider;
pub mod ui;
