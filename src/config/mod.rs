//! Configuration module for the dashboard
//!
//! This module provides configuration management including:
//! - Workspace path resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::WorkspacePaths;
pub use settings::Settings;
