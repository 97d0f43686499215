// Parking Admin - config-driven CRUD console engine

// Core value helpers and request epochs
pub mod core;

// Field definitions, validation and the dynamic form interpreter
pub mod forms;

// Paginated, searchable, exportable lists
pub mod list;

// Remote action convention, transports and uploads
pub mod infrastructure;

// List/add/edit screens, permissions and hooks
pub mod crud_framework;

// Concrete console screens
pub mod screens;

// Demo action backend
pub mod action_interface;
pub mod services;
pub mod data_seeder;

// Common utilities
pub mod app_state;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use crud_framework::{CrudMode, CrudOrchestrator, CrudScreen, ScreenConfig};
pub use error::{AppError, AppResult};
