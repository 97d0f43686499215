// Screens - the parking console's concrete CRUD screens

pub mod penalty_screen;
pub mod ticket_screen;
pub mod violation_type_screen;

use std::sync::Arc;

use crate::core::Record;
use crate::crud_framework::{CrudOrchestrator, ScreenConfig, ScreenHooks};
use crate::error::{AppError, AppResult};
use crate::infrastructure::traits::{ActionTransport, RoleChecker};

/// A named screen: configuration plus its hooks
#[derive(Debug, Clone)]
pub struct ScreenDefinition {
    pub name: &'static str,
    pub config: ScreenConfig,
    pub hooks: ScreenHooks,
}

impl ScreenDefinition {
    pub fn orchestrator(
        &self,
        transport: Arc<dyn ActionTransport>,
        checker: Arc<dyn RoleChecker>,
    ) -> CrudOrchestrator {
        CrudOrchestrator::new(self.config.clone(), self.hooks.clone(), transport, checker)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScreenRegistry {
    screens: Vec<ScreenDefinition>,
}

impl ScreenRegistry {
    /// Build every screen; penalty options come from the violation type records
    pub fn build(violation_types: &[Record]) -> AppResult<Self> {
        Ok(Self {
            screens: vec![
                penalty_screen::definition(violation_types)?,
                ticket_screen::definition()?,
                violation_type_screen::definition()?,
            ],
        })
    }

    pub fn get(&self, name: &str) -> AppResult<&ScreenDefinition> {
        self.screens
            .iter()
            .find(|screen| screen.name == name)
            .ok_or_else(|| AppError::NotFound(format!("No screen named {}", name)))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.screens.iter().map(|screen| screen.name).collect()
    }
}
