// CRUD Framework - config-driven list/add/edit screens
// A screen is mounted in one mode at a time; navigation picks the mode

pub mod crud_config;
pub mod crud_hooks;
pub mod crud_privacy;
pub mod form_screen;
pub mod list_screen;

#[cfg(test)]
pub(crate) mod test_support;

pub use crud_config::{ActionConfig, EditConfig, FormConfig, ListConfig, ScreenConfig, ToolbarConfig};
pub use crud_hooks::{AfterSave, CancelHook, FormHooks, ListHooks, ScreenHooks};
pub use crud_privacy::{ActionToggles, Capabilities, CrudOperation, PermissionGate, PermissionSet, StaticRoleChecker};
pub use form_screen::{ActionSubmitter, EditScreen, EditState, FormScreen};
pub use list_screen::{DeleteState, ListScreen, RowActions, Toolbar};

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::core::RequestEpoch;
use crate::error::{AppError, AppResult};
use crate::infrastructure::traits::{ActionTransport, RoleChecker};

/// Mode requested by navigation
#[derive(Debug, Clone, PartialEq)]
pub enum CrudMode {
    List,
    Add,
    Edit { record_id: Value },
}

impl fmt::Display for CrudMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrudMode::List => f.write_str("list"),
            CrudMode::Add => f.write_str("add"),
            CrudMode::Edit { record_id } => write!(f, "edit {}", record_id),
        }
    }
}

/// A mounted screen
#[derive(Debug)]
pub enum CrudScreen {
    List(ListScreen),
    Add(FormScreen),
    Edit(EditScreen),
}

impl CrudScreen {
    pub fn as_list(&mut self) -> Option<&mut ListScreen> {
        match self {
            CrudScreen::List(screen) => Some(screen),
            _ => None,
        }
    }

    pub fn as_add(&mut self) -> Option<&mut FormScreen> {
        match self {
            CrudScreen::Add(screen) => Some(screen),
            _ => None,
        }
    }

    pub fn as_edit(&mut self) -> Option<&mut EditScreen> {
        match self {
            CrudScreen::Edit(screen) => Some(screen),
            _ => None,
        }
    }
}

/// Builds screens for one configuration. Each mount supersedes the previous
/// one; a mount that finishes after being superseded returns `AppError::Stale`.
pub struct CrudOrchestrator {
    config: ScreenConfig,
    hooks: ScreenHooks,
    transport: Arc<dyn ActionTransport>,
    gate: PermissionGate,
    epoch: RequestEpoch,
}

impl fmt::Debug for CrudOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrudOrchestrator")
            .field("model", &self.config.list.model)
            .field("gate", &self.gate)
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl CrudOrchestrator {
    pub fn new(
        config: ScreenConfig,
        hooks: ScreenHooks,
        transport: Arc<dyn ActionTransport>,
        checker: Arc<dyn RoleChecker>,
    ) -> Self {
        let gate = PermissionGate::new(checker, config.roles.clone(), config.actions.clone());
        Self {
            config,
            hooks,
            transport,
            gate,
            epoch: RequestEpoch::new(),
        }
    }

    pub fn config(&self) -> &ScreenConfig {
        &self.config
    }

    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    pub async fn mount(&self, mode: CrudMode) -> AppResult<CrudScreen> {
        let ticket = self.epoch.advance();
        info!("Mounting {} screen for {}", mode, self.config.list.model);

        let screen = match mode {
            CrudMode::List => CrudScreen::List(
                ListScreen::mount(&self.config.list, &self.hooks.list, self.transport.clone(), &self.gate).await,
            ),
            CrudMode::Add => {
                self.require(CrudOperation::Add).await?;
                CrudScreen::Add(FormScreen::for_add(&self.config.add, &self.hooks.add, self.transport.clone())?)
            }
            CrudMode::Edit { record_id } => {
                self.require(CrudOperation::Edit).await?;
                CrudScreen::Edit(
                    EditScreen::mount(
                        &self.config.edit,
                        &self.config.list.item_id,
                        record_id,
                        &self.hooks.edit,
                        self.transport.clone(),
                    )
                    .await?,
                )
            }
        };

        if !self.epoch.is_current(ticket) {
            debug!("Discarding superseded mount (epoch {})", ticket.value());
            return Err(AppError::Stale("Screen was replaced before it finished loading".to_string()));
        }
        Ok(screen)
    }

    async fn require(&self, operation: CrudOperation) -> AppResult<()> {
        if self.gate.resolve(operation).await {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Not allowed to {} {}",
                operation, self.config.list.model
            )))
        }
    }
}
