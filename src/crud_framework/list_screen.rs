// List Screen - toolbar, table and row actions over a ListDataController

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::core::Record;
use crate::crud_framework::crud_config::ListConfig;
use crate::crud_framework::crud_hooks::ListHooks;
use crate::crud_framework::crud_privacy::{Capabilities, PermissionGate};
use crate::error::{AppError, AppResult};
use crate::infrastructure::action::{user_message, ActionRequest};
use crate::infrastructure::traits::ActionTransport;
use crate::list::{ExportTable, ListDataController, ListPage};

/// Two-step delete: confirming makes no remote call, processing cannot be dismissed
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteState {
    Idle,
    Confirming { record_id: Value },
    Processing { record_id: Value },
}

/// Keeps the delete in `Processing` until dropped, then returns it to `Idle`
struct DeleteInFlight<'a>(&'a mut DeleteState);

impl<'a> DeleteInFlight<'a> {
    fn begin(state: &'a mut DeleteState, record_id: Value) -> Self {
        *state = DeleteState::Processing { record_id };
        DeleteInFlight(state)
    }
}

impl Drop for DeleteInFlight<'_> {
    fn drop(&mut self) {
        *self.0 = DeleteState::Idle;
    }
}

/// Toolbar controls that are currently shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Toolbar {
    pub add: bool,
    pub export: bool,
    pub search: bool,
    pub print: bool,
    pub load_more: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowActions {
    pub edit: bool,
    pub delete: bool,
}

pub struct ListScreen {
    config: ListConfig,
    transport: Arc<dyn ActionTransport>,
    controller: ListDataController,
    capabilities: Capabilities,
    delete_state: DeleteState,
    notice: Option<String>,
}

impl fmt::Debug for ListScreen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListScreen")
            .field("model", &self.config.model)
            .field("capabilities", &self.capabilities)
            .field("delete_state", &self.delete_state)
            .field("controller", &self.controller)
            .finish()
    }
}

impl ListScreen {
    /// Resolve capabilities, then load the first page when listing is allowed
    pub async fn mount(
        config: &ListConfig,
        hooks: &ListHooks,
        transport: Arc<dyn ActionTransport>,
        gate: &PermissionGate,
    ) -> Self {
        let mut controller = ListDataController::new(transport.clone(), config.source(), config.page_size);
        if let Some(mapper) = &hooks.map_action_data {
            controller = controller.with_mapper(mapper.clone());
        }
        if let Some(filter) = &hooks.filter_data {
            controller = controller.with_filter(filter.clone());
        }

        let capabilities = gate.resolve_all().await;
        let mut screen = Self {
            config: config.clone(),
            transport,
            controller,
            capabilities,
            delete_state: DeleteState::Idle,
            notice: None,
        };

        if capabilities.list {
            screen.controller.load_first().await;
        } else {
            screen.notice = Some(format!("You are not allowed to view {}", config.model));
        }
        screen
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn toolbar(&self) -> Toolbar {
        let toolbar = &self.config.toolbar;
        let has_rows = self.controller.row_count() > 0;
        Toolbar {
            add: toolbar.add && self.capabilities.add,
            export: toolbar.export && has_rows,
            search: toolbar.search,
            print: toolbar.print && has_rows,
            load_more: self.controller.can_load_more(),
        }
    }

    pub fn row_actions(&self, record: &Record) -> RowActions {
        let has_id = record.contains_key(&self.config.item_id);
        RowActions {
            edit: has_id && self.capabilities.edit,
            delete: has_id && self.capabilities.delete && self.config.delete_item.is_some(),
        }
    }

    pub fn rows(&self) -> Vec<Record> {
        self.controller.visible_rows()
    }

    /// Rendered cells of every visible row, in column order
    pub fn cells(&self) -> Vec<Vec<String>> {
        self.rows()
            .iter()
            .map(|row| self.config.columns.iter().map(|column| column.cell(row)).collect())
            .collect()
    }

    pub fn headers(&self) -> Vec<&str> {
        self.config.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn search(&mut self, term: &str) -> Vec<Record> {
        self.controller.set_search(term);
        self.rows()
    }

    pub async fn load_more(&mut self) -> ListPage {
        self.controller.load_more().await
    }

    pub async fn refresh(&mut self) -> ListPage {
        self.controller.refresh().await
    }

    pub fn request_delete(&mut self, record: &Record) -> AppResult<()> {
        if !self.row_actions(record).delete {
            return Err(AppError::Forbidden("Delete is not available for this record".to_string()));
        }
        if self.delete_state != DeleteState::Idle {
            return Err(AppError::Busy("Another delete is pending".to_string()));
        }
        let record_id = record
            .get(&self.config.item_id)
            .cloned()
            .ok_or_else(|| AppError::BadRequest(format!("Record has no {}", self.config.item_id)))?;

        self.delete_state = DeleteState::Confirming { record_id };
        Ok(())
    }

    /// Dismiss the confirmation; returns false while the delete is processing
    pub fn cancel_delete(&mut self) -> bool {
        match self.delete_state {
            DeleteState::Confirming { .. } => {
                self.delete_state = DeleteState::Idle;
                true
            }
            DeleteState::Processing { .. } | DeleteState::Idle => false,
        }
    }

    /// Run the confirmed delete, then reload from the first page
    pub async fn confirm_delete(&mut self) -> AppResult<()> {
        let record_id = match &self.delete_state {
            DeleteState::Confirming { record_id } => record_id.clone(),
            DeleteState::Processing { .. } => {
                return Err(AppError::Busy("Delete already in progress".to_string()))
            }
            DeleteState::Idle => return Err(AppError::BadRequest("No delete to confirm".to_string())),
        };
        let delete = self
            .config
            .delete_item
            .clone()
            .ok_or_else(|| AppError::ConfigurationError("list has no delete action".to_string()))?;

        let request = ActionRequest::new(&delete.model, &delete.action).param(&self.config.item_id, record_id.clone());
        let outcome = {
            let _processing = DeleteInFlight::begin(&mut self.delete_state, record_id.clone());
            match self.transport.execute(request).await {
                Ok(response) => delete.response_codes.decode(response),
                Err(e) => Err(e),
            }
        };

        match outcome {
            Ok(_) => {
                info!("Deleted {} {}", self.config.model, record_id);
                self.notice = None;
                self.controller.refresh().await;
                Ok(())
            }
            Err(e) => {
                warn!("Deleting {} {} failed: {}", self.config.model, record_id, e);
                self.notice = Some(user_message(&e));
                Err(e)
            }
        }
    }

    pub fn delete_state(&self) -> &DeleteState {
        &self.delete_state
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.delete_state, DeleteState::Processing { .. })
    }

    pub fn is_loading(&self) -> bool {
        self.controller.is_loading()
    }

    /// Spreadsheet of everything loaded so far
    pub fn export(&self) -> AppResult<ExportTable> {
        if !self.config.toolbar.export {
            return Err(AppError::Forbidden("Export is not enabled for this list".to_string()));
        }
        Ok(self.controller.export(&self.config.export_remap()))
    }

    /// The screen-level notice, falling back to the controller's load notice
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref().or_else(|| self.controller.notice())
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
        self.controller.take_notice();
    }

    pub fn controller(&self) -> &ListDataController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ListDataController {
        &mut self.controller
    }

    pub fn config(&self) -> &ListConfig {
        &self.config
    }
}
