// Crud Config - declarative description of one CRUD screen
// Deserialized from JSON so screens can be authored without code

use serde::{Deserialize, Serialize};

use crate::core::Record;
use crate::crud_framework::crud_privacy::{ActionToggles, PermissionSet};
use crate::error::{AppError, AppResult};
use crate::forms::FieldDefinition;
use crate::infrastructure::action::ResponseCodes;
use crate::list::columns::searchable_paths;
use crate::list::{ColumnDefinition, ExportColumn, ListSource};

pub const DEFAULT_PAGE_SIZE: usize = 20;

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_item_id() -> String {
    "id".to_string()
}

/// Which toolbar controls the list offers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolbarConfig {
    #[serde(default)]
    pub search: bool,
    #[serde(default)]
    pub export: bool,
    #[serde(default)]
    pub print: bool,
    #[serde(default)]
    pub add: bool,
}

impl ToolbarConfig {
    pub fn all() -> Self {
        Self {
            search: true,
            export: true,
            print: true,
            add: true,
        }
    }
}

/// A remote action together with the codes used to decode its response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionConfig {
    pub model: String,
    pub action: String,
    pub response_codes: ResponseCodes,
}

impl ActionConfig {
    pub fn new(model: &str, action: &str, response_codes: ResponseCodes) -> Self {
        Self {
            model: model.to_string(),
            action: action.to_string(),
            response_codes,
        }
    }
}

pub type DetailsConfig = ActionConfig;
pub type DeleteConfig = ActionConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListConfig {
    pub model: String,
    pub action: String,
    #[serde(default = "default_item_id")]
    pub item_id: String,
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub toolbar: ToolbarConfig,
    pub response_codes: ResponseCodes,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Export remapping; derived from the columns when empty
    #[serde(default)]
    pub export_columns: Vec<ExportColumn>,
    #[serde(default)]
    pub delete_item: Option<DeleteConfig>,
}

impl ListConfig {
    pub fn source(&self) -> ListSource {
        ListSource {
            model: self.model.clone(),
            action: self.action.clone(),
            item_id: self.item_id.clone(),
            response_codes: self.response_codes.clone(),
            search_fields: searchable_paths(&self.columns),
        }
    }

    pub fn export_remap(&self) -> Vec<ExportColumn> {
        if !self.export_columns.is_empty() {
            return self.export_columns.clone();
        }
        self.columns
            .iter()
            .map(|column| ExportColumn::new(&column.path, &column.name))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormConfig {
    pub model: String,
    pub action: String,
    pub response_codes: ResponseCodes,
    pub form_structure: Vec<FieldDefinition>,
    /// Identifying parameters sent with every submit
    #[serde(default)]
    pub params: Record,
}

impl FormConfig {
    pub fn submit_action(&self) -> ActionConfig {
        ActionConfig::new(&self.model, &self.action, self.response_codes.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditConfig {
    #[serde(flatten)]
    pub form: FormConfig,
    pub get_details: DetailsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenConfig {
    pub list: ListConfig,
    pub add: FormConfig,
    pub edit: EditConfig,
    #[serde(default)]
    pub roles: PermissionSet,
    #[serde(default)]
    pub actions: ActionToggles,
}

impl ScreenConfig {
    pub fn from_json(json: &str) -> AppResult<Self> {
        let config: ScreenConfig = serde_json::from_str(json)
            .map_err(|e| AppError::ConfigurationError(format!("invalid screen config: {}", e)))?;
        config.check()?;
        Ok(config)
    }

    /// Reject configurations no screen could be built from
    pub fn check(&self) -> AppResult<()> {
        if self.list.columns.is_empty() {
            return Err(AppError::ConfigurationError(format!(
                "list {}.{} has no columns",
                self.list.model, self.list.action
            )));
        }
        if self.list.item_id.is_empty() {
            return Err(AppError::ConfigurationError("list itemId is empty".to_string()));
        }
        for (mode, form) in [("add", &self.add), ("edit", &self.edit.form)] {
            if form.form_structure.is_empty() {
                return Err(AppError::ConfigurationError(format!("{} form has no fields", mode)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crud_framework::crud_privacy::CrudOperation;
    use crate::forms::FieldKind;

    const CONFIG: &str = r#"{
        "list": {
            "model": "tickets",
            "action": "list",
            "columns": [
                {"name": "Subject", "path": "subject", "searchable": true},
                {"name": "Status", "path": "status", "searchable": true},
                {"name": "Opened", "path": "created_at"}
            ],
            "toolbar": {"search": true, "export": true},
            "responseCodes": {"successCode": "2000"},
            "deleteItem": {"model": "tickets", "action": "delete", "responseCodes": {"successCode": "2000"}}
        },
        "add": {
            "model": "tickets",
            "action": "create",
            "responseCodes": {"successCode": "2000"},
            "formStructure": [
                {"name": "subject", "label": "Subject", "type": "text", "validate": {"required": true}}
            ],
            "params": {"source": "console"}
        },
        "edit": {
            "model": "tickets",
            "action": "update",
            "responseCodes": {"successCode": "2000"},
            "formStructure": [
                {"name": "status", "label": "Status", "type": "select",
                 "options": [{"label": "New", "value": "new"}, {"label": "Closed", "value": "closed"}]}
            ],
            "getDetails": {"model": "tickets", "action": "details", "responseCodes": {"successCode": "2000"}}
        },
        "roles": {"delete": ["admin"]},
        "actions": {"add": false}
    }"#;

    #[test]
    fn test_parse_screen_config() {
        let config = ScreenConfig::from_json(CONFIG).unwrap();

        assert_eq!(config.list.item_id, "id");
        assert_eq!(config.list.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.list.toolbar.search && !config.list.toolbar.add);
        assert_eq!(config.list.source().search_fields, vec!["subject", "status"]);
        assert!(config.list.delete_item.is_some());
        assert_eq!(config.add.params["source"], "console");
        assert!(matches!(config.edit.form.form_structure[0].kind, FieldKind::Select { .. }));
        assert_eq!(config.edit.get_details.action, "details");
        assert!(config.roles.roles_for(CrudOperation::Delete).contains("admin"));
        assert!(config.actions.is_disabled(CrudOperation::Add));
    }

    #[test]
    fn test_export_remap_defaults_to_columns() {
        let config = ScreenConfig::from_json(CONFIG).unwrap();
        let remap = config.list.export_remap();
        assert_eq!(remap[0], ExportColumn::new("subject", "Subject"));
        assert_eq!(remap.len(), 3);
    }

    #[test]
    fn test_config_without_columns_is_rejected() {
        let mut config = ScreenConfig::from_json(CONFIG).unwrap();
        config.list.columns.clear();
        assert!(matches!(config.check(), Err(AppError::ConfigurationError(_))));
    }

    #[test]
    fn test_malformed_json_is_configuration_error() {
        assert!(matches!(
            ScreenConfig::from_json(r#"{"list": 3}"#),
            Err(AppError::ConfigurationError(_))
        ));
    }
}
