// Crud Privacy - per-operation capability resolution for a screen
// Role requirements come from configuration, membership from a RoleChecker

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::infrastructure::traits::RoleChecker;

/// Operations a CRUD screen can gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrudOperation {
    List,
    Add,
    Edit,
    Delete,
}

impl fmt::Display for CrudOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrudOperation::List => "list",
            CrudOperation::Add => "add",
            CrudOperation::Edit => "edit",
            CrudOperation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Roles required per operation; holding any one of them grants it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionSet {
    #[serde(default)]
    pub list: BTreeSet<String>,
    #[serde(default)]
    pub add: BTreeSet<String>,
    #[serde(default)]
    pub edit: BTreeSet<String>,
    #[serde(default)]
    pub delete: BTreeSet<String>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, operation: CrudOperation, roles: &[&str]) -> Self {
        let set = match operation {
            CrudOperation::List => &mut self.list,
            CrudOperation::Add => &mut self.add,
            CrudOperation::Edit => &mut self.edit,
            CrudOperation::Delete => &mut self.delete,
        };
        set.extend(roles.iter().map(|role| role.to_string()));
        self
    }

    pub fn roles_for(&self, operation: CrudOperation) -> &BTreeSet<String> {
        match operation {
            CrudOperation::List => &self.list,
            CrudOperation::Add => &self.add,
            CrudOperation::Edit => &self.edit,
            CrudOperation::Delete => &self.delete,
        }
    }
}

/// Explicit switches from configuration. `Some(false)` turns an operation
/// off no matter which roles the user holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionToggles {
    #[serde(default)]
    pub list: Option<bool>,
    #[serde(default)]
    pub add: Option<bool>,
    #[serde(default)]
    pub edit: Option<bool>,
    #[serde(default)]
    pub delete: Option<bool>,
}

impl ActionToggles {
    pub fn disable(mut self, operation: CrudOperation) -> Self {
        *self.slot(operation) = Some(false);
        self
    }

    pub fn is_disabled(&self, operation: CrudOperation) -> bool {
        let flag = match operation {
            CrudOperation::List => self.list,
            CrudOperation::Add => self.add,
            CrudOperation::Edit => self.edit,
            CrudOperation::Delete => self.delete,
        };
        flag == Some(false)
    }

    fn slot(&mut self, operation: CrudOperation) -> &mut Option<bool> {
        match operation {
            CrudOperation::List => &mut self.list,
            CrudOperation::Add => &mut self.add,
            CrudOperation::Edit => &mut self.edit,
            CrudOperation::Delete => &mut self.delete,
        }
    }
}

/// Resolved capabilities of one mounted screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub list: bool,
    pub add: bool,
    pub edit: bool,
    pub delete: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            list: true,
            add: true,
            edit: true,
            delete: true,
        }
    }

    pub fn allows(&self, operation: CrudOperation) -> bool {
        match operation {
            CrudOperation::List => self.list,
            CrudOperation::Add => self.add,
            CrudOperation::Edit => self.edit,
            CrudOperation::Delete => self.delete,
        }
    }
}

pub struct PermissionGate {
    checker: Arc<dyn RoleChecker>,
    roles: PermissionSet,
    toggles: ActionToggles,
}

impl fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionGate")
            .field("roles", &self.roles)
            .field("toggles", &self.toggles)
            .finish()
    }
}

impl PermissionGate {
    pub fn new(checker: Arc<dyn RoleChecker>, roles: PermissionSet, toggles: ActionToggles) -> Self {
        Self {
            checker,
            roles,
            toggles,
        }
    }

    /// Decide one operation.
    ///
    /// Precedence: an explicit disable wins, then an empty role set grants
    /// without asking the checker, then the checker decides. A checker error
    /// counts as not holding the role.
    pub async fn resolve(&self, operation: CrudOperation) -> bool {
        if self.toggles.is_disabled(operation) {
            debug!("{} disabled by configuration", operation);
            return false;
        }

        let required = self.roles.roles_for(operation);
        if required.is_empty() {
            return true;
        }

        match self.checker.has_any_role(required).await {
            Ok(granted) => granted,
            Err(e) => {
                warn!("Role check for {} failed, denying: {}", operation, e);
                false
            }
        }
    }

    /// Resolve every operation concurrently
    pub async fn resolve_all(&self) -> Capabilities {
        let (list, add, edit, delete) = futures::join!(
            self.resolve(CrudOperation::List),
            self.resolve(CrudOperation::Add),
            self.resolve(CrudOperation::Edit),
            self.resolve(CrudOperation::Delete),
        );
        Capabilities {
            list,
            add,
            edit,
            delete,
        }
    }
}

/// Role checker over a fixed set of granted roles
#[derive(Debug, Clone, Default)]
pub struct StaticRoleChecker {
    granted: BTreeSet<String>,
}

impl StaticRoleChecker {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            granted: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn granted(&self) -> &BTreeSet<String> {
        &self.granted
    }
}

#[async_trait]
impl RoleChecker for StaticRoleChecker {
    async fn has_any_role(&self, roles: &BTreeSet<String>) -> AppResult<bool> {
        Ok(roles.iter().any(|role| self.granted.contains(role)))
    }
}
