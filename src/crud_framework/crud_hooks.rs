// Crud Hooks - caller-supplied behaviour attached to a screen configuration

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

pub use crate::forms::ChangeReducer;
pub use crate::list::{RecordFilter, RecordMapper};

/// Runs with the response data after a successful create or update
pub type AfterSave = Arc<dyn Fn(&Value) + Send + Sync>;

/// Runs when the user abandons a form
pub type CancelHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone, Default)]
pub struct FormHooks {
    pub on_change: Option<ChangeReducer>,
    pub after_save: Option<AfterSave>,
    pub on_cancel: Option<CancelHook>,
}

impl FormHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_change(mut self, reducer: ChangeReducer) -> Self {
        self.on_change = Some(reducer);
        self
    }

    pub fn after_save(mut self, hook: AfterSave) -> Self {
        self.after_save = Some(hook);
        self
    }

    pub fn on_cancel(mut self, hook: CancelHook) -> Self {
        self.on_cancel = Some(hook);
        self
    }
}

impl fmt::Debug for FormHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormHooks")
            .field("on_change", &self.on_change.is_some())
            .field("after_save", &self.after_save.is_some())
            .field("on_cancel", &self.on_cancel.is_some())
            .finish()
    }
}

#[derive(Clone, Default)]
pub struct ListHooks {
    pub map_action_data: Option<RecordMapper>,
    pub filter_data: Option<RecordFilter>,
}

impl ListHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map_action_data(mut self, mapper: RecordMapper) -> Self {
        self.map_action_data = Some(mapper);
        self
    }

    pub fn filter_data(mut self, filter: RecordFilter) -> Self {
        self.filter_data = Some(filter);
        self
    }
}

impl fmt::Debug for ListHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListHooks")
            .field("map_action_data", &self.map_action_data.is_some())
            .field("filter_data", &self.filter_data.is_some())
            .finish()
    }
}

/// Hooks for all three modes of one screen
#[derive(Debug, Clone, Default)]
pub struct ScreenHooks {
    pub list: ListHooks,
    pub add: FormHooks,
    pub edit: FormHooks,
}
