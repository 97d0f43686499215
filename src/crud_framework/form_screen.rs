// Form Screens - add and edit modes over the dynamic form interpreter

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::Record;
use crate::crud_framework::crud_config::{ActionConfig, EditConfig, FormConfig};
use crate::crud_framework::crud_hooks::FormHooks;
use crate::error::{AppError, AppResult};
use crate::forms::{DynamicForm, FieldDefinition, FormSubmitter, Validity};
use crate::infrastructure::action::{user_message, ActionRequest, INVALID_RESPONSE};
use crate::infrastructure::traits::ActionTransport;

/// Sends a form payload to a remote action. Configured params are applied
/// after the payload so identifying keys cannot be overwritten by fields.
pub struct ActionSubmitter {
    transport: Arc<dyn ActionTransport>,
    action: ActionConfig,
    params: Record,
}

impl ActionSubmitter {
    pub fn new(transport: Arc<dyn ActionTransport>, action: ActionConfig, params: Record) -> Self {
        Self {
            transport,
            action,
            params,
        }
    }
}

#[async_trait]
impl FormSubmitter for ActionSubmitter {
    async fn submit(&self, payload: Record) -> AppResult<Value> {
        let request = ActionRequest::new(&self.action.model, &self.action.action)
            .params(&payload)
            .params(&self.params);
        let response = self.transport.execute(request).await?;
        self.action.response_codes.decode(response)
    }
}

/// A mounted form bound to its submit action
pub struct FormScreen {
    form: DynamicForm,
    submitter: ActionSubmitter,
    hooks: FormHooks,
    processing: bool,
    notice: Option<String>,
}

impl fmt::Debug for FormScreen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormScreen")
            .field("action", &self.submitter.action)
            .field("form", &self.form)
            .field("processing", &self.processing)
            .finish()
    }
}

impl FormScreen {
    pub fn new(
        fields: Vec<FieldDefinition>,
        submitter: ActionSubmitter,
        hooks: FormHooks,
    ) -> AppResult<Self> {
        let mut form = DynamicForm::new(fields)?;
        if let Some(reducer) = &hooks.on_change {
            form = form.with_reducer(reducer.clone());
        }
        Ok(Self {
            form,
            submitter,
            hooks,
            processing: false,
            notice: None,
        })
    }

    /// Add mode: every field starts from its static default
    pub fn for_add(config: &FormConfig, hooks: &FormHooks, transport: Arc<dyn ActionTransport>) -> AppResult<Self> {
        let submitter = ActionSubmitter::new(transport, config.submit_action(), config.params.clone());
        Self::new(config.form_structure.clone(), submitter, hooks.clone())
    }

    pub fn form(&self) -> &DynamicForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut DynamicForm {
        &mut self.form
    }

    pub fn on_change(&mut self, name: &str, value: Value) -> AppResult<Validity> {
        self.form.on_change(name, value)
    }

    /// Validate and submit; runs `after_save` with the response data on success.
    ///
    /// `is_processing` is raised only while the remote call runs and drops back
    /// even when this future is abandoned before it completes.
    pub async fn submit(&mut self) -> AppResult<Value> {
        let outcome = {
            let _processing = ProcessingFlag::raise(&mut self.processing);
            self.form.submit(&self.submitter).await
        };

        match outcome {
            Ok(data) => {
                info!(
                    "Saved {} via {}",
                    self.submitter.action.model, self.submitter.action.action
                );
                self.notice = None;
                if let Some(after_save) = &self.hooks.after_save {
                    after_save(&data);
                }
                Ok(data)
            }
            Err(AppError::FieldErrors(errors)) => {
                debug!("Submit blocked by field errors: {:?}", errors.keys().collect::<Vec<_>>());
                Err(AppError::FieldErrors(errors))
            }
            Err(e) => {
                warn!(
                    "Submitting {}.{} failed: {}",
                    self.submitter.action.model, self.submitter.action.action, e
                );
                self.notice = Some(user_message(&e));
                Err(e)
            }
        }
    }

    pub fn cancel(&self) {
        if let Some(on_cancel) = &self.hooks.on_cancel {
            self.form.cancel(on_cancel.as_ref());
        }
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}

/// Holds `processing` up until dropped
struct ProcessingFlag<'a>(&'a mut bool);

impl<'a> ProcessingFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        ProcessingFlag(flag)
    }
}

impl Drop for ProcessingFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

/// Outcome of loading an edit screen's record
#[derive(Debug)]
pub enum EditState {
    Ready(FormScreen),
    /// Blocking error panel shown in place of the form
    Failed(String),
}

#[derive(Debug)]
pub struct EditScreen {
    record_id: Value,
    state: EditState,
}

impl EditScreen {
    /// Fetch the record's details and build the form around them.
    ///
    /// Transport and decode failures end in `EditState::Failed`; only a broken
    /// field list is returned as an error.
    pub async fn mount(
        config: &EditConfig,
        item_id: &str,
        record_id: Value,
        hooks: &FormHooks,
        transport: Arc<dyn ActionTransport>,
    ) -> AppResult<Self> {
        let details = &config.get_details;
        let request = ActionRequest::new(&details.model, &details.action).param(item_id, record_id.clone());

        let fetched = match transport.execute(request).await {
            Ok(response) => details.response_codes.decode(response),
            Err(e) => Err(e),
        };

        let state = match fetched {
            Ok(Value::Object(data)) => {
                let fields = merge_details(&config.form.form_structure, &data);
                let mut params = config.form.params.clone();
                params.insert(item_id.to_string(), record_id.clone());
                let submitter = ActionSubmitter::new(transport, config.form.submit_action(), params);
                EditState::Ready(FormScreen::new(fields, submitter, hooks.clone())?)
            }
            Ok(other) => {
                warn!("Details for {} {} are not an object: {}", details.model, record_id, other);
                EditState::Failed(INVALID_RESPONSE.to_string())
            }
            Err(e) => {
                warn!("Loading {} {} failed: {}", details.model, record_id, e);
                EditState::Failed(user_message(&e))
            }
        };

        Ok(Self { record_id, state })
    }

    pub fn record_id(&self) -> &Value {
        &self.record_id
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn form_screen(&self) -> Option<&FormScreen> {
        match &self.state {
            EditState::Ready(screen) => Some(screen),
            EditState::Failed(_) => None,
        }
    }

    pub fn form_screen_mut(&mut self) -> Option<&mut FormScreen> {
        match &mut self.state {
            EditState::Ready(screen) => Some(screen),
            EditState::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            EditState::Failed(message) => Some(message),
            EditState::Ready(_) => None,
        }
    }

    pub async fn submit(&mut self) -> AppResult<Value> {
        match &mut self.state {
            EditState::Ready(screen) => screen.submit().await,
            EditState::Failed(message) => Err(AppError::InvalidResponse(message.clone())),
        }
    }
}

/// Fetched values replace the static defaults of fields with the same name
pub fn merge_details(fields: &[FieldDefinition], details: &Record) -> Vec<FieldDefinition> {
    fields
        .iter()
        .cloned()
        .map(|mut field| {
            if let Some(value) = details.get(&field.name) {
                field.value = Some(value.clone());
            }
            field
        })
        .collect()
}
