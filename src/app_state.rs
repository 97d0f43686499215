use std::sync::Arc;

use crate::{
    action_interface::{create_action_router, ActionInterface},
    config::Config,
    core::Record,
    crud_framework::{CrudOrchestrator, StaticRoleChecker},
    data_seeder::seed_console_data,
    error::AppResult,
    infrastructure::{ActionTransport, CachingRoleChecker, ChunkedUploader, ResponseCodes, RoleChecker, RouterTransport},
    screens::ScreenRegistry,
    services::{model_rules::VIOLATION_TYPES, SUCCESS_CODE},
};

pub const ATTACHMENT_MODEL: &str = "attachments";

#[derive(Clone)]
pub struct AppState {
    pub action_interface: ActionInterface,
    pub transport: Arc<dyn ActionTransport>,
    pub role_checker: Arc<dyn RoleChecker>,
    pub screens: ScreenRegistry,
    pub config: Config,
}

impl AppState {
    /// Seeded backend, in-process transport and the console's screens
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let action_interface = ActionInterface::with_console_models(config.list.page_size).await;
        seed_console_data(action_interface.store(), config.seed.penalties, config.seed.tickets).await?;

        let transport: Arc<dyn ActionTransport> =
            Arc::new(RouterTransport::new(create_action_router(action_interface.clone())));
        let role_checker: Arc<dyn RoleChecker> = Arc::new(CachingRoleChecker::new(
            StaticRoleChecker::new(config.roles.granted.iter().cloned()),
            config.roles.cache_capacity,
        ));

        let violation_types: Vec<Record> = action_interface.store().all(VIOLATION_TYPES).await;
        let screens = ScreenRegistry::build(&violation_types)?;

        Ok(Self {
            action_interface,
            transport,
            role_checker,
            screens,
            config,
        })
    }

    pub fn orchestrator(&self, screen: &str) -> AppResult<CrudOrchestrator> {
        let definition = self.screens.get(screen)?;
        Ok(definition.orchestrator(self.transport.clone(), self.role_checker.clone()))
    }

    pub fn uploader(&self) -> ChunkedUploader {
        ChunkedUploader::new(self.transport.clone(), ATTACHMENT_MODEL, ResponseCodes::new(SUCCESS_CODE))
            .with_chunk_size(self.config.upload.chunk_size)
    }
}
