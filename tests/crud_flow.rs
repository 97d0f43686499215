use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use parking_admin::{
    action_interface::{create_action_router, ActionInterface},
    core::Record,
    crud_framework::{
        ActionToggles, CrudMode, CrudOperation, DeleteState, EditState, PermissionGate, PermissionSet,
        StaticRoleChecker,
    },
    forms::{validator::ZERO_NOT_ALLOWED, GeoPoint, LocationValue},
    infrastructure::{ActionRequest, ActionResponse, ActionTransport, RouterTransport},
    screens::{penalty_screen, ticket_screen, ScreenRegistry},
    services::model_rules::VIOLATION_TYPES,
    AppError, AppResult, CrudOrchestrator,
};

/// Router transport that counts every action it forwards
struct CountingTransport {
    inner: RouterTransport,
    calls: AtomicUsize,
}

impl CountingTransport {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActionTransport for CountingTransport {
    async fn execute(&self, request: ActionRequest) -> AppResult<ActionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(request).await
    }
}

struct Console {
    interface: ActionInterface,
    transport: Arc<CountingTransport>,
    screens: ScreenRegistry,
}

impl Console {
    async fn start() -> Self {
        let interface = ActionInterface::with_console_models(20).await;
        for (code, name, amount) in [("MTR", "Expired meter", 40), ("HYD", "Fire hydrant", 150)] {
            let response = interface
                .dispatch(
                    ActionRequest::new(VIOLATION_TYPES, "create")
                        .param("code", code)
                        .param("name", name)
                        .param("amount", amount),
                )
                .await;
            assert_eq!(response.code, "2000");
        }

        let transport = Arc::new(CountingTransport {
            inner: RouterTransport::new(create_action_router(interface.clone())),
            calls: AtomicUsize::new(0),
        });
        let violation_types = interface.store().all(VIOLATION_TYPES).await;
        let screens = ScreenRegistry::build(&violation_types).unwrap();

        Self {
            interface,
            transport,
            screens,
        }
    }

    fn orchestrator(&self, screen: &str, roles: &[&str]) -> CrudOrchestrator {
        self.screens.get(screen).unwrap().orchestrator(
            self.transport.clone(),
            Arc::new(StaticRoleChecker::new(roles.iter().copied())),
        )
    }

    async fn add_tickets(&self, subjects: &[&str]) {
        for subject in subjects {
            let response = self
                .interface
                .dispatch(
                    ActionRequest::new(ticket_screen::MODEL, "create")
                        .param("subject", *subject)
                        .param("description", "Filed at the kiosk")
                        .param("created_at", 1_760_000_000_000i64),
                )
                .await;
            assert_eq!(response.code, "2000");
        }
    }
}

fn subjects(rows: &[Record]) -> Vec<String> {
    rows.iter()
        .map(|row| row["subject"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_penalty_add_defaults_and_blocked_submit() {
    let console = Console::start().await;
    let penalties = console.orchestrator(penalty_screen::MODEL, &["officer"]);

    let mut screen = penalties.mount(CrudMode::Add).await.unwrap();
    let add = screen.as_add().unwrap();
    assert_eq!(add.form().value("amount"), Some(&json!(0)));
    assert_eq!(add.form().value("paid"), Some(&json!(false)));
    assert_eq!(add.form().value("plate_number"), Some(&json!("")));

    add.on_change("plate_number", json!("   ")).unwrap();
    let before = console.transport.calls();
    match add.submit().await {
        Err(AppError::FieldErrors(errors)) => {
            assert_eq!(errors["plate_number"], "Plate Number is required");
            assert_eq!(errors["amount"], ZERO_NOT_ALLOWED);
            assert!(errors.contains_key("violation_type_id"));
        }
        other => panic!("expected field errors, got {:?}", other),
    }
    assert_eq!(console.transport.calls(), before);
    assert!(add.notice().is_none());
}

#[tokio::test]
async fn test_penalty_lifecycle_through_router() {
    let console = Console::start().await;
    let penalties = console.orchestrator(penalty_screen::MODEL, &["admin"]);

    // Create
    let mut screen = penalties.mount(CrudMode::Add).await.unwrap();
    let add = screen.as_add().unwrap();
    add.on_change("plate_number", json!("KLM-4411")).unwrap();
    add.on_change(penalty_screen::VIOLATION_FIELD, json!(2)).unwrap();
    assert_eq!(add.form().value("amount"), Some(&json!(150)));
    add.on_change("issued_on", json!("2026-10-16T08:30:00Z")).unwrap();
    add.form_mut()
        .set_location("location", LocationValue::Point { point: GeoPoint::new(51.5, -0.12) })
        .unwrap();

    let created = add.submit().await.unwrap();
    let id = created["id"].clone();
    assert_eq!(created["violation"]["name"], "Fire hydrant");
    assert_eq!(created["issued_on"], "2026-10-16");
    assert_eq!(created["issued_by"], "console");
    assert_eq!(created["status"], "unpaid");
    assert!(created["location"].is_string());

    // Edit restores the nested location and marks the penalty paid
    let mut screen = penalties.mount(CrudMode::Edit { record_id: id.clone() }).await.unwrap();
    let edit = screen.as_edit().unwrap();
    let form = edit.form_screen_mut().unwrap();
    assert_eq!(form.form().value("plate_number"), Some(&json!("KLM-4411")));
    let location = LocationValue::from_value(form.form().value("location").unwrap()).unwrap();
    assert_eq!(location, LocationValue::Point { point: GeoPoint::new(51.5, -0.12) });
    form.on_change("paid", json!(true)).unwrap();

    let updated = edit.submit().await.unwrap();
    assert_eq!(updated["id"], id);
    assert_eq!(updated["status"], "paid");

    // Paid penalties cannot be deleted
    let mut screen = penalties.mount(CrudMode::List).await.unwrap();
    let list = screen.as_list().unwrap();
    let row = list.rows().into_iter().find(|row| row["id"] == id).unwrap();
    list.request_delete(&row).unwrap();
    let refused = list.confirm_delete().await;
    assert!(matches!(refused, Err(AppError::ActionFailed { ref code, .. }) if code == "4090"));
    assert_eq!(list.delete_state(), &DeleteState::Idle);
    assert_eq!(list.notice(), Some("Paid penalties cannot be deleted"));
    assert_eq!(list.controller().refresh_count(), 0);
}

#[tokio::test]
async fn test_edit_of_missing_penalty_fails_softly() {
    let console = Console::start().await;
    let penalties = console.orchestrator(penalty_screen::MODEL, &["admin"]);

    let mut screen = penalties.mount(CrudMode::Edit { record_id: json!(999) }).await.unwrap();
    let edit = screen.as_edit().unwrap();
    assert!(matches!(edit.state(), EditState::Failed(_)));
    assert_eq!(edit.error(), Some("Penalty no longer exists"));
    assert!(edit.submit().await.is_err());
}

#[tokio::test]
async fn test_ticket_pages_append_until_exhausted() {
    let console = Console::start().await;
    console
        .add_tickets(&["Meter ate my coins", "Wrong plate", "Appeal please", "Refund request", "Payment plan"])
        .await;

    let mut definition = console.screens.get(ticket_screen::MODEL).unwrap().clone();
    definition.config.list.page_size = 2;
    let tickets = definition.orchestrator(
        console.transport.clone(),
        Arc::new(StaticRoleChecker::new(["support"])),
    );

    let mut screen = tickets.mount(CrudMode::List).await.unwrap();
    let list = screen.as_list().unwrap();
    assert_eq!(subjects(&list.rows()), vec!["Meter ate my coins", "Wrong plate"]);
    assert!(list.toolbar().load_more);
    assert_eq!(list.rows()[0]["opened"], "2025-10-09");

    list.load_more().await;
    assert_eq!(list.rows().len(), 4);

    while list.toolbar().load_more {
        list.load_more().await;
    }
    assert_eq!(
        subjects(&list.rows()),
        vec!["Meter ate my coins", "Wrong plate", "Appeal please", "Refund request", "Payment plan"]
    );
    assert!(list.controller().is_exhausted());

    // Status is searchable and every ticket starts as "new"
    assert_eq!(list.search("new").len(), 5);
    assert_eq!(list.search("plate").len(), 1);
    assert_eq!(list.search("!!!").len(), 5);
    assert_eq!(list.search("zzz").len(), 0);

    // support may edit but not delete
    let row = list.rows()[0].clone();
    assert!(list.row_actions(&row).edit);
    assert!(!list.row_actions(&row).delete);
    assert!(matches!(list.request_delete(&row), Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn test_ticket_delete_confirms_then_reloads() {
    let console = Console::start().await;
    console.add_tickets(&["First ticket", "Second ticket", "Third ticket"]).await;
    let tickets = console.orchestrator(ticket_screen::MODEL, &["admin"]);

    let mut screen = tickets.mount(CrudMode::List).await.unwrap();
    let list = screen.as_list().unwrap();
    let target = list.rows()[1].clone();

    let before = console.transport.calls();
    list.request_delete(&target).unwrap();
    assert!(list.cancel_delete());
    assert_eq!(list.delete_state(), &DeleteState::Idle);
    list.request_delete(&target).unwrap();
    assert!(matches!(list.request_delete(&target), Err(AppError::Busy(_))));
    assert_eq!(console.transport.calls(), before);

    list.confirm_delete().await.unwrap();
    assert_eq!(list.controller().refresh_count(), 1);
    assert_eq!(subjects(&list.rows()), vec!["First ticket", "Third ticket"]);

    // Deleting the same record again reports the configured message
    list.request_delete(&target).unwrap();
    assert!(list.confirm_delete().await.is_err());
    assert_eq!(list.notice(), Some("Ticket was already removed"));
}

#[tokio::test]
async fn test_ticket_add_rules_run_before_the_backend() {
    let console = Console::start().await;
    let tickets = console.orchestrator(ticket_screen::MODEL, &[]);

    let mut screen = tickets.mount(CrudMode::Add).await.unwrap();
    let add = screen.as_add().unwrap();
    assert_eq!(add.form().value("penalty_id"), Some(&json!(0)));

    let short = add.on_change("subject", json!("Hey")).unwrap();
    assert_eq!(short.error(), Some("Subject must be at least 5 characters"));
    add.on_change("description", json!("Kiosk screen is cracked")).unwrap();

    let before = console.transport.calls();
    assert!(matches!(add.submit().await, Err(AppError::FieldErrors(_))));
    assert_eq!(console.transport.calls(), before);

    assert!(add.on_change("subject", json!("Hello")).unwrap().is_valid());
    let created = add.submit().await.unwrap();
    assert_eq!(created["status"], "new");
    assert_eq!(created["priority"], "normal");
    assert_eq!(console.interface.store().count(ticket_screen::MODEL).await, 1);
}

#[tokio::test]
async fn test_role_gates_through_the_orchestrator() {
    let console = Console::start().await;

    // Penalty edit needs admin
    let officer = console.orchestrator(penalty_screen::MODEL, &["officer"]);
    let refused = officer.mount(CrudMode::Edit { record_id: json!(1) }).await;
    assert!(matches!(refused, Err(AppError::Forbidden(_))));

    // No roles configured means the operation is open to everyone
    let gate = PermissionGate::new(
        Arc::new(StaticRoleChecker::new(Vec::<String>::new())),
        PermissionSet::new(),
        ActionToggles::default(),
    );
    assert!(gate.resolve(CrudOperation::Edit).await);

    let disabled = PermissionGate::new(
        Arc::new(StaticRoleChecker::new(["admin"])),
        PermissionSet::new(),
        ActionToggles::default().disable(CrudOperation::Edit),
    );
    assert!(!disabled.resolve(CrudOperation::Edit).await);

    let granted: BTreeSet<String> = ["admin".to_string()].into_iter().collect();
    assert_eq!(StaticRoleChecker::new(["admin"]).granted(), &granted);
}

#[tokio::test]
async fn test_unknown_action_is_reported_by_code() {
    let console = Console::start().await;
    let response = console
        .transport
        .execute(ActionRequest::new(ticket_screen::MODEL, "archive"))
        .await
        .unwrap();
    assert_eq!(response.code, "4040");
    assert_eq!(response.error.as_deref(), Some("UNKNOWN_ACTION"));
    assert_eq!(response.data, None::<Value>);
}
