// Walks the penalties screen end to end against the in-process backend

use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use parking_admin::{
    app_state::AppState,
    config::Config,
    crud_framework::CrudMode,
    forms::{GeoPoint, LocationValue},
    infrastructure::UploadSource,
    screens::penalty_screen,
    AppError,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let state = AppState::new(Config::from_env()?).await?;
    let penalties = state.orchestrator(penalty_screen::MODEL)?;

    // List
    let mut screen = penalties.mount(CrudMode::List).await?;
    let list = screen
        .as_list()
        .ok_or_else(|| anyhow::anyhow!("list mode did not mount a list"))?;
    println!("{}", list.headers().join(" | "));
    for row in list.cells().iter().take(5) {
        println!("{}", row.join(" | "));
    }
    list.load_more().await;
    println!("{} penalties loaded, toolbar {:?}", list.controller().row_count(), list.toolbar());
    println!("{} match \"paid\"", list.search("paid").len());
    list.search("");

    let csv = list.export()?.to_csv();
    println!("Export has {} line(s)", csv.lines().count());

    // Add
    let mut screen = penalties.mount(CrudMode::Add).await?;
    let add = screen
        .as_add()
        .ok_or_else(|| anyhow::anyhow!("add mode did not mount a form"))?;
    add.on_change("plate_number", json!("KLM-4411"))?;
    add.on_change(penalty_screen::VIOLATION_FIELD, json!(2))?;
    add.on_change("issued_on", json!("2026-10-16"))?;
    add.form_mut().set_location(
        "location",
        LocationValue::Point {
            point: GeoPoint { lat: 51.501, lng: -0.141 },
        },
    )?;
    println!("Amount after picking the violation: {}", add.form().value("amount").cloned().unwrap_or_default());

    let photo = UploadSource::new("evidence.jpg", "image/jpeg", vec![0xFF; 3 * 1024 * 1024 + 17], 1_760_000_000_000);
    let uploader = state.uploader();
    let reference = add.form_mut().attach_file("evidence", &uploader, &photo).await?;
    println!("Uploaded evidence as {}", reference.url);

    let created = add.submit().await?;
    let new_id = created["id"].clone();
    println!("Created penalty {}", new_id);

    // Edit
    let mut screen = penalties.mount(CrudMode::Edit { record_id: new_id.clone() }).await?;
    let edit = screen
        .as_edit()
        .ok_or_else(|| anyhow::anyhow!("edit mode did not mount an edit screen"))?;
    if let Some(form) = edit.form_screen_mut() {
        form.on_change("paid", json!(true))?;
    }
    let updated = edit.submit().await?;
    println!("Penalty {} is now {}", new_id, updated["status"]);

    // Delete is refused for paid penalties
    let mut screen = penalties.mount(CrudMode::List).await?;
    let list = screen
        .as_list()
        .ok_or_else(|| anyhow::anyhow!("list mode did not mount a list"))?;
    while list.toolbar().load_more {
        list.load_more().await;
    }
    let target = list
        .rows()
        .into_iter()
        .find(|row| row.get("id") == Some(&new_id))
        .ok_or_else(|| anyhow::anyhow!("created penalty is not listed"))?;
    list.request_delete(&target)?;
    match list.confirm_delete().await {
        Ok(()) => info!("Deleted penalty {}", new_id),
        Err(AppError::ActionFailed { message, .. }) => warn!("Delete refused: {}", message),
        Err(other) => return Err(other.into()),
    }

    Ok(())
}
