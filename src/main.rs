//! Entitlement provisioner: creates the yearly ledger rows for every active
//! employee and leave type. Run once per year (or after onboarding) with
//! `provision [year]`; defaults to the current year. Idempotent, so re-runs
//! are safe.

use chrono::Datelike;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leavedesk::provision::{provision_year, EntitlementPlan};
use leavedesk::store::LeaveStore;
use leavedesk::{db, PgStore, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with conditional JSON/text output
    let use_json = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()) == "json";

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,leavedesk=debug".into());

    if use_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    dotenvy::dotenv().ok();

    let settings = Settings::from_env().map_err(|e| {
        tracing::error!("Configuration error: {}", e);
        e
    })?;

    let year = match std::env::args().nth(1) {
        Some(raw) => raw.parse::<i32>().map_err(|_| format!("not a year: {raw}"))?,
        None => chrono::Utc::now().date_naive().year(),
    };

    let pool = db::create_pool(&settings.database_url).await.map_err(|e| {
        tracing::error!("Failed to create database pool: {}", e);
        e
    })?;
    let store = PgStore::new(pool);

    let types = store.active_leave_types().await?;
    if types.is_empty() {
        tracing::warn!("no active leave types; nothing to provision");
        return Ok(());
    }
    let plan = EntitlementPlan::from_leave_types(&types);

    tracing::info!(year, buckets = types.len(), "provisioning entitlements");
    let summary = provision_year(&store, year, &plan).await?;
    tracing::info!(
        created = summary.created,
        skipped = summary.skipped,
        "provisioning complete"
    );

    Ok(())
}
