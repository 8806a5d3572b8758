//! Administrative scripts for Shiftbook.
//!
//! Usage:
//!   admin reset                    - Clear all data in the shared table, keep users
//!   admin secure-reset [password]  - Reset the admin password (default 2026) and
//!                                    log every device out
//!   admin export-day <YYYY-MM-DD>  - Write the day sheet from the local store
//!   admin export-month <YYYY-MM>   - Write the fiscal month sheet from the local store

use anyhow::{Context, bail};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shiftbook_core::export::{ExportSink, JsonExportSink, day_document, month_document};
use shiftbook_core::fiscal::{FiscalMonth, local_now, parse_date};
use shiftbook_core::state::AppState;
use shiftbook_core::storage::{StorageService, StoreProvider};
use shiftbook_db::{SystemDataRepository, connect};
use shiftbook_shared::{AppConfig, AppError, AppResult};

const DEFAULT_ADMIN_PASSWORD: &str = "2026";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shiftbook=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("reset") => {
            let repo = repository(&config).await?;
            let count = repo.reset_data().await?;
            info!(keys = count, "shared data cleared, users kept");
        }
        Some("secure-reset") => {
            let password = args.get(1).map_or(DEFAULT_ADMIN_PASSWORD, String::as_str);
            let repo = repository(&config).await?;
            let signal = chrono::Utc::now().timestamp_millis();
            if !repo.secure_reset(password, signal).await? {
                return Err(surface(AppError::NotFound(
                    "no admin user in the shared table".to_string(),
                )));
            }
            info!("admin password reset, all sessions terminated");
        }
        Some("export-day") => {
            let raw = args.get(1).context("missing date")?;
            let (storage, state) = local_state(&config).await?;
            let path = export_day(&storage, &state, raw).await.map_err(surface)?;
            info!(%path, "day exported");
        }
        Some("export-month") => {
            let raw = args.get(1).context("missing month")?;
            let (storage, state) = local_state(&config).await?;
            let path = export_month(&storage, &state, raw).await.map_err(surface)?;
            info!(%path, "month exported");
        }
        _ => bail!("usage: admin <reset | secure-reset [password] | export-day DATE | export-month MONTH>"),
    }
    Ok(())
}

async fn repository(config: &AppConfig) -> anyhow::Result<SystemDataRepository> {
    let database = config
        .database
        .as_ref()
        .context("no database configured")?;
    Ok(SystemDataRepository::new(connect(database).await?))
}

/// Logs an application error under its stable code.
///
/// Rejections are the operator's mistake and log as warnings.
fn surface(err: AppError) -> anyhow::Error {
    if err.is_rejection() {
        warn!(code = err.error_code(), "{err}");
    } else {
        error!(code = err.error_code(), "{err}");
    }
    err.into()
}

/// Writes the day sheet and returns its path.
async fn export_day(storage: &StorageService, state: &AppState, raw: &str) -> AppResult<String> {
    let date = parse_date(raw)?;
    let document = day_document(&state.entries, date)?;
    JsonExportSink::new(storage.operator()).deliver(&document).await?;
    Ok(JsonExportSink::path_for(&document))
}

/// Writes the fiscal month sheet and returns its path.
async fn export_month(storage: &StorageService, state: &AppState, raw: &str) -> AppResult<String> {
    let month: FiscalMonth = raw.parse()?;
    let document = month_document(month, &state.daily, &state.entries, &state.orders);
    JsonExportSink::new(storage.operator()).deliver(&document).await?;
    Ok(JsonExportSink::path_for(&document))
}

async fn local_state(config: &AppConfig) -> anyhow::Result<(StorageService, AppState)> {
    let storage = StorageService::from_provider(StoreProvider::from(&config.store))?;
    let today = local_now(config.fiscal.tz()?).date_naive();
    let state = AppState::load(&storage, today).await;
    Ok((storage, state))
}
