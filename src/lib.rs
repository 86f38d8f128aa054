pub mod admin;
pub mod calendar;
pub mod db;
pub mod errors;
pub mod ipc;
pub mod models;
pub mod preferences;
pub mod repository;
pub mod seed;
pub mod selection;
pub mod settings;
mod settings_commands;
mod utils;
pub mod viewport;

#[cfg(test)]
mod test_support;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use calendar::{CalendarController, CalendarOptions};
use db::Database;
use log::{info, warn};
use models::TeacherId;
use preferences::PreferenceSubmitter;
use repository::{CredentialStore, PreferenceApi, SessionRepository, StaticCredentials};
use settings::SettingsStore;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Process configuration taken from the environment.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub data_dir: PathBuf,
    pub teacher_override: Option<TeacherId>,
    pub seed_demo: bool,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let data_dir = std::env::var_os("VIGIL_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("vigil-data"));

        let teacher_override = std::env::var("VIGIL_TEACHER_ID").ok().and_then(|raw| {
            raw.trim()
                .parse::<TeacherId>()
                .map_err(|err| warn!("Ignoring VIGIL_TEACHER_ID '{raw}': {err}"))
                .ok()
        });

        let seed_demo = std::env::var("VIGIL_SEED_DEMO")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            data_dir,
            teacher_override,
            seed_demo,
        }
    }
}

pub struct AppState {
    pub db: Database,
    pub settings: Arc<SettingsStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub calendar: CalendarController,
}

impl AppState {
    /// Wires the calendar to the SQLite collaborators using the stored settings.
    pub fn new(
        db: Database,
        settings: Arc<SettingsStore>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let calendar_settings = settings.calendar();
        let submission = settings.submission();

        let repository: Arc<dyn SessionRepository> = Arc::new(db.clone());
        let api: Arc<dyn PreferenceApi> = Arc::new(db.clone());
        let submitter =
            PreferenceSubmitter::new(api, submission.priority_policy, submission.priority_cap);

        let calendar = CalendarController::new(
            repository,
            submitter,
            CalendarOptions {
                view: calendar_settings.default_view,
                week_start: calendar_settings.week_start,
                ..CalendarOptions::default()
            },
        );

        Self {
            db,
            settings,
            credentials,
            calendar,
        }
    }

    pub async fn open(config: &RuntimeConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("failed to create data directory {}", config.data_dir.display())
        })?;

        let database = Database::new(config.data_dir.join("vigil.sqlite3"))?;
        if config.seed_demo && seed::seed_if_empty(&database).await? {
            info!("Loaded demo dataset into empty database");
        }

        let settings = Arc::new(SettingsStore::new(config.data_dir.join("settings.json"))?);
        let credentials: Arc<dyn CredentialStore> = match config.teacher_override {
            Some(teacher_id) => Arc::new(StaticCredentials::for_teacher(teacher_id)),
            None => settings.clone(),
        };

        let state = Self::new(database, settings, credentials);
        if let Err(err) = state.calendar.refresh().await {
            warn!("Initial calendar load failed: {err}");
        }
        Ok(state)
    }
}

/// Answers JSON-lines requests from `reader` until it is exhausted.
pub async fn serve<R, W>(state: &AppState, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await.context("failed to read request")? {
        let Some(response) = ipc::handle_line(state, &line).await else {
            continue;
        };
        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
        writer.flush().await?;
    }
    Ok(())
}

pub fn run() {
    // Initialize logging (reads RUST_LOG env var). Logs go to stderr; stdout carries responses.
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Vigil starting up...");

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")
        .and_then(|runtime| {
            runtime.block_on(async {
                let config = RuntimeConfig::from_env();
                let state = AppState::open(&config).await?;
                serve(&state, tokio::io::stdin(), tokio::io::stdout()).await
            })
        });

    if let Err(err) = result {
        log::error!("Vigil stopped: {err:#}");
        std::process::exit(1);
    }

    info!("Vigil shutting down");
}
