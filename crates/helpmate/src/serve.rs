// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring for `helpmate serve` and `helpmate reconcile`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use helpmate_chat::{ChatPolicy, ChatService, LocalAttachmentStorage, Reconciler, SystemClock};
use helpmate_config::model::{HelpmateConfig, LogConfig};
use helpmate_core::{Clock, HelpmateError, PluginAdapter, StorageAdapter};
use helpmate_gateway::AppState;
use helpmate_notify::SqliteNotificationLedger;
use helpmate_storage::SqliteStorage;

use crate::shutdown::install_signal_handler;

/// Initialized adapters shared by both commands.
struct Backend {
    storage: Arc<SqliteStorage>,
    ledger: Arc<SqliteNotificationLedger>,
    clock: Arc<SystemClock>,
}

async fn open_backend(config: &HelpmateConfig) -> Result<Backend, HelpmateError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let ledger = SqliteNotificationLedger::new(storage.shared_connection()?);
    Ok(Backend {
        storage: Arc::new(storage),
        ledger: Arc::new(ledger),
        clock: Arc::new(SystemClock),
    })
}

pub async fn run_serve(config: HelpmateConfig) -> Result<(), HelpmateError> {
    init_tracing(&config.log);
    info!(version = env!("CARGO_PKG_VERSION"), "starting helpmate serve");

    let backend = open_backend(&config).await?;
    let attachments = Arc::new(LocalAttachmentStorage::new(&config.attachments.root_dir));

    let chat = Arc::new(ChatService::new(
        backend.storage.clone(),
        backend.storage.clone(),
        backend.ledger.clone(),
        attachments.clone(),
        backend.clock.clone(),
        ChatPolicy::from(&config.chat),
    ));

    let cancel = install_signal_handler();

    let reconciler_task = if config.reconcile.enabled {
        let reconciler = Reconciler::new(
            backend.storage.clone(),
            backend.ledger.clone(),
            backend.clock.clone(),
            &config.reconcile,
        );
        let interval = Duration::from_secs(config.reconcile.interval_secs);
        let token = cancel.clone();
        Some(tokio::spawn(async move {
            reconciler.run(interval, token).await;
        }))
    } else {
        info!("notification backfill disabled");
        None
    };

    let adapters = vec![
        backend.storage.clone() as Arc<dyn PluginAdapter>,
        backend.ledger.clone() as Arc<dyn PluginAdapter>,
        attachments as Arc<dyn PluginAdapter>,
    ];
    let state = AppState::new(chat, &config.server, adapters);
    let served = helpmate_gateway::start_server(&config.server, state, cancel.clone()).await;
    if let Err(e) = &served {
        error!(error = %e, "gateway failed");
    }
    cancel.cancel();

    if let Some(task) = reconciler_task {
        if let Err(e) = task.await {
            warn!(error = %e, "reconciler task ended abnormally");
        }
    }

    match backend.storage.close().await {
        Ok(()) => info!("WAL checkpoint complete"),
        Err(e) => warn!(error = %e, "WAL checkpoint failed on shutdown"),
    }
    info!("helpmate stopped");
    served
}

pub async fn run_reconcile(config: HelpmateConfig) -> Result<(), HelpmateError> {
    init_tracing(&config.log);
    let backend = open_backend(&config).await?;
    let reconciler = Reconciler::new(
        backend.storage.clone(),
        backend.ledger.clone(),
        backend.clock.clone(),
        &config.reconcile,
    );
    let report = reconciler.run_once(backend.clock.now()).await?;
    backend.storage.close().await?;

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| HelpmateError::Internal(format!("failed to render report: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Initializes the tracing subscriber from the `[log]` section.
fn init_tracing(log: &LogConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("helpmate={},warn", log.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false);
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
