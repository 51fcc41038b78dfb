//! Keyweave entry point.
//!
//! Loads the configuration, wires the pipeline to the Windows adapters and
//! the native engine, and runs until Ctrl-C.
//!
//! ```text
//! main()
//!  └─ load config, init logging
//!  └─ run()
//!       ├─ ImeController::apply_all   -- engine flags, shortcuts, hotkey
//!       ├─ Pipeline::start            -- worker thread, then WH_KEYBOARD_LL
//!       ├─ notice pump                -- hotkey toggles (blocking task)
//!       └─ ctrl_c → Pipeline::shutdown
//! ```

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use keyweave_host::application::settings::ConfigStore;
use keyweave_host::infrastructure::storage::config::{AppConfig, FileConfigStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let store = FileConfigStore::at_platform_path().context("locating configuration file")?;
    let mut config = store
        .load()
        .with_context(|| format!("loading configuration from {}", store.path().display()))?;

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.general.log_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(config = %store.path().display(), "Keyweave starting");

    if config.apply_first_run_defaults() {
        if let Err(e) = store.save(&config) {
            warn!(error = %e, "could not write first-run configuration");
        }
    }

    run(config, store).await?;

    info!("Keyweave stopped");
    Ok(())
}

#[cfg(target_os = "windows")]
async fn run(config: AppConfig, store: FileConfigStore) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use crossbeam_channel::RecvTimeoutError;
    use keyweave_core::SharedEngine;
    use keyweave_host::application::classify_app::AppClassifier;
    use keyweave_host::application::inject_text::{Injector, ThreadPacer};
    use keyweave_host::application::pipeline::{Pipeline, PipelineConfig};
    use keyweave_host::application::process_keys::ProcessKeysUseCase;
    use keyweave_host::application::settings::ImeController;
    use keyweave_host::infrastructure::clipboard::ArboardClipboard;
    use keyweave_host::infrastructure::engine::NativeEngine;
    use keyweave_host::infrastructure::foreground::windows::WindowsForeground;
    use keyweave_host::infrastructure::input_capture::windows::WindowsKeyboardHook;
    use keyweave_host::infrastructure::input_emulation::windows::SendInputSynthesizer;

    let engine = SharedEngine::new(NativeEngine::new());

    let classifier = AppClassifier::new(WindowsForeground::new(), config.injection.rules());
    let mut injector = Injector::new(
        Arc::new(SendInputSynthesizer::new()),
        Arc::new(ThreadPacer),
        config.injection.timing(),
    );
    if config.injection.uses_clipboard() {
        injector = injector.with_clipboard(Box::new(ArboardClipboard::new()));
    }
    let processor = ProcessKeysUseCase::new(engine.clone(), classifier, injector);

    let mut pipeline = Pipeline::new(
        processor,
        engine.enabled_flag(),
        Box::new(WindowsKeyboardHook::new()),
        PipelineConfig {
            queue_capacity: config.worker.effective_queue_capacity(),
            worker: config.worker.worker_config(),
        },
    );

    let mut controller = ImeController::new(engine, pipeline.filter(), config, Box::new(store));
    controller.apply_all();

    pipeline.start().context("starting keystroke pipeline")?;
    info!("Keyweave ready.  Press Ctrl-C to exit.");

    // ── Hotkey notice pump ────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let notices = pipeline.notices();
    let pump_running = Arc::clone(&running);
    let pump = tokio::task::spawn_blocking(move || {
        while pump_running.load(Ordering::Relaxed) {
            match notices.recv_timeout(Duration::from_millis(100)) {
                Ok(notice) => {
                    if let Err(e) = controller.handle_notice(notice) {
                        warn!(error = %e, "could not persist settings change");
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    });

    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
    info!("shutdown signal received");

    running.store(false, Ordering::Relaxed);
    if let Err(e) = pump.await {
        warn!(error = %e, "notice pump terminated abnormally");
    }
    pipeline.shutdown();
    Ok(())
}

#[cfg(not(target_os = "windows"))]
async fn run(_config: AppConfig, _store: FileConfigStore) -> anyhow::Result<()> {
    use keyweave_host::application::filter_keys::HookError;

    Err(HookError::UnsupportedPlatform).context("keyweave requires the Windows keyboard hook")
}
