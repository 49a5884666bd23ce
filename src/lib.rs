//! ClipSnap — Tauri application entry point.
//!
//! This is the app shell that wires together:
//! - Global hotkeys (hotkey/) dispatched onto the main thread
//! - The capture coordinator (coordinator.rs) behind a single lock
//! - Overlay pointer commands called from `ui/overlay.html`
//! - System tray (tray.rs)

pub mod capture;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod hotkey;
pub mod output;
pub mod session;
mod tray;

use std::sync::{Mutex, MutexGuard};

use tauri::{AppHandle, Manager, RunEvent, WindowEvent, Wry};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};

use capture::XcapScreen;
use coordinator::{CaptureCoordinator, CaptureOutcome};
use error::AppError;
use hotkey::shortcut::{self, ShortcutBackend, ShortcutTable};
use output::SystemClipboard;
use session::overlay::OVERLAY_LABEL_PREFIX;
use session::{LogicalPoint, SelectionView, WindowOverlays};

type AppCoordinator =
    CaptureCoordinator<ShortcutBackend<Wry>, XcapScreen, WindowOverlays<Wry>, SystemClipboard>;

/// Managed state: the one coordinator, behind one lock.
pub struct CaptureState {
    coordinator: Mutex<AppCoordinator>,
}

impl CaptureState {
    fn lock(&self) -> Result<MutexGuard<'_, AppCoordinator>, AppError> {
        self.coordinator
            .lock()
            .map_err(|_| AppError::Window("capture state lock poisoned".into()))
    }
}

/// Show an error box without blocking the caller.
pub(crate) fn report_error(app: &AppHandle, err: &AppError) {
    log::error!("{}", err);
    app.dialog()
        .message(err.to_string())
        .kind(MessageDialogKind::Error)
        .title("ClipSnap")
        .show(|_| {});
}

pub(crate) fn report_warning(app: &AppHandle, text: &str) {
    log::warn!("{}", text);
    app.dialog()
        .message(text)
        .kind(MessageDialogKind::Warning)
        .title("ClipSnap")
        .show(|_| {});
}

fn report_outcome(app: &AppHandle, outcome: CaptureOutcome) {
    match &outcome {
        CaptureOutcome::Delivered(delivery) => {
            if let Ok(path) = &delivery.saved {
                log::info!("[OUTPUT] Screenshot ready at {}", path.display());
            }
        }
        CaptureOutcome::TooSmall => log::info!("[SESSION] Selection too small, nothing saved"),
        CaptureOutcome::Cancelled => log::info!("[SESSION] Selection cancelled"),
        CaptureOutcome::Failed(_) => {}
    }
    for err in outcome.into_errors() {
        report_error(app, &err);
    }
}

/// Start a capture from any thread: hotkey handler, tray, or command.
///
/// Window creation and session state live on the main thread, so the work
/// is queued there. A trigger during an open selection is logged and dropped.
pub(crate) fn trigger_capture(app: &AppHandle) {
    let handle = app.clone();
    let queued = app.run_on_main_thread(move || {
        let state = handle.state::<CaptureState>();
        let result = state.lock().and_then(|mut c| c.take_screenshot());
        match result {
            Ok(()) | Err(AppError::SessionBusy) => {}
            Err(e) => report_error(&handle, &e),
        }
    });
    if let Err(e) = queued {
        report_error(app, &AppError::from(e));
    }
}

/// Re-read settings and re-register hotkeys. Conflicts are reported one by one.
pub(crate) fn reload_settings(app: &AppHandle) -> Result<(), AppError> {
    let config = config::load();
    config.ensure_save_folder();

    let failures = app.state::<CaptureState>().lock()?.apply_config(config);
    for (id, err) in failures {
        log::warn!("[HOTKEY] Slot {} not registered: {}", id, err);
        report_error(app, &AppError::from(err));
    }
    Ok(())
}

fn shutdown(app: &AppHandle) {
    if let Some(state) = app.try_state::<CaptureState>() {
        match state.lock() {
            Ok(mut coordinator) => coordinator.shutdown(),
            Err(e) => log::error!("{}", e),
        }
    }
}

/// Tauri command: open the selection overlay.
///
/// Returns once the capture is queued; problems surface as dialogs.
#[tauri::command]
async fn take_screenshot(app: AppHandle) -> Result<(), AppError> {
    trigger_capture(&app);
    Ok(())
}

/// Tauri command: re-read `settings.json`.
///
/// Sync on purpose: it runs on the main thread like the tray entry, since the
/// shortcut plugin's register/unregister wait on that thread while the
/// coordinator lock is held.
#[tauri::command]
fn reload_config(app: AppHandle) -> Result<(), AppError> {
    reload_settings(&app)
}

/// Tauri command: first press inside the overlay.
#[tauri::command]
fn selection_pointer_down(
    state: tauri::State<'_, CaptureState>,
    x: f64,
    y: f64,
) -> Result<Option<SelectionView>, AppError> {
    Ok(state.lock()?.pointer_down(LogicalPoint::new(x, y)))
}

/// Tauri command: pointer moved while dragging. No I/O on this path.
#[tauri::command]
fn selection_pointer_move(
    state: tauri::State<'_, CaptureState>,
    x: f64,
    y: f64,
) -> Result<Option<SelectionView>, AppError> {
    Ok(state.lock()?.pointer_move(LogicalPoint::new(x, y)))
}

/// Tauri command: release ends the selection and delivers the crop.
#[tauri::command]
fn selection_pointer_up(
    app: AppHandle,
    state: tauri::State<'_, CaptureState>,
    x: f64,
    y: f64,
) -> Result<(), AppError> {
    let outcome = state.lock()?.pointer_up(LogicalPoint::new(x, y));
    if let Some(outcome) = outcome {
        report_outcome(&app, outcome);
    }
    Ok(())
}

/// Tauri command: Escape in the overlay.
#[tauri::command]
fn selection_cancel(app: AppHandle, state: tauri::State<'_, CaptureState>) -> Result<(), AppError> {
    let outcome = state.lock()?.cancel();
    if let Some(outcome) = outcome {
        report_outcome(&app, outcome);
    }
    Ok(())
}

/// Entry point — called by Tauri runtime.
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let table = ShortcutTable::default();
    let hotkey_table = table.clone();

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .plugin(tauri_plugin_dialog::init())
        .plugin(
            tauri_plugin_global_shortcut::Builder::new()
                .with_handler(shortcut::dispatcher(table, |app: &AppHandle, _fired| {
                    trigger_capture(app)
                }))
                .build(),
        )
        .invoke_handler(tauri::generate_handler![
            take_screenshot,
            reload_config,
            selection_pointer_down,
            selection_pointer_move,
            selection_pointer_up,
            selection_cancel
        ])
        .setup(move |app| {
            log::info!("ClipSnap starting up");

            let config = config::load();
            config.ensure_save_folder();

            let handle = app.handle().clone();
            let mut coordinator = CaptureCoordinator::new(
                ShortcutBackend::new(handle.clone(), hotkey_table),
                XcapScreen,
                WindowOverlays::new(handle.clone()),
                SystemClipboard,
                config.clone(),
            );
            let failures = coordinator.apply_config(config);

            app.manage(CaptureState {
                coordinator: Mutex::new(coordinator),
            });
            for (id, err) in failures {
                log::warn!("[HOTKEY] Slot {} not registered: {}", id, err);
                report_error(&handle, &AppError::from(err));
            }

            tray::setup_tray(&handle)?;

            log::info!("System tray initialized — ready for captures");
            Ok(())
        })
        .on_window_event(|window, event| {
            if !matches!(event, WindowEvent::Destroyed) {
                return;
            }
            let label = window.label();
            if !label.starts_with(OVERLAY_LABEL_PREFIX) {
                return;
            }
            // The session destroys its own overlay while holding the lock;
            // only an external close gets through here.
            let Some(state) = window.try_state::<CaptureState>() else {
                return;
            };
            let Ok(mut coordinator) = state.coordinator.try_lock() else {
                return;
            };
            coordinator.overlay_dismissed(label);
        })
        .build(tauri::generate_context!())
        .expect("Error building ClipSnap");

    app.run(|app, event| match event {
        RunEvent::ExitRequested { code: None, api, .. } => {
            // Closing the last overlay must not end a tray app.
            api.prevent_exit();
        }
        RunEvent::Exit => {
            log::info!("ClipSnap exiting, releasing hotkeys");
            shutdown(app);
        }
        _ => {}
    });
}
