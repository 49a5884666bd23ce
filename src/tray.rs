//! System tray setup and menu handler.
//!
//! Left-click takes a screenshot. The menu offers the same action plus
//! opening the save folder, reloading settings, and quitting.

use tauri::{
    image::Image as TauriImage,
    menu::{MenuBuilder, MenuItemBuilder, PredefinedMenuItem},
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
    AppHandle, Manager,
};

use crate::CaptureState;

const TAKE: &str = "take";
const OPEN_FOLDER: &str = "open-folder";
const RELOAD: &str = "reload";
const QUIT: &str = "quit";

/// Sets up the tray icon and its menu.
pub fn setup_tray(app: &AppHandle) -> Result<(), Box<dyn std::error::Error>> {
    let take_item = MenuItemBuilder::with_id(TAKE, "Take Screenshot").build(app)?;
    let folder_item = MenuItemBuilder::with_id(OPEN_FOLDER, "Open Screenshots Folder").build(app)?;
    let reload_item = MenuItemBuilder::with_id(RELOAD, "Reload Settings").build(app)?;
    let quit_item = MenuItemBuilder::with_id(QUIT, "Quit ClipSnap").build(app)?;
    let menu = MenuBuilder::new(app)
        .item(&take_item)
        .item(&folder_item)
        .item(&reload_item)
        .item(&PredefinedMenuItem::separator(app)?)
        .item(&quit_item)
        .build()?;

    // Decode the PNG icon to RGBA for Tauri's Image type
    let icon_bytes = include_bytes!("../icons/32x32.png");
    let icon_img = image::load_from_memory(icon_bytes)
        .map_err(|e| format!("Failed to decode tray icon: {}", e))?;
    let rgba = icon_img.to_rgba8();
    let (w, h) = (rgba.width(), rgba.height());
    let tray_icon = TauriImage::new_owned(rgba.into_raw(), w, h);

    let _tray = TrayIconBuilder::new()
        .icon(tray_icon)
        .tooltip("ClipSnap — Click to capture a region")
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_tray_icon_event(|tray_icon, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                log::info!("[TRAY] Icon clicked, starting capture");
                crate::trigger_capture(tray_icon.app_handle());
            }
        })
        .on_menu_event(|app, event| match event.id().as_ref() {
            TAKE => crate::trigger_capture(app),
            OPEN_FOLDER => open_save_folder(app),
            RELOAD => {
                log::info!("[TRAY] Reloading settings");
                if let Err(e) = crate::reload_settings(app) {
                    crate::report_error(app, &e);
                }
            }
            QUIT => {
                log::info!("[TRAY] Quit requested");
                if let Some(state) = app.try_state::<CaptureState>() {
                    if let Ok(mut coordinator) = state.coordinator.lock() {
                        coordinator.shutdown();
                    }
                }
                app.exit(0);
            }
            other => log::debug!("[TRAY] Unhandled menu item {}", other),
        })
        .build(app)?;

    Ok(())
}

#[allow(deprecated)]
fn open_save_folder(app: &AppHandle) {
    use tauri_plugin_shell::ShellExt;

    let folder = match app.try_state::<CaptureState>() {
        Some(state) => match state.coordinator.lock() {
            Ok(coordinator) => coordinator.config().save_folder_path.clone(),
            Err(_) => return,
        },
        None => return,
    };

    if !folder.is_dir() {
        crate::report_warning(
            app,
            &format!("Screenshot folder does not exist yet: {}", folder.display()),
        );
        return;
    }

    log::info!("[TRAY] Opening {}", folder.display());
    if let Err(e) = app.shell().open(folder.to_string_lossy().to_string(), None) {
        log::error!("[TRAY] Could not open {}: {}", folder.display(), e);
    }
}
