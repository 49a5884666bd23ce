//! Build script for ClipSnap.
//!
//! Only the Tauri codegen step is needed: the overlay is plain HTML served
//! from `ui/`, and all native capture/clipboard access goes through crates.

fn main() {
    tauri_build::build();
}
