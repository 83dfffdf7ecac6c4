// SPDX-License-Identifier: CEPL-1.0
pub use winit;

use anyhow::{Context, Result};
use tracing::info;
use winit::{dpi::PhysicalSize, event_loop::ActiveEventLoop, window::Window};

#[derive(Clone, Debug)]
pub struct WindowSpec {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowSpec {
    fn default() -> Self {
        WindowSpec {
            width: 800,
            height: 600,
            title: "Vulkan window".to_owned(),
        }
    }
}

/// Opens the single presentation window. Resizing is disabled since the
/// swapchain is built once.
pub fn create_window(event_loop: &ActiveEventLoop, spec: &WindowSpec) -> Result<Window> {
    let attrs = Window::default_attributes()
        .with_title(spec.title.clone())
        .with_inner_size(PhysicalSize::new(spec.width, spec.height))
        .with_resizable(false);
    let window = event_loop.create_window(attrs).context("create_window")?;
    info!(
        "window \"{}\" open ({}x{})",
        spec.title, spec.width, spec.height
    );
    Ok(window)
}

/// Current drawable size in physical pixels, never zero on either axis.
pub fn drawable_size(window: &Window) -> (u32, u32) {
    let size = window.inner_size();
    (size.width.max(1), size.height.max(1))
}
