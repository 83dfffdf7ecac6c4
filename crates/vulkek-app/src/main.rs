// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use vulkek_core::init_tracing;
use vulkek_vk::{AshGpu, BootstrapConfig, RenderSize, VkRenderer};

use vulkek_platform::winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::config::{load_cfg, AppCfg};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file; missing means built-in defaults
    #[arg(long, default_value = "vulkek.toml")]
    config: PathBuf,

    /// Enable or disable the Khronos validation layer
    #[arg(long)]
    validation: Option<bool>,

    /// SPIR-V vertex shader
    #[arg(long)]
    vertex_shader: Option<PathBuf>,

    /// SPIR-V fragment shader
    #[arg(long)]
    fragment_shader: Option<PathBuf>,
}

impl Args {
    fn apply(self, cfg: &mut AppCfg) {
        if let Some(on) = self.validation {
            cfg.validation.enabled = Some(on);
        }
        if let Some(path) = self.vertex_shader {
            cfg.shaders.vertex = Some(path);
        }
        if let Some(path) = self.fragment_shader {
            cfg.shaders.fragment = Some(path);
        }
    }
}

struct App {
    cfg: AppCfg,
    bootstrap: BootstrapConfig,
    // Dropped before the window it presents to.
    renderer: Option<VkRenderer>,
    window: Option<Window>,
    failure: Option<anyhow::Error>,
}

impl App {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = vulkek_platform::create_window(event_loop, &self.cfg.window_spec())?;
        let (width, height) = vulkek_platform::drawable_size(&window);

        let gpu = AshGpu::new(&window).context("window handles")?;
        let mut renderer = VkRenderer::bootstrap(gpu, &self.bootstrap, RenderSize { width, height })
            .context("vulkan bootstrap")?;
        renderer.mark_running()?;

        if let Some(t) = renderer.targets() {
            info!(
                "running on \"{}\": {:?} {:?}, {} images at {}x{}",
                t.adapter_name,
                t.config.format,
                t.config.present_mode,
                t.chain.images.len(),
                t.config.extent.width,
                t.config.extent.height
            );
        }

        self.renderer = Some(renderer);
        self.window = Some(window);
        Ok(())
    }

    fn shut_down(&mut self, event_loop: &ActiveEventLoop) {
        self.renderer = None;
        self.window = None;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.failure.is_some() {
            return;
        }
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Err(e) = self.start(event_loop) {
            error!("startup failed: {e:#}");
            self.failure = Some(e);
            self.shut_down(event_loop);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(window) = &self.window {
            if window_id != window.id() {
                return;
            }
        }

        if let WindowEvent::CloseRequested = event {
            info!("CloseRequested");
            self.shut_down(event_loop);
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut cfg = load_cfg(&args.config);
    args.apply(&mut cfg);
    let bootstrap = cfg.bootstrap();

    let event_loop: EventLoop<()> = EventLoop::new()?;
    let mut app = App {
        cfg,
        bootstrap,
        renderer: None,
        window: None,
        failure: None,
    };
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(e) => Err(e),
        None => {
            info!("clean shutdown");
            Ok(())
        }
    }
}
