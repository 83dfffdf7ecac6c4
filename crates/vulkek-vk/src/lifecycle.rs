// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use tracing::{debug, error, info};

use crate::config::BootstrapConfig;
use crate::device::{self, DeviceQueues};
use crate::error::BootstrapError;
use crate::frame::{self, CommandContext};
use crate::gpu::{Gpu, Resource, ResourceStack};
use crate::instance;
use crate::pipeline::{self, GraphicsPipeline};
use crate::probe::{self, REQUIRED_DEVICE_EXTENSIONS};
use crate::queues::QueueFamilies;
use crate::surface_config::{self, ChosenConfig};
use crate::swapchain::{self, PresentationChain};
use crate::RenderSize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    InstanceReady,
    DeviceReady,
    ChainReady,
    PipelineReady,
    FrameResourcesReady,
    Running,
    TornDown,
}

impl LifecycleState {
    fn successor(self) -> Option<LifecycleState> {
        use LifecycleState::*;
        match self {
            Uninitialized => Some(InstanceReady),
            InstanceReady => Some(DeviceReady),
            DeviceReady => Some(ChainReady),
            ChainReady => Some(PipelineReady),
            PipelineReady => Some(FrameResourcesReady),
            FrameResourcesReady => Some(Running),
            Running | TornDown => None,
        }
    }
}

/// Handles produced by a completed bootstrap. They stay valid until the
/// coordinator tears down.
#[derive(Clone, Debug)]
pub struct RenderTargets {
    pub adapter: vk::PhysicalDevice,
    pub adapter_name: String,
    pub families: QueueFamilies,
    pub queues: DeviceQueues,
    pub surface: vk::SurfaceKHR,
    pub config: ChosenConfig,
    pub chain: PresentationChain,
    pub pipeline: GraphicsPipeline,
    pub framebuffers: Vec<vk::Framebuffer>,
    pub commands: CommandContext,
}

/// Owns every resource from instance to command pool. Construction runs
/// strictly top to bottom; any failure, [`LifecycleCoordinator::teardown`]
/// or drop releases whatever exists in exact reverse.
pub struct LifecycleCoordinator<G: Gpu> {
    gpu: G,
    state: LifecycleState,
    owned: ResourceStack,
    targets: Option<RenderTargets>,
}

impl<G: Gpu> LifecycleCoordinator<G> {
    fn new(gpu: G) -> Self {
        LifecycleCoordinator {
            gpu,
            state: LifecycleState::Uninitialized,
            owned: ResourceStack::default(),
            targets: None,
        }
    }

    /// Runs every creation step. On error the partial state is unwound
    /// before the error is returned.
    pub fn bootstrap(
        gpu: G,
        cfg: &BootstrapConfig,
        drawable: RenderSize,
    ) -> Result<Self, BootstrapError> {
        let mut this = Self::new(gpu);
        match unsafe { this.build(cfg, drawable) } {
            Ok(targets) => {
                this.targets = Some(targets);
                Ok(this)
            }
            Err(e) => {
                error!("bootstrap failed after {:?}: {e}", this.state);
                this.teardown();
                Err(e)
            }
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn targets(&self) -> Option<&RenderTargets> {
        self.targets.as_ref()
    }

    /// The event loop has started; no further resources are created.
    pub fn mark_running(&mut self) -> Result<(), BootstrapError> {
        self.advance(LifecycleState::Running)
    }

    pub fn teardown(&mut self) {
        if self.state == LifecycleState::TornDown {
            return;
        }
        self.targets = None;
        unsafe { self.owned.unwind(&mut self.gpu) };
        debug!("{:?} -> {:?}", self.state, LifecycleState::TornDown);
        self.state = LifecycleState::TornDown;
    }

    fn advance(&mut self, next: LifecycleState) -> Result<(), BootstrapError> {
        if self.state.successor() != Some(next) {
            return Err(BootstrapError::OutOfOrder {
                current: self.state,
                attempted: next,
            });
        }
        debug!("{:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }

    unsafe fn build(
        &mut self,
        cfg: &BootstrapConfig,
        drawable: RenderSize,
    ) -> Result<RenderTargets, BootstrapError> {
        // Instance, then the surface from that instance
        unsafe { instance::create_instance(&mut self.gpu, &mut self.owned, cfg) }?;
        let surface = unsafe { self.gpu.create_surface() }
            .map_err(BootstrapError::creation("surface"))?;
        self.owned.push(Resource::Surface(surface));
        self.advance(LifecycleState::InstanceReady)?;

        // Adapter vetted against this surface, then the logical device
        let choice = probe::select_adapter(&self.gpu, surface, REQUIRED_DEVICE_EXTENSIONS)?;
        let queues = unsafe {
            device::create_device(
                &mut self.gpu,
                &mut self.owned,
                choice.adapter,
                choice.families,
                REQUIRED_DEVICE_EXTENSIONS,
            )
        }?;
        self.advance(LifecycleState::DeviceReady)?;

        let config = surface_config::select(&choice.capabilities, drawable);
        let chain = unsafe {
            swapchain::create_presentation_chain(
                &mut self.gpu,
                &mut self.owned,
                surface,
                &config,
                choice.families,
            )
        }?;
        self.advance(LifecycleState::ChainReady)?;

        let pipeline = unsafe {
            pipeline::assemble(
                &mut self.gpu,
                &mut self.owned,
                &cfg.shaders,
                chain.format,
                chain.extent,
            )
        }?;
        self.advance(LifecycleState::PipelineReady)?;

        let framebuffers = unsafe {
            frame::create_framebuffers(
                &mut self.gpu,
                &mut self.owned,
                pipeline.render_pass,
                &chain.image_views,
                chain.extent,
            )
        }?;
        let commands = unsafe {
            frame::create_command_context(&mut self.gpu, &mut self.owned, choice.families.graphics)
        }?;
        self.advance(LifecycleState::FrameResourcesReady)?;

        info!(
            "bootstrap complete: {} owned handles on \"{}\"",
            self.owned.len(),
            choice.name
        );
        Ok(RenderTargets {
            adapter: choice.adapter,
            adapter_name: choice.name,
            families: choice.families,
            queues,
            surface,
            config,
            chain,
            pipeline,
            framebuffers,
            commands,
        })
    }
}

impl<G: Gpu> Drop for LifecycleCoordinator<G> {
    fn drop(&mut self) {
        self.teardown();
    }
}
