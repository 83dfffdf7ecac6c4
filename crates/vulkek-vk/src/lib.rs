// SPDX-License-Identifier: CEPL-1.0
//! Vulkan bootstrap: instance, surface, adapter, device, presentation chain,
//! triangle pipeline and per-image frame resources, brought up in order and
//! released in reverse.
#![deny(unsafe_op_in_unsafe_fn)]

mod ash_gpu;
pub mod config;
mod device;
mod error;
mod frame;
pub mod gpu;
mod instance;
mod lifecycle;
mod pipeline;
pub mod probe;
pub mod queues;
pub mod surface_config;
mod swapchain;

#[cfg(test)]
mod fake;

pub use ash;
pub use ash_gpu::AshGpu;
pub use config::{BootstrapConfig, ShaderPaths, ValidationConfig};
pub use device::DeviceQueues;
pub use error::BootstrapError;
pub use frame::CommandContext;
pub use gpu::{Gpu, Resource, ResourceStack};
pub use lifecycle::{LifecycleCoordinator, LifecycleState, RenderTargets};
pub use pipeline::GraphicsPipeline;
pub use surface_config::ChosenConfig;
pub use swapchain::PresentationChain;

/// Bootstrap over the system loader.
pub type VkRenderer = LifecycleCoordinator<AshGpu>;

/// Drawable size of the target window in physical pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderSize {
    pub width: u32,
    pub height: u32,
}
