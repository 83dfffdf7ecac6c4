// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use tracing::debug;

use crate::error::BootstrapError;
use crate::gpu::{Gpu, Resource, ResourceStack};

/// Command pool on the graphics family plus its single primary buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandContext {
    pub pool: vk::CommandPool,
    pub buffer: vk::CommandBuffer,
}

/// One framebuffer per image view, each bound to just that view.
pub unsafe fn create_framebuffers<G: Gpu + ?Sized>(
    gpu: &mut G,
    owned: &mut ResourceStack,
    render_pass: vk::RenderPass,
    image_views: &[vk::ImageView],
    extent: vk::Extent2D,
) -> Result<Vec<vk::Framebuffer>, BootstrapError> {
    let mut framebuffers = Vec::with_capacity(image_views.len());
    for view in image_views {
        let fb_info = vk::FramebufferCreateInfo {
            s_type: vk::StructureType::FRAMEBUFFER_CREATE_INFO,
            render_pass,
            attachment_count: 1,
            p_attachments: view,
            width: extent.width,
            height: extent.height,
            layers: 1,
            ..Default::default()
        };
        let fb = unsafe { gpu.create_framebuffer(&fb_info) }
            .map_err(BootstrapError::creation("framebuffer"))?;
        owned.push(Resource::Framebuffer(fb));
        framebuffers.push(fb);
    }
    debug!("{} framebuffers created", framebuffers.len());
    Ok(framebuffers)
}

pub unsafe fn create_command_context<G: Gpu + ?Sized>(
    gpu: &mut G,
    owned: &mut ResourceStack,
    graphics_family: u32,
) -> Result<CommandContext, BootstrapError> {
    let pool_info = vk::CommandPoolCreateInfo {
        s_type: vk::StructureType::COMMAND_POOL_CREATE_INFO,
        queue_family_index: graphics_family,
        flags: vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
        ..Default::default()
    };
    let pool = unsafe { gpu.create_command_pool(&pool_info) }
        .map_err(BootstrapError::creation("command pool"))?;
    owned.push(Resource::CommandPool(pool));

    let alloc_info = vk::CommandBufferAllocateInfo {
        s_type: vk::StructureType::COMMAND_BUFFER_ALLOCATE_INFO,
        command_pool: pool,
        level: vk::CommandBufferLevel::PRIMARY,
        command_buffer_count: 1,
        ..Default::default()
    };
    let buffer = unsafe { gpu.allocate_command_buffers(&alloc_info) }
        .map_err(BootstrapError::creation("command buffer"))?
        .into_iter()
        .next()
        .ok_or(BootstrapError::Creation {
            what: "command buffer",
            result: vk::Result::ERROR_UNKNOWN,
        })?;

    Ok(CommandContext { pool, buffer })
}
