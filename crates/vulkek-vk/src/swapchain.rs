// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use tracing::info;

use crate::error::BootstrapError;
use crate::gpu::{Gpu, Resource, ResourceStack};
use crate::queues::QueueFamilies;
use crate::surface_config::ChosenConfig;

/// The swapchain plus one color view per image. `images.len()` is what the
/// driver returned, which can exceed the requested count.
#[derive(Clone, Debug)]
pub struct PresentationChain {
    pub swapchain: vk::SwapchainKHR,
    pub format: vk::Format,
    pub extent: vk::Extent2D,
    pub images: Vec<vk::Image>,
    pub image_views: Vec<vk::ImageView>,
}

/// Exclusive ownership when one family does both jobs, otherwise concurrent
/// access across exactly the two families in `[graphics, present]` order.
pub fn image_sharing(families: &QueueFamilies) -> (vk::SharingMode, Vec<u32>) {
    if families.shared() {
        (vk::SharingMode::EXCLUSIVE, Vec::new())
    } else {
        (
            vk::SharingMode::CONCURRENT,
            vec![families.graphics, families.present],
        )
    }
}

fn image_view_info(image: vk::Image, format: vk::Format) -> vk::ImageViewCreateInfo<'static> {
    vk::ImageViewCreateInfo {
        s_type: vk::StructureType::IMAGE_VIEW_CREATE_INFO,
        image,
        view_type: vk::ImageViewType::TYPE_2D,
        format,
        components: vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        },
        subresource_range: vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        },
        ..Default::default()
    }
}

pub unsafe fn create_presentation_chain<G: Gpu + ?Sized>(
    gpu: &mut G,
    owned: &mut ResourceStack,
    surface: vk::SurfaceKHR,
    config: &ChosenConfig,
    families: QueueFamilies,
) -> Result<PresentationChain, BootstrapError> {
    let (sharing_mode, family_indices) = image_sharing(&families);

    let swap_info = vk::SwapchainCreateInfoKHR {
        s_type: vk::StructureType::SWAPCHAIN_CREATE_INFO_KHR,
        surface,
        min_image_count: config.image_count,
        image_format: config.format,
        image_color_space: config.color_space,
        image_extent: config.extent,
        image_array_layers: 1,
        image_usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,
        image_sharing_mode: sharing_mode,
        queue_family_index_count: family_indices.len() as u32,
        p_queue_family_indices: if family_indices.is_empty() {
            std::ptr::null()
        } else {
            family_indices.as_ptr()
        },
        pre_transform: config.pre_transform,
        composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
        present_mode: config.present_mode,
        clipped: vk::TRUE,
        old_swapchain: vk::SwapchainKHR::null(),
        ..Default::default()
    };

    let swapchain = unsafe { gpu.create_swapchain(&swap_info) }
        .map_err(BootstrapError::creation("swapchain"))?;
    owned.push(Resource::Swapchain(swapchain));

    let images = unsafe { gpu.swapchain_images(swapchain) }
        .map_err(BootstrapError::probe("swapchain images"))?;
    if images.len() as u32 != config.image_count {
        info!(
            "driver returned {} swapchain images ({} requested)",
            images.len(),
            config.image_count
        );
    }

    let mut image_views = Vec::with_capacity(images.len());
    for &image in &images {
        let view = unsafe { gpu.create_image_view(&image_view_info(image, config.format)) }
            .map_err(BootstrapError::creation("image view"))?;
        owned.push(Resource::ImageView(view));
        image_views.push(view);
    }

    info!(
        "swapchain ready: {} images, {}x{}, {:?} / {:?}, {:?}",
        images.len(),
        config.extent.width,
        config.extent.height,
        config.format,
        config.color_space,
        config.present_mode
    );

    Ok(PresentationChain {
        swapchain,
        format: config.format,
        extent: config.extent,
        images,
        image_views,
    })
}
