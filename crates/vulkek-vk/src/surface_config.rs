// SPDX-License-Identifier: CEPL-1.0
use ash::vk;

use crate::probe::SurfaceCapabilities;
use crate::RenderSize;

/// Concrete presentation parameters derived from a capability snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChosenConfig {
    pub format: vk::Format,
    pub color_space: vk::ColorSpaceKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

/// First 8-bit BGRA sRGB entry, else whatever the driver listed first.
/// `formats` must not be empty.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    formats
        .iter()
        .copied()
        .find(|f| {
            f.format == vk::Format::B8G8R8A8_SRGB
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .unwrap_or(formats[0])
}

/// Mailbox when offered, FIFO otherwise (FIFO is always supported).
pub fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

pub fn choose_extent(caps: &SurfaceCapabilities, drawable: RenderSize) -> vk::Extent2D {
    match caps.fixed_extent() {
        Some(extent) => extent,
        None => vk::Extent2D {
            width: drawable
                .width
                .max(caps.min_extent.width)
                .min(caps.max_extent.width),
            height: drawable
                .height
                .max(caps.min_extent.height)
                .min(caps.max_extent.height),
        },
    }
}

/// One more than the minimum so acquiring never has to wait on the
/// presentation engine, capped by the maximum (0 == no maximum).
pub fn choose_image_count(caps: &SurfaceCapabilities) -> u32 {
    let want = caps.min_images.saturating_add(1).max(1);
    if caps.max_images == 0 {
        want
    } else {
        want.min(caps.max_images)
    }
}

pub fn select(caps: &SurfaceCapabilities, drawable: RenderSize) -> ChosenConfig {
    let surface_format = choose_surface_format(&caps.formats);
    ChosenConfig {
        format: surface_format.format,
        color_space: surface_format.color_space,
        present_mode: choose_present_mode(&caps.present_modes),
        extent: choose_extent(caps, drawable),
        image_count: choose_image_count(caps),
        pre_transform: caps.current_transform,
    }
}
