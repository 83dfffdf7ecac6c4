// SPDX-License-Identifier: CEPL-1.0
use std::ffi::CStr;

use ash::vk;
use tracing::{debug, info, warn};

use crate::error::BootstrapError;
use crate::gpu::Gpu;
use crate::queues::{self, QueueFamilies};

/// Device extensions every adapter must expose to be considered at all.
pub const REQUIRED_DEVICE_EXTENSIONS: &[&CStr] = &[ash::khr::swapchain::NAME];

/// `current_extent.width` value meaning "the window decides the size".
pub const WINDOW_SIZED_EXTENT: u32 = u32::MAX;

/// Surface-level capability snapshot for one adapter/surface pair.
#[derive(Clone, Debug)]
pub struct SurfaceCapabilities {
    pub min_images: u32,
    /// 0 means unbounded.
    pub max_images: u32,
    pub current_extent: vk::Extent2D,
    pub min_extent: vk::Extent2D,
    pub max_extent: vk::Extent2D,
    pub current_transform: vk::SurfaceTransformFlagsKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SurfaceCapabilities {
    pub fn from_raw(
        caps: &vk::SurfaceCapabilitiesKHR,
        formats: Vec<vk::SurfaceFormatKHR>,
        present_modes: Vec<vk::PresentModeKHR>,
    ) -> Self {
        SurfaceCapabilities {
            min_images: caps.min_image_count,
            max_images: caps.max_image_count,
            current_extent: caps.current_extent,
            min_extent: caps.min_image_extent,
            max_extent: caps.max_image_extent,
            current_transform: caps.current_transform,
            formats,
            present_modes,
        }
    }

    /// The fixed extent the surface demands, or `None` when it follows the window.
    pub fn fixed_extent(&self) -> Option<vk::Extent2D> {
        (self.current_extent.width != WINDOW_SIZED_EXTENT).then_some(self.current_extent)
    }
}

pub fn list_instance_extensions<G: Gpu + ?Sized>(gpu: &G) -> Result<Vec<String>, BootstrapError> {
    let exts = gpu
        .instance_extensions()
        .map_err(BootstrapError::probe("instance extensions"))?;
    debug!("{} instance extensions supported", exts.len());
    for e in &exts {
        debug!("  {}", e);
    }
    Ok(exts)
}

pub fn list_validation_layers<G: Gpu + ?Sized>(gpu: &G) -> Result<Vec<String>, BootstrapError> {
    let layers = gpu
        .instance_layers()
        .map_err(BootstrapError::probe("instance layers"))?;
    debug!("{} instance layers available", layers.len());
    for l in &layers {
        debug!("  {}", l);
    }
    Ok(layers)
}

pub fn list_queue_families<G: Gpu + ?Sized>(
    gpu: &G,
    adapter: vk::PhysicalDevice,
) -> Result<Vec<vk::QueueFamilyProperties>, BootstrapError> {
    gpu.queue_families(adapter)
        .map_err(BootstrapError::probe("queue families"))
}

/// Every requested layer must be present in `available`.
pub fn check_validation_layers(
    available: &[String],
    requested: &[String],
) -> Result<(), BootstrapError> {
    match requested.iter().find(|r| !available.contains(r)) {
        Some(missing) => Err(BootstrapError::ValidationLayerMissing(missing.clone())),
        None => Ok(()),
    }
}

/// Every `required` extension must be present in `available`.
pub fn check_extensions(available: &[String], required: &[&CStr]) -> Result<(), BootstrapError> {
    for name in required {
        if !available.iter().any(|a| a.as_bytes() == name.to_bytes()) {
            return Err(BootstrapError::MissingExtension(
                name.to_string_lossy().into_owned(),
            ));
        }
    }
    Ok(())
}

/// Queries capabilities, formats and present modes. An adapter that reports no
/// formats or no present modes is not viable for this surface.
pub fn query_surface_support<G: Gpu + ?Sized>(
    gpu: &G,
    adapter: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
) -> Result<SurfaceCapabilities, BootstrapError> {
    let caps = gpu
        .surface_capabilities(adapter, surface)
        .map_err(BootstrapError::probe("surface capabilities"))?;
    let formats = gpu
        .surface_formats(adapter, surface)
        .map_err(BootstrapError::probe("surface formats"))?;
    let modes = gpu
        .surface_present_modes(adapter, surface)
        .map_err(BootstrapError::probe("surface present modes"))?;

    if formats.is_empty() {
        return Err(BootstrapError::UnsupportedAdapter {
            adapter: gpu.adapter_name(adapter),
            reason: "surface reports no formats",
        });
    }
    if modes.is_empty() {
        return Err(BootstrapError::UnsupportedAdapter {
            adapter: gpu.adapter_name(adapter),
            reason: "surface reports no present modes",
        });
    }

    Ok(SurfaceCapabilities::from_raw(&caps, formats, modes))
}

/// The adapter picked for this surface, with what was learned while vetting it.
#[derive(Clone, Debug)]
pub struct AdapterChoice {
    pub adapter: vk::PhysicalDevice,
    pub name: String,
    pub families: QueueFamilies,
    pub capabilities: SurfaceCapabilities,
}

fn vet_adapter<G: Gpu + ?Sized>(
    gpu: &G,
    adapter: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    required_extensions: &[&CStr],
) -> Result<AdapterChoice, BootstrapError> {
    let name = gpu.adapter_name(adapter);

    let families = queues::resolve(gpu, adapter, surface)?.usable().ok_or_else(|| {
        BootstrapError::UnsupportedAdapter {
            adapter: name.clone(),
            reason: "no graphics or no present queue family",
        }
    })?;

    let exts = gpu
        .device_extensions(adapter)
        .map_err(BootstrapError::probe("device extensions"))?;
    check_extensions(&exts, required_extensions).map_err(|_| {
        BootstrapError::UnsupportedAdapter {
            adapter: name.clone(),
            reason: "missing required device extension",
        }
    })?;

    let capabilities = query_surface_support(gpu, adapter, surface)?;

    Ok(AdapterChoice {
        adapter,
        name,
        families,
        capabilities,
    })
}

/// First adapter, in enumeration order, that can drive `surface`. Adapters
/// that fail vetting are logged and skipped; a failed driver query is
/// returned as is.
pub fn select_adapter<G: Gpu + ?Sized>(
    gpu: &G,
    surface: vk::SurfaceKHR,
    required_extensions: &[&CStr],
) -> Result<AdapterChoice, BootstrapError> {
    let adapters = gpu
        .adapters()
        .map_err(BootstrapError::probe("physical devices"))?;
    debug!("{} adapters enumerated", adapters.len());

    for adapter in adapters {
        match vet_adapter(gpu, adapter, surface, required_extensions) {
            Ok(choice) => {
                info!(
                    "adapter \"{}\" selected (graphics family {}, present family {})",
                    choice.name, choice.families.graphics, choice.families.present
                );
                return Ok(choice);
            }
            Err(e @ BootstrapError::UnsupportedAdapter { .. }) => {
                warn!("skipping adapter: {e}")
            }
            Err(e) => return Err(e),
        }
    }
    Err(BootstrapError::NoViableAdapter)
}
