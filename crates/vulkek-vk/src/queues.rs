// SPDX-License-Identifier: CEPL-1.0
use ash::vk;

use crate::error::BootstrapError;
use crate::gpu::Gpu;
use crate::probe;

/// Queue-family indices found for each role. Only usable once both are set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueFamilySelection {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
}

/// A usable selection: both roles resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueFamilies {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilySelection {
    pub fn is_usable(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }

    pub fn usable(&self) -> Option<QueueFamilies> {
        Some(QueueFamilies {
            graphics: self.graphics?,
            present: self.present?,
        })
    }
}

impl QueueFamilies {
    pub fn shared(&self) -> bool {
        self.graphics == self.present
    }

    /// Distinct family indices, graphics first.
    pub fn unique(&self) -> Vec<u32> {
        if self.shared() {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }
}

/// Lowest-index family for each role. Every family is visited, and queried
/// for present support, exactly once; the two roles are tracked independently
/// and no preference is given to a family that can do both.
pub fn resolve_families(
    families: &[vk::QueueFamilyProperties],
    mut supports_present: impl FnMut(u32) -> bool,
) -> QueueFamilySelection {
    let mut selection = QueueFamilySelection::default();
    for (i, family) in families.iter().enumerate() {
        let index = i as u32;
        if selection.graphics.is_none() && family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
            selection.graphics = Some(index);
        }
        let presents = supports_present(index);
        if selection.present.is_none() && presents {
            selection.present = Some(index);
        }
    }
    selection
}

/// Runs [`resolve_families`] against the driver. The first failing present
/// query aborts the scan and is returned.
pub fn resolve<G: Gpu + ?Sized>(
    gpu: &G,
    adapter: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
) -> Result<QueueFamilySelection, BootstrapError> {
    let families = probe::list_queue_families(gpu, adapter)?;
    let mut failure = None;
    let selection = resolve_families(&families, |index| {
        if failure.is_some() {
            return false;
        }
        gpu.present_support(adapter, index, surface)
            .unwrap_or_else(|e| {
                failure = Some(e);
                false
            })
    });
    match failure {
        Some(result) => Err(BootstrapError::probe("present support")(result)),
        None => Ok(selection),
    }
}
