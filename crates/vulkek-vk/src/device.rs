// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{c_char, CStr};

use ash::vk;
use tracing::info;

use crate::error::BootstrapError;
use crate::gpu::{Gpu, Resource, ResourceStack};
use crate::queues::QueueFamilies;

static QUEUE_PRIORITY: [f32; 1] = [1.0];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceQueues {
    pub graphics: vk::Queue,
    pub present: vk::Queue,
}

/// One queue per distinct family, all at priority 1.0.
pub fn queue_create_infos(families: &QueueFamilies) -> Vec<vk::DeviceQueueCreateInfo<'static>> {
    families
        .unique()
        .into_iter()
        .map(|index| vk::DeviceQueueCreateInfo {
            s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
            queue_family_index: index,
            queue_count: 1,
            p_queue_priorities: QUEUE_PRIORITY.as_ptr(),
            ..Default::default()
        })
        .collect()
}

/// Creates the logical device on `adapter` and fetches both role queues.
/// When the roles share a family both handles name the same queue.
pub unsafe fn create_device<G: Gpu + ?Sized>(
    gpu: &mut G,
    owned: &mut ResourceStack,
    adapter: vk::PhysicalDevice,
    families: QueueFamilies,
    extensions: &[&CStr],
) -> Result<DeviceQueues, BootstrapError> {
    let qinfos = queue_create_infos(&families);
    let ext_ptrs: Vec<*const c_char> = extensions.iter().map(|e| e.as_ptr()).collect();

    let dinfo = vk::DeviceCreateInfo {
        s_type: vk::StructureType::DEVICE_CREATE_INFO,
        queue_create_info_count: qinfos.len() as u32,
        p_queue_create_infos: qinfos.as_ptr(),
        enabled_extension_count: ext_ptrs.len() as u32,
        pp_enabled_extension_names: ext_ptrs.as_ptr(),
        ..Default::default()
    };

    unsafe { gpu.create_device(adapter, &dinfo) }.map_err(BootstrapError::DeviceCreation)?;
    owned.push(Resource::Device);

    let queues = DeviceQueues {
        graphics: unsafe { gpu.device_queue(families.graphics, 0) },
        present: unsafe { gpu.device_queue(families.present, 0) },
    };
    info!(
        "device ready ({} queue families requested)",
        qinfos.len()
    );
    Ok(queues)
}
