// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{c_char, c_void, CStr, CString};

use ash::vk;
use tracing::{debug, error, info, trace, warn};

use crate::config::BootstrapConfig;
use crate::error::BootstrapError;
use crate::gpu::{Gpu, Resource, ResourceStack};
use crate::probe;

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    types: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user: *mut c_void,
) -> vk::Bool32 {
    if data.is_null() {
        return vk::FALSE;
    }
    let msg = unsafe {
        let p = (*data).p_message;
        if p.is_null() {
            return vk::FALSE;
        }
        CStr::from_ptr(p).to_string_lossy()
    };
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        error!("[vulkan {:?}] {}", types, msg);
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        warn!("[vulkan {:?}] {}", types, msg);
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        debug!("[vulkan {:?}] {}", types, msg);
    } else {
        trace!("[vulkan {:?}] {}", types, msg);
    }
    vk::FALSE
}

/// Instance extensions to request: whatever the window system needs, plus
/// debug utils when validation is on.
pub fn instance_extensions<G: Gpu + ?Sized>(
    gpu: &G,
    cfg: &BootstrapConfig,
) -> Result<Vec<&'static CStr>, BootstrapError> {
    let mut exts = gpu
        .required_surface_extensions()
        .map_err(BootstrapError::probe("required surface extensions"))?;
    if cfg.validation.enabled {
        exts.push(ash::ext::debug_utils::NAME);
    }
    Ok(exts)
}

/// Names handed to the driver cannot carry interior NULs; those are dropped.
fn c_name(what: &str, value: &str) -> CString {
    let bytes: Vec<u8> = value.bytes().filter(|&b| b != 0).collect();
    if bytes.len() != value.len() {
        warn!("{what} {value:?} contains NUL bytes, stripped");
    }
    CString::new(bytes).unwrap_or_default()
}

/// Creates the instance and, with validation on, the debug messenger.
pub unsafe fn create_instance<G: Gpu + ?Sized>(
    gpu: &mut G,
    owned: &mut ResourceStack,
    cfg: &BootstrapConfig,
) -> Result<(), BootstrapError> {
    let available = probe::list_instance_extensions(gpu)?;
    let extensions = instance_extensions(gpu, cfg)?;
    probe::check_extensions(&available, &extensions)?;

    if cfg.validation.enabled {
        let layers = probe::list_validation_layers(gpu)?;
        probe::check_validation_layers(&layers, &cfg.validation.layers)?;
    }

    let app_name = c_name("app name", &cfg.app_name);
    let engine_name = c_name("engine name", &cfg.engine_name);
    let app_info = vk::ApplicationInfo {
        s_type: vk::StructureType::APPLICATION_INFO,
        p_application_name: app_name.as_ptr(),
        application_version: vk::make_api_version(0, 0, 1, 0),
        p_engine_name: engine_name.as_ptr(),
        engine_version: 0,
        api_version: cfg.api_version,
        ..Default::default()
    };

    let ext_ptrs: Vec<*const c_char> = extensions.iter().map(|e| e.as_ptr()).collect();
    let layers = cfg.validation.active_layers();
    let layer_ptrs: Vec<*const c_char> = layers.iter().map(|l| l.as_ptr()).collect();

    let create_info = vk::InstanceCreateInfo {
        s_type: vk::StructureType::INSTANCE_CREATE_INFO,
        p_application_info: &app_info,
        enabled_extension_count: ext_ptrs.len() as u32,
        pp_enabled_extension_names: ext_ptrs.as_ptr(),
        enabled_layer_count: layer_ptrs.len() as u32,
        pp_enabled_layer_names: layer_ptrs.as_ptr(),
        ..Default::default()
    };

    unsafe { gpu.create_instance(&create_info) }.map_err(BootstrapError::creation("instance"))?;
    owned.push(Resource::Instance);
    info!(
        "instance ready (\"{}\", api {}.{}, {} extensions, {} layers)",
        cfg.app_name,
        vk::api_version_major(cfg.api_version),
        vk::api_version_minor(cfg.api_version),
        ext_ptrs.len(),
        layer_ptrs.len()
    );

    if cfg.validation.enabled {
        let ci = vk::DebugUtilsMessengerCreateInfoEXT {
            s_type: vk::StructureType::DEBUG_UTILS_MESSENGER_CREATE_INFO_EXT,
            message_severity: vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            message_type: vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            pfn_user_callback: Some(debug_callback),
            ..Default::default()
        };
        let messenger = unsafe { gpu.create_debug_messenger(&ci) }
            .map_err(BootstrapError::creation("debug messenger"))?;
        owned.push(Resource::DebugMessenger(messenger));
    }
    Ok(())
}
