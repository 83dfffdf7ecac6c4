// SPDX-License-Identifier: CEPL-1.0
use std::ffi::CStr;

use ash::prelude::VkResult;
use ash::{ext::debug_utils, khr::surface, khr::swapchain, vk, Entry};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};
use tracing::debug;

use crate::error::BootstrapError;
use crate::gpu::{Gpu, Resource};

const NOT_READY: vk::Result = vk::Result::ERROR_INITIALIZATION_FAILED;

/// [`Gpu`] over the system Vulkan loader, presenting to one window.
///
/// Instance and device live here; the loaders bound to them are rebuilt
/// whenever either is created and dropped when it is destroyed.
pub struct AshGpu {
    entry: Entry,
    display: RawDisplayHandle,
    window: RawWindowHandle,
    instance: Option<ash::Instance>,
    surface_loader: Option<surface::Instance>,
    debug_loader: Option<debug_utils::Instance>,
    device: Option<ash::Device>,
    swapchain_loader: Option<swapchain::Device>,
}

impl AshGpu {
    /// The window must outlive every surface created from this value.
    pub fn new<W>(window: &W) -> Result<Self, BootstrapError>
    where
        W: HasWindowHandle + HasDisplayHandle + ?Sized,
    {
        let display = window
            .display_handle()
            .map_err(|e| BootstrapError::WindowHandle(e.to_string()))?
            .as_raw();
        let window = window
            .window_handle()
            .map_err(|e| BootstrapError::WindowHandle(e.to_string()))?
            .as_raw();
        Ok(AshGpu {
            entry: Entry::linked(),
            display,
            window,
            instance: None,
            surface_loader: None,
            debug_loader: None,
            device: None,
            swapchain_loader: None,
        })
    }

    fn instance(&self) -> VkResult<&ash::Instance> {
        self.instance.as_ref().ok_or(NOT_READY)
    }

    fn surface_loader(&self) -> VkResult<&surface::Instance> {
        self.surface_loader.as_ref().ok_or(NOT_READY)
    }

    fn device(&self) -> VkResult<&ash::Device> {
        self.device.as_ref().ok_or(NOT_READY)
    }

    fn swapchain_loader(&self) -> VkResult<&swapchain::Device> {
        self.swapchain_loader.as_ref().ok_or(NOT_READY)
    }
}

fn name_of(raw: Result<&CStr, std::ffi::FromBytesUntilNulError>) -> String {
    raw.map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl Gpu for AshGpu {
    fn instance_extensions(&self) -> VkResult<Vec<String>> {
        let props = unsafe { self.entry.enumerate_instance_extension_properties(None)? };
        Ok(props
            .iter()
            .map(|p| name_of(p.extension_name_as_c_str()))
            .collect())
    }

    fn instance_layers(&self) -> VkResult<Vec<String>> {
        let props = unsafe { self.entry.enumerate_instance_layer_properties()? };
        Ok(props
            .iter()
            .map(|p| name_of(p.layer_name_as_c_str()))
            .collect())
    }

    fn required_surface_extensions(&self) -> VkResult<Vec<&'static CStr>> {
        let names = ash_window::enumerate_required_extensions(self.display)?;
        Ok(names
            .iter()
            .map(|&p| unsafe { CStr::from_ptr(p) })
            .collect())
    }

    fn adapters(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        unsafe { self.instance()?.enumerate_physical_devices() }
    }

    fn adapter_name(&self, adapter: vk::PhysicalDevice) -> String {
        let Ok(instance) = self.instance() else {
            return String::new();
        };
        let props = unsafe { instance.get_physical_device_properties(adapter) };
        name_of(props.device_name_as_c_str())
    }

    fn device_extensions(&self, adapter: vk::PhysicalDevice) -> VkResult<Vec<String>> {
        let props = unsafe {
            self.instance()?
                .enumerate_device_extension_properties(adapter)?
        };
        Ok(props
            .iter()
            .map(|p| name_of(p.extension_name_as_c_str()))
            .collect())
    }

    fn queue_families(
        &self,
        adapter: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::QueueFamilyProperties>> {
        let instance = self.instance()?;
        Ok(unsafe { instance.get_physical_device_queue_family_properties(adapter) })
    }

    fn present_support(
        &self,
        adapter: vk::PhysicalDevice,
        family: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        unsafe {
            self.surface_loader()?
                .get_physical_device_surface_support(adapter, family, surface)
        }
    }

    fn surface_capabilities(
        &self,
        adapter: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.surface_loader()?
                .get_physical_device_surface_capabilities(adapter, surface)
        }
    }

    fn surface_formats(
        &self,
        adapter: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        unsafe {
            self.surface_loader()?
                .get_physical_device_surface_formats(adapter, surface)
        }
    }

    fn surface_present_modes(
        &self,
        adapter: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        unsafe {
            self.surface_loader()?
                .get_physical_device_surface_present_modes(adapter, surface)
        }
    }

    unsafe fn create_instance(&mut self, info: &vk::InstanceCreateInfo<'_>) -> VkResult<()> {
        let instance = unsafe { self.entry.create_instance(info, None)? };
        self.surface_loader = Some(surface::Instance::new(&self.entry, &instance));
        self.debug_loader = Some(debug_utils::Instance::new(&self.entry, &instance));
        self.instance = Some(instance);
        Ok(())
    }

    unsafe fn create_debug_messenger(
        &mut self,
        info: &vk::DebugUtilsMessengerCreateInfoEXT<'_>,
    ) -> VkResult<vk::DebugUtilsMessengerEXT> {
        let loader = self.debug_loader.as_ref().ok_or(NOT_READY)?;
        unsafe { loader.create_debug_utils_messenger(info, None) }
    }

    unsafe fn create_surface(&mut self) -> VkResult<vk::SurfaceKHR> {
        let instance = self.instance()?;
        unsafe { ash_window::create_surface(&self.entry, instance, self.display, self.window, None) }
    }

    unsafe fn create_device(
        &mut self,
        adapter: vk::PhysicalDevice,
        info: &vk::DeviceCreateInfo<'_>,
    ) -> VkResult<()> {
        let (device, loader) = {
            let instance = self.instance()?;
            let device = unsafe { instance.create_device(adapter, info, None)? };
            let loader = swapchain::Device::new(instance, &device);
            (device, loader)
        };
        self.swapchain_loader = Some(loader);
        self.device = Some(device);
        Ok(())
    }

    unsafe fn device_queue(&self, family: u32, index: u32) -> vk::Queue {
        match self.device() {
            Ok(device) => unsafe { device.get_device_queue(family, index) },
            Err(_) => vk::Queue::null(),
        }
    }

    unsafe fn create_swapchain(
        &mut self,
        info: &vk::SwapchainCreateInfoKHR<'_>,
    ) -> VkResult<vk::SwapchainKHR> {
        unsafe { self.swapchain_loader()?.create_swapchain(info, None) }
    }

    unsafe fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>> {
        unsafe { self.swapchain_loader()?.get_swapchain_images(swapchain) }
    }

    unsafe fn create_image_view(
        &mut self,
        info: &vk::ImageViewCreateInfo<'_>,
    ) -> VkResult<vk::ImageView> {
        unsafe { self.device()?.create_image_view(info, None) }
    }

    unsafe fn create_render_pass(
        &mut self,
        info: &vk::RenderPassCreateInfo<'_>,
    ) -> VkResult<vk::RenderPass> {
        unsafe { self.device()?.create_render_pass(info, None) }
    }

    unsafe fn create_shader_module(
        &mut self,
        info: &vk::ShaderModuleCreateInfo<'_>,
    ) -> VkResult<vk::ShaderModule> {
        unsafe { self.device()?.create_shader_module(info, None) }
    }

    unsafe fn create_pipeline_layout(
        &mut self,
        info: &vk::PipelineLayoutCreateInfo<'_>,
    ) -> VkResult<vk::PipelineLayout> {
        unsafe { self.device()?.create_pipeline_layout(info, None) }
    }

    unsafe fn create_graphics_pipeline(
        &mut self,
        info: &vk::GraphicsPipelineCreateInfo<'_>,
    ) -> VkResult<vk::Pipeline> {
        let device = self.device()?;
        let pipelines = unsafe {
            device.create_graphics_pipelines(vk::PipelineCache::null(), std::slice::from_ref(info), None)
        }
        .map_err(|(partial, result)| {
            for p in partial.into_iter().filter(|p| *p != vk::Pipeline::null()) {
                unsafe { device.destroy_pipeline(p, None) };
            }
            result
        })?;
        pipelines.into_iter().next().ok_or(vk::Result::ERROR_UNKNOWN)
    }

    unsafe fn create_framebuffer(
        &mut self,
        info: &vk::FramebufferCreateInfo<'_>,
    ) -> VkResult<vk::Framebuffer> {
        unsafe { self.device()?.create_framebuffer(info, None) }
    }

    unsafe fn create_command_pool(
        &mut self,
        info: &vk::CommandPoolCreateInfo<'_>,
    ) -> VkResult<vk::CommandPool> {
        unsafe { self.device()?.create_command_pool(info, None) }
    }

    unsafe fn allocate_command_buffers(
        &mut self,
        info: &vk::CommandBufferAllocateInfo<'_>,
    ) -> VkResult<Vec<vk::CommandBuffer>> {
        unsafe { self.device()?.allocate_command_buffers(info) }
    }

    unsafe fn device_wait_idle(&self) -> VkResult<()> {
        unsafe { self.device()?.device_wait_idle() }
    }

    unsafe fn destroy(&mut self, resource: Resource) {
        debug!("vkDestroy {}", resource.kind());
        // Handles are only ever created through the loaders held here, so a
        // missing loader means the handle never existed.
        match resource {
            Resource::Instance => {
                self.debug_loader = None;
                self.surface_loader = None;
                if let Some(instance) = self.instance.take() {
                    unsafe { instance.destroy_instance(None) };
                }
            }
            Resource::DebugMessenger(m) => {
                if let Some(loader) = &self.debug_loader {
                    unsafe { loader.destroy_debug_utils_messenger(m, None) };
                }
            }
            Resource::Surface(s) => {
                if let Some(loader) = &self.surface_loader {
                    unsafe { loader.destroy_surface(s, None) };
                }
            }
            Resource::Device => {
                self.swapchain_loader = None;
                if let Some(device) = self.device.take() {
                    unsafe { device.destroy_device(None) };
                }
            }
            Resource::Swapchain(sc) => {
                if let Some(loader) = &self.swapchain_loader {
                    unsafe { loader.destroy_swapchain(sc, None) };
                }
            }
            other => {
                let Some(d) = &self.device else {
                    return;
                };
                unsafe {
                    match other {
                        Resource::ImageView(v) => d.destroy_image_view(v, None),
                        Resource::RenderPass(rp) => d.destroy_render_pass(rp, None),
                        Resource::ShaderModule(m) => d.destroy_shader_module(m, None),
                        Resource::PipelineLayout(l) => d.destroy_pipeline_layout(l, None),
                        Resource::Pipeline(p) => d.destroy_pipeline(p, None),
                        Resource::Framebuffer(fb) => d.destroy_framebuffer(fb, None),
                        Resource::CommandPool(pool) => d.destroy_command_pool(pool, None),
                        _ => {}
                    }
                }
            }
        }
    }
}
