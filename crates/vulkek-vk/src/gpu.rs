// SPDX-License-Identifier: CEPL-1.0
use std::ffi::CStr;

use ash::prelude::VkResult;
use ash::vk;
use tracing::debug;

/// Every call the bootstrap makes into the graphics runtime.
///
/// Queries are read-only and safe. Create calls take raw Vulkan create-info
/// records whose pointers must stay valid for the duration of the call, and
/// handles passed to [`Gpu::destroy`] must no longer be in use by anything
/// created after them; both are on the caller.
pub trait Gpu {
    fn instance_extensions(&self) -> VkResult<Vec<String>>;
    fn instance_layers(&self) -> VkResult<Vec<String>>;
    /// Instance extensions the window system needs to create a surface.
    fn required_surface_extensions(&self) -> VkResult<Vec<&'static CStr>>;

    fn adapters(&self) -> VkResult<Vec<vk::PhysicalDevice>>;
    fn adapter_name(&self, adapter: vk::PhysicalDevice) -> String;
    fn device_extensions(&self, adapter: vk::PhysicalDevice) -> VkResult<Vec<String>>;
    fn queue_families(&self, adapter: vk::PhysicalDevice)
        -> VkResult<Vec<vk::QueueFamilyProperties>>;
    fn present_support(
        &self,
        adapter: vk::PhysicalDevice,
        family: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool>;
    fn surface_capabilities(
        &self,
        adapter: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR>;
    fn surface_formats(
        &self,
        adapter: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>>;
    fn surface_present_modes(
        &self,
        adapter: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>>;

    unsafe fn create_instance(&mut self, info: &vk::InstanceCreateInfo<'_>) -> VkResult<()>;
    unsafe fn create_debug_messenger(
        &mut self,
        info: &vk::DebugUtilsMessengerCreateInfoEXT<'_>,
    ) -> VkResult<vk::DebugUtilsMessengerEXT>;
    unsafe fn create_surface(&mut self) -> VkResult<vk::SurfaceKHR>;
    unsafe fn create_device(
        &mut self,
        adapter: vk::PhysicalDevice,
        info: &vk::DeviceCreateInfo<'_>,
    ) -> VkResult<()>;
    unsafe fn device_queue(&self, family: u32, index: u32) -> vk::Queue;
    unsafe fn create_swapchain(
        &mut self,
        info: &vk::SwapchainCreateInfoKHR<'_>,
    ) -> VkResult<vk::SwapchainKHR>;
    unsafe fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>>;
    unsafe fn create_image_view(
        &mut self,
        info: &vk::ImageViewCreateInfo<'_>,
    ) -> VkResult<vk::ImageView>;
    unsafe fn create_render_pass(
        &mut self,
        info: &vk::RenderPassCreateInfo<'_>,
    ) -> VkResult<vk::RenderPass>;
    unsafe fn create_shader_module(
        &mut self,
        info: &vk::ShaderModuleCreateInfo<'_>,
    ) -> VkResult<vk::ShaderModule>;
    unsafe fn create_pipeline_layout(
        &mut self,
        info: &vk::PipelineLayoutCreateInfo<'_>,
    ) -> VkResult<vk::PipelineLayout>;
    unsafe fn create_graphics_pipeline(
        &mut self,
        info: &vk::GraphicsPipelineCreateInfo<'_>,
    ) -> VkResult<vk::Pipeline>;
    unsafe fn create_framebuffer(
        &mut self,
        info: &vk::FramebufferCreateInfo<'_>,
    ) -> VkResult<vk::Framebuffer>;
    unsafe fn create_command_pool(
        &mut self,
        info: &vk::CommandPoolCreateInfo<'_>,
    ) -> VkResult<vk::CommandPool>;
    unsafe fn allocate_command_buffers(
        &mut self,
        info: &vk::CommandBufferAllocateInfo<'_>,
    ) -> VkResult<Vec<vk::CommandBuffer>>;

    unsafe fn device_wait_idle(&self) -> VkResult<()>;
    unsafe fn destroy(&mut self, resource: Resource);
}

/// A handle owned by the bootstrap. Instance and device are singletons held
/// inside the [`Gpu`] implementation, so they carry no handle here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Instance,
    DebugMessenger(vk::DebugUtilsMessengerEXT),
    Surface(vk::SurfaceKHR),
    Device,
    Swapchain(vk::SwapchainKHR),
    ImageView(vk::ImageView),
    RenderPass(vk::RenderPass),
    ShaderModule(vk::ShaderModule),
    PipelineLayout(vk::PipelineLayout),
    Pipeline(vk::Pipeline),
    Framebuffer(vk::Framebuffer),
    /// Destroying the pool frees the command buffers allocated from it.
    CommandPool(vk::CommandPool),
}

impl Resource {
    pub fn kind(&self) -> &'static str {
        match self {
            Resource::Instance => "instance",
            Resource::DebugMessenger(_) => "debug messenger",
            Resource::Surface(_) => "surface",
            Resource::Device => "device",
            Resource::Swapchain(_) => "swapchain",
            Resource::ImageView(_) => "image view",
            Resource::RenderPass(_) => "render pass",
            Resource::ShaderModule(_) => "shader module",
            Resource::PipelineLayout(_) => "pipeline layout",
            Resource::Pipeline(_) => "pipeline",
            Resource::Framebuffer(_) => "framebuffer",
            Resource::CommandPool(_) => "command pool",
        }
    }
}

/// Everything created so far, in creation order.
#[derive(Debug, Default)]
pub struct ResourceStack {
    owned: Vec<Resource>,
}

impl ResourceStack {
    pub fn push(&mut self, resource: Resource) {
        debug!("acquired {:?}", resource);
        self.owned.push(resource);
    }

    pub fn contains(&self, resource: Resource) -> bool {
        self.owned.contains(&resource)
    }

    pub fn len(&self) -> usize {
        self.owned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owned.is_empty()
    }

    /// Destroys one resource ahead of the rest (transient objects such as
    /// shader modules).
    pub unsafe fn release<G: Gpu + ?Sized>(&mut self, gpu: &mut G, resource: Resource) {
        if let Some(pos) = self.owned.iter().rposition(|r| *r == resource) {
            self.owned.remove(pos);
        }
        debug!("released {:?}", resource);
        unsafe { gpu.destroy(resource) };
    }

    /// Destroys everything in exact reverse creation order.
    pub unsafe fn unwind<G: Gpu + ?Sized>(&mut self, gpu: &mut G) {
        if self.contains(Resource::Device) {
            unsafe { gpu.device_wait_idle() }.ok();
        }
        while let Some(resource) = self.owned.pop() {
            debug!("destroying {:?}", resource);
            unsafe { gpu.destroy(resource) };
        }
    }
}
