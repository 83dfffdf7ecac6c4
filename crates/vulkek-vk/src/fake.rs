// SPDX-License-Identifier: CEPL-1.0
//! Recording stand-in for the graphics runtime, used by unit tests.

use std::cell::{Cell, RefCell};
use std::ffi::CStr;
use std::path::PathBuf;
use std::rc::Rc;
use std::slice;

use ash::prelude::VkResult;
use ash::vk::{self, Handle};

use crate::config::ShaderPaths;
use crate::gpu::{Gpu, Resource};
use crate::probe::SurfaceCapabilities;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Event {
    Created(Resource),
    Destroyed(Resource),
    WaitIdle,
}

#[derive(Debug)]
pub(crate) struct SwapchainRecord {
    pub surface: vk::SurfaceKHR,
    pub sharing_mode: vk::SharingMode,
    pub queue_family_indices: Vec<u32>,
    pub min_image_count: u32,
    pub format: vk::Format,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
}

#[derive(Debug)]
pub(crate) struct ImageViewRecord {
    pub view_type: vk::ImageViewType,
    pub format: vk::Format,
    pub level_count: u32,
    pub layer_count: u32,
    pub identity_swizzle: bool,
}

#[derive(Debug)]
pub(crate) struct RenderPassRecord {
    pub format: vk::Format,
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub initial_layout: vk::ImageLayout,
    pub final_layout: vk::ImageLayout,
    pub subpass_count: u32,
    pub color_attachment_count: u32,
}

#[derive(Debug)]
pub(crate) struct PipelineRecord {
    pub stage_count: u32,
    pub layout: vk::PipelineLayout,
    pub render_pass: vk::RenderPass,
    pub topology: vk::PrimitiveTopology,
    pub cull_mode: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
    pub dynamic_states: Vec<vk::DynamicState>,
    pub has_depth_stencil: bool,
}

#[derive(Debug)]
pub(crate) struct FramebufferRecord {
    pub render_pass: vk::RenderPass,
    pub attachment_count: u32,
    pub attachment: vk::ImageView,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

#[derive(Debug)]
pub(crate) struct CommandPoolRecord {
    pub family: u32,
    pub flags: vk::CommandPoolCreateFlags,
    pub buffers_requested: u32,
    pub level: vk::CommandBufferLevel,
}

#[derive(Debug, Default)]
pub(crate) struct Log {
    pub events: Vec<Event>,
    pub app_name: Option<String>,
    pub api_version: u32,
    pub instance_extensions: Vec<String>,
    pub instance_layers: Vec<String>,
    pub device_queue_families: Vec<u32>,
    pub device_extensions: Vec<String>,
    pub swapchain: Option<SwapchainRecord>,
    pub image_views: Vec<ImageViewRecord>,
    pub render_pass: Option<RenderPassRecord>,
    pub pipeline: Option<PipelineRecord>,
    pub framebuffers: Vec<FramebufferRecord>,
    pub command_pool: Option<CommandPoolRecord>,
}

#[derive(Clone, Debug)]
pub(crate) struct FakeAdapter {
    pub name: String,
    /// (flags, can present) per family, in index order.
    pub families: Vec<(vk::QueueFlags, bool)>,
    pub extensions: Vec<String>,
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl FakeAdapter {
    /// One combined graphics+present family, one sRGB BGRA format, FIFO only,
    /// 2..=4 images at a fixed 800x600.
    pub fn capable() -> Self {
        FakeAdapter {
            name: "fake adapter".to_owned(),
            families: vec![(vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER, true)],
            extensions: vec!["VK_KHR_swapchain".to_owned()],
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 4,
                current_extent: vk::Extent2D {
                    width: 800,
                    height: 600,
                },
                min_image_extent: vk::Extent2D {
                    width: 1,
                    height: 1,
                },
                max_image_extent: vk::Extent2D {
                    width: 4096,
                    height: 4096,
                },
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                ..Default::default()
            },
            formats: vec![vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        }
    }

    pub fn surface_capabilities(&self) -> SurfaceCapabilities {
        SurfaceCapabilities::from_raw(
            &self.capabilities,
            self.formats.clone(),
            self.present_modes.clone(),
        )
    }
}

pub(crate) struct FakeGpu {
    pub log: Rc<RefCell<Log>>,
    pub adapters: Vec<FakeAdapter>,
    pub available_extensions: Vec<String>,
    pub available_layers: Vec<String>,
    /// Images handed back beyond the requested minimum.
    pub extra_images: u32,
    /// Kind of resource (see [`Resource::kind`]) whose creation fails,
    /// "command buffer" for allocation or "present support" for that query.
    pub fail_on: Option<&'static str>,
    next: Cell<u64>,
}

impl Default for FakeGpu {
    fn default() -> Self {
        FakeGpu {
            log: Rc::default(),
            adapters: Vec::new(),
            available_extensions: vec![
                "VK_KHR_surface".to_owned(),
                "VK_KHR_xcb_surface".to_owned(),
                "VK_EXT_debug_utils".to_owned(),
            ],
            available_layers: vec!["VK_LAYER_KHRONOS_validation".to_owned()],
            extra_images: 0,
            fail_on: None,
            next: Cell::new(0x100),
        }
    }
}

impl FakeGpu {
    pub fn with_adapters(adapters: Vec<FakeAdapter>) -> Self {
        FakeGpu {
            adapters,
            ..Default::default()
        }
    }

    pub fn adapter_handle(&self, index: usize) -> vk::PhysicalDevice {
        vk::PhysicalDevice::from_raw(index as u64 + 1)
    }

    fn adapter(&self, adapter: vk::PhysicalDevice) -> VkResult<&FakeAdapter> {
        (adapter.as_raw() as usize)
            .checked_sub(1)
            .and_then(|i| self.adapters.get(i))
            .ok_or(vk::Result::ERROR_INITIALIZATION_FAILED)
    }

    fn check(&self, kind: &str) -> VkResult<()> {
        if self.fail_on == Some(kind) {
            Err(vk::Result::ERROR_INITIALIZATION_FAILED)
        } else {
            Ok(())
        }
    }

    fn handle<H: Handle>(&self) -> H {
        let n = self.next.get();
        self.next.set(n + 1);
        H::from_raw(n)
    }

    fn created(&self, resource: Resource) {
        self.log.borrow_mut().events.push(Event::Created(resource));
    }
}

unsafe fn names(ptrs: *const *const std::ffi::c_char, count: u32) -> Vec<String> {
    if count == 0 {
        return Vec::new();
    }
    unsafe { slice::from_raw_parts(ptrs, count as usize) }
        .iter()
        .map(|&p| unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned())
        .collect()
}

impl Gpu for FakeGpu {
    fn instance_extensions(&self) -> VkResult<Vec<String>> {
        Ok(self.available_extensions.clone())
    }

    fn instance_layers(&self) -> VkResult<Vec<String>> {
        Ok(self.available_layers.clone())
    }

    fn required_surface_extensions(&self) -> VkResult<Vec<&'static CStr>> {
        Ok(vec![ash::khr::surface::NAME])
    }

    fn adapters(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        Ok((0..self.adapters.len())
            .map(|i| self.adapter_handle(i))
            .collect())
    }

    fn adapter_name(&self, adapter: vk::PhysicalDevice) -> String {
        self.adapter(adapter)
            .map(|a| a.name.clone())
            .unwrap_or_default()
    }

    fn device_extensions(&self, adapter: vk::PhysicalDevice) -> VkResult<Vec<String>> {
        Ok(self.adapter(adapter)?.extensions.clone())
    }

    fn queue_families(
        &self,
        adapter: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::QueueFamilyProperties>> {
        Ok(self
            .adapter(adapter)?
            .families
            .iter()
            .map(|&(flags, _)| vk::QueueFamilyProperties {
                queue_flags: flags,
                queue_count: 1,
                ..Default::default()
            })
            .collect())
    }

    fn present_support(
        &self,
        adapter: vk::PhysicalDevice,
        family: u32,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        self.check("present support")?;
        Ok(self
            .adapter(adapter)?
            .families
            .get(family as usize)
            .is_some_and(|&(_, present)| present))
    }

    fn surface_capabilities(
        &self,
        adapter: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        Ok(self.adapter(adapter)?.capabilities)
    }

    fn surface_formats(
        &self,
        adapter: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        Ok(self.adapter(adapter)?.formats.clone())
    }

    fn surface_present_modes(
        &self,
        adapter: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        Ok(self.adapter(adapter)?.present_modes.clone())
    }

    unsafe fn create_instance(&mut self, info: &vk::InstanceCreateInfo<'_>) -> VkResult<()> {
        self.check("instance")?;
        {
            let mut log = self.log.borrow_mut();
            let app = unsafe { &*info.p_application_info };
            log.app_name = Some(
                unsafe { CStr::from_ptr(app.p_application_name) }
                    .to_string_lossy()
                    .into_owned(),
            );
            log.api_version = app.api_version;
            log.instance_extensions = unsafe {
                names(
                    info.pp_enabled_extension_names,
                    info.enabled_extension_count,
                )
            };
            log.instance_layers =
                unsafe { names(info.pp_enabled_layer_names, info.enabled_layer_count) };
        }
        self.created(Resource::Instance);
        Ok(())
    }

    unsafe fn create_debug_messenger(
        &mut self,
        _info: &vk::DebugUtilsMessengerCreateInfoEXT<'_>,
    ) -> VkResult<vk::DebugUtilsMessengerEXT> {
        self.check("debug messenger")?;
        let m = self.handle();
        self.created(Resource::DebugMessenger(m));
        Ok(m)
    }

    unsafe fn create_surface(&mut self) -> VkResult<vk::SurfaceKHR> {
        self.check("surface")?;
        let s = self.handle();
        self.created(Resource::Surface(s));
        Ok(s)
    }

    unsafe fn create_device(
        &mut self,
        adapter: vk::PhysicalDevice,
        info: &vk::DeviceCreateInfo<'_>,
    ) -> VkResult<()> {
        self.adapter(adapter)?;
        self.check("device")?;
        {
            let mut log = self.log.borrow_mut();
            let qinfos = unsafe {
                slice::from_raw_parts(
                    info.p_queue_create_infos,
                    info.queue_create_info_count as usize,
                )
            };
            log.device_queue_families = qinfos.iter().map(|q| q.queue_family_index).collect();
            log.device_extensions = unsafe {
                names(
                    info.pp_enabled_extension_names,
                    info.enabled_extension_count,
                )
            };
        }
        self.created(Resource::Device);
        Ok(())
    }

    unsafe fn device_queue(&self, family: u32, _index: u32) -> vk::Queue {
        vk::Queue::from_raw(0x1000 + family as u64)
    }

    unsafe fn create_swapchain(
        &mut self,
        info: &vk::SwapchainCreateInfoKHR<'_>,
    ) -> VkResult<vk::SwapchainKHR> {
        self.check("swapchain")?;
        let queue_family_indices = if info.queue_family_index_count == 0 {
            Vec::new()
        } else {
            unsafe {
                slice::from_raw_parts(
                    info.p_queue_family_indices,
                    info.queue_family_index_count as usize,
                )
            }
            .to_vec()
        };
        self.log.borrow_mut().swapchain = Some(SwapchainRecord {
            surface: info.surface,
            sharing_mode: info.image_sharing_mode,
            queue_family_indices,
            min_image_count: info.min_image_count,
            format: info.image_format,
            present_mode: info.present_mode,
            extent: info.image_extent,
        });
        let sc = self.handle();
        self.created(Resource::Swapchain(sc));
        Ok(sc)
    }

    unsafe fn swapchain_images(&self, _swapchain: vk::SwapchainKHR) -> VkResult<Vec<vk::Image>> {
        let requested = self
            .log
            .borrow()
            .swapchain
            .as_ref()
            .map_or(0, |s| s.min_image_count);
        Ok((0..requested + self.extra_images)
            .map(|_| self.handle())
            .collect())
    }

    unsafe fn create_image_view(
        &mut self,
        info: &vk::ImageViewCreateInfo<'_>,
    ) -> VkResult<vk::ImageView> {
        self.check("image view")?;
        let c = info.components;
        self.log.borrow_mut().image_views.push(ImageViewRecord {
            view_type: info.view_type,
            format: info.format,
            level_count: info.subresource_range.level_count,
            layer_count: info.subresource_range.layer_count,
            identity_swizzle: [c.r, c.g, c.b, c.a]
                .iter()
                .all(|&s| s == vk::ComponentSwizzle::IDENTITY),
        });
        let v = self.handle();
        self.created(Resource::ImageView(v));
        Ok(v)
    }

    unsafe fn create_render_pass(
        &mut self,
        info: &vk::RenderPassCreateInfo<'_>,
    ) -> VkResult<vk::RenderPass> {
        self.check("render pass")?;
        let att = unsafe { &*info.p_attachments };
        let subpass = unsafe { &*info.p_subpasses };
        self.log.borrow_mut().render_pass = Some(RenderPassRecord {
            format: att.format,
            load_op: att.load_op,
            store_op: att.store_op,
            initial_layout: att.initial_layout,
            final_layout: att.final_layout,
            subpass_count: info.subpass_count,
            color_attachment_count: subpass.color_attachment_count,
        });
        let rp = self.handle();
        self.created(Resource::RenderPass(rp));
        Ok(rp)
    }

    unsafe fn create_shader_module(
        &mut self,
        _info: &vk::ShaderModuleCreateInfo<'_>,
    ) -> VkResult<vk::ShaderModule> {
        self.check("shader module")?;
        let m = self.handle();
        self.created(Resource::ShaderModule(m));
        Ok(m)
    }

    unsafe fn create_pipeline_layout(
        &mut self,
        _info: &vk::PipelineLayoutCreateInfo<'_>,
    ) -> VkResult<vk::PipelineLayout> {
        self.check("pipeline layout")?;
        let l = self.handle();
        self.created(Resource::PipelineLayout(l));
        Ok(l)
    }

    unsafe fn create_graphics_pipeline(
        &mut self,
        info: &vk::GraphicsPipelineCreateInfo<'_>,
    ) -> VkResult<vk::Pipeline> {
        self.check("pipeline")?;
        let ia = unsafe { &*info.p_input_assembly_state };
        let raster = unsafe { &*info.p_rasterization_state };
        let dynamic = unsafe { &*info.p_dynamic_state };
        let dynamic_states = unsafe {
            slice::from_raw_parts(
                dynamic.p_dynamic_states,
                dynamic.dynamic_state_count as usize,
            )
        }
        .to_vec();
        self.log.borrow_mut().pipeline = Some(PipelineRecord {
            stage_count: info.stage_count,
            layout: info.layout,
            render_pass: info.render_pass,
            topology: ia.topology,
            cull_mode: raster.cull_mode,
            front_face: raster.front_face,
            dynamic_states,
            has_depth_stencil: !info.p_depth_stencil_state.is_null(),
        });
        let p = self.handle();
        self.created(Resource::Pipeline(p));
        Ok(p)
    }

    unsafe fn create_framebuffer(
        &mut self,
        info: &vk::FramebufferCreateInfo<'_>,
    ) -> VkResult<vk::Framebuffer> {
        self.check("framebuffer")?;
        self.log.borrow_mut().framebuffers.push(FramebufferRecord {
            render_pass: info.render_pass,
            attachment_count: info.attachment_count,
            attachment: unsafe { *info.p_attachments },
            width: info.width,
            height: info.height,
            layers: info.layers,
        });
        let fb = self.handle();
        self.created(Resource::Framebuffer(fb));
        Ok(fb)
    }

    unsafe fn create_command_pool(
        &mut self,
        info: &vk::CommandPoolCreateInfo<'_>,
    ) -> VkResult<vk::CommandPool> {
        self.check("command pool")?;
        self.log.borrow_mut().command_pool = Some(CommandPoolRecord {
            family: info.queue_family_index,
            flags: info.flags,
            buffers_requested: 0,
            level: vk::CommandBufferLevel::PRIMARY,
        });
        let pool = self.handle();
        self.created(Resource::CommandPool(pool));
        Ok(pool)
    }

    unsafe fn allocate_command_buffers(
        &mut self,
        info: &vk::CommandBufferAllocateInfo<'_>,
    ) -> VkResult<Vec<vk::CommandBuffer>> {
        self.check("command buffer")?;
        if let Some(pool) = self.log.borrow_mut().command_pool.as_mut() {
            pool.buffers_requested = info.command_buffer_count;
            pool.level = info.level;
        }
        Ok((0..info.command_buffer_count)
            .map(|_| self.handle())
            .collect())
    }

    unsafe fn device_wait_idle(&self) -> VkResult<()> {
        self.log.borrow_mut().events.push(Event::WaitIdle);
        Ok(())
    }

    unsafe fn destroy(&mut self, resource: Resource) {
        self.log.borrow_mut().events.push(Event::Destroyed(resource));
    }
}

/// Writes `words` as a little-endian file in the temp dir and returns its path.
pub(crate) fn write_temp(name: &str, words: &[u32]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("vulkek-{}-{}", std::process::id(), name));
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    std::fs::write(&path, bytes).expect("write temp shader");
    path
}

/// A pair of header-only SPIR-V files unique to `tag`.
pub(crate) fn shader_paths(tag: &str) -> ShaderPaths {
    const HEADER: [u32; 5] = [0x0723_0203, 0x0001_0000, 0, 1, 0];
    ShaderPaths {
        vertex: write_temp(&format!("{tag}.vert.spv"), &HEADER),
        fragment: write_temp(&format!("{tag}.frag.spv"), &HEADER),
    }
}
