// SPDX-License-Identifier: CEPL-1.0
use std::ffi::CStr;
use std::io::Cursor;
use std::path::Path;

use ash::util::read_spv;
use ash::vk;
use tracing::{debug, info};

use crate::config::ShaderPaths;
use crate::error::BootstrapError;
use crate::gpu::{Gpu, Resource, ResourceStack};

const SHADER_ENTRY: &CStr = c"main";

/// Viewport and scissor are set at record time, so a new extent never needs a
/// new pipeline.
pub const DYNAMIC_STATES: [vk::DynamicState; 2] =
    [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphicsPipeline {
    pub render_pass: vk::RenderPass,
    pub layout: vk::PipelineLayout,
    pub pipeline: vk::Pipeline,
}

/// Reads a SPIR-V binary and checks its header and alignment.
pub fn load_spirv(path: &Path) -> Result<Vec<u32>, BootstrapError> {
    let bytes = vulkek_core::read_binary(path)?;
    read_spv(&mut Cursor::new(&bytes[..])).map_err(|source| BootstrapError::ShaderBytecode {
        path: path.to_path_buf(),
        source,
    })
}

fn input_assembly_state() -> vk::PipelineInputAssemblyStateCreateInfo<'static> {
    vk::PipelineInputAssemblyStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_INPUT_ASSEMBLY_STATE_CREATE_INFO,
        topology: vk::PrimitiveTopology::TRIANGLE_LIST,
        primitive_restart_enable: vk::FALSE,
        ..Default::default()
    }
}

fn rasterization_state() -> vk::PipelineRasterizationStateCreateInfo<'static> {
    vk::PipelineRasterizationStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_RASTERIZATION_STATE_CREATE_INFO,
        depth_clamp_enable: vk::FALSE,
        rasterizer_discard_enable: vk::FALSE,
        polygon_mode: vk::PolygonMode::FILL,
        cull_mode: vk::CullModeFlags::BACK,
        front_face: vk::FrontFace::CLOCKWISE,
        depth_bias_enable: vk::FALSE,
        line_width: 1.0,
        ..Default::default()
    }
}

fn multisample_state() -> vk::PipelineMultisampleStateCreateInfo<'static> {
    vk::PipelineMultisampleStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_MULTISAMPLE_STATE_CREATE_INFO,
        rasterization_samples: vk::SampleCountFlags::TYPE_1,
        sample_shading_enable: vk::FALSE,
        min_sample_shading: 1.0,
        ..Default::default()
    }
}

// Blending off: fragment output replaces the attachment contents.
fn color_blend_attachment() -> vk::PipelineColorBlendAttachmentState {
    vk::PipelineColorBlendAttachmentState {
        blend_enable: vk::FALSE,
        src_color_blend_factor: vk::BlendFactor::ONE,
        dst_color_blend_factor: vk::BlendFactor::ZERO,
        color_blend_op: vk::BlendOp::ADD,
        src_alpha_blend_factor: vk::BlendFactor::ONE,
        dst_alpha_blend_factor: vk::BlendFactor::ZERO,
        alpha_blend_op: vk::BlendOp::ADD,
        color_write_mask: vk::ColorComponentFlags::R
            | vk::ColorComponentFlags::G
            | vk::ColorComponentFlags::B
            | vk::ColorComponentFlags::A,
    }
}

/// Single color attachment cleared on load and stored for presentation.
unsafe fn create_render_pass<G: Gpu + ?Sized>(
    gpu: &mut G,
    owned: &mut ResourceStack,
    format: vk::Format,
) -> Result<vk::RenderPass, BootstrapError> {
    let color_att = vk::AttachmentDescription {
        format,
        samples: vk::SampleCountFlags::TYPE_1,
        load_op: vk::AttachmentLoadOp::CLEAR,
        store_op: vk::AttachmentStoreOp::STORE,
        stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
        stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
        initial_layout: vk::ImageLayout::UNDEFINED,
        final_layout: vk::ImageLayout::PRESENT_SRC_KHR,
        ..Default::default()
    };
    let att_ref = vk::AttachmentReference {
        attachment: 0,
        layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
    };
    let subpass = vk::SubpassDescription {
        pipeline_bind_point: vk::PipelineBindPoint::GRAPHICS,
        color_attachment_count: 1,
        p_color_attachments: &att_ref,
        ..Default::default()
    };
    let rp_info = vk::RenderPassCreateInfo {
        s_type: vk::StructureType::RENDER_PASS_CREATE_INFO,
        attachment_count: 1,
        p_attachments: &color_att,
        subpass_count: 1,
        p_subpasses: &subpass,
        ..Default::default()
    };

    let render_pass = unsafe { gpu.create_render_pass(&rp_info) }
        .map_err(BootstrapError::pipeline("render pass"))?;
    owned.push(Resource::RenderPass(render_pass));
    Ok(render_pass)
}

unsafe fn create_shader_module<G: Gpu + ?Sized>(
    gpu: &mut G,
    owned: &mut ResourceStack,
    code: &[u32],
) -> Result<vk::ShaderModule, BootstrapError> {
    let info = vk::ShaderModuleCreateInfo {
        s_type: vk::StructureType::SHADER_MODULE_CREATE_INFO,
        code_size: std::mem::size_of_val(code),
        p_code: code.as_ptr(),
        ..Default::default()
    };
    let module = unsafe { gpu.create_shader_module(&info) }
        .map_err(BootstrapError::pipeline("shader module"))?;
    owned.push(Resource::ShaderModule(module));
    Ok(module)
}

/// Builds the render pass, layout and pipeline for `format`. Both shader
/// modules are destroyed as soon as the pipeline exists.
pub unsafe fn assemble<G: Gpu + ?Sized>(
    gpu: &mut G,
    owned: &mut ResourceStack,
    shaders: &ShaderPaths,
    format: vk::Format,
    extent: vk::Extent2D,
) -> Result<GraphicsPipeline, BootstrapError> {
    let vs_code = load_spirv(&shaders.vertex)?;
    let fs_code = load_spirv(&shaders.fragment)?;
    debug!(
        "shaders loaded: {} ({} words), {} ({} words)",
        shaders.vertex.display(),
        vs_code.len(),
        shaders.fragment.display(),
        fs_code.len()
    );

    let render_pass = unsafe { create_render_pass(gpu, owned, format) }?;
    let vs = unsafe { create_shader_module(gpu, owned, &vs_code) }?;
    let fs = unsafe { create_shader_module(gpu, owned, &fs_code) }?;

    let stages = [
        vk::PipelineShaderStageCreateInfo {
            s_type: vk::StructureType::PIPELINE_SHADER_STAGE_CREATE_INFO,
            stage: vk::ShaderStageFlags::VERTEX,
            module: vs,
            p_name: SHADER_ENTRY.as_ptr(),
            ..Default::default()
        },
        vk::PipelineShaderStageCreateInfo {
            s_type: vk::StructureType::PIPELINE_SHADER_STAGE_CREATE_INFO,
            stage: vk::ShaderStageFlags::FRAGMENT,
            module: fs,
            p_name: SHADER_ENTRY.as_ptr(),
            ..Default::default()
        },
    ];

    // Geometry comes from the vertex shader itself.
    let vertex_input = vk::PipelineVertexInputStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_VERTEX_INPUT_STATE_CREATE_INFO,
        ..Default::default()
    };
    let input_assembly = input_assembly_state();
    let dynamic_state = vk::PipelineDynamicStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_DYNAMIC_STATE_CREATE_INFO,
        dynamic_state_count: DYNAMIC_STATES.len() as u32,
        p_dynamic_states: DYNAMIC_STATES.as_ptr(),
        ..Default::default()
    };
    let viewport_state = vk::PipelineViewportStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_VIEWPORT_STATE_CREATE_INFO,
        viewport_count: 1,
        p_viewports: std::ptr::null(), // dynamic
        scissor_count: 1,
        p_scissors: std::ptr::null(), // dynamic
        ..Default::default()
    };
    let raster = rasterization_state();
    let multisample = multisample_state();
    let color_blend_att = color_blend_attachment();
    let color_blend = vk::PipelineColorBlendStateCreateInfo {
        s_type: vk::StructureType::PIPELINE_COLOR_BLEND_STATE_CREATE_INFO,
        logic_op_enable: vk::FALSE,
        logic_op: vk::LogicOp::COPY,
        attachment_count: 1,
        p_attachments: &color_blend_att,
        ..Default::default()
    };

    // No descriptors or push constants.
    let layout_info = vk::PipelineLayoutCreateInfo {
        s_type: vk::StructureType::PIPELINE_LAYOUT_CREATE_INFO,
        ..Default::default()
    };
    let layout = unsafe { gpu.create_pipeline_layout(&layout_info) }
        .map_err(BootstrapError::pipeline("pipeline layout"))?;
    owned.push(Resource::PipelineLayout(layout));

    let pipeline_info = vk::GraphicsPipelineCreateInfo {
        s_type: vk::StructureType::GRAPHICS_PIPELINE_CREATE_INFO,
        stage_count: stages.len() as u32,
        p_stages: stages.as_ptr(),
        p_vertex_input_state: &vertex_input,
        p_input_assembly_state: &input_assembly,
        p_viewport_state: &viewport_state,
        p_rasterization_state: &raster,
        p_multisample_state: &multisample,
        p_depth_stencil_state: std::ptr::null(),
        p_color_blend_state: &color_blend,
        p_dynamic_state: &dynamic_state,
        layout,
        render_pass,
        subpass: 0,
        ..Default::default()
    };

    let pipeline = unsafe { gpu.create_graphics_pipeline(&pipeline_info) }
        .map_err(BootstrapError::pipeline("graphics pipeline"))?;
    owned.push(Resource::Pipeline(pipeline));

    unsafe {
        owned.release(gpu, Resource::ShaderModule(vs));
        owned.release(gpu, Resource::ShaderModule(fs));
    }

    info!(
        "graphics pipeline ready ({:?}, {}x{})",
        format, extent.width, extent.height
    );
    Ok(GraphicsPipeline {
        render_pass,
        layout,
        pipeline,
    })
}
