// SPDX-License-Identifier: CEPL-1.0
use std::ffi::CString;
use std::path::PathBuf;

use ash::vk;

pub const DEFAULT_VERTEX_SHADER: &str = concat!(env!("OUT_DIR"), "/tri.vert.spv");
pub const DEFAULT_FRAGMENT_SHADER: &str = concat!(env!("OUT_DIR"), "/tri.frag.spv");
pub const KHRONOS_VALIDATION: &str = "VK_LAYER_KHRONOS_validation";

/// Everything the bootstrap needs to know up front. Built once, read-only.
#[derive(Clone, Debug)]
pub struct BootstrapConfig {
    pub app_name: String,
    pub engine_name: String,
    pub api_version: u32,
    pub validation: ValidationConfig,
    pub shaders: ShaderPaths,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationConfig {
    pub enabled: bool,
    pub layers: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        BootstrapConfig {
            app_name: "Vulkek Demo".to_owned(),
            engine_name: "No Engine".to_owned(),
            api_version: vk::API_VERSION_1_3,
            validation: ValidationConfig::default(),
            shaders: ShaderPaths::default(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        ValidationConfig {
            enabled: cfg!(debug_assertions),
            layers: vec![KHRONOS_VALIDATION.to_owned()],
        }
    }
}

impl Default for ShaderPaths {
    fn default() -> Self {
        ShaderPaths {
            vertex: PathBuf::from(DEFAULT_VERTEX_SHADER),
            fragment: PathBuf::from(DEFAULT_FRAGMENT_SHADER),
        }
    }
}

impl ValidationConfig {
    pub fn disabled() -> Self {
        ValidationConfig {
            enabled: false,
            layers: Vec::new(),
        }
    }

    /// Layer names to enable, empty when validation is off. Names with an
    /// interior NUL cannot be passed to the driver and are dropped.
    pub fn active_layers(&self) -> Vec<CString> {
        if !self.enabled {
            return Vec::new();
        }
        self.layers
            .iter()
            .filter_map(|l| CString::new(l.as_str()).ok())
            .collect()
    }
}
