// SPDX-License-Identifier: CEPL-1.0
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};
use vulkek_platform::WindowSpec;
use vulkek_vk::config::KHRONOS_VALIDATION;
use vulkek_vk::{BootstrapConfig, ShaderPaths, ValidationConfig};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WindowCfg {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ShaderCfg {
    pub vertex: Option<PathBuf>,
    pub fragment: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ValidationCfg {
    /// Unset means on for debug builds, off for release.
    pub enabled: Option<bool>,
    pub layers: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppCfg {
    pub window: WindowCfg,
    pub app: AppSection,
    pub shaders: ShaderCfg,
    pub validation: ValidationCfg,
}

impl Default for WindowCfg {
    fn default() -> Self {
        let spec = WindowSpec::default();
        WindowCfg {
            width: spec.width,
            height: spec.height,
            title: spec.title,
        }
    }
}

impl Default for AppSection {
    fn default() -> Self {
        AppSection {
            name: BootstrapConfig::default().app_name,
        }
    }
}

impl Default for ValidationCfg {
    fn default() -> Self {
        ValidationCfg {
            enabled: None,
            layers: vec![KHRONOS_VALIDATION.to_owned()],
        }
    }
}

impl AppCfg {
    pub fn window_spec(&self) -> WindowSpec {
        WindowSpec {
            width: self.window.width.max(1),
            height: self.window.height.max(1),
            title: self.window.title.clone(),
        }
    }

    pub fn bootstrap(&self) -> BootstrapConfig {
        let defaults = BootstrapConfig::default();
        let shader_defaults = ShaderPaths::default();
        BootstrapConfig {
            app_name: self.app.name.clone(),
            validation: ValidationConfig {
                enabled: self
                    .validation
                    .enabled
                    .unwrap_or(defaults.validation.enabled),
                layers: self.validation.layers.clone(),
            },
            shaders: ShaderPaths {
                vertex: self
                    .shaders
                    .vertex
                    .clone()
                    .unwrap_or(shader_defaults.vertex),
                fragment: self
                    .shaders
                    .fragment
                    .clone()
                    .unwrap_or(shader_defaults.fragment),
            },
            ..defaults
        }
    }
}

pub fn parse_cfg(text: &str) -> Result<AppCfg, toml::de::Error> {
    toml::from_str(text)
}

/// Missing file gives defaults silently; a file that does not parse gives
/// defaults with a warning.
pub fn load_cfg(path: &Path) -> AppCfg {
    match fs::read_to_string(path) {
        Ok(s) => parse_cfg(&s).unwrap_or_else(|e| {
            warn!("ignoring {}: {e}", path.display());
            AppCfg::default()
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("no {}, using defaults", path.display());
            AppCfg::default()
        }
        Err(e) => {
            warn!("cannot read {}: {e}", path.display());
            AppCfg::default()
        }
    }
}
