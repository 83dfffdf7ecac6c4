// SPDX-License-Identifier: CEPL-1.0
use std::io;
use std::path::PathBuf;

use ash::vk;
use thiserror::Error;
use vulkek_core::AssetError;

use crate::lifecycle::LifecycleState;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("requested validation layer {0} is not available")]
    ValidationLayerMissing(String),

    #[error("required extension {0} is not available")]
    MissingExtension(String),

    #[error("window handle unavailable: {0}")]
    WindowHandle(String),

    #[error("no adapter can present to this surface")]
    NoViableAdapter,

    #[error("adapter {adapter} is not viable: {reason}")]
    UnsupportedAdapter {
        adapter: String,
        reason: &'static str,
    },

    #[error("capability query {what} failed: {result}")]
    Probe { what: &'static str, result: vk::Result },

    #[error("failed to create {what}: {result}")]
    Creation { what: &'static str, result: vk::Result },

    #[error("device creation rejected: {0}")]
    DeviceCreation(vk::Result),

    #[error("pipeline creation failed at {stage}: {result}")]
    PipelineCreation {
        stage: &'static str,
        result: vk::Result,
    },

    #[error("invalid SPIR-V in {}: {source}", path.display())]
    ShaderBytecode {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("cannot enter {attempted:?} from {current:?}")]
    OutOfOrder {
        current: LifecycleState,
        attempted: LifecycleState,
    },
}

impl BootstrapError {
    pub(crate) fn probe(what: &'static str) -> impl FnOnce(vk::Result) -> Self {
        move |result| BootstrapError::Probe { what, result }
    }

    pub(crate) fn creation(what: &'static str) -> impl FnOnce(vk::Result) -> Self {
        move |result| BootstrapError::Creation { what, result }
    }

    pub(crate) fn pipeline(stage: &'static str) -> impl FnOnce(vk::Result) -> Self {
        move |result| BootstrapError::PipelineCreation { stage, result }
    }
}
