//! Error types for the bring-up sequence.

use std::fmt;

use ash::vk;
use thiserror::Error;

/// Step of the bring-up sequence at which a terminal error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Loader,
    ValidationLayers,
    Instance,
    Surface,
    PhysicalDevice,
    LogicalDevice,
    Swapchain,
    ImageViews,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Loader => "loader",
            Stage::ValidationLayers => "validation layers",
            Stage::Instance => "instance",
            Stage::Surface => "surface",
            Stage::PhysicalDevice => "physical device",
            Stage::LogicalDevice => "logical device",
            Stage::Swapchain => "swapchain",
            Stage::ImageViews => "image views",
        };
        f.write_str(name)
    }
}

/// Why a single physical device was passed over during selection.
///
/// Rejections never abort the sequence on their own; they only become an
/// [`Error::NoSuitableDevice`] when every candidate is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("no queue family supports graphics, or none can present to the surface")]
    IncompleteQueueSupport,

    #[error("required device extension {0} is not supported")]
    MissingExtension(String),

    #[error("surface reports no formats or no present modes")]
    PresentationUnsupported,

    #[error("required feature {0} is not supported")]
    MissingFeature(&'static str),

    #[error("capability query failed: {0}")]
    Query(vk::Result),

    #[error("device passed every check but scored zero")]
    ZeroScore,
}

impl From<vk::Result> for Rejection {
    fn from(result: vk::Result) -> Self {
        Rejection::Query(result)
    }
}

/// Terminal failures of the bring-up sequence.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to load the Vulkan library: {0}")]
    Loading(#[from] ash::LoadingError),

    #[error("configured name contains an interior nul byte: {0}")]
    InvalidName(#[from] std::ffi::NulError),

    #[error("window handle unavailable: {0}")]
    Window(#[from] raw_window_handle::HandleError),

    #[error("{stage} query failed: {result}")]
    Query { stage: Stage, result: vk::Result },

    #[error("no physical devices with Vulkan support")]
    NoCompatibleHardware,

    #[error("failed to find a suitable GPU among {} candidates", .rejected.len())]
    NoSuitableDevice { rejected: Vec<(String, Rejection)> },

    #[error("{stage} creation failed: {result}")]
    Creation { stage: Stage, result: vk::Result },

    #[error("surface no longer reports any formats or present modes")]
    PresentationUnsupported,
}

impl Error {
    pub(crate) fn query(stage: Stage) -> impl FnOnce(vk::Result) -> Self {
        move |result| Error::Query { stage, result }
    }

    pub(crate) fn creation(stage: Stage) -> impl FnOnce(vk::Result) -> Self {
        move |result| Error::Creation { stage, result }
    }

    /// The step of the sequence that failed.
    pub fn stage(&self) -> Stage {
        match self {
            Error::Loading(_) => Stage::Loader,
            Error::InvalidName(_) => Stage::Instance,
            Error::Window(_) => Stage::Surface,
            Error::Query { stage, .. } | Error::Creation { stage, .. } => *stage,
            Error::NoCompatibleHardware | Error::NoSuitableDevice { .. } => Stage::PhysicalDevice,
            Error::PresentationUnsupported => Stage::Swapchain,
        }
    }

    /// Every failure reflects host hardware or driver state, so repeating the
    /// identical request is not expected to succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
