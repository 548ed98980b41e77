use ash::{prelude::VkResult, vk};

use crate::{
    device::LogicalDevice,
    driver::Driver,
    error::{Error, Result, Stage},
    physical_device::QueueFamilies,
};

/// What a surface supports on one physical device.
#[derive(Debug, Clone)]
pub struct SwapchainSupport {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupport {
    pub fn query<D: Driver>(
        driver: &D,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Self> {
        Ok(Self {
            capabilities: driver.surface_capabilities(physical_device, surface)?,
            formats: driver.surface_formats(physical_device, surface)?,
            present_modes: driver.present_modes(physical_device, surface)?,
        })
    }

    pub fn is_complete(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Format and present mode to ask for when the surface offers them.
#[derive(Debug, Clone, Copy)]
pub struct SwapchainPreferences {
    pub surface_format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
}

impl Default for SwapchainPreferences {
    fn default() -> Self {
        Self {
            surface_format: vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            present_mode: vk::PresentModeKHR::MAILBOX,
        }
    }
}

/// How swapchain images are shared between the queue families using them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSharing {
    Exclusive,
    Concurrent([u32; 2]),
}

impl ImageSharing {
    pub fn new(queue_families: QueueFamilies) -> Self {
        if queue_families.is_shared() {
            ImageSharing::Exclusive
        } else {
            ImageSharing::Concurrent([queue_families.graphics, queue_families.present])
        }
    }

    pub fn mode(&self) -> vk::SharingMode {
        match self {
            ImageSharing::Exclusive => vk::SharingMode::EXCLUSIVE,
            ImageSharing::Concurrent(_) => vk::SharingMode::CONCURRENT,
        }
    }

    pub fn queue_family_indices(&self) -> &[u32] {
        match self {
            ImageSharing::Exclusive => &[],
            ImageSharing::Concurrent(families) => families,
        }
    }
}

pub fn choose_surface_format(
    available: &[vk::SurfaceFormatKHR],
    preferred: vk::SurfaceFormatKHR,
) -> Option<vk::SurfaceFormatKHR> {
    available
        .iter()
        .find(|surface_format| {
            surface_format.format == preferred.format
                && surface_format.color_space == preferred.color_space
        })
        .or_else(|| available.first())
        .copied()
}

/// FIFO is always available, whether or not the driver lists it.
pub fn choose_present_mode(
    available: &[vk::PresentModeKHR],
    preferred: vk::PresentModeKHR,
) -> vk::PresentModeKHR {
    available
        .iter()
        .copied()
        .find(|present_mode| *present_mode == preferred)
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// One more than the minimum, capped by a non-zero maximum.
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let image_count = capabilities.min_image_count.saturating_add(1);
    if capabilities.max_image_count > 0 {
        image_count.min(capabilities.max_image_count)
    } else {
        image_count
    }
}

/// Everything needed to create a swapchain, decided up front.
#[derive(Debug, Clone)]
pub struct SwapchainConfig {
    pub surface: vk::SurfaceKHR,
    pub surface_format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
    pub sharing: ImageSharing,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

impl SwapchainConfig {
    /// Returns `None` when the surface offers no format at all.
    pub fn negotiate(
        support: &SwapchainSupport,
        surface: vk::SurfaceKHR,
        queue_families: QueueFamilies,
        width: u32,
        height: u32,
        preferences: &SwapchainPreferences,
    ) -> Option<Self> {
        let surface_format = choose_surface_format(&support.formats, preferences.surface_format)?;
        Some(Self {
            surface,
            surface_format,
            present_mode: choose_present_mode(&support.present_modes, preferences.present_mode),
            extent: vk::Extent2D { width, height },
            image_count: choose_image_count(&support.capabilities),
            sharing: ImageSharing::new(queue_families),
            pre_transform: support.capabilities.current_transform,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Swapchain {
    pub handle: vk::SwapchainKHR,
    pub surface_format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub sharing: ImageSharing,
    pub images: Vec<vk::Image>,
    pub image_views: Vec<vk::ImageView>,
}

impl Swapchain {
    /// Queries the surface afresh and builds a new swapchain for it. Calling
    /// this again after the surface changed yields the replacement.
    pub fn new<D: Driver>(
        driver: &D,
        device: &LogicalDevice<D>,
        surface: vk::SurfaceKHR,
        width: u32,
        height: u32,
        preferences: &SwapchainPreferences,
    ) -> Result<Self> {
        let support = SwapchainSupport::query(driver, device.physical_device.handle, surface)
            .map_err(Error::query(Stage::Swapchain))?;
        if !support.is_complete() {
            return Err(Error::PresentationUnsupported);
        }
        let config = SwapchainConfig::negotiate(
            &support,
            surface,
            device.queue_families,
            width,
            height,
            preferences,
        )
        .ok_or(Error::PresentationUnsupported)?;

        let handle = driver
            .create_swapchain(&device.handle, &config)
            .map_err(Error::creation(Stage::Swapchain))?;

        // The driver may hand out more images than requested.
        let images = match driver.swapchain_images(&device.handle, handle) {
            Ok(images) => images,
            Err(result) => {
                driver.destroy_swapchain(&device.handle, handle);
                return Err(Error::query(Stage::Swapchain)(result));
            }
        };

        let mut image_views = Vec::with_capacity(images.len());
        for &image in &images {
            match driver.create_image_view(&device.handle, image, config.surface_format.format) {
                Ok(image_view) => image_views.push(image_view),
                Err(result) => {
                    for image_view in image_views {
                        driver.destroy_image_view(&device.handle, image_view);
                    }
                    driver.destroy_swapchain(&device.handle, handle);
                    return Err(Error::creation(Stage::ImageViews)(result));
                }
            }
        }

        tracing::info!(
            format = ?config.surface_format.format,
            color_space = ?config.surface_format.color_space,
            present_mode = ?config.present_mode,
            width,
            height,
            requested_images = config.image_count,
            images = images.len(),
            sharing = ?config.sharing,
            "Created swapchain"
        );

        Ok(Self {
            handle,
            surface_format: config.surface_format,
            present_mode: config.present_mode,
            extent: config.extent,
            sharing: config.sharing,
            images,
            image_views,
        })
    }

    /// Destroys the image views, then the swapchain. The device must be idle.
    pub fn destroy<D: Driver>(&self, driver: &D, device: &D::Device) {
        for &image_view in &self.image_views {
            driver.destroy_image_view(device, image_view);
        }
        driver.destroy_swapchain(device, self.handle);
    }
}
