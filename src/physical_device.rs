use std::{cmp::Reverse, collections::HashSet, ffi::CString};

use ash::vk;

use crate::{
    driver::Driver,
    error::{Error, Rejection, Result, Stage},
    swapchain::SwapchainSupport,
};

/// Score bonus for discrete GPUs over integrated, virtual and CPU devices.
pub const DISCRETE_GPU_BONUS: u64 = 1000;

#[derive(Debug, Clone, Copy)]
pub struct QueueFamily {
    pub index: u32,
    pub properties: vk::QueueFamilyProperties,
}

/// A candidate device and everything queried about it up front.
#[derive(Debug, Clone)]
pub struct PhysicalDevice {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub properties: vk::PhysicalDeviceProperties,
    pub features: vk::PhysicalDeviceFeatures,
    pub queue_families: Vec<QueueFamily>,
}

impl PhysicalDevice {
    pub fn query<D: Driver>(driver: &D, handle: vk::PhysicalDevice) -> Self {
        let properties = driver.properties(handle);
        let name = properties
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let queue_families = driver
            .queue_families(handle)
            .into_iter()
            .enumerate()
            .map(|(index, properties)| QueueFamily {
                index: index as u32,
                properties,
            })
            .collect();
        Self {
            handle,
            name,
            properties,
            features: driver.features(handle),
            queue_families,
        }
    }

    pub fn is_discrete(&self) -> bool {
        self.properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU
    }
}

/// How the present family is picked when several families can present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PresentPolicy {
    /// The first family able to present to the surface.
    #[default]
    FirstSupported,
    /// A presenting family other than the graphics family when one exists,
    /// falling back to the graphics family.
    PreferSeparate,
}

/// Queue family indices as found on one device for one surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    /// Scans every family of `device` once, in driver order.
    pub fn resolve<D: Driver>(
        driver: &D,
        device: &PhysicalDevice,
        surface: vk::SurfaceKHR,
        policy: PresentPolicy,
    ) -> ash::prelude::VkResult<Self> {
        let mut indices = Self::default();
        for family in &device.queue_families {
            if indices.graphics.is_none()
                && family
                    .properties
                    .queue_flags
                    .contains(vk::QueueFlags::GRAPHICS)
            {
                indices.graphics = Some(family.index);
            }

            let open = match policy {
                PresentPolicy::FirstSupported => indices.present.is_none(),
                PresentPolicy::PreferSeparate => {
                    indices.present.is_none() || indices.present == indices.graphics
                }
            };
            if open && driver.surface_support(device.handle, family.index, surface)? {
                indices.present = Some(family.index);
            }
        }
        Ok(indices)
    }

    pub fn complete(&self) -> Option<QueueFamilies> {
        Some(QueueFamilies {
            graphics: self.graphics?,
            present: self.present?,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.complete().is_some()
    }
}

/// Resolved graphics and present families of a usable device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilies {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilies {
    /// Whether one family serves both graphics and presentation.
    pub fn is_shared(&self) -> bool {
        self.graphics == self.present
    }

    /// The families needing a queue, graphics first, without duplicates.
    pub fn distinct(&self) -> Vec<u32> {
        if self.is_shared() {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }
}

/// Outcome of a device that passed every gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rating {
    pub score: u64,
    pub queue_families: QueueFamilies,
}

/// Runs the suitability gates in order, stopping at the first rejection.
pub fn rate<D: Driver>(
    driver: &D,
    device: &PhysicalDevice,
    surface: vk::SurfaceKHR,
    required_extensions: &[CString],
    policy: PresentPolicy,
) -> std::result::Result<Rating, Rejection> {
    let queue_families = QueueFamilyIndices::resolve(driver, device, surface, policy)?
        .complete()
        .ok_or(Rejection::IncompleteQueueSupport)?;

    check_extensions(driver, device.handle, required_extensions)?;

    if !SwapchainSupport::query(driver, device.handle, surface)?.is_complete() {
        return Err(Rejection::PresentationUnsupported);
    }

    let mut score = 0;
    if device.is_discrete() {
        score += DISCRETE_GPU_BONUS;
    }
    score += u64::from(device.properties.limits.max_image_dimension2_d);

    if device.features.geometry_shader == vk::FALSE {
        return Err(Rejection::MissingFeature("geometryShader"));
    }
    if score == 0 {
        return Err(Rejection::ZeroScore);
    }

    tracing::debug!(
        name = %device.name,
        discrete = device.is_discrete(),
        max_image_dimension_2d = device.properties.limits.max_image_dimension2_d,
        graphics = queue_families.graphics,
        present = queue_families.present,
        score,
        "Rated physical device"
    );

    Ok(Rating {
        score,
        queue_families,
    })
}

/// [`rate`] collapsed to a plain score, `0` meaning unusable.
pub fn score<D: Driver>(
    driver: &D,
    device: &PhysicalDevice,
    surface: vk::SurfaceKHR,
    required_extensions: &[CString],
    policy: PresentPolicy,
) -> u64 {
    rate(driver, device, surface, required_extensions, policy).map_or(0, |rating| rating.score)
}

fn check_extensions<D: Driver>(
    driver: &D,
    physical_device: vk::PhysicalDevice,
    required: &[CString],
) -> std::result::Result<(), Rejection> {
    let available = driver.device_extensions(physical_device)?;
    let supported: HashSet<_> = available
        .iter()
        .filter_map(|extension| extension.extension_name_as_c_str().ok())
        .collect();
    match required
        .iter()
        .find(|name| !supported.contains(name.as_c_str()))
    {
        Some(missing) => Err(Rejection::MissingExtension(
            missing.to_string_lossy().into_owned(),
        )),
        None => Ok(()),
    }
}

#[derive(Debug, Clone)]
pub struct RatedDevice {
    pub device: PhysicalDevice,
    pub outcome: std::result::Result<Rating, Rejection>,
}

impl RatedDevice {
    pub fn score(&self) -> u64 {
        self.outcome.as_ref().map_or(0, |rating| rating.score)
    }
}

/// Rates every enumerated device, best first. Equal scores keep enumeration
/// order.
pub fn rank<D: Driver>(
    driver: &D,
    surface: vk::SurfaceKHR,
    required_extensions: &[CString],
    policy: PresentPolicy,
) -> Result<Vec<RatedDevice>> {
    let handles = driver
        .physical_devices()
        .map_err(Error::query(Stage::PhysicalDevice))?;
    if handles.is_empty() {
        return Err(Error::NoCompatibleHardware);
    }

    let mut rated: Vec<RatedDevice> = handles
        .into_iter()
        .map(|handle| {
            let device = PhysicalDevice::query(driver, handle);
            let outcome = rate(driver, &device, surface, required_extensions, policy);
            if let Err(reason) = &outcome {
                tracing::warn!(name = %device.name, %reason, "Rejected physical device");
            }
            RatedDevice { device, outcome }
        })
        .collect();
    rated.sort_by_key(|rated| Reverse(rated.score()));
    Ok(rated)
}

/// The device chosen to back the logical device.
#[derive(Debug, Clone)]
pub struct SelectedDevice {
    pub device: PhysicalDevice,
    pub score: u64,
    pub queue_families: QueueFamilies,
}

/// Picks the best-scoring device, failing if none passes every gate. Every
/// enumerated device is either selected or listed in the error.
pub fn select<D: Driver>(
    driver: &D,
    surface: vk::SurfaceKHR,
    required_extensions: &[CString],
    policy: PresentPolicy,
) -> Result<SelectedDevice> {
    let mut rated = rank(driver, surface, required_extensions, policy)?;

    let best = rated
        .first()
        .and_then(|rated| rated.outcome.as_ref().ok().copied());
    if let Some(rating) = best {
        let device = rated.swap_remove(0).device;
        tracing::info!(
            name = %device.name,
            score = rating.score,
            "Selected physical device"
        );
        return Ok(SelectedDevice {
            device,
            score: rating.score,
            queue_families: rating.queue_families,
        });
    }

    let rejected = rated
        .into_iter()
        .filter_map(|rated| rated.outcome.err().map(|reason| (rated.device.name, reason)))
        .collect();
    Err(Error::NoSuitableDevice { rejected })
}
