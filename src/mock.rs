//! Scriptable in-memory driver for unit tests.

use std::{
    cell::{Cell, RefCell},
    ffi::{c_char, CStr},
};

use ash::{
    prelude::VkResult,
    vk::{self, Handle},
};

use crate::{device::DeviceRequest, driver::Driver, swapchain::SwapchainConfig};

pub(crate) fn surface() -> vk::SurfaceKHR {
    vk::SurfaceKHR::from_raw(0x5f)
}

fn write_name(destination: &mut [c_char], name: &[u8]) {
    for (slot, &byte) in destination.iter_mut().zip(name) {
        *slot = byte as c_char;
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MockDevice {
    pub name: &'static str,
    pub device_type: vk::PhysicalDeviceType,
    pub max_image_dimension_2d: u32,
    pub geometry_shader: bool,
    /// Capability flags and surface support, per family.
    pub families: Vec<(vk::QueueFlags, bool)>,
    pub extensions: Vec<&'static CStr>,
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
    pub surface_failure: Option<vk::Result>,
    pub extension_failure: Option<vk::Result>,
}

impl MockDevice {
    /// An integrated GPU passing every gate with a single combined family.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            device_type: vk::PhysicalDeviceType::INTEGRATED_GPU,
            max_image_dimension_2d: 4096,
            geometry_shader: true,
            families: vec![(
                vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
                true,
            )],
            extensions: vec![ash::khr::swapchain::NAME],
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 8,
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                ..Default::default()
            },
            formats: vec![vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }],
            present_modes: vec![vk::PresentModeKHR::FIFO],
            surface_failure: None,
            extension_failure: None,
        }
    }

    pub fn discrete(mut self) -> Self {
        self.device_type = vk::PhysicalDeviceType::DISCRETE_GPU;
        self
    }

    pub fn max_dimension(mut self, max_image_dimension_2d: u32) -> Self {
        self.max_image_dimension_2d = max_image_dimension_2d;
        self
    }

    pub fn without_geometry_shader(mut self) -> Self {
        self.geometry_shader = false;
        self
    }

    pub fn families(mut self, families: &[(vk::QueueFlags, bool)]) -> Self {
        self.families = families.to_vec();
        self
    }

    pub fn extensions(mut self, extensions: Vec<&'static CStr>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn formats(mut self, formats: Vec<vk::SurfaceFormatKHR>) -> Self {
        self.formats = formats;
        self
    }

    pub fn present_modes(mut self, present_modes: Vec<vk::PresentModeKHR>) -> Self {
        self.present_modes = present_modes;
        self
    }

    pub fn image_counts(mut self, min: u32, max: u32) -> Self {
        self.capabilities.min_image_count = min;
        self.capabilities.max_image_count = max;
        self
    }

    /// Every surface and extension query on this device fails with `result`.
    pub fn failing_queries(mut self, result: vk::Result) -> Self {
        self.surface_failure = Some(result);
        self.extension_failure = Some(result);
        self
    }

    pub fn failing_extension_query(mut self, result: vk::Result) -> Self {
        self.extension_failure = Some(result);
        self
    }
}

#[derive(Debug)]
pub(crate) struct MockLogicalDevice {
    pub physical_device: vk::PhysicalDevice,
    pub request: DeviceRequest,
}

#[derive(Debug, Default)]
pub(crate) struct MockDriver {
    pub devices: Vec<MockDevice>,
    pub fail_device: Option<vk::Result>,
    pub fail_swapchain: Option<vk::Result>,
    pub fail_images: Option<vk::Result>,
    /// Image view creation fails once this many views exist.
    pub fail_view_after: Option<usize>,
    /// Number of images handed out regardless of the requested count.
    pub granted_images: Option<u32>,
    pub swapchains: RefCell<Vec<SwapchainConfig>>,
    pub views: RefCell<Vec<vk::ImageView>>,
    pub destroyed_views: RefCell<Vec<vk::ImageView>>,
    pub destroyed_swapchains: RefCell<Vec<vk::SwapchainKHR>>,
    /// Surface capability, format and present mode queries issued so far.
    pub surface_queries: Cell<usize>,
}

impl MockDriver {
    pub fn new(devices: Vec<MockDevice>) -> Self {
        Self {
            devices,
            ..Default::default()
        }
    }

    pub fn handle(&self, index: usize) -> vk::PhysicalDevice {
        vk::PhysicalDevice::from_raw(index as u64 + 1)
    }

    pub fn view_of(image: vk::Image) -> vk::ImageView {
        vk::ImageView::from_raw(image.as_raw() | 0x1_0000)
    }

    fn device(&self, physical_device: vk::PhysicalDevice) -> &MockDevice {
        &self.devices[physical_device.as_raw() as usize - 1]
    }

    fn surface_query(&self, physical_device: vk::PhysicalDevice) -> VkResult<&MockDevice> {
        self.surface_queries.set(self.surface_queries.get() + 1);
        let device = self.device(physical_device);
        match device.surface_failure {
            Some(result) => Err(result),
            None => Ok(device),
        }
    }
}

impl Driver for MockDriver {
    type Device = MockLogicalDevice;

    fn physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        Ok((0..self.devices.len()).map(|index| self.handle(index)).collect())
    }

    fn properties(&self, physical_device: vk::PhysicalDevice) -> vk::PhysicalDeviceProperties {
        let device = self.device(physical_device);
        let mut properties = vk::PhysicalDeviceProperties {
            device_type: device.device_type,
            ..Default::default()
        };
        properties.limits.max_image_dimension2_d = device.max_image_dimension_2d;
        write_name(&mut properties.device_name, device.name.as_bytes());
        properties
    }

    fn features(&self, physical_device: vk::PhysicalDevice) -> vk::PhysicalDeviceFeatures {
        let geometry_shader = if self.device(physical_device).geometry_shader {
            vk::TRUE
        } else {
            vk::FALSE
        };
        vk::PhysicalDeviceFeatures {
            geometry_shader,
            ..Default::default()
        }
    }

    fn queue_families(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties> {
        self.device(physical_device)
            .families
            .iter()
            .map(|&(queue_flags, _)| vk::QueueFamilyProperties {
                queue_flags,
                queue_count: 1,
                ..Default::default()
            })
            .collect()
    }

    fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        let device = self.device(physical_device);
        match device.surface_failure {
            Some(result) => Err(result),
            None => Ok(device.families[queue_family_index as usize].1),
        }
    }

    fn device_extensions(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::ExtensionProperties>> {
        let device = self.device(physical_device);
        if let Some(result) = device.extension_failure {
            return Err(result);
        }
        Ok(device
            .extensions
            .iter()
            .map(|name| {
                let mut properties = vk::ExtensionProperties::default();
                write_name(&mut properties.extension_name, name.to_bytes());
                properties
            })
            .collect())
    }

    fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        Ok(self.surface_query(physical_device)?.capabilities)
    }

    fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        Ok(self.surface_query(physical_device)?.formats.clone())
    }

    fn present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        Ok(self.surface_query(physical_device)?.present_modes.clone())
    }

    fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        request: &DeviceRequest,
    ) -> VkResult<Self::Device> {
        if let Some(result) = self.fail_device {
            return Err(result);
        }
        Ok(MockLogicalDevice {
            physical_device,
            request: request.clone(),
        })
    }

    fn device_queue(
        &self,
        _device: &Self::Device,
        queue_family_index: u32,
        index: u32,
    ) -> vk::Queue {
        vk::Queue::from_raw((u64::from(queue_family_index) + 1) << 8 | u64::from(index))
    }

    fn create_swapchain(
        &self,
        _device: &Self::Device,
        config: &SwapchainConfig,
    ) -> VkResult<vk::SwapchainKHR> {
        if let Some(result) = self.fail_swapchain {
            return Err(result);
        }
        let mut swapchains = self.swapchains.borrow_mut();
        swapchains.push(config.clone());
        Ok(vk::SwapchainKHR::from_raw(swapchains.len() as u64))
    }

    fn swapchain_images(
        &self,
        _device: &Self::Device,
        swapchain: vk::SwapchainKHR,
    ) -> VkResult<Vec<vk::Image>> {
        if let Some(result) = self.fail_images {
            return Err(result);
        }
        let requested = self.swapchains.borrow()[swapchain.as_raw() as usize - 1].image_count;
        let count = self.granted_images.unwrap_or(requested);
        Ok((0..count)
            .map(|index| vk::Image::from_raw(swapchain.as_raw() << 8 | u64::from(index)))
            .collect())
    }

    fn create_image_view(
        &self,
        _device: &Self::Device,
        image: vk::Image,
        _format: vk::Format,
    ) -> VkResult<vk::ImageView> {
        let mut views = self.views.borrow_mut();
        if self.fail_view_after == Some(views.len()) {
            return Err(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY);
        }
        let view = Self::view_of(image);
        views.push(view);
        Ok(view)
    }

    fn destroy_image_view(&self, _device: &Self::Device, image_view: vk::ImageView) {
        self.destroyed_views.borrow_mut().push(image_view);
    }

    fn destroy_swapchain(&self, _device: &Self::Device, swapchain: vk::SwapchainKHR) {
        self.destroyed_swapchains.borrow_mut().push(swapchain);
    }
}
