use ash::{prelude::VkResult, vk};

use crate::{device::DeviceRequest, swapchain::SwapchainConfig};

/// Queries and object creation the bring-up sequence needs from the driver.
///
/// Handles passed in are expected to come from the same implementation and be
/// alive for the duration of the call. Every enumeration returns its records in
/// driver order.
pub trait Driver {
    /// Logical device owned by the caller once created.
    type Device;

    fn physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>>;

    fn properties(&self, physical_device: vk::PhysicalDevice) -> vk::PhysicalDeviceProperties;

    fn features(&self, physical_device: vk::PhysicalDevice) -> vk::PhysicalDeviceFeatures;

    fn queue_families(&self, physical_device: vk::PhysicalDevice)
        -> Vec<vk::QueueFamilyProperties>;

    fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool>;

    fn device_extensions(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::ExtensionProperties>>;

    fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR>;

    fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>>;

    fn present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>>;

    fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        request: &DeviceRequest,
    ) -> VkResult<Self::Device>;

    fn device_queue(&self, device: &Self::Device, queue_family_index: u32, index: u32)
        -> vk::Queue;

    fn create_swapchain(
        &self,
        device: &Self::Device,
        config: &SwapchainConfig,
    ) -> VkResult<vk::SwapchainKHR>;

    fn swapchain_images(
        &self,
        device: &Self::Device,
        swapchain: vk::SwapchainKHR,
    ) -> VkResult<Vec<vk::Image>>;

    fn create_image_view(
        &self,
        device: &Self::Device,
        image: vk::Image,
        format: vk::Format,
    ) -> VkResult<vk::ImageView>;

    /// The view must no longer be in use.
    fn destroy_image_view(&self, device: &Self::Device, image_view: vk::ImageView);

    /// Views of the swapchain's images must already be destroyed.
    fn destroy_swapchain(&self, device: &Self::Device, swapchain: vk::SwapchainKHR);
}
