use std::{
    ffi::{c_char, CStr, CString},
    ptr,
};

use ash::{prelude::VkResult, vk};

use crate::{
    device::{DeviceRequest, QUEUE_PRIORITIES},
    driver::Driver,
    error::{Error, Result, Stage},
    probe,
    swapchain::SwapchainConfig,
};

pub const KHRONOS_VALIDATION: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Instance layers the loader knows about.
pub fn available_layers(entry: &ash::Entry) -> Result<Vec<vk::LayerProperties>> {
    let fp = entry.fp_v1_0();
    probe::enumerate(|count, data| unsafe {
        (fp.enumerate_instance_layer_properties)(count, data)
    })
    .map_err(Error::query(Stage::ValidationLayers))
}

/// The requested layers that appear in `available`, in request order.
pub fn filter_layers(requested: &[CString], available: &[vk::LayerProperties]) -> Vec<CString> {
    requested
        .iter()
        .filter(|name| {
            available.iter().any(|layer| {
                layer
                    .layer_name_as_c_str()
                    .is_ok_and(|layer_name| layer_name == name.as_c_str())
            })
        })
        .cloned()
        .collect()
}

/// Keeps the requested validation layers the loader can actually provide.
pub fn resolve_validation_layers(
    entry: &ash::Entry,
    requested: &[CString],
) -> Result<Vec<CString>> {
    if requested.is_empty() {
        return Ok(Vec::new());
    }
    let available = available_layers(entry)?;
    tracing::debug!(
        available = ?available
            .iter()
            .filter_map(|layer| layer.layer_name_as_c_str().ok())
            .collect::<Vec<_>>(),
        "Instance layers"
    );

    let layers = filter_layers(requested, &available);
    for name in requested.iter().filter(|name| !layers.contains(name)) {
        tracing::warn!("Validation layer {} not available", name.to_string_lossy());
    }
    tracing::info!(layers = ?layers, "Enabled validation layers");
    Ok(layers)
}

pub struct Instance {
    pub entry: ash::Entry,
    pub handle: ash::Instance,
    pub surface_fn: ash::khr::surface::Instance,
}

impl Instance {
    pub fn new(
        entry: ash::Entry,
        app_name: &str,
        layers: &[CString],
        extensions: &[*const c_char],
    ) -> Result<Self> {
        let handle = {
            let application_name = CString::new(app_name)?;
            let application_version = vk::make_api_version(0, 1, 0, 0);
            let engine_name = CString::new("vulkan")?;
            let engine_version = vk::make_api_version(0, 1, 0, 0);

            let enabled_layer_names: Vec<*const c_char> =
                layers.iter().map(|layer| layer.as_ptr()).collect();
            let mut enabled_extension_names = extensions.to_vec();
            let mut flags = vk::InstanceCreateFlags::empty();

            // MoltenVK is only reported through portability enumeration.
            if cfg!(target_os = "macos") {
                enabled_extension_names.push(ash::khr::portability_enumeration::NAME.as_ptr());
                flags |= vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR;
            }

            let application_info = vk::ApplicationInfo::default()
                .application_name(&application_name)
                .application_version(application_version)
                .engine_name(&engine_name)
                .engine_version(engine_version)
                .api_version(vk::API_VERSION_1_0);

            unsafe {
                entry.create_instance(
                    &vk::InstanceCreateInfo::default()
                        .flags(flags)
                        .application_info(&application_info)
                        .enabled_layer_names(&enabled_layer_names)
                        .enabled_extension_names(&enabled_extension_names),
                    None,
                )
            }
            .map_err(Error::creation(Stage::Instance))?
        };

        let surface_fn = ash::khr::surface::Instance::new(&entry, &handle);
        Ok(Self {
            entry,
            handle,
            surface_fn,
        })
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        unsafe { self.handle.destroy_instance(None) };
    }
}

/// Logical device created through [`Instance`], with its swapchain functions.
pub struct VulkanDevice {
    pub handle: ash::Device,
    pub swapchain_fn: ash::khr::swapchain::Device,
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.handle.device_wait_idle();
            self.handle.destroy_device(None);
        }
    }
}

impl Driver for Instance {
    type Device = VulkanDevice;

    fn physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        let fp = self.handle.fp_v1_0();
        probe::enumerate(|count, data| unsafe {
            (fp.enumerate_physical_devices)(self.handle.handle(), count, data)
        })
    }

    fn properties(&self, physical_device: vk::PhysicalDevice) -> vk::PhysicalDeviceProperties {
        unsafe { self.handle.get_physical_device_properties(physical_device) }
    }

    fn features(&self, physical_device: vk::PhysicalDevice) -> vk::PhysicalDeviceFeatures {
        unsafe { self.handle.get_physical_device_features(physical_device) }
    }

    fn queue_families(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties> {
        let fp = self.handle.fp_v1_0();
        probe::enumerate_infallible(|count, data| unsafe {
            (fp.get_physical_device_queue_family_properties)(physical_device, count, data)
        })
    }

    fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        unsafe {
            self.surface_fn.get_physical_device_surface_support(
                physical_device,
                queue_family_index,
                surface,
            )
        }
    }

    fn device_extensions(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VkResult<Vec<vk::ExtensionProperties>> {
        let fp = self.handle.fp_v1_0();
        probe::enumerate(|count, data| unsafe {
            (fp.enumerate_device_extension_properties)(physical_device, ptr::null(), count, data)
        })
    }

    fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.surface_fn
                .get_physical_device_surface_capabilities(physical_device, surface)
        }
    }

    fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::SurfaceFormatKHR>> {
        let fp = self.surface_fn.fp();
        probe::enumerate(|count, data| unsafe {
            (fp.get_physical_device_surface_formats_khr)(physical_device, surface, count, data)
        })
    }

    fn present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<Vec<vk::PresentModeKHR>> {
        let fp = self.surface_fn.fp();
        probe::enumerate(|count, data| unsafe {
            (fp.get_physical_device_surface_present_modes_khr)(
                physical_device,
                surface,
                count,
                data,
            )
        })
    }

    fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        request: &DeviceRequest,
    ) -> VkResult<Self::Device> {
        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = request
            .queue_families
            .iter()
            .map(|&queue_family_index| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(queue_family_index)
                    .queue_priorities(&QUEUE_PRIORITIES)
            })
            .collect();
        let enabled_extension_names: Vec<*const c_char> = request
            .extensions
            .iter()
            .map(|extension| extension.as_ptr())
            .collect();
        let enabled_layer_names: Vec<*const c_char> =
            request.layers.iter().map(|layer| layer.as_ptr()).collect();
        let enabled_features = vk::PhysicalDeviceFeatures::default();

        // Device layers are ignored by current loaders but older ones still
        // expect them to match the instance layers.
        #[allow(deprecated)]
        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_layer_names(&enabled_layer_names)
            .enabled_extension_names(&enabled_extension_names)
            .enabled_features(&enabled_features);

        let handle = unsafe { self.handle.create_device(physical_device, &create_info, None)? };
        let swapchain_fn = ash::khr::swapchain::Device::new(&self.handle, &handle);
        Ok(VulkanDevice {
            handle,
            swapchain_fn,
        })
    }

    fn device_queue(
        &self,
        device: &Self::Device,
        queue_family_index: u32,
        index: u32,
    ) -> vk::Queue {
        unsafe { device.handle.get_device_queue(queue_family_index, index) }
    }

    fn create_swapchain(
        &self,
        device: &Self::Device,
        config: &SwapchainConfig,
    ) -> VkResult<vk::SwapchainKHR> {
        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(config.surface)
            .min_image_count(config.image_count)
            .image_format(config.surface_format.format)
            .image_color_space(config.surface_format.color_space)
            .image_extent(config.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(config.sharing.mode())
            .queue_family_indices(config.sharing.queue_family_indices())
            .pre_transform(config.pre_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(config.present_mode)
            .clipped(true)
            .old_swapchain(vk::SwapchainKHR::null());
        unsafe { device.swapchain_fn.create_swapchain(&create_info, None) }
    }

    fn swapchain_images(
        &self,
        device: &Self::Device,
        swapchain: vk::SwapchainKHR,
    ) -> VkResult<Vec<vk::Image>> {
        let fp = device.swapchain_fn.fp();
        probe::enumerate(|count, data| unsafe {
            (fp.get_swapchain_images_khr)(device.handle.handle(), swapchain, count, data)
        })
    }

    fn create_image_view(
        &self,
        device: &Self::Device,
        image: vk::Image,
        format: vk::Format,
    ) -> VkResult<vk::ImageView> {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(
                vk::ComponentMapping::default()
                    .r(vk::ComponentSwizzle::IDENTITY)
                    .g(vk::ComponentSwizzle::IDENTITY)
                    .b(vk::ComponentSwizzle::IDENTITY)
                    .a(vk::ComponentSwizzle::IDENTITY),
            )
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1),
            );
        unsafe { device.handle.create_image_view(&create_info, None) }
    }

    fn destroy_image_view(&self, device: &Self::Device, image_view: vk::ImageView) {
        unsafe { device.handle.destroy_image_view(image_view, None) };
    }

    fn destroy_swapchain(&self, device: &Self::Device, swapchain: vk::SwapchainKHR) {
        unsafe { device.swapchain_fn.destroy_swapchain(swapchain, None) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(name: &CStr) -> vk::LayerProperties {
        let mut properties = vk::LayerProperties::default();
        for (slot, &byte) in properties.layer_name.iter_mut().zip(name.to_bytes()) {
            *slot = byte as c_char;
        }
        properties
    }

    #[test]
    fn keeps_available_layers_in_request_order() {
        let requested = [
            c"VK_LAYER_LUNARG_api_dump".to_owned(),
            KHRONOS_VALIDATION.to_owned(),
            c"VK_LAYER_MISSING".to_owned(),
        ];
        let available = [
            layer(KHRONOS_VALIDATION),
            layer(c"VK_LAYER_MESA_overlay"),
            layer(c"VK_LAYER_LUNARG_api_dump"),
        ];
        assert_eq!(
            filter_layers(&requested, &available),
            vec![
                c"VK_LAYER_LUNARG_api_dump".to_owned(),
                KHRONOS_VALIDATION.to_owned(),
            ]
        );
    }

    #[test]
    fn no_layers_available() {
        let requested = [KHRONOS_VALIDATION.to_owned()];
        assert!(filter_layers(&requested, &[]).is_empty());
    }
}
