//! The full bring-up sequence, from loader to presentable images.

use std::{ffi::CString, sync::Arc};

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::{
    device::{LogicalDevice, Queue},
    error::Result,
    instance::{self, Instance, KHRONOS_VALIDATION},
    physical_device::{self, PresentPolicy},
    surface::{self, Surface},
    swapchain::{Swapchain, SwapchainPreferences},
};

/// Everything a render loop needs to start recording and presenting.
pub struct Context {
    // Declaration order is teardown order.
    pub swapchain: Swapchain,
    pub device: LogicalDevice<Instance>,
    pub surface: Surface,
    pub instance: Arc<Instance>,
    pub validation_layers: Vec<CString>,
}

impl Context {
    pub fn graphics_queue(&self) -> Queue {
        self.device.graphics_queue
    }

    pub fn present_queue(&self) -> Queue {
        self.device.present_queue
    }

    /// See [`LogicalDevice::queues_alias`].
    pub fn queues_alias(&self) -> bool {
        self.device.queues_alias()
    }

    pub fn surface_format(&self) -> vk::SurfaceFormatKHR {
        self.swapchain.surface_format
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent
    }

    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.swapchain.image_views
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        let device = &self.device.handle;
        let _ = unsafe { device.handle.device_wait_idle() };
        self.swapchain.destroy(self.instance.as_ref(), device);
    }
}

/// Builder for creating a [`Context`].
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    app_name: String,
    enable_validation: bool,
    validation_layers: Vec<CString>,
    device_extensions: Vec<CString>,
    preferences: SwapchainPreferences,
    present_policy: PresentPolicy,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self {
            app_name: "vulkan".to_string(),
            enable_validation: cfg!(debug_assertions),
            validation_layers: vec![KHRONOS_VALIDATION.to_owned()],
            device_extensions: vec![ash::khr::swapchain::NAME.to_owned()],
            preferences: SwapchainPreferences::default(),
            present_policy: PresentPolicy::default(),
        }
    }
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Enable or disable validation layers.
    pub fn validation(mut self, enable: bool) -> Self {
        self.enable_validation = enable;
        self
    }

    /// Replace the validation layers to look for.
    pub fn validation_layers(mut self, layers: Vec<CString>) -> Self {
        self.validation_layers = layers;
        self
    }

    /// Require a device extension in addition to swapchain support.
    pub fn device_extension(mut self, name: CString) -> Self {
        if !self.device_extensions.contains(&name) {
            self.device_extensions.push(name);
        }
        self
    }

    pub fn surface_format(mut self, surface_format: vk::SurfaceFormatKHR) -> Self {
        self.preferences.surface_format = surface_format;
        self
    }

    pub fn present_mode(mut self, present_mode: vk::PresentModeKHR) -> Self {
        self.preferences.present_mode = present_mode;
        self
    }

    pub fn present_policy(mut self, present_policy: PresentPolicy) -> Self {
        self.present_policy = present_policy;
        self
    }

    /// The validation layers that will be looked for.
    pub fn requested_layers(&self) -> &[CString] {
        if self.enable_validation {
            &self.validation_layers
        } else {
            &[]
        }
    }

    /// Run the bring-up sequence for `window`, whose drawable area is
    /// `width` by `height` pixels.
    pub fn build<W>(self, window: &W, width: u32, height: u32) -> Result<Context>
    where
        W: HasDisplayHandle + HasWindowHandle,
    {
        let entry = unsafe { ash::Entry::load()? };

        let validation_layers =
            instance::resolve_validation_layers(&entry, self.requested_layers())?;

        let extensions = surface::required_extensions(window)?;
        let instance = Arc::new(Instance::new(
            entry,
            &self.app_name,
            &validation_layers,
            extensions,
        )?);

        let surface = Surface::new(window, &instance)?;

        let selected = physical_device::select(
            instance.as_ref(),
            surface.handle,
            &self.device_extensions,
            self.present_policy,
        )?;

        let device = LogicalDevice::new(
            instance.as_ref(),
            selected.device,
            selected.queue_families,
            &validation_layers,
            &self.device_extensions,
        )?;

        let swapchain = Swapchain::new(
            instance.as_ref(),
            &device,
            surface.handle,
            width,
            height,
            &self.preferences,
        )?;

        Ok(Context {
            swapchain,
            device,
            surface,
            instance,
            validation_layers,
        })
    }
}
