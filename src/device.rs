use std::ffi::CString;

use ash::vk;

use crate::{
    driver::Driver,
    error::{Error, Result, Stage},
    physical_device::{PhysicalDevice, QueueFamilies},
};

/// Priority given to every requested queue.
pub const QUEUE_PRIORITIES: [f32; 1] = [1.0];

/// Parameters of a logical device creation call.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRequest {
    /// One queue is requested from each of these families.
    pub queue_families: Vec<u32>,
    pub extensions: Vec<CString>,
    pub layers: Vec<CString>,
}

impl DeviceRequest {
    pub fn new(queue_families: QueueFamilies, layers: &[CString], extensions: &[CString]) -> Self {
        Self {
            queue_families: queue_families.distinct(),
            extensions: extensions.to_vec(),
            layers: layers.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Queue {
    pub handle: vk::Queue,
    pub family: u32,
}

pub struct LogicalDevice<D: Driver> {
    pub handle: D::Device,
    pub physical_device: PhysicalDevice,
    pub queue_families: QueueFamilies,
    pub graphics_queue: Queue,
    pub present_queue: Queue,
}

impl<D: Driver> LogicalDevice<D> {
    pub fn new(
        driver: &D,
        physical_device: PhysicalDevice,
        queue_families: QueueFamilies,
        layers: &[CString],
        extensions: &[CString],
    ) -> Result<Self> {
        let request = DeviceRequest::new(queue_families, layers, extensions);
        let handle = driver
            .create_device(physical_device.handle, &request)
            .map_err(Error::creation(Stage::LogicalDevice))?;

        let graphics_queue = Queue {
            handle: driver.device_queue(&handle, queue_families.graphics, 0),
            family: queue_families.graphics,
        };
        let present_queue = Queue {
            handle: driver.device_queue(&handle, queue_families.present, 0),
            family: queue_families.present,
        };

        tracing::info!(
            name = %physical_device.name,
            graphics_family = queue_families.graphics,
            present_family = queue_families.present,
            layers = request.layers.len(),
            extensions = request.extensions.len(),
            "Created logical device"
        );

        Ok(Self {
            handle,
            physical_device,
            queue_families,
            graphics_queue,
            present_queue,
        })
    }

    /// Whether graphics and present submissions go to the same hardware queue.
    /// Callers must then serialize submissions through either handle.
    pub fn queues_alias(&self) -> bool {
        self.queue_families.is_shared()
    }
}
