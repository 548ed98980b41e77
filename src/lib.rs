//! Vulkan presentation bring-up.
//!
//! Picks a physical device for a window surface, creates the logical device
//! with its graphics and present queues, and negotiates a swapchain with one
//! image view per image:
//!
//! ```no_run
//! # fn run(window: &winit::window::Window) -> vulkan::Result<()> {
//! let size = window.inner_size();
//! let context = vulkan::ContextBuilder::new().build(window, size.width, size.height)?;
//! assert_eq!(context.image_views().len(), context.swapchain.images.len());
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod device;
pub mod driver;
pub mod error;
pub mod instance;
pub mod physical_device;
pub mod probe;
pub mod surface;
pub mod swapchain;

#[cfg(test)]
mod mock;

pub use context::{Context, ContextBuilder};
pub use device::{LogicalDevice, Queue};
pub use driver::Driver;
pub use error::{Error, Rejection, Result, Stage};
pub use instance::Instance;
pub use physical_device::{PhysicalDevice, PresentPolicy, QueueFamilies, QueueFamilyIndices};
pub use surface::Surface;
pub use swapchain::{Swapchain, SwapchainPreferences, SwapchainSupport};
