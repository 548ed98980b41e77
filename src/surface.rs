use std::{ffi::c_char, sync::Arc};

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::{
    error::{Error, Result, Stage},
    instance::Instance,
};

/// Instance extensions needed to present on the window's platform.
pub fn required_extensions(window: &impl HasDisplayHandle) -> Result<&'static [*const c_char]> {
    let display_handle = window.display_handle()?;
    ash_window::enumerate_required_extensions(display_handle.as_raw())
        .map_err(Error::query(Stage::Instance))
}

pub struct Surface {
    pub handle: vk::SurfaceKHR,
    instance: Arc<Instance>,
}

impl Surface {
    pub fn new(
        window: &(impl HasDisplayHandle + HasWindowHandle),
        instance: &Arc<Instance>,
    ) -> Result<Self> {
        let display_handle = window.display_handle()?;
        let window_handle = window.window_handle()?;
        let handle = unsafe {
            ash_window::create_surface(
                &instance.entry,
                &instance.handle,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
        }
        .map_err(Error::creation(Stage::Surface))?;
        Ok(Self {
            handle,
            instance: instance.clone(),
        })
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        unsafe { self.instance.surface_fn.destroy_surface(self.handle, None) };
    }
}
