//! Two-phase "count, then fill" enumeration shared by every driver query.

use std::ptr;

use ash::{prelude::VkResult, vk};

/// Runs a count-then-fill query and returns the records in driver order.
///
/// `query` is invoked first with a null buffer to obtain the count, then with
/// a buffer of that many elements. A count of zero is an empty result. When
/// the driver answers `VK_INCOMPLETE` the record set changed between the two
/// calls and the whole query starts over.
pub fn enumerate<T, F>(mut query: F) -> VkResult<Vec<T>>
where
    T: Default + Clone,
    F: FnMut(&mut u32, *mut T) -> vk::Result,
{
    loop {
        let mut count = 0;
        query(&mut count, ptr::null_mut()).result()?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut data = vec![T::default(); count as usize];
        match query(&mut count, data.as_mut_ptr()) {
            vk::Result::INCOMPLETE => continue,
            result => result.result()?,
        }
        data.truncate(count as usize);
        return Ok(data);
    }
}

/// [`enumerate`] for queries that cannot fail, such as queue family properties.
pub fn enumerate_infallible<T, F>(mut query: F) -> Vec<T>
where
    T: Default + Clone,
    F: FnMut(&mut u32, *mut T),
{
    enumerate(|count, data| {
        query(count, data);
        vk::Result::SUCCESS
    })
    .unwrap_or_default()
}
