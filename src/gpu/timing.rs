use super::{Context, GPUError, Result};
use crate::utils::Handle;
use ash::vk;

/// A single-entry timestamp query, written by the `WriteTimestamp` command
/// and read back in microseconds.
pub struct Timestamp {
    pub(crate) query_pool: vk::QueryPool,
}

impl Timestamp {
    pub(crate) fn destroy(self, device: &ash::Device) {
        unsafe { device.destroy_query_pool(self.query_pool, None) };
        log::debug!("destroyed timestamp");
    }
}

impl Context {
    /// Whether every graphics and compute queue on the device can write
    /// timestamps.
    pub fn supports_timestamps(&self) -> bool {
        self.properties.limits.timestamp_compute_and_graphics != vk::FALSE
    }

    pub fn make_timestamp(&mut self) -> Result<Handle<Timestamp>> {
        let query_pool = unsafe {
            self.device.create_query_pool(
                &vk::QueryPoolCreateInfo::builder()
                    .query_type(vk::QueryType::TIMESTAMP)
                    .query_count(1)
                    .build(),
                None,
            )
        }?;
        log::debug!("created timestamp");
        self.timestamps
            .insert(Timestamp { query_pool })
            .ok_or(GPUError::SlotError())
    }

    /// Destroying a handle twice is a no-op.
    pub fn destroy_timestamp(&mut self, handle: Handle<Timestamp>) {
        match self.timestamps.take(handle) {
            Some(timestamp) => timestamp.destroy(&self.device),
            None => log::warn!("ignored destroy of dead timestamp handle"),
        }
    }

    /// Reads the query with wait-for-result semantics and converts ticks to
    /// microseconds using the device tick period.
    pub fn timestamp_us(&self, handle: Handle<Timestamp>) -> Result<f64> {
        let timestamp = self
            .timestamps
            .get_ref(handle)
            .ok_or(GPUError::InvalidHandle("timestamp"))?;
        let mut ticks = [0u64; 1];
        unsafe {
            self.device.get_query_pool_results(
                timestamp.query_pool,
                0,
                1,
                &mut ticks,
                vk::QueryResultFlags::TYPE_64 | vk::QueryResultFlags::WAIT,
            )
        }?;
        let ns_per_tick = self.properties.limits.timestamp_period as f64;
        Ok(ticks[0] as f64 * ns_per_tick / 1000.0)
    }
}
