// core/src/gpu/monitor.rs
use anyhow::{Context, Result};
use nvml_wrapper::enum_wrappers::device::TemperatureSensor;
use nvml_wrapper::Nvml;

use crate::utils::models::GpuStats;

const BYTES_PER_MIB: u64 = 1024 * 1024;

#[derive(Debug)]
pub struct GpuMonitor {
    // Holds exclusive ownership of NVML
    nvml: Nvml,
}

impl GpuMonitor {
    pub fn new() -> Result<Self> {
        let nvml = Nvml::init().context("NVML initialization failed")?;
        Ok(Self { nvml })
    }

    pub fn device_count(&self) -> Result<u32> {
        self.nvml
            .device_count()
            .context("Failed to get device count")
    }

    /// Reads one device and converts it into the dashboard's units (MiB, percent).
    pub fn get_stats(&self, index: u32) -> Result<GpuStats> {
        let device = self
            .nvml
            .device_by_index(index)
            .with_context(|| format!("Failed to access GPU device {}", index))?;

        let temperature = device
            .temperature(TemperatureSensor::Gpu)
            .context("Failed to get temperature")? as i64;
        let utilization = device
            .utilization_rates()
            .context("Failed to get utilization rates")?;
        let memory = device.memory_info().context("Failed to get memory info")?;

        let memory_total = memory.total / BYTES_PER_MIB;
        let memory_used = (memory.used / BYTES_PER_MIB).min(memory_total);

        Ok(GpuStats {
            uuid: device.uuid().context("Failed to get UUID")?,
            gpu_name: device.name().context("Failed to get device name")?,
            temperature,
            memory_total,
            memory_used,
            // Derived, so used + free == total survives driver-reserved memory.
            memory_free: memory_total - memory_used,
            gpu_utilization: utilization.gpu,
            memory_utilization: utilization.memory,
            is_hot: GpuStats::hot_from_readings(temperature, utilization.gpu),
        })
    }

    /// Reads every device; a failing device does not hide the others.
    pub fn get_all_stats(&self) -> Result<Vec<Result<GpuStats>>> {
        let count = self.device_count()?;
        let mut stats = Vec::with_capacity(count as usize);
        for i in 0..count {
            stats.push(self.get_stats(i));
        }
        Ok(stats)
    }
}
