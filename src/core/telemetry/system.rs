//! CPU and RAM sampling via sysinfo.

use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

use super::metrics::SystemSample;

/// Samples global CPU and memory usage.
///
/// A sampler without a provider (or one that cannot produce meaningful
/// numbers) emits zero-valued samples instead of failing, so the time series
/// keeps its cadence even when degraded.
pub struct ResourceSampler {
    system: Option<System>,
}

impl ResourceSampler {
    pub fn new() -> Self {
        Self {
            system: Some(System::new_with_specifics(refresh_kind())),
        }
    }

    /// Sampler with no metrics provider; every sample is `0, 0`.
    pub fn unavailable() -> Self {
        Self { system: None }
    }

    pub fn sample(&mut self) -> SystemSample {
        let timestamp = chrono::Utc::now().timestamp();

        let Some(system) = self.system.as_mut() else {
            return SystemSample {
                timestamp,
                cpu_percent: 0.0,
                ram_percent: 0.0,
            };
        };

        system.refresh_specifics(refresh_kind());

        let total = system.total_memory();
        let used = system.used_memory();
        let ram_percent = if total > 0 {
            (used as f32 / total as f32) * 100.0
        } else {
            0.0
        };

        SystemSample {
            timestamp,
            cpu_percent: system.global_cpu_usage(),
            ram_percent,
        }
    }
}

impl Default for ResourceSampler {
    fn default() -> Self {
        Self::new()
    }
}

fn refresh_kind() -> RefreshKind {
    RefreshKind::nothing()
        .with_cpu(CpuRefreshKind::everything())
        .with_memory(MemoryRefreshKind::everything())
}
