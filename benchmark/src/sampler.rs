// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! System metrics sampler.
//!
//! Brackets a single operation with process memory snapshots and a CPU
//! reading. Only the operation itself is timed: warm-up reads, retry sleeps
//! and memory snapshots happen outside the timer.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use cipherbench_core::SamplerConfig;
use sysinfo::{Pid, System};

/// Bytes per mebibyte, the unit of `memory_delta_mb`.
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// At most one measurement in flight per process. Concurrent samplers would
/// read each other's CPU load and allocations.
static MEASUREMENT_LOCK: Mutex<()> = Mutex::new(());

/// Source of CPU and memory readings.
pub trait SystemMetricsProvider: Send {
    /// Prime the CPU counters; the reading is discarded.
    fn warm_up_cpu(&mut self);

    /// CPU utilization in percent since the previous refresh.
    fn cpu_percent(&mut self) -> f32;

    /// Resident memory of the current process in bytes.
    fn process_memory_bytes(&mut self) -> u64;
}

/// [`SystemMetricsProvider`] backed by `sysinfo`.
pub struct SysinfoProvider {
    system: System,
    pid: Option<Pid>,
}

impl SysinfoProvider {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!(error = e, "Cannot resolve current pid, memory deltas will be 0");
                None
            }
        };
        Self {
            system: System::new(),
            pid,
        }
    }
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemMetricsProvider for SysinfoProvider {
    fn warm_up_cpu(&mut self) {
        self.system.refresh_cpu();
    }

    fn cpu_percent(&mut self) -> f32 {
        self.system.refresh_cpu();
        self.system.global_cpu_info().cpu_usage()
    }

    fn process_memory_bytes(&mut self) -> u64 {
        let Some(pid) = self.pid else {
            return 0;
        };
        self.system.refresh_process(pid);
        self.system
            .process(pid)
            .map(|process| process.memory())
            .unwrap_or(0)
    }
}

/// Resource usage around one operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Always `> 0`: a zero reading is replaced by the fallback.
    pub cpu_percent: f32,
    /// Signed: memory may be released during the operation.
    pub memory_delta_mb: f64,
    /// Resident memory right after the operation.
    pub resident_mb: f64,
    pub duration: Duration,
}

/// Timer for measuring individual operations.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Stop the timer and return elapsed duration.
    pub fn elapsed(self) -> Duration {
        self.start.elapsed()
    }
}

/// Measures operations against a metrics provider.
pub struct Sampler<P> {
    provider: P,
    config: SamplerConfig,
}

impl Sampler<SysinfoProvider> {
    /// Sampler over the live system.
    pub fn system(config: SamplerConfig) -> Self {
        Self::new(SysinfoProvider::new(), config)
    }
}

impl<P: SystemMetricsProvider> Sampler<P> {
    pub fn new(provider: P, config: SamplerConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Run `op` and measure it.
    pub fn measure<F, T>(&mut self, op: F) -> (T, Measurement)
    where
        F: FnOnce() -> T,
    {
        let _guard = MEASUREMENT_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let memory_before = self.provider.process_memory_bytes();
        self.provider.warm_up_cpu();

        let timer = Timer::start();
        let result = op();
        let duration = timer.elapsed();

        let cpu_percent = self.read_cpu();
        let memory_after = self.provider.process_memory_bytes();
        let memory_delta_mb = (memory_after as f64 - memory_before as f64) / BYTES_PER_MB;

        (
            result,
            Measurement {
                cpu_percent,
                memory_delta_mb,
                resident_mb: memory_after as f64 / BYTES_PER_MB,
                duration,
            },
        )
    }

    /// First non-zero reading out of `cpu_retries`, else the fallback.
    fn read_cpu(&mut self) -> f32 {
        for attempt in 1..=self.config.cpu_retries {
            std::thread::sleep(self.config.sampling_interval);
            let reading = clamp_cpu(self.provider.cpu_percent());
            if reading > 0.0 {
                return reading;
            }
            tracing::trace!(attempt, "CPU reading was zero");
        }
        self.config.cpu_fallback_percent
    }
}

/// Negative and non-finite readings count as zero.
fn clamp_cpu(reading: f32) -> f32 {
    if reading.is_finite() && reading > 0.0 {
        reading
    } else {
        0.0
    }
}
