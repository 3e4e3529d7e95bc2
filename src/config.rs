//! Runtime configuration for pinned-host-mem.
//!
//! Configuration is loaded from a JSON file or constructed programmatically.
//! It only chooses which host-memory runtime backs the gateway; the gateway
//! itself has no knobs.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::runtime::{HostMemoryRuntime, SimulatedRuntime, TrackingRuntime};

/// Command-line arguments for `pinned-probe`.
#[derive(Parser, Debug, Clone)]
#[command(name = "pinned-probe", about = "Allocate and release pinned host memory through the gateway")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "pinned.json")]
    pub config: PathBuf,

    /// Override the configured runtime backend.
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Allocate one region, print its handle, and release it.
    Alloc {
        /// Size in bytes.
        size: u64,

        /// Raw allocation flags (cudaHostAlloc* bitmask).
        #[arg(long, default_value_t = 0)]
        flags: u32,
    },

    /// Repeatedly allocate, touch, and release regions.
    Cycle {
        /// Size in bytes of each region.
        size: u64,

        /// Raw allocation flags (cudaHostAlloc* bitmask).
        #[arg(long, default_value_t = 0)]
        flags: u32,

        /// Number of allocate/release round trips.
        #[arg(short = 'n', long, default_value_t = 16)]
        iterations: usize,

        /// Write a pattern into each region and read it back.
        #[arg(long)]
        verify: bool,
    },
}

/// Which runtime backs the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// CUDA runtime (`cudaHostAlloc` / `cudaFreeHost`). Requires the `cuda` feature.
    Cuda,
    /// Budgeted host memory with CUDA-compatible status codes.
    Simulated,
}

impl Default for Backend {
    fn default() -> Self {
        if cfg!(feature = "cuda") {
            Backend::Cuda
        } else {
            Backend::Simulated
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Runtime selection.
    pub runtime: RuntimeConfig,
}

/// Runtime backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub backend: Backend,

    /// Byte budget of the simulated backend.
    pub simulated_capacity: usize,

    /// Wrap the backend in a [`TrackingRuntime`] that catches double release
    /// and reports leaks.
    pub track_allocations: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            simulated_capacity: crate::runtime::simulated::DEFAULT_CAPACITY,
            track_allocations: false,
        }
    }
}

impl RuntimeConfig {
    /// Construct the configured runtime.
    pub fn build(&self) -> Result<Box<dyn HostMemoryRuntime>, GatewayError> {
        let runtime: Box<dyn HostMemoryRuntime> = match self.backend {
            #[cfg(feature = "cuda")]
            Backend::Cuda => Box::new(crate::runtime::CudaRuntime::new()),
            #[cfg(not(feature = "cuda"))]
            Backend::Cuda => return Err(GatewayError::BackendUnavailable("cuda".to_string())),
            Backend::Simulated => Box::new(SimulatedRuntime::new(self.simulated_capacity)),
        };

        if self.track_allocations {
            Ok(Box::new(TrackingRuntime::new(runtime)))
        } else {
            Ok(runtime)
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Load configuration from a JSON file that must exist.
    ///
    /// Used where a silently defaulted backend would hide a misconfigured path.
    pub fn load_strict(path: &Path) -> Result<Self, GatewayError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| GatewayError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&data)
            .map_err(|e| GatewayError::Config(format!("{}: {e}", path.display())))
    }
}
