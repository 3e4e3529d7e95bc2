//! pinned-probe: exercise the pinned memory gateway from the command line.
//!
//! Useful for checking that a machine's runtime can hand out pinned memory of
//! a given size and flags before a host runtime depends on it.

use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use pinned_host_mem::config::{Cli, Command, Config};
use pinned_host_mem::{HostAllocFlags, HostMemoryRuntime, PinnedMemoryGateway};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "pinned_host_mem=debug,pinned_probe=debug"
    } else {
        "pinned_host_mem=info,pinned_probe=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("pinned-probe v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load(&cli.config)?;
    if let Some(backend) = cli.backend {
        config.runtime.backend = backend;
    }

    info!(
        backend = ?config.runtime.backend,
        track_allocations = config.runtime.track_allocations,
        "Configuration loaded"
    );

    let gateway = PinnedMemoryGateway::new(config.runtime.build()?);

    match cli.command {
        Command::Alloc { size, flags } => probe_alloc(&gateway, size, flags),
        Command::Cycle {
            size,
            flags,
            iterations,
            verify,
        } => probe_cycle(&gateway, size, flags, iterations, verify),
    }
}

fn probe_alloc<R: HostMemoryRuntime>(
    gateway: &PinnedMemoryGateway<R>,
    size: u64,
    flags: u32,
) -> anyhow::Result<()> {
    let handle = gateway
        .allocate(size, HostAllocFlags::from_raw(flags))
        .with_context(|| format!("allocating {size} bytes with flags {flags:#x}"))?;
    println!("allocated {size} bytes at {handle}");

    gateway
        .release(handle)
        .with_context(|| format!("releasing {handle}"))?;
    println!("released {handle}");
    Ok(())
}

fn probe_cycle<R: HostMemoryRuntime>(
    gateway: &PinnedMemoryGateway<R>,
    size: u64,
    flags: u32,
    iterations: usize,
    verify: bool,
) -> anyhow::Result<()> {
    let size = usize::try_from(size).context("size does not fit this platform")?;
    let flags = HostAllocFlags::from_raw(flags);
    let start = Instant::now();

    for i in 0..iterations {
        let mut region = gateway
            .allocate_region(size, flags)
            .with_context(|| format!("iteration {i}: allocating {size} bytes"))?;

        if verify {
            let pattern = (i % 251) as u8;
            region.as_bytes_mut().fill(pattern);
            if region.as_bytes().iter().any(|&b| b != pattern) {
                bail!("iteration {i}: read back differs from written pattern");
            }
        }

        region
            .release()
            .with_context(|| format!("iteration {i}: releasing region"))?;
    }

    let elapsed = start.elapsed();
    info!(iterations, size, elapsed_ms = elapsed.as_millis() as u64, "Cycle complete");
    println!(
        "{iterations} allocate/release cycles of {size} bytes in {:.3} ms",
        elapsed.as_secs_f64() * 1000.0
    );
    Ok(())
}
