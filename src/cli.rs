// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing devices
//! - Printing a stream's controls and raw descriptors
//! - Writing a single control value

use camera_controls::app::{Message, Snapshot, Synchronizer, SynchronizerOptions};
use camera_controls::backends::camera::mock::{self, MockInventory, MockStreamProvider};
use camera_controls::backends::camera::v4l2::{V4l2Inventory, V4l2StreamProvider};
use camera_controls::backends::camera::{DeviceInventory, Parameter, StreamProvider};
use camera_controls::config::Config;
use std::sync::Arc;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// The collaborator pair every command runs against
pub struct Backends {
    pub inventory: Arc<dyn DeviceInventory>,
    pub provider: Arc<dyn StreamProvider>,
}

impl Backends {
    pub fn v4l2(config: &Config) -> Self {
        Self {
            inventory: Arc::new(V4l2Inventory::new(&config.device_dir)),
            provider: Arc::new(V4l2StreamProvider::new(&config.device_dir)),
        }
    }

    pub fn mock() -> Self {
        let cameras = mock::demo_cameras();
        Self {
            inventory: Arc::new(MockInventory::with_cameras(&cameras)),
            provider: Arc::new(MockStreamProvider::new(cameras)),
        }
    }
}

fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread().enable_all().build()
}

/// List devices reported by the inventory
pub fn list_devices(backends: &Backends, all: bool) -> CliResult {
    let devices = runtime()?.block_on(backends.inventory.enumerate())?;
    let shown: Vec<_> = devices
        .iter()
        .filter(|device| all || device.is_video_input())
        .collect();

    if shown.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available devices:");
    println!();
    for device in shown {
        if device.is_placeholder() {
            println!("  (unlabelled camera, permission not granted)");
            continue;
        }
        let label = if device.label.is_empty() {
            "(no label)"
        } else {
            &device.label
        };
        if all {
            println!("  {:<16} {:<12} {}", device.id, device.kind, label);
        } else {
            println!("  {:<16} {}", device.id, label);
        }
    }
    Ok(())
}

/// Start a synchronizer and wait until the initial stream is synchronized
async fn synchronized(backends: Backends, config: &Config) -> Synchronizer {
    let options = SynchronizerOptions {
        preview: false,
        ..SynchronizerOptions::from(config)
    };
    let mut sync = Synchronizer::new(backends.inventory, backends.provider, options);
    sync.start();
    sync.settle().await;
    sync
}

/// Open the stream and print its controls and descriptors
pub fn show_controls(backends: Backends, config: &Config) -> CliResult {
    let rt = runtime()?;
    let (snapshot, label) = rt.block_on(async {
        let sync = synchronized(backends, config).await;
        (sync.snapshot(), sync.active_track_label())
    });

    if snapshot.capabilities_json.is_empty() {
        return Err("No stream could be opened".into());
    }

    match (&snapshot.selected_device_id, label) {
        (Some(device), Some(label)) => println!("Device: {} ({})", label, device),
        (Some(device), None) => println!("Device: {}", device),
        (None, _) => {}
    }
    println!();
    print_controls(&snapshot);
    println!();
    println!("Capabilities:");
    println!("{}", snapshot.capabilities_json);
    println!();
    println!("Settings:");
    println!("{}", snapshot.settings_json);
    Ok(())
}

fn print_controls(snapshot: &Snapshot) {
    for parameter in Parameter::ALL {
        let control = snapshot.control(parameter);
        if control.provided {
            println!(
                "  {:<11} {:>8} [{} .. {}, step {}]",
                parameter.display_name(),
                snapshot.value(parameter),
                control.min,
                control.max,
                control.step
            );
        } else {
            println!("  {:<11} {:>8}", parameter.display_name(), "n/a");
        }
    }
}

/// Write one control value to the stream's first video track
pub fn set_control(
    backends: Backends,
    config: &Config,
    parameter: Parameter,
    value: f64,
) -> CliResult {
    let rt = runtime()?;
    let (provided, after) = rt.block_on(async {
        let mut sync = synchronized(backends, config).await;
        let provided = sync.snapshot().control(parameter).provided;
        sync.dispatch(Message::ValueChanged(parameter, value));
        sync.settle().await;
        // Read back what the hardware reports now
        let after = sync
            .active_stream()
            .and_then(|stream| stream.video_tracks().into_iter().next())
            .and_then(|track| track.settings().value(parameter));
        (provided, after)
    });

    if !provided {
        return Err(format!("{} is not supported by this device", parameter).into());
    }
    match after {
        Some(current) if current == value.round() || current == value => {
            println!("{} set to {}", parameter, current);
            Ok(())
        }
        Some(current) => Err(format!(
            "{} write was not accepted (device reports {})",
            parameter, current
        )
        .into()),
        None => Err(format!("{} could not be read back", parameter).into()),
    }
}
