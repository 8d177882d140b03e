// SPDX-License-Identifier: GPL-3.0-only

//! camera-controls - pick a camera, preview it, tune its image controls
//!
//! # Architecture
//!
//! - [`app`]: the device & capability synchronizer (state, messages, runtime)
//! - [`backends`]: collaborator traits with V4L2 and mock implementations
//! - [`terminal`]: ratatui front-end with sliders, preview and raw dumps
//! - [`config`]: read-only configuration
//!
//! # Example
//!
//! ```no_run
//! use camera_controls::app::{Message, Synchronizer, SynchronizerOptions};
//! use camera_controls::backends::camera::Parameter;
//! use camera_controls::backends::camera::v4l2::{V4l2Inventory, V4l2StreamProvider};
//! use std::sync::Arc;
//!
//! # async fn demo() {
//! let mut sync = Synchronizer::new(
//!     Arc::new(V4l2Inventory::new("/dev")),
//!     Arc::new(V4l2StreamProvider::new("/dev")),
//!     SynchronizerOptions::default(),
//! );
//! sync.start();
//! sync.settle().await;
//! sync.dispatch(Message::ValueChanged(Parameter::Brightness, 10.0));
//! # }
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod terminal;

pub use app::{Control, Message, Snapshot, Synchronizer, SynchronizerOptions};
pub use config::Config;
pub use errors::{AppError, AppResult, BackendError, BackendResult};
