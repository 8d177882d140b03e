// SPDX-License-Identifier: GPL-3.0-only

//! Device & capability synchronizer
//!
//! Keeps the selected device, the four image controls, their current values
//! and the raw capability/settings dumps consistent with whichever stream is
//! active, and pushes user changes back to that stream.
//!
//! - [`SyncState`]: explicit state, changed only by [`SyncState::update`]
//! - [`Message`] / [`Command`]: events in, side effects out
//! - [`Synchronizer`]: async driver owning the collaborators and active stream

mod handlers;
pub mod runtime;
pub mod state;
pub mod update;

pub use runtime::{Synchronizer, SynchronizerOptions};
pub use state::{Control, Snapshot, StreamProbe, SyncState};
pub use update::{Command, Message};
