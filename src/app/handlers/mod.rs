// SPDX-License-Identifier: GPL-3.0-only

//! Message handlers
//!
//! Each submodule adds `handle_*` methods to [`SyncState`](super::SyncState)
//! for one family of messages:
//!
//! - `devices`: inventory snapshots and device selection
//! - `stream`: stream acquisition, the main synchronization point
//! - `controls`: slider value changes

mod controls;
mod devices;
mod stream;
