// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer
//!
//! The synchronizer only talks to the collaborator traits in [`camera`];
//! V4L2 and the in-memory mock implement them.

pub mod camera;
