// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 node discovery helpers

use super::types::{CameraDevice, DeviceKind};
use crate::constants::VIDEO_NODE_PREFIX;
use std::fs::File;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use tracing::debug;

const VIDIOC_QUERYCAP: libc::c_ulong = 0x80685600;

const V4L2_CAP_VIDEO_CAPTURE: u32 = 0x0000_0001;
const V4L2_CAP_VIDEO_OUTPUT: u32 = 0x0000_0002;
const V4L2_CAP_VIDEO_CAPTURE_MPLANE: u32 = 0x0000_1000;
const V4L2_CAP_VIDEO_OUTPUT_MPLANE: u32 = 0x0000_2000;
const V4L2_CAP_VIDEO_M2M_MPLANE: u32 = 0x0000_4000;
const V4L2_CAP_VIDEO_M2M: u32 = 0x0000_8000;
const V4L2_CAP_META_CAPTURE: u32 = 0x0080_0000;
const V4L2_CAP_DEVICE_CAPS: u32 = 0x8000_0000;

#[repr(C)]
struct V4l2Capability {
    driver: [u8; 16],
    card: [u8; 32],
    bus_info: [u8; 32],
    version: u32,
    capabilities: u32,
    device_caps: u32,
    reserved: [u32; 3],
}

fn query_v4l2_cap(fd: RawFd) -> Option<V4l2Capability> {
    let mut cap: V4l2Capability = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(fd, VIDIOC_QUERYCAP as _, &mut cap as *mut V4l2Capability) };
    if result < 0 { None } else { Some(cap) }
}

fn c_string(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&c| c == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).trim().to_string()
}

/// Device information from `VIDIOC_QUERYCAP`
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    /// Name of the device (V4L2 card)
    pub card: String,
    pub driver: String,
    pub bus_info: String,
    /// Node path, e.g. /dev/video0
    pub path: String,
    /// Capabilities of this node (device caps when the driver reports them)
    pub caps: u32,
}

impl DeviceInfo {
    pub fn kind(&self) -> DeviceKind {
        classify_caps(self.caps)
    }
}

/// Map node capabilities to a device kind
pub fn classify_caps(caps: u32) -> DeviceKind {
    if caps & (V4L2_CAP_VIDEO_M2M | V4L2_CAP_VIDEO_M2M_MPLANE) != 0 {
        DeviceKind::VideoOutput
    } else if caps & (V4L2_CAP_VIDEO_CAPTURE | V4L2_CAP_VIDEO_CAPTURE_MPLANE) != 0 {
        DeviceKind::VideoInput
    } else if caps & (V4L2_CAP_VIDEO_OUTPUT | V4L2_CAP_VIDEO_OUTPUT_MPLANE) != 0 {
        DeviceKind::VideoOutput
    } else if caps & V4L2_CAP_META_CAPTURE != 0 {
        DeviceKind::Metadata
    } else {
        DeviceKind::Other
    }
}

/// Query a node. Open errors are returned so callers can tell
/// "permission denied" apart from "not a V4L2 device".
pub fn query_device_info(path: &Path) -> std::io::Result<Option<DeviceInfo>> {
    let file = File::open(path)?;
    let Some(cap) = query_v4l2_cap(file.as_raw_fd()) else {
        return Ok(None);
    };

    let caps = if cap.capabilities & V4L2_CAP_DEVICE_CAPS != 0 {
        cap.device_caps
    } else {
        cap.capabilities
    };

    let info = DeviceInfo {
        card: c_string(&cap.card),
        driver: c_string(&cap.driver),
        bus_info: c_string(&cap.bus_info),
        path: path.to_string_lossy().to_string(),
        caps,
    };
    debug!(path = %info.path, card = %info.card, driver = %info.driver, caps = format!("{:#x}", caps), "Queried V4L2 node");
    Ok(Some(info))
}

/// Number suffix of a `videoN` node name
fn node_number(name: &str) -> Option<u32> {
    name.strip_prefix(VIDEO_NODE_PREFIX)?.parse().ok()
}

/// `videoN` nodes in `dir`, ordered by N
pub fn list_video_nodes(dir: &Path) -> Vec<PathBuf> {
    let mut nodes: Vec<(u32, PathBuf)> = std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name();
            let number = node_number(&name.to_string_lossy())?;
            Some((number, entry.path()))
        })
        .collect();
    nodes.sort_by_key(|(number, _)| *number);
    nodes.into_iter().map(|(_, path)| path).collect()
}

/// Describe one node for enumeration.
///
/// Nodes we may not open are reported as the placeholder entry; nodes that
/// do not answer `VIDIOC_QUERYCAP` are skipped.
pub fn describe_node(path: &Path) -> Option<CameraDevice> {
    match query_device_info(path) {
        Ok(Some(info)) => Some(CameraDevice::new(info.path.clone(), info.card.clone(), info.kind())),
        Ok(None) => None,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            debug!(path = %path.display(), "No access to video node, reporting placeholder");
            Some(CameraDevice::placeholder())
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Skipping video node");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_caps() {
        assert_eq!(classify_caps(V4L2_CAP_VIDEO_CAPTURE), DeviceKind::VideoInput);
        assert_eq!(classify_caps(V4L2_CAP_VIDEO_CAPTURE_MPLANE), DeviceKind::VideoInput);
        assert_eq!(classify_caps(V4L2_CAP_META_CAPTURE), DeviceKind::Metadata);
        assert_eq!(
            classify_caps(V4L2_CAP_VIDEO_M2M | V4L2_CAP_VIDEO_CAPTURE),
            DeviceKind::VideoOutput
        );
        assert_eq!(classify_caps(0), DeviceKind::Other);
    }

    #[test]
    fn test_node_number() {
        assert_eq!(node_number("video12"), Some(12));
        assert_eq!(node_number("video"), None);
        assert_eq!(node_number("vbi0"), None);
    }

    #[test]
    fn test_list_video_nodes_sorted_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["video10", "video2", "video0", "media0", "videoX"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let nodes: Vec<String> = list_video_nodes(dir.path())
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(nodes, vec!["video0", "video2", "video10"]);
    }

    #[test]
    fn test_regular_file_is_not_a_device() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video0");
        std::fs::write(&path, b"").unwrap();
        assert!(describe_node(&path).is_none());
    }
}
