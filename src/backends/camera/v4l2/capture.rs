// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 capture thread
//!
//! The thread owns the capture handle for the lifetime of a stream. It
//! negotiates the format, reports the outcome once, then streams preview
//! frames until asked to stop.

use crate::backends::camera::types::{CameraFrame, FrameSender, MediaRange, PixelFormat};
use crate::constants::CAPTURE_BUFFER_COUNT;
use crate::errors::{BackendError, BackendResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::framesize::FrameSizeEnum;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

const FOURCC_YUYV: &[u8; 4] = b"YUYV";
const FOURCC_MJPG: &[u8; 4] = b"MJPG";
const FOURCC_GREY: &[u8; 4] = b"GREY";

/// Format the device agreed to
#[derive(Debug, Clone)]
pub struct NegotiatedFormat {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub fourcc: FourCC,
    /// Supported width range for the chosen pixel format
    pub width_range: Option<MediaRange>,
    /// Supported height range for the chosen pixel format
    pub height_range: Option<MediaRange>,
}

/// Running capture thread; stopped and joined on drop
pub struct CaptureThread {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureThread {
    /// Start capturing from `path` at roughly `width`x`height`.
    ///
    /// Blocks until the device has accepted a format or failed to. Without a
    /// `sender` buffers are still dequeued but never decoded.
    pub fn start(
        path: &str,
        width: u32,
        height: u32,
        sender: Option<FrameSender>,
    ) -> BackendResult<(Self, NegotiatedFormat)> {
        let stop = Arc::new(AtomicBool::new(false));
        let (init_tx, init_rx) = std_mpsc::sync_channel(1);

        let thread_stop = Arc::clone(&stop);
        let thread_path = path.to_string();
        let handle = std::thread::Builder::new()
            .name("v4l2-capture".into())
            .spawn(move || capture_loop(&thread_path, width, height, thread_stop, init_tx, sender))
            .map_err(|e| BackendError::StreamFailed(e.to_string()))?;

        let mut thread = Self {
            stop,
            handle: Some(handle),
        };

        match init_rx.recv() {
            Ok(Ok(format)) => Ok((thread, format)),
            Ok(Err(e)) => {
                thread.stop_and_join();
                Err(e)
            }
            Err(_) => {
                thread.stop_and_join();
                Err(BackendError::StreamFailed(
                    "capture thread exited before negotiating a format".into(),
                ))
            }
        }
    }

    fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("V4L2 capture thread panicked");
        }
    }
}

impl Drop for CaptureThread {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

/// Ask for YUYV first, then MJPG, then whatever the driver settles on
fn negotiate(dev: &Device, width: u32, height: u32) -> BackendResult<Format> {
    let mut last = None;
    for fourcc in [FOURCC_YUYV, FOURCC_MJPG] {
        let requested = Format::new(width, height, FourCC::new(fourcc));
        match dev.set_format(&requested) {
            Ok(actual) if actual.fourcc == requested.fourcc => return Ok(actual),
            Ok(actual) => last = Some(actual),
            Err(e) => debug!(fourcc = ?requested.fourcc, error = %e, "Format rejected"),
        }
    }
    match last {
        Some(format) => Ok(format),
        None => dev
            .format()
            .map_err(|e| BackendError::FormatNotSupported(e.to_string())),
    }
}

/// Width/height ranges the device offers for `fourcc`
fn frame_size_ranges(dev: &Device, fourcc: FourCC) -> (Option<MediaRange>, Option<MediaRange>) {
    let Ok(sizes) = dev.enum_framesizes(fourcc) else {
        return (None, None);
    };

    let mut width: Option<MediaRange> = None;
    let mut height: Option<MediaRange> = None;
    let widen = |slot: &mut Option<MediaRange>, min: u32, max: u32, step: u32| {
        let (min, max, step) = (f64::from(min), f64::from(max), f64::from(step.max(1)));
        *slot = Some(match *slot {
            Some(range) => MediaRange::new(range.min.min(min), range.max.max(max), range.step.min(step)),
            None => MediaRange::new(min, max, step),
        });
    };

    for size in sizes {
        match size.size {
            FrameSizeEnum::Discrete(discrete) => {
                widen(&mut width, discrete.width, discrete.width, 1);
                widen(&mut height, discrete.height, discrete.height, 1);
            }
            FrameSizeEnum::Stepwise(step) => {
                widen(&mut width, step.min_width, step.max_width, step.step_width);
                widen(&mut height, step.min_height, step.max_height, step.step_height);
            }
        }
    }
    (width, height)
}

fn capture_loop(
    path: &str,
    width: u32,
    height: u32,
    stop: Arc<AtomicBool>,
    init: std_mpsc::SyncSender<BackendResult<NegotiatedFormat>>,
    mut sender: Option<FrameSender>,
) {
    let dev = match Device::with_path(path) {
        Ok(dev) => dev,
        Err(e) => {
            let _ = init.send(Err(e.into()));
            return;
        }
    };

    let format = match negotiate(&dev, width, height) {
        Ok(format) => format,
        Err(e) => {
            let _ = init.send(Err(e));
            return;
        }
    };
    let (width_range, height_range) = frame_size_ranges(&dev, format.fourcc);

    let mut stream = match Stream::with_buffers(&dev, Type::VideoCapture, CAPTURE_BUFFER_COUNT) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = init.send(Err(BackendError::StreamFailed(e.to_string())));
            return;
        }
    };

    info!(
        path,
        width = format.width,
        height = format.height,
        fourcc = ?format.fourcc,
        "V4L2 capture started"
    );
    let negotiated = NegotiatedFormat {
        width: format.width,
        height: format.height,
        stride: format.stride,
        fourcc: format.fourcc,
        width_range,
        height_range,
    };
    if init.send(Ok(negotiated)).is_err() {
        return;
    }

    while !stop.load(Ordering::SeqCst) {
        let buf = match stream.next() {
            Ok((buf, _meta)) => buf,
            Err(e) => {
                warn!(path, error = %e, "Failed to capture frame");
                break;
            }
        };

        let Some(preview) = sender.as_mut() else {
            continue;
        };
        let Some(frame) = decode_frame(buf, &format) else {
            continue;
        };

        // A full channel means the UI is behind; drop the frame
        if let Err(e) = preview.try_send(frame)
            && e.is_disconnected()
        {
            debug!(path, "Preview receiver dropped, decoding stops");
            sender = None;
        }
    }

    info!(path, "V4L2 capture stopped");
}

/// Turn a raw buffer into a preview frame
fn decode_frame(buf: &[u8], format: &Format) -> Option<CameraFrame> {
    if format.fourcc == FourCC::new(FOURCC_MJPG) {
        let decoded = match image::load_from_memory_with_format(buf, image::ImageFormat::Jpeg) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                debug!(error = %e, "Dropping undecodable MJPG frame");
                return None;
            }
        };
        let (width, height) = decoded.dimensions();
        return Some(CameraFrame {
            width,
            height,
            stride: width * 3,
            format: PixelFormat::Rgb24,
            data: Arc::from(decoded.into_raw().into_boxed_slice()),
        });
    }

    let (pixel_format, min_stride) = if format.fourcc == FourCC::new(FOURCC_YUYV) {
        (PixelFormat::Yuyv, format.width * 2)
    } else if format.fourcc == FourCC::new(FOURCC_GREY) {
        (PixelFormat::Gray8, format.width)
    } else {
        return None;
    };
    let stride = format.stride.max(min_stride);
    if buf.len() < (stride * format.height) as usize {
        return None;
    }

    Some(CameraFrame {
        width: format.width,
        height: format.height,
        stride,
        format: pixel_format,
        data: Arc::from(buf),
    })
}
