//! Native camera backend built on `nokhwa`.
//!
//! The `nokhwa` device handle is not `Send`, so it lives on its own thread
//! for its whole life. [`NokhwaCamera`] talks to that thread over channels
//! and can be moved freely between the UI context and the capture thread.

use super::{Camera, CameraError, CaptureConfig, Frame, Shot};
use crossbeam_channel::{bounded, Receiver, Sender};
use nokhwa::pixel_format::LumaFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use std::thread::{self, JoinHandle};

struct DeviceThread {
    requests: Sender<()>,
    frames: Receiver<Result<Frame, CameraError>>,
    handle: JoinHandle<()>,
}

/// Camera backed by a native capture device.
#[derive(Default)]
pub struct NokhwaCamera {
    device: Option<DeviceThread>,
}

impl NokhwaCamera {
    /// Creates an unopened camera; the device is chosen on `open`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for NokhwaCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NokhwaCamera")
            .field("open", &self.device.is_some())
            .finish()
    }
}

fn open_device(config: &CaptureConfig) -> Result<nokhwa::Camera, CameraError> {
    let format = RequestedFormat::new::<LumaFormat>(RequestedFormatType::Closest(
        CameraFormat::new(
            Resolution::new(config.width, config.height),
            FrameFormat::MJPEG,
            config.fps,
        ),
    ));
    let mut device = nokhwa::Camera::new(CameraIndex::Index(config.device_id), format)
        .map_err(|e| CameraError::DeviceNotFound(e.to_string()))?;
    device
        .open_stream()
        .map_err(|e| CameraError::OpenFailed(e.to_string()))?;
    Ok(device)
}

fn device_loop(
    mut device: nokhwa::Camera,
    requests: Receiver<()>,
    frames: Sender<Result<Frame, CameraError>>,
) {
    let mut sequence = 0u64;
    while requests.recv().is_ok() {
        let result = device
            .frame()
            .and_then(|buffer| buffer.decode_image::<LumaFormat>())
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))
            .map(|luma| {
                sequence += 1;
                let (width, height) = luma.dimensions();
                Frame::new(luma.into_raw(), width, height, sequence)
            });
        if frames.send(result).is_err() {
            break;
        }
    }
    if let Err(e) = device.stop_stream() {
        tracing::warn!(error = %e, "Failed to stop camera stream");
    }
}

impl Camera for NokhwaCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.close();

        let (init_tx, init_rx) = bounded(1);
        let (request_tx, request_rx) = bounded(1);
        let (frame_tx, frame_rx) = bounded(1);
        let config = config.clone();

        let handle = thread::Builder::new()
            .name("camera-device".into())
            .spawn(move || match open_device(&config) {
                Ok(device) => {
                    let _ = init_tx.send(Ok(()));
                    device_loop(device, request_rx, frame_tx);
                }
                Err(e) => {
                    let _ = init_tx.send(Err(e));
                }
            })
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;

        match init_rx.recv() {
            Ok(Ok(())) => {
                self.device = Some(DeviceThread {
                    requests: request_tx,
                    frames: frame_rx,
                    handle,
                });
                tracing::info!("Camera device opened");
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(CameraError::OpenFailed("camera thread exited".into()))
            }
        }
    }

    fn capture(&mut self) -> Result<Shot, CameraError> {
        let device = self.device.as_ref().ok_or(CameraError::NotInitialized)?;
        device
            .requests
            .send(())
            .map_err(|_| CameraError::CaptureFailed("camera thread exited".into()))?;
        let frame = device
            .frames
            .recv()
            .map_err(|_| CameraError::CaptureFailed("camera thread exited".into()))??;
        Ok(Shot::upright(frame))
    }

    fn is_open(&self) -> bool {
        self.device.is_some()
    }

    fn close(&mut self) {
        if let Some(device) = self.device.take() {
            drop(device.requests);
            drop(device.frames);
            if device.handle.join().is_err() {
                tracing::error!("Camera device thread panicked");
            }
            tracing::info!("Camera device closed");
        }
    }
}

impl Drop for NokhwaCamera {
    fn drop(&mut self) {
        self.close();
    }
}
