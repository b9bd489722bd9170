//! Microphone capture via `cpal`.
//!
//! The device is captured at its native rate, mixed down to mono and
//! resampled with rubato before being cut into fixed-size frames.
//! `cpal::Stream` is `!Send`, so each capture owns a dedicated thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc as std_mpsc};
use std::thread;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BuildStreamError, SampleFormat, StreamConfig};
use parking_lot::Mutex;
use rubato::{FftFixedIn, Resampler as _};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::{AudioInput, CaptureControl, CaptureStream, DeviceError};
use crate::pcm::Format;

const RESAMPLE_CHUNK: usize = 1024;

/// Default microphone input.
#[derive(Default)]
pub struct CpalInput {
    active: Mutex<Option<Arc<CpalCapture>>>,
    closed: AtomicBool,
}

impl CpalInput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioInput for CpalInput {
    fn open_capture(
        &self,
        format: Format,
        frame_samples: usize,
    ) -> Result<CaptureStream, DeviceError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DeviceError::Closed);
        }

        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (init_tx, init_rx) = std_mpsc::channel::<Result<(), DeviceError>>();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let target_rate = format.sample_rate;

        thread::Builder::new()
            .name("speakboard-capture".into())
            .spawn(move || {
                let stream = match build_stream(target_rate, frame_samples.max(1), frame_tx) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = init_tx.send(Err(e));
                        return;
                    }
                };
                if let Err(e) = stream.play() {
                    let _ = init_tx.send(Err(DeviceError::Backend(e.to_string())));
                    return;
                }
                if init_tx.send(Ok(())).is_err() {
                    return;
                }
                let _ = stop_rx.recv();
                drop(stream);
                debug!("capture thread exiting");
            })
            .map_err(|e| DeviceError::Backend(format!("spawn capture thread: {e}")))?;

        init_rx
            .recv()
            .map_err(|_| DeviceError::Backend("capture thread died".to_string()))??;

        let capture = Arc::new(CpalCapture {
            stop_tx: Mutex::new(Some(stop_tx)),
        });
        *self.active.lock() = Some(Arc::clone(&capture));
        Ok(CaptureStream::new(frame_rx, capture))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(capture) = self.active.lock().take() {
            capture.stop();
        }
    }
}

struct CpalCapture {
    stop_tx: Mutex<Option<std_mpsc::Sender<()>>>,
}

impl CaptureControl for CpalCapture {
    fn stop(&self) {
        if let Some(tx) = self.stop_tx.lock().take() {
            let _ = tx.send(());
        }
    }
}

fn build_stream(
    target_rate: u32,
    frame_samples: usize,
    frames: mpsc::UnboundedSender<Vec<f32>>,
) -> Result<cpal::Stream, DeviceError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| DeviceError::Unavailable("no input device".to_string()))?;
    let config = device
        .default_input_config()
        .map_err(|e| DeviceError::Unavailable(e.to_string()))?;

    let device_rate = config.sample_rate().0;
    let channels = config.channels();
    info!(
        device = %device.name().unwrap_or_default(),
        sample_rate = device_rate,
        channels,
        "audio capture opened"
    );

    let assembler = Arc::new(Mutex::new(FrameAssembler::new(
        device_rate,
        target_rate,
        frame_samples,
        frames,
    )?));
    let stream_config: StreamConfig = config.clone().into();
    let err_fn = |err: cpal::StreamError| error!(%err, "audio input stream error");

    let stream = match config.sample_format() {
        SampleFormat::F32 => {
            let assembler = Arc::clone(&assembler);
            device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    assembler.lock().push(&mix_to_mono(data, channels));
                },
                err_fn,
                None,
            )
        }
        SampleFormat::I16 => {
            let assembler = Arc::clone(&assembler);
            device.build_input_stream(
                &stream_config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let floats: Vec<f32> = data.iter().map(|&s| f32::from(s) / 32768.0).collect();
                    assembler.lock().push(&mix_to_mono(&floats, channels));
                },
                err_fn,
                None,
            )
        }
        other => {
            return Err(DeviceError::Backend(format!(
                "unsupported sample format: {other:?}"
            )));
        }
    };

    stream.map_err(map_build_error)
}

fn map_build_error(err: BuildStreamError) -> DeviceError {
    match err {
        BuildStreamError::DeviceNotAvailable => {
            DeviceError::Unavailable("input device not available".to_string())
        }
        BuildStreamError::BackendSpecific { err } if err.description.contains("ermission") => {
            DeviceError::PermissionDenied(err.description)
        }
        other => DeviceError::Backend(other.to_string()),
    }
}

fn mix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Resamples device-rate mono input and cuts it into fixed frames.
struct FrameAssembler {
    resampler: Option<FftFixedIn<f32>>,
    input: Vec<f32>,
    output: Vec<f32>,
    frame_samples: usize,
    frames: mpsc::UnboundedSender<Vec<f32>>,
}

impl FrameAssembler {
    fn new(
        from_rate: u32,
        to_rate: u32,
        frame_samples: usize,
        frames: mpsc::UnboundedSender<Vec<f32>>,
    ) -> Result<Self, DeviceError> {
        let resampler = if from_rate == to_rate {
            None
        } else {
            Some(
                FftFixedIn::<f32>::new(
                    from_rate as usize,
                    to_rate as usize,
                    RESAMPLE_CHUNK,
                    2,
                    1,
                )
                .map_err(|e| DeviceError::Backend(e.to_string()))?,
            )
        };
        Ok(Self {
            resampler,
            input: Vec::new(),
            output: Vec::new(),
            frame_samples,
            frames,
        })
    }

    fn push(&mut self, mono: &[f32]) {
        match self.resampler.as_mut() {
            None => self.output.extend_from_slice(mono),
            Some(resampler) => {
                self.input.extend_from_slice(mono);
                while self.input.len() >= resampler.input_frames_next() {
                    let needed = resampler.input_frames_next();
                    let chunk: Vec<f32> = self.input.drain(..needed).collect();
                    match resampler.process(&[chunk], None) {
                        Ok(out) => {
                            if let Some(channel) = out.first() {
                                self.output.extend_from_slice(channel);
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "resample failed");
                            return;
                        }
                    }
                }
            }
        }

        while self.output.len() >= self.frame_samples {
            let frame: Vec<f32> = self.output.drain(..self.frame_samples).collect();
            // Receiver gone means the session stopped listening.
            let _ = self.frames.send(frame);
        }
    }
}
