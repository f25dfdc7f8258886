// ============================================================================
// vidmark-core/src/external/ffmpeg_source.rs
// ============================================================================
//
// FFMPEG FRAME SOURCE: Decoding Videos into RGB Frames
//
// Opens a video by probing it with ffprobe for its dimensions, frame rate
// and frame count, then spawns ffmpeg through ffmpeg-sidecar to decode the
// first video stream to raw RGB24 frames on stdout. Frames are pulled one
// at a time from the sidecar event iterator.
//
// AI-ASSISTANT-INFO: ffmpeg-sidecar frame decoding and ffprobe metadata

// ---- Internal crate imports ----
use super::{FrameSource, FrameSourceOpener};
use crate::detection::{Frame, VideoMetadata};
use crate::error::{CoreError, CoreResult, source_open_error};

// ---- External crate imports ----
use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use ffmpeg_sidecar::iter::FfmpegIterator;
use ffprobe::ffprobe;

// ---- Standard library imports ----
use std::path::{Path, PathBuf};

/// Opens videos with ffprobe + ffmpeg-sidecar.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarSourceOpener;

impl FrameSourceOpener for SidecarSourceOpener {
    type Source = SidecarFrameSource;

    fn open(&self, path: &Path) -> CoreResult<Self::Source> {
        if !path.is_file() {
            return Err(CoreError::SourceNotFound(path.display().to_string()));
        }

        let metadata = probe_video_metadata(path)?;

        let mut cmd = FfmpegCommand::new();
        cmd.hide_banner()
            .input(path.to_string_lossy().as_ref())
            .args(["-map", "0:v:0"])
            .rawvideo();
        log::debug!("Spawning frame decoder: {:?}", cmd);

        let mut child = cmd.spawn().map_err(|e| source_open_error(path, e))?;
        let events = match child.iter() {
            Ok(events) => events,
            Err(e) => {
                let _ = child.kill();
                return Err(source_open_error(path, e));
            }
        };

        Ok(SidecarFrameSource {
            path: path.to_path_buf(),
            metadata,
            child,
            events,
            frames_read: 0,
            last_error: None,
            finished: false,
        })
    }
}

/// A running ffmpeg decode of one video.
///
/// The ffmpeg process is killed if the source is dropped before the stream
/// is exhausted.
pub struct SidecarFrameSource {
    path: PathBuf,
    metadata: VideoMetadata,
    child: FfmpegChild,
    events: FfmpegIterator,
    frames_read: u64,
    last_error: Option<String>,
    finished: bool,
}

impl SidecarFrameSource {
    /// Reaps the decoder and decides whether the stream ended cleanly.
    fn finish(&mut self) -> CoreResult<Option<Frame>> {
        self.finished = true;
        let status = self.child.wait()?;

        if status.success() {
            return Ok(None);
        }

        let reason = self
            .last_error
            .take()
            .unwrap_or_else(|| format!("ffmpeg exited with {status}"));

        if self.frames_read == 0 {
            return Err(CoreError::Decode(format!(
                "{}: {}",
                self.path.display(),
                reason
            )));
        }

        log::warn!(
            "Decoding of {} stopped after {} frame(s): {}",
            self.path.display(),
            self.frames_read,
            reason
        );
        Ok(None)
    }
}

impl FrameSource for SidecarFrameSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn next_frame(&mut self) -> CoreResult<Option<Frame>> {
        if self.finished {
            return Ok(None);
        }

        while let Some(event) = self.events.next() {
            match event {
                FfmpegEvent::OutputFrame(frame) => {
                    let index = self.frames_read;
                    self.frames_read += 1;
                    return Ok(Some(Frame::new(index, frame.width, frame.height, frame.data)));
                }
                FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, message) => {
                    log::debug!("ffmpeg: {}", message);
                    self.last_error = Some(message);
                }
                FfmpegEvent::Error(message) => {
                    log::debug!("ffmpeg-sidecar: {}", message);
                    self.last_error = Some(message);
                }
                FfmpegEvent::Done => break,
                _ => {}
            }
        }

        self.finish()
    }
}

impl Drop for SidecarFrameSource {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

// ============================================================================
// METADATA PROBING
// ============================================================================

/// Reads dimensions, frame rate and frame count of the first video stream.
///
/// The frame rate is taken from `avg_frame_rate`, then `r_frame_rate`, and
/// is 0.0 when neither parses. The frame count comes from `nb_frames` when
/// the container records it, otherwise it is estimated from the duration.
pub fn probe_video_metadata(path: &Path) -> CoreResult<VideoMetadata> {
    log::debug!("Running ffprobe for video metadata on: {}", path.display());

    let probe = ffprobe(path).map_err(|e| {
        log::error!("ffprobe failed for {}: {:?}", path.display(), e);
        source_open_error(path, e)
    })?;

    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| source_open_error(path, "no video stream found"))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w as u32, h as u32),
        (w, h) => {
            return Err(source_open_error(
                path,
                format!("invalid video dimensions {w:?}x{h:?}"),
            ));
        }
    };

    let fps = parse_frame_rate(&stream.avg_frame_rate)
        .or_else(|| parse_frame_rate(&stream.r_frame_rate))
        .unwrap_or(0.0);

    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|&n| n > 0)
        .unwrap_or_else(|| {
            probe
                .format
                .duration
                .as_deref()
                .and_then(|d| d.parse::<f64>().ok())
                .map_or(0, |duration| (duration * fps).round().max(0.0) as u64)
        });

    log::debug!(
        "Probed {}: {}x{} @ {:.3} fps, {} frame(s)",
        path.display(),
        width,
        height,
        fps,
        frame_count
    );

    Ok(VideoMetadata::new(width, height, fps, frame_count))
}

/// Parses an ffprobe rate such as `30000/1001` or `25`.
///
/// Returns `None` for unparsable or non-positive rates (`0/0` is common for
/// streams without a declared rate).
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse::<f64>().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}
