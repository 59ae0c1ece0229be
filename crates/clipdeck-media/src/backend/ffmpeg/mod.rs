// crates/clipdeck-media/src/backend/ffmpeg/mod.rs
//
// ffmpeg-the-third backend.
//
//   demux.rs  format::Input wrapper: packet reads, stream-indexed backward seek
//   video.rs  video decoder + swscale to RGBA8
//   audio.rs  audio decoder + swresample to planar f32
//
// Probing reads stream parameters straight off the AVCodecParameters pointer
// (width/height/sample_rate are not exposed on ParametersRef).

pub mod audio;
pub mod demux;
pub mod video;

use std::path::Path;

use ffmpeg_the_third as ffmpeg;
use ffmpeg::media::Type;

use clipdeck_core::helpers::time::TimeBase;
use clipdeck_core::{AudioFormat, OpenError};

use super::{ContainerInfo, MediaBackend, StreamInfo, StreamKind};

pub use audio::FfmpegAudio;
pub use demux::FfmpegDemuxer;
pub use video::FfmpegVideo;

/// Fallback when a stream reports neither avg_frame_rate nor r_frame_rate.
const FALLBACK_FPS: f64 = 25.0;

pub struct FfmpegBackend {
    _private: (),
}

impl FfmpegBackend {
    /// Initialise libav* once per process. Safe to call repeatedly.
    pub fn new() -> Result<Self, ffmpeg::Error> {
        ffmpeg::init()?;
        Ok(Self { _private: () })
    }
}

impl MediaBackend for FfmpegBackend {
    type Packet       = ffmpeg::Packet;
    type Demuxer      = FfmpegDemuxer;
    type VideoDecoder = FfmpegVideo;
    type AudioDecoder = FfmpegAudio;

    fn open_container(&self, path: &Path) -> Result<FfmpegDemuxer, OpenError> {
        FfmpegDemuxer::open(path)
    }

    fn probe(&self, demuxer: &mut FfmpegDemuxer) -> Result<ContainerInfo, OpenError> {
        let ictx = demuxer.input();
        let mut streams = Vec::new();

        for stream in ictx.streams() {
            let params = stream.parameters();
            let tb     = stream.time_base();
            let start  = stream.start_time();
            let kind = match params.medium() {
                Type::Video => {
                    let (w, h) = unsafe {
                        let p = params.as_ptr();
                        ((*p).width as u32, (*p).height as u32)
                    };
                    StreamKind::Video { width: w, height: h }
                }
                Type::Audio => {
                    let (rate, channels) = unsafe {
                        let p = params.as_ptr();
                        ((*p).sample_rate as u32, (*p).ch_layout.nb_channels as u16)
                    };
                    StreamKind::Audio { sample_rate: rate, channels }
                }
                _ => StreamKind::Other,
            };

            let frame_duration_secs = if matches!(kind, StreamKind::Video { .. }) {
                let avg = stream.avg_frame_rate();
                let r   = stream.rate();
                let fps = if avg.numerator() > 0 && avg.denominator() > 0 {
                    f64::from(avg)
                } else if r.numerator() > 0 && r.denominator() > 0 {
                    f64::from(r)
                } else {
                    FALLBACK_FPS
                };
                1.0 / fps
            } else {
                0.0
            };

            streams.push(StreamInfo {
                index:     stream.index(),
                kind,
                time_base: TimeBase::new(tb.numerator(), tb.denominator()),
                // AV_NOPTS_VALUE is i64::MIN.
                start_ts:  if start == i64::MIN { 0 } else { start },
                frame_duration_secs,
                codec:     format!("{:?}", params.id()),
            });
        }

        if streams.is_empty() {
            return Err(OpenError::StreamProbeFailed(format!(
                "no streams in '{}'", demuxer.path().display()
            )));
        }

        // Container duration first, video stream duration as fallback.
        let mut duration_secs = ictx.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64;
        if duration_secs <= 0.0 {
            if let Some(stream) = ictx.streams().best(Type::Video) {
                let tb = stream.time_base();
                duration_secs = stream.duration() as f64 * tb.numerator() as f64
                    / tb.denominator() as f64;
            }
        }

        Ok(ContainerInfo { duration_secs: duration_secs.max(0.0), streams })
    }

    fn open_video(&self, demuxer: &FfmpegDemuxer, stream: &StreamInfo) -> Result<FfmpegVideo, OpenError> {
        FfmpegVideo::open(demuxer, stream)
    }

    fn open_audio(
        &self,
        demuxer: &FfmpegDemuxer,
        stream:  &StreamInfo,
        target:  AudioFormat,
    ) -> Result<FfmpegAudio, OpenError> {
        FfmpegAudio::open(demuxer, stream, target)
    }
}
