// crates/clipdeck-media/src/probe.rs
//
// Session open: container → probe → stream selection → video decoder +
// converter → presentation image → audio decoder + resampler.
//
// Each step binds a local; any `?` drops the locals acquired so far in
// reverse order, which is the rollback. Nothing touches the pool here, so a
// failed open never consumes a slot.

use std::path::Path;

use tracing::{debug, info};

use clipdeck_core::{OpenError, OpenParams, PacketQueue, PlaybackClock, PoolConfig, PresentationImage};

use crate::audio::AudioTrack;
use crate::backend::{MediaBackend, VideoDecode};
use crate::session::Session;

pub(crate) fn open_session<B: MediaBackend>(
    backend: &B,
    path:    &Path,
    params:  &OpenParams,
    config:  &PoolConfig,
) -> Result<Session<B>, OpenError> {
    let mut demux = backend.open_container(path)?;
    let info = backend.probe(&mut demux)?;

    // First occurrence of each medium wins.
    let video_stream = info.first_video().cloned().ok_or(OpenError::NoVideoStream)?;
    let video = backend.open_video(&demux, &video_stream)?;
    let image = PresentationImage::new(video.width(), video.height());

    let output_format = params.audio_format();
    let (audio, audio_stream) = match info.first_audio() {
        Some(stream) if !params.disable_audio => {
            let decoder = backend.open_audio(&demux, stream, output_format)?;
            let track = AudioTrack::new(decoder, stream.index, output_format, config.queue_low_water);
            (Some(track), Some(stream.clone()))
        }
        Some(stream) => {
            debug!(path = %path.display(), stream = stream.index, "audio disabled by caller");
            (None, None)
        }
        None => {
            debug!(path = %path.display(), "no audio stream");
            (None, None)
        }
    };

    info!(
        path     = %path.display(),
        width    = video.width(),
        height   = video.height(),
        duration = info.duration_secs,
        video    = %video_stream.codec,
        audio    = audio_stream.as_ref().map(|s| s.codec.as_str()).unwrap_or("none"),
        "opened"
    );

    Ok(Session {
        video,
        audio,
        demux,
        image,
        path:           path.to_path_buf(),
        video_stream,
        audio_stream,
        output_format,
        video_queue:    PacketQueue::new(config.queue_low_water),
        pending_video:  None,
        demux_eof:      false,
        drained:        false,
        read_errors:    0,
        audio_floor_ts: None,
        clock:          PlaybackClock::new(info.duration_secs, config.seek_epsilon_secs),
    })
}
