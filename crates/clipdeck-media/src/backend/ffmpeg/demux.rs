// crates/clipdeck-media/src/backend/ffmpeg/demux.rs
//
// Owns the format::Input for one session. Packets come out in file order,
// one per read; the session routes them by stream index.

use std::path::{Path, PathBuf};

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::input;

use clipdeck_core::{DecodeError, OpenError};

use crate::backend::{Demux, DemuxedPacket};

pub struct FfmpegDemuxer {
    path: PathBuf,
    ictx: ffmpeg::format::context::Input,
}

impl FfmpegDemuxer {
    pub(crate) fn open(path: &Path) -> Result<Self, OpenError> {
        let ictx = input(path).map_err(|e| OpenError::ContainerOpenFailed {
            path:   path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self { path: path.to_path_buf(), ictx })
    }

    pub fn path(&self) -> &Path { &self.path }

    pub(crate) fn input(&self) -> &ffmpeg::format::context::Input { &self.ictx }
}

impl Demux for FfmpegDemuxer {
    type Packet = ffmpeg::Packet;

    fn read_packet(&mut self) -> Result<Option<DemuxedPacket<ffmpeg::Packet>>, DecodeError> {
        let mut packet = ffmpeg::Packet::empty();
        match packet.read(&mut self.ictx) {
            Ok(()) => Ok(Some(DemuxedPacket {
                stream: packet.stream(),
                pts:    packet.pts(),
                packet,
            })),
            Err(ffmpeg::Error::Eof) => Ok(None),
            Err(e) => Err(DecodeError::Demux(e.to_string())),
        }
    }

    /// Stream-indexed seek so `ts` is interpreted in that stream's time base.
    /// AVSEEK_FLAG_BACKWARD lands on the keyframe at or before `ts`.
    fn seek_backward(&mut self, stream: usize, ts: i64) -> Result<(), DecodeError> {
        let ret = unsafe {
            ffmpeg::ffi::av_seek_frame(
                self.ictx.as_mut_ptr(),
                stream as i32,
                ts,
                ffmpeg::ffi::AVSEEK_FLAG_BACKWARD as i32,
            )
        };
        if ret < 0 {
            return Err(DecodeError::Seek(ffmpeg::Error::from(ret).to_string()));
        }
        Ok(())
    }
}
