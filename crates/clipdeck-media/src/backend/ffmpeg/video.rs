// crates/clipdeck-media/src/backend/ffmpeg/video.rs
//
// Video decoder + swscale converter.
//
// avcodec_receive_frame unrefs its output frame before trying, so frames are
// received into `incoming` and swapped into `current` only on success. The
// current frame therefore survives an EAGAIN and can still be converted.

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::software::scaling::{context::Context as SwsContext, flag::Flags};
use ffmpeg::util::frame::video::Video as VideoFrame;

use clipdeck_core::{DecodeError, OpenError};

use super::demux::FfmpegDemuxer;
use crate::backend::{StreamInfo, VideoDecode};
use crate::helpers::rgba::destripe;

pub struct FfmpegVideo {
    decoder:  ffmpeg::decoder::Video,
    scaler:   SwsContext,
    current:  VideoFrame,
    incoming: VideoFrame,
    rgba:     VideoFrame,
    last_pts: i64,
    width:    u32,
    height:   u32,
}

impl FfmpegVideo {
    pub(crate) fn open(demuxer: &FfmpegDemuxer, stream: &StreamInfo) -> Result<Self, OpenError> {
        let unsupported = |e: ffmpeg::Error| {
            OpenError::UnsupportedVideoCodec(format!("{} ({e})", stream.codec))
        };

        let av_stream = demuxer.input().stream(stream.index)
            .ok_or_else(|| OpenError::StreamProbeFailed(format!("stream {} vanished", stream.index)))?;
        let dec_ctx = ffmpeg::codec::context::Context::from_parameters(av_stream.parameters())
            .map_err(unsupported)?;
        let decoder = dec_ctx.decoder().video().map_err(unsupported)?;

        let (w, h) = (decoder.width(), decoder.height());
        if w == 0 || h == 0 || decoder.format() == Pixel::None {
            return Err(OpenError::UnsupportedVideoCodec(format!(
                "{}: unknown frame geometry {w}x{h}", stream.codec
            )));
        }

        let scaler = SwsContext::get(
            decoder.format(), w, h,
            Pixel::RGBA,      w, h,
            Flags::BILINEAR,
        ).map_err(unsupported)?;

        Ok(Self {
            decoder,
            scaler,
            current:  VideoFrame::empty(),
            incoming: VideoFrame::empty(),
            rgba:     VideoFrame::empty(),
            last_pts: stream.start_ts,
            width:    w,
            height:   h,
        })
    }

    /// Rebuild the native-size scaler when the decoder changes format or
    /// geometry mid-stream.
    fn ensure_scaler(&mut self) -> Result<(), DecodeError> {
        let src = self.scaler.input();
        let (fmt, w, h) = (self.current.format(), self.current.width(), self.current.height());
        if src.format == fmt && src.width == w && src.height == h {
            return Ok(());
        }
        self.scaler = SwsContext::get(fmt, w, h, Pixel::RGBA, self.width, self.height, Flags::BILINEAR)
            .map_err(|e| DecodeError::Convert(e.to_string()))?;
        self.rgba = VideoFrame::empty();
        Ok(())
    }
}

impl VideoDecode for FfmpegVideo {
    type Packet = ffmpeg::Packet;

    fn width(&self) -> u32 { self.width }
    fn height(&self) -> u32 { self.height }

    fn send_packet(&mut self, packet: &ffmpeg::Packet) -> Result<(), DecodeError> {
        self.decoder.send_packet(packet).map_err(|e| DecodeError::SendPacket(e.to_string()))
    }

    fn send_eof(&mut self) -> Result<(), DecodeError> {
        self.decoder.send_eof().map_err(|e| DecodeError::SendPacket(e.to_string()))
    }

    fn receive_frame(&mut self) -> Result<Option<i64>, DecodeError> {
        match self.decoder.receive_frame(&mut self.incoming) {
            Ok(()) => {
                std::mem::swap(&mut self.current, &mut self.incoming);
                let pts = self.current.pts().unwrap_or(self.last_pts + 1);
                self.last_pts = pts;
                Ok(Some(pts))
            }
            Err(ffmpeg::Error::Eof) => Ok(None),
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::util::error::EAGAIN => Ok(None),
            Err(e) => Err(DecodeError::ReceiveFrame(e.to_string())),
        }
    }

    fn convert_into(&mut self, dst: &mut [u8], width: u32, height: u32) -> Result<(), DecodeError> {
        if self.current.width() == 0 {
            return Err(DecodeError::Convert("no decoded frame".into()));
        }
        let convert_err = |e: ffmpeg::Error| DecodeError::Convert(e.to_string());

        if (width, height) == (self.width, self.height) {
            self.ensure_scaler()?;
            self.scaler.run(&self.current, &mut self.rgba).map_err(convert_err)?;
            return destripe(self.rgba.data(0), self.rgba.stride(0), width, height, dst);
        }

        // Off-size request (thumbnails): one-shot scaler, disposable output.
        let mut scaler = SwsContext::get(
            self.current.format(), self.current.width(), self.current.height(),
            Pixel::RGBA, width, height,
            Flags::BILINEAR,
        ).map_err(convert_err)?;
        let mut out = VideoFrame::empty();
        scaler.run(&self.current, &mut out).map_err(convert_err)?;
        destripe(out.data(0), out.stride(0), width, height, dst)
    }

    fn flush(&mut self) {
        self.decoder.flush();
    }
}
