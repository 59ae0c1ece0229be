// crates/clipdeck-media/src/thumbnail.rs
//
// One-shot frame extraction at an arbitrary position.
//
// Reuses the playback seek (flush → backward seek → decode forward) but
// converts into a disposable image sized by fit_box instead of the session's
// presentation image. The demux cursor has moved afterwards, so the clock is
// invalidated and the next playback tick re-seeks. A session used for both
// live playback and thumbnails pays that resync on every extraction.

use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use clipdeck_core::geometry::fit_box;
use clipdeck_core::{RgbaImage, SessionError};

use crate::backend::{MediaBackend, VideoDecode};
use crate::session::Session;

/// An extracted frame. Owned by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Thumbnail {
    pub image:  RgbaImage,
    pub width:  u32,
    pub height: u32,
}

impl Thumbnail {
    /// Write the thumbnail as an 8-bit RGBA PNG.
    pub fn save_png(&self, dest: &Path) -> Result<()> {
        let file = std::fs::File::create(dest)
            .with_context(|| format!("create {}", dest.display()))?;
        let w = &mut BufWriter::new(file);
        let mut encoder = png::Encoder::new(w, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().context("write PNG header")?;
        writer.write_image_data(&self.image.pixels).context("write PNG data")?;
        info!(path = %dest.display(), width = self.width, height = self.height, "thumbnail saved");
        Ok(())
    }
}

impl<B: MediaBackend> Session<B> {
    pub(crate) fn thumbnail(
        &mut self,
        position_secs: f64,
        box_size:      (u32, u32),
    ) -> Result<Thumbnail, SessionError> {
        let target = self.clock.clamp(position_secs);
        let found = self.seek_and_scan(target, "thumbnail");
        self.clock.invalidate();
        if found.is_none() {
            return Err(SessionError::NoFrame { at_secs: target });
        }

        let (width, height) = fit_box(self.video.width(), self.video.height(), box_size.0, box_size.1);
        let mut image = RgbaImage::new(width, height);
        self.video.convert_into(&mut image.pixels, width, height)?;
        debug!(path = %self.path.display(), at = target, width, height, "thumbnail extracted");
        Ok(Thumbnail { image, width, height })
    }
}
