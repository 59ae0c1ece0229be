// crates/clipdeck-core/src/image.rs
//
// CPU-side images. RGBA8, tightly packed (no row padding), row-major.
//
// PresentationImage is the session's "latest decoded frame". Uploads replace
// the pixels in place and bump `revision`; a renderer compares revisions to
// decide whether the GPU copy is stale. Only the tick thread writes it.

#[derive(Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub width:  u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, pixels: vec![0u8; Self::byte_len(width, height)] }
    }

    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 4
    }

    pub fn row_bytes(&self) -> usize {
        self.width as usize * 4
    }

    /// RGBA of the pixel at (x, y). Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]]
    }
}

impl std::fmt::Debug for RgbaImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RgbaImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

#[derive(Debug)]
pub struct PresentationImage {
    image:    RgbaImage,
    revision: u64,
}

impl PresentationImage {
    pub fn new(width: u32, height: u32) -> Self {
        Self { image: RgbaImage::new(width, height), revision: 0 }
    }

    pub fn width(&self) -> u32 { self.image.width }
    pub fn height(&self) -> u32 { self.image.height }

    /// Incremented on every upload. 0 means nothing has been presented yet.
    pub fn revision(&self) -> u64 { self.revision }

    pub fn pixels(&self) -> &[u8] { &self.image.pixels }

    /// Overwrite the pixels via `write` and publish a new revision. If `write`
    /// fails the revision is left untouched.
    pub fn upload_with<E>(
        &mut self,
        write: impl FnOnce(&mut [u8], u32, u32) -> Result<(), E>,
    ) -> Result<u64, E> {
        let (w, h) = (self.image.width, self.image.height);
        write(&mut self.image.pixels, w, h)?;
        self.revision += 1;
        Ok(self.revision)
    }
}
