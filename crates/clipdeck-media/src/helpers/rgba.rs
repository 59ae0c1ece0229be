// crates/clipdeck-media/src/helpers/rgba.rs
//
// RGBA8 row utilities.
//
// Converter output rows may carry stride padding past the visible pixels;
// presentation images and thumbnails are tightly packed. `destripe` copies
// only the visible `width * 4` bytes of each row.

use clipdeck_core::DecodeError;

/// Copy `height` rows of `width` RGBA pixels from a strided plane into a
/// packed destination.
pub fn destripe(
    src:    &[u8],
    stride: usize,
    width:  u32,
    height: u32,
    dst:    &mut [u8],
) -> Result<(), DecodeError> {
    let row_bytes = width as usize * 4;
    let rows      = height as usize;
    if stride < row_bytes {
        return Err(DecodeError::Convert(format!("stride {stride} < row size {row_bytes}")));
    }
    if dst.len() != row_bytes * rows {
        return Err(DecodeError::Convert(format!(
            "destination is {} bytes, {width}x{height} RGBA needs {}", dst.len(), row_bytes * rows
        )));
    }
    if rows > 0 && src.len() < stride * (rows - 1) + row_bytes {
        return Err(DecodeError::Convert(format!(
            "source plane too short: {} bytes for {rows} rows of stride {stride}", src.len()
        )));
    }
    for (row, out) in dst.chunks_exact_mut(row_bytes.max(1)).enumerate().take(rows) {
        let s = row * stride;
        out.copy_from_slice(&src[s..s + row_bytes]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_row_padding() {
        // 2×2 image, stride 12 (4 bytes of padding per row).
        let src: Vec<u8> = vec![
            1, 1, 1, 1,  2, 2, 2, 2,  9, 9, 9, 9,
            3, 3, 3, 3,  4, 4, 4, 4,  9, 9, 9, 9,
        ];
        let mut dst = vec![0u8; 16];
        destripe(&src, 12, 2, 2, &mut dst).unwrap();
        assert_eq!(dst, vec![1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4]);
    }

    #[test]
    fn last_row_may_omit_padding() {
        let src = vec![7u8; 12 + 8];
        let mut dst = vec![0u8; 16];
        assert!(destripe(&src, 12, 2, 2, &mut dst).is_ok());
    }

    #[test]
    fn rejects_wrong_destination_size() {
        let src = vec![0u8; 32];
        let mut dst = vec![0u8; 15];
        assert!(matches!(destripe(&src, 8, 2, 2, &mut dst), Err(DecodeError::Convert(_))));
    }

    #[test]
    fn rejects_short_source() {
        let src = vec![0u8; 10];
        let mut dst = vec![0u8; 16];
        assert!(destripe(&src, 8, 2, 2, &mut dst).is_err());
    }
}
