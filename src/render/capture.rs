//! Frame read-back helpers.

use crate::error::{SurfaceError, SurfaceResult};
use std::path::Path;

pub const BYTES_PER_PIXEL: u32 = 4;

/// Row pitch rounded up to wgpu's copy alignment.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Drops the per-row padding of a mapped texture copy.
pub fn strip_row_padding(data: &[u8], width: u32, height: u32, padded_row: u32) -> Vec<u8> {
    let unpadded_row = (width * BYTES_PER_PIXEL) as usize;
    let mut frame = Vec::with_capacity(unpadded_row * height as usize);

    for y in 0..height as usize {
        let row_start = y * padded_row as usize;
        frame.extend_from_slice(&data[row_start..row_start + unpadded_row]);
    }

    frame
}

pub fn save_png<P: AsRef<Path>>(
    path: P,
    rgba: &[u8],
    width: u32,
    height: u32,
) -> SurfaceResult<()> {
    let path = path.as_ref();
    image::save_buffer(path, rgba, width, height, image::ColorType::Rgba8)
        .map_err(|e| SurfaceError::Snapshot(format!("failed to write {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_row_alignment() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(800) % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT, 0);
    }

    #[test]
    fn test_strip_row_padding() {
        let width = 2;
        let height = 2;
        let padded = 256;
        let mut data = vec![0u8; (padded * height) as usize];
        data[0..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        data[256..264].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);

        let frame = strip_row_padding(&data, width, height, padded);
        assert_eq!(frame, (1..=16).collect::<Vec<u8>>());
    }
}
