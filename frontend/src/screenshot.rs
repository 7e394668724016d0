//! Screenshot meta-command: write the blitted output region as a PNG.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;

/// Save an RGB565 pixel region (rows `pitch` pixels apart) as an RGB24 PNG.
pub fn save(
    pixels: &[u16],
    pitch: usize,
    width: usize,
    height: usize,
    path: &Path,
) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width as u32, height as u32);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header().context("failed to write PNG header")?;

    let mut rgb = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for &p in &pixels[y * pitch..y * pitch + width] {
            let (r, g, b) = rgb565_to_rgb888(p);
            rgb.extend_from_slice(&[r, g, b]);
        }
    }

    writer
        .write_image_data(&rgb)
        .context("failed to write PNG data")?;
    Ok(())
}

/// First unused `chroma-<n>.png` name in `dir`.
pub fn next_free_path(dir: &Path) -> PathBuf {
    for n in 0.. {
        let candidate = dir.join(format!("chroma-{n:03}.png"));
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!()
}

fn rgb565_to_rgb888(p: u16) -> (u8, u8, u8) {
    let r5 = ((p >> 11) & 0x1F) as u8;
    let g6 = ((p >> 5) & 0x3F) as u8;
    let b5 = (p & 0x1F) as u8;
    // Replicate high bits into the low bits so white maps to 255.
    (
        (r5 << 3) | (r5 >> 2),
        (g6 << 2) | (g6 >> 4),
        (b5 << 3) | (b5 >> 2),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_expansion_hits_full_range() {
        assert_eq!(rgb565_to_rgb888(0x0000), (0, 0, 0));
        assert_eq!(rgb565_to_rgb888(0xFFFF), (255, 255, 255));
        assert_eq!(rgb565_to_rgb888(0xF800), (255, 0, 0));
        assert_eq!(rgb565_to_rgb888(0x07E0), (0, 255, 0));
        assert_eq!(rgb565_to_rgb888(0x001F), (0, 0, 255));
    }

    #[test]
    fn writes_a_decodable_png() {
        let dir = std::env::temp_dir().join("chroma_screenshot_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let pixels = vec![0xF800u16; 8 * 4]; // solid red, pitch 8
        let path = next_free_path(&dir);
        save(&pixels, 8, 8, 4, &path).unwrap();

        let decoder = png::Decoder::new(File::open(&path).unwrap());
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        assert_eq!((info.width, info.height), (8, 4));
        assert_eq!(&buf[0..3], &[255, 0, 0]);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
