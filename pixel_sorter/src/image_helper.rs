// THEORY:
// The thin boundary between files and grids. Decoding accepts anything the
// `image` crate can read and reduces it to an 8-bit RGBA `PixelGrid`; encoding
// always produces a lossless 8-bit RGBA PNG. A decode failure is reported as
// `Error::Decode` so the caller can skip that input; an I/O failure is
// `Error::Io` and nothing is written on a failed encode.

use crate::core_modules::pixel_grid::PixelGrid;
use crate::error::{Error, Result};
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use std::path::Path;

/// Decodes an in-memory image. `origin` only labels the error.
pub fn decode(bytes: &[u8], origin: &Path) -> Result<PixelGrid> {
    let image = image::load_from_memory(bytes).map_err(|source| Error::Decode {
        path: origin.to_path_buf(),
        source,
    })?;
    Ok(PixelGrid::from_image(&image))
}

/// Reads and decodes the file at `path`.
pub fn load(path: &Path) -> Result<PixelGrid> {
    let bytes = std::fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode(&bytes, path)
}

/// Encodes the grid as an 8-bit RGBA PNG.
pub fn encode(grid: &PixelGrid) -> Result<Vec<u8>> {
    let image = grid.to_image();
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(Error::Encode)?;
    Ok(bytes)
}

/// Encodes the grid and writes it to `path`. The file is only created once encoding succeeded.
pub fn save(path: &Path, grid: &PixelGrid) -> Result<()> {
    let bytes = encode(grid)?;
    std::fs::write(path, bytes).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color::color::Color;

    fn gradient_grid(width: usize, height: usize) -> PixelGrid {
        let rows = (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| Color::new((x * 7 % 256) as u8, (y * 11 % 256) as u8, 128, 255 - (x % 3) as u8))
                    .collect()
            })
            .collect();
        PixelGrid::from_rows(rows).expect("Error building grid.")
    }

    #[test]
    fn encode_then_decode_keeps_every_pixel() {
        let grid = gradient_grid(37, 21);
        let bytes = encode(&grid).expect("Error encoding grid.");
        assert_eq!(&bytes[1..4], b"PNG");
        let decoded = decode(&bytes, Path::new("memory.png")).expect("Error decoding grid.");
        assert_eq!(decoded, grid);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode(b"definitely not an image", Path::new("notes.txt")).unwrap_err();
        match err {
            Error::Decode { path, .. } => assert_eq!(path, Path::new("notes.txt")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn save_and_load_white_file() {
        let path = std::env::temp_dir().join(format!("pixel_sorter_white_{}.png", std::process::id()));
        let grid = PixelGrid::new(50, 30, Color::opaque(255, 255, 255));

        save(&path, &grid).expect("Error Saving File.");
        let loaded = load(&path).expect("Error Loading File.");
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, grid);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
