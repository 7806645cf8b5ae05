// THEORY:
// The `PixelGrid` owns every `Color` of an image and is the only thing the sort
// and congregation engines mutate. It is stored column-major (`columns[x][y]`):
// a column is one contiguous `Vec<Color>`, so a column sort copies each column
// with a single slice copy while row sorts gather and scatter.
//
// Key responsibilities:
// 1.  **Conversion**: building a grid from a decoded image (any bit depth is
//     reduced to 8 bits per channel) and exporting it back to an RGBA buffer.
// 2.  **Derived grids**: area-average thumbnails, produced as brand new grids.
//     The dimensions of an existing grid never change.
// 3.  **Sub-pixel queries**: bilinear sampling at fractional coordinates, used by
//     the thumbnail-guided fitness to read its reference field.

use crate::core_modules::chunk::chunk::Chunk;
use crate::core_modules::color::color::Color;
use crate::error::{Error, Result};
use image::{DynamicImage, RgbaImage};

/// A dense, column-major two-dimensional array of colors.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    columns: Vec<Vec<Color>>,
}

impl PixelGrid {
    /// A grid where every pixel is `fill`.
    pub fn new(width: usize, height: usize, fill: Color) -> Self {
        Self {
            width,
            height,
            columns: vec![vec![fill; height]; width],
        }
    }

    /// Builds a grid from row-major rows (`rows[y][x]`). All rows must share one length.
    pub fn from_rows(rows: Vec<Vec<Color>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return Err(Error::InvalidParameter("rows of unequal length".to_string()));
        }

        let mut columns = vec![Vec::with_capacity(height); width];
        for row in rows {
            for (x, color) in row.into_iter().enumerate() {
                columns[x].push(color);
            }
        }
        Ok(Self {
            width,
            height: if width == 0 { 0 } else { height },
            columns,
        })
    }

    /// Builds a grid from a decoded image, reducing every channel to 8 bits.
    pub fn from_image(image: &DynamicImage) -> Self {
        let samples = image.to_rgba16();
        let (width, height) = (samples.width() as usize, samples.height() as usize);

        let mut columns = Vec::with_capacity(width);
        for x in 0..width {
            let mut column = Vec::with_capacity(height);
            for y in 0..height {
                let [r, g, b, a] = samples.get_pixel(x as u32, y as u32).0;
                column.push(Color::new(
                    (r >> 8) as u8,
                    (g >> 8) as u8,
                    (b >> 8) as u8,
                    (a >> 8) as u8,
                ));
            }
            columns.push(column);
        }

        Self {
            width,
            height,
            columns,
        }
    }

    /// Copies every color's channels into an 8-bit RGBA image.
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            image::Rgba(self.columns[x as usize][y as usize].rgba())
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.pixel_count() == 0
    }

    /// The color at `(x, y)`. Panics when out of range.
    pub fn get(&self, x: usize, y: usize) -> &Color {
        &self.columns[x][y]
    }

    pub fn set(&mut self, x: usize, y: usize, color: Color) {
        self.columns[x][y] = color;
    }

    /// Exchanges the colors at two coordinates.
    pub fn swap(&mut self, (x1, y1): (usize, usize), (x2, y2): (usize, usize)) {
        let first = self.columns[x1][y1];
        self.columns[x1][y1] = self.columns[x2][y2];
        self.columns[x2][y2] = first;
    }

    pub fn column(&self, x: usize) -> &[Color] {
        &self.columns[x]
    }

    /// Gathers row `y` into a new vector, left to right.
    pub fn row(&self, y: usize) -> Vec<Color> {
        self.columns.iter().map(|column| column[y]).collect()
    }

    /// Scatters `row` back into row `y`.
    pub fn set_row(&mut self, y: usize, row: &[Color]) {
        debug_assert_eq!(row.len(), self.width);
        for (column, color) in self.columns.iter_mut().zip(row) {
            column[y] = *color;
        }
    }

    /// Replaces every column at once. The dimensions must not change.
    pub(crate) fn replace_columns(&mut self, columns: Vec<Vec<Color>>) {
        debug_assert_eq!(columns.len(), self.width);
        self.columns = columns;
    }

    /// Every `(x, y, color)` in column-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &Color)> {
        self.columns
            .iter()
            .enumerate()
            .flat_map(|(x, column)| column.iter().enumerate().map(move |(y, color)| (x, y, color)))
    }

    /// An area-average thumbnail with both sides scaled by `ratio`, in (0, 1].
    pub fn thumbnail_by_ratio(&self, ratio: f64) -> Result<PixelGrid> {
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(Error::InvalidParameter(format!(
                "thumbnail ratio must be in (0, 1], got {ratio}"
            )));
        }
        let width = ((self.width as f64 * ratio) as usize).max(1);
        let height = ((self.height as f64 * ratio) as usize).max(1);
        Ok(self.thumbnail_with_dimensions(width, height))
    }

    /// An area-average thumbnail whose shorter side is `target` pixels.
    ///
    /// A target at or above the current shorter side returns a same-size copy
    /// (averaged over 1x1 blocks, so alpha becomes opaque).
    pub fn thumbnail_to_size(&self, target: usize) -> Result<PixelGrid> {
        if target == 0 {
            return Err(Error::InvalidParameter("thumbnail size must be at least 1".to_string()));
        }
        let shorter = self.width.min(self.height);
        if shorter == 0 {
            return Ok(self.thumbnail_with_dimensions(0, 0));
        }
        let target = target.min(shorter);
        let (width, height) = if self.width <= self.height {
            let height = (self.height as f64 * target as f64 / self.width as f64).round() as usize;
            (target, height.clamp(1, self.height))
        } else {
            let width = (self.width as f64 * target as f64 / self.height as f64).round() as usize;
            (width.clamp(1, self.width), target)
        };
        Ok(self.thumbnail_with_dimensions(width, height))
    }

    fn thumbnail_with_dimensions(&self, width: usize, height: usize) -> PixelGrid {
        if self.is_empty() || width == 0 || height == 0 {
            return PixelGrid::new(0, 0, Color::default());
        }

        let mut columns = Vec::with_capacity(width);
        for dest_x in 0..width {
            let x_start = dest_x * self.width / width;
            let x_end = ((dest_x + 1) * self.width / width).max(x_start + 1);

            let mut column = Vec::with_capacity(height);
            for dest_y in 0..height {
                let y_start = dest_y * self.height / height;
                let y_end = ((dest_y + 1) * self.height / height).max(y_start + 1);

                let mut block = Vec::with_capacity((x_end - x_start) * (y_end - y_start));
                for source_column in &self.columns[x_start..x_end] {
                    block.extend_from_slice(&source_column[y_start..y_end]);
                }
                let chunk = Chunk::new(x_end - x_start, y_end - y_start, block);
                column.push(chunk.average_color());
            }
            columns.push(column);
        }

        PixelGrid {
            width,
            height,
            columns,
        }
    }

    /// Bilinear sample at fractional `(x, y)`; coordinates outside the grid clamp to the edge.
    ///
    /// Each channel is interpolated independently and rounded; the sample is opaque.
    /// An empty grid samples as opaque black.
    pub fn sample(&self, x: f64, y: f64) -> Color {
        if self.is_empty() {
            return Color::default();
        }

        let x = x.clamp(0.0, (self.width - 1) as f64);
        let y = y.clamp(0.0, (self.height - 1) as f64);
        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = x - x0 as f64;
        let fy = y - y0 as f64;

        let top_left = self.columns[x0][y0];
        let top_right = self.columns[x1][y0];
        let bottom_left = self.columns[x0][y1];
        let bottom_right = self.columns[x1][y1];

        let lerp = |channel: fn(&Color) -> u8| -> u8 {
            let top = channel(&top_left) as f64 * (1.0 - fx) + channel(&top_right) as f64 * fx;
            let bottom =
                channel(&bottom_left) as f64 * (1.0 - fx) + channel(&bottom_right) as f64 * fx;
            (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8
        };

        Color::opaque(lerp(Color::red), lerp(Color::green), lerp(Color::blue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize) -> PixelGrid {
        let rows = (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| Color::new((x * 10) as u8, (y * 10) as u8, 7, 200))
                    .collect()
            })
            .collect();
        PixelGrid::from_rows(rows).unwrap()
    }

    #[test]
    fn rows_and_columns_address_the_same_pixels() {
        let grid = gradient(3, 2);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.get(2, 1).rgba(), [20, 10, 7, 200]);
        assert_eq!(grid.column(1).len(), 2);
        assert_eq!(grid.row(1)[2], *grid.get(2, 1));
    }

    #[test]
    fn unequal_rows_are_rejected() {
        let rows = vec![vec![Color::default(); 2], vec![Color::default(); 3]];
        assert!(matches!(PixelGrid::from_rows(rows), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn image_round_trip_keeps_alpha() {
        let grid = gradient(4, 3);
        let image = DynamicImage::ImageRgba8(grid.to_image());
        assert_eq!(PixelGrid::from_image(&image), grid);
    }

    #[test]
    fn sixteen_bit_images_are_reduced_to_eight_bits() {
        let mut wide = image::ImageBuffer::<image::Rgba<u16>, Vec<u16>>::new(1, 1);
        wide.put_pixel(0, 0, image::Rgba([0xffff, 0x8040, 0x00ff, 0x1234]));
        let grid = PixelGrid::from_image(&DynamicImage::ImageRgba16(wide));
        assert_eq!(grid.get(0, 0).rgba(), [0xff, 0x80, 0x00, 0x12]);
    }

    #[test]
    fn swap_and_set_row() {
        let mut grid = gradient(3, 3);
        let a = *grid.get(0, 0);
        let b = *grid.get(2, 1);
        grid.swap((0, 0), (2, 1));
        assert_eq!(*grid.get(0, 0), b);
        assert_eq!(*grid.get(2, 1), a);

        let mut row = grid.row(2);
        row.reverse();
        grid.set_row(2, &row);
        assert_eq!(grid.row(2), row);
    }

    #[test]
    fn uniform_thumbnail_keeps_exact_color() {
        let grid = PixelGrid::new(17, 9, Color::new(90, 140, 33, 12));
        for ratio in [1.0, 0.5, 0.33, 0.1, 0.01] {
            let thumbnail = grid.thumbnail_by_ratio(ratio).unwrap();
            assert!(thumbnail.width() >= 1 && thumbnail.height() >= 1);
            assert!(thumbnail.iter().all(|(_, _, c)| c.rgba() == [90, 140, 33, 255]));
        }
    }

    #[test]
    fn thumbnail_averages_blocks() {
        let rows = vec![
            vec![Color::opaque(0, 0, 0), Color::opaque(100, 0, 0), Color::opaque(9, 9, 9), Color::opaque(9, 9, 9)],
            vec![Color::opaque(0, 0, 0), Color::opaque(100, 0, 0), Color::opaque(9, 9, 9), Color::opaque(9, 9, 9)],
        ];
        let grid = PixelGrid::from_rows(rows).unwrap();
        let thumbnail = grid.thumbnail_by_ratio(0.5).unwrap();
        assert_eq!((thumbnail.width(), thumbnail.height()), (2, 1));
        assert_eq!(thumbnail.get(0, 0).rgba(), [50, 0, 0, 255]);
        assert_eq!(thumbnail.get(1, 0).rgba(), [9, 9, 9, 255]);
    }

    #[test]
    fn thumbnail_to_size_fixes_shorter_side() {
        let grid = gradient(40, 20);
        let thumbnail = grid.thumbnail_to_size(5).unwrap();
        assert_eq!((thumbnail.width(), thumbnail.height()), (10, 5));

        let tall = gradient(6, 30);
        let thumbnail = tall.thumbnail_to_size(3).unwrap();
        assert_eq!((thumbnail.width(), thumbnail.height()), (3, 15));

        assert!(grid.thumbnail_to_size(0).is_err());
        assert!(grid.thumbnail_by_ratio(0.0).is_err());
        assert!(grid.thumbnail_by_ratio(1.5).is_err());
    }

    #[test]
    fn bilinear_sample_interpolates_and_clamps() {
        let rows = vec![vec![Color::opaque(0, 0, 0), Color::opaque(100, 200, 50)]];
        let grid = PixelGrid::from_rows(rows).unwrap();

        assert_eq!(grid.sample(0.5, 0.0).rgba(), [50, 100, 25, 255]);
        assert_eq!(grid.sample(0.25, 3.0).rgba(), [25, 50, 13, 255]);
        assert_eq!(grid.sample(-4.0, -1.0).rgba(), [0, 0, 0, 255]);
        assert_eq!(grid.sample(9.0, 0.0).rgba(), [100, 200, 50, 255]);
    }

    #[test]
    fn empty_grid_is_harmless() {
        let grid = PixelGrid::new(0, 0, Color::default());
        assert!(grid.is_empty());
        assert_eq!(grid.sample(1.0, 1.0), Color::default());
        assert!(grid.thumbnail_to_size(4).unwrap().is_empty());
        assert_eq!(grid.iter().count(), 0);
    }
}
