// THEORY:
// A `Chunk` is a rectangular block of colors lifted out of a grid. Its one job is
// to summarize itself as a single average color, which is what thumbnailing needs:
// every destination pixel of a thumbnail is the average of the block of source
// pixels that maps onto it.
//
// Averaging is done on integer channel sums divided by the sample count and
// truncated, so a block of identical colors averages back to exactly that color.
// The result is a synthesized color and is therefore fully opaque.

pub mod chunk {
    use crate::core_modules::color::color::Color;

    /// A "dumb" data container representing a rectangular block of colors.
    pub struct Chunk {
        /// The width of the chunk in pixels.
        pub width: usize,
        /// The height of the chunk in pixels.
        pub height: usize,
        /// A flattened vector containing all the `Color` data within this chunk.
        pub colors: Vec<Color>,
    }

    impl Chunk {
        pub fn new(width: usize, height: usize, colors: Vec<Color>) -> Self {
            debug_assert_eq!(colors.len(), width * height);
            Self {
                width,
                height,
                colors,
            }
        }

        /// Area average of the block, alpha forced opaque. An empty chunk averages to black.
        pub fn average_color(&self) -> Color {
            let num_colors = self.colors.len() as u64;
            if num_colors == 0 {
                return Color::default();
            }

            let mut sum_r = 0u64;
            let mut sum_g = 0u64;
            let mut sum_b = 0u64;

            for color in &self.colors {
                sum_r += color.red() as u64;
                sum_g += color.green() as u64;
                sum_b += color.blue() as u64;
            }

            Color::opaque(
                (sum_r / num_colors) as u8,
                (sum_g / num_colors) as u8,
                (sum_b / num_colors) as u8,
            )
        }
    }
}
