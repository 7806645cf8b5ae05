// THEORY:
// A fitness function answers one question: how well does this color belong at
// this location? The congregation loop only ever compares fitness sums, so any
// scorer that returns comparable numbers can drive it. Three scorers exist:
//
// 1.  **Kernel**: the color is compared with its in-bounds neighbors, each
//     comparison weighted by the `Kernel`, and the result normalized by the
//     weight that was actually in bounds. Reads the live grid, so every accepted
//     swap changes what later evaluations see.
// 2.  **Reference (thumbnail-guided)**: the color is compared with a bilinear
//     sample of a small reference grid at the same relative position. The
//     reference is a snapshot and never changes during a run.
// 3.  **Positional**: the color is scored by its distance to an ideal spot
//     derived from its own HSV: hue is an angle and saturation a radius on a
//     disc centered on the image. Grays gather in the middle, vivid colors on
//     the rim, arranged around the wheel by hue.
//
// Similarity between two colors is `1 - weighted mean of |dH|, |dS|, |dV|`, a
// symmetric score in [0, 1] that is 1 for identical colors.

use crate::core_modules::color::color::Color;
use crate::core_modules::kernel::Kernel;
use crate::core_modules::pixel_grid::PixelGrid;
use crate::error::{Error, Result};
use std::f64::consts::TAU;

/// Relative importance of hue, saturation and value differences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityWeights {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            hue: 1.0,
            saturation: 1.0,
            value: 1.0,
        }
    }
}

impl SimilarityWeights {
    /// Hue counts 1.5x, saturation 0.5x.
    pub fn hue_heavy() -> Self {
        Self {
            hue: 1.5,
            saturation: 0.5,
            value: 1.0,
        }
    }

    /// Similarity in [0, 1]; 1 for identical colors.
    pub fn similarity(&self, a: &Color, b: &Color) -> f64 {
        let total = self.hue + self.saturation + self.value;
        if total <= 0.0 {
            return 1.0;
        }
        let distance = self.hue * (a.hue() - b.hue()).abs()
            + self.saturation * (a.saturation() - b.saturation()).abs()
            + self.value * (a.value() - b.value()).abs();
        1.0 - distance / total
    }
}

/// Scores a color placed at a location of a grid.
pub trait Fitness {
    fn score(&self, grid: &PixelGrid, color: &Color, x: usize, y: usize) -> f64;

    /// Sum of every pixel's score where it currently sits.
    fn total(&self, grid: &PixelGrid) -> f64 {
        grid.iter().map(|(x, y, color)| self.score(grid, color, x, y)).sum()
    }
}

/// Weighted similarity to the surrounding neighborhood.
pub struct KernelFitness {
    kernel: Kernel,
    weights: SimilarityWeights,
}

impl KernelFitness {
    pub fn new(kernel: Kernel, weights: SimilarityWeights) -> Self {
        Self { kernel, weights }
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }
}

impl Fitness for KernelFitness {
    fn score(&self, grid: &PixelGrid, color: &Color, x: usize, y: usize) -> f64 {
        let mut total_weight = 0.0;
        let mut total_fitness = 0.0;
        for element in self.kernel.elements() {
            let (Some(nx), Some(ny)) = (x.checked_add_signed(element.dx), y.checked_add_signed(element.dy))
            else {
                continue;
            };
            if nx >= grid.width() || ny >= grid.height() {
                continue;
            }
            total_fitness += self.weights.similarity(color, grid.get(nx, ny)) * element.weight;
            total_weight += element.weight;
        }
        if total_weight == 0.0 {
            return 0.0;
        }
        total_fitness / total_weight
    }
}

/// Similarity to a fixed reference grid sampled at the same relative position.
pub struct ReferenceFitness {
    reference: PixelGrid,
    weights: SimilarityWeights,
}

impl ReferenceFitness {
    pub fn new(reference: PixelGrid, weights: SimilarityWeights) -> Self {
        Self { reference, weights }
    }

    /// Snapshots `grid` as a thumbnail whose shorter side is `size` pixels.
    pub fn from_thumbnail(grid: &PixelGrid, size: usize, weights: SimilarityWeights) -> Result<Self> {
        Ok(Self::new(grid.thumbnail_to_size(size)?, weights))
    }

    pub fn reference(&self) -> &PixelGrid {
        &self.reference
    }
}

impl Fitness for ReferenceFitness {
    fn score(&self, grid: &PixelGrid, color: &Color, x: usize, y: usize) -> f64 {
        let ref_x = x as f64 * self.reference.width() as f64 / grid.width().max(1) as f64;
        let ref_y = y as f64 * self.reference.height() as f64 / grid.height().max(1) as f64;
        self.weights.similarity(color, &self.reference.sample(ref_x, ref_y))
    }
}

/// Closeness to the spot a color's own hue and saturation map to.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalFitness;

impl PositionalFitness {
    /// The ideal `(x, y)` for `color` on a `width` x `height` grid.
    pub fn ideal_position(color: &Color, width: usize, height: usize) -> (f64, f64) {
        let center_x = width.saturating_sub(1) as f64 / 2.0;
        let center_y = height.saturating_sub(1) as f64 / 2.0;
        let max_radius = width.min(height).saturating_sub(1) as f64 / 2.0;
        let angle = color.hue() * TAU;
        let radius = color.saturation() * max_radius;
        (center_x + radius * angle.cos(), center_y + radius * angle.sin())
    }
}

impl Fitness for PositionalFitness {
    fn score(&self, grid: &PixelGrid, color: &Color, x: usize, y: usize) -> f64 {
        let (ideal_x, ideal_y) = Self::ideal_position(color, grid.width(), grid.height());
        let diagonal = (grid.width() as f64).hypot(grid.height() as f64).max(1.0);
        1.0 - (x as f64 - ideal_x).hypot(y as f64 - ideal_y) / diagonal
    }
}

/// Which scorer a congregation pass uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitnessMode {
    /// Neighborhood similarity with a kernel of the given radius.
    Kernel { radius: usize },
    /// Similarity to a thumbnail, shorter side `size`, taken when the pass starts.
    Thumbnail { size: usize },
    /// Hue/saturation disc placement.
    Positional,
}

impl FitnessMode {
    /// Builds the scorer for `grid`. Thumbnail mode snapshots the grid as it is now.
    pub fn build(&self, grid: &PixelGrid, weights: SimilarityWeights) -> Result<Box<dyn Fitness>> {
        match *self {
            FitnessMode::Kernel { radius } => {
                if radius == 0 {
                    return Err(Error::InvalidParameter("kernel radius must be at least 1".to_string()));
                }
                Ok(Box::new(KernelFitness::new(Kernel::new(radius), weights)))
            }
            FitnessMode::Thumbnail { size } => {
                Ok(Box::new(ReferenceFitness::from_thumbnail(grid, size, weights)?))
            }
            FitnessMode::Positional => Ok(Box::new(PositionalFitness)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> PixelGrid {
        let black = Color::opaque(0, 0, 0);
        let white = Color::opaque(255, 255, 255);
        PixelGrid::from_rows(vec![
            vec![black, white, black],
            vec![white, black, white],
            vec![black, white, black],
        ])
        .unwrap()
    }

    #[test]
    fn similarity_is_symmetric_and_bounded() {
        let weights = SimilarityWeights::default();
        let red = Color::opaque(255, 0, 0);
        let teal = Color::opaque(0, 128, 128);
        assert_eq!(weights.similarity(&red, &red), 1.0);
        let forward = weights.similarity(&red, &teal);
        assert_eq!(forward, weights.similarity(&teal, &red));
        assert!((0.0..=1.0).contains(&forward));

        let heavy = SimilarityWeights::hue_heavy();
        assert_eq!(heavy.similarity(&teal, &teal), 1.0);
        assert!((0.0..=1.0).contains(&heavy.similarity(&red, &teal)));
    }

    #[test]
    fn black_and_white_differ_only_in_value() {
        let weights = SimilarityWeights::default();
        let black = Color::opaque(0, 0, 0);
        let white = Color::opaque(255, 255, 255);
        assert!((weights.similarity(&black, &white) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn kernel_fitness_rewards_matching_neighbors() {
        let grid = checker();
        let fitness = KernelFitness::new(Kernel::new(1), SimilarityWeights::default());
        let black = Color::opaque(0, 0, 0);
        let white = Color::opaque(255, 255, 255);

        // The center's 4-neighbors are white, diagonals black.
        let as_black = fitness.score(&grid, &black, 1, 1);
        let as_white = fitness.score(&grid, &white, 1, 1);
        assert!(as_white > as_black);
        assert!((0.0..=1.0).contains(&as_black));
    }

    #[test]
    fn kernel_fitness_ignores_out_of_bounds_neighbors() {
        let grid = PixelGrid::new(1, 1, Color::opaque(1, 2, 3));
        let fitness = KernelFitness::new(Kernel::new(2), SimilarityWeights::default());
        assert_eq!(fitness.score(&grid, &Color::opaque(9, 9, 9), 0, 0), 0.0);

        let uniform = PixelGrid::new(4, 4, Color::opaque(40, 50, 60));
        let corner = fitness.score(&uniform, &Color::opaque(40, 50, 60), 0, 0);
        assert!((corner - 1.0).abs() < 1e-12);
    }

    #[test]
    fn reference_fitness_reads_relative_position() {
        let left = Color::opaque(255, 0, 0);
        let right = Color::opaque(0, 0, 255);
        let reference = PixelGrid::from_rows(vec![vec![left, right]]).unwrap();
        let fitness = ReferenceFitness::new(reference, SimilarityWeights::default());
        let grid = PixelGrid::new(8, 4, Color::default());

        assert_eq!(fitness.score(&grid, &left, 0, 2), 1.0);
        assert!(fitness.score(&grid, &right, 0, 2) < 1.0);
        assert_eq!(fitness.score(&grid, &right, 7, 0), 1.0);
    }

    #[test]
    fn positional_fitness_centers_grays() {
        let grid = PixelGrid::new(11, 11, Color::default());
        let gray = Color::opaque(90, 90, 90);
        assert_eq!(PositionalFitness::ideal_position(&gray, 11, 11), (5.0, 5.0));
        assert!(PositionalFitness.score(&grid, &gray, 5, 5) > PositionalFitness.score(&grid, &gray, 0, 0));

        // Pure red sits on the rim at angle zero.
        let red = Color::opaque(255, 0, 0);
        let (x, y) = PositionalFitness::ideal_position(&red, 11, 11);
        assert!((x - 10.0).abs() < 1e-9 && (y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn modes_validate_their_parameters() {
        let grid = checker();
        let weights = SimilarityWeights::default();
        assert!(FitnessMode::Kernel { radius: 0 }.build(&grid, weights).is_err());
        assert!(FitnessMode::Thumbnail { size: 0 }.build(&grid, weights).is_err());
        assert!(FitnessMode::Kernel { radius: 2 }.build(&grid, weights).is_ok());
        assert!(FitnessMode::Thumbnail { size: 1 }.build(&grid, weights).is_ok());
        assert!(FitnessMode::Positional.build(&grid, weights).is_ok());
    }

    #[test]
    fn total_sums_every_pixel() {
        let grid = PixelGrid::new(3, 2, Color::opaque(5, 5, 5));
        let fitness = KernelFitness::new(Kernel::new(1), SimilarityWeights::default());
        assert!((fitness.total(&grid) - 6.0).abs() < 1e-9);
    }
}
