// THEORY:
// Congregation moves pixels so each one ends up near colors it resembles. It is
// a randomized hill climb over pixel swaps:
//
// 1.  Pick two distinct coordinates at random (a collision is redrawn and does
//     not count against the budget). With a maximum move distance the second
//     coordinate is drawn from the square of that half-width around the first.
// 2.  Score both colors where they are, then as if they had traded places.
// 3.  Commit the swap only when the traded score is strictly higher.
//
// The grid only ever changes by swaps, so its multiset of colors is preserved.
// Each accepted swap strictly increases the pair's fitness; there is no global
// optimum guarantee and no stopping rule other than the attempt budget.
//
// The loop is strictly sequential: an accepted swap changes what every later
// kernel evaluation reads. A coarse-then-fine schedule is two runs with
// different parameters, orchestrated by the caller.

use crate::core_modules::fitness::Fitness;
use crate::core_modules::pixel_grid::PixelGrid;
use crate::error::{Error, Result};
use log::{debug, trace};
use rand::Rng;

/// How often progress is reported, in attempts.
const PROGRESS_INTERVAL: usize = 2000;

/// Parameters of one congregation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CongregationParams {
    /// Swap attempts per pixel; the budget is `visit_ratio * pixel_count`.
    pub visit_ratio: f64,
    /// Largest Chebyshev distance between the two swap candidates, if bounded.
    pub max_move_distance: Option<usize>,
}

impl CongregationParams {
    pub fn validate(&self) -> Result<()> {
        if !self.visit_ratio.is_finite() || self.visit_ratio < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "visit ratio must be finite and non-negative, got {}",
                self.visit_ratio
            )));
        }
        if self.max_move_distance == Some(0) {
            return Err(Error::InvalidParameter(
                "maximum move distance must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of swap attempts for a grid of `pixel_count` pixels.
    pub fn attempt_budget(&self, pixel_count: usize) -> usize {
        (self.visit_ratio * pixel_count as f64) as usize
    }
}

/// What a congregation run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CongregationStats {
    /// Swap attempts evaluated.
    pub attempts: usize,
    /// Attempts that were committed.
    pub accepted: usize,
    /// Draws that hit the same coordinate twice and were redrawn.
    pub collisions: usize,
}

/// Runs the swap loop on `grid` until the attempt budget is spent.
pub fn congregate<F, R>(
    grid: &mut PixelGrid,
    fitness: &F,
    params: &CongregationParams,
    rng: &mut R,
) -> Result<CongregationStats>
where
    F: Fitness + ?Sized,
    R: Rng + ?Sized,
{
    params.validate()?;

    let mut stats = CongregationStats::default();
    if grid.pixel_count() < 2 {
        return Ok(stats);
    }

    let budget = params.attempt_budget(grid.pixel_count());
    let (width, height) = (grid.width(), grid.height());

    while stats.attempts < budget {
        let first = (rng.gen_range(0..width), rng.gen_range(0..height));
        let second = match params.max_move_distance {
            Some(distance) => (
                draw_near(rng, first.0, distance, width),
                draw_near(rng, first.1, distance, height),
            ),
            None => (rng.gen_range(0..width), rng.gen_range(0..height)),
        };
        if first == second {
            stats.collisions += 1;
            continue;
        }
        stats.attempts += 1;
        if let Some(percent) = progress(stats.attempts, budget) {
            trace!("congregating: {percent:.1}%");
        }

        let (x1, y1) = first;
        let (x2, y2) = second;
        let c1 = *grid.get(x1, y1);
        let c2 = *grid.get(x2, y2);

        let original_fitness = fitness.score(grid, &c1, x1, y1) + fitness.score(grid, &c2, x2, y2);
        let swapped_fitness = fitness.score(grid, &c2, x1, y1) + fitness.score(grid, &c1, x2, y2);
        if swapped_fitness > original_fitness {
            grid.swap(first, second);
            stats.accepted += 1;
        }
    }

    debug!(
        "congregation: {} attempts, {} accepted, {} collisions",
        stats.attempts, stats.accepted, stats.collisions
    );
    Ok(stats)
}

/// Percentage done, reported once every `PROGRESS_INTERVAL` counted attempts.
fn progress(attempts: usize, budget: usize) -> Option<f64> {
    if attempts == 0 || attempts % PROGRESS_INTERVAL != 0 {
        return None;
    }
    Some(attempts as f64 / budget.max(1) as f64 * 100.0)
}

/// Uniform draw from `[center - distance, center + distance]` clipped to `[0, len)`.
fn draw_near<R: Rng + ?Sized>(rng: &mut R, center: usize, distance: usize, len: usize) -> usize {
    let low = center.saturating_sub(distance);
    let high = center.saturating_add(distance).min(len - 1);
    rng.gen_range(low..=high)
}
