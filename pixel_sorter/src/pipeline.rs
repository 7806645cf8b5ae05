// THEORY:
// The `pipeline` module is the top-level API of the engine. It packages the
// sequencing recipes that turn a decoded grid into a finished effect, so callers
// only pick an `EffectMode`, fill in a `PipelineConfig`, and hand over a grid.
//
// Recipes:
// - **Sort**: `sort_passes` rounds of (sort columns, sort rows), then an optional
//   final column sort. With the defaults (`v` columns, `h2` rows) this yields
//   bright-to-dark columns banded by hue with grays pulled to the left.
// - **Congregate**: every configured `CongregationPass` in order, typically a
//   coarse pass with a large kernel and unbounded moves followed by a fine pass
//   with a small kernel and short moves.
// - **SortThenCongregate**: both, in that order.
//
// All randomness comes from one `StdRng` seeded from the config, so a recipe is
// reproducible for a given seed whatever the worker count.

use crate::core_modules::congregator::{self, CongregationParams, CongregationStats};
use crate::core_modules::fitness::{FitnessMode, SimilarityWeights};
use crate::core_modules::line_sorter::LineSorter;
use crate::core_modules::pixel_grid::PixelGrid;
use crate::core_modules::sort_policy::SortPolicy;
use crate::error::{Error, Result};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;

const DEFAULT_SEED: u64 = 99;
const DEFAULT_SORT_PASSES: usize = 6;

/// Which recipe runs on each input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectMode {
    Sort,
    Congregate,
    SortThenCongregate,
}

impl EffectMode {
    /// The tag inserted into output file names.
    pub fn tag(self) -> &'static str {
        match self {
            EffectMode::Sort => "sorted",
            EffectMode::Congregate => "congregated",
            EffectMode::SortThenCongregate => "sorted.congregated",
        }
    }

    fn sorts(self) -> bool {
        matches!(self, EffectMode::Sort | EffectMode::SortThenCongregate)
    }

    fn congregates(self) -> bool {
        matches!(self, EffectMode::Congregate | EffectMode::SortThenCongregate)
    }
}

/// One run of the congregation loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CongregationPass {
    pub fitness: FitnessMode,
    pub weights: SimilarityWeights,
    pub params: CongregationParams,
}

/// Configuration for the `PixelPipeline`, allowing for tunable behavior.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Concurrent line sort workers.
    pub worker_count: usize,
    /// Seed of the generator behind every random decision.
    pub seed: u64,
    /// Rounds of (column sort, row sort).
    pub sort_passes: usize,
    pub column_policy: SortPolicy,
    pub row_policy: SortPolicy,
    /// Extra column sort after the last round, if any.
    pub final_column_policy: Option<SortPolicy>,
    /// Congregation runs, in order.
    pub congregation_passes: Vec<CongregationPass>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            seed: DEFAULT_SEED,
            sort_passes: DEFAULT_SORT_PASSES,
            column_policy: SortPolicy::Value,
            row_policy: SortPolicy::HueGrayFirst,
            final_column_policy: Some(SortPolicy::Value),
            congregation_passes: vec![
                CongregationPass {
                    fitness: FitnessMode::Kernel { radius: 8 },
                    weights: SimilarityWeights::default(),
                    params: CongregationParams {
                        visit_ratio: 3.0,
                        max_move_distance: None,
                    },
                },
                CongregationPass {
                    fitness: FitnessMode::Kernel { radius: 2 },
                    weights: SimilarityWeights::default(),
                    params: CongregationParams {
                        visit_ratio: 2.0,
                        max_move_distance: Some(12),
                    },
                },
            ],
        }
    }
}

/// What a pipeline run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    /// Line sorts performed (each row or column sweep counts once).
    pub line_sorts: usize,
    /// Statistics of each congregation pass, in order.
    pub congregation: Vec<CongregationStats>,
}

/// Runs effect recipes on grids.
pub struct PixelPipeline {
    config: PipelineConfig,
    sorter: LineSorter,
    rng: StdRng,
}

impl PixelPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            sorter: LineSorter::new(config.worker_count),
            rng: StdRng::seed_from_u64(config.seed),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Checks every congregation parameter so a bad one fails before any pixel moves.
    pub fn validate(&self) -> Result<()> {
        for pass in &self.config.congregation_passes {
            pass.params.validate()?;
            if let FitnessMode::Kernel { radius: 0 } = pass.fitness {
                return Err(Error::InvalidParameter(
                    "kernel radius must be at least 1".to_string(),
                ));
            }
            if let FitnessMode::Thumbnail { size: 0 } = pass.fitness {
                return Err(Error::InvalidParameter(
                    "thumbnail size must be at least 1".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Applies `mode`'s recipe to `grid` in place.
    pub async fn run(&mut self, grid: &mut PixelGrid, mode: EffectMode) -> Result<Report> {
        self.validate()?;
        let mut report = Report::default();

        if mode.sorts() {
            report.line_sorts = self.sort(grid).await?;
        }
        if mode.congregates() {
            report.congregation = self.congregate(grid)?;
        }
        Ok(report)
    }

    /// The sort recipe. Returns the number of line sorts performed.
    pub async fn sort(&mut self, grid: &mut PixelGrid) -> Result<usize> {
        let mut line_sorts = 0;
        for pass in 0..self.config.sort_passes {
            info!(
                "sort pass {}/{}: columns by {}, rows by {}",
                pass + 1,
                self.config.sort_passes,
                self.config.column_policy,
                self.config.row_policy
            );
            self.sorter
                .sort_columns(grid, self.config.column_policy, &mut self.rng)
                .await?;
            self.sorter
                .sort_rows(grid, self.config.row_policy, &mut self.rng)
                .await?;
            line_sorts += 2;
        }
        if let Some(policy) = self.config.final_column_policy {
            info!("final sort: columns by {policy}");
            self.sorter.sort_columns(grid, policy, &mut self.rng).await?;
            line_sorts += 1;
        }
        Ok(line_sorts)
    }

    /// The congregation recipe. Returns the statistics of each pass.
    pub fn congregate(&mut self, grid: &mut PixelGrid) -> Result<Vec<CongregationStats>> {
        let mut all_stats = Vec::with_capacity(self.config.congregation_passes.len());
        for (index, pass) in self.config.congregation_passes.iter().enumerate() {
            info!(
                "congregation pass {}/{}: {:?}, {} visits per pixel",
                index + 1,
                self.config.congregation_passes.len(),
                pass.fitness,
                pass.params.visit_ratio
            );
            let fitness = pass.fitness.build(grid, pass.weights)?;
            let stats = congregator::congregate(grid, fitness.as_ref(), &pass.params, &mut self.rng)?;
            all_stats.push(stats);
        }
        Ok(all_stats)
    }
}
