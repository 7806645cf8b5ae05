// Command line front end: sort and/or congregate the pixels of each input image
// and write the result under the output directory.
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum, ValueHint};
use log::{info, warn};
use pixel_sorter::core_modules::congregator::CongregationParams;
use pixel_sorter::core_modules::fitness::{FitnessMode, SimilarityWeights};
use pixel_sorter::core_modules::sort_policy::SortPolicy;
use pixel_sorter::{CongregationPass, EffectMode, Error, PipelineConfig, PixelPipeline, image_helper};
use std::path::{Path, PathBuf};

const DEFAULT_KERNEL_RADIUS: usize = 2;
const DEFAULT_THUMBNAIL_SIZE: usize = 8;
const DEFAULT_VISIT_RATIO: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Row and column sorts only
    Sort,
    /// Congregation passes only
    Congregate,
    /// Sorts, then congregation passes
    Both,
}

impl From<Mode> for EffectMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Sort => EffectMode::Sort,
            Mode::Congregate => EffectMode::Congregate,
            Mode::Both => EffectMode::SortThenCongregate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FitnessKind {
    Kernel,
    Thumbnail,
    Positional,
}

#[derive(Parser, Debug)]
#[command(name = "sort_tester", version, about = "Sort the pixels in the image(s) and save them to the output folder")]
struct Cli {
    /// Effect to apply to every input
    #[arg(long = "mode", value_enum, default_value = "sort")]
    mode: Mode,

    /// Directory the results are written to
    #[arg(long = "output-dir", default_value = "output", value_hint = ValueHint::DirPath)]
    output_dir: PathBuf,

    /// Number of sort workers
    #[arg(long = "threads")]
    threads: Option<usize>,
    /// Random seed
    #[arg(long = "seed")]
    seed: Option<u64>,
    /// Rounds of (column sort, row sort)
    #[arg(long = "passes")]
    passes: Option<usize>,
    /// Row sort policy: random, semirandom, h, h2, v or s
    #[arg(long = "row-policy")]
    row_policy: Option<String>,
    /// Column sort policy, also used for the final column sort
    #[arg(long = "column-policy")]
    column_policy: Option<String>,

    // Any of the following replaces the default coarse/fine congregation
    // schedule with a single pass.
    /// Swap attempts per pixel
    #[arg(long = "visit-ratio")]
    visit_ratio: Option<f64>,
    /// Neighborhood radius for kernel fitness
    #[arg(long = "kernel-radius")]
    kernel_radius: Option<usize>,
    /// Fitness function of the congregation pass
    #[arg(long = "fitness", value_enum)]
    fitness: Option<FitnessKind>,
    /// Shorter side of the reference thumbnail for thumbnail fitness
    #[arg(long = "thumbnail-size")]
    thumbnail_size: Option<usize>,
    /// Largest distance a pixel may travel in one swap
    #[arg(long = "max-move")]
    max_move: Option<usize>,

    /// Input images
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    inputs: Vec<PathBuf>,
}

impl Cli {
    fn custom_pass(&self) -> bool {
        self.visit_ratio.is_some()
            || self.kernel_radius.is_some()
            || self.fitness.is_some()
            || self.thumbnail_size.is_some()
            || self.max_move.is_some()
    }
}

fn parse_policy(name: &str) -> Result<SortPolicy> {
    name.parse::<SortPolicy>()
        .with_context(|| format!("invalid sort policy {name:?}"))
}

fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut cfg = PipelineConfig::default();
    if let Some(threads) = cli.threads {
        cfg.worker_count = threads.max(1);
    }
    if let Some(seed) = cli.seed {
        cfg.seed = seed;
    }
    if let Some(passes) = cli.passes {
        cfg.sort_passes = passes;
    }
    if let Some(name) = &cli.row_policy {
        cfg.row_policy = parse_policy(name)?;
    }
    if let Some(name) = &cli.column_policy {
        let policy = parse_policy(name)?;
        cfg.column_policy = policy;
        cfg.final_column_policy = Some(policy);
    }

    if cli.custom_pass() {
        let fitness = match cli.fitness.unwrap_or(FitnessKind::Kernel) {
            FitnessKind::Kernel => FitnessMode::Kernel {
                radius: cli.kernel_radius.unwrap_or(DEFAULT_KERNEL_RADIUS),
            },
            FitnessKind::Thumbnail => FitnessMode::Thumbnail {
                size: cli.thumbnail_size.unwrap_or(DEFAULT_THUMBNAIL_SIZE),
            },
            FitnessKind::Positional => FitnessMode::Positional,
        };
        cfg.congregation_passes = vec![CongregationPass {
            fitness,
            weights: SimilarityWeights::default(),
            params: CongregationParams {
                visit_ratio: cli.visit_ratio.unwrap_or(DEFAULT_VISIT_RATIO),
                max_move_distance: cli.max_move,
            },
        }];
    }
    Ok(cfg)
}

/// `dir/photo.jpg` becomes `<output_dir>/photo.<tag>.jpg`; a name without a dot gets `.<tag>` appended.
fn output_path(input: &Path, output_dir: &Path, tag: &str) -> Option<PathBuf> {
    let name = input.file_name()?.to_string_lossy();
    let tagged = match name.rfind('.') {
        Some(dot) => format!("{}.{}.{}", &name[..dot], tag, &name[dot + 1..]),
        None => format!("{name}.{tag}"),
    };
    Some(output_dir.join(tagged))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let cli = Cli::parse();
    let cfg = build_config(&cli)?;
    let mode = EffectMode::from(cli.mode);

    let mut pipeline = PixelPipeline::new(cfg);
    pipeline.validate().context("invalid congregation settings")?;

    std::fs::create_dir_all(&cli.output_dir)
        .with_context(|| format!("creating output directory {}", cli.output_dir.display()))?;

    for input in &cli.inputs {
        let output = output_path(input, &cli.output_dir, mode.tag())
            .with_context(|| format!("{} has no file name", input.display()))?;

        info!("{}", input.display());
        if output.exists() {
            info!("  skipping: {} already exists", output.display());
            continue;
        }

        let mut grid = match image_helper::load(input) {
            Ok(grid) => grid,
            Err(Error::Decode { path, source }) => {
                warn!("  {} is not an image: {source}", path.display());
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        info!("  {} x {} pixels", grid.width(), grid.height());

        let report = pipeline.run(&mut grid, mode).await?;
        for (index, stats) in report.congregation.iter().enumerate() {
            info!(
                "  congregation pass {}: {} of {} swaps accepted",
                index + 1,
                stats.accepted,
                stats.attempts
            );
        }

        image_helper::save(&output, &grid).context("writing output")?;
        info!("  saved {}", output.display());
    }
    Ok(())
}
