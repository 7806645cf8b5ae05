// THEORY:
// The `LineSorter` sorts every row, or every column, of a grid independently and
// in parallel. Lines never interact, so the work is a plain fan-out/fan-in:
//
// 1.  **Fan-out**: each line is packaged into a `LineTask` and pushed onto one
//     shared work queue. `worker_count` worker tasks drain that queue; a worker
//     takes a line, computes every pixel's key, sorts, and only then takes the
//     next one. A line is owned by exactly one task at a time, so no locking is
//     needed around pixel data.
// 2.  **Fan-in**: finished lines come back over a completion channel tagged with
//     their index. The sorter waits for every line and every worker before it
//     writes anything back, so callers never see a half-sorted grid.
//
// Lines are copied out of the grid (columns are contiguous, rows are gathered)
// and written back only once every line has come home. If the sort fails or its
// future is dropped midway, the grid is left exactly as it was.
//
// Randomness: the random policies need a generator inside the workers. Instead
// of sharing one, a seed is drawn per line from the caller's generator before
// dispatch and each worker seeds its own. Output then depends only on the
// caller's seed, never on the number of workers or on scheduling.

use crate::core_modules::color::color::Color;
use crate::core_modules::pixel_grid::PixelGrid;
use crate::core_modules::sort_policy::SortPolicy;
use crate::error::{Error, Result};
use futures::future::join_all;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// One line of pixels on its way to a worker.
struct LineTask {
    index: usize,
    colors: Vec<Color>,
    policy: SortPolicy,
    seed: u64,
}

/// One sorted line on its way back.
struct SortedLine {
    index: usize,
    colors: Vec<Color>,
}

impl LineTask {
    fn process(mut self) -> SortedLine {
        let mut rng = StdRng::seed_from_u64(self.seed);
        for (position, color) in self.colors.iter_mut().enumerate() {
            color.set_sort_key(self.policy, position, &mut rng);
        }
        // stable, so re-sorting a sorted line is a no-op
        self.colors
            .sort_by(|a, b| a.sort_key().total_cmp(&b.sort_key()));
        SortedLine {
            index: self.index,
            colors: self.colors,
        }
    }
}

/// Sorts grid lines on a bounded pool of tokio tasks.
#[derive(Debug, Clone, Copy)]
pub struct LineSorter {
    worker_count: usize,
}

impl Default for LineSorter {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

impl LineSorter {
    /// A sorter with `worker_count` workers; zero is treated as one.
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count: worker_count.max(1),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Sorts every column top to bottom, ascending by `policy`'s key.
    pub async fn sort_columns(
        &self,
        grid: &mut PixelGrid,
        policy: SortPolicy,
        rng: &mut StdRng,
    ) -> Result<()> {
        let columns: Vec<Vec<Color>> = (0..grid.width()).map(|x| grid.column(x).to_vec()).collect();
        let seeds = Self::line_seeds(columns.len(), policy, rng);
        let sorted = self.sort_lines(columns, policy, seeds).await?;
        grid.replace_columns(sorted);
        Ok(())
    }

    /// Sorts every row left to right, ascending by `policy`'s key.
    pub async fn sort_rows(
        &self,
        grid: &mut PixelGrid,
        policy: SortPolicy,
        rng: &mut StdRng,
    ) -> Result<()> {
        let rows: Vec<Vec<Color>> = (0..grid.height()).map(|y| grid.row(y)).collect();
        let seeds = Self::line_seeds(rows.len(), policy, rng);
        let sorted = self.sort_lines(rows, policy, seeds).await?;
        for (y, row) in sorted.iter().enumerate() {
            grid.set_row(y, row);
        }
        Ok(())
    }

    fn line_seeds(line_count: usize, policy: SortPolicy, rng: &mut StdRng) -> Vec<u64> {
        if policy.is_random() {
            (0..line_count).map(|_| rng.gen_range(0..=u64::MAX)).collect()
        } else {
            vec![0; line_count]
        }
    }

    async fn sort_lines(
        &self,
        lines: Vec<Vec<Color>>,
        policy: SortPolicy,
        seeds: Vec<u64>,
    ) -> Result<Vec<Vec<Color>>> {
        let line_count = lines.len();
        let (task_sender, task_receiver) = mpsc::unbounded_channel::<LineTask>();
        let task_receiver = Arc::new(Mutex::new(task_receiver));
        let (done_sender, mut done_receiver) = mpsc::unbounded_channel::<SortedLine>();

        // Spawn workers
        let mut workers = Vec::with_capacity(self.worker_count);
        for _ in 0..self.worker_count {
            let queue = Arc::clone(&task_receiver);
            let done = done_sender.clone();
            workers.push(tokio::spawn(async move {
                loop {
                    let task = queue.lock().await.recv().await;
                    let Some(task) = task else { break };
                    if done.send(task.process()).is_err() {
                        break;
                    }
                }
            }));
        }
        drop(done_sender);

        for (index, (colors, seed)) in lines.into_iter().zip(seeds).enumerate() {
            task_sender
                .send(LineTask {
                    index,
                    colors,
                    policy,
                    seed,
                })
                .map_err(|_| Error::WorkerPool("work queue closed before all lines were sent"))?;
        }
        drop(task_sender);

        let mut sorted = vec![Vec::new(); line_count];
        let mut completed = 0;
        while let Some(line) = done_receiver.recv().await {
            sorted[line.index] = line.colors;
            completed += 1;
        }

        for joined in join_all(workers).await {
            joined.map_err(|_| Error::WorkerPool("sort worker panicked"))?;
        }
        if completed != line_count {
            return Err(Error::WorkerPool("not every line came back from the workers"));
        }

        debug!(
            "sorted {} lines by {} on {} workers",
            line_count, policy, self.worker_count
        );
        Ok(sorted)
    }
}
