//! Seed scheduling and the parallel worker loop.

use std::sync::{
    Mutex,
    atomic::{AtomicI64, AtomicU32, AtomicUsize, Ordering},
};

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use rayon::prelude::*;

use junctions::{AssignmentTable, JunctionStorage, PathTag, WorkerId};

use crate::{
    block::BlockInstance,
    chooser::Chooser,
    config::{ConfigError, FinderConfig},
    extend,
    path::Path,
};

/// State every worker reaches through.
pub(crate) struct Shared<'a> {
    pub(crate) storage: &'a JunctionStorage,
    pub(crate) assignment: &'a AssignmentTable,
    pub(crate) blocks_found: AtomicI64,
    pub(crate) blocks: Mutex<Vec<BlockInstance>>,
    progress: AtomicUsize,
    progress_portion: usize,
    seeds_total: usize,
}

impl Shared<'_> {
    fn tick_progress(&self) {
        let done = self.progress.fetch_add(1, Ordering::Relaxed) + 1;
        if done % self.progress_portion == 0 {
            log::info!("processed {done}/{} seeds", self.seeds_total);
        }
    }
}

pub struct BlocksFinder<'a> {
    storage: &'a JunctionStorage,
    config: FinderConfig,
}

impl<'a> BlocksFinder<'a> {
    pub fn new(storage: &'a JunctionStorage, config: FinderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { storage, config })
    }

    /// Runs the full parallel search and returns the raw (untrimmed)
    /// block instances in commit order of their ids.
    pub fn find_blocks(&self) -> Result<Vec<BlockInstance>, FinderError> {
        let assignment = AssignmentTable::new(self.storage);
        let seeds = self.seed_schedule();
        log::info!(
            "{} seed vertices over {} chromosome(s), {} thread(s)",
            seeds.len(),
            self.storage.chr_number(),
            self.config.threads
        );

        let shared = Shared {
            storage: self.storage,
            assignment: &assignment,
            blocks_found: AtomicI64::new(0),
            blocks: Mutex::new(Vec::new()),
            progress: AtomicUsize::new(0),
            progress_portion: (seeds.len() / 50).max(1),
            seeds_total: seeds.len(),
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()?;

        let next_worker = AtomicU32::new(0);
        let chunk_size = seeds.len().div_ceil(self.config.threads * 4).max(1);
        pool.install(|| {
            seeds.par_chunks(chunk_size).for_each(|chunk| {
                let worker = WorkerId(next_worker.fetch_add(1, Ordering::Relaxed));
                let mut path = Path::new(
                    self.storage,
                    &assignment,
                    PathTag::growth(worker),
                    &self.config,
                );
                let mut finalizer = Path::new(
                    self.storage,
                    &assignment,
                    PathTag::finalizer(worker),
                    &self.config,
                );
                let mut chooser = Chooser::new(&self.config, self.storage.vertices_number());
                for &vid in chunk {
                    shared.tick_progress();
                    extend::explore_seed(
                        vid,
                        &mut path,
                        &mut finalizer,
                        &mut chooser,
                        &self.config,
                        &shared,
                    );
                }
            });
        });

        let blocks = shared
            .blocks
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        log::info!(
            "blocks found: {}",
            shared.blocks_found.load(Ordering::Relaxed)
        );
        Ok(blocks)
    }

    /// Every stored signed vertex id, shuffled with the configured seed,
    /// then stably ordered by descending occurrence count so heavy
    /// vertices are explored first.
    fn seed_schedule(&self) -> Vec<i64> {
        let vertices = self.storage.vertices_number();
        let mut seeds = Vec::new();
        for v in (-vertices + 1)..vertices {
            if v == 0 {
                continue;
            }
            if self
                .storage
                .occurrences(v)
                .any(|it| it.is_positive_strand())
            {
                seeds.push(v);
            }
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        seeds.shuffle(&mut rng);
        seeds.sort_by(|a, b| {
            self.storage
                .instances_count(*b)
                .cmp(&self.storage.instances_count(*a))
        });
        seeds
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FinderError {
    #[error("failed to start the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
