use std::collections::HashMap;
use std::ops::Range;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;

use hulhe_cards::HandEvaluator;
use hulhe_cfr::{deal_hole_cards, ChanceProvider};
use hulhe_core::CFRConfig;
use hulhe_tree::{GameTree, Player};

use crate::memory::MemoryMonitor;
use crate::scheduler::{static_partition, DynamicChunks, SchedulingPolicy};
use crate::stats::{aggregate, AggregateStats, ThreadStats};
use crate::striped::StripedInfoSetStore;
use crate::traverse::{parallel_traverse, ParallelContext};

/// Run `iterations` paired CFR iterations split across `workers` threads
/// against one shared [`StripedInfoSetStore`] (spec.md §4.8). Each
/// iteration deals its own hand and runs a traversal per player, same as
/// the single-threaded trainer; only the full-enumeration path is
/// supported here, sampling stays on `hulhe_cfr::train` (see DESIGN.md).
///
/// Work is processed in batches of `config.check_frequency` iterations.
/// Between batches, when `memory` is given, its usage is sampled against
/// `store.len()` and, if pressure warrants it, stale infosets are pruned
/// from `store` (spec.md §4.9/§7's "recovered locally via pruning and
/// eviction") before the next batch starts.
#[allow(clippy::too_many_arguments)]
pub fn train_parallel(
    tree: &GameTree,
    store: &StripedInfoSetStore,
    config: CFRConfig,
    evaluator: Option<&(dyn HandEvaluator + Sync)>,
    chance: &(dyn ChanceProvider + Sync),
    iterations: usize,
    workers: usize,
    policy: SchedulingPolicy,
    seed: u64,
    mut memory: Option<&mut MemoryMonitor>,
) -> AggregateStats {
    let workers = workers.max(1);
    let batch_size = config.check_frequency.max(1);

    let mut by_thread: HashMap<usize, ThreadStats> = HashMap::new();
    let mut start = 0;
    while start < iterations {
        let end = (start + batch_size).min(iterations);
        let batch = run_batch(tree, store, config, evaluator, chance, start, end, workers, policy, seed);
        for entry in &batch {
            by_thread
                .entry(entry.thread_id)
                .and_modify(|acc| merge_into(acc, entry))
                .or_insert(*entry);
        }
        start = end;

        if let Some(monitor) = memory.as_deref_mut() {
            let nodes_before = store.len();
            let pressure = monitor.sample(nodes_before);
            if let Some(strategy) = monitor.suggest_strategy(pressure, nodes_before) {
                store.prune_unused(end, batch_size);
                let nodes_after = store.len();
                monitor.record_prune(end, strategy, nodes_before, nodes_after);
            }
        }

        if hulhe_core::interrupted() {
            log::info!("parallel training interrupted after {end} of {iterations} iterations");
            break;
        }
    }

    let per_worker: Vec<ThreadStats> = by_thread.into_values().collect();
    aggregate(&per_worker)
}

fn run_batch(
    tree: &GameTree,
    store: &StripedInfoSetStore,
    config: CFRConfig,
    evaluator: Option<&(dyn HandEvaluator + Sync)>,
    chance: &(dyn ChanceProvider + Sync),
    start: usize,
    end: usize,
    workers: usize,
    policy: SchedulingPolicy,
    seed: u64,
) -> Vec<ThreadStats> {
    let len = end - start;
    // Batches are decorrelated by folding the batch's global start index
    // into each worker's seed, so two batches never replay the same deals.
    let batch_seed = seed.wrapping_add(start as u64);

    match policy {
        SchedulingPolicy::Static => static_partition(len, workers)
            .into_par_iter()
            .enumerate()
            .map(|(thread_id, range)| {
                let mut rng = SmallRng::seed_from_u64(batch_seed.wrapping_add(thread_id as u64));
                let global = (range.start + start)..(range.end + start);
                run_range(tree, store, config, evaluator, chance, thread_id, &global, &mut rng)
            })
            .collect(),
        SchedulingPolicy::Dynamic { chunk_size } => {
            let chunks = DynamicChunks::new(len, chunk_size);
            (0..workers)
                .into_par_iter()
                .map(|thread_id| {
                    let mut rng = SmallRng::seed_from_u64(batch_seed.wrapping_add(thread_id as u64));
                    let mut stats = ThreadStats {
                        thread_id,
                        ..Default::default()
                    };
                    while let Some(range) = chunks.next_chunk() {
                        let global = (range.start + start)..(range.end + start);
                        let chunk_stats = run_range(tree, store, config, evaluator, chance, thread_id, &global, &mut rng);
                        merge_into(&mut stats, &chunk_stats);
                    }
                    stats
                })
                .collect()
        }
        SchedulingPolicy::WorkStealing => (0..len)
            .into_par_iter()
            .map(|i| {
                let mut rng = SmallRng::seed_from_u64(batch_seed.wrapping_add(i as u64));
                let global = (i + start)..(i + start + 1);
                run_range(tree, store, config, evaluator, chance, i % workers, &global, &mut rng)
            })
            .collect(),
    }
}

fn merge_into(into: &mut ThreadStats, from: &ThreadStats) {
    into.iterations_run += from.iterations_run;
    into.nodes_visited += from.nodes_visited;
    into.busy_time += from.busy_time;
}

#[allow(clippy::too_many_arguments)]
fn run_range(
    tree: &GameTree,
    store: &StripedInfoSetStore,
    config: CFRConfig,
    evaluator: Option<&(dyn HandEvaluator + Sync)>,
    chance: &(dyn ChanceProvider + Sync),
    thread_id: usize,
    range: &Range<usize>,
    rng: &mut SmallRng,
) -> ThreadStats {
    let started = Instant::now();
    let mut stats = ThreadStats {
        thread_id,
        ..Default::default()
    };
    for iteration in range.clone() {
        let deal = deal_hole_cards(rng);
        for &traverser in &[Player::P0, Player::P1] {
            let ctx = ParallelContext {
                store,
                evaluator,
                chance,
                config,
                iteration: iteration + 1,
            };
            parallel_traverse(tree, tree.root().id, &deal, 1.0, 1.0, traverser, &ctx, rng);
            stats.nodes_visited += 1;
        }
        stats.iterations_run += 1;
    }
    stats.busy_time = started.elapsed();
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use hulhe_cfr::FullDeckChance;
    use hulhe_core::GameParams;
    use hulhe_tree::build_game_tree;

    #[test]
    fn static_policy_trains_and_populates_the_store() {
        let tree = build_game_tree(GameParams::new(4, 1, 2, 4).unwrap(), true, false).unwrap();
        let store = StripedInfoSetStore::new(16);
        let chance = FullDeckChance;
        let summary = train_parallel(
            &tree,
            &store,
            CFRConfig::default(),
            None,
            &chance,
            20,
            4,
            SchedulingPolicy::Static,
            1,
            None,
        );
        assert_eq!(summary.total_iterations, 20);
        assert!(!store.is_empty());
    }

    #[test]
    fn dynamic_policy_covers_every_iteration() {
        let tree = build_game_tree(GameParams::new(4, 1, 2, 4).unwrap(), true, false).unwrap();
        let store = StripedInfoSetStore::new(16);
        let chance = FullDeckChance;
        let summary = train_parallel(
            &tree,
            &store,
            CFRConfig::default(),
            None,
            &chance,
            17,
            4,
            SchedulingPolicy::Dynamic { chunk_size: 3 },
            7,
            None,
        );
        assert_eq!(summary.total_iterations, 17);
    }

    #[test]
    fn work_stealing_policy_runs_every_iteration_once() {
        let tree = build_game_tree(GameParams::new(4, 1, 2, 4).unwrap(), true, false).unwrap();
        let store = StripedInfoSetStore::new(16);
        let chance = FullDeckChance;
        let summary = train_parallel(
            &tree,
            &store,
            CFRConfig::default(),
            None,
            &chance,
            9,
            3,
            SchedulingPolicy::WorkStealing,
            3,
            None,
        );
        assert_eq!(summary.total_iterations, 9);
    }

    #[test]
    fn memory_pressure_triggers_an_auto_prune() {
        use crate::memory::{MemoryMonitor, MemoryThresholds};

        let tree = build_game_tree(GameParams::new(4, 1, 2, 4).unwrap(), true, false).unwrap();
        let store = StripedInfoSetStore::new(16);
        let chance = FullDeckChance;
        let mut config = CFRConfig::default();
        config.check_frequency = 5;
        let thresholds = MemoryThresholds {
            warning_bytes: 1,
            critical_bytes: 1,
        };
        let mut monitor = MemoryMonitor::new(thresholds, 2.0);

        train_parallel(
            &tree,
            &store,
            config,
            None,
            &chance,
            20,
            4,
            SchedulingPolicy::Static,
            1,
            Some(&mut monitor),
        );

        assert!(!monitor.history().is_empty());
        assert!(!monitor.prune_events().is_empty());
    }
}
