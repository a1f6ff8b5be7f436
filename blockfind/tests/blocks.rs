//! End-to-end runs of the block finder on small hand-checked genomes.

use std::collections::BTreeMap;

use blockfind::{BlockInstance, BlocksFinder, FinderConfig, trim};
use gencore::genome::{Chromosome, Genome};
use junctions::JunctionStorage;

/// 40 bases whose canonical 5-mers are all distinct.
const PLAIN: &str = "CTCCAGCGCGGTCAGTTCCATCACCCTAAGTAACCGAATA";

/// 60 bases, canonical 5-mers distinct, and `MUT` differs by one base at
/// position 30 whose altered 5-mers collide with nothing in `BASE`.
const BASE: &str = "GGGGGCTTGGACAATTAGATTTTACGGTGTACCGCGCCATACTAGGGAAGCTCCCCGTGG";
const MUT: &str = "GGGGGCTTGGACAATTAGATTTTACGGTGTGCCGCGCCATACTAGGGAAGCTCCCCGTGG";

/// 15-base filler + 30-base segment + filler + its reverse complement +
/// filler; only the segment's 5-mers repeat.
const PALINDROMIC: &str = "ATGCTGATAGAATACCACACGCCGTATCCTCCCAGATATGAGCGGGACGTTTCAATCTAACCGCTCATATCTGGGAGGATACGGCGTGTGACTTTGCAGGCTATG";

/// 45 bases with distinct canonical 5-mers; sharing its 5-base-offset
/// suffix with a third chromosome exercises mid-path instance seeding.
const SUFFIXED: &str = "TTACCACATAGATTCAAGTCTGCAACCGATCATGTCTACGTTGAG";

fn reverse_complement(s: &str) -> String {
    s.chars()
        .rev()
        .map(|c| match c {
            'A' => 'T',
            'T' => 'A',
            'C' => 'G',
            _ => 'C',
        })
        .collect()
}

fn genome(seqs: &[&str]) -> Genome {
    seqs.iter()
        .enumerate()
        .map(|(i, s)| Chromosome::new(format!("chr{i}"), s.parse().unwrap()))
        .collect()
}

fn config() -> FinderConfig {
    FinderConfig {
        k: 5,
        min_block_size: 20,
        max_branch_size: 2,
        max_flanking_size: 2,
        looking_depth: 4,
        sample_size: 8,
        threads: 1,
        seed: 0,
    }
}

fn run(seqs: &[&str], config: &FinderConfig) -> (JunctionStorage, Vec<BlockInstance>) {
    let storage = JunctionStorage::build(genome(seqs), config.k);
    let finder = BlocksFinder::new(&storage, config.clone()).unwrap();
    let raw = finder.find_blocks().unwrap();
    let trimmed = trim::trim_blocks(&storage, &raw, config.min_block_size);
    (storage, trimmed)
}

/// Instances keyed by trimmed block id, as (chr, start, end, sign).
fn by_block(blocks: &[BlockInstance]) -> BTreeMap<i64, Vec<(usize, usize, usize, i64)>> {
    let mut map: BTreeMap<i64, Vec<_>> = BTreeMap::new();
    for b in blocks {
        map.entry(b.block_id())
            .or_default()
            .push((b.chr_id(), b.start(), b.end(), b.sign()));
    }
    for group in map.values_mut() {
        group.sort();
    }
    map
}

fn assert_invariants(storage: &JunctionStorage, blocks: &[BlockInstance], min_block_size: usize) {
    // Non-overlap per chromosome.
    let mut covered: Vec<Vec<bool>> = (0..storage.chr_number())
        .map(|c| vec![false; storage.chr_size(c)])
        .collect();
    for b in blocks {
        assert!(b.end() <= storage.chr_size(b.chr_id()));
        assert!(b.length() >= min_block_size, "short instance: {b:?}");
        for p in b.start()..b.end() {
            assert!(!covered[b.chr_id()][p], "overlap on chr{} at {p}", b.chr_id());
            covered[b.chr_id()][p] = true;
        }
    }
    // Multiplicity of every trimmed block.
    for group in by_block(blocks).values() {
        assert!(group.len() >= 2, "lonely block instance: {group:?}");
    }
}

#[test]
fn identical_pair_yields_one_full_length_block() {
    let (storage, trimmed) = run(&[PLAIN, PLAIN], &config());
    assert_invariants(&storage, &trimmed, 20);

    let groups = by_block(&trimmed);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[&1], vec![(0, 0, 40, 1), (1, 0, 40, 1)]);
}

#[test]
fn substitution_splits_the_block() {
    let (storage, trimmed) = run(&[BASE, BASE, MUT], &config());
    assert_invariants(&storage, &trimmed, 20);

    let groups = by_block(&trimmed);
    assert_eq!(groups.len(), 2);
    let mut spans: Vec<Vec<(usize, usize, usize, i64)>> = groups.into_values().collect();
    spans.sort();
    assert_eq!(
        spans[0],
        vec![(0, 0, 30, 1), (1, 0, 30, 1), (2, 0, 30, 1)]
    );
    assert_eq!(
        spans[1],
        vec![(0, 31, 60, 1), (1, 31, 60, 1), (2, 31, 60, 1)]
    );
}

#[test]
fn substitution_bubble_is_tolerated_with_larger_branch_limit() {
    let config = FinderConfig {
        max_branch_size: 6,
        ..config()
    };
    let (storage, trimmed) = run(&[BASE, BASE, MUT], &config);
    assert_invariants(&storage, &trimmed, 20);

    let groups = by_block(&trimmed);
    assert_eq!(groups.len(), 1);
    assert_eq!(
        groups[&1],
        vec![(0, 0, 60, 1), (1, 0, 60, 1), (2, 0, 60, 1)]
    );
}

#[test]
fn palindromic_repeat_reports_disjoint_opposite_strands() {
    let (storage, trimmed) = run(&[PALINDROMIC], &config());
    assert_invariants(&storage, &trimmed, 20);

    let groups = by_block(&trimmed);
    assert_eq!(groups.len(), 1);
    let group = &groups[&1];
    assert_eq!(group.len(), 2);

    // The two copies of the segment, one per strand.
    let spans: Vec<(usize, usize, usize)> =
        group.iter().map(|&(c, s, e, _)| (c, s, e)).collect();
    assert_eq!(spans, vec![(0, 15, 45), (0, 60, 90)]);
    let signs: Vec<i64> = group.iter().map(|&(.., sign)| sign).collect();
    assert_eq!(signs[0] * signs[1], -1);
}

#[test]
fn reverse_complement_pair_pairs_opposite_strands() {
    let rc = reverse_complement(PLAIN);
    let (storage, trimmed) = run(&[PLAIN, &rc], &config());
    assert_invariants(&storage, &trimmed, 20);

    let groups = by_block(&trimmed);
    assert_eq!(groups.len(), 1);
    let group = &groups[&1];
    assert_eq!(group.len(), 2);
    assert_eq!(group[0].0, 0);
    assert_eq!(group[1].0, 1);
    for &(_, start, end, _) in group {
        assert_eq!((start, end), (0, 40));
    }
    // One occurrence per strand.
    assert_eq!(group[0].3 * group[1].3, -1);
}

#[test]
fn shared_suffix_block_excludes_the_unshared_prefix() {
    let tail = &SUFFIXED[5..];
    let (storage, trimmed) = run(&[SUFFIXED, SUFFIXED, tail], &config());
    assert_invariants(&storage, &trimmed, 20);

    let groups = by_block(&trimmed);
    assert_eq!(groups.len(), 1);
    assert_eq!(
        groups[&1],
        vec![(0, 0, 45, 1), (1, 0, 45, 1), (2, 0, 40, 1)]
    );
}

#[test]
fn zero_tolerance_degenerates_to_exact_extension() {
    let config = FinderConfig {
        max_branch_size: 0,
        max_flanking_size: 0,
        ..config()
    };
    let (storage, trimmed) = run(&[BASE, BASE, MUT], &config);
    assert_invariants(&storage, &trimmed, 20);

    // No bubble tolerance: the substitution still splits the block.
    let groups = by_block(&trimmed);
    assert_eq!(groups.len(), 2);
}

#[test]
fn under_two_occurrences_yield_no_blocks() {
    let (_, trimmed) = run(&[BASE], &config());
    assert!(trimmed.is_empty());
}

#[test]
fn single_thread_fixed_seed_is_deterministic() {
    let first = run(&[BASE, BASE, MUT, PLAIN], &config()).1;
    let second = run(&[BASE, BASE, MUT, PLAIN], &config()).1;
    assert_eq!(first, second);
}

#[test]
fn parallel_run_upholds_output_invariants() {
    let rc = reverse_complement(BASE);
    let seqs = [BASE, BASE, MUT, &rc, PLAIN, PLAIN, SUFFIXED, SUFFIXED];
    let config = FinderConfig {
        threads: 4,
        ..config()
    };
    let (storage, trimmed) = run(&seqs, &config);
    assert_invariants(&storage, &trimmed, 20);
    assert!(!trimmed.is_empty());
}
