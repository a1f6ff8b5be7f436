//! Post-processing of committed blocks: resolve inter-block overlap,
//! drop what falls under the minimum size, renumber the survivors.

use junctions::JunctionStorage;

use crate::block::BlockInstance;

/// Trims raw block instances against each other. Groups (original block
/// ids) are processed in descending multiplicity so blocks with more
/// copies keep their ground; within the surviving set, intervals never
/// overlap and every instance is at least `min_block_size` long. Groups
/// left with fewer than two instances are dropped entirely and give their
/// ground back.
pub fn trim_blocks(
    storage: &JunctionStorage,
    blocks: &[BlockInstance],
    min_block_size: i64,
) -> Vec<BlockInstance> {
    let mut covered: Vec<Vec<bool>> = (0..storage.chr_number())
        .map(|chr| vec![false; storage.chr_size(chr) + 1])
        .collect();

    let max_id = blocks.iter().map(BlockInstance::block_id).max().unwrap_or(0);
    let mut multiplicity = vec![0u32; (max_id + 1) as usize];
    for b in blocks {
        multiplicity[b.block_id() as usize] += 1;
    }

    let mut sorted = blocks.to_vec();
    sorted.sort_by(|a, b| {
        multiplicity[b.block_id() as usize]
            .cmp(&multiplicity[a.block_id() as usize])
            .then(a.block_id().cmp(&b.block_id()))
    });

    let mut trimmed = Vec::new();
    let mut trimmed_id = 1;
    let mut group_start = 0;
    while group_start < sorted.len() {
        let id = sorted[group_start].block_id();
        let group_end = group_start
            + sorted[group_start..]
                .iter()
                .take_while(|b| b.block_id() == id)
                .count();

        let mut buffer = Vec::new();
        for b in &sorted[group_start..group_end] {
            let chr = b.chr_id();
            let mut start = b.start();
            let mut end = b.end();
            while start < end && covered[chr][start] {
                start += 1;
            }
            while end > start && covered[chr][end] {
                end -= 1;
            }
            if (end - start) as i64 >= min_block_size {
                buffer.push(BlockInstance::new(b.sign() * trimmed_id, chr, start, end));
                covered[chr][start..end].fill(true);
            }
        }

        if buffer.len() > 1 {
            trimmed_id += 1;
            trimmed.append(&mut buffer);
        } else {
            // The group cannot stand on its own; give its cover back.
            for b in &buffer {
                covered[b.chr_id()][b.start()..b.end()].fill(false);
            }
        }

        group_start = group_end;
    }

    log::info!(
        "{} trimmed block(s) from {} raw group(s)",
        trimmed_id - 1,
        multiplicity.iter().filter(|&&m| m > 0).count()
    );
    trimmed
}

/// Fraction of all input bases covered by the trimmed blocks.
pub fn coverage(storage: &JunctionStorage, trimmed: &[BlockInstance]) -> f64 {
    let total: usize = (0..storage.chr_number()).map(|c| storage.chr_size(c)).sum();
    if total == 0 {
        return 0.0;
    }
    let covered: usize = trimmed.iter().map(BlockInstance::length).sum();
    covered as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use gencore::genome::{Chromosome, Genome};

    use super::*;

    fn storage(len: usize, chrs: usize) -> JunctionStorage {
        let seq = "ACGTA".repeat(len / 5 + 1);
        let genome: Genome = (0..chrs)
            .map(|i| Chromosome::new(format!("chr{i}"), seq[..len].parse().unwrap()))
            .collect();
        JunctionStorage::build(genome, 5)
    }

    #[test]
    fn keeps_disjoint_groups_and_renumbers() {
        let s = storage(100, 2);
        let blocks = vec![
            BlockInstance::new(7, 0, 0, 40),
            BlockInstance::new(-7, 1, 0, 40),
            BlockInstance::new(9, 0, 50, 90),
            BlockInstance::new(9, 1, 50, 90),
        ];
        let trimmed = trim_blocks(&s, &blocks, 20);
        assert_eq!(trimmed.len(), 4);
        let ids: Vec<i64> = trimmed.iter().map(BlockInstance::signed_id).collect();
        assert_eq!(ids, vec![1, -1, 2, 2]);
    }

    #[test]
    fn higher_multiplicity_wins_overlap() {
        let s = storage(200, 2);
        let blocks = vec![
            // A two-copy group overlapping a three-copy group.
            BlockInstance::new(1, 0, 50, 120),
            BlockInstance::new(1, 1, 50, 120),
            BlockInstance::new(2, 0, 0, 60),
            BlockInstance::new(2, 1, 0, 60),
            BlockInstance::new(2, 1, 100, 160),
        ];
        let trimmed = trim_blocks(&s, &blocks, 20);

        // The multiplicity-3 group is placed first, untouched.
        let heavy: Vec<_> = trimmed.iter().filter(|b| b.block_id() == 1).collect();
        assert_eq!(heavy.len(), 3);
        assert!(heavy.iter().all(|b| b.length() == 60));

        // The two-copy group was shrunk off the covered regions.
        let light: Vec<_> = trimmed.iter().filter(|b| b.block_id() == 2).collect();
        assert_eq!(light.len(), 2);
        for b in light {
            assert!(b.start() >= 60);
            assert!(b.length() >= 20);
        }

        // No overlap anywhere.
        let mut seen = vec![vec![false; 201]; 2];
        for b in &trimmed {
            for p in b.start()..b.end() {
                assert!(!seen[b.chr_id()][p], "overlap at {p}");
                seen[b.chr_id()][p] = true;
            }
        }
    }

    #[test]
    fn lonely_survivor_reverts_its_cover() {
        let s = storage(100, 2);
        let blocks = vec![
            BlockInstance::new(1, 0, 0, 50),
            BlockInstance::new(1, 1, 0, 50),
            // Group 2 collides with group 1 on chr0 only; its chr1 copy
            // survives alone and must be dropped.
            BlockInstance::new(2, 0, 20, 49),
            BlockInstance::new(2, 1, 60, 89),
        ];
        let trimmed = trim_blocks(&s, &blocks, 20);
        assert_eq!(trimmed.len(), 2);
        assert!(trimmed.iter().all(|b| b.block_id() == 1));

        // The dropped group's cover was reverted, so a later run over the
        // same region could still claim chr1 60..89.
        let blocks2 = vec![
            BlockInstance::new(1, 0, 0, 50),
            BlockInstance::new(1, 1, 0, 50),
            BlockInstance::new(2, 0, 20, 49),
            BlockInstance::new(2, 1, 60, 89),
            BlockInstance::new(3, 1, 60, 89),
            BlockInstance::new(3, 0, 60, 89),
        ];
        let trimmed2 = trim_blocks(&s, &blocks2, 20);
        assert_eq!(trimmed2.len(), 4);
    }
}
