use serde::{Deserialize, Serialize};

/// One genomic occurrence of a committed block: a half-open forward-strand
/// interval on one chromosome, with the block id carrying the strand sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
pub struct BlockInstance {
    id: i64,
    chr: usize,
    start: usize,
    end: usize,
}

impl BlockInstance {
    pub fn new(signed_id: i64, chr: usize, start: usize, end: usize) -> Self {
        debug_assert!(signed_id != 0);
        debug_assert!(start < end);
        Self {
            id: signed_id,
            chr,
            start,
            end,
        }
    }

    pub fn signed_id(&self) -> i64 {
        self.id
    }
    pub fn block_id(&self) -> i64 {
        self.id.abs()
    }
    pub fn sign(&self) -> i64 {
        self.id.signum()
    }
    pub fn is_forward(&self) -> bool {
        self.id > 0
    }

    pub fn chr_id(&self) -> usize {
        self.chr
    }
    pub fn start(&self) -> usize {
        self.start
    }
    pub fn end(&self) -> usize {
        self.end
    }
    pub fn length(&self) -> usize {
        self.end - self.start
    }
}
