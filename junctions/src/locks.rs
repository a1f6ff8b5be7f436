//! Range locks over chromosome positions.
//!
//! Each chromosome is covered by an array of mutexes, one per fixed-width
//! position window. Locking a range acquires every window it touches.
//! Callers locking several (possibly overlapping) ranges must present them
//! in ascending `(chromosome, window)` order and thread the same
//! [`LockHint`] through every call: windows at or before the hint are
//! already held and are skipped, which both amortizes the traversal and
//! keeps the whole acquisition sequence strictly ordered, so concurrent
//! lockers cannot deadlock.

use std::sync::{Mutex, MutexGuard};

/// Bases covered by one window mutex.
const WINDOW: usize = 1 << 12;

pub struct RangeLocks {
    windows: Vec<Vec<Mutex<()>>>,
}

/// Cursor over the windows already acquired in the current sorted pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockHint {
    last: Option<(usize, usize)>,
}

impl LockHint {
    pub fn new() -> Self {
        Self { last: None }
    }
}
impl Default for LockHint {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeLocks {
    pub fn new(chr_sizes: impl IntoIterator<Item = usize>) -> Self {
        let windows = chr_sizes
            .into_iter()
            .map(|size| (0..=size / WINDOW).map(|_| Mutex::new(())).collect())
            .collect();
        Self { windows }
    }

    /// Locks forward-coordinate range `[begin, end]` on `chr`, appending the
    /// newly acquired guards to `held`. Dropping `held` releases them.
    pub fn lock_range<'a>(
        &'a self,
        chr: usize,
        begin: usize,
        end: usize,
        hint: &mut LockHint,
        held: &mut Vec<MutexGuard<'a, ()>>,
    ) {
        debug_assert!(begin <= end);
        let lo = begin / WINDOW;
        let hi = end / WINDOW;
        for window in lo..=hi {
            if let Some(last) = hint.last {
                if (chr, window) <= last {
                    continue;
                }
            }
            held.push(
                self.windows[chr][window]
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()),
            );
            hint.last = Some((chr, window));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_ranges_share_windows() {
        let locks = RangeLocks::new([WINDOW * 3]);
        let mut hint = LockHint::new();
        let mut held = Vec::new();

        locks.lock_range(0, 0, WINDOW * 2, &mut hint, &mut held);
        let first = held.len();
        // Overlaps the already-held windows, so only the new tail locks.
        locks.lock_range(0, WINDOW, WINDOW * 3 - 1, &mut hint, &mut held);

        assert_eq!(first, 3);
        assert_eq!(held.len(), 3);
        drop(held);

        // Everything was released: a fresh pass can lock again.
        let mut hint = LockHint::new();
        let mut held = Vec::new();
        locks.lock_range(0, 0, 0, &mut hint, &mut held);
        assert_eq!(held.len(), 1);
    }
}
