//! One E-way cache set with LRU replacement.
//!
//! Recency is tracked with a monotone per-set counter: every access stamps
//! the touched line with the current counter value and bumps the counter.
//! The victim in a full set is the line with the smallest stamp. The counter
//! is 64-bit, so wraparound takes an astronomically long run, but a
//! compacting renumber keeps the ordering correct if it ever happens.

use super::line::CacheLine;

/// A fixed-associativity set of cache lines.
pub struct CacheSet {
    lines: Vec<CacheLine>,
    next_lru: u64,
}

impl CacheSet {
    /// Creates a set with `associativity` invalid lines.
    pub fn new(associativity: usize) -> Self {
        Self {
            lines: vec![CacheLine::default(); associativity],
            next_lru: 0,
        }
    }

    /// Returns the way holding a valid line with the given tag, if any.
    pub fn find(&self, tag: u32) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| line.is_valid() && line.tag == tag)
    }

    /// Selects the way to replace: the first invalid way if one exists,
    /// otherwise the valid way with the smallest recency stamp.
    pub fn find_victim(&self) -> usize {
        if let Some(way) = self.lines.iter().position(|line| !line.is_valid()) {
            return way;
        }
        self.lines
            .iter()
            .enumerate()
            .min_by_key(|(_, line)| line.lru)
            .map(|(way, _)| way)
            .unwrap_or(0)
    }

    /// Marks a way as most recently used.
    pub fn touch(&mut self, way: usize) {
        if self.next_lru == u64::MAX {
            self.renumber();
        }
        self.lines[way].lru = self.next_lru;
        self.next_lru += 1;
    }

    /// Compacts recency stamps to 0..n by rank, preserving relative order,
    /// and resumes the counter above them. Required for correctness should
    /// the monotone counter ever reach its ceiling.
    pub fn renumber(&mut self) {
        let mut order: Vec<usize> = (0..self.lines.len())
            .filter(|&way| self.lines[way].is_valid())
            .collect();
        order.sort_by_key(|&way| self.lines[way].lru);
        for (rank, &way) in order.iter().enumerate() {
            self.lines[way].lru = rank as u64;
        }
        self.next_lru = order.len() as u64;
    }

    /// Borrows the line in the given way.
    pub fn line(&self, way: usize) -> &CacheLine {
        &self.lines[way]
    }

    /// Mutably borrows the line in the given way.
    pub fn line_mut(&mut self, way: usize) -> &mut CacheLine {
        &mut self.lines[way]
    }

    /// All lines in way order.
    pub fn lines(&self) -> &[CacheLine] {
        &self.lines
    }

    /// Current value of the monotone recency counter.
    pub fn next_lru(&self) -> u64 {
        self.next_lru
    }
}
