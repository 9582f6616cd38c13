//! Shared transposition table.
//!
//! The table is probed and written without locks. Each 16-byte slot holds
//! two atomic words: the packed entry data and the position key XORed with
//! that data. A torn read (key from one write, data from another) fails
//! the XOR check and reads as a miss, so racing writers can never hand the
//! search a corrupted entry for the wrong position.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use sable_core::Move;

use crate::search::MATE_BOUND;

/// Validity of a stored score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Bound {
    /// Empty slot.
    None = 0,
    /// Score is exact (PV node).
    Exact = 1,
    /// Score is a lower bound (beta cutoff).
    Lower = 2,
    /// Score is an upper bound (failed low).
    Upper = 3,
}

impl Bound {
    const fn from_bits(bits: u64) -> Bound {
        match bits & 3 {
            1 => Bound::Exact,
            2 => Bound::Lower,
            3 => Bound::Upper,
            _ => Bound::None,
        }
    }
}

/// Decoded result of a successful probe.
#[derive(Debug, Clone, Copy)]
pub struct TtEntry {
    /// Best move from the stored search of this position.
    pub mv: Move,
    /// Depth the stored score was searched to.
    pub depth: u8,
    pub bound: Bound,
    /// Score, already adjusted back to be relative to the probing node.
    pub score: i32,
    /// Static evaluation recorded when the entry was written.
    pub eval: i32,
}

/// Convert a node-relative score to its stored form.
///
/// Mate scores encode distance from the node they were found at, not from
/// the root, so an entry stays correct when reached along a different path.
pub fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_BOUND {
        score + ply as i32
    } else if score <= -MATE_BOUND {
        score - ply as i32
    } else {
        score
    }
}

/// Inverse of [`score_to_tt`].
pub fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_BOUND {
        score - ply as i32
    } else if score <= -MATE_BOUND {
        score + ply as i32
    } else {
        score
    }
}

/// Entry data packed into one u64:
/// move(16) | depth(8) | bound(2) | age(6) | score(i16) | eval(i16).
fn pack(mv: Move, depth: u8, bound: Bound, age: u8, score: i16, eval: i16) -> u64 {
    (mv.raw() as u64)
        | ((depth as u64) << 16)
        | ((bound as u64) << 24)
        | (((age & 0x3F) as u64) << 26)
        | ((score as u16 as u64) << 32)
        | ((eval as u16 as u64) << 48)
}

#[derive(Default)]
struct Slot {
    /// Position key XORed with `data`.
    key: AtomicU64,
    data: AtomicU64,
}

/// Fixed-size hash table of search results.
pub struct TranspositionTable {
    slots: Box<[Slot]>,
    mask: u64,
    age: AtomicU8,
}

impl TranspositionTable {
    /// Allocate a table of roughly `mb` megabytes (rounded down to a power
    /// of two slots, at least one).
    pub fn new(mb: usize) -> TranspositionTable {
        let bytes = mb * 1024 * 1024;
        let count = (bytes / std::mem::size_of::<Slot>())
            .next_power_of_two()
            .max(2)
            >> 1;
        let slots: Vec<Slot> = (0..count).map(|_| Slot::default()).collect();
        TranspositionTable {
            slots: slots.into_boxed_slice(),
            mask: (count - 1) as u64,
            age: AtomicU8::new(0),
        }
    }

    /// Wipe every entry and reset the age counter.
    pub fn clear(&self) {
        for slot in self.slots.iter() {
            slot.key.store(0, Ordering::Relaxed);
            slot.data.store(0, Ordering::Relaxed);
        }
        self.age.store(0, Ordering::Relaxed);
    }

    /// Advance the age counter. Called once per root search so replacement
    /// prefers entries from the current search.
    pub fn bump_age(&self) {
        let age = self.age.load(Ordering::Relaxed);
        self.age.store(age.wrapping_add(1) & 0x3F, Ordering::Relaxed);
    }

    /// Look up a position. Mate scores come back adjusted to `ply`.
    pub fn probe(&self, hash: u64, ply: usize) -> Option<TtEntry> {
        let slot = &self.slots[(hash & self.mask) as usize];
        let data = slot.data.load(Ordering::Relaxed);
        let key = slot.key.load(Ordering::Relaxed);
        if key ^ data != hash {
            return None;
        }
        let bound = Bound::from_bits(data >> 24);
        if bound == Bound::None {
            return None;
        }
        Some(TtEntry {
            mv: Move::from_raw(data as u16),
            depth: (data >> 16) as u8,
            bound,
            score: score_from_tt((data >> 32) as u16 as i16 as i32, ply),
            eval: (data >> 48) as u16 as i16 as i32,
        })
    }

    /// Store a search result. `score` is relative to the storing node.
    ///
    /// Replacement: an entry survives only against a shallower write from
    /// the same age with a non-exact bound.
    pub fn store(
        &self,
        hash: u64,
        mv: Move,
        depth: u8,
        bound: Bound,
        score: i32,
        eval: i32,
        ply: usize,
    ) {
        let slot = &self.slots[(hash & self.mask) as usize];
        let age = self.age.load(Ordering::Relaxed);

        let existing = slot.data.load(Ordering::Relaxed);
        let existing_bound = Bound::from_bits(existing >> 24);
        let existing_age = ((existing >> 26) & 0x3F) as u8;
        let existing_depth = (existing >> 16) as u8;
        let replace = existing_bound == Bound::None
            || existing_age != age
            || depth >= existing_depth
            || bound == Bound::Exact;
        if !replace {
            return;
        }

        let data = pack(
            mv,
            depth,
            bound,
            age,
            score_to_tt(score, ply) as i16,
            eval as i16,
        );
        slot.key.store(hash ^ data, Ordering::Relaxed);
        slot.data.store(data, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("slots", &self.slots.len())
            .field("age", &self.age.load(Ordering::Relaxed))
            .finish()
    }
}
