//! Per-search mutable state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use sable_core::{Board, Move, Undo};

use crate::eval::Accumulator;
use crate::search::tt::TranspositionTable;
use crate::search::MAX_DEPTH;

/// Size of the per-ply accumulator stack.
pub(crate) const STACK_SIZE: usize = 512;

/// Everything one root search mutates: the board, the accumulator stack,
/// counters, the clock, and the stop flag.
///
/// The context is single-owner for the duration of a search. Cancellation
/// is cooperative: [`SearchContext::out_of_time`] is polled at every node
/// and commits the stop transition; external callers request a stop through
/// the shared abort flag.
pub struct SearchContext<'a> {
    pub board: Board,
    pub tt: &'a TranspositionTable,
    accumulators: Box<[Accumulator; STACK_SIZE]>,
    pub nodes: u64,
    pub ply: usize,
    /// Depth cap for iterative deepening (`go depth N`).
    pub max_depth: u8,
    start: Instant,
    budget: Option<Duration>,
    abort: Option<Arc<AtomicBool>>,
    pub stop: bool,
}

impl<'a> SearchContext<'a> {
    /// Build a context for searching `board`. `budget` of `None` means no
    /// time limit (the search runs until stopped or depth-capped).
    pub fn new(board: Board, tt: &'a TranspositionTable, budget: Option<Duration>) -> Self {
        let mut accumulators = Box::new([Accumulator::default(); STACK_SIZE]);
        accumulators[0] = Accumulator::refresh(&board);
        SearchContext {
            board,
            tt,
            accumulators,
            nodes: 0,
            ply: 0,
            max_depth: MAX_DEPTH,
            start: Instant::now(),
            budget,
            abort: None,
            stop: false,
        }
    }

    /// Attach a shared abort flag checked alongside the clock.
    pub fn with_abort(mut self, abort: Arc<AtomicBool>) -> Self {
        self.abort = Some(abort);
        self
    }

    /// Restart the clock and clear the stop flag. Called by the driver at
    /// the start of every root search so a context can be reused move after
    /// move (self-play does this).
    pub(crate) fn reset_clock(&mut self) {
        self.start = Instant::now();
        self.stop = false;
    }

    /// Time since the current root search began.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Poll the clock and abort flag, committing `stop` when either fires.
    pub(crate) fn out_of_time(&mut self) -> bool {
        if self.stop {
            return true;
        }
        if let Some(abort) = &self.abort {
            if abort.load(Ordering::Relaxed) {
                self.stop = true;
                return true;
            }
        }
        if let Some(budget) = self.budget {
            if self.start.elapsed() >= budget {
                self.stop = true;
                return true;
            }
        }
        false
    }

    /// Accumulator for the current node.
    #[inline]
    pub(crate) fn accumulator(&self) -> &Accumulator {
        &self.accumulators[self.ply]
    }

    /// Copy the current accumulator into the child slot, apply `mv`, make
    /// it on the board, and descend one ply.
    pub(crate) fn push_move(&mut self, mv: Move) -> Undo {
        debug_assert!(self.ply + 1 < STACK_SIZE, "accumulator stack overflow");
        let mut child = self.accumulators[self.ply];
        child.apply(&self.board, mv);
        self.ply += 1;
        self.accumulators[self.ply] = child;
        self.board.make_move(mv)
    }

    /// Undo [`SearchContext::push_move`].
    pub(crate) fn pop_move(&mut self, mv: Move, undo: Undo) {
        self.board.undo_move(mv, undo);
        self.ply -= 1;
    }

    /// Descend one ply passing the turn; the accumulator is unchanged.
    pub(crate) fn push_null(&mut self) -> Undo {
        debug_assert!(self.ply + 1 < STACK_SIZE, "accumulator stack overflow");
        self.accumulators[self.ply + 1] = self.accumulators[self.ply];
        self.ply += 1;
        self.board.make_null_move()
    }

    /// Undo [`SearchContext::push_null`].
    pub(crate) fn pop_null(&mut self, undo: Undo) {
        self.board.undo_null_move(undo);
        self.ply -= 1;
    }

    /// Play a move at the root, keeping the accumulator stack in sync.
    /// Used between self-play searches; the game history is preserved.
    pub fn advance_root(&mut self, mv: Move) {
        debug_assert_eq!(self.ply, 0);
        let mut acc = self.accumulators[0];
        acc.apply(&self.board, mv);
        self.accumulators[0] = acc;
        self.board.make_move(mv);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_core::Square;

    #[test]
    fn push_pop_restores_ply_and_board() {
        let tt = TranspositionTable::new(1);
        let mut ctx = SearchContext::new(Board::starting_position(), &tt, None);
        let before = ctx.board.clone();
        let acc_before = *ctx.accumulator();

        let mv = Move::normal(Square::E2, Square::E4);
        let undo = ctx.push_move(mv);
        assert_eq!(ctx.ply, 1);
        ctx.pop_move(mv, undo);
        assert_eq!(ctx.ply, 0);
        assert_eq!(ctx.board, before);
        assert_eq!(*ctx.accumulator(), acc_before);
    }

    #[test]
    fn zero_budget_stops_immediately() {
        let tt = TranspositionTable::new(1);
        let mut ctx = SearchContext::new(
            Board::starting_position(),
            &tt,
            Some(Duration::from_nanos(0)),
        );
        assert!(ctx.out_of_time());
        assert!(ctx.stop);
    }

    #[test]
    fn no_budget_never_times_out() {
        let tt = TranspositionTable::new(1);
        let mut ctx = SearchContext::new(Board::starting_position(), &tt, None);
        assert!(!ctx.out_of_time());
    }

    #[test]
    fn abort_flag_commits_stop() {
        let tt = TranspositionTable::new(1);
        let abort = Arc::new(AtomicBool::new(false));
        let mut ctx = SearchContext::new(Board::starting_position(), &tt, None)
            .with_abort(Arc::clone(&abort));
        assert!(!ctx.out_of_time());
        abort.store(true, Ordering::Relaxed);
        assert!(ctx.out_of_time());
        assert!(ctx.stop);
    }

    #[test]
    fn advance_root_keeps_accumulator_consistent() {
        let tt = TranspositionTable::new(1);
        let mut ctx = SearchContext::new(Board::starting_position(), &tt, None);
        ctx.advance_root(Move::normal(Square::E2, Square::E4));
        assert_eq!(*ctx.accumulator(), Accumulator::refresh(&ctx.board));
    }
}
