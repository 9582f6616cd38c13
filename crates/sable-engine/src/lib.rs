//! Search, evaluation, and training-data generation for sable.

pub mod eval;
pub mod search;
pub mod training;

pub use eval::{evaluate, Accumulator};
pub use search::context::SearchContext;
pub use search::tt::{Bound, TranspositionTable};
pub use search::{
    format_uci_score, is_mate_score, search_to_time, IterationReport, RootMove, CHECKMATE, DRAW,
    INFINITE, MATE_BOUND, MAX_DEPTH,
};
pub use training::{TrainingConfig, TrainingSession};
