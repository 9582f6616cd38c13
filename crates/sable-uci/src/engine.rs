//! Event-driven UCI engine loop.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use tracing::{debug, info, warn};

use sable_core::{Board, Color, Move};
use sable_engine::{
    format_uci_score, search_to_time, SearchContext, TrainingConfig, TrainingSession,
    TranspositionTable,
};

use crate::command::{parse_command, Command, GoParams};
use crate::error::UciError;

/// Events processed by the main engine loop.
enum EngineEvent {
    UciCommand(Result<Command, UciError>),
    SearchDone,
    InputClosed,
}

/// The UCI engine: current position, shared transposition table, and the
/// in-flight search or training session.
///
/// Searches run on a worker thread; `stop` flips a shared flag the search
/// polls. The transposition table is lock-free, so resizing is the only
/// operation gated on being idle.
pub struct UciEngine {
    board: Board,
    tt: Arc<TranspositionTable>,
    stop_flag: Arc<AtomicBool>,
    searching: bool,
    hash_mb: usize,
    threads: usize,
    training: Option<TrainingSession>,
}

impl UciEngine {
    /// Engine at the starting position with a 16 MB table.
    pub fn new() -> UciEngine {
        let hash_mb = 16;
        UciEngine {
            board: Board::starting_position(),
            tt: Arc::new(TranspositionTable::new(hash_mb)),
            stop_flag: Arc::new(AtomicBool::new(false)),
            searching: false,
            hash_mb,
            threads: 1,
            training: None,
        }
    }

    /// Run the event loop until `quit` or stdin closes.
    pub fn run(mut self) -> Result<(), UciError> {
        let (tx, rx) = mpsc::channel::<EngineEvent>();

        let stdin_tx = tx.clone();
        std::thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        debug!(cmd = %trimmed, "received command");
                        if stdin_tx
                            .send(EngineEvent::UciCommand(parse_command(trimmed)))
                            .is_err()
                        {
                            return;
                        }
                    }
                    Err(_) => break,
                }
            }
            let _ = stdin_tx.send(EngineEvent::InputClosed);
        });

        for event in &rx {
            match event {
                EngineEvent::UciCommand(Ok(command)) => match command {
                    Command::Uci => self.handle_uci(),
                    Command::IsReady => println!("readyok"),
                    Command::UciNewGame => self.handle_ucinewgame(),
                    Command::Position(board) => self.board = board,
                    Command::Go(params) => self.handle_go(params, &tx),
                    Command::Stop => self.stop_flag.store(true, Ordering::Relaxed),
                    Command::SetOption { name, value } => self.handle_setoption(&name, &value),
                    Command::TrainStart => self.handle_train_start(),
                    Command::TrainStop => self.handle_train_stop(),
                    Command::Quit => break,
                    Command::Unknown(line) => debug!(%line, "ignoring unknown command"),
                },
                EngineEvent::UciCommand(Err(error)) => {
                    warn!(%error, "rejected command");
                }
                EngineEvent::SearchDone => self.searching = false,
                EngineEvent::InputClosed => break,
            }
        }

        // Wind down whatever is still running
        self.stop_flag.store(true, Ordering::Relaxed);
        self.handle_train_stop();
        info!("sable shutting down");
        Ok(())
    }

    fn handle_uci(&self) {
        println!("id name sable");
        println!("id author sable contributors");
        println!("option name Hash type spin default 16 min 1 max 4096");
        println!("option name Threads type spin default 1 min 1 max 32");
        println!("uciok");
    }

    fn handle_ucinewgame(&mut self) {
        self.board = Board::starting_position();
        self.tt.clear();
    }

    fn handle_setoption(&mut self, name: &str, value: &str) {
        match name {
            "Hash" => match value.parse::<usize>() {
                Ok(mb) if mb > 0 && !self.searching => {
                    self.hash_mb = mb;
                    self.tt = Arc::new(TranspositionTable::new(mb));
                }
                Ok(_) => warn!("cannot resize hash while searching"),
                Err(_) => warn!(value, "bad Hash value"),
            },
            "Threads" => match value.parse::<usize>() {
                Ok(threads) if threads > 0 => self.threads = threads,
                _ => warn!(value, "bad Threads value"),
            },
            _ => debug!(name, "ignoring unknown option"),
        }
    }

    fn handle_go(&mut self, params: GoParams, tx: &mpsc::Sender<EngineEvent>) {
        if self.searching {
            warn!("go received while searching, ignoring");
            return;
        }
        self.searching = true;
        self.stop_flag = Arc::new(AtomicBool::new(false));
        self.tt.bump_age();

        let budget = budget_from_go(&params, self.board.side_to_move());
        let board = self.board.clone();
        let tt = Arc::clone(&self.tt);
        let abort = Arc::clone(&self.stop_flag);
        let tx = tx.clone();

        std::thread::spawn(move || {
            let mut ctx = SearchContext::new(board, &tt, budget).with_abort(abort);
            if let Some(depth) = params.depth {
                ctx.max_depth = depth;
            }

            let mut last_pv: Vec<Move> = Vec::new();
            let best = search_to_time(&mut ctx, |report| {
                let ms = report.elapsed.as_millis().max(1);
                let nps = report.nodes as u128 * 1000 / ms;
                let pv = report
                    .pv
                    .iter()
                    .map(|mv| mv.to_uci())
                    .collect::<Vec<_>>()
                    .join(" ");
                println!(
                    "info depth {} score {} nodes {} nps {} time {} pv {}",
                    report.depth,
                    format_uci_score(report.score),
                    report.nodes,
                    nps,
                    ms,
                    pv
                );
                last_pv = report.pv.to_vec();
            });

            match last_pv.get(1) {
                Some(ponder) if best.mv.is_some() => {
                    println!("bestmove {} ponder {}", best.mv.to_uci(), ponder.to_uci());
                }
                _ => println!("bestmove {}", best.mv.to_uci()),
            }
            let _ = tx.send(EngineEvent::SearchDone);
        });
    }

    fn handle_train_start(&mut self) {
        // A fresh start supersedes any running session
        if let Some(session) = self.training.take() {
            if let Err(error) = session.stop() {
                warn!(%error, "stopping previous training session failed");
            }
        }
        println!(
            "info string training started with {} threads",
            self.threads
        );
        self.training = Some(TrainingSession::start(TrainingConfig {
            threads: self.threads,
            hash_mb: self.hash_mb,
            dir: ".".into(),
        }));
    }

    fn handle_train_stop(&mut self) {
        if let Some(session) = self.training.take() {
            match session.stop() {
                Ok(path) => {
                    println!("info string training data written to {}", path.display());
                }
                Err(error) => warn!(%error, "merging training data failed"),
            }
        }
    }
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Single hard time budget for a search, from the `go` parameters.
///
/// `movetime` is used as-is; with a running clock the budget is a twentieth
/// of the remaining time (or the `movestogo` share) plus half the
/// increment, capped at 80% of the clock. `infinite`, or no time info at
/// all, yields no budget.
fn budget_from_go(params: &GoParams, side: Color) -> Option<Duration> {
    if params.infinite {
        return None;
    }
    if let Some(movetime) = params.movetime {
        return Some(movetime);
    }

    let (remaining, increment) = match side {
        Color::White => (params.wtime, params.winc),
        Color::Black => (params.btime, params.binc),
    };
    let remaining = remaining?;
    let increment = increment.unwrap_or(Duration::ZERO);
    let share = params.movestogo.unwrap_or(20).max(1);

    let budget = remaining / share + increment / 2;
    Some(
        budget
            .min(remaining.mul_f64(0.8))
            .max(Duration::from_millis(1)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movetime_is_used_directly() {
        let params = GoParams {
            movetime: Some(Duration::from_millis(1500)),
            ..GoParams::default()
        };
        assert_eq!(
            budget_from_go(&params, Color::White),
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn infinite_has_no_budget() {
        let params = GoParams {
            infinite: true,
            wtime: Some(Duration::from_secs(60)),
            ..GoParams::default()
        };
        assert_eq!(budget_from_go(&params, Color::White), None);
    }

    #[test]
    fn clock_share_uses_side_to_move() {
        let params = GoParams {
            wtime: Some(Duration::from_secs(200)),
            btime: Some(Duration::from_secs(100)),
            ..GoParams::default()
        };
        let white = budget_from_go(&params, Color::White).unwrap();
        let black = budget_from_go(&params, Color::Black).unwrap();
        assert_eq!(white, Duration::from_secs(10));
        assert_eq!(black, Duration::from_secs(5));
    }

    #[test]
    fn increment_adds_half() {
        let params = GoParams {
            wtime: Some(Duration::from_secs(200)),
            winc: Some(Duration::from_secs(4)),
            ..GoParams::default()
        };
        assert_eq!(
            budget_from_go(&params, Color::White),
            Some(Duration::from_secs(12))
        );
    }

    #[test]
    fn budget_never_exceeds_most_of_the_clock() {
        let params = GoParams {
            wtime: Some(Duration::from_millis(100)),
            winc: Some(Duration::from_secs(10)),
            ..GoParams::default()
        };
        let budget = budget_from_go(&params, Color::White).unwrap();
        assert!(budget <= Duration::from_millis(80));
    }

    #[test]
    fn depth_only_go_has_no_budget() {
        let params = GoParams {
            depth: Some(6),
            ..GoParams::default()
        };
        assert_eq!(budget_from_go(&params, Color::White), None);
    }
}
