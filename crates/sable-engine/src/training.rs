//! Self-play training-data generation.
//!
//! A session owns N worker threads. Each worker plays randomized openings,
//! self-plays the game out with a fixed per-move budget, and appends one
//! line per recorded position to its own file:
//!
//! ```text
//! <fen> | <score from White's perspective> | <outcome 1.0|0.5|0.0>
//! ```
//!
//! Stopping the session joins the workers and concatenates their files
//! into `training_data.txt`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand_core::{RngCore, SeedableRng};
use rand_xoshiro::SplitMix64;
use tracing::{info, warn};

use sable_core::{generate_moves, Board, Color, GenKind, MoveList};

use crate::search::context::SearchContext;
use crate::search::tt::TranspositionTable;
use crate::search::{is_mate_score, search_to_time, DRAW};

/// Per-move thinking time during self-play: an eighth of a second.
const MOVE_BUDGET: Duration = Duration::from_nanos(1_000_000_000 / 8);

/// Opening randomization plays between 5 and 10 plies.
const MIN_RANDOM_PLIES: u64 = 5;
const MAX_RANDOM_PLIES: u64 = 10;

/// Settings for a training run.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Number of worker threads, one concurrent game each.
    pub threads: usize,
    /// Per-worker transposition table size in megabytes.
    pub hash_mb: usize,
    /// Directory receiving the data files.
    pub dir: PathBuf,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            threads: 1,
            hash_mb: 16,
            dir: PathBuf::from("."),
        }
    }
}

/// A running set of self-play workers.
///
/// Workers check the stop flag between games, so stopping can lag by one
/// game. Each worker owns its board, context, table, RNG, and output file;
/// the flag is the only shared state.
pub struct TrainingSession {
    stop: Arc<AtomicBool>,
    workers: Vec<JoinHandle<io::Result<()>>>,
    dir: PathBuf,
}

impl TrainingSession {
    /// Spawn the configured number of workers.
    pub fn start(config: TrainingConfig) -> TrainingSession {
        info!(threads = config.threads, "training started");
        let stop = Arc::new(AtomicBool::new(false));

        let time_seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        let mut master = SplitMix64::seed_from_u64(time_seed);

        let workers = (0..config.threads)
            .map(|index| {
                let seed = master.next_u64();
                let hash_mb = config.hash_mb;
                let path = worker_file(&config.dir, index);
                let stop = Arc::clone(&stop);
                std::thread::spawn(move || worker_loop(seed, hash_mb, &path, &stop))
            })
            .collect();

        TrainingSession {
            stop,
            workers,
            dir: config.dir,
        }
    }

    /// Signal the workers, wait for them, and merge their output into
    /// `training_data.txt`. Files of failed workers are skipped.
    pub fn stop(self) -> io::Result<PathBuf> {
        self.stop.store(true, Ordering::Relaxed);

        let mut finished = Vec::new();
        for (index, worker) in self.workers.into_iter().enumerate() {
            match worker.join() {
                Ok(Ok(())) => finished.push(index),
                Ok(Err(error)) => {
                    warn!(worker = index, %error, "training worker failed, skipping its file");
                }
                Err(_) => warn!(worker = index, "training worker panicked"),
            }
            info!(worker = index, "training worker stopped");
        }

        merge_worker_files(&self.dir, &finished)
    }
}

fn worker_file(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("training_data{index:02}.txt"))
}

/// Concatenate the named workers' files into `training_data.txt`, removing
/// each input afterwards.
fn merge_worker_files(dir: &Path, workers: &[usize]) -> io::Result<PathBuf> {
    let merged_path = dir.join("training_data.txt");
    let mut merged = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&merged_path)?;

    for &index in workers {
        let path = worker_file(dir, index);
        match File::open(&path) {
            Ok(mut input) => {
                io::copy(&mut input, &mut merged)?;
                fs::remove_file(&path)?;
            }
            Err(error) => warn!(worker = index, %error, "worker file missing at merge"),
        }
    }
    Ok(merged_path)
}

fn worker_loop(seed: u64, hash_mb: usize, path: &Path, stop: &AtomicBool) -> io::Result<()> {
    let tt = TranspositionTable::new(hash_mb);
    let mut rng = SplitMix64::seed_from_u64(seed);
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut out = BufWriter::new(file);

    while !stop.load(Ordering::Relaxed) {
        play_game(&mut rng, &tt, &mut out)?;
        out.flush()?;
        tt.clear();
    }
    Ok(())
}

/// Play 5-10 uniformly random legal plies from the current position.
///
/// A random pick that turns out illegal is swapped out and the draw
/// repeated among the remainder; a position with no legal moves ends the
/// opening early.
fn play_opening(board: &mut Board, rng: &mut SplitMix64) {
    let plies = rng.next_u64() % (MAX_RANDOM_PLIES - MIN_RANDOM_PLIES + 1) + MIN_RANDOM_PLIES;
    for _ in 0..plies {
        let mut list = MoveList::new();
        generate_moves(board, GenKind::Captures, &mut list);
        generate_moves(board, GenKind::Quiets, &mut list);
        loop {
            if list.is_empty() {
                return;
            }
            let pick = (rng.next_u64() % list.len() as u64) as usize;
            let mv = list[pick];
            if board.is_legal(mv) {
                board.make_move(mv);
                break;
            }
            list.swap_remove(pick);
        }
    }
}

/// One recorded position, score already from White's perspective.
struct GameRecord {
    fen: String,
    score: i32,
}

/// Write a finished game, most recent position first.
fn write_records(records: &[GameRecord], outcome: f64, out: &mut impl Write) -> io::Result<()> {
    for record in records.iter().rev() {
        writeln!(out, "{} | {} | {:.1}", record.fen, record.score, outcome)?;
    }
    Ok(())
}

/// Self-play one randomized game, appending its labelled positions.
fn play_game(rng: &mut SplitMix64, tt: &TranspositionTable, out: &mut impl Write) -> io::Result<()> {
    let mut board = Board::starting_position();
    play_opening(&mut board, rng);

    let mut ctx = SearchContext::new(board, tt, Some(MOVE_BUDGET));
    let mut records: Vec<GameRecord> = Vec::new();

    let outcome = loop {
        let best = search_to_time(&mut ctx, |_| {});
        let side = ctx.board.side_to_move();

        // Positions in check, decided by mate, or with bare-bones material
        // make poor evaluation targets.
        if !ctx.board.in_check() && !is_mate_score(best.score) && !ctx.board.insufficient_material()
        {
            let score = match side {
                Color::White => best.score,
                Color::Black => -best.score,
            };
            records.push(GameRecord {
                fen: ctx.board.to_string(),
                score,
            });
        }

        if is_mate_score(best.score) {
            let white_wins = (best.score > 0) == (side == Color::White);
            break if white_wins { 1.0 } else { 0.0 };
        }
        // A draw score with no best move is stalemate at the root
        if (best.score == DRAW && best.mv.is_none()) || ctx.board.is_draw() {
            break 0.5;
        }

        ctx.advance_root(best.mv);
    };

    write_records(&records, outcome, out)
}
