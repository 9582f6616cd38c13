//! UCI command parsing.

use std::time::Duration;

use sable_core::{generate_moves, Board, GenKind, Move, MoveList, STARTING_FEN};

use crate::error::UciError;

/// Parameters of a `go` command.
#[derive(Debug, Clone, Default)]
pub struct GoParams {
    pub wtime: Option<Duration>,
    pub btime: Option<Duration>,
    pub winc: Option<Duration>,
    pub binc: Option<Duration>,
    pub movestogo: Option<u32>,
    pub movetime: Option<Duration>,
    pub depth: Option<u8>,
    pub infinite: bool,
}

/// A parsed UCI command.
#[derive(Debug)]
pub enum Command {
    Uci,
    IsReady,
    UciNewGame,
    /// `position ...` with all listed moves already applied.
    Position(Board),
    Go(GoParams),
    Stop,
    Quit,
    SetOption {
        name: String,
        value: String,
    },
    /// `train start` -- custom extension starting self-play generation.
    TrainStart,
    /// `train stop` -- custom extension stopping it and merging the data.
    TrainStop,
    Unknown(String),
}

/// Parse one line of UCI input.
pub fn parse_command(line: &str) -> Result<Command, UciError> {
    let mut tokens = line.split_whitespace();
    let command = match tokens.next() {
        Some(token) => token,
        None => return Ok(Command::Unknown(String::new())),
    };

    match command {
        "uci" => Ok(Command::Uci),
        "isready" => Ok(Command::IsReady),
        "ucinewgame" => Ok(Command::UciNewGame),
        "position" => parse_position(tokens),
        "go" => parse_go(tokens),
        "stop" => Ok(Command::Stop),
        "quit" => Ok(Command::Quit),
        "setoption" => parse_setoption(tokens),
        "train" => match tokens.next() {
            Some("start") => Ok(Command::TrainStart),
            Some("stop") => Ok(Command::TrainStop),
            _ => Ok(Command::Unknown(line.to_string())),
        },
        _ => Ok(Command::Unknown(line.to_string())),
    }
}

fn parse_position<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Result<Command, UciError> {
    match tokens.next() {
        Some("startpos") => {
            let board: Board = STARTING_FEN.parse().expect("starting FEN is valid");
            match tokens.next() {
                Some("moves") => apply_moves(board, tokens),
                _ => Ok(Command::Position(board)),
            }
        }
        Some("fen") => {
            // take_while also consumes the "moves" keyword when present
            let fen_tokens: Vec<&str> = tokens
                .by_ref()
                .take_while(|&token| token != "moves")
                .collect();
            let board: Board = fen_tokens.join(" ").parse()?;
            apply_moves(board, tokens)
        }
        _ => Err(UciError::MalformedPosition),
    }
}

fn apply_moves<'a>(
    mut board: Board,
    moves: impl Iterator<Item = &'a str>,
) -> Result<Command, UciError> {
    for uci in moves {
        match find_move(&mut board, uci) {
            Some(mv) => {
                board.make_move(mv);
            }
            None => return Err(UciError::IllegalMove(uci.to_string())),
        }
    }
    Ok(Command::Position(board))
}

/// Match a long-algebraic move string against the legal moves of `board`.
fn find_move(board: &mut Board, uci: &str) -> Option<Move> {
    let mut list = MoveList::new();
    generate_moves(board, GenKind::Captures, &mut list);
    generate_moves(board, GenKind::Quiets, &mut list);
    for i in 0..list.len() {
        let mv = list[i];
        if mv.to_uci() == uci && board.is_legal(mv) {
            return Some(mv);
        }
    }
    None
}

fn parse_go<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Result<Command, UciError> {
    let mut params = GoParams::default();

    while let Some(token) = tokens.next() {
        match token {
            "infinite" => params.infinite = true,
            "wtime" => params.wtime = Some(parse_millis(token, tokens.next())?),
            "btime" => params.btime = Some(parse_millis(token, tokens.next())?),
            "winc" => params.winc = Some(parse_millis(token, tokens.next())?),
            "binc" => params.binc = Some(parse_millis(token, tokens.next())?),
            "movetime" => params.movetime = Some(parse_millis(token, tokens.next())?),
            "movestogo" => params.movestogo = Some(parse_number(token, tokens.next())?),
            "depth" => params.depth = Some(parse_number(token, tokens.next())?),
            // ponder, nodes, mate, searchmoves are not supported; skip them
            _ => {}
        }
    }
    Ok(Command::Go(params))
}

fn parse_millis(param: &str, value: Option<&str>) -> Result<Duration, UciError> {
    Ok(Duration::from_millis(parse_number(param, value)?))
}

fn parse_number<T: std::str::FromStr>(param: &str, value: Option<&str>) -> Result<T, UciError> {
    let value = value.unwrap_or("");
    value.parse().map_err(|_| UciError::InvalidValue {
        param: param.to_string(),
        value: value.to_string(),
    })
}

fn parse_setoption<'a>(mut tokens: impl Iterator<Item = &'a str>) -> Result<Command, UciError> {
    // setoption name <name...> value <value...>
    let mut name_tokens = Vec::new();
    let mut value_tokens = Vec::new();
    let mut in_value = false;
    for token in tokens.by_ref() {
        match token {
            "name" => {}
            "value" => in_value = true,
            _ if in_value => value_tokens.push(token),
            _ => name_tokens.push(token),
        }
    }
    Ok(Command::SetOption {
        name: name_tokens.join(" "),
        value: value_tokens.join(" "),
    })
}
