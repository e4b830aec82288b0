//! The text-protocol front end. Owns all I/O and configuration parsing;
//! the core only ever sees positions, limits, and plain scalar knobs.

use std::io::{self, Write};

use crate::{
    constants::{MATE_BOUND, MATE_SCORE, MAX_PLY},
    position::Position,
    search::{SearchLimits, SearchReport, Searcher},
    selector::{self, SelectorParams},
    time::TimeManager,
    types::{Move, Side},
};

const ENGINE_NAME: &str = "Tempo";
const ENGINE_VERSION: &str = "0.1.0";

const DEFAULT_TIME_REMAINING_MS: u64 = 300_000;
const DEFAULT_INCREMENT_MS: u64 = 0;

struct Uci {
    searcher: Searcher,
    position: Position,
    /// Hashes of every position before the current one, for repetition.
    game_history: Vec<u64>,
    limits: SearchLimits,
    params: SelectorParams,
    wtime: u64,
    btime: u64,
    winc: u64,
    binc: u64,
    movetime: Option<u64>,
    fixed_depth: Option<u8>,
}

impl Uci {
    fn new() -> Self {
        Self {
            searcher: Searcher::new(),
            position: Position::startpos(),
            game_history: Vec::new(),
            limits: SearchLimits::default(),
            params: SelectorParams::default(),
            wtime: DEFAULT_TIME_REMAINING_MS,
            btime: DEFAULT_TIME_REMAINING_MS,
            winc: DEFAULT_INCREMENT_MS,
            binc: DEFAULT_INCREMENT_MS,
            movetime: None,
            fixed_depth: None,
        }
    }
}

pub fn uci_loop() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut state = Uci::new();

    loop {
        let mut input = String::new();
        if stdin.read_line(&mut input).is_err() || input.is_empty() {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let command = input.split_whitespace().next().unwrap_or_default();

        match command {
            "uci" => {
                println!("id name {ENGINE_NAME} {ENGINE_VERSION}");
                println!("id author the {ENGINE_NAME} developers");
                print_options();
                println!("uciok");
                stdout.flush().ok();
            }
            "isready" => {
                println!("readyok");
                stdout.flush().ok();
            }
            "ucinewgame" => {
                state.searcher.clear_tables();
                state.position = Position::startpos();
                state.game_history.clear();
            }
            "setoption" => {
                if let Err(e) = parse_setoption(&mut state, input) {
                    eprintln!("Error parsing setoption: {e}");
                }
            }
            "position" => {
                if let Err(e) = parse_position_command(&mut state, input) {
                    eprintln!("Error parsing position: {e}");
                }
            }
            "go" => {
                parse_go_command(&mut state, input);
                run_search(&mut state);
                stdout.flush().ok();
            }
            // Single-threaded: the search already honors its own budget.
            "stop" => {}
            "d" | "display" => {
                print!("{}", state.position);
            }
            "quit" => break,
            // Unknown command - silently ignore per UCI convention
            _ => {}
        }
    }
}

fn print_options() {
    println!("option name HumanSelect type check default true");
    println!("option name Temperature type spin default 100 min 0 max 200");
    println!("option name NoiseCp type spin default 0 min 0 max 50");
    println!("option name RiskAppetite type spin default 100 min 0 max 200");
    println!("option name SimplicityBias type spin default 100 min 0 max 200");
    println!("option name HardFloorCp type spin default 200 min 0 max 400");
    println!("option name OpeningSanity type spin default 120 min 0 max 200");
    println!("option name TopK type spin default 0 min 0 max 30");
    println!("option name CandidateMarginCp type spin default 200 min 0 max 400");
    println!("option name CandidateMovesMax type spin default 10 min 1 max 30");
    println!("option name RandomSeed type spin default 0 min 0 max 2147483647");
    println!("option name NullMove type check default true");
    println!("option name CheckExtension type check default true");
    println!("option name SeeFilter type check default true");
}

fn parse_setoption(state: &mut Uci, command: &str) -> Result<(), String> {
    let parts: Vec<&str> = command.split_whitespace().collect();

    let name_index = parts
        .iter()
        .position(|&p| p == "name")
        .ok_or("missing 'name'")?;
    let value_index = parts.iter().position(|&p| p == "value");

    let name = parts
        .get(name_index + 1)
        .ok_or("missing option name")?
        .to_lowercase();
    let value = value_index
        .and_then(|i| parts.get(i + 1))
        .copied()
        .unwrap_or_default();

    let as_i32 = || value.parse::<i32>().map_err(|e| e.to_string());
    let as_bool = || match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(format!("expected true/false, got {other}")),
    };

    match name.as_str() {
        "humanselect" => state.params.enabled = as_bool()?,
        "temperature" => state.params.temperature = as_i32()?,
        "noisecp" => state.params.noise_cp = as_i32()?,
        "riskappetite" => state.params.risk_appetite = as_i32()?,
        "simplicitybias" => state.params.simplicity_bias = as_i32()?,
        "hardfloorcp" => state.params.hard_floor_cp = as_i32()?,
        "openingsanity" => state.params.opening_sanity = as_i32()?,
        "topk" => state.params.top_k = as_i32()?.max(0) as usize,
        "candidatemargincp" => state.params.candidate_margin_cp = as_i32()?,
        "candidatemovesmax" => state.params.candidate_moves_max = as_i32()?.max(1) as usize,
        "randomseed" => state.params.seed = as_i32()?.max(0) as u64,
        "nullmove" => state.limits.null_move = as_bool()?,
        "checkextension" => state.limits.check_extension = as_bool()?,
        "seefilter" => state.limits.see_filter = as_bool()?,
        other => return Err(format!("unknown option: {other}")),
    }

    Ok(())
}

/// Parse UCI position command
/// Examples:
///   position startpos
///   position startpos moves e2e4 e7e5
///   position fen rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 moves e2e4
fn parse_position_command(state: &mut Uci, command: &str) -> Result<(), String> {
    let parts: Vec<&str> = command.split_whitespace().collect();

    if parts.len() < 2 {
        return Err("invalid position command".to_string());
    }

    let mut index = 1;

    if parts[index] == "startpos" {
        state.position = Position::startpos();
        index += 1;
    } else if parts[index] == "fen" {
        index += 1;

        let mut fen_parts = Vec::new();
        while index < parts.len() && parts[index] != "moves" {
            fen_parts.push(parts[index]);
            index += 1;
        }

        state.position =
            Position::from_fen(&fen_parts.join(" ")).map_err(|e| e.to_string())?;
    } else {
        return Err(format!("unknown position type: {}", parts[index]));
    }

    state.game_history.clear();

    if parts.get(index) == Some(&"moves") {
        index += 1;

        while index < parts.len() {
            let mv = state
                .position
                .parse_move(parts[index])
                .map_err(|e| e.to_string())?;

            state.game_history.push(state.position.hash);
            state.position = state.position.apply(mv);
            index += 1;
        }
    }

    Ok(())
}

/// Parse UCI go command
/// Examples:
///   go depth 8
///   go movetime 5000
///   go wtime 300000 btime 300000 winc 0 binc 0
fn parse_go_command(state: &mut Uci, command: &str) {
    let parts: Vec<&str> = command.split_whitespace().collect();

    state.movetime = None;
    state.fixed_depth = None;

    let mut i = 1;
    while i + 1 < parts.len() {
        let value = parts[i + 1].parse::<u64>().ok();

        match parts[i] {
            "wtime" => state.wtime = value.unwrap_or(state.wtime),
            "btime" => state.btime = value.unwrap_or(state.btime),
            "winc" => state.winc = value.unwrap_or(state.winc),
            "binc" => state.binc = value.unwrap_or(state.binc),
            "movetime" => state.movetime = value,
            "depth" => state.fixed_depth = value.map(|d| d.min(MAX_PLY as u64 - 1) as u8),
            _ => {
                i += 1;
                continue;
            }
        }

        i += 2;
    }
}

fn run_search(state: &mut Uci) {
    if let Some(depth) = state.fixed_depth {
        state.limits.max_depth = depth;
        state.limits.time_budget = None;
    } else {
        let (time_left, increment) = match state.position.side {
            Side::White => (state.wtime, state.winc),
            Side::Black => (state.btime, state.binc),
        };

        state.limits.max_depth = MAX_PLY as u8 - 1;
        state.limits.time_budget =
            Some(TimeManager::allocate(state.movetime, time_left, increment));
    }

    let report = state.searcher.search_with(
        &state.position,
        &state.limits,
        &state.game_history,
        print_info_line,
    );

    let chosen = selector::pick(
        &state.position,
        &report.candidates,
        report.best_move,
        &state.params,
    );

    match chosen {
        Some(mv) => println!("bestmove {mv}"),
        None => println!("bestmove 0000"),
    }
}

fn print_info_line(report: &SearchReport) {
    let score = if report.score > MATE_BOUND {
        format!("mate {}", (MATE_SCORE - report.score + 1) / 2)
    } else if report.score < -MATE_BOUND {
        format!("mate -{}", (MATE_SCORE + report.score + 1) / 2)
    } else {
        format!("cp {}", report.score)
    };

    let elapsed_ms = report.elapsed.as_millis().max(1) as u64;
    let nps = report.nodes * 1000 / elapsed_ms;

    println!(
        "info depth {} score {} nodes {} time {} nps {} pv {}",
        report.depth,
        score,
        report.nodes,
        elapsed_ms,
        nps,
        report
            .pv
            .iter()
            .map(Move::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    );
}
