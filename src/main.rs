use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;

use lheq_stats::divisions::{self, DivisionMap};
use lheq_stats::{export, formations, ingest, ledger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Stats,
    Divisions,
    Formations,
    All,
}

impl Step {
    fn parse(raw: &str) -> Result<Self> {
        match raw {
            "stats" => Ok(Step::Stats),
            "divisions" => Ok(Step::Divisions),
            "formations" => Ok(Step::Formations),
            "all" => Ok(Step::All),
            other => Err(anyhow!(
                "unknown step '{other}' (expected stats|divisions|formations|all)"
            )),
        }
    }

    fn includes(&self, step: Step) -> bool {
        *self == Step::All || *self == step
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let games_dir = flag_or_env("--games", "GAMES_DIR").unwrap_or_else(|| PathBuf::from("games"));
    let out_dir = flag_or_env("--out", "WEB_DIR").unwrap_or_else(|| PathBuf::from("web"));
    let hints_path = flag_or_env("--starting-goalies", "STARTING_GOALIES_FILE")
        .unwrap_or_else(|| PathBuf::from("starting_goalies.json"));
    let step = Step::parse(
        &flag_value("--step")
            .or_else(|| std::env::var("STEP").ok())
            .unwrap_or_else(|| "all".to_string()),
    )?;

    println!("LHEQ statistics compiler ({})", Utc::now().format("%Y-%m-%d %H:%MZ"));
    println!("games: {}", games_dir.display());
    println!("out:   {}", out_dir.display());

    let mut games = ingest::load_games(&games_dir)?;
    let sidecar = ingest::load_starting_goalies(&hints_path);
    if !sidecar.is_empty() {
        println!("starter hints loaded for {} games", sidecar.len());
    }
    ingest::apply_starting_goalies(&mut games, &sidecar);

    let final_games = games.iter().filter(|g| g.is_aggregatable()).count();
    println!("loaded {} games ({} final with boxscore)", games.len(), final_games);

    let mut stats = ledger::compile_season(&games);

    if step.includes(Step::Divisions) {
        let divisions_path = out_dir.join("data").join("divisions.json");
        match fs::read_to_string(&divisions_path) {
            Ok(raw) => {
                let map = DivisionMap::from_json(&raw)
                    .with_context(|| format!("parse {}", divisions_path.display()))?;
                divisions::assign_divisions(&mut stats.teams, &map);
                println!("divisions assigned from {}", divisions_path.display());
            }
            Err(err) => {
                println!(
                    "no division mapping at {} ({err}); teams left unassigned",
                    divisions_path.display()
                );
            }
        }
    }

    if step.includes(Step::Stats) || step.includes(Step::Divisions) {
        export::write_season(&out_dir, &stats)?;
        println!(
            "wrote {} teams, {} players, {} games",
            stats.teams.len(),
            stats.players.len(),
            stats.games.len()
        );
        if let Some(top_team) = stats.teams.first() {
            println!("top team: {} ({} pts)", top_team.name, top_team.points);
        }
        if let Some(top_scorer) = stats.players.first() {
            println!("top scorer: {} ({} pts)", top_scorer.name, top_scorer.points);
        }
    }

    if step.includes(Step::Formations) {
        let report = formations::infer_formations(&games);
        export::write_formations(&out_dir, &report)?;
        println!("formations written for {} teams", report.len());
    }

    Ok(())
}

fn flag_or_env(flag: &str, env_key: &str) -> Option<PathBuf> {
    flag_value(flag)
        .or_else(|| std::env::var(env_key).ok())
        .map(PathBuf::from)
}

fn flag_value(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            if let Some(next) = args.get(idx + 1) {
                return Some(next.clone());
            }
        }
    }
    None
}
