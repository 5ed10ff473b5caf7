use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde_json::Value;

use crate::game::{self, GameRecord, StarterHints};

/// Load every `*.json` game file from a scrape directory. Files that fail
/// to read or parse are dropped individually; one broken download must not
/// sink the whole season.
pub fn load_games(dir: &Path) -> Result<Vec<GameRecord>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("read games directory {}", dir.display()))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut games: Vec<GameRecord> = paths
        .par_iter()
        .filter_map(|path| {
            let raw = fs::read_to_string(path).ok()?;
            game::parse_game_json(&raw)
        })
        .collect();
    games.sort_by_key(|g| g.id);
    Ok(games)
}

/// Starter hints from the gamesheet-parser sidecar file
/// (`{"<game id>": {"goalies": [{"name": …, "number": …}]}}`). Missing or
/// malformed files yield an empty map; the resolver falls back to roster
/// order on its own.
pub fn load_starting_goalies(path: &Path) -> HashMap<u64, StarterHints> {
    let Ok(raw) = fs::read_to_string(path) else {
        return HashMap::new();
    };
    let Ok(value) = serde_json::from_str::<Value>(&raw) else {
        return HashMap::new();
    };
    let Some(map) = value.as_object() else {
        return HashMap::new();
    };
    map.iter()
        .filter_map(|(key, entry)| {
            let game_id = key.trim().parse::<u64>().ok()?;
            let hints = game::parse_starter_hints(entry)?;
            Some((game_id, hints))
        })
        .collect()
}

/// Annotate games with sidecar hints. Hints already embedded in a game file
/// win over the sidecar.
pub fn apply_starting_goalies(games: &mut [GameRecord], hints: &HashMap<u64, StarterHints>) {
    for game in games {
        if game.starting_goalies.is_none() {
            if let Some(found) = hints.get(&game.id) {
                game.starting_goalies = Some(found.clone());
            }
        }
    }
}
