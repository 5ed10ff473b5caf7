use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::formations::TeamFormations;
use crate::ledger::SeasonStats;

/// Write the three season tables under `<out>/data/`, the layout the
/// website reads from.
pub fn write_season(out_dir: &Path, stats: &SeasonStats) -> Result<()> {
    let data_dir = out_dir.join("data");
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("create output directory {}", data_dir.display()))?;
    write_json(&data_dir.join("teams.json"), &stats.teams)?;
    write_json(&data_dir.join("players.json"), &stats.players)?;
    write_json(&data_dir.join("games.json"), &stats.games)?;
    Ok(())
}

pub fn write_formations(out_dir: &Path, report: &BTreeMap<u64, TeamFormations>) -> Result<()> {
    let data_dir = out_dir.join("data");
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("create output directory {}", data_dir.display()))?;
    write_json(&data_dir.join("formations.json"), report)
}

// Write-then-rename so a crash mid-write never leaves a truncated table
// where the website expects valid JSON.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize output table")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}
