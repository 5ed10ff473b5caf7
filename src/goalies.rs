use std::collections::HashMap;

use crate::game::{GameRecord, Position, RosterEntry, StarterHints};
use crate::names;

/// How a starter credit was arrived at. Only `Authoritative` comes from an
/// explicit gamesheet hint; the other two are fallbacks that downstream
/// consumers may want to flag as low-confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarterConfidence {
    /// Matched a starting-goalie hint by normalized name.
    Authoritative,
    /// Picked from the roster by jersey-number order.
    RosterOrder,
    /// No hints and no identifiable goalies: every roster goalie is
    /// credited rather than silently losing their participation.
    Inclusive,
}

impl StarterConfidence {
    pub fn is_authoritative(&self) -> bool {
        matches!(self, StarterConfidence::Authoritative)
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedStarters {
    pub starters: Vec<u64>,
    pub confidence: StarterConfidence,
}

/// Starter resolutions for every (game, team) side, computed up front so
/// that queries during aggregation are pure lookups. Building this requires
/// the full roster-position index, hence the strict build-then-query split.
#[derive(Debug, Default)]
pub struct StarterResolver {
    resolved: HashMap<(u64, u64), ResolvedStarters>,
}

impl StarterResolver {
    pub fn build(games: &[GameRecord], positions: &HashMap<u64, Position>) -> Self {
        let mut resolved = HashMap::new();
        for game in games {
            if !game.is_aggregatable() {
                continue;
            }
            let Some(boxscore) = game.boxscore.as_ref() else {
                continue;
            };
            let home_id = boxscore.teams[0].id;
            let away_id = boxscore.teams[1].id;
            let sides = [
                (home_id, &game.home_roster),
                (away_id, &game.away_roster),
            ];
            for (team_id, roster) in sides {
                let goalies: Vec<&RosterEntry> = roster
                    .iter()
                    .filter(|entry| effective_position(entry, positions) == Position::Goalie)
                    .collect();
                resolved.insert(
                    (game.id, team_id),
                    resolve_side(game.starting_goalies.as_ref(), &goalies),
                );
            }
        }
        Self { resolved }
    }

    pub fn resolution(&self, game_id: u64, team_id: u64) -> Option<&ResolvedStarters> {
        self.resolved.get(&(game_id, team_id))
    }

    /// Confidence of the starter credit, or `None` when the goalie is not
    /// credited with this game.
    pub fn starter_confidence(
        &self,
        game_id: u64,
        team_id: u64,
        participant_id: u64,
    ) -> Option<StarterConfidence> {
        let resolution = self.resolution(game_id, team_id)?;
        resolution
            .starters
            .contains(&participant_id)
            .then_some(resolution.confidence)
    }
}

/// Roster position codes drift between games for the same player; the
/// season-wide index wins, with the in-game roster entry as fallback.
fn effective_position(entry: &RosterEntry, positions: &HashMap<u64, Position>) -> Position {
    entry
        .participant_id
        .and_then(|id| positions.get(&id).copied())
        .unwrap_or_else(|| entry.position())
}

fn resolve_side(hints: Option<&StarterHints>, goalies: &[&RosterEntry]) -> ResolvedStarters {
    if let Some(hints) = hints.filter(|h| !h.is_empty()) {
        // Hints are authoritative: whoever matches starts, nobody else does.
        let starters = goalies
            .iter()
            .filter(|g| {
                hints
                    .names
                    .iter()
                    .any(|hint| names::names_match(hint, &g.name))
            })
            .filter_map(|g| g.participant_id)
            .collect();
        return ResolvedStarters {
            starters,
            confidence: StarterConfidence::Authoritative,
        };
    }

    let mut known: Vec<&RosterEntry> = goalies
        .iter()
        .copied()
        .filter(|g| g.participant_id.is_some())
        .collect();

    if known.is_empty() {
        // Nothing to order by; credit the whole position group.
        return ResolvedStarters {
            starters: goalies.iter().filter_map(|g| g.participant_id).collect(),
            confidence: StarterConfidence::Inclusive,
        };
    }

    if known.len() == 1 {
        return ResolvedStarters {
            starters: vec![known[0].participant_id.unwrap_or_default()],
            confidence: StarterConfidence::RosterOrder,
        };
    }

    // Lowest valid jersey number starts; missing numbers sort last.
    known.sort_by(|a, b| {
        let na = a.number.unwrap_or(u32::MAX);
        let nb = b.number.unwrap_or(u32::MAX);
        na.cmp(&nb).then_with(|| a.name.cmp(&b.name))
    });

    let starters = if known[0].number.is_some() {
        vec![known[0].participant_id.unwrap_or_default()]
    } else {
        // No jersey numbers anywhere: provisionally credit the first two.
        known
            .iter()
            .take(2)
            .filter_map(|g| g.participant_id)
            .collect()
    };
    ResolvedStarters {
        starters,
        confidence: StarterConfidence::RosterOrder,
    }
}
