use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::game::{GameRecord, Position};
use crate::goalies::StarterResolver;
use crate::powerplay;

#[derive(Debug, Clone, Serialize)]
pub struct TeamTotals {
    pub id: u64,
    pub name: String,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_differential: i64,
    pub penalty_minutes: u32,
    pub powerplay_goals_for: u32,
    pub powerplay_goals_against: u32,
    pub powerplay_opportunities: u32,
    pub shorthanded_goals_for: u32,
    pub shorthanded_goals_against: u32,
    pub home_wins: u32,
    pub home_losses: u32,
    pub home_ties: u32,
    pub away_wins: u32,
    pub away_losses: u32,
    pub away_ties: u32,
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
}

impl TeamTotals {
    fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            games_played: 0,
            wins: 0,
            losses: 0,
            ties: 0,
            points: 0,
            goals_for: 0,
            goals_against: 0,
            goal_differential: 0,
            penalty_minutes: 0,
            powerplay_goals_for: 0,
            powerplay_goals_against: 0,
            powerplay_opportunities: 0,
            shorthanded_goals_for: 0,
            shorthanded_goals_against: 0,
            home_wins: 0,
            home_losses: 0,
            home_ties: 0,
            away_wins: 0,
            away_losses: 0,
            away_ties: 0,
            logo_url: None,
            division: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerTotals {
    pub id: u64,
    pub name: String,
    pub team_id: u64,
    pub position: Position,
    pub games_played: u32,
    pub goals: u32,
    pub assists: u32,
    pub points: u32,
    pub penalty_minutes: u32,
    pub powerplay_goals: u32,
    pub powerplay_assists: u32,
    pub shorthanded_goals: u32,
    pub shorthanded_assists: u32,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub goals_against: u32,
    /// Credited starts that did not come from an explicit gamesheet hint.
    /// Nonzero values mean the goalie record is partly heuristic.
    pub low_confidence_starts: u32,
}

impl PlayerTotals {
    fn new(id: u64, name: &str, team_id: u64, position: Position) -> Self {
        Self {
            id,
            name: name.to_string(),
            team_id,
            position,
            games_played: 0,
            goals: 0,
            assists: 0,
            points: 0,
            penalty_minutes: 0,
            powerplay_goals: 0,
            powerplay_assists: 0,
            shorthanded_goals: 0,
            shorthanded_assists: 0,
            wins: 0,
            losses: 0,
            ties: 0,
            goals_against: 0,
            low_confidence_starts: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    pub id: u64,
    pub date: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SeasonStats {
    pub teams: Vec<TeamTotals>,
    pub players: Vec<PlayerTotals>,
    pub games: Vec<GameSummary>,
}

#[derive(Debug)]
struct PlayerAccum {
    totals: PlayerTotals,
    appearances: HashSet<u64>,
    starts: u32,
}

/// Season-wide participant positions from every roster of every final game,
/// last write wins over ascending game id. Players occasionally carry a
/// different code on one roster; the most recent one is kept.
pub fn position_index(games: &[GameRecord]) -> HashMap<u64, Position> {
    let mut positions = HashMap::new();
    for game in sorted_final_games(games) {
        for entry in game.home_roster.iter().chain(game.away_roster.iter()) {
            let Some(id) = entry.participant_id else {
                continue;
            };
            positions.insert(id, entry.position());
        }
    }
    positions
}

/// Fold the whole batch of game records into team and player totals plus a
/// flat game summary list. Games are processed in ascending id order so the
/// result does not depend on how the input was collected.
pub fn compile_season(games: &[GameRecord]) -> SeasonStats {
    let ordered = sorted_final_games(games);
    let positions = position_index(games);
    let resolver = StarterResolver::build(games, &positions);

    let mut teams: HashMap<u64, TeamTotals> = HashMap::new();
    let mut players: HashMap<u64, PlayerAccum> = HashMap::new();
    let mut summaries: Vec<GameSummary> = Vec::new();

    for game in &ordered {
        aggregate_game(game, &positions, &resolver, &mut teams, &mut players);
        summaries.push(GameSummary {
            id: game.id,
            date: game.date.clone(),
            home_team: game.home_team.clone(),
            away_team: game.away_team.clone(),
            home_score: game.home_score,
            away_score: game.away_score,
            status: game.status.as_str().to_string(),
        });
    }

    finalize(teams, players, summaries)
}

fn sorted_final_games(games: &[GameRecord]) -> Vec<&GameRecord> {
    let mut ordered: Vec<&GameRecord> = games.iter().filter(|g| g.is_aggregatable()).collect();
    ordered.sort_by_key(|g| g.id);
    ordered
}

fn aggregate_game(
    game: &GameRecord,
    positions: &HashMap<u64, Position>,
    resolver: &StarterResolver,
    teams: &mut HashMap<u64, TeamTotals>,
    players: &mut HashMap<u64, PlayerAccum>,
) {
    let Some(boxscore) = game.boxscore.as_ref() else {
        return;
    };
    let home = &boxscore.teams[0];
    let away = &boxscore.teams[1];
    let (home_score, away_score) = (game.home_score, game.away_score);
    let opportunities = powerplay::powerplay_opportunities(&boxscore.penalties, home.id, away.id);

    let sides = [
        (home, home_score, away_score, opportunities.home, true),
        (away, away_score, home_score, opportunities.away, false),
    ];
    for (side, scored, conceded, chances, is_home) in sides {
        let row = teams
            .entry(side.id)
            .or_insert_with(|| TeamTotals::new(side.id, &side.name));
        row.games_played += 1;
        row.logo_url = side.logo_url.clone();
        row.goals_for += scored;
        row.goals_against += conceded;
        row.powerplay_opportunities += chances;
        if scored > conceded {
            row.wins += 1;
            row.points += 2;
            if is_home {
                row.home_wins += 1;
            } else {
                row.away_wins += 1;
            }
        } else if scored < conceded {
            row.losses += 1;
            if is_home {
                row.home_losses += 1;
            } else {
                row.away_losses += 1;
            }
        } else {
            row.ties += 1;
            row.points += 1;
            if is_home {
                row.home_ties += 1;
            } else {
                row.away_ties += 1;
            }
        }
    }

    for goal in &boxscore.goals {
        let Some(scorer) = goal.scorer.as_ref() else {
            continue;
        };
        let Some(team_id) = goal.team_id else {
            continue;
        };
        if team_id != home.id && team_id != away.id {
            continue;
        }
        let opponent_id = if team_id == home.id { away.id } else { home.id };

        let accum = ensure_player(players, scorer.id, &scorer.name, team_id, positions);
        accum.totals.goals += 1;
        accum.totals.points += 1;
        accum.appearances.insert(game.id);
        if goal.powerplay {
            accum.totals.powerplay_goals += 1;
        }
        if goal.shorthanded {
            accum.totals.shorthanded_goals += 1;
        }

        if goal.powerplay {
            side_mut(teams, team_id).powerplay_goals_for += 1;
            side_mut(teams, opponent_id).powerplay_goals_against += 1;
        }
        if goal.shorthanded {
            side_mut(teams, team_id).shorthanded_goals_for += 1;
            side_mut(teams, opponent_id).shorthanded_goals_against += 1;
        }

        for assist in &goal.assists {
            let accum = ensure_player(players, assist.id, &assist.name, team_id, positions);
            accum.totals.assists += 1;
            accum.totals.points += 1;
            accum.appearances.insert(game.id);
            if goal.powerplay {
                accum.totals.powerplay_assists += 1;
            }
            if goal.shorthanded {
                accum.totals.shorthanded_assists += 1;
            }
        }
    }

    for penalty in &boxscore.penalties {
        let Some(participant) = penalty.participant.as_ref() else {
            continue;
        };
        let Some(team_id) = penalty.team_id else {
            continue;
        };
        if team_id != home.id && team_id != away.id {
            continue;
        }
        let minutes = penalty.minutes_assessed();

        let accum = ensure_player(players, participant.id, &participant.name, team_id, positions);
        accum.totals.penalty_minutes += minutes;
        accum.appearances.insert(game.id);
        side_mut(teams, team_id).penalty_minutes += minutes;
    }

    let rosters = [
        (home.id, &game.home_roster, home_score, away_score),
        (away.id, &game.away_roster, away_score, home_score),
    ];
    for (team_id, roster, team_score, opponent_score) in rosters {
        for entry in roster {
            let Some(participant_id) = entry.participant_id else {
                continue;
            };
            let position = positions
                .get(&participant_id)
                .copied()
                .unwrap_or_else(|| entry.position());
            if !position.is_skater_or_goalie() {
                continue;
            }

            let accum = ensure_player(players, participant_id, &entry.name, team_id, positions);
            accum.appearances.insert(game.id);

            if position != Position::Goalie {
                continue;
            }
            let Some(confidence) = resolver.starter_confidence(game.id, team_id, participant_id)
            else {
                continue;
            };
            accum.starts += 1;
            if !confidence.is_authoritative() {
                accum.totals.low_confidence_starts += 1;
            }
            if team_score > opponent_score {
                accum.totals.wins += 1;
            } else if team_score < opponent_score {
                accum.totals.losses += 1;
            } else {
                accum.totals.ties += 1;
            }
            accum.totals.goals_against += opponent_score;
        }
    }
}

/// Both team rows are inserted before any event is touched, and event team
/// ids are checked against the two sides first.
fn side_mut(teams: &mut HashMap<u64, TeamTotals>, id: u64) -> &mut TeamTotals {
    teams.get_mut(&id).expect("side rows exist before events")
}

fn ensure_player<'a>(
    players: &'a mut HashMap<u64, PlayerAccum>,
    id: u64,
    name: &str,
    team_id: u64,
    positions: &HashMap<u64, Position>,
) -> &'a mut PlayerAccum {
    players.entry(id).or_insert_with(|| {
        let position = positions.get(&id).copied().unwrap_or(Position::Forward);
        PlayerAccum {
            totals: PlayerTotals::new(id, name, team_id, position),
            appearances: HashSet::new(),
            starts: 0,
        }
    })
}

fn finalize(
    teams: HashMap<u64, TeamTotals>,
    players: HashMap<u64, PlayerAccum>,
    mut summaries: Vec<GameSummary>,
) -> SeasonStats {
    let mut team_rows: Vec<TeamTotals> = teams.into_values().collect();
    for row in &mut team_rows {
        // Recomputed from the accumulated for/against so it can never drift.
        row.goal_differential = i64::from(row.goals_for) - i64::from(row.goals_against);
    }
    team_rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.goal_differential.cmp(&a.goal_differential))
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut player_rows: Vec<PlayerTotals> = players
        .into_values()
        .map(|accum| {
            let mut totals = accum.totals;
            // Goalies are credited for games started; everyone else for
            // games appeared in.
            totals.games_played = if totals.position == Position::Goalie {
                accum.starts
            } else {
                accum.appearances.len() as u32
            };
            totals
        })
        .collect();
    player_rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.goals.cmp(&a.goals))
            .then_with(|| a.name.cmp(&b.name))
    });

    summaries.sort_by(|a, b| {
        parse_date(&a.date)
            .cmp(&parse_date(&b.date))
            .then_with(|| a.id.cmp(&b.id))
    });

    SeasonStats {
        teams: team_rows,
        players: player_rows,
        games: summaries,
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
