use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::game::{GameRecord, GoalEvent, Position};

/// Order-independent identity of an on-ice unit: the sorted participant ids.
type UnitKey = Vec<u64>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct UnitStats {
    goals: u32,
    assists: u32,
}

impl UnitStats {
    fn points(&self) -> u32 {
        self.goals + self.assists
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UnitPlayer {
    pub id: u64,
    pub name: String,
    pub position: Position,
    pub number: Option<u32>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankedUnit {
    pub label: String,
    pub players: Vec<UnitPlayer>,
    pub goals: u32,
    pub assists: u32,
    pub points: u32,
    /// Share of the category's total points, in percent, one decimal.
    pub dominance: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoringPair {
    pub players: Vec<UnitPlayer>,
    pub goals: u32,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TeamFormations {
    pub forward_lines: Vec<RankedUnit>,
    pub defense_pairs: Vec<RankedUnit>,
    pub powerplay_units: Vec<RankedUnit>,
    pub penalty_kill_units: Vec<RankedUnit>,
    pub top_scoring_pairs: Vec<ScoringPair>,
}

#[derive(Debug, Clone)]
struct PlayerInfo {
    name: String,
    position: Position,
    number: Option<u32>,
}

#[derive(Debug, Default)]
struct TeamCounters {
    roster: HashMap<u64, PlayerInfo>,
    forward_trios: HashMap<UnitKey, UnitStats>,
    forward_pairs: HashMap<UnitKey, UnitStats>,
    defense_pairs: HashMap<UnitKey, UnitStats>,
    powerplay_units: HashMap<UnitKey, UnitStats>,
    penalty_kill_units: HashMap<UnitKey, UnitStats>,
    scoring_pairs: HashMap<UnitKey, u32>,
}

/// Infer line combinations for every team from goal/assist co-occurrence.
/// Fully recomputed on each call; identical input yields identical output,
/// including ordering.
pub fn infer_formations(games: &[GameRecord]) -> BTreeMap<u64, TeamFormations> {
    let mut ordered: Vec<&GameRecord> = games.iter().filter(|g| g.is_aggregatable()).collect();
    ordered.sort_by_key(|g| g.id);

    let mut counters: HashMap<u64, TeamCounters> = HashMap::new();

    // Pass 1: per-team position map, last write wins over game order.
    for game in &ordered {
        let Some(boxscore) = game.boxscore.as_ref() else {
            continue;
        };
        let sides = [
            (boxscore.teams[0].id, &game.home_roster),
            (boxscore.teams[1].id, &game.away_roster),
        ];
        for (team_id, roster) in sides {
            let team = counters.entry(team_id).or_default();
            for entry in roster {
                let Some(id) = entry.participant_id else {
                    continue;
                };
                // Only real skater/goalie codes participate in formations.
                let position = match entry.positions.first().map(String::as_str) {
                    Some("F") | Some("C") => Position::Forward,
                    Some("D") => Position::Defense,
                    Some("G") => Position::Goalie,
                    _ => continue,
                };
                team.roster.insert(
                    id,
                    PlayerInfo {
                        name: entry.name.clone(),
                        position,
                        number: entry.number,
                    },
                );
            }
        }
    }

    // Pass 2: co-occurrence counting over scoring plays.
    for game in &ordered {
        let Some(boxscore) = game.boxscore.as_ref() else {
            continue;
        };
        for goal in &boxscore.goals {
            count_goal(&mut counters, goal);
        }
    }

    counters
        .into_iter()
        .map(|(team_id, team)| (team_id, build_report(&team)))
        .collect()
}

fn count_goal(counters: &mut HashMap<u64, TeamCounters>, goal: &GoalEvent) {
    let Some(team_id) = goal.team_id else {
        return;
    };
    let Some(scorer) = goal.scorer.as_ref() else {
        return;
    };
    let Some(team) = counters.get_mut(&team_id) else {
        return;
    };

    let mut involved: Vec<u64> = vec![scorer.id];
    for assist in &goal.assists {
        if !involved.contains(&assist.id) {
            involved.push(assist.id);
        }
    }
    if involved.len() < 2 {
        return;
    }

    let positioned: Vec<u64> = involved
        .iter()
        .copied()
        .filter(|id| team.roster.contains_key(id))
        .collect();
    if positioned.len() < 2 {
        return;
    }

    let scorer_id = team.roster.contains_key(&scorer.id).then_some(scorer.id);
    let assist_ids: Vec<u64> = positioned
        .iter()
        .copied()
        .filter(|id| Some(*id) != scorer_id)
        .collect();

    // Both flags set (or neither) means the strength state is unknown, so
    // the goal counts as even strength.
    let powerplay = goal.powerplay && !goal.shorthanded;
    let shorthanded = goal.shorthanded && !goal.powerplay;

    if powerplay || shorthanded {
        let mut key = positioned.clone();
        key.sort_unstable();
        let bucket = if powerplay {
            &mut team.powerplay_units
        } else {
            &mut team.penalty_kill_units
        };
        credit_unit(bucket, key, scorer_id, &assist_ids);
    } else {
        let forwards: Vec<u64> = positioned
            .iter()
            .copied()
            .filter(|id| position_of(team, *id) == Position::Forward)
            .collect();
        let defensemen: Vec<u64> = positioned
            .iter()
            .copied()
            .filter(|id| position_of(team, *id) == Position::Defense)
            .collect();

        for key in combinations(&forwards, 3) {
            credit_unit(&mut team.forward_trios, key, scorer_id, &assist_ids);
        }
        for key in combinations(&forwards, 2) {
            credit_unit(&mut team.forward_pairs, key, scorer_id, &assist_ids);
        }
        for key in combinations(&defensemen, 2) {
            credit_unit(&mut team.defense_pairs, key, scorer_id, &assist_ids);
        }
    }

    // Scorer plus primary assist, tracked separately for the chemistry list.
    if let (Some(scorer_id), Some(primary)) = (scorer_id, goal.assists.first()) {
        if primary.id != scorer_id && team.roster.contains_key(&primary.id) {
            let mut key = vec![scorer_id, primary.id];
            key.sort_unstable();
            *team.scoring_pairs.entry(key).or_insert(0) += 1;
        }
    }
}

fn position_of(team: &TeamCounters, id: u64) -> Position {
    team.roster
        .get(&id)
        .map(|info| info.position)
        .unwrap_or(Position::Forward)
}

fn credit_unit(
    bucket: &mut HashMap<UnitKey, UnitStats>,
    key: UnitKey,
    scorer_id: Option<u64>,
    assist_ids: &[u64],
) {
    let scored = scorer_id.is_some_and(|id| key.contains(&id));
    let assisting = assist_ids.iter().filter(|id| key.contains(id)).count() as u32;
    let stats = bucket.entry(key).or_default();
    if scored {
        stats.goals += 1;
    }
    stats.assists += assisting;
}

/// All k-element subsets of `ids` as sorted unit keys. k is 2 or 3 here and
/// the involved sets are tiny, so plain nested loops beat anything fancier.
fn combinations(ids: &[u64], k: usize) -> Vec<UnitKey> {
    let mut out = Vec::new();
    match k {
        2 => {
            for i in 0..ids.len() {
                for j in i + 1..ids.len() {
                    let mut key = vec![ids[i], ids[j]];
                    key.sort_unstable();
                    out.push(key);
                }
            }
        }
        3 => {
            for i in 0..ids.len() {
                for j in i + 1..ids.len() {
                    for l in j + 1..ids.len() {
                        let mut key = vec![ids[i], ids[j], ids[l]];
                        key.sort_unstable();
                        out.push(key);
                    }
                }
            }
        }
        _ => {}
    }
    out
}

fn build_report(team: &TeamCounters) -> TeamFormations {
    // Direct trios that actually scored, merged with trios deduced from the
    // pair graph. A deduced trio displaces a direct one only when strictly
    // better on points.
    let mut trios: HashMap<UnitKey, UnitStats> = team
        .forward_trios
        .iter()
        .filter(|(_, stats)| stats.goals > 0)
        .map(|(key, stats)| (key.clone(), *stats))
        .collect();
    for (key, stats) in deduce_trios(&team.forward_pairs) {
        match trios.get(&key) {
            Some(direct) if stats.points() <= direct.points() => {}
            _ => {
                trios.insert(key, stats);
            }
        }
    }

    // Constituent pairs of an accepted trio no longer stand on their own.
    let mut absorbed: HashSet<UnitKey> = HashSet::new();
    for key in trios.keys() {
        for pair in combinations(key, 2) {
            absorbed.insert(pair);
        }
    }

    let mut line_candidates: Vec<(UnitKey, UnitStats)> = trios.into_iter().collect();
    line_candidates.extend(
        team.forward_pairs
            .iter()
            .filter(|(key, stats)| stats.goals > 0 && !absorbed.contains(*key))
            .map(|(key, stats)| (key.clone(), *stats)),
    );

    let forward_lines = rank_units(team, line_candidates, RankBy::Points, 3, "Line ");
    let defense_pairs = rank_units(
        team,
        qualifying(&team.defense_pairs),
        RankBy::Goals,
        2,
        "D",
    );
    let powerplay_units = rank_units(
        team,
        qualifying(&team.powerplay_units),
        RankBy::Points,
        3,
        "PP",
    );
    let penalty_kill_units = rank_units(
        team,
        qualifying(&team.penalty_kill_units),
        RankBy::Points,
        3,
        "PK",
    );

    let mut pairs: Vec<(&UnitKey, u32)> = team
        .scoring_pairs
        .iter()
        .filter(|(_, goals)| **goals > 0)
        .map(|(key, goals)| (key, *goals))
        .collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let top_scoring_pairs = pairs
        .into_iter()
        .take(5)
        .map(|(key, goals)| ScoringPair {
            players: unit_players(team, key),
            goals,
        })
        .collect();

    TeamFormations {
        forward_lines,
        defense_pairs,
        powerplay_units,
        penalty_kill_units,
        top_scoring_pairs,
    }
}

fn qualifying(bucket: &HashMap<UnitKey, UnitStats>) -> Vec<(UnitKey, UnitStats)> {
    bucket
        .iter()
        .filter(|(_, stats)| stats.goals > 0)
        .map(|(key, stats)| (key.clone(), *stats))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RankBy {
    Points,
    Goals,
}

fn rank_units(
    team: &TeamCounters,
    candidates: Vec<(UnitKey, UnitStats)>,
    order: RankBy,
    keep: usize,
    label_prefix: &str,
) -> Vec<RankedUnit> {
    let total_points: u32 = candidates.iter().map(|(_, stats)| stats.points()).sum();

    let mut scored: Vec<(UnitKey, UnitStats, f64)> = candidates
        .into_iter()
        .map(|(key, stats)| {
            let dominance = if total_points == 0 {
                0.0
            } else {
                round_one(f64::from(stats.points()) * 100.0 / f64::from(total_points))
            };
            (key, stats, dominance)
        })
        .collect();

    scored.sort_by(|a, b| match order {
        RankBy::Points => b
            .1
            .points()
            .cmp(&a.1.points())
            .then_with(|| b.2.total_cmp(&a.2))
            .then_with(|| a.0.cmp(&b.0)),
        RankBy::Goals => b.1.goals.cmp(&a.1.goals).then_with(|| a.0.cmp(&b.0)),
    });

    scored
        .into_iter()
        .take(keep)
        .enumerate()
        .map(|(idx, (key, stats, dominance))| RankedUnit {
            label: format!("{}{}", label_prefix, idx + 1),
            players: unit_players(team, &key),
            goals: stats.goals,
            assists: stats.assists,
            points: stats.points(),
            dominance,
        })
        .collect()
}

/// Triangles in the scored-pair graph: any three forwards whose pairs have
/// all scored form a deduced trio. Its stats are the best constituent
/// pair's, never a sum, so deduction cannot inflate a trio past what any
/// underlying pair earned.
fn deduce_trios(pairs: &HashMap<UnitKey, UnitStats>) -> Vec<(UnitKey, UnitStats)> {
    let mut edges: HashMap<(u64, u64), UnitStats> = HashMap::new();
    let mut neighbors: BTreeMap<u64, BTreeSet<u64>> = BTreeMap::new();
    for (key, stats) in pairs {
        if stats.goals == 0 || key.len() != 2 {
            continue;
        }
        let (a, b) = (key[0], key[1]);
        edges.insert((a, b), *stats);
        neighbors.entry(a).or_default().insert(b);
        neighbors.entry(b).or_default().insert(a);
    }

    let mut out = Vec::new();
    for (&a, a_neighbors) in &neighbors {
        for &b in a_neighbors.iter().filter(|&&b| b > a) {
            for &c in a_neighbors.iter().filter(|&&c| c > b) {
                let Some(b_neighbors) = neighbors.get(&b) else {
                    continue;
                };
                if !b_neighbors.contains(&c) {
                    continue;
                }
                let best = [(a, b), (a, c), (b, c)]
                    .iter()
                    .filter_map(|edge| edges.get(edge))
                    .copied()
                    .max_by_key(|stats| (stats.points(), stats.goals))
                    .unwrap_or_default();
                out.push((vec![a, b, c], best));
            }
        }
    }
    out
}

fn unit_players(team: &TeamCounters, key: &[u64]) -> Vec<UnitPlayer> {
    key.iter()
        .filter_map(|id| {
            team.roster.get(id).map(|info| UnitPlayer {
                id: *id,
                name: info.name.clone(),
                position: info.position,
                number: info.number,
            })
        })
        .collect()
}

fn round_one(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
