use lheq_stats::formations::infer_formations;
use lheq_stats::game::{
    Boxscore, GameRecord, GameStatus, GoalEvent, ParticipantRef, RosterEntry, TeamSide,
};

const HOME: u64 = 1;
const AWAY: u64 = 2;

fn entry(id: u64, name: &str, code: &str) -> RosterEntry {
    RosterEntry {
        participant_id: Some(id),
        name: name.to_string(),
        number: Some(id as u32),
        positions: vec![code.to_string()],
    }
}

fn goal(team_id: u64, scorer: u64, assists: &[u64], pp: bool, sh: bool) -> GoalEvent {
    GoalEvent {
        team_id: Some(team_id),
        scorer: Some(ParticipantRef {
            id: scorer,
            name: format!("Player {scorer}"),
        }),
        assists: assists
            .iter()
            .map(|id| ParticipantRef {
                id: *id,
                name: format!("Player {id}"),
            })
            .collect(),
        powerplay: pp,
        shorthanded: sh,
    }
}

fn game(id: u64, goals: Vec<GoalEvent>, home_roster: Vec<RosterEntry>) -> GameRecord {
    GameRecord {
        id,
        date: "2025-10-04".to_string(),
        status: GameStatus::Final,
        home_team: "Home".to_string(),
        away_team: "Away".to_string(),
        home_score: goals.iter().filter(|g| g.team_id == Some(HOME)).count() as u32,
        away_score: goals.iter().filter(|g| g.team_id == Some(AWAY)).count() as u32,
        boxscore: Some(Boxscore {
            teams: vec![
                TeamSide {
                    id: HOME,
                    name: "Home".to_string(),
                    logo_url: None,
                },
                TeamSide {
                    id: AWAY,
                    name: "Away".to_string(),
                    logo_url: None,
                },
            ],
            goals,
            penalties: vec![],
        }),
        home_roster,
        away_roster: vec![entry(99, "Away Keeper", "G")],
        starting_goalies: None,
    }
}

fn forwards_roster() -> Vec<RosterEntry> {
    vec![
        entry(10, "Player 10", "F"),
        entry(11, "Player 11", "F"),
        entry(12, "Player 12", "F"),
        entry(13, "Player 13", "F"),
        entry(40, "Player 40", "D"),
        entry(41, "Player 41", "D"),
    ]
}

#[test]
fn inference_is_idempotent() {
    let games = vec![game(
        1,
        vec![
            goal(HOME, 10, &[11, 12], false, false),
            goal(HOME, 11, &[10], false, false),
            goal(HOME, 40, &[41], false, false),
            goal(HOME, 10, &[40, 11], true, false),
        ],
        forwards_roster(),
    )];

    let first = infer_formations(&games);
    let second = infer_formations(&games);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn direct_trio_outranks_its_own_pairs() {
    // One even-strength goal by three forwards: the trio is the line, its
    // constituent pairs disappear from standalone reporting.
    let games = vec![game(1, vec![goal(HOME, 10, &[11, 12], false, false)], forwards_roster())];
    let report = infer_formations(&games);
    let home = report.get(&HOME).expect("home report");

    assert_eq!(home.forward_lines.len(), 1);
    let line = &home.forward_lines[0];
    assert_eq!(line.label, "Line 1");
    let ids: Vec<u64> = line.players.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![10, 11, 12]);
    assert_eq!(line.goals, 1);
    assert_eq!(line.assists, 2);
    assert_eq!(line.points, 3);
    assert_eq!(line.dominance, 100.0);
}

#[test]
fn trio_is_deduced_from_three_scoring_pairs() {
    // 10-11, 10-12 and 11-12 each score as pairs, never all together.
    let games = vec![game(
        1,
        vec![
            goal(HOME, 10, &[11], false, false),
            goal(HOME, 10, &[12], false, false),
            goal(HOME, 11, &[12], false, false),
        ],
        forwards_roster(),
    )];
    let report = infer_formations(&games);
    let home = report.get(&HOME).expect("home report");

    // Exactly one line survives: the deduced trio. No standalone duo keeps
    // any of the three absorbed pairs alive.
    assert_eq!(home.forward_lines.len(), 1);
    let line = &home.forward_lines[0];
    let ids: Vec<u64> = line.players.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![10, 11, 12]);

    // Stats come from the best single pair (all are 1 goal + 1 assist),
    // never from summing the three edges.
    assert_eq!(line.goals, 1);
    assert_eq!(line.assists, 1);
    assert_eq!(line.points, 2);
}

#[test]
fn deduced_trio_replaces_weaker_direct_trio() {
    // The direct trio goal gives {10,11,12} three points, while the pair
    // 10-11 piles up more on its own; the pair graph still only yields a
    // trio worth the best pair, which here beats the direct trio.
    let games = vec![game(
        1,
        vec![
            goal(HOME, 10, &[11, 12], false, false),
            goal(HOME, 10, &[11], false, false),
            goal(HOME, 11, &[10], false, false),
            goal(HOME, 10, &[12], false, false),
            goal(HOME, 12, &[11], false, false),
        ],
        forwards_roster(),
    )];
    let report = infer_formations(&games);
    let home = report.get(&HOME).expect("home report");

    assert_eq!(home.forward_lines.len(), 1);
    let line = &home.forward_lines[0];
    let ids: Vec<u64> = line.players.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![10, 11, 12]);
    // Pair 10-11: goals on the trio goal plus two pair goals and assists.
    assert!(line.points > 3, "deduced stats should beat the direct trio");
}

#[test]
fn defense_pairs_rank_by_goals() {
    let games = vec![game(
        1,
        vec![
            goal(HOME, 40, &[41], false, false),
            goal(HOME, 40, &[41], false, false),
            goal(HOME, 10, &[40, 41], false, false),
        ],
        forwards_roster(),
    )];
    let report = infer_formations(&games);
    let home = report.get(&HOME).expect("home report");

    assert_eq!(home.defense_pairs.len(), 1);
    let pair = &home.defense_pairs[0];
    assert_eq!(pair.label, "D1");
    assert_eq!(pair.goals, 2);
    let ids: Vec<u64> = pair.players.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![40, 41]);
}

#[test]
fn special_teams_units_keep_every_position() {
    let games = vec![game(
        1,
        vec![
            goal(HOME, 10, &[40, 11], true, false),
            goal(HOME, 13, &[41], false, true),
        ],
        forwards_roster(),
    )];
    let report = infer_formations(&games);
    let home = report.get(&HOME).expect("home report");

    assert_eq!(home.powerplay_units.len(), 1);
    let pp = &home.powerplay_units[0];
    assert_eq!(pp.label, "PP1");
    let ids: Vec<u64> = pp.players.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![10, 11, 40]);
    assert_eq!(pp.points, 3);
    assert_eq!(pp.dominance, 100.0);

    assert_eq!(home.penalty_kill_units.len(), 1);
    assert_eq!(home.penalty_kill_units[0].label, "PK1");

    // Special-teams goals never leak into even-strength line counting.
    assert!(home.forward_lines.is_empty());
}

#[test]
fn contradictory_strength_flags_count_as_even_strength() {
    let games = vec![game(1, vec![goal(HOME, 10, &[11], true, true)], forwards_roster())];
    let report = infer_formations(&games);
    let home = report.get(&HOME).expect("home report");

    assert!(home.powerplay_units.is_empty());
    assert!(home.penalty_kill_units.is_empty());
    assert_eq!(home.forward_lines.len(), 1);
}

#[test]
fn dominance_shares_the_category_points() {
    // Two disjoint scoring pairs: 3 points vs 1 point.
    let games = vec![game(
        1,
        vec![
            goal(HOME, 10, &[11], false, false),
            goal(HOME, 11, &[10], false, false),
            goal(HOME, 12, &[13], false, false),
        ],
        forwards_roster(),
    )];
    let report = infer_formations(&games);
    let home = report.get(&HOME).expect("home report");

    // 10-11 scored twice with one counted assist each time (4 pts);
    // 12-13 once (2 pts).
    assert_eq!(home.forward_lines.len(), 2);
    assert_eq!(home.forward_lines[0].dominance, 66.7);
    assert_eq!(home.forward_lines[1].dominance, 33.3);
}

#[test]
fn top_scoring_pairs_track_primary_assists_only() {
    let games = vec![game(
        1,
        vec![
            goal(HOME, 10, &[11, 12], false, false),
            goal(HOME, 10, &[11], false, false),
            goal(HOME, 12, &[13], false, false),
        ],
        forwards_roster(),
    )];
    let report = infer_formations(&games);
    let home = report.get(&HOME).expect("home report");

    assert_eq!(home.top_scoring_pairs.len(), 2);
    let best = &home.top_scoring_pairs[0];
    let ids: Vec<u64> = best.players.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![10, 11]);
    assert_eq!(best.goals, 2);

    // 10-12 never formed a scorer/primary-assist pairing.
    for pair in &home.top_scoring_pairs {
        let ids: Vec<u64> = pair.players.iter().map(|p| p.id).collect();
        assert_ne!(ids, vec![10, 12]);
    }
}

#[test]
fn zero_goal_units_are_never_reported() {
    // A defenseman scores with two forward assists: the forward pair 11-12
    // collects assists but no goals, so it must not appear as a line.
    let games = vec![game(1, vec![goal(HOME, 40, &[11, 12], false, false)], forwards_roster())];
    let report = infer_formations(&games);
    let home = report.get(&HOME).expect("home report");

    assert!(home.forward_lines.is_empty());
    assert!(home.defense_pairs.is_empty());
}
