use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;

/// Bench staff roles that show up in roster position lists. These collapse
/// into `Position::Coach` and are excluded from player statistics.
static STAFF_POSITIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "Trainer",
        "Assistant Coach",
        "Head Coach",
        "Safety Person",
        "Goaltending Coach",
    ])
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Final,
    Scheduled,
}

impl GameStatus {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("FINAL") {
            GameStatus::Final
        } else {
            GameStatus::Scheduled
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Final => "FINAL",
            GameStatus::Scheduled => "SCHEDULED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Position {
    #[serde(rename = "F")]
    Forward,
    #[serde(rename = "D")]
    Defense,
    #[serde(rename = "G")]
    Goalie,
    #[serde(rename = "Coach")]
    Coach,
}

impl Position {
    /// Collapse a raw roster position code. Centres are forwards, staff
    /// roles are coaches, anything unrecognized falls back to forward.
    pub fn from_code(raw: &str) -> Self {
        let code = raw.trim();
        if STAFF_POSITIONS.contains(code) {
            return Position::Coach;
        }
        match code {
            "G" => Position::Goalie,
            "D" => Position::Defense,
            _ => Position::Forward,
        }
    }

    pub fn is_skater_or_goalie(&self) -> bool {
        !matches!(self, Position::Coach)
    }
}

#[derive(Debug, Clone)]
pub struct ParticipantRef {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct TeamSide {
    pub id: u64,
    pub name: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GoalEvent {
    pub team_id: Option<u64>,
    pub scorer: Option<ParticipantRef>,
    pub assists: Vec<ParticipantRef>,
    pub powerplay: bool,
    pub shorthanded: bool,
}

#[derive(Debug, Clone)]
pub struct PenaltyEvent {
    pub team_id: Option<u64>,
    pub participant: Option<ParticipantRef>,
    pub duration_name: String,
    /// 1-based period, with the game clock time elapsed within it.
    pub period: u32,
    pub clock_minutes: u32,
    pub clock_seconds: u32,
}

impl PenaltyEvent {
    /// Infraction minutes from the free-text duration name. The feed mixes
    /// French and English labels; unrecognized durations count as minors.
    pub fn minutes_assessed(&self) -> u32 {
        let name = &self.duration_name;
        if name.contains("Minor") || name.contains("Mineure") {
            2
        } else if name.contains("Major") || name.contains("Majeure") {
            5
        } else if name.contains("Misconduct") {
            10
        } else {
            2
        }
    }

    /// Seconds from the start of the game at which the penalty begins.
    pub fn start_second(&self) -> u32 {
        self.period.saturating_sub(1) * 1200 + self.clock_minutes * 60 + self.clock_seconds
    }
}

#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub participant_id: Option<u64>,
    pub name: String,
    pub number: Option<u32>,
    pub positions: Vec<String>,
}

impl RosterEntry {
    pub fn position(&self) -> Position {
        match self.positions.first() {
            Some(code) => Position::from_code(code),
            None => Position::Forward,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Boxscore {
    /// Team sides in feed order: home first, away second.
    pub teams: Vec<TeamSide>,
    pub goals: Vec<GoalEvent>,
    pub penalties: Vec<PenaltyEvent>,
}

/// Starting-goalie hints, already collapsed to a plain name list. The wire
/// carries either a `{home_goalie, away_goalie}` object or a legacy
/// `[{name, number}]` list; both end up here.
#[derive(Debug, Clone, Default)]
pub struct StarterHints {
    pub names: Vec<String>,
}

impl StarterHints {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct GameRecord {
    pub id: u64,
    pub date: String,
    pub status: GameStatus,
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    pub boxscore: Option<Boxscore>,
    pub home_roster: Vec<RosterEntry>,
    pub away_roster: Vec<RosterEntry>,
    pub starting_goalies: Option<StarterHints>,
}

impl GameRecord {
    /// A game only enters aggregation once it is final and carries a
    /// boxscore with both team sides identified.
    pub fn is_aggregatable(&self) -> bool {
        self.status == GameStatus::Final
            && self
                .boxscore
                .as_ref()
                .is_some_and(|box_score| box_score.teams.len() >= 2)
    }
}

pub fn parse_game_json(raw: &str) -> Option<GameRecord> {
    let value = serde_json::from_str::<Value>(raw.trim()).ok()?;
    parse_game_record(&value)
}

/// Build a typed record from one scraped game document. Only the game id is
/// hard-required; every nested event validates its own identity fields and
/// drops out individually when they are missing.
pub fn parse_game_record(v: &Value) -> Option<GameRecord> {
    let id = as_u64_any(v.get("id")?)?;
    let status = GameStatus::parse(v.get("status").and_then(|x| x.as_str()).unwrap_or(""));
    let date = v
        .get("date")
        .and_then(|x| x.as_str())
        .unwrap_or_default()
        .to_string();
    let home_team = v
        .get("home_team")
        .and_then(|x| x.as_str())
        .unwrap_or("Unknown")
        .to_string();
    let away_team = v
        .get("away_team")
        .and_then(|x| x.as_str())
        .unwrap_or("Unknown")
        .to_string();
    let home_score = v.get("home_score").and_then(as_u32_any).unwrap_or(0);
    let away_score = v.get("away_score").and_then(as_u32_any).unwrap_or(0);

    let boxscore = v.get("boxscore").and_then(parse_boxscore);
    let home_roster = parse_roster(v.get("home_team_roster"));
    let away_roster = parse_roster(v.get("away_team_roster"));
    let starting_goalies = v.get("starting_goalies").and_then(parse_starter_hints);

    Some(GameRecord {
        id,
        date,
        status,
        home_team,
        away_team,
        home_score,
        away_score,
        boxscore,
        home_roster,
        away_roster,
        starting_goalies,
    })
}

fn parse_boxscore(v: &Value) -> Option<Boxscore> {
    let teams = v
        .get("teams")
        .and_then(|x| x.as_array())
        .map(|arr| arr.iter().filter_map(parse_team_side).collect::<Vec<_>>())
        .unwrap_or_default();

    let goals = v
        .get("goals")
        .and_then(|x| x.as_array())
        .map(|arr| arr.iter().map(parse_goal).collect::<Vec<_>>())
        .unwrap_or_default();

    let penalties = v
        .get("penalties")
        .and_then(|x| x.as_array())
        .map(|arr| arr.iter().map(parse_penalty).collect::<Vec<_>>())
        .unwrap_or_default();

    Some(Boxscore {
        teams,
        goals,
        penalties,
    })
}

fn parse_team_side(v: &Value) -> Option<TeamSide> {
    let id = as_u64_any(v.get("id")?)?;
    let name = v
        .get("name")
        .and_then(|x| x.as_str())
        .unwrap_or("Unknown")
        .to_string();
    let logo_url = v
        .get("logoUrl")
        .and_then(|x| x.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string());
    Some(TeamSide { id, name, logo_url })
}

fn parse_goal(v: &Value) -> GoalEvent {
    let team_id = v.get("teamId").and_then(as_u64_any);
    let scorer = v.get("participant").and_then(parse_participant);
    let assists = v
        .get("assists")
        .and_then(|x| x.as_array())
        .map(|arr| arr.iter().filter_map(parse_participant).collect())
        .unwrap_or_default();
    GoalEvent {
        team_id,
        scorer,
        assists,
        powerplay: v
            .get("isPowerplay")
            .and_then(|x| x.as_bool())
            .unwrap_or(false),
        shorthanded: v
            .get("isShorthanded")
            .and_then(|x| x.as_bool())
            .unwrap_or(false),
    }
}

fn parse_penalty(v: &Value) -> PenaltyEvent {
    let (clock_minutes, clock_seconds) = v
        .get("time")
        .and_then(|x| x.as_str())
        .and_then(parse_clock)
        .unwrap_or((0, 0));
    PenaltyEvent {
        team_id: v.get("teamId").and_then(as_u64_any),
        participant: v.get("participant").and_then(parse_participant),
        duration_name: v
            .get("duration")
            .and_then(|d| d.get("name"))
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string(),
        period: v.get("period").and_then(as_u32_any).unwrap_or(1),
        clock_minutes,
        clock_seconds,
    }
}

/// Goal and penalty events reference people as `{participantId, fullName}`.
/// A missing id makes the reference unusable, so the whole ref drops out.
fn parse_participant(v: &Value) -> Option<ParticipantRef> {
    let id = as_u64_any(v.get("participantId")?)?;
    let name = v
        .get("fullName")
        .and_then(|x| x.as_str())
        .unwrap_or("Unknown")
        .to_string();
    Some(ParticipantRef { id, name })
}

fn parse_roster(v: Option<&Value>) -> Vec<RosterEntry> {
    let Some(arr) = v.and_then(|x| x.as_array()) else {
        return Vec::new();
    };
    arr.iter().map(parse_roster_entry).collect()
}

fn parse_roster_entry(v: &Value) -> RosterEntry {
    let name = v
        .get("participant")
        .and_then(|p| p.get("fullName"))
        .and_then(|x| x.as_str())
        .unwrap_or("Unknown")
        .to_string();
    let positions = v
        .get("positions")
        .and_then(|x| x.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|p| p.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default();
    RosterEntry {
        participant_id: v.get("participantId").and_then(as_u64_any),
        name,
        number: v.get("number").and_then(as_u32_any).filter(|n| *n > 0),
        positions,
    }
}

pub(crate) fn parse_starter_hints(v: &Value) -> Option<StarterHints> {
    let mut names = Vec::new();
    match v {
        Value::Object(map) => {
            for key in ["home_goalie", "away_goalie"] {
                if let Some(name) = map.get(key).and_then(|x| x.as_str()) {
                    if !name.trim().is_empty() {
                        names.push(name.to_string());
                    }
                }
            }
            // Some gamesheet exports nest the legacy list under "goalies".
            if let Some(list) = map.get("goalies").and_then(|x| x.as_array()) {
                collect_legacy_hints(list, &mut names);
            }
        }
        Value::Array(list) => collect_legacy_hints(list, &mut names),
        _ => {}
    }
    if names.is_empty() {
        None
    } else {
        Some(StarterHints { names })
    }
}

fn collect_legacy_hints(list: &[Value], names: &mut Vec<String>) {
    for entry in list {
        let Some(name) = entry.get("name").and_then(|x| x.as_str()) else {
            continue;
        };
        if !name.trim().is_empty() {
            names.push(name.to_string());
        }
    }
}

fn parse_clock(raw: &str) -> Option<(u32, u32)> {
    let mut nums = raw
        .split(|ch: char| !ch.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<u32>().ok());
    let minutes = nums.next()?;
    let seconds = nums.next()?;
    Some((minutes, seconds))
}

fn as_u64_any(v: &Value) -> Option<u64> {
    if let Some(n) = v.as_u64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<u64>().ok()
}

fn as_u32_any(v: &Value) -> Option<u32> {
    let n = as_u64_any(v)?;
    u32::try_from(n).ok()
}

#[cfg(test)]
mod tests {
    use super::{Position, parse_clock};

    #[test]
    fn parse_clock_works() {
        assert_eq!(parse_clock("12:34"), Some((12, 34)));
        assert_eq!(parse_clock("4:05"), Some((4, 5)));
        assert_eq!(parse_clock("n/a"), None);
    }

    #[test]
    fn position_codes_collapse() {
        assert_eq!(Position::from_code("C"), Position::Forward);
        assert_eq!(Position::from_code("G"), Position::Goalie);
        assert_eq!(Position::from_code("Head Coach"), Position::Coach);
        // Not in the staff list, so it falls through to forward.
        assert_eq!(Position::from_code("Manager"), Position::Forward);
    }
}
