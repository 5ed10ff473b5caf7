use crate::game::PenaltyEvent;

/// Distinct man-advantage situations per team for one game, derived from
/// penalty interval overlap rather than from powerplay goals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerplayOpportunities {
    pub home: u32,
    pub away: u32,
}

#[derive(Debug, Clone, Copy)]
struct PenaltyInterval {
    team_id: u64,
    start: u32,
    end: u32,
}

/// Count powerplay opportunities for both teams.
///
/// Every penalty maps to a half-open interval [start, end) in game seconds;
/// at any instant a team is on the powerplay iff the opponent has strictly
/// more penalties running. Each transition into that state counts once, so
/// two overlapping minors against the same team open a single 5-on-3
/// opportunity while a second penalty taken later, after the first expired,
/// opens a new one.
pub fn powerplay_opportunities(
    penalties: &[PenaltyEvent],
    home_id: u64,
    away_id: u64,
) -> PowerplayOpportunities {
    let intervals: Vec<PenaltyInterval> = penalties
        .iter()
        .filter_map(|p| {
            let team_id = p.team_id?;
            if team_id != home_id && team_id != away_id {
                return None;
            }
            let start = p.start_second();
            Some(PenaltyInterval {
                team_id,
                start,
                end: start + p.minutes_assessed() * 60,
            })
        })
        .collect();

    if intervals.is_empty() {
        return PowerplayOpportunities::default();
    }

    let mut boundaries: Vec<u32> = intervals
        .iter()
        .flat_map(|iv| [iv.start, iv.end])
        .collect();
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut counts = PowerplayOpportunities::default();
    let mut home_on_pp = false;
    let mut away_on_pp = false;

    // Active-penalty counts are constant between consecutive boundaries, so
    // sampling each segment start is enough.
    for window in boundaries.windows(2) {
        let instant = window[0];
        let mut home_active = 0u32;
        let mut away_active = 0u32;
        for iv in &intervals {
            if iv.start <= instant && instant < iv.end {
                if iv.team_id == home_id {
                    home_active += 1;
                } else {
                    away_active += 1;
                }
            }
        }

        let home_now = away_active > home_active;
        let away_now = home_active > away_active;
        if home_now && !home_on_pp {
            counts.home += 1;
        }
        if away_now && !away_on_pp {
            counts.away += 1;
        }
        home_on_pp = home_now;
        away_on_pp = away_now;
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::{PowerplayOpportunities, powerplay_opportunities};
    use crate::game::PenaltyEvent;

    const HOME: u64 = 501;
    const AWAY: u64 = 502;

    fn minor(team_id: u64, period: u32, minutes: u32, seconds: u32) -> PenaltyEvent {
        PenaltyEvent {
            team_id: Some(team_id),
            participant: None,
            duration_name: "Mineure".to_string(),
            period,
            clock_minutes: minutes,
            clock_seconds: seconds,
        }
    }

    #[test]
    fn no_penalties_no_opportunities() {
        let counts = powerplay_opportunities(&[], HOME, AWAY);
        assert_eq!(counts, PowerplayOpportunities::default());
    }

    #[test]
    fn sequential_minors_count_twice() {
        let penalties = vec![minor(AWAY, 1, 2, 0), minor(AWAY, 2, 5, 30)];
        let counts = powerplay_opportunities(&penalties, HOME, AWAY);
        assert_eq!(counts.home, 2);
        assert_eq!(counts.away, 0);
    }

    #[test]
    fn simultaneous_minors_are_one_opportunity() {
        // Two minors at the same instant: a 5-on-3, not two powerplays.
        let penalties = vec![minor(AWAY, 1, 8, 15), minor(AWAY, 1, 8, 15)];
        let counts = powerplay_opportunities(&penalties, HOME, AWAY);
        assert_eq!(counts.home, 1);
        assert_eq!(counts.away, 0);
    }

    #[test]
    fn offsetting_minors_cancel() {
        let penalties = vec![minor(HOME, 2, 3, 0), minor(AWAY, 2, 3, 0)];
        let counts = powerplay_opportunities(&penalties, HOME, AWAY);
        assert_eq!(counts, PowerplayOpportunities::default());
    }

    #[test]
    fn second_penalty_while_shorthanded_does_not_inflate() {
        // Away takes a minor; one minute in, away takes another. The home
        // powerplay deepens to 5-on-3 but stays a single opportunity; when
        // the first minor expires the advantage continues uninterrupted.
        let penalties = vec![minor(AWAY, 1, 4, 0), minor(AWAY, 1, 5, 0)];
        let counts = powerplay_opportunities(&penalties, HOME, AWAY);
        assert_eq!(counts.home, 1);
    }

    #[test]
    fn staggered_offsetting_minors_hand_each_side_one_edge() {
        // Away minor at 0:00 puts home up a man; the home minor at 1:00
        // evens things out; once the away minor expires at 2:00 the home
        // penalty is still running, so away gets its own powerplay.
        let penalties = vec![minor(AWAY, 1, 0, 0), minor(HOME, 1, 1, 0)];
        let counts = powerplay_opportunities(&penalties, HOME, AWAY);
        assert_eq!(counts.home, 1);
        assert_eq!(counts.away, 1);
    }
}
