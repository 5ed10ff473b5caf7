use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::ledger::TeamTotals;
use crate::names;

/// Feed team names that differ from the reference spelling in a known way.
/// Applied before normalization; first hit wins.
static NAME_VARIANTS: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("grenadiers lac st-louis", "grenadiers du lac st-louis"),
        ("lions lac st-louis", "lions du lac st-louis"),
        ("citadelles rouyn-noranda", "citadelles de rouyn-noranda"),
        ("seigneurs mille-îles", "seigneurs des mille-îles"),
        (
            "conquérants basses-laurentides",
            "conquérants basses-laurentides",
        ),
        (
            "forestiers abitibi-témiscaming",
            "forestiers abitibi-témiscaming",
        ),
    ]
});

const MATCH_THRESHOLD: f64 = 0.70;
pub const UNKNOWN_DIVISION: &str = "Unknown";

/// Reference mapping from team name to division label, read as a side
/// input. Entries are kept sorted so equal fuzzy scores always resolve the
/// same way.
#[derive(Debug, Clone, Deserialize)]
pub struct DivisionMap {
    team_to_division: HashMap<String, String>,
}

impl DivisionMap {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn is_empty(&self) -> bool {
        self.team_to_division.is_empty()
    }

    /// Division for a team name: exact canonical match first, then the best
    /// fuzzy score above the acceptance threshold, else `"Unknown"`.
    pub fn division_for(&self, team_name: &str) -> String {
        let canonical = canonical_team_name(team_name);

        let mut entries: Vec<(&str, &str)> = self
            .team_to_division
            .iter()
            .map(|(name, division)| (name.as_str(), division.as_str()))
            .collect();
        entries.sort_unstable();

        for (reference, division) in entries.iter().copied() {
            if canonical_team_name(reference) == canonical {
                return division.to_string();
            }
        }

        let mut best_score = 0.0f64;
        let mut best_division: Option<&str> = None;
        for (reference, division) in entries.iter().copied() {
            let score = strsim::normalized_levenshtein(&canonical, &canonical_team_name(reference));
            if score > best_score {
                best_score = score;
                best_division = Some(division);
            }
        }

        match best_division {
            Some(division) if best_score > MATCH_THRESHOLD => division.to_string(),
            _ => UNKNOWN_DIVISION.to_string(),
        }
    }
}

/// Enrich the team table in place. Never fails: unmatched teams get the
/// `"Unknown"` label.
pub fn assign_divisions(teams: &mut [TeamTotals], map: &DivisionMap) {
    for team in teams {
        team.division = Some(map.division_for(&team.name));
    }
}

fn canonical_team_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    for (variant, replacement) in NAME_VARIANTS.iter() {
        if lowered.contains(variant) {
            return names::normalize(replacement);
        }
    }
    names::normalize(&lowered)
}

#[cfg(test)]
mod tests {
    use super::{DivisionMap, UNKNOWN_DIVISION};

    fn reference() -> DivisionMap {
        DivisionMap::from_json(
            r#"{
                "team_to_division": {
                    "Grenadiers du Lac St-Louis": "Ouest",
                    "Citadelles de Rouyn-Noranda": "Nord",
                    "Gaulois d'Antoine-Girouard": "Sud"
                }
            }"#,
        )
        .expect("reference json parses")
    }

    #[test]
    fn exact_match_after_normalization() {
        let map = reference();
        assert_eq!(map.division_for("GAULOIS D'ANTOINE-GIROUARD"), "Sud");
    }

    #[test]
    fn known_variant_resolves_exactly() {
        let map = reference();
        assert_eq!(map.division_for("Grenadiers Lac St-Louis"), "Ouest");
    }

    #[test]
    fn close_name_matches_fuzzily() {
        let map = reference();
        // Missing accent and one stray letter: still well above threshold.
        assert_eq!(map.division_for("Citadelles de Rouyn Noranda"), "Nord");
    }

    #[test]
    fn distant_name_is_unknown() {
        let map = reference();
        assert_eq!(map.division_for("Central Scouting HQ"), UNKNOWN_DIVISION);
    }
}
