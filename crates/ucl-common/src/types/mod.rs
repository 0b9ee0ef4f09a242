//! Common types used across UCL Lake

use serde::{Deserialize, Serialize};

/// Competition name emitted into the match artifact
pub const COMPETITION_NAME: &str = "Champions League";

/// Competition short name emitted into the match artifact
pub const COMPETITION_SHORT_NAME: &str = "UCL";

/// Column order of the match artifact CSV. Fixed; consumers depend on it.
pub const ARTIFACT_COLUMNS: [&str; 13] = [
    "match_id",
    "match_datetime",
    "match_date",
    "completed",
    "match_status",
    "home_team_id",
    "home_score",
    "away_team_id",
    "away_score",
    "match_name",
    "match_short_name",
    "venue",
    "season_year",
];

/// Logical category of API resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    Teams,
    Schedule,
    Standings,
    Roster,
}

impl EndpointKind {
    /// Top-level prefix under `raw/` in the content store
    pub fn storage_prefix(&self) -> &'static str {
        match self {
            EndpointKind::Teams => "teams",
            EndpointKind::Schedule => "schedules",
            EndpointKind::Standings => "standings",
            EndpointKind::Roster => "team_rosters",
        }
    }

    /// File-name stem for per-season payloads
    pub fn file_stem(&self) -> &'static str {
        match self {
            EndpointKind::Teams => "teams",
            EndpointKind::Schedule => "schedule",
            EndpointKind::Standings => "standings",
            EndpointKind::Roster => "roster",
        }
    }
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.storage_prefix())
    }
}

/// Deterministic storage address for one logical unit of data.
///
/// The same `(endpoint kind, year, entity)` tuple always maps to the same
/// key, which is what makes re-running an ingestion idempotent: the upload
/// is a whole-object overwrite of the previous run's output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionKey(String);

impl PartitionKey {
    /// Key for a per-season payload (teams, schedule, standings).
    pub fn for_season(kind: EndpointKind, year: i32) -> Self {
        Self(format!(
            "raw/{}/year={}/{}_{}.json",
            kind.storage_prefix(),
            year,
            kind.file_stem(),
            year
        ))
    }

    /// Key for one team's roster in one season.
    pub fn for_roster(team_id: &str, year: i32) -> Self {
        Self(format!(
            "raw/{}/year={}/team_{}_roster_{}.json",
            EndpointKind::Roster.storage_prefix(),
            year,
            team_id,
            year
        ))
    }

    /// Key for the ingestion run summary.
    pub fn ingestion_summary() -> Self {
        Self("raw/ingestion_summary.json".to_string())
    }

    /// Key for the consolidated match artifact.
    pub fn match_artifact() -> Self {
        Self("processed/real_matches/real_matches.csv".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical flat record for one match, as normalized from a raw schedule
/// payload. One row of the match artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: String,
    pub match_datetime: String,
    pub match_date: String,
    pub completed: bool,
    pub match_status: String,
    pub home_team_id: String,
    pub home_score: u32,
    pub away_team_id: String,
    pub away_score: u32,
    pub venue: String,
    pub season_year: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_key_determinism() {
        let a = PartitionKey::for_season(EndpointKind::Teams, 2024);
        let b = PartitionKey::for_season(EndpointKind::Teams, 2024);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "raw/teams/year=2024/teams_2024.json");
    }

    #[test]
    fn test_partition_key_per_kind() {
        assert_eq!(
            PartitionKey::for_season(EndpointKind::Schedule, 2023).as_str(),
            "raw/schedules/year=2023/schedule_2023.json"
        );
        assert_eq!(
            PartitionKey::for_season(EndpointKind::Standings, 2015).as_str(),
            "raw/standings/year=2015/standings_2015.json"
        );
    }

    #[test]
    fn test_roster_key_includes_entity() {
        let key = PartitionKey::for_roster("83", 2024);
        assert_eq!(
            key.as_str(),
            "raw/team_rosters/year=2024/team_83_roster_2024.json"
        );
    }

    #[test]
    fn test_fixed_keys() {
        assert_eq!(
            PartitionKey::ingestion_summary().as_str(),
            "raw/ingestion_summary.json"
        );
        assert_eq!(
            PartitionKey::match_artifact().as_str(),
            "processed/real_matches/real_matches.csv"
        );
    }

    #[test]
    fn test_artifact_columns_order() {
        assert_eq!(ARTIFACT_COLUMNS[0], "match_id");
        assert_eq!(ARTIFACT_COLUMNS[12], "season_year");
        assert_eq!(ARTIFACT_COLUMNS.len(), 13);
    }
}
