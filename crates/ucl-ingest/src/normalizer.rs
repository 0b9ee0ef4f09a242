//! Match record normalization.
//!
//! Maps one heterogeneous raw match object plus its season year to a
//! canonical [`MatchRecord`], or drops it. Normalization is pure and
//! per-record: a bad match object is rejected with `None` and never takes
//! the surrounding batch down with it.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use ucl_common::MatchRecord;

/// Role resolution strategy: pick the (home, away) pair out of a competitor
/// list, or give up.
///
/// Kept pluggable so the fallback behavior can be swapped without touching
/// the rest of the normalizer.
pub type RoleResolver = for<'a> fn(&'a [Value]) -> Option<(&'a Value, &'a Value)>;

/// Default role resolution.
///
/// Competitors carrying `isHome: true` claim the home slot, everything else
/// the away slot (last claimant wins, matching upstream payloads that flag
/// exactly one side). When that leaves either slot open, the first two
/// competitors are taken as home and away in listing order. Listing order
/// carries no home/away guarantee.
pub fn resolve_roles_is_home_first<'a>(
    competitors: &'a [Value],
) -> Option<(&'a Value, &'a Value)> {
    let mut home = None;
    let mut away = None;

    for competitor in competitors {
        if competitor
            .get("isHome")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            home = Some(competitor);
        } else {
            away = Some(competitor);
        }
    }

    match (home, away) {
        (Some(h), Some(a)) => Some((h, a)),
        _ if competitors.len() >= 2 => Some((&competitors[0], &competitors[1])),
        _ => None,
    }
}

/// Normalize one raw match object with the default role resolver.
pub fn normalize(raw: &Value, season_year: i32) -> Option<MatchRecord> {
    normalize_with(raw, season_year, resolve_roles_is_home_first)
}

/// Normalize one raw match object.
///
/// Returns `None` when the object has no usable identifier or no resolvable
/// home/away pair. Every field lookup degrades to its documented default
/// rather than failing.
pub fn normalize_with(
    raw: &Value,
    season_year: i32,
    resolve_roles: RoleResolver,
) -> Option<MatchRecord> {
    let match_id = id_field(raw, "id")?;

    let raw_date = raw.get("date").and_then(Value::as_str).unwrap_or("");
    let (match_datetime, match_date) = resolve_timestamp(raw_date);

    let completed = raw
        .get("completed")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let match_status = raw
        .get("status")
        .and_then(|s| s.get("detail"))
        .and_then(Value::as_str)
        .unwrap_or("TBD")
        .to_string();

    let venue = raw
        .get("venue")
        .and_then(|v| v.get("fullName"))
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string();

    let competitors = raw
        .get("competitors")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let (home, away) = resolve_roles(competitors)?;

    Some(MatchRecord {
        match_id,
        match_datetime,
        match_date,
        completed,
        match_status,
        home_team_id: string_field(home, "id"),
        home_score: coerce_score(home.get("score")),
        away_team_id: string_field(away, "id"),
        away_score: coerce_score(away.get("score")),
        venue,
        season_year,
    })
}

/// Resolve the match timestamp from the raw date string.
///
/// Parseable input yields an ISO-8601 datetime and its date. Unparsable
/// input is kept verbatim as the datetime, with the first ten characters
/// (the whole string if shorter) as the date. That two-tier fallback is the
/// only date-handling guarantee this module offers.
fn resolve_timestamp(raw: &str) -> (String, String) {
    if raw.is_empty() {
        return (String::new(), String::new());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return (dt.to_rfc3339(), dt.date_naive().to_string());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return (
                dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
                dt.date().to_string(),
            );
        }
    }

    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return (format!("{}T00:00:00", d), d.to_string());
    }

    let date: String = raw.chars().take(10).collect();
    (raw.to_string(), date)
}

/// Identifier lookup: a non-empty string or a bare number, stringified.
fn id_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Like [`id_field`] but degrades to an empty string.
fn string_field(value: &Value, key: &str) -> String {
    id_field(value, key).unwrap_or_default()
}

/// Coerce a score value to a non-negative integer.
///
/// Numeric strings parse; anything missing, null, negative, or non-numeric
/// resolves to 0. Zero therefore masks some data-quality problems upstream.
fn coerce_score(value: Option<&Value>) -> u32 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(|x| x.min(u32::MAX as u64) as u32)
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse::<u32>().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_match() -> Value {
        json!({
            "id": "m-401",
            "date": "2024-05-15T20:00:00Z",
            "completed": true,
            "status": {"detail": "FT"},
            "venue": {"fullName": "Wembley Stadium"},
            "competitors": [
                {"id": "83", "isHome": true, "score": "2"},
                {"id": "86", "isHome": false, "score": "0"}
            ]
        })
    }

    #[test]
    fn test_normalize_well_formed_match() {
        let record = normalize(&sample_match(), 2024).unwrap();

        assert_eq!(record.match_id, "m-401");
        assert_eq!(record.season_year, 2024);
        assert_eq!(record.match_date, "2024-05-15");
        assert!(record.completed);
        assert_eq!(record.match_status, "FT");
        assert_eq!(record.venue, "Wembley Stadium");
        assert_eq!(record.home_team_id, "83");
        assert_eq!(record.away_team_id, "86");
        assert_eq!(record.home_score, 2);
        assert_eq!(record.away_score, 0);
    }

    #[test]
    fn test_normalize_rejects_missing_id() {
        let mut raw = sample_match();
        raw.as_object_mut().unwrap().remove("id");
        assert!(normalize(&raw, 2024).is_none());

        let empty_id = json!({"id": "", "competitors": [{"id": "1"}, {"id": "2"}]});
        assert!(normalize(&empty_id, 2024).is_none());
    }

    #[test]
    fn test_normalize_rejects_fewer_than_two_competitors() {
        let raw = json!({
            "id": "m-1",
            "competitors": [{"id": "83", "isHome": true, "score": 1}]
        });
        assert!(normalize(&raw, 2023).is_none());

        let no_competitors = json!({"id": "m-2"});
        assert!(normalize(&no_competitors, 2023).is_none());
    }

    #[test]
    fn test_numeric_id_is_stringified() {
        let raw = json!({
            "id": 4012,
            "competitors": [{"id": 83}, {"id": 86}]
        });
        let record = normalize(&raw, 2022).unwrap();
        assert_eq!(record.match_id, "4012");
        assert_eq!(record.home_team_id, "83");
    }

    #[test]
    fn test_defaults_for_absent_fields() {
        let raw = json!({
            "id": "m-3",
            "competitors": [{"id": "a"}, {"id": "b"}]
        });
        let record = normalize(&raw, 2021).unwrap();

        assert!(!record.completed);
        assert_eq!(record.match_status, "TBD");
        assert_eq!(record.venue, "Unknown");
        assert_eq!(record.match_datetime, "");
        assert_eq!(record.match_date, "");
        assert_eq!(record.home_score, 0);
        assert_eq!(record.away_score, 0);
    }

    #[test]
    fn test_date_fallback_unparsable_short_string() {
        let (dt, d) = resolve_timestamp("notadate");
        assert_eq!(dt, "notadate");
        assert_eq!(d, "notadate");
    }

    #[test]
    fn test_date_fallback_unparsable_long_string() {
        let (dt, d) = resolve_timestamp("sometime in spring 2024");
        assert_eq!(dt, "sometime in spring 2024");
        assert_eq!(d, "sometime i");
    }

    #[test]
    fn test_date_parse_rfc3339() {
        let (dt, d) = resolve_timestamp("2024-05-15T20:00:00Z");
        assert_eq!(d, "2024-05-15");
        assert!(dt.starts_with("2024-05-15T20:00:00"));
    }

    #[test]
    fn test_date_parse_naive_variants() {
        let (_, d) = resolve_timestamp("2023-11-07T18:45:00");
        assert_eq!(d, "2023-11-07");

        let (dt, d) = resolve_timestamp("2023-11-07");
        assert_eq!(dt, "2023-11-07T00:00:00");
        assert_eq!(d, "2023-11-07");
    }

    #[test]
    fn test_score_coercion() {
        assert_eq!(coerce_score(Some(&json!("2"))), 2);
        assert_eq!(coerce_score(Some(&json!(3))), 3);
        assert_eq!(coerce_score(Some(&json!(null))), 0);
        assert_eq!(coerce_score(Some(&json!("abc"))), 0);
        assert_eq!(coerce_score(Some(&json!(-1))), 0);
        assert_eq!(coerce_score(None), 0);
    }

    #[test]
    fn test_explicit_home_flag_wins_over_order() {
        let raw = json!({
            "id": "m-5",
            "competitors": [
                {"id": "away-side", "isHome": false, "score": 1},
                {"id": "home-side", "isHome": true, "score": 2}
            ]
        });
        let record = normalize(&raw, 2024).unwrap();
        assert_eq!(record.home_team_id, "home-side");
        assert_eq!(record.away_team_id, "away-side");
        assert_eq!(record.home_score, 2);
        assert_eq!(record.away_score, 1);
    }

    #[test]
    fn test_role_fallback_first_two_in_order() {
        // No isHome flags anywhere: first is home, second is away.
        let raw = json!({
            "id": "m-6",
            "competitors": [
                {"id": "first", "score": 0},
                {"id": "second", "score": 0},
                {"id": "third", "score": 9}
            ]
        });
        let record = normalize(&raw, 2024).unwrap();
        assert_eq!(record.home_team_id, "first");
        assert_eq!(record.away_team_id, "second");
    }

    #[test]
    fn test_custom_role_resolver() {
        fn reversed<'a>(competitors: &'a [Value]) -> Option<(&'a Value, &'a Value)> {
            if competitors.len() >= 2 {
                Some((&competitors[1], &competitors[0]))
            } else {
                None
            }
        }

        let raw = json!({
            "id": "m-7",
            "competitors": [{"id": "a"}, {"id": "b"}]
        });
        let record = normalize_with(&raw, 2024, reversed).unwrap();
        assert_eq!(record.home_team_id, "b");
        assert_eq!(record.away_team_id, "a");
    }
}
