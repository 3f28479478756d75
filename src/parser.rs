use crate::error::{OddsError, Result};
use crate::models::{MatchRecord, Weather, WinProbabilities};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Key holding the match list in a line feed payload
const MATCH_LIST_KEY: &str = "Value";

/// Parse a raw line feed payload into normalized match records.
///
/// Entries without both team names are dropped; every other field is
/// best-effort. `requested_sport` fills in the sport id for entries that
/// don't carry one, since a payload is scoped to the sport it was asked for.
pub fn parse_matches(payload: &Value, requested_sport: u32) -> Result<Vec<MatchRecord>> {
    let entries = match payload.get(MATCH_LIST_KEY) {
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(OddsError::MalformedPayload(format!(
                "\"{}\" is not a list",
                MATCH_LIST_KEY
            )))
        }
        None => {
            let upstream_error = payload
                .get("Error")
                .and_then(Value::as_str)
                .filter(|e| !e.trim().is_empty());
            return Err(OddsError::MalformedPayload(match upstream_error {
                Some(e) => format!("missing \"{}\" (upstream error: {})", MATCH_LIST_KEY, e),
                None => format!("missing \"{}\"", MATCH_LIST_KEY),
            }));
        }
    };

    let records: Vec<MatchRecord> = entries
        .iter()
        .filter_map(|entry| {
            let record = entry
                .as_object()
                .and_then(|obj| parse_entry(obj, requested_sport));
            if record.is_none() {
                debug!(id = ?entry.get("I"), "dropping match entry without both teams");
            }
            record
        })
        .collect();

    debug!(
        kept = records.len(),
        dropped = entries.len() - records.len(),
        "parsed line feed payload"
    );
    Ok(records)
}

fn parse_entry(entry: &Map<String, Value>, requested_sport: u32) -> Option<MatchRecord> {
    let home_team = text_field(entry, &["O1", "O1E"])?;
    let away_team = text_field(entry, &["O2", "O2E"])?;

    let venue_info = entry.get("MIO").and_then(Value::as_object);

    Some(MatchRecord {
        id: entry.get("I").and_then(id_string),
        home_team,
        away_team,
        league: text_field(entry, &["LE", "L"]).unwrap_or_default(),
        sport_id: entry
            .get("SI")
            .and_then(as_u32)
            .unwrap_or(requested_sport),
        sport_name: text_field(entry, &["SE", "SN"]),
        country: text_field(entry, &["CN"]),
        start_time: entry.get("S").and_then(start_time),
        is_live: entry.get("SS").and_then(Value::as_i64) == Some(1),
        venue: venue_info.and_then(|mio| text_field(mio, &["Loc"])),
        stage: venue_info.and_then(|mio| text_field(mio, &["TSt"])),
        home_team_id: entry.get("O1I").and_then(as_team_id),
        away_team_id: entry.get("O2I").and_then(as_team_id),
        event_count: entry.get("EC").and_then(as_u32),
        win_probabilities: entry
            .get("WP")
            .and_then(Value::as_object)
            .and_then(win_probabilities),
        weather: entry
            .get("MIS")
            .and_then(Value::as_array)
            .and_then(|items| weather(items)),
        odds: parse_odds(entry),
    })
}

/// First non-blank string among `keys`, kept as upstream sent it
fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Upstream uses 0 for "no team id"
fn as_team_id(value: &Value) -> Option<u64> {
    let id = match value {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (id != 0).then_some(id)
}

/// Numbers and numeric strings, finite only
fn as_price(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    price.is_finite().then_some(price)
}

/// Epoch seconds (number or numeric string) or an RFC 3339 string. Zero means unset.
fn start_time(value: &Value) -> Option<DateTime<Utc>> {
    let epoch = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_seconds)),
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(secs) => Some(secs),
            Err(_) => match s.trim().parse::<f64>() {
                Ok(secs) => whole_seconds(secs),
                Err(_) => {
                    return DateTime::parse_from_rfc3339(s.trim())
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc))
                }
            },
        },
        _ => None,
    }?;

    if epoch <= 0 {
        return None;
    }
    DateTime::from_timestamp(epoch, 0)
}

/// `1700000000.0` counts as an epoch; fractional seconds don't
fn whole_seconds(secs: f64) -> Option<i64> {
    (secs.is_finite() && secs.fract() == 0.0 && secs.abs() < i64::MAX as f64).then_some(secs as i64)
}

fn win_probabilities(wp: &Map<String, Value>) -> Option<WinProbabilities> {
    let probabilities = WinProbabilities {
        home_win: wp.get("P1").and_then(as_price),
        draw: wp.get("PX").and_then(as_price),
        away_win: wp.get("P2").and_then(as_price),
    };
    (probabilities != WinProbabilities::default()).then_some(probabilities)
}

/// `MIS` is a list of `{K, V}` pairs; only the weather keys are picked up
fn weather(items: &[Value]) -> Option<Weather> {
    let mut weather = Weather::default();
    for item in items {
        let Some(value) = item.get("V").and_then(scalar_text) else {
            continue;
        };
        let slot = match item.get("K").and_then(Value::as_i64) {
            Some(9) => &mut weather.temperature,
            Some(21) => &mut weather.condition,
            Some(27) => &mut weather.humidity,
            Some(23) => &mut weather.wind_speed,
            Some(25) => &mut weather.pressure,
            Some(35) => &mut weather.precipitation,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }
    (weather != Weather::default()).then_some(weather)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Outcome label: the outcome type, with the market parameter when there is one
fn outcome_label(outcome: &Map<String, Value>) -> Option<String> {
    let kind = match outcome.get("T")? {
        Value::Number(n) => n.to_string(),
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => return None,
    };

    match outcome.get("P") {
        Some(Value::Number(p)) => Some(format!("{}({})", kind, p)),
        Some(Value::String(p)) if !p.trim().is_empty() => Some(format!("{}({})", kind, p.trim())),
        _ => Some(kind),
    }
}

fn parse_odds(entry: &Map<String, Value>) -> BTreeMap<String, f64> {
    let main_outcomes = entry
        .get("E")
        .and_then(Value::as_array)
        .into_iter()
        .flatten();

    let grouped_outcomes = entry
        .get("AE")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|group| group.get("ME").and_then(Value::as_array))
        .flatten();

    let mut odds = BTreeMap::new();
    for outcome in main_outcomes.chain(grouped_outcomes) {
        let Some(outcome) = outcome.as_object() else {
            continue;
        };
        let (Some(label), Some(price)) = (outcome_label(outcome), outcome.get("C").and_then(as_price))
        else {
            continue;
        };
        odds.entry(label).or_insert(price);
    }
    odds
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_basic_entry() {
        let payload = json!({"Value": [{"O1": "Team A", "O2": "Team B", "LE": "League X", "E": [{"T": "1", "C": "1.85"}]}]});
        let records = parse_matches(&payload, 66).unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.home_team, "Team A");
        assert_eq!(record.away_team, "Team B");
        assert_eq!(record.league, "League X");
        assert_eq!(record.odds.len(), 1);
        assert_eq!(record.odds["1"], 1.85);
        assert_eq!(record.sport_id, 66);
        assert_eq!(record.start_time, None);
    }

    #[test]
    fn test_missing_away_team_drops_only_that_entry() {
        let payload = json!({"Value": [
            {"I": 1, "O1": "Alpha", "O2": "Beta"},
            {"I": 2, "O1": "Gamma"},
            {"I": 3, "O1": "Delta", "O2": "   "},
            {"I": 4, "O1": "Epsilon", "O2": "Zeta"}
        ]});
        let records = parse_matches(&payload, 1).unwrap();

        let ids: Vec<_> = records.iter().map(|r| r.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["1", "4"]);
    }

    #[test]
    fn test_no_drops_when_all_entries_have_teams() {
        let entries: Vec<_> = (0..25)
            .map(|i| json!({"I": i, "O1": format!("Home {}", i), "O2": format!("Away {}", i)}))
            .collect();
        let payload = json!({ "Value": entries });
        let records = parse_matches(&payload, 1).unwrap();

        assert_eq!(records.len(), 25);
        assert_eq!(records[7].home_team, "Home 7");
    }

    #[test]
    fn test_missing_or_non_list_value_is_malformed() {
        let err = parse_matches(&json!({"Success": true}), 1).unwrap_err();
        assert!(matches!(err, OddsError::MalformedPayload(_)));

        let err = parse_matches(&json!({"Value": {"O1": "A"}}), 1).unwrap_err();
        assert!(matches!(err, OddsError::MalformedPayload(_)));

        let err = parse_matches(&json!({"Error": "Access denied", "Success": false}), 1).unwrap_err();
        assert!(err.to_string().contains("Access denied"));
    }

    #[test]
    fn test_non_object_entries_are_skipped() {
        let payload = json!({"Value": [42, "junk", null, {"O1": "A", "O2": "B"}]});
        assert_eq!(parse_matches(&payload, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_bad_prices_are_skipped_individually() {
        let payload = json!({"Value": [{
            "O1": "A", "O2": "B",
            "E": [
                {"T": 1, "C": 2.1},
                {"T": 2, "C": "n/a"},
                {"T": 3},
                {"C": 1.5},
                {"T": 9, "C": 1.9, "P": 2.5}
            ]
        }]});
        let records = parse_matches(&payload, 1).unwrap();
        let odds = &records[0].odds;

        assert_eq!(odds.len(), 2);
        assert_eq!(odds["1"], 2.1);
        assert_eq!(odds["9(2.5)"], 1.9);
    }

    #[test]
    fn test_additional_market_groups_do_not_override_main_markets() {
        let payload = json!({"Value": [{
            "O1": "A", "O2": "B",
            "E": [{"T": 1, "C": 2.0}],
            "AE": [
                {"G": 1, "ME": [{"T": 1, "C": 9.9}, {"T": 3, "C": 3.4}]},
                {"G": 17, "ME": [{"T": 7, "C": 1.8, "P": -1.5}]},
                {"G": 62}
            ]
        }]});
        let odds = &parse_matches(&payload, 1).unwrap()[0].odds;

        assert_eq!(odds["1"], 2.0);
        assert_eq!(odds["3"], 3.4);
        assert_eq!(odds["7(-1.5)"], 1.8);
    }

    #[test]
    fn test_optional_fields_and_fallbacks() {
        let payload = json!({"Value": [{
            "I": "abc-1",
            "O1E": "Mumbai Indians",
            "O2": "Chennai Super Kings",
            "L": "Indian Premier League",
            "SI": 66,
            "SE": "Cricket",
            "CN": "India",
            "S": 1_700_000_000,
            "SS": 1,
            "MIO": {"Loc": "Wankhede Stadium", "TSt": "Group stage"}
        }]});
        let record = &parse_matches(&payload, 1).unwrap()[0];

        assert_eq!(record.id.as_deref(), Some("abc-1"));
        assert_eq!(record.home_team, "Mumbai Indians");
        assert_eq!(record.league, "Indian Premier League");
        assert_eq!(record.sport_id, 66);
        assert_eq!(record.sport_name.as_deref(), Some("Cricket"));
        assert_eq!(record.country.as_deref(), Some("India"));
        assert_eq!(record.start_time.unwrap().timestamp(), 1_700_000_000);
        assert!(record.is_live);
        assert_eq!(record.venue.as_deref(), Some("Wankhede Stadium"));
        assert_eq!(record.stage.as_deref(), Some("Group stage"));
        assert!(record.odds.is_empty());
    }

    #[test]
    fn test_start_time_is_never_fabricated() {
        let payload = json!({"Value": [
            {"O1": "A", "O2": "B", "S": 0},
            {"O1": "A", "O2": "B", "S": "tomorrow"},
            {"O1": "A", "O2": "B", "S": "2024-05-01T18:30:00Z"},
            {"O1": "A", "O2": "B", "S": "1700000000"}
        ]});
        let records = parse_matches(&payload, 1).unwrap();

        assert_eq!(records[0].start_time, None);
        assert_eq!(records[1].start_time, None);
        assert_eq!(
            records[2].start_time.unwrap().to_rfc3339(),
            "2024-05-01T18:30:00+00:00"
        );
        assert_eq!(records[3].start_time.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_integral_float_epoch_is_accepted() {
        let payload = json!({"Value": [
            {"O1": "A", "O2": "B", "S": 1_700_000_000.0},
            {"O1": "A", "O2": "B", "S": "1700000000.0"},
            {"O1": "A", "O2": "B", "S": 1_700_000_000.5}
        ]});
        let records = parse_matches(&payload, 1).unwrap();

        assert_eq!(records[0].start_time.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(records[1].start_time.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(records[2].start_time, None);
    }

    #[test]
    fn test_text_is_stored_untrimmed() {
        let payload = json!({"Value": [{
            "O1": "  Real Madrid ",
            "O2": "Barcelona\t",
            "LE": " La Liga",
            "MIO": {"Loc": "Santiago Bernabéu  "}
        }]});
        let record = &parse_matches(&payload, 1).unwrap()[0];

        assert_eq!(record.home_team, "  Real Madrid ");
        assert_eq!(record.away_team, "Barcelona\t");
        assert_eq!(record.league, " La Liga");
        assert_eq!(record.venue.as_deref(), Some("Santiago Bernabéu  "));
    }

    #[test]
    fn test_team_ids_probabilities_weather_and_event_count() {
        let payload = json!({"Value": [
            {
                "O1": "Arsenal", "O2": "Chelsea",
                "O1I": 2522, "O2I": "2590",
                "EC": 214,
                "WP": {"P1": 0.47, "PX": "0.27", "P2": 0.26},
                "MIS": [
                    {"K": 9, "V": "+18"},
                    {"K": 21, "V": "Cloudy"},
                    {"K": 27, "V": 72},
                    {"K": 23, "V": "4 m/s"},
                    {"K": 25, "V": "760"},
                    {"K": 35, "V": "10%"},
                    {"K": 2, "V": "Emirates Stadium"}
                ]
            },
            {
                "O1": "A", "O2": "B",
                "O1I": 0,
                "WP": {},
                "MIS": [{"K": 2, "V": "Somewhere"}]
            }
        ]});
        let records = parse_matches(&payload, 1).unwrap();

        let full = &records[0];
        assert_eq!(full.home_team_id, Some(2522));
        assert_eq!(full.away_team_id, Some(2590));
        assert_eq!(full.event_count, Some(214));
        assert_eq!(
            full.win_probabilities,
            Some(WinProbabilities {
                home_win: Some(0.47),
                draw: Some(0.27),
                away_win: Some(0.26),
            })
        );
        let weather = full.weather.as_ref().unwrap();
        assert_eq!(weather.temperature.as_deref(), Some("+18"));
        assert_eq!(weather.condition.as_deref(), Some("Cloudy"));
        assert_eq!(weather.humidity.as_deref(), Some("72"));
        assert_eq!(weather.wind_speed.as_deref(), Some("4 m/s"));
        assert_eq!(weather.pressure.as_deref(), Some("760"));
        assert_eq!(weather.precipitation.as_deref(), Some("10%"));

        let bare = &records[1];
        assert_eq!(bare.home_team_id, None);
        assert_eq!(bare.away_team_id, None);
        assert_eq!(bare.event_count, None);
        assert_eq!(bare.win_probabilities, None);
        assert_eq!(bare.weather, None);
    }

    #[test]
    fn test_non_ascii_text_is_preserved() {
        let payload = json!({"Value": [{
            "O1": "Atlético Madrid",
            "O2": "Bayern München",
            "LE": "Лига чемпионов УЕФА",
            "CN": "España"
        }]});
        let record = &parse_matches(&payload, 1).unwrap()[0];

        assert_eq!(record.home_team, "Atlético Madrid");
        assert_eq!(record.away_team, "Bayern München");
        assert_eq!(record.league, "Лига чемпионов УЕФА");
        assert_eq!(record.country.as_deref(), Some("España"));
    }
}
