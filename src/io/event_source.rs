//! Event source - loads extracted travel events from disk
//!
//! Accepts either a JSON array of events or JSON Lines (one event per
//! line). A bad line in a JSONL file is skipped; a bad array is an error.

use crate::domain::event::TravelEvent;
use anyhow::Context;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Load events from a JSON array or JSONL file
pub fn load_events<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<TravelEvent>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read events file {}", path.display()))?;

    let events = parse_events(&content)
        .with_context(|| format!("Failed to parse events file {}", path.display()))?;

    info!(file = %path.display(), events = %events.len(), "events_loaded");
    Ok(events)
}

/// Parse events from file content, detecting the layout from the first
/// non-whitespace character
pub fn parse_events(content: &str) -> anyhow::Result<Vec<TravelEvent>> {
    if content.trim_start().starts_with('[') {
        let events: Vec<TravelEvent> =
            serde_json::from_str(content).context("Invalid JSON array of events")?;
        return Ok(events);
    }

    let mut events = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<TravelEvent>(line) {
            Ok(event) => events.push(event),
            Err(e) => {
                warn!(line = %line_no, error = %e, "event_line_skipped");
            }
        }
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::EventType;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_json_array() {
        let content = r#"[
            {"event_type": "flight", "start_date": "2024-03-01",
             "origin": {"city": "New York"}, "destination": {"city": "Barcelona"}},
            {"event_type": "HOTEL", "destination": {"city": "Barcelona"}}
        ]"#;

        let events = parse_events(content).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::Flight);
        assert_eq!(events[0].start_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(events[0].origin_city(), "New York");
        assert_eq!(events[1].event_type, EventType::Hotel);
        assert!(events[1].start_date.is_none());
    }

    #[test]
    fn test_parse_jsonl_skips_bad_lines() {
        let content = concat!(
            "{\"event_type\": \"rail\", \"origin\": {\"city\": \"Paris\"}}\n",
            "\n",
            "not json\n",
            "{\"event_type\": \"cruise\"}\n",
        );

        let events = parse_events(content).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::Rail);
        assert_eq!(events[1].event_type, EventType::Unknown("cruise".to_string()));
    }

    #[test]
    fn test_malformed_array_is_error() {
        assert!(parse_events("[{\"event_type\": \"flight\"").is_err());
    }

    #[test]
    fn test_load_events_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{\"event_type\": \"tour\", \"activity_name\": \"Alhambra\"}}").unwrap();

        let events = load_events(file.path()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].activity_name, "Alhambra");
    }

    #[test]
    fn test_load_events_missing_file() {
        let err = load_events("/nonexistent/events.json").unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read events file"));
    }

    #[test]
    fn test_empty_file_has_no_events() {
        assert!(parse_events("").unwrap().is_empty());
    }
}
