//! Itinerary egress - writes the assembled timeline to the output directory
//!
//! Two files are produced:
//! - `itinerary.json`: visits, gaps, and a summary, pretty-printed
//! - `travel_events.jsonl`: the deduplicated events, one JSON object per line

use crate::domain::event::EventRef;
use crate::services::pipeline::PipelineOutput;
use anyhow::Context;
use serde_json::json;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const ITINERARY_FILE: &str = "itinerary.json";
pub const EVENTS_FILE: &str = "travel_events.jsonl";

/// Egress writer for one output directory
pub struct Egress {
    dir: PathBuf,
}

impl Egress {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        info!(dir = %dir.display(), "egress_initialized");
        Self { dir }
    }

    pub fn itinerary_path(&self) -> PathBuf {
        self.dir.join(ITINERARY_FILE)
    }

    pub fn events_path(&self) -> PathBuf {
        self.dir.join(EVENTS_FILE)
    }

    /// Write both output files
    pub fn write_all(&self, output: &PipelineOutput) -> anyhow::Result<()> {
        self.write_itinerary(output)?;
        self.write_events(&output.events)?;
        Ok(())
    }

    /// Write `itinerary.json`
    pub fn write_itinerary(&self, output: &PipelineOutput) -> anyhow::Result<()> {
        self.ensure_dir()?;
        let path = self.itinerary_path();

        let document = itinerary_document(output);
        let content = serde_json::to_string_pretty(&document)?;
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;

        info!(
            file = %path.display(),
            visits = %output.visits.len(),
            gaps = %output.gaps.len(),
            "itinerary_written"
        );
        Ok(())
    }

    /// Write `travel_events.jsonl`, returning the number of lines written
    pub fn write_events(&self, events: &[EventRef]) -> anyhow::Result<usize> {
        self.ensure_dir()?;
        let path = self.events_path();

        let file =
            File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        for event in events {
            let line = serde_json::to_string(event.as_ref())?;
            writeln!(writer, "{}", line)?;
        }
        writer.flush().with_context(|| format!("Failed to write {}", path.display()))?;

        info!(file = %path.display(), events = %events.len(), "events_written");
        Ok(events.len())
    }

    fn ensure_dir(&self) -> anyhow::Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).with_context(|| {
                format!("Failed to create output directory {}", self.dir.display())
            })?;
            debug!(dir = %self.dir.display(), "egress_dir_created");
        }
        Ok(())
    }
}

/// Build the itinerary document for a pipeline run
pub fn itinerary_document(output: &PipelineOutput) -> serde_json::Value {
    let visits: Vec<serde_json::Value> = output.visits.iter().map(|v| v.to_json_value()).collect();
    let gaps: Vec<serde_json::Value> = output.gaps.iter().map(|g| g.to_json_value()).collect();

    json!({
        "visits": visits,
        "gaps": gaps,
        "summary": {
            "total_visits": output.visits.len(),
            "total_gaps": output.gaps.len(),
            "cities_visited": output.cities_visited(),
        },
    })
}
