//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `vehicle_states.csv`
//! - `step_summaries.csv`

use std::fs::{self, File};
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{OutputResult, StepSummaryRow, VehicleStateRow};

/// Writes trajectory output to two CSV files.
pub struct CsvWriter {
    states:    Writer<File>,
    summaries: Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Create `dir` if needed, open the two CSV files and write the header
    /// rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        fs::create_dir_all(dir)?;

        let mut states = Writer::from_path(dir.join("vehicle_states.csv"))?;
        states.write_record([
            "run",
            "time_counter",
            "time_secs",
            "vehicle_id",
            "type_id",
            "edge",
            "lane",
            "lane_position",
            "absolute_position",
            "speed",
            "leader_id",
            "leader_gap",
        ])?;

        let mut summaries = Writer::from_path(dir.join("step_summaries.csv"))?;
        summaries.write_record([
            "run",
            "time_counter",
            "time_secs",
            "vehicles",
            "mean_speed",
            "reward",
            "crashed",
        ])?;

        Ok(Self { states, summaries, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_vehicle_states(&mut self, rows: &[VehicleStateRow]) -> OutputResult<()> {
        for row in rows {
            self.states.write_record(&[
                row.run.to_string(),
                row.time_counter.to_string(),
                row.time_secs.to_string(),
                row.vehicle_id.clone(),
                row.type_id.clone(),
                row.edge.clone(),
                row.lane.to_string(),
                row.lane_position.to_string(),
                row.absolute_position.to_string(),
                row.speed.to_string(),
                row.leader_id.clone(),
                row.leader_gap.map(|g| g.to_string()).unwrap_or_default(),
            ])?;
        }
        Ok(())
    }

    fn write_step_summary(&mut self, row: &StepSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.run.to_string(),
            row.time_counter.to_string(),
            row.time_secs.to_string(),
            row.vehicles.to_string(),
            row.mean_speed.to_string(),
            row.reward.to_string(),
            (row.crashed as u8).to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.states.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
