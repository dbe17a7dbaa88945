//! Unit tests for tc-output.

// ── CsvWriter ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_writer {
    use tempfile::tempdir;

    use crate::{CsvWriter, OutputWriter, StepSummaryRow, VehicleStateRow};

    fn state_row(id: &str, time_counter: u64, leader: Option<(&str, f64)>) -> VehicleStateRow {
        VehicleStateRow {
            run: 0,
            time_counter,
            time_secs: time_counter as f64 * 0.1,
            vehicle_id: id.into(),
            type_id: "human".into(),
            edge: "e0".into(),
            lane: 1,
            lane_position: 12.5,
            absolute_position: 12.5,
            speed: 4.0,
            leader_id: leader.map(|(l, _)| l.to_string()).unwrap_or_default(),
            leader_gap: leader.map(|(_, g)| g),
        }
    }

    #[test]
    fn headers_written_on_creation() {
        let dir = tempdir().unwrap();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        let mut r = csv::Reader::from_path(dir.path().join("vehicle_states.csv")).unwrap();
        let headers = r.headers().unwrap().clone();
        assert_eq!(&headers[0], "run");
        assert_eq!(&headers[3], "vehicle_id");
        assert_eq!(&headers[11], "leader_gap");
        assert_eq!(r.records().count(), 0);

        let mut r = csv::Reader::from_path(dir.path().join("step_summaries.csv")).unwrap();
        assert_eq!(r.headers().unwrap().len(), 7);
    }

    #[test]
    fn creates_missing_output_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        CsvWriter::new(&nested).unwrap();
        assert!(nested.join("vehicle_states.csv").exists());
        assert!(nested.join("step_summaries.csv").exists());
    }

    #[test]
    fn missing_leader_written_as_empty_fields() {
        let dir = tempdir().unwrap();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_vehicle_states(&[state_row("human_0", 3, None), state_row("human_1", 3, Some(("human_0", 7.5)))])
            .unwrap();
        w.finish().unwrap();

        let mut r = csv::Reader::from_path(dir.path().join("vehicle_states.csv")).unwrap();
        let records: Vec<_> = r.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][10], "");
        assert_eq!(&records[0][11], "");
        assert_eq!(&records[1][10], "human_0");
        assert_eq!(&records[1][11], "7.5");
    }

    #[test]
    fn summary_crash_flag_is_numeric() {
        let dir = tempdir().unwrap();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        let row = StepSummaryRow {
            run: 2,
            time_counter: 9,
            time_secs: 0.9,
            vehicles: 4,
            mean_speed: 5.0,
            reward: -1.5,
            crashed: true,
        };
        w.write_step_summary(&row).unwrap();
        w.finish().unwrap();

        let mut r = csv::Reader::from_path(dir.path().join("step_summaries.csv")).unwrap();
        let rec = r.records().next().unwrap().unwrap();
        assert_eq!(&rec[0], "2");
        assert_eq!(&rec[3], "4");
        assert_eq!(&rec[5], "-1.5");
        assert_eq!(&rec[6], "1");
    }

    #[test]
    fn finish_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }
}

// ── EnvOutputObserver ─────────────────────────────────────────────────────────

#[cfg(test)]
mod observer {
    use std::sync::Arc;

    use tc_control::{ConstantAccel, Controllers, Roster};
    use tc_core::{EngineParams, EnvParams};
    use tc_engine::mock::{MockEngine, MockLauncher, MockScenario};
    use tc_env::{EnvBuilder, Experiment, PassiveTask};
    use tc_scenario::EdgeNetwork;
    use tempfile::tempdir;

    use crate::{
        CsvWriter, EnvOutputObserver, OutputError, OutputResult, OutputWriter, StepSummaryRow,
        VehicleStateRow,
    };

    /// Collects rows in memory; optionally fails every write.
    #[derive(Default)]
    struct Recording {
        states:    Vec<VehicleStateRow>,
        summaries: Vec<StepSummaryRow>,
        finishes:  usize,
        fail:      bool,
    }

    impl OutputWriter for Recording {
        fn write_vehicle_states(&mut self, rows: &[VehicleStateRow]) -> OutputResult<()> {
            if self.fail {
                return Err(OutputError::Io(std::io::Error::other("disk full")));
            }
            self.states.extend_from_slice(rows);
            Ok(())
        }

        fn write_step_summary(&mut self, row: &StepSummaryRow) -> OutputResult<()> {
            if self.fail {
                return Err(OutputError::Io(std::io::Error::other("disk full")));
            }
            self.summaries.push(*row);
            Ok(())
        }

        fn finish(&mut self) -> OutputResult<()> {
            self.finishes += 1;
            Ok(())
        }
    }

    fn experiment() -> Experiment<EdgeNetwork, MockEngine, PassiveTask, MockLauncher> {
        let net = Arc::new(EdgeNetwork::ring("ring", 4, 50.0, 1).unwrap());
        let roster = Roster::new().add("human", 4, Controllers::none().with_acceleration(ConstantAccel(0.0)));
        let engine = MockEngine::new(
            MockScenario::new(Arc::clone(&net), 0.1)
                .wrap_routes(true)
                .with_evenly_spaced(&roster.ids_with_types(), 5.0)
                .unwrap(),
        );
        let env = EnvBuilder::new(net, engine, PassiveTask)
            .roster(roster)
            .engine_params(EngineParams {
                settle_secs: 0.0,
                connect_retry_delay_ms: 0,
                ..EngineParams::default()
            })
            .env_params(EnvParams::default())
            .launcher(MockLauncher::default())
            .build()
            .unwrap();
        Experiment::new(env)
    }

    #[test]
    fn writes_state_every_step_and_summary_per_step() {
        let mut exp = experiment();
        let mut obs = EnvOutputObserver::new(Recording::default());
        exp.run(1, 5, |_| (), &mut obs).unwrap();
        assert!(obs.take_error().is_none());

        let rec = obs.into_writer();
        // Reset snapshot plus five steps, four vehicles each.
        assert_eq!(rec.states.len(), 6 * 4);
        assert_eq!(rec.summaries.len(), 5);
        assert_eq!(rec.finishes, 1);
        let counters: Vec<u64> = rec.summaries.iter().map(|s| s.time_counter).collect();
        assert_eq!(counters, vec![1, 2, 3, 4, 5]);
        assert!(rec.summaries.iter().all(|s| s.vehicles == 4 && !s.crashed));
        assert!(rec.states.iter().all(|s| s.edge.starts_with('e')));
    }

    #[test]
    fn state_interval_thins_vehicle_rows() {
        let mut exp = experiment();
        let mut obs = EnvOutputObserver::new(Recording::default()).with_state_interval(2);
        exp.run(2, 4, |_| (), &mut obs).unwrap();

        let rec = obs.into_writer();
        // Per run: reset (t=0), t=2, t=4.
        assert_eq!(rec.states.len(), 2 * 3 * 4);
        assert_eq!(rec.summaries.len(), 8);
        assert!(rec.states.iter().all(|s| s.time_counter % 2 == 0));
        assert_eq!(rec.summaries.iter().filter(|s| s.run == 1).count(), 4);
    }

    #[test]
    fn zero_interval_writes_summaries_only() {
        let mut exp = experiment();
        let mut obs = EnvOutputObserver::new(Recording::default()).with_state_interval(0);
        exp.run(1, 3, |_| (), &mut obs).unwrap();

        let rec = obs.into_writer();
        assert!(rec.states.is_empty());
        assert_eq!(rec.summaries.len(), 3);
    }

    #[test]
    fn first_write_error_is_kept_until_taken() {
        let mut exp = experiment();
        let mut obs = EnvOutputObserver::new(Recording { fail: true, ..Recording::default() });
        exp.run(1, 3, |_| (), &mut obs).unwrap();

        assert!(matches!(obs.take_error(), Some(OutputError::Io(_))));
        assert!(obs.take_error().is_none());
    }

    #[test]
    fn csv_round_trip_through_experiment() {
        let dir = tempdir().unwrap();
        let mut exp = experiment();
        let mut obs = EnvOutputObserver::new(CsvWriter::new(dir.path()).unwrap());
        exp.run(1, 3, |_| (), &mut obs).unwrap();
        assert!(obs.take_error().is_none());

        let mut r = csv::Reader::from_path(dir.path().join("vehicle_states.csv")).unwrap();
        assert_eq!(r.records().count(), 4 * 4);
        let mut r = csv::Reader::from_path(dir.path().join("step_summaries.csv")).unwrap();
        let speeds: Vec<f64> = r.records().map(|rec| rec.unwrap()[4].parse().unwrap()).collect();
        assert_eq!(speeds.len(), 3);
        // Constant zero acceleration keeps everyone at 5 m/s.
        assert!(speeds.iter().all(|s| (s - 5.0).abs() < 1e-9));
    }
}
