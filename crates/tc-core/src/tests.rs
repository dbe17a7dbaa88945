//! Unit tests for tc-core primitives.

#[cfg(test)]
mod ids {
    use std::collections::HashMap;

    use crate::{EdgeId, RouteId, VehicleId, VehicleTypeId};

    #[test]
    fn roster_naming() {
        let ty = VehicleTypeId::from("human");
        assert_eq!(VehicleId::for_roster(&ty, 3).as_str(), "human_3");
    }

    #[test]
    fn route_for_edge() {
        assert_eq!(RouteId::for_edge(&EdgeId::from("bottom")).as_str(), "routebottom");
    }

    #[test]
    fn borrow_as_str_key() {
        let mut map = HashMap::new();
        map.insert(VehicleId::from("rl_0"), 1);
        assert_eq!(map.get("rl_0"), Some(&1));
    }

    #[test]
    fn empty_means_nothing() {
        assert!(VehicleId::default().is_empty());
        assert!(!VehicleId::from("a").is_empty());
    }

    #[test]
    fn display_is_raw_string() {
        assert_eq!(EdgeId::from(":center_0").to_string(), ":center_0");
    }
}

#[cfg(test)]
mod time {
    use crate::EpisodeClock;

    #[test]
    fn advance_bumps_both_counters() {
        let mut clock = EpisodeClock::new(0.1);
        clock.advance();
        clock.advance();
        assert_eq!(clock.time_counter, 2);
        assert_eq!(clock.step_counter, 2);
        assert!((clock.elapsed_secs() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn episode_reset_keeps_global_counter() {
        let mut clock = EpisodeClock::new(1.0);
        for _ in 0..5 {
            clock.advance();
        }
        clock.reset_episode();
        assert_eq!(clock.time_counter, 0);
        assert_eq!(clock.step_counter, 5);
        clock.reset_process();
        assert_eq!(clock.step_counter, 0);
    }

    #[test]
    fn restart_threshold_is_strict() {
        let mut clock = EpisodeClock::new(1.0);
        for _ in 0..3 {
            clock.advance();
        }
        assert!(!clock.needs_restart(3));
        clock.advance();
        assert!(clock.needs_restart(3));
    }
}

#[cfg(test)]
mod rng {
    use crate::SimRng;

    #[test]
    fn deterministic() {
        let mut a = SimRng::new(42);
        let mut b = SimRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.uniform(0.0, 1_000.0), b.uniform(0.0, 1_000.0));
            assert_eq!(a.index(97), b.index(97));
        }
    }

    #[test]
    fn uniform_bounds() {
        let mut rng = SimRng::new(7);
        for _ in 0..1_000 {
            let x = rng.uniform(0.0, 230.0);
            assert!((0.0..230.0).contains(&x));
        }
        assert_eq!(rng.uniform(5.0, 5.0), 5.0);
    }

    #[test]
    fn shuffle_is_permutation() {
        let mut rng = SimRng::new(1);
        let mut v: Vec<u32> = (0..20).collect();
        rng.shuffle(&mut v);
        let mut sorted = v.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn index_of_empty_is_zero() {
        let mut rng = SimRng::new(0);
        assert_eq!(rng.index(0), 0);
        assert!(rng.index(6) < 6);
    }
}

#[cfg(test)]
mod params {
    use std::time::Duration;

    use crate::{CoreError, EngineParams, EnvParams};

    #[test]
    fn engine_defaults() {
        let p = EngineParams::default();
        assert_eq!(p.launch_retries, 10);
        assert_eq!(p.connect_retries, 100);
        assert!(p.port.is_none());
        assert_eq!(p.settle_duration(), Duration::from_secs(1));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_mode_shortens_settle() {
        let p = EngineParams { test_mode: true, ..Default::default() };
        assert_eq!(p.settle_duration(), Duration::from_millis(100));
    }

    #[test]
    fn rejects_zero_step_length() {
        let p = EngineParams { step_length: 0.0, ..Default::default() };
        assert!(matches!(p.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn env_defaults() {
        let p = EnvParams::default();
        assert_eq!(p.restart_threshold, 2_000_000);
        assert_eq!(p.lane_change_hold_ms, 100_000);
        assert_eq!(p.lane_change_sentinel(), -5.0);
        assert!(p.validate().is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_keeps_defaults() {
        let p: EnvParams =
            serde_json::from_str(r#"{ "sort_vehicles": true, "seed": 9 }"#).unwrap();
        assert!(p.sort_vehicles);
        assert_eq!(p.seed, 9);
        assert_eq!(p.max_speed, EnvParams::default().max_speed);
    }
}
