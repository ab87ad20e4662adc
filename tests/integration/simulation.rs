//! End-to-end simulation harness tests.
//!
//! Drives the runner with scripted, mocked, and bundled strategies and
//! checks the table and the aggregated curves it produces.

use std::cell::Cell;
use std::rc::Rc;

use mockall::{mock, Sequence};

use bandit_lab::arm::{Arm, Payout};
use bandit_lab::config::AppConfig;
use bandit_lab::engine::{aggregate, rank, Runner};
use bandit_lab::report::format_aggregated_results;
use bandit_lab::strategy::uniform::UniformRandom;
use bandit_lab::strategy::Strategy;
use bandit_lab::types::{AggregationMode, ArmId, SimError};

use crate::mock_strategy::ScriptedStrategy;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn constant_arm(id: &str, probability: f64, value: f64) -> Arm {
    Arm::new(id, probability, Payout::constant(value)).unwrap().with_seed(1)
}

/// An always-active arm that counts how often it was pulled.
fn counting_arm(id: &str, value: f64, pulls: Rc<Cell<usize>>) -> Arm {
    let payout = Payout::custom(move || {
        pulls.set(pulls.get() + 1);
        value
    });
    Arm::new(id, 1.0, payout).unwrap().with_seed(2)
}

mock! {
    pub Bandit {}

    impl Strategy for Bandit {
        fn id(&self) -> &str;
        fn recommend(&mut self, size: usize) -> Vec<ArmId>;
        fn feedback(&mut self, arm_id: &str, payout: f64);
    }
}

// ---------------------------------------------------------------------------
// Engine properties
// ---------------------------------------------------------------------------

#[test]
fn test_pull_count_matches_runs_epochs_and_size() {
    let pulls = Rc::new(Cell::new(0));
    let arms: Vec<Arm> = (0..5)
        .map(|i| counting_arm(&format!("arm{i}"), i as f64, pulls.clone()))
        .collect();
    let ids: Vec<ArmId> = arms.iter().map(|a| a.id().to_string()).collect();

    let scripted = ScriptedStrategy::fixed("scripted", &["arm0", "arm3", "arm4"]);
    let log = scripted.log();
    let strategies: Vec<Box<dyn Strategy>> = vec![
        Box::new(UniformRandom::with_seed("random", ids, 17)),
        Box::new(scripted),
    ];
    let mut runner = Runner::new(arms, strategies).unwrap();

    let (runs, epochs, size) = (4, 25, 3);
    runner.simulate(runs, epochs, size).unwrap();

    assert_eq!(pulls.get(), 2 * runs * epochs * size);
    let log = log.borrow();
    assert_eq!(log.recommend_calls(), runs * epochs);
    assert_eq!(log.feedback_calls(), runs * epochs * size);
}

#[test]
fn test_epoch_totals_match_feedback() {
    let arms = vec![
        Arm::new("g", 0.7, Payout::normal(3.0, 2.0).unwrap()).unwrap().with_seed(10),
        Arm::new("u", 0.4, Payout::uniform(0.0, 5.0).unwrap()).unwrap().with_seed(11),
        Arm::new("e", 0.9, Payout::exponential(0.5).unwrap()).unwrap().with_seed(12),
    ];
    let script: &[&[&str]] = &[&["g", "u"], &["e"], &["u", "e", "g"]];
    let scripted = ScriptedStrategy::new("s", script);
    let log = scripted.log();
    let mut runner = Runner::new(arms, vec![Box::new(scripted)]).unwrap();

    let results = runner.simulate(3, 9, 3).unwrap();
    let recorded: Vec<f64> = results.get("s").unwrap().iter().flatten().copied().collect();
    let fed_back = log.borrow().epoch_totals();

    assert_eq!(recorded.len(), 27);
    for (table, feedback) in recorded.iter().zip(&fed_back) {
        assert!((table - feedback).abs() < 1e-12, "{table} != {feedback}");
    }
    // feedback arrives per arm in recommendation order
    let log = log.borrow();
    for (rec, fb) in log.recommendations.iter().zip(&log.feedback) {
        let fed: Vec<&String> = fb.iter().map(|(id, _)| id).collect();
        assert_eq!(fed, rec.iter().collect::<Vec<_>>());
        assert!(fb.iter().all(|(_, p)| *p >= 0.0));
    }
}

#[test]
fn test_feedback_sequence_with_mock() {
    let mut mock = MockBandit::new();
    let mut seq = Sequence::new();
    mock.expect_id().return_const("mock".to_owned());
    mock.expect_recommend()
        .withf(|size| *size == 2)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| vec!["hi".to_string(), "lo".to_string()]);
    mock.expect_feedback()
        .withf(|arm_id, payout| arm_id.to_string() == "hi" && *payout == 7.0)
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    mock.expect_feedback()
        .withf(|arm_id, payout| arm_id.to_string() == "lo" && *payout == 0.0)
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());

    let arms = vec![constant_arm("hi", 1.0, 7.0), constant_arm("lo", 0.0, 7.0)];
    let mut runner = Runner::new(arms, vec![Box::new(mock)]).unwrap();
    let results = runner.simulate(1, 1, 2).unwrap();
    assert_eq!(results.get("mock").unwrap(), &[vec![7.0]]);
}

#[test]
fn test_duplicate_recommendation_aborts_before_payout() {
    let good = ScriptedStrategy::fixed("good", &["a"]);
    let good_log = good.log();
    let broken = ScriptedStrategy::fixed("broken", &["a", "a"]);
    let broken_log = broken.log();
    let after = ScriptedStrategy::fixed("after", &["a"]);
    let after_log = after.log();

    let mut runner = Runner::new(
        vec![constant_arm("a", 1.0, 1.0)],
        vec![Box::new(good), Box::new(broken), Box::new(after)],
    )
    .unwrap();

    let err = runner.simulate(2, 3, 2).unwrap_err();
    match err {
        SimError::DuplicateRecommendation { strategy, run, epoch, recommendation } => {
            assert_eq!(strategy, "broken");
            assert_eq!((run, epoch), (0, 0));
            assert_eq!(recommendation, vec!["a".to_string(), "a".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(good_log.borrow().recommend_calls(), 6);
    assert_eq!(broken_log.borrow().feedback_calls(), 0);
    assert_eq!(after_log.borrow().recommend_calls(), 0);
}

#[test]
fn test_strategy_state_carries_across_runs() {
    // The runner never resets a strategy between runs: a script that only
    // misbehaves on its fifth call fails in run 1, epoch 1.
    let script: &[&[&str]] = &[&["a"], &["a"], &["a"], &["a"], &["a", "a"]];
    let strategy = ScriptedStrategy::new("stateful", script);
    let mut runner = Runner::new(vec![constant_arm("a", 1.0, 1.0)], vec![Box::new(strategy)]).unwrap();

    let err = runner.simulate(3, 3, 1).unwrap_err();
    assert!(matches!(err, SimError::DuplicateRecommendation { run: 1, epoch: 1, .. }));
}

// ---------------------------------------------------------------------------
// Pipeline scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_constant_arm_pipeline() {
    let mut runner = Runner::new(
        vec![constant_arm("a", 1.0, 5.0)],
        vec![Box::new(ScriptedStrategy::fixed("only", &["a"]))],
    )
    .unwrap();

    let results = runner.simulate(2, 3, 1).unwrap();
    assert_eq!(results.get("only").unwrap(), &[vec![5.0; 3], vec![5.0; 3]]);

    let avg = aggregate(&results, 2, 3, AggregationMode::Average).unwrap();
    assert_eq!(avg.get("only").unwrap(), &[5.0, 5.0, 5.0]);

    let cum = aggregate(&results, 2, 3, AggregationMode::Cumulative).unwrap();
    assert_eq!(cum.get("only").unwrap(), &[5.0, 10.0, 15.0]);
}

#[test]
fn test_dead_arm_pipeline_is_all_zero() {
    let mut runner = Runner::new(
        vec![constant_arm("dead", 0.0, 100.0)],
        vec![Box::new(ScriptedStrategy::fixed("s", &["dead"]))],
    )
    .unwrap();
    let results = runner.simulate(5, 20, 1).unwrap();
    for mode in [AggregationMode::Average, AggregationMode::Cumulative] {
        let agg = aggregate(&results, 5, 20, mode).unwrap();
        assert!(agg.get("s").unwrap().iter().all(|&v| v == 0.0));
    }
}

#[test]
fn test_best_arm_strategy_ranks_first() {
    let arms = vec![
        Arm::new("good", 0.8, Payout::uniform(2.0, 4.0).unwrap()).unwrap().with_seed(21),
        Arm::new("bad", 0.2, Payout::uniform(0.0, 1.0).unwrap()).unwrap().with_seed(22),
    ];
    let strategies: Vec<Box<dyn Strategy>> = vec![
        Box::new(ScriptedStrategy::fixed("always-bad", &["bad"])),
        Box::new(UniformRandom::with_seed("random", vec!["good".into(), "bad".into()], 23)),
        Box::new(ScriptedStrategy::fixed("always-good", &["good"])),
    ];
    let mut runner = Runner::new(arms, strategies).unwrap();
    let results = runner.simulate(10, 100, 1).unwrap();

    let cum = aggregate(&results, 10, 100, AggregationMode::Cumulative).unwrap();
    let order: Vec<&str> = rank(&cum).into_iter().map(|(id, _)| id).collect();
    assert_eq!(order, vec!["always-good", "random", "always-bad"]);

    let listing = format_aggregated_results(&cum);
    let first_line = listing.lines().find(|l| l.contains(':') && !l.starts_with("Aggregated")).unwrap();
    assert!(first_line.starts_with("always-good:"));
}

#[test]
fn test_seeded_config_is_reproducible() {
    let cfg = AppConfig::from_toml(
        r#"
[simulation]
runs = 3
epochs = 15
recommendation_size = 2
seed = 99

[[arms]]
id = "a"
activation_probability = 0.6
payout = { kind = "normal", mean = 2.0, std_dev = 1.0 }

[[arms]]
id = "b"
activation_probability = 0.3
payout = { kind = "exponential", rate = 0.25 }

[[arms]]
id = "c"
activation_probability = 1.0
payout = { kind = "constant", value = 0.5 }

[[strategies]]
id = "r1"
kind = "uniform_random"

[[strategies]]
id = "r2"
kind = "uniform_random"
"#,
    )
    .unwrap();

    let run_once = || {
        let mut runner = Runner::new(cfg.build_arms().unwrap(), cfg.build_strategies()).unwrap();
        runner.simulate(3, 15, 2).unwrap()
    };
    let first = run_once();
    let second = run_once();
    assert_eq!(first, second);
    assert_eq!(first.strategy_ids(), vec!["r1", "r2"]);

    let agg = aggregate(&first, 3, 15, cfg.simulation.mode).unwrap();
    assert_eq!(agg.mode, AggregationMode::Cumulative);
    assert_eq!(agg.len(), 2);
}
