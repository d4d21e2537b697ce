//! Training pipeline, observers and saved policies working together

use std::sync::Arc;

use racetrack::{
    Algorithm, CrashPolicy, Error, Grid, Learner, LearnerConfig, PolicyLearner, SavedPolicy,
    SarsaAgent, StartSelection, TrainingReport, ValueIterationAgent,
    pipeline::{JsonlObserver, Record, TrainingConfig, TrainingPipeline, TrainingSummary},
};
use tempfile::tempdir;

const CORRIDOR: &str = "5,5\n#####\n##F##\n##.##\n##S##\n#####\n";

fn corridor() -> Arc<Grid> {
    Arc::new(CORRIDOR.parse().unwrap())
}

fn read_records(path: &std::path::Path) -> Vec<Record> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn pipeline_exports_one_record_per_sweep() {
    let tmp = tempdir().unwrap();
    let jsonl = tmp.path().join("sweeps.jsonl");
    let summary_path = tmp.path().join("summary.json");

    let mut agent = ValueIterationAgent::new(
        corridor(),
        LearnerConfig::for_algorithm(Algorithm::ValueIteration),
    );
    let summary = TrainingPipeline::new(TrainingConfig::default().with_evaluation_runs(3))
        .with_observer(Box::new(JsonlObserver::new(&jsonl).unwrap()))
        .run(&mut agent)
        .unwrap();

    let records = read_records(&jsonl);
    assert_eq!(records.len(), summary.training.len());
    assert!(records.iter().all(|record| matches!(record, Record::Sweep { .. })));
    assert_eq!(summary.evaluation_success_rate, 1.0);

    summary.save(&summary_path).unwrap();
    let loaded = TrainingSummary::load(&summary_path).unwrap();
    assert_eq!(loaded, summary);
    assert_eq!(loaded.algorithm, Algorithm::ValueIteration);
}

#[test]
fn pipeline_exports_one_record_per_episode() {
    let tmp = tempdir().unwrap();
    let jsonl = tmp.path().join("episodes.jsonl");

    let config = LearnerConfig::for_algorithm(Algorithm::Sarsa).with_episodes(50);
    let mut agent = SarsaAgent::new(corridor(), config);
    let summary = TrainingPipeline::new(TrainingConfig::default().with_seed(8))
        .with_observer(Box::new(JsonlObserver::new(&jsonl).unwrap()))
        .run(&mut agent)
        .unwrap();

    let records = read_records(&jsonl);
    assert_eq!(records.len(), 50);
    let TrainingReport::Episodes { steps, .. } = &summary.training else {
        panic!("expected an episode report");
    };
    for (episode, (record, &expected)) in records.iter().zip(steps).enumerate() {
        match record {
            Record::Episode {
                episode: index,
                steps,
                ..
            } => {
                assert_eq!(*index, episode);
                assert_eq!(*steps, expected);
            }
            other => panic!("unexpected record {other:?}"),
        }
    }
    assert_eq!(summary.seed, Some(8));
}

#[test]
fn saved_policy_round_trips_through_disk() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("policy.json");
    let grid = corridor();

    let config = LearnerConfig::for_algorithm(Algorithm::ValueIteration)
        .with_crash_policy(CrashPolicy::Major);
    let mut agent = ValueIterationAgent::new(Arc::clone(&grid), config);
    TrainingPipeline::new(TrainingConfig::default())
        .run(&mut agent)
        .unwrap();

    let saved = agent.saved_policy();
    saved.save(&path).unwrap();
    let loaded = SavedPolicy::load(&path).unwrap();
    assert_eq!(loaded, saved);
    assert_eq!(loaded.crash_policy, CrashPolicy::Major);

    let mut frozen = PolicyLearner::new(grid, loaded, LearnerConfig::default()).unwrap();
    assert_eq!(frozen.crash_policy(), CrashPolicy::Major);
    let summary = TrainingPipeline::new(TrainingConfig::default().with_evaluation_runs(2))
        .run(&mut frozen)
        .unwrap();
    assert_eq!(summary.training, TrainingReport::Frozen);
    assert!(summary.evaluations.iter().all(|run| run.finished && run.steps == 2));
}

#[test]
fn frozen_policy_can_start_anywhere() {
    let grid = corridor();
    let mut agent = ValueIterationAgent::new(
        Arc::clone(&grid),
        LearnerConfig::for_algorithm(Algorithm::ValueIteration),
    );
    TrainingPipeline::new(TrainingConfig::default())
        .run(&mut agent)
        .unwrap();

    let config = LearnerConfig::default().with_evaluation_start(StartSelection::ValidCells);
    let mut frozen = PolicyLearner::new(grid, agent.saved_policy(), config).unwrap();
    let pipeline_config = TrainingConfig::default()
        .with_seed(1)
        .with_evaluation_runs(20);
    let summary = TrainingPipeline::new(pipeline_config)
        .run(&mut frozen)
        .unwrap();
    assert_eq!(summary.evaluation_success_rate, 1.0);
    assert!(summary.evaluations.iter().all(|run| run.steps <= 2));
}

#[test]
fn loading_rejects_unknown_version() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("policy.json");
    let agent = ValueIterationAgent::new(corridor(), LearnerConfig::default());

    let mut saved = agent.saved_policy();
    saved.version = 99;
    saved.save(&path).unwrap();

    assert!(matches!(
        SavedPolicy::load(&path),
        Err(Error::PolicyMismatch { .. })
    ));
}

#[test]
fn missing_policy_file_is_an_io_error() {
    let tmp = tempdir().unwrap();
    assert!(matches!(
        SavedPolicy::load(tmp.path().join("absent.json")),
        Err(Error::Io { .. })
    ));
}

#[test]
fn partial_config_file_keeps_defaults() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("config.json");
    std::fs::write(&path, r#"{ "episodes": 10, "crash_policy": "major" }"#).unwrap();

    let config = LearnerConfig::load(&path).unwrap();
    assert_eq!(config.episodes, 10);
    assert_eq!(config.crash_policy, CrashPolicy::Major);
    assert_eq!(config.discount_factor, 0.95);
    assert_eq!(config.learning_rate, 0.75);
    assert_eq!(config.start_selection, StartSelection::ValidCells);
    assert!(config.validate().is_ok());
}
