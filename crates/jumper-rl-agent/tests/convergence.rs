//! End-to-end learning against a scripted environment

use approx::assert_relative_eq;
use jumper_rl_agent::{StopSignal, Trainer, TrainerConfig};
use jumper_rl_core::{ActionIndex, Observation, StateIndex, ValueTable};
use jumper_rl_env::ScriptedChannel;

fn config(dir: &tempfile::TempDir, max_steps: u64) -> TrainerConfig {
    TrainerConfig {
        snapshot_path: dir.path().join("result.txt"),
        seed: Some(2037),
        max_steps: Some(max_steps),
        ..TrainerConfig::default()
    }
}

#[tokio::test]
async fn test_fixed_reward_converges_to_discounted_sum() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, 400);
    let target = 1.0 / (1.0 - config.discount_factor);

    let mut trainer = Trainer::new(config.clone(), ValueTable::zeros(config.shape())).unwrap();
    trainer
        .attach(ScriptedChannel::fixed(Observation::new("000000001", 1.0)))
        .unwrap();
    trainer.start().await.unwrap();

    let state = StateIndex(1);
    let mut previous = [0.0f64; 3];
    for _ in 0..400 {
        let report = trainer.step().await.unwrap();
        assert_eq!(report.state, state);
        assert_eq!(report.next_state, state);

        let row = trainer.table().row(state).unwrap().to_vec();
        for (action, (&now, &before)) in row.iter().zip(previous.iter()).enumerate() {
            assert!(
                now >= before && now <= target + 1e-9,
                "action {action}: {before} -> {now} must rise towards {target}"
            );
        }
        previous.copy_from_slice(&row);
    }

    // The greedy action is taken most of the time and ends close to the fixed point
    let best = trainer.table().best_action(state).unwrap();
    let best_value = trainer.table().get(state, best).unwrap();
    assert_relative_eq!(best_value, target, epsilon = 1e-3);

    // Every other row is untouched
    for other in (0..96).filter(|&s| s != 1) {
        assert!(trainer
            .table()
            .row(StateIndex(other))
            .unwrap()
            .iter()
            .all(|&v| v == 0.0));
    }
}

#[tokio::test]
async fn test_learning_resumes_from_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(&dir, 50);

    let table = ValueTable::load(&config.snapshot_path, config.shape()).await;
    assert_eq!(table, ValueTable::zeros(config.shape()));

    let mut first = Trainer::new(config.clone(), table).unwrap();
    first
        .attach(ScriptedChannel::fixed(Observation::new("0b0000001", 1.0)))
        .unwrap();
    let stats = first.run(&StopSignal::never()).await.unwrap();
    assert_eq!(stats.steps, 50);
    let learned = first.into_table();

    let reloaded = ValueTable::load(&config.snapshot_path, config.shape()).await;
    for (a, b) in reloaded.as_array().iter().zip(learned.as_array().iter()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-6);
    }

    let mut second = Trainer::new(config.clone(), reloaded).unwrap();
    second
        .attach(ScriptedChannel::fixed(Observation::new("0b0000001", 1.0)))
        .unwrap();
    second.run(&StopSignal::never()).await.unwrap();

    let before = learned.max_value(StateIndex(1)).unwrap();
    let after = second.table().max_value(StateIndex(1)).unwrap();
    assert!(after > before);
    assert!(second.table().get(StateIndex(1), ActionIndex(0)).unwrap() > 0.0);
}
