// Command implementations for jumperctl

use anyhow::{Context, Result};
use tracing::{info, warn};

use jumper_rl_agent::{stop_signal, Trainer, TrainerConfig};
use jumper_rl_core::{Greedy, Policy, StateIndex, ValueTable};
use jumper_rl_env::TcpChannel;

pub async fn train(config: TrainerConfig) -> Result<()> {
    let address = config.channel.address();
    println!("🤖 Starting Q-learning");
    println!("   Environment: {address}");
    println!("   Snapshot: {}", config.snapshot_path.display());
    println!(
        "   alpha = {}, gamma = {}, epsilon = {}",
        config.learning_rate, config.discount_factor, config.exploration_rate
    );

    let channel = TcpChannel::connect(address.as_str())
        .await
        .context("Connection failed")?;
    println!("✅ Connection successful.");

    let table = ValueTable::load(&config.snapshot_path, config.shape()).await;
    let mut trainer = Trainer::new(config, table)?;
    trainer.attach(channel)?;

    let (handle, stop) = stop_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("stopping after the current step, press Ctrl-C again to abort");
            handle.stop();
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    let stats = trainer.run(&stop).await?;

    println!("\n📊 Session {}", stats.id);
    println!("   Steps: {}", stats.steps);
    println!("   Total reward: {:.2}", stats.total_reward);
    println!(
        "   Actions: {} greedy, {} random",
        stats.greedy_actions, stats.random_actions
    );
    if stats.failed_saves > 0 {
        println!("   ⚠️  Failed snapshot writes: {}", stats.failed_saves);
    }
    Ok(())
}

pub async fn inspect(config: &TrainerConfig) -> Result<()> {
    let table = ValueTable::load(&config.snapshot_path, config.shape()).await;
    let policy = Greedy::new(config.actions.clone());
    let mut rng = rand::thread_rng();
    info!(path = %config.snapshot_path.display(), "inspecting Q-table");

    let header = config.actions.iter().collect::<Vec<_>>().join("\t");
    println!("state\tbits\tplatform\tdirection\t{header}\tbest");

    for state in 0..config.num_states() {
        let state = StateIndex(state);
        let row = table.row(state)?;
        let values = row
            .iter()
            .map(|v| format!("{v:.4}"))
            .collect::<Vec<_>>()
            .join("\t");
        let bits = config.codec.encode(state);
        let details = config.codec.decode(&bits)?;
        let (_, best) = policy.select_named(state, &table, &mut rng)?;
        println!(
            "{state}\t{bits}\t{}\t{}\t{values}\t{best}",
            details.platform, details.direction,
        );
    }
    Ok(())
}
