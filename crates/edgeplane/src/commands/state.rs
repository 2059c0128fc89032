use colored::Colorize;
use edgeplane_config::EdgeplaneConfig;
use edgeplane_provider::{LifecycleStatus, StateManager};
use std::path::Path;

fn colored_status(status: LifecycleStatus) -> colored::ColoredString {
    let label = status.to_string();
    match status {
        LifecycleStatus::Present => label.green(),
        LifecycleStatus::Failed => label.red(),
        LifecycleStatus::Absent => label.dimmed(),
        _ => label.yellow(),
    }
}

pub async fn list(config: &EdgeplaneConfig, dir: Option<&Path>) -> anyhow::Result<()> {
    let dir = dir.unwrap_or(&config.state.dir);
    tracing::debug!("Reading state from {}", dir.display());
    let state = StateManager::new(dir).load().await?;

    if state.resources.is_empty() {
        println!("No managed resources in {}", dir.display());
        return Ok(());
    }

    println!(
        "{} managed resource(s), updated {}",
        state.resources.len(),
        state.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    for (key, record) in &state.resources {
        println!("  {} {}", colored_status(record.status), key.cyan());
        if let Some(error) = &record.last_error {
            println!("      {}", error.red());
        }
    }

    Ok(())
}
