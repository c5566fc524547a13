//! Arena - adaptive competitive evaluation for agents
//!
//! The `arena` command drives the engine from a terminal.
//!
//! ## Commands
//!
//! - `force`: run one scenario for an agent right now
//! - `difficulty`: show an agent's multiplier and record
//! - `history`: show an agent's latest learning events
//! - `analytics`: summarise archived scenarios
//! - `cycle`: one scenario per category for a set of agents
//! - `archive`: retire an agent

use std::path::PathBuf;

use anyhow::{Context, Result};
use arena_core::{
    build_engine, init_tracing, load_config, open_storage, AgentId, ArenaEngine, ArenaError,
    Category, OutcomeKind, StorageChoice,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::Level;

#[derive(Parser)]
#[command(name = "arena")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Adaptive competitive evaluation for autonomous agents", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Path to an arena.toml config file
    #[arg(short, long, global = true, env = "ARENA_CONFIG")]
    config: Option<PathBuf>,

    /// Keep all state in memory (nothing survives the command)
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scenario for an agent now
    Force {
        /// Agent to test
        agent: String,

        /// Additional competitors
        #[arg(short = 'w', long = "with")]
        with: Vec<String>,

        /// Scenario category (default: the agent's next in rotation)
        #[arg(short = 'k', long)]
        category: Option<Category>,
    },

    /// Show an agent's difficulty multiplier and record
    Difficulty {
        agent: String,
    },

    /// Show an agent's most recent learning events
    History {
        agent: String,

        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },

    /// Summarise archived scenarios
    Analytics {
        /// Number of recent scenarios to include
        #[arg(short = 'n', long, default_value_t = 10)]
        recent: usize,
    },

    /// Run one scenario per category for the given agents
    Cycle {
        #[arg(required = true)]
        participants: Vec<String>,
    },

    /// Retire an agent from future scenarios
    Archive {
        agent: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    init_tracing(cli.json, level);

    let config = load_config(cli.config.as_deref()).context("Failed to load Arena config")?;
    let storage = open_storage(if cli.memory {
        StorageChoice::Memory
    } else {
        StorageChoice::FromEnv
    })
    .await
    .context("Failed to open Arena storage")?;
    let engine = build_engine(config, storage).context("Failed to build Arena engine")?;

    match cli.command {
        Commands::Force {
            agent,
            with,
            category,
        } => cmd_force(&engine, &agent, &with, category).await,
        Commands::Difficulty { agent } => cmd_difficulty(&engine, &agent).await,
        Commands::History { agent, limit } => cmd_history(&engine, &agent, limit).await,
        Commands::Analytics { recent } => cmd_analytics(&engine, recent).await,
        Commands::Cycle { participants } => cmd_cycle(&engine, &participants).await,
        Commands::Archive { agent } => cmd_archive(&engine, &agent).await,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn cmd_force(
    engine: &ArenaEngine,
    agent: &str,
    with: &[String],
    category: Option<Category>,
) -> Result<()> {
    let agent_id = AgentId::from(agent);
    let co: Vec<AgentId> = with.iter().map(|s| AgentId::from(s.as_str())).collect();

    let report = match engine.force_test(&agent_id, &co, category).await {
        Ok(report) => report,
        Err(ArenaError::PersistenceFatal { detail, reason }) => {
            eprintln!("Outcome computed but not persisted: {reason}");
            print_json(&*detail)?;
            anyhow::bail!(
                "persistence could not be confirmed for scenario {}",
                detail.outcome.scenario_id
            );
        }
        Err(e) => return Err(e).context("Forced test failed"),
    };

    println!(
        "Scenario {} ({}, {}, difficulty {:.2})",
        report.scenario.id,
        report.scenario.base_category,
        report.scenario.variant,
        report.scenario.scenario_difficulty
    );
    for result in &report.results {
        let status = if result.received { "" } else { " (no response)" };
        println!(
            "  #{} {:<20} {:>3}{}",
            result.rank,
            result.agent_id.as_str(),
            result.score,
            status
        );
    }
    match report.outcome.kind {
        OutcomeKind::Tie => println!("Result: tie, no difficulty change"),
        OutcomeKind::NoContest => println!("Result: no contest, no difficulty change"),
        OutcomeKind::Decisive => {
            for state in &report.states {
                let verdict = if report.outcome.is_winner(&state.agent_id) {
                    "won "
                } else {
                    "lost"
                };
                println!(
                    "  {} {} -> multiplier {:.2} ({}W/{}L)",
                    state.agent_id, verdict, state.difficulty_multiplier, state.wins, state.losses
                );
            }
        }
    }
    Ok(())
}

async fn cmd_difficulty(engine: &ArenaEngine, agent: &str) -> Result<()> {
    let snapshot = engine
        .difficulty(&AgentId::from(agent))
        .await
        .context("Failed to read agent state")?;
    print_json(&snapshot)
}

async fn cmd_history(engine: &ArenaEngine, agent: &str, limit: usize) -> Result<()> {
    let events = engine
        .learning_history(&AgentId::from(agent), limit)
        .await
        .context("Failed to read learning history")?;
    if events.is_empty() {
        println!("No learning events for {agent}");
        return Ok(());
    }
    for event in &events {
        println!(
            "{} {:<8} {} (score {})",
            event.created_at.format("%Y-%m-%d %H:%M:%S"),
            event.kind.as_str(),
            event.scenario_id,
            event.score
        );
        for lesson in &event.lessons {
            println!("    - {lesson}");
        }
    }
    Ok(())
}

async fn cmd_analytics(engine: &ArenaEngine, recent: usize) -> Result<()> {
    let analytics = engine
        .analytics(recent)
        .await
        .context("Failed to summarise scenario archive")?;
    print_json(&analytics)
}

async fn cmd_cycle(engine: &ArenaEngine, participants: &[String]) -> Result<()> {
    let participants: Vec<AgentId> = participants
        .iter()
        .map(|s| AgentId::from(s.as_str()))
        .collect();
    let summary = engine
        .run_cycle(&participants)
        .await
        .context("Test cycle failed")?;

    for entry in &summary.entries {
        let winners: Vec<&str> = entry.outcome.winners.iter().map(|w| w.as_str()).collect();
        let status = match &entry.error {
            Some(e) => format!("UNPERSISTED: {e}"),
            None => entry.outcome.kind.as_str().to_string(),
        };
        println!(
            "{:<18} {:<10} winners [{}]",
            entry.category.as_str(),
            status,
            winners.join(", ")
        );
    }
    for (agent, avg) in &summary.average_scores {
        println!("  {:<20} average {avg:.1}", agent.as_str());
    }
    let passing: Vec<&str> = summary.passing_agents.iter().map(|a| a.as_str()).collect();
    println!("Passing: [{}]", passing.join(", "));
    if summary.failed > 0 {
        anyhow::bail!("{} scenario(s) could not be persisted", summary.failed);
    }
    Ok(())
}

async fn cmd_archive(engine: &ArenaEngine, agent: &str) -> Result<()> {
    let state = engine
        .archive_agent(&AgentId::from(agent))
        .await
        .context("Failed to archive agent")?;
    println!(
        "Archived {} at multiplier {:.2} after {} games",
        state.agent_id, state.difficulty_multiplier, state.total_games
    );
    Ok(())
}
