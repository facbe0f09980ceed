use anyhow::{Context, Result};
use chatload_registry::CounterMode;
use chatload_scenario::{ConversationScope, LoadRunner, Profile, Report, ScenarioConfig};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ProfileArg {
    /// Idle, active and new users
    Baseline,
    /// Adds experts working the help-desk queue
    HelpDesk,
}

impl From<ProfileArg> for Profile {
    fn from(value: ProfileArg) -> Self {
        match value {
            ProfileArg::Baseline => Profile::Baseline,
            ProfileArg::HelpDesk => Profile::HelpDesk,
        }
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeArg {
    /// Every session sees every conversation created during the run
    Global,
    /// Sessions only see conversations they created
    Local,
}

impl From<ScopeArg> for ConversationScope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Global => ConversationScope::Global,
            ScopeArg::Local => ConversationScope::Local,
        }
    }
}

#[derive(Debug, Parser, Clone)]
#[command(author, version, about = "Synthetic user load for the help-desk chat service")]
struct Args {
    /// TOML file with run settings; flags below override it
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Base URL of the chat service (e.g. http://localhost:3000)
    #[arg(long)]
    host: Option<String>,

    /// Number of concurrent simulated users
    #[arg(long)]
    users: Option<usize>,

    /// Users started per second
    #[arg(long)]
    spawn_rate: Option<f64>,

    /// Stop after this many seconds (runs until Ctrl-C when unset)
    #[arg(long, value_name = "SECS")]
    run_time: Option<u64>,

    /// Persona mix to simulate
    #[arg(long, value_enum)]
    profile: Option<ProfileArg>,

    /// Where personas look up conversations to message
    #[arg(long, value_enum)]
    conversation_scope: Option<ScopeArg>,

    /// Username generator seed
    #[arg(long)]
    seed: Option<u64>,

    /// Username generator stride (a prime below 100)
    #[arg(long)]
    multiplier: Option<u64>,

    /// Size of the username space
    #[arg(long)]
    max_users: Option<u64>,

    /// Hand out usernames with an atomic counter (no duplicates per cycle)
    #[arg(long)]
    serialize_usernames: bool,

    /// Probability that an active user's create-conversation action fires
    #[arg(long, env = "CHATLOAD_CONVERSATION_CREATE_PROB")]
    conversation_create_prob: Option<f64>,

    /// Probability that an expert claims a waiting conversation per queue poll
    #[arg(long)]
    claim_prob: Option<f64>,

    /// Username prefix for expert sessions
    #[arg(long)]
    expert_prefix: Option<String>,

    /// Seed for persona assignment and action scheduling
    #[arg(long)]
    rng_seed: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    request_timeout: Option<u64>,

    /// Call GET /health before starting and abort if it fails
    #[arg(long)]
    health_check: bool,

    /// Summary report JSON path
    #[arg(long, default_value = "out/chatload_report.json")]
    report: PathBuf,
}

impl Args {
    /// Defaults, then the TOML file, then flags.
    fn scenario_config(&self) -> Result<ScenarioConfig> {
        let mut config = match &self.config {
            Some(path) => ScenarioConfig::from_toml_file(path)
                .with_context(|| format!("load config {}", path.display()))?,
            None => ScenarioConfig::default(),
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(users) = self.users {
            config.users = users;
        }
        if let Some(rate) = self.spawn_rate {
            config.spawn_rate = rate;
        }
        if self.run_time.is_some() {
            config.run_time_secs = self.run_time;
        }
        if let Some(profile) = self.profile {
            config.profile = profile.into();
        }
        if let Some(scope) = self.conversation_scope {
            config.behavior.conversation_scope = Some(scope.into());
        }
        if self.seed.is_some() {
            config.generator.seed = self.seed;
        }
        if self.multiplier.is_some() {
            config.generator.multiplier = self.multiplier;
        }
        if let Some(max_users) = self.max_users {
            config.generator.max_users = max_users;
        }
        if self.serialize_usernames {
            config.generator.mode = CounterMode::Serialized;
        }
        if let Some(p) = self.conversation_create_prob {
            config.behavior.conversation_create_probability = p;
        }
        if let Some(p) = self.claim_prob {
            config.behavior.claim_probability = p;
        }
        if let Some(prefix) = &self.expert_prefix {
            config.behavior.expert_prefix = prefix.clone();
        }
        if self.rng_seed.is_some() {
            config.rng_seed = self.rng_seed;
        }
        if let Some(secs) = self.request_timeout {
            config.request_timeout_secs = secs;
        }
        if self.health_check {
            config.health_check = true;
        }
        Ok(config)
    }
}

async fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("write report {}", path.display()))?;
    Ok(())
}

fn print_summary(report: &Report, report_path: &Path) {
    println!("chatload done");
    println!("  host: {}", report.host);
    println!(
        "  profile: {}  scope: {:?}  users: {}",
        report.profile, report.conversation_scope, report.users
    );
    println!("  elapsed: {:.1}s", report.elapsed_secs);
    println!(
        "  requests: {}  failures: {}  rps: {:.2}",
        report.total_requests, report.total_failures, report.requests_per_sec
    );
    for endpoint in &report.endpoints {
        println!(
            "  {:<45} n={:<7} fail={:<6} p50/p95/p99 ms: {:.0} / {:.0} / {:.0}",
            endpoint.endpoint,
            endpoint.requests,
            endpoint.failures,
            endpoint.latency_ms_p50,
            endpoint.latency_ms_p95,
            endpoint.latency_ms_p99
        );
    }
    for (kind, counts) in &report.sessions {
        println!(
            "  sessions[{kind}]: spawned={} authenticated={} auth_failures={}",
            counts.spawned, counts.authenticated, counts.auth_failures
        );
    }
    println!(
        "  usernames issued: {} (seed {}, multiplier {})",
        report.generator.issued, report.generator.seed, report.generator.multiplier
    );
    println!("  report: {}", report_path.display());
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let config = args.scenario_config()?;
    let runner = LoadRunner::new(config).context("set up load run")?;

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, stopping sessions");
                let _ = stop_tx.send(true);
            }
            Err(err) => {
                warn!("cannot listen for Ctrl-C: {err}");
                // Keep the sender alive so the run still ends on its own timer.
                std::future::pending::<()>().await;
            }
        }
    });

    let report = runner.run(stop_rx).await.context("load run")?;
    write_json(&args.report, &report).await?;
    print_summary(&report, &args.report);
    Ok(())
}
