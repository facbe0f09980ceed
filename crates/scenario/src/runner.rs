//! Spawns persona sessions at the configured rate and collects the report
//! once the run ends.

use crate::config::ScenarioConfig;
use crate::context::SimContext;
use crate::error::{ConfigError, ScenarioError};
use crate::persona::{self, stopped};
use crate::profile::{PersonaKind, PersonaSpec};
use crate::scheduler::TokioScheduler;
use crate::stats::{
    per_second, GeneratorSummary, RegistrySummary, Report, RequestStats, SessionStats,
};
use chatload_sdk::RequestObserver;
use chrono::Utc;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

pub struct LoadRunner {
    config: ScenarioConfig,
    ctx: SimContext,
    personas: Vec<PersonaSpec>,
    requests: Arc<RequestStats>,
    sessions: Arc<SessionStats>,
}

impl LoadRunner {
    pub fn new(config: ScenarioConfig) -> Result<Self, ScenarioError> {
        config.validate()?;
        let requests = Arc::new(RequestStats::new()?);
        let observer: Arc<dyn RequestObserver> = requests.clone();
        let ctx = SimContext::from_config(&config, Some(observer))?;
        let personas = config.profile.personas();
        Ok(Self {
            config,
            ctx,
            personas,
            requests,
            sessions: Arc::new(SessionStats::new()),
        })
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    pub fn request_stats(&self) -> &RequestStats {
        &self.requests
    }

    /// Run until the configured run time elapses or `shutdown` flips to
    /// `true`, then stop every session and report.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<Report, ScenarioError> {
        let config = &self.config;
        let scope = self.ctx.scope;

        if config.health_check {
            self.ctx
                .client
                .health()
                .await
                .map_err(|source| ScenarioError::HealthCheck {
                    host: config.host.clone(),
                    source,
                })?;
            debug!(host = %config.host, "health check passed");
        }

        let weights: Vec<u32> = self.personas.iter().map(|p| p.weight).collect();
        let mix = WeightedIndex::new(&weights)
            .map_err(|err| ConfigError::invalid("profile", format!("persona weights: {err}")))?;
        let mut rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            host = %config.host,
            profile = %config.profile,
            ?scope,
            users = config.users,
            spawn_rate = config.spawn_rate,
            run_time_secs = ?config.run_time_secs,
            "starting load run"
        );

        let started_at = Utc::now();
        let started = Instant::now();
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut tasks = JoinSet::new();

        let run_time = config.run_time();
        let deadline = async move {
            match run_time {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let mut ticker = tokio::time::interval(config.spawn_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut spawned = 0usize;

        loop {
            tokio::select! {
                biased;
                _ = stopped(&mut shutdown) => {
                    info!("shutdown requested");
                    break;
                }
                _ = &mut deadline => {
                    info!("run time elapsed");
                    break;
                }
                _ = ticker.tick(), if spawned < config.users => {
                    let spec = self.personas[mix.sample(&mut rng)].clone();
                    self.spawn_session(&mut tasks, spec, rng.gen(), stop_rx.clone());
                    spawned += 1;
                    if spawned == config.users {
                        info!(users = spawned, "all sessions spawned");
                    }
                }
            }
        }

        let _ = stop_tx.send(true);
        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                warn!("session task failed: {err}");
            }
        }

        let elapsed = started.elapsed();
        let total_requests = self.requests.total_requests();
        let report = Report {
            host: config.host.clone(),
            profile: config.profile,
            conversation_scope: scope,
            users: config.users,
            spawn_rate: config.spawn_rate,
            started_at,
            ended_at: Utc::now(),
            elapsed_secs: elapsed.as_secs_f64(),
            total_requests,
            total_failures: self.requests.total_failures(),
            requests_per_sec: per_second(total_requests, elapsed),
            endpoints: self.requests.endpoint_reports(),
            sessions: self.sessions.snapshot(),
            generator: GeneratorSummary::of(&self.ctx.generator),
            registry: RegistrySummary::of(&self.ctx.registry),
        };
        info!(
            requests = report.total_requests,
            failures = report.total_failures,
            rps = %format!("{:.2}", report.requests_per_sec),
            "load run finished"
        );
        Ok(report)
    }

    fn spawn_session(
        &self,
        tasks: &mut JoinSet<()>,
        spec: PersonaSpec,
        seed: u64,
        shutdown: watch::Receiver<bool>,
    ) {
        let kind: PersonaKind = spec.kind;
        let ctx = self.ctx.clone();
        let sessions = Arc::clone(&self.sessions);
        sessions.spawned(kind);
        debug!(persona = %kind, "spawning session");

        tasks.spawn(async move {
            let scheduler = TokioScheduler::seeded(seed);
            let mut persona = persona::build(spec, ctx);
            match persona::drive(persona.as_mut(), &scheduler, shutdown).await {
                Ok(()) => {
                    if persona.session().user().is_some() {
                        sessions.authenticated(kind);
                    }
                }
                Err(err) => {
                    sessions.auth_failed(kind);
                    debug!(persona = %kind, "session ended: {err}");
                }
            }
        });
    }
}
