//! Whole-run behaviour of the load runner against the mock service.

mod common;

use chatload_registry::{CounterMode, GeneratorConfig};
use chatload_scenario::{
    ConfigError, LoadRunner, PersonaKind, Profile, ScenarioConfig, ScenarioError,
};
use common::MockChatService;
use serde_json::json;
use std::time::Duration;
use tokio::sync::watch;

fn config_for(mock: &MockChatService) -> ScenarioConfig {
    ScenarioConfig {
        host: mock.url().to_string(),
        users: 4,
        spawn_rate: 200.0,
        run_time_secs: Some(1),
        profile: Profile::HelpDesk,
        request_timeout_secs: 5,
        health_check: true,
        rng_seed: Some(7),
        generator: GeneratorConfig {
            seed: Some(42),
            multiplier: Some(7),
            mode: CounterMode::Serialized,
            ..GeneratorConfig::default()
        },
        ..ScenarioConfig::default()
    }
}

#[tokio::test]
async fn timed_run_spawns_every_user_and_reports() {
    let mock = MockChatService::start().await;
    mock.accept_logins()
        .respond("POST /auth/register", 201, json!({"user": {"id": 1}, "token": "t1"}))
        .respond("POST /conversations", 201, json!({"id": "c1"}));

    let runner = LoadRunner::new(config_for(&mock)).unwrap();
    let (_stop, shutdown) = watch::channel(false);
    let report = runner.run(shutdown).await.unwrap();

    let spawned: u64 = report.sessions.values().map(|c| c.spawned).sum();
    let authenticated: u64 = report.sessions.values().map(|c| c.authenticated).sum();
    assert_eq!(spawned, 4);
    assert_eq!(authenticated, 4);
    assert_eq!(report.generator.issued, 4);
    assert_eq!(report.registry.users, 4);
    assert_eq!(report.profile, Profile::HelpDesk);
    assert!(report.elapsed_secs >= 1.0);

    // Health check plus at least one auth call per session.
    assert!(report.total_requests >= 5, "{}", report.total_requests);
    assert_eq!(report.total_failures, 0);
    assert!(report
        .endpoints
        .iter()
        .any(|e| e.endpoint == "GET /health" && e.requests == 1));
    assert_eq!(mock.requests_to("GET /health").len(), 1);
}

#[tokio::test]
async fn external_shutdown_ends_an_unbounded_run() {
    let mock = MockChatService::start().await;
    mock.accept_logins();

    let config = ScenarioConfig {
        run_time_secs: None,
        profile: Profile::Baseline,
        health_check: false,
        ..config_for(&mock)
    };
    let runner = LoadRunner::new(config).unwrap();
    let (stop, shutdown) = watch::channel(false);

    let stopper = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let _ = stop.send(true);
    });
    let report = runner.run(shutdown).await.unwrap();
    stopper.await.unwrap();

    assert!(report.elapsed_secs < 5.0);
    assert!(mock.requests_to("GET /health").is_empty());
    assert!(!report.sessions.contains_key(&PersonaKind::Expert));
}

#[tokio::test]
async fn failed_health_check_aborts_before_spawning() {
    let mock = MockChatService::start().await;
    mock.respond("GET /health", 503, json!({"error": "down"}));

    let runner = LoadRunner::new(config_for(&mock)).unwrap();
    let (_stop, shutdown) = watch::channel(false);
    let err = runner.run(shutdown).await.unwrap_err();

    assert!(matches!(err, ScenarioError::HealthCheck { .. }));
    assert_eq!(mock.keys(), ["GET /health"]);
}

#[tokio::test]
async fn auth_failures_are_counted_per_persona() {
    let mock = MockChatService::start().await;
    mock.respond("POST /auth/login", 401, json!({}))
        .respond("POST /auth/register", 422, json!({}));

    let runner = LoadRunner::new(config_for(&mock)).unwrap();
    let (_stop, shutdown) = watch::channel(false);
    let report = runner.run(shutdown).await.unwrap();

    let failures: u64 = report.sessions.values().map(|c| c.auth_failures).sum();
    assert_eq!(failures, 4);
    assert_eq!(report.registry.users, 0);
    assert!(report.total_failures >= 8);
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let config = ScenarioConfig {
        users: 0,
        ..ScenarioConfig::default()
    };
    assert!(matches!(
        LoadRunner::new(config),
        Err(ScenarioError::Config(ConfigError::InvalidValue { field: "users", .. }))
    ));

    let config = ScenarioConfig {
        host: "not a url".into(),
        ..ScenarioConfig::default()
    };
    assert!(matches!(LoadRunner::new(config), Err(ScenarioError::Client(_))));

    for spawn_rate in [1e12, 1e-320] {
        let config = ScenarioConfig {
            spawn_rate,
            ..ScenarioConfig::default()
        };
        assert!(matches!(
            LoadRunner::new(config),
            Err(ScenarioError::Config(ConfigError::InvalidValue { field: "spawn_rate", .. }))
        ));
    }
}
