use roundbreaker::{AttemptsConfig, BreakerConfig, ConfigError, HostConfig};
use std::time::Duration;

#[test]
fn builder_rejects_empty_host_list() {
    let err = BreakerConfig::builder()
        .requests_default_ttl(Duration::from_secs(1))
        .build()
        .unwrap_err();
    assert_eq!(err, ConfigError::EmptyHosts);
}

#[test]
fn builder_accepts_legacy_delay_schedule() {
    let host = HostConfig {
        scheme: "http".into(),
        host_port: "legacy:80".into(),
        attempts: AttemptsConfig::Delays(vec![
            Duration::from_millis(10),
            Duration::from_millis(20),
            Duration::from_millis(40),
        ]),
        disabled_for: Duration::from_secs(1),
    };
    let config = BreakerConfig::builder()
        .host(host)
        .requests_default_ttl(Duration::from_secs(1))
        .build()
        .unwrap();
    assert_eq!(config.hosts[0].attempts.max_n(), 3);
}

#[test]
fn json_round_trips_through_the_public_api() {
    let config = BreakerConfig::builder()
        .host(HostConfig::new("https", "api.example.com:443", 4, Duration::from_secs(20)))
        .requests_default_ttl(Duration::from_millis(750))
        .build()
        .unwrap();

    let json = serde_json::to_string_pretty(&config).unwrap();
    let parsed = BreakerConfig::from_json(&json).unwrap();
    assert_eq!(config, parsed);
}

#[test]
fn yaml_documents_with_invalid_schedules_are_rejected() {
    let yaml = r#"
hosts:
  - scheme: http
    host_port: "h1:80"
    attempts: !delays ["0s", "10ms"]
    disabled_for: 5s
requests_default_ttl: 500ms
request_modifiers: []
observer:
  request_skipped: false
  response_skipped: false
  request_body_omitted: false
  response_body_omitted: false
  sensitive_header_names: []
"#;
    let err = BreakerConfig::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("non-positive delay"));
}
