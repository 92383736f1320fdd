//! Integration tests for stampede-config

use stampede_config::*;
use std::io::Write;
use std::time::Duration;
use temp_env::with_vars;

#[test]
fn test_default_config_validation() {
    let config = StampedeConfig::default();
    assert!(config.validate_all().is_ok());
}

#[test]
fn test_config_loader_from_env() {
    let vars = vec![
        ("STAMPEDE_BASE_URL", Some("http://10.0.0.5:8080")),
        ("STAMPEDE_CONCURRENCY", Some("25")),
        ("STAMPEDE_DURATION", Some("90")),
        ("STAMPEDE_WORKERS", Some("3")),
        ("STAMPEDE_LOG_LEVEL", Some("debug")),
        ("STAMPEDE_ANALYSIS_WINDOW", Some("30")),
        ("STAMPEDE_OUTPUT_DIR", Some("/tmp/stampede-reports")),
    ];

    with_vars(vars, || {
        let loader = ConfigLoader::new();
        let config = loader.from_env().unwrap();

        assert_eq!(config.load_test.base_url, "http://10.0.0.5:8080");
        assert_eq!(config.load_test.concurrency, 25);
        assert_eq!(config.load_test.duration, Duration::from_secs(90));
        assert_eq!(config.load_test.worker_count, 3);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.analyzer.analysis_window, Duration::from_secs(30));
        assert_eq!(
            config.output.directory,
            std::path::PathBuf::from("/tmp/stampede-reports")
        );
    });
}

#[test]
fn test_invalid_env_value_is_rejected() {
    with_vars(vec![("STAMPEDE_CONCURRENCY", Some("many"))], || {
        let result = ConfigLoader::new().from_env();
        assert!(matches!(result, Err(ConfigError::EnvError(_))));
    });
}

#[test]
fn test_yaml_config_roundtrip() {
    let config = StampedeConfig::default();
    let yaml = serde_yaml::to_string(&config).unwrap();

    let parsed: StampedeConfig = serde_yaml::from_str(&yaml).unwrap();
    assert!(parsed.validate_all().is_ok());
    assert_eq!(parsed, config);
}

#[test]
fn test_generated_sample_parses() {
    let sample = StampedeConfig::generate_sample();
    let parsed: StampedeConfig = serde_yaml::from_str(&sample).unwrap();
    assert!(parsed.validate_all().is_ok());
    assert_eq!(parsed.load_test.scenarios.len(), 2);
    assert_eq!(parsed.load_test.scenarios[0].weight, 3.0);
}

#[test]
fn test_comprehensive_yaml_config() {
    let yaml = r#"
load_test:
  baseURL: "http://localhost:4000"
  concurrency: 40
  duration: 120
  rampUp: 30
  workers: 4
  timeout: 5000
  thinkTime:
    min: 200
    max: 800
  thresholds:
    responseTime: 750
    errorRate: 2.5
    throughput: 15
  scenarios:
    - name: search
      weight: 2
      requests:
        - method: get
          path: /api/search?q=rust
analyzer:
  samplingInterval: 500
  analysisWindow: 30
  thresholds:
    cpuUsage: 70
logging:
  level: warn
  format: json
  targets:
    - type: console
    - type: file
      directory: /var/log/stampede
output:
  directory: out
  pretty: false
"#;

    let config: StampedeConfig = serde_yaml::from_str(yaml).unwrap();
    assert!(config.validate_all().is_ok());

    assert_eq!(config.load_test.worker_count, 4);
    assert_eq!(config.load_test.ramp_up, Duration::from_secs(30));
    assert_eq!(config.load_test.timeout, Duration::from_millis(5000));
    assert_eq!(config.load_test.think_time.max, Duration::from_millis(800));
    assert_eq!(config.load_test.thresholds.error_rate, 2.5);
    assert_eq!(config.load_test.scenarios[0].requests[0].method, HttpMethod::Get);
    assert_eq!(config.analyzer.sampling_interval, Duration::from_millis(500));
    assert_eq!(config.analyzer.thresholds.cpu_usage, 70.0);
    assert_eq!(config.analyzer.thresholds.memory_usage, 85.0);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.logging.targets.len(), 2);
    assert!(!config.output.pretty);
}

#[test]
fn test_load_custom_test_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{
            "baseURL": "http://127.0.0.1:9999",
            "concurrency": 4,
            "duration": 2,
            "workerCount": 2,
            "scenarios": [{{ "name": "ping", "requests": [{{ "method": "GET", "path": "/ping" }}] }}]
        }}"#
    )
    .unwrap();

    let config = ConfigLoader::new().load_test_file(file.path()).unwrap();
    assert_eq!(config.concurrency, 4);
    assert_eq!(config.users_per_worker(), 2);
}

#[test]
fn test_load_custom_test_file_fails_fast_on_invalid_thresholds() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{ "baseURL": "http://127.0.0.1:9999", "thresholds": {{ "errorRate": 250 }} }}"#
    )
    .unwrap();

    let result = ConfigLoader::new().load_test_file(file.path());
    assert!(matches!(result, Err(ConfigError::DomainError { .. })));
}
