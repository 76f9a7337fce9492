//! Integration tests for the readiness retry loop.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cipherdesk_probe::{LivenessTransport, ProbeConfig, ProbeError, RetrySleeper, ServiceProbe};
use tokio::time::Instant;
use url::Url;

#[derive(Debug)]
enum Step {
    Status(u16),
    Hang,
    Fail(&'static str),
}

#[derive(Debug)]
struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    started_at: Mutex<Vec<Instant>>,
    urls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            started_at: Mutex::new(Vec::new()),
            urls: Mutex::new(Vec::new()),
        })
    }

    fn started_at(&self) -> Vec<Instant> {
        self.started_at.lock().expect("start lock should work").clone()
    }
}

#[async_trait]
impl LivenessTransport for ScriptedTransport {
    async fn probe(&self, url: &Url) -> Result<u16, ProbeError> {
        self.started_at
            .lock()
            .expect("start lock should work")
            .push(Instant::now());
        self.urls
            .lock()
            .expect("url lock should work")
            .push(url.to_string());

        let step = self
            .steps
            .lock()
            .expect("step lock should work")
            .pop_front()
            .unwrap_or(Step::Status(404));

        match step {
            Step::Status(status) => Ok(status),
            Step::Hang => std::future::pending().await,
            Step::Fail(message) => Err(ProbeError::Transport(message.to_string())),
        }
    }
}

#[derive(Debug, Default)]
struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

#[async_trait]
impl RetrySleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        self.delays.lock().expect("delay lock should work").push(delay);
    }
}

#[tokio::test(start_paused = true)]
async fn probe_retry_tests_retries_three_times_before_ready() {
    let transport = ScriptedTransport::new(vec![
        Step::Status(500),
        Step::Status(200),
        Step::Hang,
        Step::Status(404),
    ]);
    let probe = ServiceProbe::new(
        "https://service.example.test",
        ProbeConfig::default(),
        transport.clone(),
    )
    .expect("probe should build");

    let report = probe.await_ready().await;
    assert_eq!(report.attempts, 4);
    assert_eq!(report.retries, 3);

    let starts = transport.started_at();
    assert_eq!(starts.len(), 4);
    let gaps: Vec<Duration> = starts.windows(2).map(|pair| pair[1] - pair[0]).collect();
    assert!(gaps.iter().all(|gap| *gap >= Duration::from_millis(2_000)));
    assert!(gaps[2] >= Duration::from_millis(17_000));
}

#[tokio::test]
async fn probe_retry_tests_waits_fixed_delay_after_every_failure() {
    let transport = ScriptedTransport::new(vec![
        Step::Fail("connection refused"),
        Step::Status(503),
        Step::Status(204),
        Step::Status(404),
    ]);
    let sleeper = Arc::new(RecordingSleeper::default());
    let config = ProbeConfig::new(Duration::from_secs(15), Duration::from_millis(2_000))
        .expect("config should be valid");
    let probe = ServiceProbe::new("https://service.example.test/api", config, transport.clone())
        .expect("probe should build")
        .with_sleeper(sleeper.clone());

    let report = probe.await_ready().await;
    assert_eq!(report.retries, 3);

    let delays = sleeper.delays.lock().expect("delay lock should work").clone();
    assert_eq!(delays, vec![Duration::from_millis(2_000); 3]);

    let urls = transport.urls.lock().expect("url lock should work").clone();
    assert!(urls.iter().all(|url| url == "https://service.example.test/api/"));
}

#[tokio::test]
async fn probe_retry_tests_first_404_returns_without_sleeping() {
    let transport = ScriptedTransport::new(vec![Step::Status(404)]);
    let sleeper = Arc::new(RecordingSleeper::default());
    let probe = ServiceProbe::new("http://127.0.0.1:9", ProbeConfig::default(), transport)
        .expect("probe should build")
        .with_sleeper(sleeper.clone());

    let report = probe.await_ready().await;
    assert_eq!(report.attempts, 1);
    assert!(sleeper.delays.lock().expect("delay lock should work").is_empty());
}
