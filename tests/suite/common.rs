use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use evolution_sdk::client::RetryConfig;
use evolution_sdk::{ClientConfig, EvolutionClient};
use wiremock::{MockServer, Request, ResponseTemplate};

/// Route library logs to the test output. Set `RUST_LOG=evolution_sdk_client=debug` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Config for a mock server with key "test-key" and default instance "demo".
pub fn config_for(server: &MockServer, retry: RetryConfig) -> ClientConfig {
    ClientConfig::builder(server.uri())
        .with_api_key("test-key")
        .with_default_instance("demo")
        .with_retry(retry)
        .build()
}

pub fn client_for(server: &MockServer) -> EvolutionClient {
    init_tracing();
    EvolutionClient::new(config_for(server, RetryConfig::no_retry())).expect("client builds")
}

pub fn retrying_client_for(server: &MockServer, max_retries: u32) -> EvolutionClient {
    init_tracing();
    EvolutionClient::new(config_for(server, fast_retry(max_retries))).expect("client builds")
}

/// Short backoff so retry tests stay fast.
pub fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig::default()
        .with_max_retries(max_retries)
        .with_initial_delay(Duration::from_millis(5))
        .with_max_delay(Duration::from_millis(20))
}

/// Respond with `failure_status` for the first `failures` calls, then with `success`.
pub fn failing_then(
    calls: Arc<AtomicU32>,
    failures: u32,
    failure_status: u16,
    success: serde_json::Value,
) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync + 'static {
    move |_: &Request| {
        if calls.fetch_add(1, Ordering::SeqCst) < failures {
            ResponseTemplate::new(failure_status)
        } else {
            ResponseTemplate::new(201).set_body_json(success.clone())
        }
    }
}
