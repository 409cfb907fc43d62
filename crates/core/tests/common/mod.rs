//! Common test utilities for HTTP-level testing.
//!
//! Starts a wiremock server that plays both endpoints:
//! - `GET /` answers `{"item_id": n}` with n counting up from 1
//! - `GET /items/<id>` answers `{"name": "item-<id>"}`

#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use chainfetch_core::{ClientConfig, Config, EndpointsConfig, HttpSession};

/// Behavior of the first-stage endpoint.
#[derive(Debug, Clone, Default)]
pub struct FirstStage {
    /// Every `fail_every`-th request (1-based) answers HTTP 500.
    pub fail_every: Option<i64>,
    /// Delay applied to every first-stage response.
    pub delay: Option<Duration>,
}

/// Mock upstream for both fetch stages.
pub struct MockUpstream {
    pub server: MockServer,
    pub first_stage_hits: Arc<AtomicI64>,
}

impl MockUpstream {
    /// Start a server where every call succeeds.
    pub async fn start() -> Self {
        Self::with_first_stage(FirstStage::default()).await
    }

    /// Start a server with a customized first stage.
    pub async fn with_first_stage(first_stage: FirstStage) -> Self {
        let server = MockServer::start().await;
        let hits = Arc::new(AtomicI64::new(0));

        let counter = Arc::clone(&hits);
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(move |_req: &Request| {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                let template = match first_stage.fail_every {
                    Some(every) if n % every == 0 => {
                        ResponseTemplate::new(500).set_body_string("Internal Server Error")
                    }
                    _ => ResponseTemplate::new(200).set_body_json(json!({ "item_id": n })),
                };
                match first_stage.delay {
                    Some(delay) => template.set_delay(delay),
                    None => template,
                }
            })
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/items/-?\d+$"))
            .respond_with(|req: &Request| {
                let id = req.url.path().rsplit('/').next().unwrap_or_default();
                ResponseTemplate::new(200).set_body_json(json!({ "name": format!("item-{}", id) }))
            })
            .mount(&server)
            .await;

        Self {
            server,
            first_stage_hits: hits,
        }
    }

    pub fn endpoints(&self) -> EndpointsConfig {
        EndpointsConfig {
            base_url: format!("{}/", self.server.uri()),
            item_url: format!("{}/items", self.server.uri()),
        }
    }

    pub fn session(&self, timeout_secs: u64) -> HttpSession {
        HttpSession::new(&self.endpoints(), &ClientConfig { timeout_secs })
            .expect("Failed to create session")
    }

    pub fn config(&self, batch_size: usize) -> Config {
        let mut config = Config {
            endpoints: self.endpoints(),
            ..Default::default()
        };
        config.batch.size = batch_size;
        config
    }
}

/// A loopback port with nothing listening on it.
pub fn closed_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}
