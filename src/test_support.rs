//! Helpers shared by the unit tests

use std::sync::{Arc, Mutex};

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::sink::DisplaySink;

/// Start a mock server answering one `GET {route}` with `response`.
///
/// The expectation is verified when the server is dropped, so a test fails
/// if the provider requested any other path.
pub async fn mock_endpoint(route: &str, response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(1)
        .mount(&server)
        .await;
    server
}

pub fn json_response(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.to_string(), "application/json")
}

pub fn html_response(status: u16, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(body.to_string(), "text/html")
}

/// Base URL nothing listens on; port 1 (tcpmux) is never served in test
/// environments, so connecting fails at the transport level
pub const REFUSED_URL: &str = "http://127.0.0.1:1";

/// Run a blocking provider call off the async test runtime
pub async fn blocking<T, F>(f: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Acquire(String),
    Update(String),
    Release(String),
}

/// In-memory sink recording every host call
#[derive(Default)]
pub struct RecordingSink {
    pub known: Vec<String>,
    pub events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl RecordingSink {
    pub fn with_source(name: &str) -> Self {
        RecordingSink {
            known: vec![name.to_string()],
            events: Arc::default(),
        }
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Update(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl DisplaySink for RecordingSink {
    type Handle = String;

    fn acquire(&self, name: &str) -> Option<String> {
        self.events
            .lock()
            .unwrap()
            .push(SinkEvent::Acquire(name.to_string()));
        self.known.iter().find(|k| *k == name).cloned()
    }

    fn update_text(&self, _handle: &String, text: &str) {
        self.events
            .lock()
            .unwrap()
            .push(SinkEvent::Update(text.to_string()));
    }

    fn release(&self, handle: String) {
        self.events.lock().unwrap().push(SinkEvent::Release(handle));
    }
}
