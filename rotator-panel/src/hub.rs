//! REST client for the hub, and the HTTP command sink built on it.

use log::{debug, info};
use reqwest::{Client, Response, Url};
use std::time::Duration;
use tokio::task::JoinHandle;

use rotator_core::events::parse_record;
use rotator_core::{parse_snapshot, Command, CommandSink, EventError, RotatorRecord};

use crate::config::Settings;
use crate::PanelError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct HubClient {
    http: Client,
    api_base: Url,
}

impl HubClient {
    pub fn new(settings: &Settings) -> Result<Self, PanelError> {
        let api_base = Url::parse(&settings.api_base())
            .map_err(|e| PanelError::InvalidOption(format!("hub URL: {}", e)))?;
        if api_base.cannot_be_a_base() {
            return Err(PanelError::InvalidOption(format!(
                "hub URL '{}' cannot carry a path",
                api_base
            )));
        }
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(HubClient { http, api_base })
    }

    /// API URL with `segments` appended, each one percent-encoded
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// All rotators, plus any entries the hub sent that could not be decoded
    pub async fn rotators(&self) -> Result<(Vec<RotatorRecord>, Vec<EventError>), PanelError> {
        let url = self.url(&["rotators"]);
        debug!("GET {}", url);
        let text = check(self.http.get(url).send().await?)?.text().await?;
        Ok(parse_snapshot(&text)?)
    }

    pub async fn rotator(&self, name: &str) -> Result<RotatorRecord, PanelError> {
        let url = self.url(&["rotator", name]);
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PanelError::NotFound(name.to_string()));
        }
        let text = check(response)?.text().await?;
        let value: serde_json::Value = serde_json::from_str(&text).map_err(EventError::from)?;
        Ok(parse_record(value)?)
    }

    pub async fn send(&self, command: &Command) -> Result<(), PanelError> {
        let url = self.url(&["rotator", command.rotator_name(), command.endpoint()]);
        debug!("PUT {}", url);
        let request = match command.body() {
            Some(body) => self.http.put(url).json(&body),
            None => self.http.put(url),
        };
        let response = request.send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PanelError::NotFound(command.rotator_name().to_string()));
        }
        check(response)?;
        Ok(())
    }
}

fn check(response: Response) -> Result<Response, PanelError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(PanelError::HubStatus {
            url: response.url().to_string(),
            status: status.as_u16(),
        })
    }
}

/// Sends each submitted command on its own task.
///
/// `submit` returns immediately; [`flush`](Self::flush) waits for every
/// request started so far. Must be used inside a tokio runtime.
pub struct HttpSink {
    client: HubClient,
    pending: Vec<JoinHandle<Result<(), PanelError>>>,
}

impl HttpSink {
    pub fn new(client: HubClient) -> Self {
        HttpSink {
            client,
            pending: Vec::new(),
        }
    }

    /// Wait for all in-flight commands, returning how many succeeded.
    ///
    /// Every request is awaited; the first failure is returned afterwards.
    pub async fn flush(&mut self) -> Result<usize, PanelError> {
        let mut sent = 0;
        let mut first_error = None;
        for handle in self.pending.drain(..) {
            let result = handle
                .await
                .map_err(|e| PanelError::Task(e.to_string()))
                .and_then(|r| r);
            match result {
                Ok(()) => sent += 1,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(sent),
        }
    }
}

impl CommandSink for HttpSink {
    fn submit(&mut self, command: Command) {
        info!("Sending: {}", command);
        let client = self.client.clone();
        self.pending
            .push(tokio::spawn(async move { client.send(&command).await }));
    }
}
