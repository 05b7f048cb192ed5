//! Live view of the hub.
//!
//! The watcher keeps one WebSocket open to the hub, mirrors its rotators in
//! an [`EventReconciler`] and rewrites the compass files whenever the
//! visible state changes.
//!
//! ```text
//!   connect ──► open ──► GET rotators ──► events ─┐
//!      ▲                                          │ close / error
//!      └──── backoff ◄── reset (drop all) ◄───────┘
//! ```

use futures_util::{Stream, StreamExt};
use log::{debug, info, warn};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tokio_graceful_shutdown::SubsystemHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use rotator_core::{Axis, EventReconciler, Reconciled, RotatorRecord};

use crate::config::Settings;
use crate::hub::HubClient;
use crate::panel::FrameWriter;
use crate::PanelError;

enum SessionEnd {
    Closed,
    Shutdown,
}

pub struct Watcher {
    url: String,
    client: HubClient,
    writer: FrameWriter,
    reconciler: EventReconciler,
    /// Rotator to show on each compass whenever it is present
    azimuth_rotator: Option<String>,
    elevation_rotator: Option<String>,
    start: Instant,
}

impl Watcher {
    pub fn new(settings: &Settings) -> Result<Self, PanelError> {
        Ok(Watcher {
            url: settings.websocket_url(),
            client: HubClient::new(settings)?,
            writer: FrameWriter::new(&settings.output_dir, settings.canvas_size)?,
            reconciler: EventReconciler::new(),
            azimuth_rotator: settings.azimuth_rotator.clone(),
            elevation_rotator: settings.elevation_rotator.clone(),
            start: Instant::now(),
        })
    }

    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub async fn run(mut self, subsys: SubsystemHandle) -> Result<(), PanelError> {
        info!("Watching {}", self.url);
        self.render()?;

        loop {
            self.reconciler.transport_connecting(self.now_ms());
            let connected = tokio::select! {
                _ = subsys.on_shutdown_requested() => break,
                r = connect_async(self.url.as_str()) => r,
            };

            match connected {
                Ok((mut ws, _)) => {
                    info!("Connected to {}", self.url);
                    match self.session(&mut ws, &subsys).await {
                        Ok(SessionEnd::Shutdown) => break,
                        Ok(SessionEnd::Closed) => info!("Hub closed the event stream"),
                        Err(e) => warn!("Event stream failed: {}", e),
                    }
                }
                Err(e) => warn!("Cannot connect to {}: {}", self.url, e),
            }

            let delay = self.close()?;
            info!("Reconnecting in {} ms", delay);
            tokio::select! {
                _ = subsys.on_shutdown_requested() => break,
                _ = sleep(Duration::from_millis(delay)) => {}
            }
            self.reconciler.transport_ready(self.now_ms());
        }

        self.reconciler.shutdown(self.now_ms());
        info!(
            "Watcher stopped after {} message(s)",
            self.reconciler.connection().messages_received()
        );
        Ok(())
    }

    async fn session<S>(
        &mut self,
        ws: &mut S,
        subsys: &SubsystemHandle,
    ) -> Result<SessionEnd, PanelError>
    where
        S: Stream<Item = Result<Message, WsError>> + Unpin,
    {
        if let Reconciled::SnapshotRequired = self.reconciler.transport_opened(self.now_ms()) {
            self.load_snapshot().await?;
        }
        self.render()?;

        loop {
            let message = tokio::select! {
                _ = subsys.on_shutdown_requested() => return Ok(SessionEnd::Shutdown),
                m = ws.next() => m,
            };
            match message {
                Some(Ok(Message::Text(text))) => {
                    if self.handle_text(text.as_str()).await? {
                        self.render()?;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!("Close frame: {:?}", frame);
                    return Ok(SessionEnd::Closed);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Ok(SessionEnd::Closed),
            }
        }
    }

    async fn load_snapshot(&mut self) -> Result<(), PanelError> {
        let (records, errors) = self.client.rotators().await?;
        for e in errors {
            warn!("Skipping rotator in snapshot: {}", e);
        }
        self.apply_snapshot(records);
        Ok(())
    }

    fn apply_snapshot(&mut self, records: Vec<RotatorRecord>) {
        for outcome in self.reconciler.apply_snapshot(records) {
            report(&outcome);
        }
        for axis in Axis::ALL {
            if let Some(name) = self.preference(axis) {
                self.prefer(&name);
            }
        }
        info!("Hub has {} rotator(s)", self.reconciler.registry().len());
    }

    fn preference(&self, axis: Axis) -> Option<String> {
        match axis {
            Axis::Azimuth => self.azimuth_rotator.clone(),
            Axis::Elevation => self.elevation_rotator.clone(),
        }
    }

    /// Select `name` on every axis that prefers it, once it is present.
    ///
    /// Selections are cleared on every reset, so this runs again after each
    /// snapshot and each added rotator.
    fn prefer(&mut self, name: &str) {
        if !self.reconciler.registry().contains(name) {
            return;
        }
        for axis in Axis::ALL {
            if self.preference(axis).as_deref() != Some(name)
                || self.reconciler.registry().selected(axis) == Some(name)
            {
                continue;
            }
            match self.reconciler.select(axis, name) {
                Ok(()) => info!("Showing '{}' on the {} compass", name, axis),
                Err(e) => warn!("Cannot show preferred rotator: {}", e),
            }
        }
    }

    /// Apply one text message. Returns true when the compasses need redrawing.
    ///
    /// A rotator announced by name is fetched first. When the hub answers
    /// that fetch with an error status the rotator is taken to be gone
    /// already; only transport failures end the session.
    async fn handle_text(&mut self, text: &str) -> Result<bool, PanelError> {
        let mut outcome = self.reconciler.handle_message(text, self.now_ms());
        if let Reconciled::FetchRequired(name) = outcome.clone() {
            match self.client.rotator(&name).await {
                Ok(record) => outcome = self.reconciler.add(record),
                Err(e @ (PanelError::NotFound(_) | PanelError::HubStatus { .. })) => {
                    debug!("'{}' was gone before it could be fetched: {}", name, e);
                    return Ok(false);
                }
                Err(e) => return Err(e),
            }
        }
        if let Reconciled::Added(name) = &outcome {
            self.prefer(name);
        }
        report(&outcome);
        Ok(outcome.needs_render())
    }

    /// Drop every record after the stream ended and return the delay before
    /// the next attempt.
    fn close(&mut self) -> Result<u64, PanelError> {
        let outcome = self.reconciler.transport_closed(self.now_ms());
        report(&outcome);
        self.render()?;
        Ok(self.reconciler.connection().backoff_ms())
    }

    fn render(&self) -> Result<(), PanelError> {
        self.writer.write(self.reconciler.registry())
    }
}

fn report(outcome: &Reconciled) {
    match outcome {
        Reconciled::Added(name) => info!("Rotator '{}' added", name),
        Reconciled::Removed(name) => info!("Rotator '{}' removed", name),
        Reconciled::HeadingChanged(name) => debug!("Heading of '{}' changed", name),
        Reconciled::Reset { dropped } => warn!("Disconnected, dropped {} rotator(s)", dropped),
        Reconciled::Ignored(why) => debug!("Ignoring event: {}", why),
        Reconciled::AlreadyPresent(_)
        | Reconciled::HeadingUnchanged(_)
        | Reconciled::FetchRequired(_)
        | Reconciled::SnapshotRequired => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotator_core::Axis;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn settings(hub: &str, dir: PathBuf) -> Settings {
        Settings {
            hub: hub.into(),
            api_prefix: "/api".into(),
            canvas_size: 200.0,
            output_dir: dir,
            azimuth_rotator: None,
            elevation_rotator: None,
        }
    }

    fn watcher(dir: PathBuf) -> Watcher {
        Watcher::new(&settings("http://127.0.0.1:9", dir)).unwrap()
    }

    /// Local hub that answers every request like the reference hub does for
    /// a rotator it no longer knows.
    async fn hub_answering_500() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let body = "unable to find rotator";
                let response = format!(
                    "HTTP/1.1 500 Internal Server Error\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}", addr)
    }

    fn add_event(name: &str, config: &str, heading: &str) -> String {
        format!(
            r#"{{"name": "add", "rotator": {{"name": "{}", "heading": {{{}}}, "config": {{{}}}}}}}"#,
            name, heading, config
        )
    }

    const ADD_TOWER: &str = r#"{"name": "add", "rotator": {"name": "tower",
        "heading": {"azimuth": 10, "az_preset": 10},
        "config": {"has_azimuth": true, "azimuth_min": 0, "azimuth_max": 360}}}"#;

    #[tokio::test]
    async fn test_events_update_files() {
        let temp = TempDir::new().unwrap();
        let mut w = watcher(temp.path().to_path_buf());
        let az_file = w.writer.path(Axis::Azimuth);

        assert!(w.handle_text(ADD_TOWER).await.unwrap());
        w.render().unwrap();
        assert!(fs::read_to_string(&az_file).unwrap().contains(">10°</text>"));

        let heading = r#"{"name": "heading", "rotator_name": "tower", "heading": {"azimuth": 42}}"#;
        assert!(w.handle_text(heading).await.unwrap());
        // Repeat changes nothing
        assert!(!w.handle_text(heading).await.unwrap());
        w.render().unwrap();
        assert!(fs::read_to_string(&az_file).unwrap().contains(">42°</text>"));

        assert!(w.handle_text(r#"{"name": "remove", "rotator_name": "tower"}"#).await.unwrap());
        assert!(w.reconciler.registry().is_empty());
    }

    #[tokio::test]
    async fn test_ignored_messages() {
        let temp = TempDir::new().unwrap();
        let mut w = watcher(temp.path().to_path_buf());
        w.reconciler.transport_connecting(0);
        w.reconciler.transport_opened(0);
        assert!(!w.handle_text("not json").await.unwrap());
        assert!(!w.handle_text(r#"{"name": "remove", "rotator_name": "ghost"}"#).await.unwrap());
        assert!(!w.handle_text(r#"{"name": "reboot"}"#).await.unwrap());
        assert_eq!(w.reconciler.connection().messages_received(), 3);
    }

    #[tokio::test]
    async fn test_announce_with_unreachable_hub_fails() {
        let temp = TempDir::new().unwrap();
        let mut w = watcher(temp.path().to_path_buf());
        assert!(w.handle_text(r#"{"name": "add", "rotator_name": "mast"}"#).await.is_err());
        assert!(w.reconciler.registry().is_empty());
    }

    #[tokio::test]
    async fn test_announce_of_vanished_rotator_keeps_session() {
        let temp = TempDir::new().unwrap();
        let hub = hub_answering_500().await;
        let mut w = Watcher::new(&settings(&hub, temp.path().to_path_buf())).unwrap();
        w.reconciler.transport_connecting(0);
        w.reconciler.transport_opened(0);
        assert!(w.handle_text(ADD_TOWER).await.unwrap());

        let announce = r#"{"name": "add", "rotator_name": "mast"}"#;
        assert!(!w.handle_text(announce).await.unwrap());
        assert_eq!(w.reconciler.registry().len(), 1);
        assert!(w.reconciler.registry().contains("tower"));
        assert!(w.reconciler.connection().is_connected());
    }

    #[tokio::test]
    async fn test_preferred_rotator_is_shown() {
        let temp = TempDir::new().unwrap();
        let mut s = settings("http://127.0.0.1:9", temp.path().to_path_buf());
        s.azimuth_rotator = Some("mast".into());
        let mut w = Watcher::new(&s).unwrap();

        w.handle_text(ADD_TOWER).await.unwrap();
        assert_eq!(w.reconciler.registry().selected(Axis::Azimuth), Some("tower"));

        let mast = add_event(
            "mast",
            r#""has_azimuth": true, "azimuth_min": 0, "azimuth_max": 360"#,
            r#""azimuth": 77, "az_preset": 77"#,
        );
        assert!(w.handle_text(&mast).await.unwrap());
        assert_eq!(w.reconciler.registry().selected(Axis::Azimuth), Some("mast"));
        w.render().unwrap();
        let az = fs::read_to_string(w.writer.path(Axis::Azimuth)).unwrap();
        assert!(az.contains(">77°</text>"));

        // Reset clears the selection; the next snapshot restores it
        w.close().unwrap();
        let tower = RotatorRecord::new("tower").with_azimuth(0.0, 360.0);
        let mast = RotatorRecord::new("mast").with_azimuth(0.0, 360.0);
        w.apply_snapshot(vec![tower, mast]);
        assert_eq!(w.reconciler.registry().selected(Axis::Azimuth), Some("mast"));
    }

    #[tokio::test]
    async fn test_preference_for_missing_axis_is_skipped() {
        let temp = TempDir::new().unwrap();
        let mut s = settings("http://127.0.0.1:9", temp.path().to_path_buf());
        s.azimuth_rotator = Some("dish".into());
        let mut w = Watcher::new(&s).unwrap();

        w.handle_text(ADD_TOWER).await.unwrap();
        let dish = add_event("dish", r#""has_elevation": true"#, "");
        assert!(w.handle_text(&dish).await.unwrap());
        assert_eq!(w.reconciler.registry().selected(Axis::Azimuth), Some("tower"));
        assert_eq!(w.reconciler.registry().selected(Axis::Elevation), Some("dish"));
    }

    #[tokio::test]
    async fn test_close_drops_everything_and_backs_off() {
        let temp = TempDir::new().unwrap();
        let mut w = watcher(temp.path().to_path_buf());
        w.reconciler.transport_connecting(0);
        w.reconciler.transport_opened(0);
        w.handle_text(ADD_TOWER).await.unwrap();

        assert_eq!(w.close().unwrap(), 1000);
        assert!(w.reconciler.registry().is_empty());
        let az = fs::read_to_string(w.writer.path(Axis::Azimuth)).unwrap();
        assert!(!az.contains("°</text>"));

        w.reconciler.transport_ready(0);
        w.reconciler.transport_connecting(0);
        assert_eq!(w.close().unwrap(), 2000);
    }
}
