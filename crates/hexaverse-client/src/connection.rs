//! Push-channel connection manager.
//!
//! One explicitly owned connection per process with an `init`/`shutdown`
//! lifecycle and subscriber fan-out, instead of an implicit module-level
//! singleton. The manager only receives; sends belong to other features.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use hexaverse_protocol::{wire, PushEnvelope};

/// Connection state of the push channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("already connected")]
    AlreadyConnected,
}

/// Transport delivering raw push frames in order. Framing and reconnection
/// policy live with the implementation, not here.
#[async_trait]
pub trait PushTransport: Send {
    async fn connect(&mut self) -> Result<(), ConnectionError>;

    /// The next raw frame; `None` once the channel has closed.
    async fn next_frame(&mut self) -> Option<String>;

    async fn disconnect(&mut self);
}

type Subscribers = Arc<Mutex<Vec<mpsc::UnboundedSender<PushEnvelope>>>>;

/// Owns the push channel for the process and fans decoded envelopes out to
/// registered subscribers. Malformed frames are logged and dropped without
/// disturbing the delivery loop.
#[derive(Default)]
pub struct PushConnection {
    subscribers: Subscribers,
    worker: Option<JoinHandle<()>>,
    stop: Option<oneshot::Sender<()>>,
}

impl PushConnection {
    pub fn new() -> PushConnection {
        PushConnection::default()
    }

    pub fn state(&self) -> ConnectionState {
        match &self.worker {
            Some(worker) if !worker.is_finished() => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }

    /// Register a subscriber. Envelopes decoded after this call are
    /// delivered in arrival order; a dropped receiver unregisters itself.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<PushEnvelope> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    /// Connect the transport and start the delivery loop.
    pub async fn init<T>(&mut self, mut transport: T) -> Result<(), ConnectionError>
    where
        T: PushTransport + 'static,
    {
        if self.state() == ConnectionState::Connected {
            return Err(ConnectionError::AlreadyConnected);
        }

        transport.connect().await?;
        info!("push channel connected");

        let subscribers = Arc::clone(&self.subscribers);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let worker = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        transport.disconnect().await;
                        break;
                    }
                    frame = transport.next_frame() => {
                        let Some(frame) = frame else {
                            info!("push channel closed by transport");
                            break;
                        };
                        match wire::decode_envelope_json(&frame) {
                            Ok(envelope) => fan_out(&subscribers, envelope),
                            Err(err) => warn!("dropping malformed push frame: {err}"),
                        }
                    }
                }
            }
        });

        self.worker = Some(worker);
        self.stop = Some(stop_tx);
        Ok(())
    }

    /// Disconnect the transport and stop delivery. Idempotent.
    pub async fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }
        self.subscribers.lock().unwrap().clear();
        info!("push channel shut down");
    }
}

fn fan_out(subscribers: &Subscribers, envelope: PushEnvelope) {
    let mut subscribers = subscribers.lock().unwrap();
    subscribers.retain(|tx| tx.send(envelope.clone()).is_ok());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::ScriptedTransport;
    use hexaverse_protocol::{CubeCoord, PushPayload, Tile};

    fn frame(q: i32, r: i32) -> String {
        wire::encode_envelope_json(&PushEnvelope::tile_update(Tile::at(CubeCoord::axial(q, r))))
            .unwrap()
    }

    #[tokio::test]
    async fn delivers_frames_to_every_subscriber_in_order() {
        let mut connection = PushConnection::new();
        let mut first = connection.subscribe();
        let mut second = connection.subscribe();

        let transport = ScriptedTransport::new([frame(0, 0), frame(1, 0)]);
        connection.init(transport).await.unwrap();
        assert_eq!(connection.state(), ConnectionState::Connected);

        for rx in [&mut first, &mut second] {
            for expected_q in [0, 1] {
                let envelope = rx.recv().await.unwrap();
                match envelope.payload {
                    PushPayload::TileUpdate(tile) => assert_eq!(tile.coord.q, expected_q),
                    other => panic!("unexpected payload: {other:?}"),
                }
            }
        }

        connection.shutdown().await;
        assert_eq!(connection.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn malformed_frames_are_dropped_and_delivery_continues() {
        let mut connection = PushConnection::new();
        let mut rx = connection.subscribe();

        let transport =
            ScriptedTransport::new(["{not json".to_string(), "[3]".to_string(), frame(2, -1)]);
        connection.init(transport).await.unwrap();

        let envelope = rx.recv().await.unwrap();
        match envelope.payload {
            PushPayload::TileUpdate(tile) => assert_eq!(tile.coord.q, 2),
            other => panic!("unexpected payload: {other:?}"),
        }

        connection.shutdown().await;
    }

    #[tokio::test]
    async fn double_init_is_rejected() {
        let mut connection = PushConnection::new();
        connection
            .init(ScriptedTransport::new(Vec::<String>::new()))
            .await
            .unwrap();

        let again = connection
            .init(ScriptedTransport::new(Vec::<String>::new()))
            .await;
        assert!(matches!(again, Err(ConnectionError::AlreadyConnected)));

        connection.shutdown().await;
    }
}
