use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::transport::Transport;
use crate::transport::message::{ClientFrame, ServerFrame, TransportEvent};

/// The implementation backed by a hosted real-time backend, speaking
/// JSON-framed WebSocket.
///
/// Commands queue from construction onwards, so subscribe and publish never
/// wait for the connection handshake; the worker drains the queue once the
/// socket is up. A backend that errors mid-session silences the affected
/// operations: they are logged and dropped, with no retry and no fallback
/// to the simulator.
pub struct LiveTransport {
    endpoint: String,
    api_key: String,
    inner: Arc<Mutex<LiveState>>,
}

struct LiveState {
    topics: HashMap<String, UnboundedSender<TransportEvent>>,
    commands: UnboundedSender<ClientFrame>,
    command_rx: Option<UnboundedReceiver<ClientFrame>>,
    worker: Option<JoinHandle<()>>,
}

impl LiveTransport {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        Self {
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            inner: Arc::new(Mutex::new(LiveState {
                topics: HashMap::new(),
                commands,
                command_rx: Some(command_rx),
                worker: None,
            })),
        }
    }

    fn route(inner: &Arc<Mutex<LiveState>>, frame: ServerFrame) {
        let mut state = inner.lock().unwrap();
        let dead = match state.topics.get(&frame.topic) {
            Some(sender) => sender.send(frame.event).is_err(),
            None => false,
        };
        if dead {
            state.topics.remove(&frame.topic);
        }
    }

    fn send_command(&self, frame: ClientFrame) {
        let state = self.inner.lock().unwrap();
        if state.commands.send(frame).is_err() {
            warn!("live transport command dropped, connection is closed");
        }
    }
}

impl Transport for LiveTransport {
    fn connect(&self) {
        let mut state = self.inner.lock().unwrap();
        if state.worker.is_some() {
            return;
        }
        let mut command_rx = match state.command_rx.take() {
            Some(rx) => rx,
            None => {
                // reconnect after a disconnect: start a fresh command queue
                let (tx, rx) = mpsc::unbounded_channel();
                state.commands = tx;
                rx
            }
        };
        if state
            .commands
            .send(ClientFrame::Auth {
                api_key: self.api_key.clone(),
            })
            .is_err()
        {
            warn!("live transport auth frame dropped");
        }

        let endpoint = self.endpoint.clone();
        let inner = Arc::clone(&self.inner);
        state.worker = Some(tokio::spawn(async move {
            let (ws_stream, _response) = match connect_async(endpoint.as_str()).await {
                Ok(ok) => ok,
                Err(e) => {
                    warn!("live transport connection to {endpoint} failed: {e}");
                    return;
                }
            };
            info!("live transport connected to {endpoint}");

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();

            // Forward queued frames to the backend.
            let writer = tokio::spawn(async move {
                while let Some(frame) = command_rx.recv().await {
                    let text = match serde_json::to_string(&frame) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!("failed to serialize client frame: {e}");
                            continue;
                        }
                    };
                    if let Err(e) = ws_sender.send(WsMessage::text(text)).await {
                        warn!("live transport send failed: {e}");
                        break;
                    }
                }
                debug!("live transport write loop closed");
            });

            // Route incoming frames to the per-topic subscriber channels.
            while let Some(msg) = ws_receiver.next().await {
                match msg {
                    Ok(WsMessage::Text(text)) => {
                        match serde_json::from_str::<ServerFrame>(&text) {
                            Ok(frame) => Self::route(&inner, frame),
                            Err(e) => warn!("invalid server frame: {e} | {text}"),
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("live transport stream error: {e}");
                        break;
                    }
                }
            }
            writer.abort();
            debug!("live transport read loop closed");
        }));
    }

    fn disconnect(&self) {
        let mut state = self.inner.lock().unwrap();
        if let Some(worker) = state.worker.take() {
            worker.abort();
        }
        // Replacing the sender closes the old queue, which ends the write
        // loop and drops the socket.
        let (commands, command_rx) = mpsc::unbounded_channel();
        state.commands = commands;
        state.command_rx = Some(command_rx);
        state.topics.clear();
    }

    fn publish(&self, topic: &str, event: TransportEvent) {
        self.send_command(ClientFrame::Publish {
            topic: topic.to_string(),
            event,
        });
    }

    fn subscribe(&self, topic: &str) -> UnboundedReceiver<TransportEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut state = self.inner.lock().unwrap();
            state.topics.insert(topic.to_string(), tx);
        }
        self.send_command(ClientFrame::Subscribe {
            topic: topic.to_string(),
        });
        rx
    }

    fn unsubscribe(&self, topic: &str) {
        {
            let mut state = self.inner.lock().unwrap();
            state.topics.remove(topic);
        }
        self.send_command(ClientFrame::Unsubscribe {
            topic: topic.to_string(),
        });
    }
}
