use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{
    sync::{broadcast, mpsc, oneshot, Mutex},
    task::JoinHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::errors::AutoplayerError;

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);
const EVENT_CHANNEL_CAPACITY: usize = 256;

type CallResult = Result<Value, ProtocolError>;
type PendingMap = HashMap<u64, oneshot::Sender<CallResult>>;
type Pending = Arc<Mutex<PendingMap>>;

#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// A protocol event pushed by the browser (`Page.loadEventFired`, ...)
#[derive(Debug, Clone)]
pub struct CdpEvent {
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Incoming {
    Response {
        id: u64,
        #[serde(default)]
        result: Option<Value>,
        #[serde(default)]
        error: Option<ProtocolError>,
    },
    Event {
        method: String,
        #[serde(default)]
        params: Value,
    },
}

/// One DevTools WebSocket session bound to a single target.
///
/// Requests are matched to responses by id through a pending map; events are
/// fanned out on a broadcast channel so waiters can subscribe before they
/// trigger the action they wait for.
pub struct CdpConnection {
    sender: mpsc::UnboundedSender<Message>,
    pending: Pending,
    events: broadcast::Sender<CdpEvent>,
    next_id: AtomicU64,
    call_timeout: Duration,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl CdpConnection {
    pub async fn connect(ws_url: &str) -> Result<Self, AutoplayerError> {
        tracing::debug!("Connecting to DevTools target at {}", ws_url);
        let (ws_stream, _) = connect_async(ws_url).await.map_err(|e| {
            AutoplayerError::Browser(format!("Failed to connect to DevTools at {ws_url}: {e}"))
        })?;

        let (mut sink, mut stream) = ws_stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        // writer task
        let writer = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if let Err(e) = sink.send(msg).await {
                    tracing::warn!("DevTools send error: {}", e);
                    break;
                }
            }
        });

        // reader task
        let reader_pending = pending.clone();
        let reader_events = events.clone();
        let reader = tokio::spawn(async move {
            while let Some(Ok(msg)) = stream.next().await {
                if !msg.is_text() {
                    continue;
                }
                let txt = msg.into_text().unwrap_or_default();
                match serde_json::from_str::<Incoming>(&txt) {
                    Ok(Incoming::Response { id, result, error }) => {
                        if let Some(tx) = reader_pending.lock().await.remove(&id) {
                            let _ = tx.send(match error {
                                Some(err) => Err(err),
                                None => Ok(result.unwrap_or(Value::Null)),
                            });
                        } else {
                            tracing::debug!(id, "Response for unknown request id");
                        }
                    }
                    Ok(Incoming::Event { method, params }) => {
                        tracing::trace!(%method, "DevTools event");
                        // No receivers is fine; nobody is waiting for this event
                        let _ = reader_events.send(CdpEvent { method, params });
                    }
                    Err(e) => tracing::warn!("Invalid DevTools message: {}", e),
                }
            }

            // Dropping the senders fails every in-flight call
            let mut pending = reader_pending.lock().await;
            if !pending.is_empty() {
                tracing::warn!(
                    "DevTools connection closed with {} pending requests",
                    pending.len()
                );
            }
            pending.clear();
            tracing::info!("DevTools connection closed");
        });

        Ok(Self {
            sender: tx,
            pending,
            events,
            next_id: AtomicU64::new(1),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            reader,
            writer,
        })
    }

    /// Subscribe to protocol events. Subscribe *before* issuing the command
    /// whose consequence you want to observe.
    pub fn subscribe(&self) -> broadcast::Receiver<CdpEvent> {
        self.events.subscribe()
    }

    /// Send a command and wait for its result.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, AutoplayerError> {
        self.call_with_timeout(method, params, self.call_timeout).await
    }

    pub async fn call_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, AutoplayerError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let payload = json!({ "id": id, "method": method, "params": params }).to_string();
        tracing::debug!(id, method, "DevTools call");
        if self.sender.send(Message::Text(payload)).is_err() {
            self.pending.lock().await.remove(&id);
            return Err(AutoplayerError::Browser(
                "DevTools connection is closed".to_string(),
            ));
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(err))) => Err(AutoplayerError::Protocol {
                method: method.to_string(),
                message: format!("{} (code {})", err.message, err.code),
            }),
            Ok(Err(_)) => Err(AutoplayerError::Browser(format!(
                "DevTools connection closed while waiting for {method}"
            ))),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(AutoplayerError::Timeout(format!(
                    "{method} got no response within {timeout:?}"
                )))
            }
        }
    }
}

impl Drop for CdpConnection {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

/// Wait until an event with the given method arrives on `rx`.
pub async fn wait_for_event(
    rx: &mut broadcast::Receiver<CdpEvent>,
    method: &str,
    timeout: Duration,
) -> Result<CdpEvent, AutoplayerError> {
    let wait = async {
        loop {
            match rx.recv().await {
                Ok(event) if event.method == method => return Ok(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Event receiver lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(AutoplayerError::Browser(format!(
                        "Event stream closed while waiting for {method}"
                    )))
                }
            }
        }
    };

    tokio::time::timeout(timeout, wait)
        .await
        .map_err(|_| AutoplayerError::Timeout(format!("No {method} within {timeout:?}")))?
}
