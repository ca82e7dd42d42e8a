//! The live wallet link.
//!
//! `SocketService` owns one WebSocket connection to the wallet. `connect`
//! walks the configured endpoint candidates in order, performing the full
//! link sequence against each: WebSocket upgrade, engine.io open, socket.io
//! namespace acknowledgement, and pairing. A successful link spawns two
//! tasks: a writer that owns the sink (outgoing frames and keepalive pings)
//! and a reader that decodes inbound frames and dispatches them to the
//! correlation table. Requests suspend on their correlation slot until the
//! matching response arrives, the deadline expires, or the caller cancels.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use scatter_protocol::framing::{Packet, PacketCodec};
use scatter_protocol::messages::{
    ApiEnvelope, ApiRequest, ApiResponse, ApiResult, PairingEnvelope, RekeyEnvelope, EVENT_API,
    EVENT_PAIR, EVENT_PAIRED, EVENT_REKEY, EVENT_REKEYED,
};
use scatter_protocol::ProtocolError;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::{Endpoint, ScatterConfig};
use crate::error::{Result, ScatterError};
use crate::socket::correlator::Correlator;
use crate::storage::{StorageProvider, KEY_APPKEY};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Buffer size for the outgoing frame channel.
const OUTBOX_CAPACITY: usize = 64;

/// One paired connection to the wallet.
pub struct SocketService {
    endpoint: Endpoint,
    origin: String,
    correlator: Arc<Correlator>,
    outbox: mpsc::Sender<Message>,
    connected: Arc<AtomicBool>,
    shutdown: CancellationToken,
    request_timeout: Duration,
}

impl SocketService {
    /// Connect to the first reachable endpoint candidate.
    ///
    /// Candidates are tried in configuration order, each with its own
    /// deadline; a failed attempt leaves no state behind. When every
    /// candidate fails the caller gets `ConnectionUnavailable` — individual
    /// attempt failures are logged, not surfaced. Cancelling aborts the
    /// in-progress attempt with `Cancelled`.
    pub async fn connect(
        config: &ScatterConfig,
        origin: &str,
        appkey: &str,
        passthrough: bool,
        storage: Arc<dyn StorageProvider>,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        config.validate()?;

        for endpoint in &config.endpoints {
            let attempt = Self::link(
                endpoint,
                origin,
                appkey,
                passthrough,
                storage.clone(),
                config.request_timeout,
            );
            let outcome = tokio::select! {
                _ = cancel.cancelled() => return Err(ScatterError::Cancelled),
                outcome = tokio::time::timeout(config.connect_timeout, attempt) => outcome,
            };
            match outcome {
                Ok(Ok(service)) => return Ok(service),
                Ok(Err(error)) => {
                    tracing::warn!(endpoint = %endpoint, %error, "endpoint attempt failed");
                }
                Err(_) => {
                    tracing::warn!(endpoint = %endpoint, "endpoint attempt timed out");
                }
            }
        }

        Err(ScatterError::ConnectionUnavailable)
    }

    /// Perform the full link sequence against one endpoint.
    async fn link(
        endpoint: &Endpoint,
        origin: &str,
        appkey: &str,
        passthrough: bool,
        storage: Arc<dyn StorageProvider>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let codec = PacketCodec::new();
        tracing::debug!(endpoint = %endpoint, "attempting wallet endpoint");

        let (ws, _) = connect_async(endpoint.url()).await?;
        let (mut sink, mut source) = ws.split();

        // Engine.io open, carrying the keepalive parameters.
        let handshake = loop {
            match Self::next_packet(&mut source, &codec).await? {
                Packet::Open(handshake) => break handshake,
                Packet::Ping(data) => Self::pong(&mut sink, &codec, data).await?,
                Packet::Close => return Err(closed_during_handshake()),
                other => tracing::debug!(?other, "unexpected frame before open"),
            }
        };

        // Socket.io namespace connect acknowledgement.
        loop {
            match Self::next_packet(&mut source, &codec).await? {
                Packet::ConnectAck => break,
                Packet::Ping(data) => Self::pong(&mut sink, &codec, data).await?,
                Packet::Close => return Err(closed_during_handshake()),
                other => tracing::debug!(?other, "unexpected frame before connect ack"),
            }
        }

        // Pairing; the wallet only answers API requests from paired origins.
        let pairing = PairingEnvelope::new(appkey, origin, passthrough);
        let frame = codec.encode(&Packet::event(EVENT_PAIR, serde_json::to_value(&pairing)?))?;
        sink.send(Message::Text(frame)).await?;

        loop {
            match Self::next_packet(&mut source, &codec).await? {
                Packet::Event { name, payload } if name == EVENT_PAIRED => {
                    if payload.as_bool().unwrap_or(false) {
                        break;
                    }
                    return Err(ScatterError::Transport(
                        "wallet rejected the pairing request".to_string(),
                    ));
                }
                Packet::Ping(data) => Self::pong(&mut sink, &codec, data).await?,
                Packet::Close => return Err(closed_during_handshake()),
                other => tracing::debug!(?other, "unexpected frame during pairing"),
            }
        }

        let correlator = Arc::new(Correlator::new());
        let connected = Arc::new(AtomicBool::new(true));
        let shutdown = CancellationToken::new();
        let (outbox, outbox_rx) = mpsc::channel::<Message>(OUTBOX_CAPACITY);
        let last_pong = Arc::new(RwLock::new(Instant::now()));

        let ping_interval = Duration::from_millis(handshake.ping_interval);
        let pong_window = ping_interval + Duration::from_millis(handshake.ping_timeout);

        tokio::spawn(Self::write_loop(
            sink,
            outbox_rx,
            ping_interval,
            pong_window,
            last_pong.clone(),
            connected.clone(),
            correlator.clone(),
            shutdown.clone(),
        ));

        let inbound = Inbound {
            origin: origin.to_string(),
            codec,
            correlator: correlator.clone(),
            outbox: outbox.clone(),
            storage,
            last_pong,
        };
        tokio::spawn(Self::read_loop(
            source,
            inbound,
            connected.clone(),
            correlator.clone(),
            shutdown.clone(),
        ));

        tracing::info!(endpoint = %endpoint, "paired with wallet");

        Ok(Self {
            endpoint: endpoint.clone(),
            origin: origin.to_string(),
            correlator,
            outbox,
            connected,
            shutdown,
            request_timeout,
        })
    }

    /// Whether the link completed pairing and has not been torn down.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// The endpoint this service connected to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Number of requests currently awaiting a response.
    pub fn pending_requests(&self) -> usize {
        self.correlator.len()
    }

    /// Submit a request and suspend until its correlated response, using
    /// the configured default deadline.
    pub async fn request(&self, kind: &str, payload: Value) -> Result<Value> {
        self.request_with(kind, payload, None, None).await
    }

    /// Submit a request with an explicit deadline and cancellation token.
    ///
    /// Exactly one outcome is produced: the decoded success value, a
    /// `Remote` failure reported by the wallet, `Timeout`, `Cancelled`, or
    /// `Disconnected`. In every case the correlation entry is gone
    /// afterward; a response arriving later is dropped as stale.
    pub async fn request_with(
        &self,
        kind: &str,
        payload: Value,
        timeout: Option<Duration>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Value> {
        if !self.is_connected() {
            return Err(ScatterError::NotConnected);
        }

        let (id, receiver) = self.correlator.register(kind);
        let request = ApiRequest::new(kind, payload, id.clone());
        let envelope = ApiEnvelope::new(request, &self.origin);
        let frame = PacketCodec::new()
            .encode(&Packet::event(EVENT_API, serde_json::to_value(&envelope)?))?;

        if self.outbox.send(Message::Text(frame)).await.is_err() {
            self.correlator.abandon(&id);
            return Err(ScatterError::Disconnected);
        }
        tracing::debug!(kind, id = %id, "request sent");

        let deadline = timeout.unwrap_or(self.request_timeout);
        let wait = tokio::time::timeout(deadline, receiver);
        let outcome = match cancel {
            Some(token) => tokio::select! {
                _ = token.cancelled() => {
                    self.correlator.abandon(&id);
                    return Err(ScatterError::Cancelled);
                }
                outcome = wait => outcome,
            },
            None => wait.await,
        };

        match outcome {
            Ok(Ok(result)) => result.into_result().map_err(ScatterError::Remote),
            // Slot dropped by teardown.
            Ok(Err(_)) => Err(ScatterError::Disconnected),
            Err(_) => {
                self.correlator.abandon(&id);
                Err(ScatterError::Timeout {
                    kind: kind.to_string(),
                })
            }
        }
    }

    /// Tear the link down: fail every pending request with `Disconnected`,
    /// stop both tasks, and close the transport. Idempotent.
    pub fn dispose(&self) {
        tear_down(&self.connected, &self.correlator, &self.shutdown);
    }

    /// Writer task: owns the sink, drains the outbox, and drives keepalive.
    #[allow(clippy::too_many_arguments)]
    async fn write_loop(
        mut sink: WsSink,
        mut outbox: mpsc::Receiver<Message>,
        ping_interval: Duration,
        pong_window: Duration,
        last_pong: Arc<RwLock<Instant>>,
        connected: Arc<AtomicBool>,
        correlator: Arc<Correlator>,
        shutdown: CancellationToken,
    ) {
        let codec = PacketCodec::new();
        let mut keepalive = tokio::time::interval(ping_interval);
        // The first tick completes immediately.
        keepalive.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = keepalive.tick() => {
                    if last_pong.read().await.elapsed() > pong_window {
                        tracing::warn!("no pong within the keepalive window, tearing down");
                        tear_down(&connected, &correlator, &shutdown);
                        break;
                    }
                    let frame = match codec.encode(&Packet::Ping(String::new())) {
                        Ok(frame) => frame,
                        Err(error) => {
                            tracing::warn!(%error, "failed to encode ping");
                            continue;
                        }
                    };
                    if let Err(error) = sink.send(Message::Text(frame)).await {
                        tracing::warn!(%error, "keepalive write failed");
                        tear_down(&connected, &correlator, &shutdown);
                        break;
                    }
                }
                message = outbox.recv() => match message {
                    Some(message) => {
                        if let Err(error) = sink.send(message).await {
                            tracing::warn!(%error, "socket write failed");
                            tear_down(&connected, &correlator, &shutdown);
                            break;
                        }
                    }
                    None => break,
                },
            }
        }

        // This task owns the sink and runs once, so the transport is
        // closed exactly once no matter which path led here.
        let _ = sink.send(Message::Close(None)).await;
    }

    /// Reader task: decodes inbound frames and dispatches them.
    async fn read_loop(
        mut source: WsSource,
        inbound: Inbound,
        connected: Arc<AtomicBool>,
        correlator: Arc<Correlator>,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                frame = source.next() => {
                    let Some(frame) = frame else {
                        tracing::debug!("socket stream ended");
                        break;
                    };
                    match frame {
                        Ok(Message::Text(text)) => match inbound.codec.decode(&text) {
                            Ok(packet) => {
                                if !inbound.handle(packet).await {
                                    break;
                                }
                            }
                            Err(error) => {
                                tracing::warn!(%error, frame = %text, "dropping undecodable frame");
                            }
                        },
                        Ok(Message::Binary(bytes)) => {
                            let error = ProtocolError::UnexpectedBinaryFrame { size: bytes.len() };
                            tracing::warn!(%error, "dropping binary frame");
                        }
                        Ok(Message::Close(_)) => {
                            tracing::debug!("wallet closed the connection");
                            break;
                        }
                        // WebSocket-level ping/pong, answered by the transport.
                        Ok(_) => {}
                        Err(error) => {
                            tracing::warn!(%error, "socket read failed");
                            break;
                        }
                    }
                }
            }
        }

        tear_down(&connected, &correlator, &shutdown);
    }

    /// Read frames until one decodes into a packet. Undecodable frames are
    /// logged and skipped; a closed stream fails the handshake.
    async fn next_packet(source: &mut WsSource, codec: &PacketCodec) -> Result<Packet> {
        loop {
            let frame = source
                .next()
                .await
                .ok_or_else(closed_during_handshake)??;
            match frame {
                Message::Text(text) => match codec.decode(&text) {
                    Ok(packet) => return Ok(packet),
                    Err(error) => {
                        tracing::warn!(%error, "dropping undecodable frame during handshake");
                    }
                },
                Message::Binary(bytes) => {
                    let error = ProtocolError::UnexpectedBinaryFrame { size: bytes.len() };
                    tracing::warn!(%error, "dropping binary frame during handshake");
                }
                Message::Close(_) => return Err(closed_during_handshake()),
                _ => {}
            }
        }
    }

    async fn pong(sink: &mut WsSink, codec: &PacketCodec, data: String) -> Result<()> {
        let frame = codec.encode(&Packet::Pong(data))?;
        sink.send(Message::Text(frame)).await?;
        Ok(())
    }
}

impl Drop for SocketService {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for SocketService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketService")
            .field("endpoint", &self.endpoint)
            .field("connected", &self.is_connected())
            .field("pending", &self.pending_requests())
            .finish()
    }
}

fn closed_during_handshake() -> ScatterError {
    ScatterError::Transport("connection closed during handshake".to_string())
}

/// Flip the connected flag, fail every pending request, and stop both
/// tasks. Safe to call from any path, any number of times.
fn tear_down(connected: &AtomicBool, correlator: &Correlator, shutdown: &CancellationToken) {
    connected.store(false, Ordering::SeqCst);
    let dropped = correlator.fail_all();
    if dropped > 0 {
        tracing::debug!(pending = dropped, "failed pending requests on teardown");
    }
    shutdown.cancel();
}

/// Dispatch context for the reader task.
struct Inbound {
    origin: String,
    codec: PacketCodec,
    correlator: Arc<Correlator>,
    outbox: mpsc::Sender<Message>,
    storage: Arc<dyn StorageProvider>,
    last_pong: Arc<RwLock<Instant>>,
}

impl Inbound {
    /// Handle one decoded packet. Returns `false` when the connection must
    /// be torn down.
    async fn handle(&self, packet: Packet) -> bool {
        match packet {
            Packet::Ping(data) => {
                match self.codec.encode(&Packet::Pong(data)) {
                    Ok(frame) => {
                        let _ = self.outbox.send(Message::Text(frame)).await;
                    }
                    Err(error) => tracing::warn!(%error, "failed to encode pong"),
                }
                true
            }
            Packet::Pong(_) => {
                *self.last_pong.write().await = Instant::now();
                true
            }
            Packet::Close | Packet::Disconnect => {
                tracing::debug!("wallet signalled close");
                false
            }
            // Handshake packets after pairing carry no information.
            Packet::Open(_) | Packet::ConnectAck => true,
            Packet::Event { name, payload } => {
                self.handle_event(&name, payload).await;
                true
            }
        }
    }

    async fn handle_event(&self, name: &str, payload: Value) {
        match name {
            EVENT_API => match serde_json::from_value::<ApiResponse>(payload) {
                Ok(response) => {
                    let outcome = ApiResult::from_value(response.result);
                    if !self.correlator.resolve(&response.id, outcome) {
                        tracing::debug!(
                            id = %response.id,
                            "dropping response with no pending request"
                        );
                    }
                }
                Err(error) => tracing::warn!(%error, "dropping malformed api response"),
            },
            EVENT_REKEY => self.rotate_appkey().await,
            EVENT_PAIRED => tracing::debug!("pairing re-acknowledged"),
            other => tracing::debug!(event = other, "ignoring unknown event"),
        }
    }

    /// Generate and persist a fresh app key, then answer the wallet.
    /// In-flight requests are untouched.
    async fn rotate_appkey(&self) {
        let appkey = format!("appkey:{}", Uuid::new_v4());
        if let Err(error) = self.storage.save(KEY_APPKEY, &appkey) {
            tracing::warn!(%error, "failed to persist rotated app key");
        }

        let envelope = RekeyEnvelope::new(appkey, &self.origin);
        let encoded = serde_json::to_value(&envelope)
            .map_err(ProtocolError::from)
            .and_then(|value| self.codec.encode(&Packet::event(EVENT_REKEYED, value)));
        match encoded {
            Ok(frame) => {
                let _ = self.outbox.send(Message::Text(frame)).await;
                tracing::info!("rotated app key at wallet request");
            }
            Err(error) => tracing::warn!(%error, "failed to encode rekeyed event"),
        }
    }
}
