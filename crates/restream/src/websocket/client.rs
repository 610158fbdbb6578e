//! WebSocket client with an explicit lifecycle state machine.

use std::sync::Arc;

use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use serde::Serialize;
use tokio::{net::TcpStream, sync::broadcast, task::JoinHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async_with_config,
    tungstenite::{Message, protocol::WebSocketConfig},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{config::WsConfig, events::{ConnectionState, WsEvent}};
use crate::{
    dispatch::{Callback, contain},
    error::{TransportError, TransportResult},
    handlers::MessageHandler,
    queue::{EventQueue, event_queue},
    retry::RetryState,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Decoded data frame handed from the receive loop to the dispatch task.
enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

/// WebSocket client.
///
/// Owns a full-duplex connection and sequences it through
/// [`ConnectionState`]: `Closed -> Connecting -> Open -> Closing ->
/// Closed`. A failed connect retries up to the configured budget and then
/// returns the underlying error (a connection failure is a hard error,
/// unlike the best-effort long-polling manager). Received frames flow
/// through an internal queue to a dispatch task that raises broadcast
/// events and invokes the inline callbacks and message handler.
///
/// Control calls (`connect`, `close`, `listen`) take `&mut self` and
/// assume single-threaded sequencing; the receive loop and its dispatch
/// task run concurrently with the caller by design.
pub struct WsClient {
    config: Arc<WsConfig>,
    state: ConnectionState,
    retries: RetryState,
    writer: Option<Arc<tokio::sync::Mutex<WsSink>>>,
    reader: Option<WsSource>,
    cancel: Option<CancellationToken>,
    listen_handle: Option<JoinHandle<TransportResult<()>>>,
    events_tx: broadcast::Sender<WsEvent>,
    on_text: Option<Callback<String>>,
    on_binary: Option<Callback<Vec<u8>>>,
    handler: Option<Arc<dyn MessageHandler>>,
}

impl WsClient {
    /// Create a client from a validated configuration.
    pub fn new(config: WsConfig) -> TransportResult<Self> {
        config.validate().map_err(TransportError::config)?;
        let (events_tx, _) = broadcast::channel(config.event_channel_capacity);
        let retries = RetryState::new(config.max_reconnect_retries);
        Ok(Self {
            config: Arc::new(config),
            state: ConnectionState::Closed,
            retries,
            writer: None,
            reader: None,
            cancel: None,
            listen_handle: None,
            events_tx,
            on_text: None,
            on_binary: None,
            handler: None,
        })
    }

    /// Set the inline callback fired once per received text frame.
    #[must_use]
    pub fn on_text(mut self, callback: impl Fn(&String) + Send + Sync + 'static) -> Self {
        self.on_text = Some(Arc::new(callback));
        self
    }

    /// Set the inline callback fired once per received binary frame.
    #[must_use]
    pub fn on_binary(mut self, callback: impl Fn(&Vec<u8>) + Send + Sync + 'static) -> Self {
        self.on_binary = Some(Arc::new(callback));
        self
    }

    /// Attach a message handler object. Fired independently of the inline
    /// callbacks.
    #[must_use]
    pub fn handler(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Consecutive connect failures recorded so far.
    pub fn current_retries(&self) -> u32 {
        self.retries.current()
    }

    /// Subscribe to the observable lifecycle and frame events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<WsEvent> {
        self.events_tx.subscribe()
    }

    /// Connect to the server.
    ///
    /// A no-op while already `Open`. Fires `Connecting` once per call that
    /// actually connects, then `Connected` on success. Each failed attempt
    /// fires `Reconnecting` and waits the reconnect interval; once the
    /// retry budget is spent the client transitions to `Closed` and the
    /// underlying error is returned.
    pub async fn connect(&mut self, cancel: Option<CancellationToken>) -> TransportResult<()> {
        if self.state == ConnectionState::Open {
            debug!(url = %self.config.url, "connect called while open, ignoring");
            return Ok(());
        }

        let cancel = cancel.unwrap_or_default();
        self.state = ConnectionState::Connecting;
        self.emit(WsEvent::Connecting);

        loop {
            match self.connect_once(&cancel).await {
                Ok(stream) => {
                    let (sink, source) = stream.split();
                    self.writer = Some(Arc::new(tokio::sync::Mutex::new(sink)));
                    self.reader = Some(source);
                    self.cancel = Some(cancel);
                    self.retries.reset();
                    self.state = ConnectionState::Open;
                    self.emit(WsEvent::Connected);
                    info!(url = %self.config.url, "WebSocket connected");
                    return Ok(());
                }
                Err(error) if error.is_cancelled() => {
                    self.state = ConnectionState::Closed;
                    return Err(error);
                }
                Err(error) => {
                    let attempt = self.retries.record_failure();
                    if attempt > self.config.max_reconnect_retries {
                        warn!(url = %self.config.url, %error, "WebSocket connect retries exhausted");
                        self.state = ConnectionState::Closed;
                        return Err(error);
                    }
                    warn!(url = %self.config.url, %error, attempt, "WebSocket connect failed, retrying");
                    self.emit(WsEvent::Reconnecting { attempt });
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            self.state = ConnectionState::Closed;
                            return Err(TransportError::Cancelled);
                        }
                        _ = tokio::time::sleep(self.config.reconnect_interval) => {}
                    }
                }
            }
        }
    }

    /// Explicitly re-run the connect state machine. Like
    /// [`connect`](Self::connect), a no-op while `Open`.
    pub async fn reconnect(&mut self, cancel: Option<CancellationToken>) -> TransportResult<()> {
        self.connect(cancel).await
    }

    async fn connect_once(&self, cancel: &CancellationToken) -> TransportResult<WsStream> {
        let mut ws_config = WebSocketConfig::default();
        ws_config.max_message_size = Some(self.config.receive_buffer_size);
        ws_config.max_frame_size = Some(self.config.receive_buffer_size);

        let connect =
            connect_async_with_config(self.config.url.as_str(), Some(ws_config), false);
        let timeout = self.config.connect_timeout;

        let attempt = async move {
            if timeout.is_zero() {
                connect.await.map_err(TransportError::from)
            } else {
                match tokio::time::timeout(timeout, connect).await {
                    Ok(result) => result.map_err(TransportError::from),
                    Err(_) => Err(TransportError::timeout(timeout)),
                }
            }
        };

        let (stream, _response) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            result = attempt => result?,
        };
        Ok(stream)
    }

    /// Start the background frame-receive loop.
    ///
    /// A no-op without an active connection. Frames are queued by the
    /// receive loop and dispatched (broadcast event, inline callback,
    /// handler) by a separate task, so slow user code never stalls the
    /// socket.
    pub fn listen(&mut self) {
        let Some(reader) = self.reader.take() else {
            debug!(url = %self.config.url, "listen called without an active connection, ignoring");
            return;
        };
        let Some(writer) = self.writer.as_ref().map(Arc::clone) else {
            return;
        };

        let cancel = self.cancel.clone().unwrap_or_default();
        let events_tx = self.events_tx.clone();
        let on_text = self.on_text.clone();
        let on_binary = self.on_binary.clone();
        let handler = self.handler.clone();

        self.listen_handle = Some(tokio::spawn(async move {
            let (queue, mut frames) = event_queue::<Frame>();

            let consumer = tokio::spawn(async move {
                while let Some(frame) = frames.recv().await {
                    match frame {
                        Frame::Text(text) => {
                            let _ = events_tx.send(WsEvent::TextReceived(text.clone()));
                            if let Some(cb) = &on_text {
                                contain("on_text", || cb(&text));
                            }
                            if let Some(h) = &handler {
                                contain("handler.on_text", || h.on_text(&text));
                            }
                        }
                        Frame::Binary(data) => {
                            let _ = events_tx.send(WsEvent::BinaryReceived(data.clone()));
                            if let Some(cb) = &on_binary {
                                contain("on_binary", || cb(&data));
                            }
                            if let Some(h) = &handler {
                                contain("handler.on_binary", || h.on_binary(&data));
                            }
                        }
                    }
                }
            });

            let result = receive_loop(reader, writer, &queue, &cancel).await;

            // Buffered frames are still dispatched after the loop stops.
            queue.complete();
            let _ = consumer.await;
            result
        }));
    }

    /// Write one text frame to the open connection.
    pub async fn send_text(&self, text: impl Into<String>) -> TransportResult<()> {
        let writer = self.require_writer()?;
        writer.lock().await.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Write one binary frame to the open connection.
    pub async fn send_binary(&self, data: impl Into<Vec<u8>>) -> TransportResult<()> {
        let writer = self.require_writer()?;
        writer
            .lock()
            .await
            .send(Message::Binary(data.into()))
            .await?;
        Ok(())
    }

    /// Serialize a payload to JSON and send it as one text frame.
    pub async fn send_json<T: Serialize>(&self, payload: &T) -> TransportResult<()> {
        let json = serde_json::to_string(payload)?;
        self.send_text(json).await
    }

    /// Block until the receive loop ends.
    ///
    /// Used to keep a process alive while listening. Returns immediately
    /// when [`listen`](Self::listen) was never called.
    pub async fn wait(&mut self) -> TransportResult<()> {
        let Some(handle) = self.listen_handle.take() else {
            return Ok(());
        };
        match handle.await {
            Ok(result) => result,
            Err(e) => Err(TransportError::internal(format!(
                "receive loop task failed: {e}"
            ))),
        }
    }

    /// Close the connection.
    ///
    /// Idempotent: the `Closing`/`Closed` events fire exactly once, on the
    /// transition out of a non-`Closed` state. Afterwards every internal
    /// handle is released and the retry counter is back at zero.
    pub async fn close(&mut self) -> TransportResult<()> {
        if self.state == ConnectionState::Closed {
            debug!(url = %self.config.url, "close called while closed, ignoring");
            return Ok(());
        }

        self.state = ConnectionState::Closing;
        self.emit(WsEvent::Closing);

        if let Some(cancel) = &self.cancel {
            cancel.cancel();
        }
        if let Some(writer) = &self.writer {
            // Best-effort close frame; the peer may already be gone.
            let _ = writer.lock().await.send(Message::Close(None)).await;
        }
        if let Some(handle) = self.listen_handle.take() {
            let _ = handle.await;
        }

        self.writer = None;
        self.reader = None;
        self.cancel = None;
        self.retries.reset();
        self.state = ConnectionState::Closed;
        self.emit(WsEvent::Closed);
        info!(url = %self.config.url, "WebSocket closed");
        Ok(())
    }

    fn require_writer(&self) -> TransportResult<&Arc<tokio::sync::Mutex<WsSink>>> {
        self.writer
            .as_ref()
            .ok_or_else(|| TransportError::websocket("not connected"))
    }

    fn emit(&self, event: WsEvent) {
        // No subscribers is fine.
        let _ = self.events_tx.send(event);
    }
}

/// Drive the socket until close, error, or cancellation, pushing decoded
/// data frames onto the queue. Protocol pings are answered inline.
async fn receive_loop(
    mut reader: WsSource,
    writer: Arc<tokio::sync::Mutex<WsSink>>,
    queue: &EventQueue<Frame>,
    cancel: &CancellationToken,
) -> TransportResult<()> {
    loop {
        let message = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            message = reader.next() => message,
        };

        match message {
            Some(Ok(Message::Text(text))) => {
                queue.push(Frame::Text(text));
            }
            Some(Ok(Message::Binary(data))) => {
                queue.push(Frame::Binary(data));
            }
            Some(Ok(Message::Ping(payload))) => {
                if let Err(error) = writer.lock().await.send(Message::Pong(payload)).await {
                    warn!(%error, "failed to answer ping");
                }
            }
            Some(Ok(Message::Pong(_) | Message::Frame(_))) => {}
            Some(Ok(Message::Close(frame))) => {
                debug!(?frame, "server closed the connection");
                return Ok(());
            }
            Some(Err(error)) => return Err(error.into()),
            None => return Ok(()),
        }
    }
}
