//! Server-side writer.
//!
//! One dispatcher task owns the sink and drains a bounded queue of encoded
//! messages; an optional heartbeat task enqueues comment pings. `close`
//! drains the queue and writes the stream terminator, bounded by the close
//! timeout. Cancelling the token stops the dispatcher without draining.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use super::encoder::encode;
use super::message::Message;
use crate::error::StreamError;
use crate::traits::EventSink;

/// Default bound of the message queue.
pub const DEFAULT_QUEUE_SIZE: usize = 64;

/// Default upper bound on the shutdown drain.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(30);

const PING: &[u8] = b": ping\n\n";
const TERMINATOR: &[u8] = b"\n";

/// Callback invoked for every error the writer records.
pub type ErrorCallback = Arc<dyn Fn(&StreamError) + Send + Sync>;

/// Writer settings.
#[derive(Clone)]
pub struct WriterConfig {
    /// Bound of the FIFO between producers and the dispatcher. Zero is treated as one.
    pub queue_size: usize,
    /// Keep-alive interval; `None` or zero disables the heartbeat.
    pub heartbeat: Option<Duration>,
    /// Upper bound on the drain performed by `close`.
    pub close_timeout: Duration,
    pub on_error: Option<ErrorCallback>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            queue_size: DEFAULT_QUEUE_SIZE,
            heartbeat: None,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            on_error: None,
        }
    }
}

impl WriterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size;
        self
    }

    pub fn with_heartbeat(mut self, interval: Duration) -> Self {
        self.heartbeat = Some(interval);
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    pub fn with_on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&StreamError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat.filter(|d| !d.is_zero())
    }
}

impl fmt::Debug for WriterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterConfig")
            .field("queue_size", &self.queue_size)
            .field("heartbeat", &self.heartbeat)
            .field("close_timeout", &self.close_timeout)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// State shared between the handle and its tasks.
struct Shared {
    closed: AtomicBool,
    errors: Mutex<Vec<StreamError>>,
    on_error: Option<ErrorCallback>,
}

impl Shared {
    fn record(&self, err: StreamError) {
        tracing::warn!(code = err.error_code(), error = %err, "writer error");
        if let Some(callback) = &self.on_error {
            callback(&err);
        }
        self.errors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(err);
    }

    fn error(&self) -> Option<StreamError> {
        let errors = self
            .errors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        StreamError::join(errors)
    }

    fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct CloseState {
    tasks: Vec<JoinHandle<()>>,
    result: Option<Option<StreamError>>,
}

/// Streams messages to one SSE client.
///
/// Must be created inside a tokio runtime.
pub struct EventWriter {
    shared: Arc<Shared>,
    tx: mpsc::Sender<Bytes>,
    cancel: CancellationToken,
    close_signal: CancellationToken,
    close_timeout: Duration,
    close_state: tokio::sync::Mutex<CloseState>,
    connection_id: Uuid,
}

impl EventWriter {
    /// Apply the event-stream headers to `sink` and start the writer tasks.
    ///
    /// Fails with [`StreamError::SinkNotFlushable`] if the sink cannot flush.
    pub fn new<S: EventSink>(
        cancel: CancellationToken,
        mut sink: S,
        config: WriterConfig,
    ) -> Result<Self, StreamError> {
        if !sink.can_flush() {
            return Err(StreamError::SinkNotFlushable);
        }
        apply_headers(&mut sink);

        let connection_id = Uuid::new_v4();
        let span = tracing::debug_span!("sse_writer", connection_id = %connection_id);
        let shared = Arc::new(Shared {
            closed: AtomicBool::new(false),
            errors: Mutex::new(Vec::new()),
            on_error: config.on_error.clone(),
        });
        let close_signal = CancellationToken::new();
        let (tx, rx) = mpsc::channel(config.queue_size.max(1));

        let mut tasks = Vec::with_capacity(2);
        tasks.push(tokio::spawn(
            dispatch(sink, rx, shared.clone(), cancel.clone(), close_signal.clone())
                .instrument(span.clone()),
        ));
        if let Some(period) = config.heartbeat_interval() {
            tasks.push(tokio::spawn(
                heartbeat(period, tx.clone(), shared.clone(), cancel.clone(), close_signal.clone())
                    .instrument(span.clone()),
            ));
        }
        span.in_scope(|| {
            tracing::debug!(
                queue_size = config.queue_size,
                heartbeat = ?config.heartbeat_interval(),
                "writer started"
            )
        });

        Ok(Self {
            shared,
            tx,
            cancel,
            close_signal,
            close_timeout: config.close_timeout,
            close_state: tokio::sync::Mutex::new(CloseState {
                tasks,
                result: None,
            }),
            connection_id,
        })
    }

    /// Identifier attached to this writer's log records.
    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    /// Encode and enqueue a message.
    ///
    /// Waits for a free queue slot. Fails with `WriterClosed` if the writer
    /// is closed or cancelled before the message is queued. Encoder errors
    /// are returned as-is.
    pub async fn send(&self, msg: &Message) -> Result<(), StreamError> {
        if self.is_closed() {
            return Err(StreamError::WriterClosed);
        }
        let bytes = encode(msg)?;
        self.enqueue(bytes).await
    }

    /// Send an event with no payload. The data is a single empty line pair
    /// so that clients dispatch it.
    pub async fn send_event(&self, name: &str) -> Result<(), StreamError> {
        let msg = Message::default()
            .with_event(name)
            .with_data(Bytes::from_static(b"\n"));
        self.send(&msg).await
    }

    /// Serialize `value` as JSON and send it as the message data.
    pub async fn send_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), StreamError> {
        let data = serde_json::to_vec(value)?;
        self.send(&Message::new(data)).await
    }

    async fn enqueue(&self, bytes: Bytes) -> Result<(), StreamError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StreamError::WriterClosed),
            res = self.tx.send(bytes) => res.map_err(|_| StreamError::WriterClosed),
        }
    }

    /// Drain the queue, write the terminator and stop the tasks.
    ///
    /// Waits at most the configured close timeout; on expiry a
    /// `CloseTimeout` is recorded and the tasks are aborted. Returns the
    /// aggregated error. Repeated calls return the same value.
    pub async fn close(&self) -> Option<StreamError> {
        let mut state = self.close_state.lock().await;
        if let Some(result) = &state.result {
            return result.clone();
        }

        self.shared.mark_closed();
        self.close_signal.cancel();
        tracing::debug!(connection_id = %self.connection_id, "writer closing");

        let tasks = std::mem::take(&mut state.tasks);
        let aborts: Vec<_> = tasks.iter().map(|t| t.abort_handle()).collect();
        if tokio::time::timeout(self.close_timeout, futures::future::join_all(tasks))
            .await
            .is_err()
        {
            for abort in aborts {
                abort.abort();
            }
            self.shared.record(StreamError::CloseTimeout {
                timeout_ms: self.close_timeout.as_millis() as u64,
            });
        }

        let result = self.shared.error();
        tracing::debug!(
            connection_id = %self.connection_id,
            failed = result.is_some(),
            "writer closed"
        );
        state.result = Some(result.clone());
        result
    }

    /// True once `close` was called, the token was cancelled, or the sink failed.
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// All errors recorded so far, aggregated.
    pub fn error(&self) -> Option<StreamError> {
        self.shared.error()
    }
}

impl Drop for EventWriter {
    fn drop(&mut self) {
        self.shared.mark_closed();
        self.close_signal.cancel();
    }
}

impl fmt::Debug for EventWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventWriter")
            .field("connection_id", &self.connection_id)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

fn apply_headers<S: EventSink>(sink: &mut S) {
    sink.set_header("Content-Type", "text/event-stream; charset=utf-8");
    sink.set_header("Connection", "keep-alive");
    if sink.header("Cache-Control").is_none() {
        sink.set_header("Cache-Control", "no-cache");
    }
}

async fn write_chunk<S: EventSink>(sink: &mut S, chunk: Bytes) -> Result<(), StreamError> {
    sink.write(chunk).await?;
    sink.flush().await
}

async fn dispatch<S: EventSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<Bytes>,
    shared: Arc<Shared>,
    cancel: CancellationToken,
    close_signal: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                shared.mark_closed();
                shared.record(StreamError::Cancelled);
                return;
            }
            _ = close_signal.cancelled() => break,
            item = rx.recv() => match item {
                Some(chunk) => {
                    if let Err(err) = write_chunk(&mut sink, chunk).await {
                        shared.mark_closed();
                        shared.record(err);
                        return;
                    }
                }
                None => break,
            },
        }
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            shared.record(StreamError::Cancelled);
        }
        res = drain(&mut sink, &mut rx) => {
            if let Err(err) = res {
                shared.record(err);
            }
        }
    }
}

async fn drain<S: EventSink>(sink: &mut S, rx: &mut mpsc::Receiver<Bytes>) -> Result<(), StreamError> {
    rx.close();
    let mut drained = 0usize;
    while let Some(chunk) = rx.recv().await {
        write_chunk(sink, chunk).await?;
        drained += 1;
    }
    tracing::debug!(drained, "queue drained");
    write_chunk(sink, Bytes::from_static(TERMINATOR)).await
}

async fn heartbeat(
    period: Duration,
    tx: mpsc::Sender<Bytes>,
    shared: Arc<Shared>,
    cancel: CancellationToken,
    close_signal: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = close_signal.cancelled() => return,
            _ = ticker.tick() => {
                if shared.is_closed() {
                    return;
                }
                match tx.try_send(Bytes::from_static(PING)) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => tracing::trace!("queue full, heartbeat dropped"),
                    Err(TrySendError::Closed(_)) => return,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::RecordingSink;

    #[tokio::test]
    async fn test_fifo_then_terminator() {
        let sink = RecordingSink::new();
        let writer = EventWriter::new(CancellationToken::new(), sink.clone(), WriterConfig::default()).unwrap();

        let a = Message::new("1").with_event("a");
        let b = Message::new("2").with_event("b");
        writer.send(&a).await.unwrap();
        writer.send(&b).await.unwrap();
        assert_eq!(writer.close().await, None);

        let mut expected = encode(&a).unwrap().to_vec();
        expected.extend_from_slice(&encode(&b).unwrap());
        expected.push(b'\n');
        assert_eq!(sink.bytes(), expected);
        assert!(sink.flush_count() >= 3);
    }

    #[tokio::test]
    async fn test_headers_applied_at_construction() {
        let sink = RecordingSink::new().with_header("Cache-Control", "private");
        let _writer = EventWriter::new(CancellationToken::new(), sink.clone(), WriterConfig::default()).unwrap();

        assert_eq!(
            sink.header("content-type"),
            Some("text/event-stream; charset=utf-8".to_string())
        );
        assert_eq!(sink.header("Connection"), Some("keep-alive".to_string()));
        assert_eq!(sink.header("Cache-Control"), Some("private".to_string()));
    }

    #[tokio::test]
    async fn test_default_cache_control() {
        let sink = RecordingSink::new();
        let _writer = EventWriter::new(CancellationToken::new(), sink.clone(), WriterConfig::default()).unwrap();
        assert_eq!(sink.header("cache-control"), Some("no-cache".to_string()));
    }

    #[tokio::test]
    async fn test_rejects_non_flushable_sink() {
        let err = EventWriter::new(
            CancellationToken::new(),
            RecordingSink::non_flushable(),
            WriterConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, StreamError::SinkNotFlushable);
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let writer = EventWriter::new(CancellationToken::new(), RecordingSink::new(), WriterConfig::default()).unwrap();
        writer.close().await;
        assert!(writer.is_closed());
        assert_eq!(
            writer.send(&Message::new("late")).await,
            Err(StreamError::WriterClosed)
        );
    }

    #[tokio::test]
    async fn test_encoder_errors_pass_through() {
        let writer = EventWriter::new(CancellationToken::new(), RecordingSink::new(), WriterConfig::default()).unwrap();
        assert_eq!(writer.send(&Message::default()).await, Err(StreamError::NoContent));
        assert!(matches!(
            writer.send(&Message::new("x").with_event("a..b")).await,
            Err(StreamError::InvalidEventName { .. })
        ));
        assert_eq!(writer.close().await, None);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let sink = RecordingSink::new().fail_writes_after(0);
        let writer = EventWriter::new(CancellationToken::new(), sink, WriterConfig::default()).unwrap();
        let _ = writer.send(&Message::new("x")).await;

        let first = writer.close().await;
        let second = writer.close().await;
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_send_event_and_json() {
        let sink = RecordingSink::new();
        let writer = EventWriter::new(CancellationToken::new(), sink.clone(), WriterConfig::default()).unwrap();
        writer.send_event("ready").await.unwrap();
        writer.send_json(&serde_json::json!({"n": 1})).await.unwrap();
        writer.close().await;

        let text = String::from_utf8(sink.bytes()).unwrap();
        assert_eq!(
            text,
            "event: ready\ndata: \ndata: \n\ndata: {\"n\":1}\n\n\n"
        );
    }

    #[tokio::test]
    async fn test_cancellation_records_error_without_drain() {
        let cancel = CancellationToken::new();
        let sink = RecordingSink::new();
        let writer = EventWriter::new(cancel.clone(), sink.clone(), WriterConfig::default()).unwrap();

        cancel.cancel();
        assert_eq!(
            writer.send(&Message::new("x")).await,
            Err(StreamError::WriterClosed)
        );
        let err = writer.close().await.unwrap();
        assert!(err.contains(|e| *e == StreamError::Cancelled));
        assert!(writer.is_closed());
        assert!(sink.bytes().is_empty());
    }

    #[tokio::test]
    async fn test_sink_failure_closes_writer_and_calls_back() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_cb = seen.clone();
        let config = WriterConfig::default().with_on_error(move |e| seen_cb.lock().unwrap().push(e.clone()));
        let writer = EventWriter::new(
            CancellationToken::new(),
            RecordingSink::new().fail_writes_after(1),
            config,
        )
        .unwrap();

        writer.send(&Message::new("ok")).await.unwrap();
        writer.send(&Message::new("boom")).await.unwrap();
        let err = writer.close().await.unwrap();

        assert!(matches!(err, StreamError::Write { .. }));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_pings() {
        let sink = RecordingSink::new();
        let config = WriterConfig::default().with_heartbeat(Duration::from_secs(5));
        let writer = EventWriter::new(CancellationToken::new(), sink.clone(), config).unwrap();

        tokio::time::sleep(Duration::from_secs(11)).await;
        writer.close().await;

        let text = String::from_utf8(sink.bytes()).unwrap();
        assert_eq!(text, ": ping\n\n: ping\n\n\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_queue_holds_senders_and_drops_pings() {
        let sink = RecordingSink::new().with_write_delay(Duration::from_secs(10));
        let config = WriterConfig::new()
            .with_queue_size(1)
            .with_heartbeat(Duration::from_secs(1))
            .with_close_timeout(Duration::from_secs(300));
        let writer = EventWriter::new(CancellationToken::new(), sink.clone(), config).unwrap();

        let a = Message::new("a");
        let b = Message::new("b");
        let c = Message::new("c");
        let start = Instant::now();

        // `a` is in the sink's slow write, `b` holds the only slot.
        writer.send(&a).await.unwrap();
        writer.send(&b).await.unwrap();

        let mut blocked = Box::pin(writer.send(&c));
        assert!(futures::poll!(&mut blocked).is_pending());
        assert!(tokio::time::timeout(Duration::from_secs(5), &mut blocked)
            .await
            .is_err());
        assert!(sink.bytes().is_empty());

        blocked.await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(10));
        assert_eq!(writer.close().await, None);

        let mut expected = Vec::new();
        for msg in [&a, &b, &c] {
            expected.extend_from_slice(&encode(msg).unwrap());
        }
        expected.push(b'\n');
        assert_eq!(sink.bytes(), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_timeout_recorded() {
        let sink = RecordingSink::new().with_write_delay(Duration::from_secs(60));
        let config = WriterConfig::default().with_close_timeout(Duration::from_millis(100));
        let writer = EventWriter::new(CancellationToken::new(), sink, config).unwrap();

        writer.send(&Message::new("slow")).await.unwrap();
        let err = writer.close().await.unwrap();
        assert_eq!(err, StreamError::CloseTimeout { timeout_ms: 100 });
        assert!(writer.is_closed());
    }

    #[test]
    fn test_config_defaults() {
        let config = WriterConfig::default();
        assert_eq!(config.queue_size, 64);
        assert_eq!(config.heartbeat_interval(), None);
        assert_eq!(config.close_timeout, Duration::from_secs(30));
        assert_eq!(
            WriterConfig::default().with_heartbeat(Duration::ZERO).heartbeat_interval(),
            None
        );
    }
}
