// src/debug/redis_sink.rs
//! Redis-backed debug sink
//!
//! Snapshots are handed to a background writer through a watch channel, so
//! `publish` never waits on the store and only the newest snapshot is ever
//! written. Connect and command time are both bounded; a failed write drops
//! the connection and the next snapshot reconnects.
//!
//! ```text
//! slot transition → publish() → watch (latest only) → writer task → SET key json
//! ```

use crate::debug::sink::DebugSink;
use crate::debug::snapshot::DebugSnapshot;
use crate::observability::DEBUG_PUBLISH_FAILURES;
use crate::utils::config::DebugSinkConfig;
use crate::utils::errors::{PoolError, Result};
use redis::aio::MultiplexedConnection;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Failure writing one snapshot. Logged by the writer, never surfaced.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("timed out after {0:?} while {1}")]
    Timeout(Duration, &'static str),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Writer counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    pub written: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    written: AtomicU64,
    failed: AtomicU64,
}

/// Debug sink writing `{ts, urls}` JSON under a fixed key
pub struct RedisDebugSink {
    key: String,
    tx: watch::Sender<Option<DebugSnapshot>>,
    counters: Arc<Counters>,
    writer_handle: JoinHandle<()>,
}

impl RedisDebugSink {
    /// Create the sink and start its writer on the current tokio runtime
    pub fn spawn(config: &DebugSinkConfig) -> Result<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| PoolError::NoRuntime)?;

        let client = redis::Client::open(config.redis_url()).map_err(|e| {
            PoolError::invalid_config(format!("invalid debug store address: {}", e))
        })?;
        let key = config.debug_key();
        info!(
            target: "render_pool::debug",
            host = %config.host,
            port = config.port,
            key = %key,
            "debug snapshot store configured"
        );

        let writer = SnapshotWriter {
            client,
            key: key.clone(),
            connect_timeout: config.connect_timeout(),
            io_timeout: config.io_timeout(),
        };
        let (tx, rx) = watch::channel(None);
        let counters = Arc::new(Counters::default());
        let writer_handle = runtime.spawn(writer.run(rx, Arc::clone(&counters)));

        Ok(Self {
            key,
            tx,
            counters,
            writer_handle,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn stats(&self) -> SinkStats {
        SinkStats {
            written: self.counters.written.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

impl DebugSink for RedisDebugSink {
    fn publish(&self, snapshot: DebugSnapshot) {
        // send_replace never fails, even with the writer gone
        self.tx.send_replace(Some(snapshot));
    }
}

impl Drop for RedisDebugSink {
    fn drop(&mut self) {
        self.writer_handle.abort();
    }
}

struct SnapshotWriter {
    client: redis::Client,
    key: String,
    connect_timeout: Duration,
    io_timeout: Duration,
}

impl SnapshotWriter {
    async fn run(self, mut rx: watch::Receiver<Option<DebugSnapshot>>, counters: Arc<Counters>) {
        let mut connection: Option<MultiplexedConnection> = None;

        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            let Some(snapshot) = snapshot else {
                continue;
            };

            match self.write(&mut connection, &snapshot).await {
                Ok(()) => {
                    counters.written.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        target: "render_pool::debug",
                        active = snapshot.urls.len(),
                        "debug snapshot written"
                    );
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    metrics::counter!(DEBUG_PUBLISH_FAILURES).increment(1);
                    warn!(target: "render_pool::debug", error = %e, "debug_update failed");
                }
            }
        }
    }

    async fn write(
        &self,
        connection: &mut Option<MultiplexedConnection>,
        snapshot: &DebugSnapshot,
    ) -> std::result::Result<(), SinkError> {
        let payload = snapshot.to_bytes()?;

        let mut conn = match connection.take() {
            Some(conn) => conn,
            None => self.connect().await?,
        };

        let mut cmd = redis::cmd("SET");
        cmd.arg(&self.key).arg(payload);
        let _: () = tokio::time::timeout(self.io_timeout, cmd.query_async(&mut conn))
            .await
            .map_err(|_| SinkError::Timeout(self.io_timeout, "writing snapshot"))??;

        *connection = Some(conn);
        Ok(())
    }

    async fn connect(&self) -> std::result::Result<MultiplexedConnection, SinkError> {
        let conn = tokio::time::timeout(
            self.connect_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| SinkError::Timeout(self.connect_timeout, "connecting"))??;
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;
    use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};

    type Writes = Arc<Mutex<Vec<(String, String)>>>;

    fn unreachable_store() -> DebugSinkConfig {
        DebugSinkConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            task_id: Some("test-task".to_string()),
            connect_timeout_secs: 1,
            io_timeout_secs: 1,
            ..Default::default()
        }
    }

    async fn wait_for(mut done: impl FnMut() -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !done() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// In-process store speaking enough RESP to accept SETs
    struct FakeStore {
        port: u16,
        writes: Writes,
        connections: Arc<AtomicUsize>,
    }

    impl FakeStore {
        /// The first connection is hung up on as soon as it sends a SET
        async fn start() -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let port = listener.local_addr().unwrap().port();
            let writes = Writes::default();
            let connections = Arc::new(AtomicUsize::new(0));

            let (accepted, recorded) = (Arc::clone(&connections), Arc::clone(&writes));
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let n = accepted.fetch_add(1, Ordering::SeqCst) + 1;
                    tokio::spawn(serve(stream, Arc::clone(&recorded), n == 1));
                }
            });

            Self {
                port,
                writes,
                connections,
            }
        }
    }

    async fn serve(stream: TcpStream, writes: Writes, hang_up_after_set: bool) {
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        while let Ok(Some(args)) = read_command(&mut reader).await {
            let is_set = args.first().is_some_and(|name| name.eq_ignore_ascii_case(b"SET"));
            if is_set && args.len() >= 3 {
                writes.lock().push((
                    String::from_utf8_lossy(&args[1]).into_owned(),
                    String::from_utf8_lossy(&args[2]).into_owned(),
                ));
                if hang_up_after_set {
                    return;
                }
            }
            if write_half.write_all(b"+OK\r\n").await.is_err() {
                return;
            }
        }
    }

    /// Read one `*N` array of `$len` bulk strings
    async fn read_command<R>(reader: &mut R) -> std::io::Result<Option<Vec<Vec<u8>>>>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        let count = parse_header(&line, '*')?;

        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            line.clear();
            reader.read_line(&mut line).await?;
            let len = parse_header(&line, '$')?;
            let mut arg = vec![0; len + 2];
            reader.read_exact(&mut arg).await?;
            arg.truncate(len);
            args.push(arg);
        }
        Ok(Some(args))
    }

    fn parse_header(line: &str, marker: char) -> std::io::Result<usize> {
        line.trim_end()
            .strip_prefix(marker)
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::InvalidData, format!("bad header {line:?}"))
            })
    }

    #[test]
    fn test_spawn_requires_runtime() {
        let result = RedisDebugSink::spawn(&unreachable_store());
        assert!(matches!(result, Err(PoolError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_key_is_fixed_at_construction() {
        let sink = RedisDebugSink::spawn(&unreachable_store()).unwrap();
        assert_eq!(sink.key(), "render-urls-test-task");
    }

    #[tokio::test]
    async fn test_store_outage_is_absorbed() {
        let sink = RedisDebugSink::spawn(&unreachable_store()).unwrap();
        sink.publish(DebugSnapshot::new(vec!["http://example.com".into()]));

        wait_for(|| sink.stats().failed > 0).await;

        let stats = sink.stats();
        assert_eq!(stats.written, 0);
        assert!(stats.failed >= 1);

        // Still accepts snapshots after a failure
        sink.publish(DebugSnapshot::new(vec![]));
    }

    #[tokio::test]
    async fn test_reconnects_after_dropped_connection() {
        let store = FakeStore::start().await;
        let config = DebugSinkConfig {
            host: "127.0.0.1".to_string(),
            port: store.port,
            task_id: Some("t1".to_string()),
            connect_timeout_secs: 1,
            io_timeout_secs: 1,
            ..Default::default()
        };
        let sink = RedisDebugSink::spawn(&config).unwrap();

        sink.publish(DebugSnapshot::new(vec!["http://a".to_string()]));
        wait_for(|| sink.stats().failed == 1).await;

        sink.publish(DebugSnapshot::new(vec![]));
        wait_for(|| sink.stats().written == 1).await;

        assert_eq!(
            sink.stats(),
            SinkStats {
                written: 1,
                failed: 1
            }
        );
        assert_eq!(store.connections.load(Ordering::SeqCst), 2);

        let writes = store.writes.lock().clone();
        assert_eq!(writes.len(), 2);
        assert!(writes.iter().all(|(key, _)| key == "render-urls-t1"));
        let urls: Vec<Vec<String>> = writes
            .iter()
            .map(|(_, payload)| serde_json::from_str::<DebugSnapshot>(payload).unwrap().urls)
            .collect();
        assert_eq!(urls, vec![vec!["http://a".to_string()], vec![]]);
    }
}
