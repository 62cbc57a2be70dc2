//! HTTP player-count probes.
//!
//! One short-lived http1 connection per instance per pass, with the
//! whole exchange under a single timeout. Probes run concurrently in a
//! `JoinSet`; results and failures are keyed by server id.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use http_body_util::{BodyExt, Empty};
use tokio::task::JoinSet;
use tracing::debug;

use fleetgrid_registry::ServerRecord;

use crate::error::SampleError;

/// Outcome of one sampling pass over a fleet snapshot.
#[derive(Debug, Default)]
pub struct SampleReport {
    /// Successfully sampled player counts by server id.
    pub counts: HashMap<String, u32>,
    /// Per-id failures.
    pub failures: HashMap<String, SampleError>,
}

/// Source of live player counts for a set of fleet instances.
#[async_trait]
pub trait LoadSampler: Send + Sync {
    /// Sample every record; failures are collected per id, never
    /// returned as a batch-level error.
    async fn sample_all(&self, records: &[ServerRecord]) -> SampleReport;
}

/// Probes each instance's status endpoint over HTTP.
pub struct HttpLoadSampler {
    path: String,
    timeout: Duration,
}

impl HttpLoadSampler {
    pub fn new(path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            timeout,
        }
    }
}

impl Default for HttpLoadSampler {
    fn default() -> Self {
        Self::new("/players", Duration::from_secs(2))
    }
}

#[async_trait]
impl LoadSampler for HttpLoadSampler {
    async fn sample_all(&self, records: &[ServerRecord]) -> SampleReport {
        let mut probes = JoinSet::new();
        for rec in records {
            let address = rec.address();
            let id = rec.id.clone();
            let path = self.path.clone();
            let timeout = self.timeout;
            probes.spawn(async move {
                let result = fetch_player_count(&address, &path, timeout).await;
                (id, result)
            });
        }

        let mut report = SampleReport::default();
        while let Some(joined) = probes.join_next().await {
            let Ok((id, result)) = joined else { continue };
            match result {
                Ok(count) => {
                    report.counts.insert(id, count);
                }
                Err(err) => {
                    debug!(server_id = %id, error = %err, "player count probe failed");
                    report.failures.insert(id, err);
                }
            }
        }
        report
    }
}

/// Fetch the player count from one instance's status endpoint.
async fn fetch_player_count(
    address: &str,
    path: &str,
    timeout: Duration,
) -> Result<u32, SampleError> {
    let exchange = async {
        let stream = tokio::net::TcpStream::connect(address)
            .await
            .map_err(|e| SampleError::Connect(e.to_string()))?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| SampleError::Connect(e.to_string()))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = http::Request::builder()
            .method("GET")
            .uri(format!("http://{address}{path}"))
            .header("host", address)
            .header("user-agent", "fleetgrid-sampler/0.1")
            .body(Empty::<bytes::Bytes>::new())
            .map_err(|e| SampleError::Request(e.to_string()))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| SampleError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(SampleError::Status(resp.status().as_u16()));
        }

        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| SampleError::Request(e.to_string()))?
            .to_bytes();

        parse_player_count(&body)
    };

    match tokio::time::timeout(timeout, exchange).await {
        Ok(result) => result,
        Err(_) => Err(SampleError::Timeout),
    }
}

/// Parse a status-endpoint body: a bare integer, optionally surrounded
/// by whitespace.
fn parse_player_count(body: &[u8]) -> Result<u32, SampleError> {
    let text = std::str::from_utf8(body)
        .map_err(|_| SampleError::Parse(String::from_utf8_lossy(body).into_owned()))?;
    text.trim()
        .parse::<u32>()
        .map_err(|_| SampleError::Parse(text.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetgrid_registry::ServerStatus;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn test_record(id: &str, host: &str, port: u16) -> ServerRecord {
        ServerRecord {
            id: id.to_string(),
            host: host.to_string(),
            port,
            current_players: 0,
            max_players: 10,
            status: ServerStatus::Available,
            last_seen: 1000,
        }
    }

    /// Serve a canned HTTP response on an ephemeral port.
    async fn spawn_status_server(body: &'static str) -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });
        addr
    }

    #[test]
    fn parse_accepts_bare_and_padded_integers() {
        assert_eq!(parse_player_count(b"12"), Ok(12));
        assert_eq!(parse_player_count(b" 7\n"), Ok(7));
        assert_eq!(parse_player_count(b"0"), Ok(0));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            parse_player_count(b"lots"),
            Err(SampleError::Parse(_))
        ));
        assert!(matches!(
            parse_player_count(b"-3"),
            Err(SampleError::Parse(_))
        ));
        assert!(matches!(parse_player_count(b""), Err(SampleError::Parse(_))));
    }

    #[tokio::test]
    async fn probe_to_closed_port_fails_with_connect() {
        // Port 1 won't be listening.
        let result =
            fetch_player_count("127.0.0.1:1", "/players", Duration::from_millis(200)).await;
        assert!(matches!(result, Err(SampleError::Connect(_))));
    }

    #[tokio::test]
    async fn probe_reads_count_from_status_server() {
        let addr = spawn_status_server("7").await;
        let count = fetch_player_count(&addr.to_string(), "/players", Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(count, 7);
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_batch() {
        let addr = spawn_status_server("3").await;
        let records = vec![
            test_record("good", &addr.ip().to_string(), addr.port()),
            test_record("dead", "127.0.0.1", 1),
        ];

        let sampler = HttpLoadSampler::new("/players", Duration::from_millis(500));
        let report = sampler.sample_all(&records).await;

        assert_eq!(report.counts.get("good"), Some(&3));
        assert!(report.failures.contains_key("dead"));
        assert_eq!(report.counts.len(), 1);
        assert_eq!(report.failures.len(), 1);
    }

    #[tokio::test]
    async fn zero_count_is_reported_as_data() {
        let addr = spawn_status_server("0").await;
        let records = vec![test_record("idle", &addr.ip().to_string(), addr.port())];

        let sampler = HttpLoadSampler::default();
        let report = sampler.sample_all(&records).await;

        assert_eq!(report.counts.get("idle"), Some(&0));
        assert!(report.failures.is_empty());
    }
}
