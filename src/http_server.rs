//! Operational HTTP endpoint.
//!
//! Serves two routes next to the broker port: `GET /healthz` returns a
//! liveness body with the current UTC time, and `GET /metrics` returns the
//! Prometheus text exposition of the broker's counters and gauge.

use crate::metrics::BrokerMetrics;
use crate::Result;
use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

pub struct HttpOpsServer {
    metrics: Arc<BrokerMetrics>,
    host: String,
    port: u16,
}

impl HttpOpsServer {
    pub fn new(metrics: Arc<BrokerMetrics>, host: &str, port: u16) -> Self {
        Self {
            metrics,
            host: host.to_string(),
            port,
        }
    }

    /// Bind and serve until the owning task is dropped.
    pub async fn run(&self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr).await?;
        info!(address = %addr, "ops endpoint listening");

        loop {
            let (stream, _) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let metrics = Arc::clone(&self.metrics);

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let metrics = Arc::clone(&metrics);
                    async move { route(&req, &metrics) }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!(error = %e, "ops connection error");
                }
            });
        }
    }
}

fn route(
    req: &Request<Incoming>,
    metrics: &BrokerMetrics,
) -> std::result::Result<Response<Full<Bytes>>, hyper::http::Error> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/healthz") => Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(health_body()))),
        (&Method::GET, "/metrics") => match metrics.encode() {
            Ok(body) => Response::builder()
                .status(StatusCode::OK)
                .header(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")
                .body(Full::new(Bytes::from(body))),
            Err(e) => Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Full::new(Bytes::from(format!("metrics encoding: {e}")))),
        },
        _ => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("not found"))),
    }
}

/// Liveness body with the current UTC time at nanosecond precision.
fn health_body() -> String {
    serde_json::json!({
        "status": "ok",
        "time": Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_body_shape() {
        let body: serde_json::Value = serde_json::from_str(&health_body()).unwrap();
        assert_eq!(body["status"], "ok");

        let time = body["time"].as_str().unwrap();
        assert!(time.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(time).is_ok());
    }
}
