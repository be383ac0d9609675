// src/submit/mod.rs
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::RowError;
use crate::transform::DayRecord;

/// Status the days endpoint answers with when a day was stored.
pub const CREATED: u16 = 201;

/// What came back from the remote side. The body is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkResponse {
    pub status: u16,
    pub body: String,
}

/// Somewhere day records are delivered, one call per record.
pub trait DaySink {
    fn submit(&self, day: &DayRecord) -> Result<SinkResponse, RowError>;
}

/// Posts each record as JSON to the days endpoint with a bearer token.
pub struct HttpSink {
    client: Client,
    endpoint: Url,
    token: String,
}

impl HttpSink {
    /// `timeout = None` waits on the remote side for as long as it takes.
    pub fn new(endpoint: Url, token: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            endpoint,
            token: token.into(),
        })
    }
}

impl DaySink for HttpSink {
    fn submit(&self, day: &DayRecord) -> Result<SinkResponse, RowError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .json(day)
            .send()?;
        let status = resp.status().as_u16();
        let body = resp.text()?;
        debug!(status, endpoint = %self.endpoint, "day submitted");
        Ok(SinkResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceRow;
    use crate::transform::transform_row;
    use serde_json::{json, Value};
    use std::{
        net::{SocketAddr, TcpListener},
        sync::{mpsc, Arc, Mutex},
        thread,
    };
    use warp::{http::StatusCode, Filter};

    type Seen = Arc<Mutex<Vec<(Option<String>, Option<String>, Value)>>>;

    /// Spin up a days endpoint on an ephemeral port. Answers 409 for
    /// 15/03/2024 and 201 for everything else.
    fn spawn_days_api() -> (SocketAddr, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async move {
                let route = warp::path!("api" / "days")
                    .and(warp::post())
                    .and(warp::header::optional::<String>("authorization"))
                    .and(warp::header::optional::<String>("content-type"))
                    .and(warp::body::json())
                    .map(
                        move |auth: Option<String>, ctype: Option<String>, body: Value| {
                            let duplicate = body["date"] == "2024-03-15T00:00:00";
                            recorder.lock().unwrap().push((auth, ctype, body));
                            if duplicate {
                                warp::reply::with_status(
                                    warp::reply::json(
                                        &json!({"message": "A day already exists for this date."}),
                                    ),
                                    StatusCode::CONFLICT,
                                )
                            } else {
                                warp::reply::with_status(
                                    warp::reply::json(&json!({"message": "Day created successfully."})),
                                    StatusCode::CREATED,
                                )
                            }
                        },
                    );
                let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
                tx.send(addr).unwrap();
                server.await;
            });
        });

        (rx.recv().unwrap(), seen)
    }

    fn day(date: &str) -> DayRecord {
        transform_row(&SourceRow::from_pairs([
            ("date", date),
            ("open", "8h00"),
            ("start", "18:00"),
            ("close", "22:00"),
            ("aers", "A1,A2"),
        ]))
        .unwrap()
    }

    fn sink_for(addr: SocketAddr) -> HttpSink {
        let url = Url::parse(&format!("http://{}/api/days", addr)).unwrap();
        HttpSink::new(url, "secret-token", None).unwrap()
    }

    #[test]
    fn posts_json_with_bearer_token() {
        let (addr, seen) = spawn_days_api();
        let sink = sink_for(addr);

        let resp = sink.submit(&day("14/03/2024")).unwrap();
        assert_eq!(resp.status, CREATED);
        assert!(resp.body.contains("Day created successfully."));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (auth, ctype, body) = &seen[0];
        assert_eq!(auth.as_deref(), Some("Bearer secret-token"));
        assert_eq!(ctype.as_deref(), Some("application/json"));
        assert_eq!(body["date"], "2024-03-14T00:00:00");
        assert_eq!(body["open"], "2024-03-14T08:00:00");
        assert_eq!(body["aers"], json!(["A1", "A2"]));
        assert!(body.get("end").is_none());
    }

    #[test]
    fn rejection_keeps_status_and_body() {
        let (addr, _seen) = spawn_days_api();
        let sink = sink_for(addr);

        let resp = sink.submit(&day("15/03/2024")).unwrap();
        assert_eq!(resp.status, 409);
        assert_eq!(resp.body, r#"{"message":"A day already exists for this date."}"#);
    }

    #[test]
    fn unreachable_endpoint_is_a_transport_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = Url::parse(&format!("http://127.0.0.1:{}/api/days", port)).unwrap();
        let sink = HttpSink::new(url, "t", Some(Duration::from_secs(5))).unwrap();

        let err = sink.submit(&day("14/03/2024")).unwrap_err();
        assert!(matches!(err, RowError::Transport(_)));
    }
}
