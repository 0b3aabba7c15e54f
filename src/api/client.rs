//! Blocking HTTP client for the GraphQL endpoint.

use super::error::TransportError;
use crate::settings::Settings;
use reqwest::blocking::Client;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Liveness query: asks only for the indexed block height.
pub const META_QUERY: &str = "{ _meta { block { number } } }";

/// Payload query for the first `limit` trust lines.
pub fn trust_lines_query(limit: usize) -> String {
    format!("{{ trustLines(first: {limit}) {{ id staker borrower }} }}")
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
}

/// A GraphQL response. `data` and `errors` can both be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<Value>>,
}

impl GraphQlResponse {
    /// Errors reported next to (or instead of) the data; empty lists count as none.
    pub fn error_list(&self) -> Option<&[Value]> {
        self.errors.as_deref().filter(|errs| !errs.is_empty())
    }
}

/// Anything that can run a GraphQL query document and hand back the raw response.
pub trait GraphQlTransport {
    fn execute(&self, query: &str) -> Result<GraphQlResponse, TransportError>;
}

/// Client for a single GraphQL endpoint. Every call goes to the network.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: String,
}

impl ApiClient {
    /// `timeout: None` leaves requests unbounded.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, TransportError> {
        Self::new(
            settings.endpoint.clone(),
            settings.request_timeout_secs.map(Duration::from_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl GraphQlTransport for ApiClient {
    fn execute(&self, query: &str) -> Result<GraphQlResponse, TransportError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .json(&GraphQlRequest { query })
            .send()?;

        if !resp.status().is_success() {
            return Err(TransportError::Status(resp.status().as_u16()));
        }

        resp.json::<GraphQlResponse>()
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;

    /// The request as a one-shot local server received it
    struct Captured {
        request_line: String,
        headers: Vec<(String, String)>,
        body: String,
    }

    impl Captured {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        }
    }

    /// Answer exactly one request on a local port with `status` and `body`
    fn serve_once(status: &str, body: &str) -> (String, mpsc::Receiver<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/graphql", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();

            let mut headers = Vec::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((k, v)) = line.split_once(':') {
                    headers.push((k.trim().to_ascii_lowercase(), v.trim().to_string()));
                }
            }

            let len = headers
                .iter()
                .find(|(k, _)| k == "content-length")
                .and_then(|(_, v)| v.parse().ok())
                .unwrap_or(0);
            let mut body = vec![0; len];
            reader.read_exact(&mut body).unwrap();
            reader.get_mut().write_all(response.as_bytes()).unwrap();

            tx.send(Captured {
                request_line: request_line.trim_end().to_string(),
                headers,
                body: String::from_utf8(body).unwrap(),
            })
            .unwrap();
        });

        (url, rx)
    }

    /// Same client the app builds, minus any proxy from the environment
    fn local_client(endpoint: String) -> ApiClient {
        ApiClient {
            client: Client::builder().no_proxy().build().unwrap(),
            endpoint,
        }
    }

    #[test]
    fn execute_posts_query_and_bypasses_caches() {
        let (url, seen) = serve_once("200 OK", r#"{"data":{"_meta":{"block":{"number":7}}}}"#);

        let resp = local_client(url).execute(META_QUERY).unwrap();
        let req = seen.recv().unwrap();

        assert!(req.request_line.starts_with("POST /graphql "));
        assert_eq!(req.header("cache-control"), Some("no-cache"));
        assert_eq!(req.header("pragma"), Some("no-cache"));
        assert_eq!(
            serde_json::from_str::<Value>(&req.body).unwrap(),
            json!({ "query": META_QUERY })
        );
        assert_eq!(
            resp.data.as_ref().and_then(|d| d.pointer("/_meta/block/number")),
            Some(&json!(7))
        );
    }

    #[test]
    fn execute_maps_error_status() {
        let (url, _seen) = serve_once("500 Internal Server Error", "{}");

        let err = local_client(url).execute(META_QUERY).unwrap_err();
        assert!(matches!(err, TransportError::Status(500)));
        assert_eq!(err.to_string(), "Endpoint returned status: 500");
    }

    #[test]
    fn execute_maps_unparsable_body_to_decode() {
        let (url, _seen) = serve_once("200 OK", "<html>gateway</html>");

        let err = local_client(url).execute(META_QUERY).unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[test]
    fn trust_lines_query_embeds_limit() {
        assert_eq!(
            trust_lines_query(10),
            "{ trustLines(first: 10) { id staker borrower } }"
        );
    }

    #[test]
    fn request_body_is_query_object() {
        let body = serde_json::to_value(GraphQlRequest { query: META_QUERY }).unwrap();
        assert_eq!(body, serde_json::json!({ "query": META_QUERY }));
    }

    #[test]
    fn response_keeps_data_and_errors_together() {
        let resp: GraphQlResponse = serde_json::from_str(
            r#"{"data":{"trustLines":[]},"errors":[{"message":"indexing lag"}]}"#,
        )
        .unwrap();

        assert!(resp.data.is_some());
        assert_eq!(resp.error_list().map(|e| e.len()), Some(1));
    }

    #[test]
    fn response_without_fields_decodes_to_empty() {
        let resp: GraphQlResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.data.is_none());
        assert!(resp.error_list().is_none());
    }

    #[test]
    fn empty_error_list_counts_as_none() {
        let resp: GraphQlResponse = serde_json::from_str(r#"{"data":null,"errors":[]}"#).unwrap();
        assert!(resp.error_list().is_none());
    }

    #[test]
    fn client_keeps_endpoint() {
        let client = ApiClient::new("http://127.0.0.1:8000/graphql", None).unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:8000/graphql");
    }
}
