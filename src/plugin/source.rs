use std::time::Duration;

use reqwest::blocking::{Client, ClientBuilder};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::model::config::AppConfig;
use crate::plugin::error::UpdateError;

/// Where remote plugin bodies come from.
pub trait UpdateSource: Send + Sync {
    /// GET `url` and return the raw body. Non-2xx is an error.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, UpdateError>;
}

#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let client = client_builder(&config.network.user_agent, config.request_timeout())?.build()?;
        Ok(Self { client })
    }
}

fn client_builder(user_agent: &str, timeout: Option<Duration>) -> anyhow::Result<ClientBuilder> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);

    Ok(Client::builder().default_headers(headers).timeout(timeout))
}

impl UpdateSource for HttpSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, UpdateError> {
        let network = |reason: String| UpdateError::Network {
            url: url.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(network(format!("HTTP {}", resp.status())));
        }

        resp.bytes()
            .map(|body| body.to_vec())
            .map_err(|e| network(format!("cannot read body: {e}")))
    }
}


#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    use super::stub::StaticSource;
    use super::*;

    /// Answer exactly one request on a loopback port with `response`.
    /// The raw request is sent back over the returned channel.
    fn serve_once(response: Vec<u8>) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(&response).unwrap();
            let _ = tx.send(String::from_utf8_lossy(&request).into_owned());
        });

        (format!("http://{addr}/plugin.js"), rx)
    }

    fn http_response(status: &str, body: &[u8]) -> Vec<u8> {
        let mut out = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .into_bytes();
        out.extend_from_slice(body);
        out
    }

    fn loopback_source() -> HttpSource {
        let client = client_builder("plugsync-test", Some(Duration::from_secs(5)))
            .unwrap()
            .no_proxy()
            .build()
            .unwrap();
        HttpSource { client }
    }

    #[test]
    fn static_source_serves_and_fails() {
        let source = StaticSource::new()
            .with_body("https://a/x.js", "body")
            .with_failure("https://a/down.js", "connection refused");

        assert_eq!(source.fetch("https://a/x.js").unwrap(), b"body");
        assert_eq!(
            source.fetch("https://a/down.js").unwrap_err().to_string(),
            "request to https://a/down.js failed: connection refused"
        );
        assert!(matches!(
            source.fetch("https://a/missing.js"),
            Err(UpdateError::Network { .. })
        ));
    }

    #[test]
    fn http_source_builds_from_defaults() {
        let config = AppConfig::from_layers(None).unwrap();
        assert!(HttpSource::new(&config).is_ok());
    }

    #[test]
    fn body_bytes_come_back_unchanged() {
        let body: &[u8] = b"/**\n * @version 1.1.0\n */\r\n// caf\xE9 \xFF\xFE\n";
        let (url, requests) = serve_once(http_response("200 OK", body));

        let fetched = loopback_source().fetch(&url).unwrap();

        assert_eq!(fetched, body);
        let request = requests.recv().unwrap().to_lowercase();
        assert!(request.starts_with("get /plugin.js"));
        assert!(request.contains("user-agent: plugsync-test"));
    }

    #[test]
    fn non_success_status_is_a_network_error() {
        let (url, _requests) = serve_once(http_response("404 Not Found", b"gone"));

        match loopback_source().fetch(&url) {
            Err(UpdateError::Network { url: failed, reason }) => {
                assert_eq!(failed, url);
                assert!(reason.contains("HTTP 404"), "reason was {reason:?}");
            }
            other => panic!("expected a network error, got {other:?}"),
        }
    }

    #[test]
    fn server_error_is_a_network_error() {
        let (url, _requests) = serve_once(http_response("500 Internal Server Error", b""));

        assert!(matches!(
            loopback_source().fetch(&url),
            Err(UpdateError::Network { reason, .. }) if reason.contains("HTTP 500")
        ));
    }

    #[test]
    fn refused_connection_is_a_network_error() {
        // Grab a free port, then close it so nothing is listening there.
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        assert!(matches!(
            loopback_source().fetch(&format!("http://127.0.0.1:{port}/plugin.js")),
            Err(UpdateError::Network { .. })
        ));
    }
}
