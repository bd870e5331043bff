//! Nasdaq quote chart provider.
//!
//! Fetches the daily chart from `api.nasdaq.com/api/quote/{symbol}/chart`. The
//! endpoint rejects clients that don't look like a browser, so the client sends
//! a browser header set. Responses are gzip; reqwest is built without automatic
//! decompression, so the body comes back exactly as sent.
//!
//! There is no official API and no retry policy: a single failed request skips
//! the ticker.

use super::provider::{DataError, PriceProvider};
use crate::config::{ConfigError, ProviderConfig};
use crate::domain::{RawPayload, TickerRequest};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

/// Nasdaq chart provider.
pub struct NasdaqProvider {
    client: reqwest::blocking::Client,
    base_url: Url,
    asset_class: String,
}

impl NasdaqProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(config.base_url.trim())
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "provider.base_url cannot carry a path: {}",
                    config.base_url
                ))
            })?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .default_headers(browser_headers())
            .build()?;

        Ok(Self {
            client,
            base_url,
            asset_class: config.asset_class.clone(),
        })
    }

    /// Build the chart API URL for a request's symbol and window.
    ///
    /// The symbol is one percent-encoded path segment, so `/` or `?` in a
    /// ticker cannot change the route or the query.
    pub fn chart_url(&self, request: &TickerRequest) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "quote", request.symbol(), "chart"]);
        }
        url.query_pairs_mut()
            .clear()
            .append_pair("assetclass", &self.asset_class)
            .append_pair("fromdate", &request.start().format("%Y-%m-%d").to_string())
            .append_pair("todate", &request.end().format("%Y-%m-%d").to_string());
        url
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    // Only gzip: the decoder does not handle br or zstd.
    headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
    headers.insert(
        header::REFERER,
        HeaderValue::from_static("https://www.nasdaq.com/"),
    );
    headers.insert(
        header::ORIGIN,
        HeaderValue::from_static("https://www.nasdaq.com"),
    );
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    for (name, value) in [
        ("sec-gpc", "1"),
        ("sec-fetch-dest", "empty"),
        ("sec-fetch-mode", "cors"),
        ("sec-fetch-site", "same-site"),
        ("priority", "u=0"),
    ] {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    headers
}

impl PriceProvider for NasdaqProvider {
    fn name(&self) -> &str {
        "nasdaq"
    }

    fn fetch(&self, request: &TickerRequest) -> Result<RawPayload, DataError> {
        let url = self.chart_url(request);
        debug!(%url, "requesting chart");

        let resp = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                DataError::NetworkUnreachable(format!("request timed out: {e}"))
            } else if e.is_connect() {
                DataError::NetworkUnreachable(format!("connection failed: {e}"))
            } else {
                DataError::NetworkUnreachable(format!("request failed: {e}"))
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::NetworkUnreachable(format!(
                "HTTP {status} for {}",
                request.symbol()
            )));
        }

        let body = resp.bytes().map_err(|e| {
            DataError::NetworkUnreachable(format!("failed to read response body: {e}"))
        })?;
        let payload = RawPayload::new(body.to_vec());
        debug!(bytes = payload.len(), symbol = request.symbol(), "chart received");
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::decode::decode;
    use chrono::NaiveDate;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    fn request() -> TickerRequest {
        TickerRequest::new("msft", NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), 5)
    }

    fn provider_for(base_url: &str, timeout_secs: u64) -> NasdaqProvider {
        let config = ProviderConfig {
            base_url: base_url.into(),
            timeout_secs,
            ..ProviderConfig::default()
        };
        NasdaqProvider::new(&config).unwrap()
    }

    /// One-shot loopback server. Reads a single request head, waits `delay`,
    /// then writes `response`. The join handle yields the request head,
    /// lowercased.
    fn serve_once(response: Vec<u8>, delay: Duration) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            thread::sleep(delay);
            // The client may already have hung up after a timeout.
            let _ = stream.write_all(&response);
            String::from_utf8_lossy(&head).to_lowercase()
        });
        (base, handle)
    }

    fn http_response(status: &str, extra_headers: &str, body: &[u8]) -> Vec<u8> {
        let mut out = format!(
            "HTTP/1.1 {status}\r\n{extra_headers}Content-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .into_bytes();
        out.extend_from_slice(body);
        out
    }

    fn gzip(json: &str) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(json.as_bytes()).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn chart_url_uses_uppercase_symbol_and_iso_dates() {
        let provider = NasdaqProvider::new(&ProviderConfig::default()).unwrap();
        assert_eq!(
            provider.chart_url(&request()).as_str(),
            "https://api.nasdaq.com/api/quote/MSFT/chart?assetclass=stocks\
             &fromdate=2020-06-01&todate=2025-06-01"
        );
    }

    #[test]
    fn trailing_slash_in_base_url_is_dropped() {
        let provider = provider_for("http://localhost:9000/", 5);
        assert!(provider
            .chart_url(&request())
            .as_str()
            .starts_with("http://localhost:9000/api/quote/MSFT/chart?"));
    }

    #[test]
    fn symbol_is_a_single_encoded_path_segment() {
        let provider = NasdaqProvider::new(&ProviderConfig::default()).unwrap();
        let req = TickerRequest::new("a/b?c", NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), 5);
        let url = provider.chart_url(&req);

        assert_eq!(url.path(), "/api/quote/A%2FB%3FC/chart");
        let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(keys, vec!["assetclass", "fromdate", "todate"]);
    }

    #[test]
    fn base_url_that_cannot_hold_a_path_is_rejected() {
        let config = ProviderConfig {
            base_url: "mailto:quotes@nasdaq.com".into(),
            ..ProviderConfig::default()
        };
        assert!(matches!(
            NasdaqProvider::new(&config),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn browser_headers_present() {
        let headers = browser_headers();
        assert_eq!(headers[header::ACCEPT_ENCODING], "gzip");
        assert_eq!(headers[header::ORIGIN], "https://www.nasdaq.com");
        assert_eq!(headers["sec-fetch-mode"], "cors");
    }

    #[test]
    fn gzip_body_is_returned_untouched_and_decodes() {
        let body = gzip(
            r#"{"data":{"symbol":"MSFT","chart":[{"x":1,"y":10},{"x":2,"y":30},{"x":3,"y":20}]},"status":{"rCode":200}}"#,
        );
        let (base, server) = serve_once(
            http_response(
                "200 OK",
                "Content-Type: application/json\r\nContent-Encoding: gzip\r\n",
                &body,
            ),
            Duration::ZERO,
        );

        let payload = provider_for(&base, 5).fetch(&request()).unwrap();
        assert_eq!(payload.as_bytes(), body.as_slice());

        let chart = decode(&payload).unwrap();
        assert_eq!(chart.series.closes().collect::<Vec<_>>(), vec![10.0, 30.0, 20.0]);
        assert_eq!(chart.confirmed_symbol.as_deref(), Some("MSFT"));

        let head = server.join().unwrap();
        assert!(head.starts_with("get /api/quote/msft/chart?assetclass=stocks"));
        assert!(head.contains("accept-encoding: gzip\r\n"));
        assert!(head.contains("sec-fetch-mode: cors\r\n"));
        assert!(head.contains("origin: https://www.nasdaq.com\r\n"));
        assert!(head.contains("user-agent: mozilla/5.0"));
    }

    #[test]
    fn non_success_status_is_a_transport_failure() {
        let (base, server) = serve_once(
            http_response("404 Not Found", "", b"not here"),
            Duration::ZERO,
        );

        let err = provider_for(&base, 5).fetch(&request()).unwrap_err();
        assert!(matches!(err, DataError::NetworkUnreachable(ref m) if m.contains("404")));
        server.join().unwrap();
    }

    #[test]
    fn silent_server_times_out() {
        let (base, server) = serve_once(Vec::new(), Duration::from_secs(3));

        let err = provider_for(&base, 1).fetch(&request()).unwrap_err();
        assert!(matches!(err, DataError::NetworkUnreachable(ref m) if m.contains("timed out")));
        server.join().unwrap();
    }

    #[test]
    fn unreachable_endpoint_is_a_transport_failure() {
        // Port 1 on loopback has no listener; the connect is refused immediately.
        let err = provider_for("http://127.0.0.1:1", 2)
            .fetch(&request())
            .unwrap_err();
        assert!(matches!(err, DataError::NetworkUnreachable(_)));
    }
}
