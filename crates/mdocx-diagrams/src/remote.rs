//! Remote rendering via a mermaid.ink style HTTP service.

use std::io::Write;
use std::time::Duration;

use base64::Engine;
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use flate2::Compression;
use flate2::write::DeflateEncoder;
use ureq::Agent;

use crate::config::{RenderingConfig, StrategyKind};
use crate::error::{FailureReason, RenderFailure};
use crate::raster::RenderedImage;
use crate::renderer::DiagramRenderer;
use crate::svg::rasterize_svg;

/// Renders diagrams through a network rendering service.
///
/// The diagram source travels pako-encoded in the request path. Raster
/// output is requested first; when the service rejects it or returns a
/// payload that is not a usable PNG, a second request asks for vector
/// output which is rasterized locally. The HTTP agent is built per attempt
/// so the effective timeout always matches the caller's budget and no
/// connection outlives a render call.
pub struct RemoteServiceRenderer;

/// Outcome of one HTTP exchange that reached the server.
enum Fetch {
    Body(Vec<u8>),
    Status(u16, String),
}

impl DiagramRenderer for RemoteServiceRenderer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Remote
    }

    fn render(
        &self,
        source: &str,
        config: &RenderingConfig,
    ) -> Result<RenderedImage, RenderFailure> {
        let agent = create_agent(config.per_strategy_timeout);
        let base = config.service_url.trim_end_matches('/');
        let encoded = encode_pako(source);

        // Raster first. A 2xx response with an empty or corrupt payload is
        // treated as a rejection and falls through to the vector retry.
        let mut raster_failure: Option<RenderFailure> = None;
        let png_url = format!("{base}/img/pako:{encoded}?type=png");
        match fetch(&agent, &png_url)? {
            Fetch::Body(bytes) => match RenderedImage::from_png(bytes) {
                Ok(image) => return Ok(image),
                Err(failure) => {
                    tracing::debug!(%failure, "raster payload rejected, retrying as vector");
                    raster_failure = Some(failure);
                }
            },
            Fetch::Status(status, body) => {
                tracing::debug!(status, "raster request rejected, retrying as vector");
                raster_failure = Some(status_failure(status, &body));
            }
        }

        let svg_url = format!("{base}/svg/pako:{encoded}");
        match fetch(&agent, &svg_url)? {
            Fetch::Body(bytes) => {
                let svg = String::from_utf8(bytes)
                    .map_err(|e| RenderFailure::decode(format!("invalid UTF-8 in SVG: {e}")))?;
                rasterize_svg(&svg)
            }
            Fetch::Status(status, body) => {
                // Prefer the raster-side decode diagnostic when the service
                // claimed success there; it names the terminal cause better
                // than a second rejection status.
                match raster_failure {
                    Some(failure) if failure.reason == FailureReason::DecodeError => Err(failure),
                    _ => Err(status_failure(status, &body)),
                }
            }
        }
    }
}

/// Create an HTTP agent with the given timeout applied to the whole call.
fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// Perform a GET, separating transport failures from HTTP rejections.
fn fetch(agent: &Agent, url: &str) -> Result<Fetch, RenderFailure> {
    let response = agent.get(url).call().map_err(|e| {
        if e.to_string().contains("timed out") {
            RenderFailure::timeout(format!("request timed out: {e}"))
        } else {
            RenderFailure::network(e.to_string())
        }
    })?;

    let status = response.status().as_u16();
    let mut body = response.into_body();

    if (200..300).contains(&status) {
        let bytes = body
            .read_to_vec()
            .map_err(|e| RenderFailure::network(format!("reading response body: {e}")))?;
        Ok(Fetch::Body(bytes))
    } else {
        let detail = body
            .read_to_string()
            .unwrap_or_else(|_| String::from("(unable to read error body)"));
        Ok(Fetch::Status(status, detail))
    }
}

/// Map an HTTP rejection to a structured failure.
fn status_failure(status: u16, body: &str) -> RenderFailure {
    let detail = format!("HTTP {status}: {}", body.trim());
    if status == 415 {
        RenderFailure {
            reason: FailureReason::UnsupportedFormat,
            detail,
        }
    } else {
        RenderFailure::network(detail)
    }
}

/// Encode diagram source the way pako-based services expect: raw DEFLATE
/// (no zlib header or checksum) then URL-safe unpadded base64.
fn encode_pako(source: &str) -> String {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    // Writing to a Vec cannot fail.
    let _ = encoder.write_all(source.as_bytes());
    let deflated = encoder.finish().unwrap_or_default();
    BASE64_URL_SAFE_NO_PAD.encode(deflated)
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    use super::*;
    use crate::raster::fake_png;

    const RECT_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20"><rect width="40" height="20" fill="red"/></svg>"#;

    /// Serve one canned HTTP response per incoming connection, in order.
    fn spawn_stub_service(responses: Vec<(u16, Vec<u8>)>) -> (String, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = std::thread::spawn(move || {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut request = [0u8; 4096];
                let _ = stream.read(&mut request);
                let header = format!(
                    "HTTP/1.1 {status} OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(header.as_bytes());
                let _ = stream.write_all(&body);
            }
        });
        (format!("http://{addr}"), handle)
    }

    fn config_for(service_url: String) -> RenderingConfig {
        RenderingConfig {
            service_url,
            per_strategy_timeout: Duration::from_secs(5),
            ..RenderingConfig::default()
        }
    }

    #[test]
    fn test_raster_accepted_on_first_attempt() {
        let (url, server) = spawn_stub_service(vec![(200, fake_png(640, 480))]);

        let image = RemoteServiceRenderer
            .render("flowchart TD\n A-->B", &config_for(url))
            .unwrap();

        assert_eq!((image.width_px, image.height_px), (640, 480));
        server.join().unwrap();
    }

    #[test]
    fn test_corrupt_raster_falls_back_to_vector() {
        let (url, server) = spawn_stub_service(vec![
            (200, b"not a png".to_vec()),
            (200, RECT_SVG.as_bytes().to_vec()),
        ]);

        let image = RemoteServiceRenderer
            .render("flowchart TD\n A-->B", &config_for(url))
            .unwrap();

        // Rasterized locally at the SVG's natural size.
        assert_eq!((image.width_px, image.height_px), (40, 20));
        server.join().unwrap();
    }

    #[test]
    fn test_rejected_raster_falls_back_to_vector() {
        let (url, server) = spawn_stub_service(vec![
            (415, b"png not supported".to_vec()),
            (200, RECT_SVG.as_bytes().to_vec()),
        ]);

        let image = RemoteServiceRenderer
            .render("pie\n a: 1", &config_for(url))
            .unwrap();

        assert_eq!((image.width_px, image.height_px), (40, 20));
        server.join().unwrap();
    }

    #[test]
    fn test_unrasterizable_vector_is_decode_error() {
        let (url, server) = spawn_stub_service(vec![
            (200, b"not a png".to_vec()),
            (200, b"also not svg".to_vec()),
        ]);

        let err = RemoteServiceRenderer
            .render("pie\n a: 1", &config_for(url))
            .unwrap_err();

        assert_eq!(err.reason, FailureReason::DecodeError);
        server.join().unwrap();
    }

    #[test]
    fn test_both_requests_rejected_is_network_error() {
        let (url, server) = spawn_stub_service(vec![
            (500, b"raster broken".to_vec()),
            (503, b"vector broken".to_vec()),
        ]);

        let err = RemoteServiceRenderer
            .render("pie\n a: 1", &config_for(url))
            .unwrap_err();

        // Last failure wins: the vector rejection.
        assert_eq!(err.reason, FailureReason::NetworkError);
        assert!(err.detail.contains("503"));
        server.join().unwrap();
    }

    #[test]
    fn test_encode_pako_is_url_safe() {
        let encoded = encode_pako("flowchart TD\n  A[Start] --> B{Choice?}\n");
        assert!(!encoded.is_empty());
        assert!(
            encoded
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "unexpected character in {encoded}"
        );
    }

    #[test]
    fn test_encode_pako_deterministic() {
        assert_eq!(encode_pako("pie\n a: 1"), encode_pako("pie\n a: 1"));
        assert_ne!(encode_pako("pie\n a: 1"), encode_pako("pie\n a: 2"));
    }

    #[test]
    fn test_encode_pako_round_trip() {
        let source = "sequenceDiagram\n  Alice->>Bob: Hello";
        let encoded = encode_pako(source);
        let deflated = BASE64_URL_SAFE_NO_PAD.decode(encoded).unwrap();

        let mut inflated = String::new();
        flate2::read::DeflateDecoder::new(&deflated[..])
            .read_to_string(&mut inflated)
            .unwrap();
        assert_eq!(inflated, source);
    }

    #[test]
    fn test_status_failure_mapping() {
        let err = status_failure(503, "busy");
        assert_eq!(err.reason, FailureReason::NetworkError);
        assert!(err.detail.contains("503"));

        let err = status_failure(415, "png not supported");
        assert_eq!(err.reason, FailureReason::UnsupportedFormat);
    }

    #[test]
    fn test_unreachable_service_is_network_error() {
        let renderer = RemoteServiceRenderer;
        let config = RenderingConfig {
            // Reserved TEST-NET-1 address, nothing listens there.
            service_url: "http://192.0.2.1:9".to_owned(),
            per_strategy_timeout: Duration::from_millis(300),
            ..RenderingConfig::default()
        };

        let err = renderer.render("pie\n a: 1", &config).unwrap_err();
        assert!(matches!(
            err.reason,
            FailureReason::NetworkError | FailureReason::Timeout
        ));
    }
}
