use crate::http::config::{HttpConfig, ProxyConfig};
use crate::http_client::{HttpClient as GraphHttpClient, HttpClientError};
use http::{Request, Response};
use reqwest::blocking::{Client, ClientBuilder, Response as BlockingResponse};
use reqwest::{Certificate, Proxy};
use std::fs;
use std::path::Path;
use tracing::debug;

/// reqwest based implementation of [`GraphHttpClient`], shared by the token retriever and the
/// Graph client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Builds a reqwest blocking client according to the provided configuration.
    pub fn new(config: &HttpConfig) -> Result<Self, HttpBuildError> {
        let builder = Client::builder()
            .use_rustls_tls()
            .tls_built_in_native_certs(true)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout());

        let builder = with_proxy(builder, config.proxy())?;

        let client = builder
            .build()
            .map_err(|err| HttpBuildError::ClientBuilder(err.to_string()))?;

        Ok(Self { client })
    }

    fn send(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, HttpResponseError> {
        let req = self
            .client
            .request(request.method().clone(), request.uri().to_string().as_str())
            .headers(request.headers().clone())
            .body(request.body().to_vec());

        let res = req
            .send()
            .map_err(|err| HttpResponseError::TransportError(err.to_string()))?;

        try_build_response(res)
    }
}

fn with_proxy(
    builder: ClientBuilder,
    proxy: Option<&ProxyConfig>,
) -> Result<ClientBuilder, HttpBuildError> {
    let Some(proxy) = proxy else {
        return Ok(builder);
    };
    debug!(proxy = %proxy.redacted_url(), "configuring http proxy");

    let reqwest_proxy = Proxy::all(proxy.url().as_str())
        .map_err(|err| HttpBuildError::InvalidProxy(err.to_string()))?;
    let mut builder = builder.proxy(reqwest_proxy);

    for cert in proxy_certificates(proxy)? {
        builder = builder.add_root_certificate(cert);
    }
    Ok(builder)
}

/// Reads the proxy CA bundle file and every `.pem` file in the CA bundle directory.
fn proxy_certificates(proxy: &ProxyConfig) -> Result<Vec<Certificate>, HttpBuildError> {
    let mut certificates = Vec::new();

    if let Some(file) = proxy.ca_bundle_file() {
        certificates.extend(read_pem_bundle(file)?);
    }

    if let Some(dir) = proxy.ca_bundle_dir() {
        let entries = fs::read_dir(dir).map_err(|err| {
            HttpBuildError::CertificateBundle(dir.display().to_string(), err.to_string())
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "pem") {
                certificates.extend(read_pem_bundle(&path)?);
            }
        }
    }

    Ok(certificates)
}

fn read_pem_bundle(path: &Path) -> Result<Vec<Certificate>, HttpBuildError> {
    let pem = fs::read(path).map_err(|err| {
        HttpBuildError::CertificateBundle(path.display().to_string(), err.to_string())
    })?;
    Certificate::from_pem_bundle(&pem).map_err(|err| {
        HttpBuildError::CertificateBundle(path.display().to_string(), err.to_string())
    })
}

fn try_build_response(res: BlockingResponse) -> Result<Response<Vec<u8>>, HttpResponseError> {
    let status = res.status();
    let version = res.version();
    let headers = res.headers().clone();

    let body: Vec<u8> = res
        .bytes()
        .map_err(|err| HttpResponseError::ReadingResponse(err.to_string()))?
        .into();

    let mut response = http::Response::builder()
        .status(status)
        .version(version)
        .body(body)
        .map_err(|err| HttpResponseError::BuildingResponse(err.to_string()))?;
    *response.headers_mut() = headers;

    Ok(response)
}

impl GraphHttpClient for HttpClient {
    fn send(&self, req: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, HttpClientError> {
        let response = self.send(req)?;

        Ok(response)
    }
}

impl From<HttpResponseError> for HttpClientError {
    fn from(err: HttpResponseError) -> Self {
        match err {
            HttpResponseError::TransportError(msg) => HttpClientError::TransportError(msg),
            HttpResponseError::BuildingResponse(msg) | HttpResponseError::ReadingResponse(msg) => {
                HttpClientError::InvalidResponse(msg)
            }
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum HttpBuildError {
    #[error("could not build the http client: {0}")]
    ClientBuilder(String),
    #[error("invalid proxy configuration: {0}")]
    InvalidProxy(String),
    #[error("could not load certificates from `{0}`: {1}")]
    CertificateBundle(String, String),
}

#[derive(thiserror::Error, Debug)]
enum HttpResponseError {
    #[error("could not read response body: {0}")]
    ReadingResponse(String),
    #[error("could not build response: {0}")]
    BuildingResponse(String),
    #[error("http transport error: `{0}`")]
    TransportError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::config::ProxyConfig;
    use assert_matches::assert_matches;
    use httpmock::{Method::GET, MockServer};
    use std::time::Duration;

    #[test]
    fn sends_request_and_keeps_status_headers_and_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1.0/users/abc")
                .header("accept", "application/json");
            then.status(404)
                .header("request-id", "req-1")
                .body(r#"{"error":{"code":"Request_ResourceNotFound"}}"#);
        });

        let client = HttpClient::new(&HttpConfig::default()).unwrap();
        let request = Request::builder()
            .method("GET")
            .uri(server.url("/v1.0/users/abc"))
            .header("accept", "application/json")
            .body(Vec::new())
            .unwrap();

        let response = GraphHttpClient::send(&client, request).unwrap();

        assert_eq!(response.status(), 404);
        assert_eq!(response.headers().get("request-id").unwrap(), "req-1");
        assert_eq!(
            response.body().as_slice(),
            br#"{"error":{"code":"Request_ResourceNotFound"}}"#
        );
        mock.assert();
    }

    #[test]
    fn timeouts_are_transport_errors() {
        let server = MockServer::start();
        let timeout = Duration::from_millis(50);
        let mock = server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200).delay(timeout * 4);
        });

        let config = HttpConfig::default().with_timeout(timeout);
        let client = HttpClient::new(&config).unwrap();
        let request = Request::builder()
            .uri(server.url("/slow"))
            .body(Vec::new())
            .unwrap();

        let err = GraphHttpClient::send(&client, request).unwrap_err();

        assert_matches!(err, HttpClientError::TransportError(_));
        mock.assert();
    }

    #[test]
    fn missing_ca_bundle_fails_the_build() {
        let proxy = ProxyConfig::new("http://localhost:8888")
            .unwrap()
            .with_ca_bundle(Some("/non/existent/bundle.pem".into()), None);
        let config = HttpConfig::default()
            .with_timeout(Duration::from_secs(1))
            .with_proxy(Some(proxy));

        let err = HttpClient::new(&config).unwrap_err();

        assert_matches!(err, HttpBuildError::CertificateBundle(path, _) => {
            assert_eq!(path, "/non/existent/bundle.pem");
        });
    }

    #[test]
    fn empty_ca_bundle_dir_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let proxy = ProxyConfig::new("http://localhost:8888")
            .unwrap()
            .with_ca_bundle(None, Some(dir.path().to_path_buf()));
        let config = HttpConfig::default()
            .with_timeout(Duration::from_secs(1))
            .with_proxy(Some(proxy));

        assert!(HttpClient::new(&config).is_ok());
    }
}
