mod cname;
mod envelope;
mod host;
mod ipv4;
pub mod model;
mod subnet;

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use eyre::WrapErr;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use url::Url;

pub use self::envelope::Outcome;
pub use self::host::NewHost;

/// Endpoint paths, relative to the server's base URL.
mod endpoint {
    pub const IP_ADDRESS_LIST: &str = "rest/ip_address_list";
    pub const IP_ADD: &str = "rest/ip_add";
    pub const IP_DELETE: &str = "rest/ip_delete";
    pub const IP_ALIAS_ADD: &str = "rest/ip_alias_add";
    pub const IP_ALIAS_DELETE: &str = "rest/ip_alias_delete";
    pub const IP_BLOCK_SUBNET_LIST: &str = "rest/ip_block_subnet_list";
    pub const IP_FIND_FREE_ADDRESS: &str = "rpc/ip_find_free_address";
}

const USERNAME_HEADER: HeaderName = HeaderName::from_static("x-ipm-username");
const PASSWORD_HEADER: HeaderName = HeaderName::from_static("x-ipm-password");

/// Login details for a DDI user. Not `Debug`: the password must never reach the logs.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// The access point to the DDI REST API.
///
/// Every request carries the base64-encoded username and password in the `X-IPM-*` headers; there is no login step.
#[derive(Debug, Clone)]
pub struct DdiClient {
    reqwest: reqwest::Client,
    base: Url,
}

impl DdiClient {
    pub fn new(server: &str, credentials: &Credentials, verify_tls: bool, timeout: Duration) -> eyre::Result<Self> {
        let base = normalize_server_url(server)?;

        let ua_str = format!("{} {}", clap::crate_name!(), clap::crate_version!());
        let client = reqwest::ClientBuilder::new()
            .default_headers(HeaderMap::from_iter([
                (reqwest::header::ACCEPT, HeaderValue::from_static("application/json")),
                (reqwest::header::USER_AGENT, HeaderValue::from_str(&ua_str)?),
                (USERNAME_HEADER, encode_header(&credentials.username)?),
                (PASSWORD_HEADER, encode_header(&credentials.password)?),
            ]))
            .danger_accept_invalid_certs(!verify_tls)
            .timeout(timeout)
            .build()
            .wrap_err("Failed to build HTTP client")?;

        if !verify_tls {
            log::warn!("TLS certificate verification is disabled");
        }

        Ok(Self { reqwest: client, base })
    }

    /// The normalized base URL that endpoint paths are joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    async fn get<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> eyre::Result<Outcome> {
        let req = self.builder(Method::GET, path)?.query(query);
        self.send(Method::GET, path, req).await
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> eyre::Result<Outcome> {
        let req = self.builder(Method::POST, path)?.json(body);
        self.send(Method::POST, path, req).await
    }

    async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> eyre::Result<Outcome> {
        let req = self.builder(Method::PUT, path)?.json(body);
        self.send(Method::PUT, path, req).await
    }

    async fn delete_with_query<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> eyre::Result<Outcome> {
        let req = self.builder(Method::DELETE, path)?.query(query);
        self.send(Method::DELETE, path, req).await
    }

    async fn delete_with_body<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> eyre::Result<Outcome> {
        let req = self.builder(Method::DELETE, path)?.json(body);
        self.send(Method::DELETE, path, req).await
    }

    fn builder(&self, method: Method, path: &str) -> eyre::Result<RequestBuilder> {
        let url = self.base.join(path).wrap_err_with(|| format!("invalid endpoint path '{path}'"))?;
        Ok(self.reqwest.request(method, url))
    }

    /// Sends a request and normalizes whatever comes back. Only transport-level problems are errors.
    async fn send(&self, method: Method, path: &str, req: RequestBuilder) -> eyre::Result<Outcome> {
        let res = req.send().await.wrap_err_with(|| format!("failed to send {method} request to {path}"))?;
        let status = res.status();
        let text = res.text().await.wrap_err_with(|| format!("failed to read {method} response from {path}"))?;

        log::debug!("{method} {path} returned {status}");
        log::trace!("{method} {path} response body: {text}");

        Ok(Outcome::from_response(status, &text))
    }
}

/// Turns whatever the user typed for `--server` into a base URL ending in `/`.
///
/// A bare hostname is assumed to be HTTPS.
pub fn normalize_server_url(server: &str) -> eyre::Result<Url> {
    let server = server.trim();
    if server.is_empty() {
        eyre::bail!("No DDI server given");
    }

    let with_scheme = if server.contains("://") {
        server.to_string()
    } else {
        format!("https://{server}")
    };

    let mut url = Url::parse(&with_scheme).wrap_err_with(|| format!("Invalid DDI server URL '{server}'"))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn encode_header(value: &str) -> eyre::Result<HeaderValue> {
    let mut header = HeaderValue::from_str(&BASE64.encode(value.as_bytes()))?;
    header.set_sensitive(true);
    Ok(header)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_urls_are_normalized() {
        let cases = [
            ("ddi.example.com", "https://ddi.example.com/"),
            ("https://ddi.example.com", "https://ddi.example.com/"),
            ("https://ddi.example.com/", "https://ddi.example.com/"),
            ("http://ddi.example.com:8080/ipam", "http://ddi.example.com:8080/ipam/"),
            (" https://ddi.example.com/?x=1 ", "https://ddi.example.com/"),
        ];

        for (input, expected) in cases {
            assert_eq!(normalize_server_url(input).unwrap().as_str(), expected, "input: {input:?}");
        }
    }

    #[test]
    fn empty_server_is_rejected() {
        assert!(normalize_server_url("  ").is_err());
    }

    #[test]
    fn endpoints_join_under_base_path() {
        let base = normalize_server_url("https://ddi.example.com/ipam").unwrap();
        assert_eq!(base.join(endpoint::IP_ADD).unwrap().as_str(), "https://ddi.example.com/ipam/rest/ip_add");
        assert_eq!(
            base.join(endpoint::IP_FIND_FREE_ADDRESS).unwrap().as_str(),
            "https://ddi.example.com/ipam/rpc/ip_find_free_address"
        );
    }

    #[test]
    fn credential_headers_are_base64() {
        let header = encode_header("test_user").unwrap();
        assert_eq!(header.to_str().unwrap(), "dGVzdF91c2Vy");
        assert!(header.is_sensitive());
    }
}
