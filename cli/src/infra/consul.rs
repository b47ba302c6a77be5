//! Registry client over the Consul-compatible HTTP API of the SSM server.
//!
//! Implements the `Catalog` and `KvStore` ports, plus the connection check
//! run before any registry write.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ports::{Catalog, KvStore};
use crate::domain::connectivity::{
    PingOutcome, check_auth_mismatch, classify_ping, not_ssm_server,
};
use crate::domain::{
    CatalogNode, CatalogServiceEntry, Node, Registration, RemoteServiceRecord, SsmConfig,
};

/// Connect timeout for every server request.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Path of the liveness probe served by the query-analytics API.
pub const PING_PATH: &str = "qan-api/ping";

// ── Endpoint ─────────────────────────────────────────────────────────────────

/// Base URL, credentials and HTTP client shared by the server clients.
#[derive(Clone)]
pub struct ServerEndpoint {
    base: String,
    auth: Option<(String, String)>,
    http: reqwest::Client,
}

impl ServerEndpoint {
    /// # Errors
    ///
    /// Returns an error if no server address is configured or the TLS
    /// backend cannot be initialised.
    pub fn new(config: &SsmConfig, connect_timeout: Duration) -> Result<Self> {
        let address = config.require_server()?;
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .danger_accept_invalid_certs(config.server_insecure_ssl)
            .build()
            .context("cannot build HTTP client")?;
        Ok(Self {
            base: format!("{}://{}", config.scheme(), address.trim_end_matches('/')),
            auth: config
                .has_auth()
                .then(|| (config.server_user.clone(), config.server_password.clone())),
            http,
        })
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// Request carrying the configured credentials.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.anonymous(method, path);
        match &self.auth {
            Some((user, pass)) => builder.basic_auth(user, Some(pass)),
            None => builder,
        }
    }

    /// Request without credentials.
    pub fn anonymous(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "server request");
        self.http.request(method, self.url(path))
    }
}

/// Full source chain of an error, joined with `": "`.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(e) = source {
        parts.push(e.to_string());
        source = e.source();
    }
    parts.join(": ")
}

async fn check_status(resp: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    bail!("{what} failed with {status}: {}", body.trim())
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireNode {
    node: String,
    address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireAgentService {
    #[serde(rename = "ID")]
    id: String,
    service: String,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireCatalogNode {
    node: Option<WireNode>,
    #[serde(default)]
    services: Option<BTreeMap<String, WireAgentService>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireServiceEntry {
    node: String,
    address: String,
    #[serde(rename = "ServiceID")]
    service_id: String,
    #[serde(default)]
    service_tags: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct WireRegistration<'a> {
    node: &'a str,
    address: &'a str,
    service: WireServiceDef<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct WireServiceDef<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    service: &'a str,
    tags: &'a [String],
    port: u16,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct WireDeregistration<'a> {
    node: &'a str,
    #[serde(rename = "ServiceID")]
    service_id: &'a str,
}

fn into_catalog_node(wire: WireCatalogNode) -> Option<CatalogNode> {
    let node = wire.node?;
    let services = wire
        .services
        .unwrap_or_default()
        .into_values()
        .map(|s| RemoteServiceRecord {
            service_id: s.id,
            service: s.service,
            node: node.node.clone(),
            address: node.address.clone(),
            port: s.port,
            tags: s.tags.unwrap_or_default(),
        })
        .collect();
    Some(CatalogNode {
        node: Node {
            name: node.node,
            address: node.address,
        },
        services,
    })
}

// ── Client ───────────────────────────────────────────────────────────────────

/// Production `Catalog` + `KvStore`.
pub struct ConsulClient {
    endpoint: ServerEndpoint,
}

impl ConsulClient {
    #[must_use]
    pub fn new(endpoint: ServerEndpoint) -> Self {
        Self { endpoint }
    }

    /// Current raft leader, empty when none.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status.
    pub async fn leader(&self) -> Result<String> {
        let resp = self
            .endpoint
            .request(Method::GET, "v1/status/leader")
            .send()
            .await
            .context("querying registry leader")?;
        let resp = check_status(resp, "leader lookup").await?;
        resp.json::<String>().await.context("decoding leader")
    }

    /// Verify the server is reachable, is an SSM server, and agrees with the
    /// client about authentication.
    ///
    /// # Errors
    ///
    /// Returns a `ConnectivityError` describing the remediation.
    pub async fn verify(&self, config: &SsmConfig) -> Result<()> {
        let outcome = match self
            .endpoint
            .request(Method::GET, PING_PATH)
            .send()
            .await
        {
            Ok(resp) => PingOutcome::Status(resp.status().as_u16()),
            Err(e) => PingOutcome::Transport(error_chain(&e)),
        };
        if let Some(err) = classify_ping(config, &outcome) {
            return Err(err.into());
        }

        match self.leader().await {
            Ok(leader) if !leader.is_empty() => {}
            Ok(_) => return Err(not_ssm_server(config, "no registry leader").into()),
            Err(e) => return Err(not_ssm_server(config, &format!("{e:#}")).into()),
        }

        if config.has_auth() {
            let anonymous = self
                .endpoint
                .anonymous(Method::GET, PING_PATH)
                .send()
                .await
                .ok()
                .map(|r| r.status().as_u16());
            if let Some(err) = check_auth_mismatch(config, anonymous) {
                return Err(err.into());
            }
        }
        Ok(())
    }
}

impl Catalog for ConsulClient {
    async fn node(&self, name: &str) -> Result<Option<CatalogNode>> {
        let resp = self
            .endpoint
            .request(Method::GET, &format!("v1/catalog/node/{name}"))
            .send()
            .await
            .with_context(|| format!("reading catalog node {name}"))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = check_status(resp, "catalog node").await?;
        let wire: Option<WireCatalogNode> =
            resp.json().await.context("decoding catalog node")?;
        Ok(wire.and_then(into_catalog_node))
    }

    async fn service(&self, service: &str, tag: Option<&str>) -> Result<Vec<CatalogServiceEntry>> {
        let mut req = self
            .endpoint
            .request(Method::GET, &format!("v1/catalog/service/{service}"));
        if let Some(tag) = tag {
            req = req.query(&[("tag", tag)]);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("reading catalog service {service}"))?;
        let resp = check_status(resp, "catalog service").await?;
        let wire: Option<Vec<WireServiceEntry>> =
            resp.json().await.context("decoding catalog service")?;
        Ok(wire
            .unwrap_or_default()
            .into_iter()
            .map(|e| CatalogServiceEntry {
                node: e.node,
                address: e.address,
                service_id: e.service_id,
                tags: e.service_tags.unwrap_or_default(),
            })
            .collect())
    }

    async fn register(&self, registration: &Registration) -> Result<()> {
        let body = WireRegistration {
            node: &registration.node.name,
            address: &registration.node.address,
            service: WireServiceDef {
                id: &registration.service_id,
                service: &registration.service,
                tags: &registration.tags,
                port: registration.port,
            },
        };
        let resp = self
            .endpoint
            .request(Method::PUT, "v1/catalog/register")
            .json(&body)
            .send()
            .await
            .context("catalog register")?;
        check_status(resp, "catalog register").await.map(|_| ())
    }

    async fn deregister(&self, node: &str, service_id: &str) -> Result<()> {
        let body = WireDeregistration { node, service_id };
        let resp = self
            .endpoint
            .request(Method::PUT, "v1/catalog/deregister")
            .json(&body)
            .send()
            .await
            .context("catalog deregister")?;
        check_status(resp, "catalog deregister").await.map(|_| ())
    }
}

impl KvStore for ConsulClient {
    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let resp = self
            .endpoint
            .request(Method::PUT, &format!("v1/kv/{key}"))
            .body(value.to_vec())
            .send()
            .await
            .with_context(|| format!("kv put {key}"))?;
        check_status(resp, "kv put").await.map(|_| ())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let resp = self
            .endpoint
            .request(Method::GET, &format!("v1/kv/{key}"))
            .query(&[("raw", "")])
            .send()
            .await
            .with_context(|| format!("kv get {key}"))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = check_status(resp, "kv get").await?;
        Ok(Some(resp.bytes().await.context("reading kv value")?.to_vec()))
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let resp = self
            .endpoint
            .request(Method::GET, &format!("v1/kv/{prefix}"))
            .query(&[("keys", "")])
            .send()
            .await
            .with_context(|| format!("kv keys {prefix}"))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let resp = check_status(resp, "kv keys").await?;
        resp.json().await.context("decoding kv keys")
    }

    async fn delete_tree(&self, prefix: &str) -> Result<()> {
        let resp = self
            .endpoint
            .request(Method::DELETE, &format!("v1/kv/{prefix}"))
            .query(&[("recurse", "")])
            .send()
            .await
            .with_context(|| format!("kv delete {prefix}"))?;
        check_status(resp, "kv delete").await.map(|_| ())
    }
}
