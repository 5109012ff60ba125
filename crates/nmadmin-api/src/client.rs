// HTTP client for the management server REST API.
//
// Base path: /api/
// Auth: `Authorization: Bearer <master key>`

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{
    ApiExtClient, ApiExtClientUpdate, ApiNetwork, ApiNode, ApiServerConfig, ErrorResponse,
    ExtClientConfigKind,
};
use crate::transport::TransportConfig;

/// Async client for the management server.
///
/// Every method maps to exactly one HTTP request; there is no caching
/// and no retry at this layer.
pub struct ServerClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ServerClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a master key and transport config.
    ///
    /// Injects the bearer token as a default header on every request.
    pub fn new(
        base_url: Url,
        master_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", master_key.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid master key header value: {e}"),
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = transport.build_client(headers)?;
        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/server/getconfig`
    pub async fn server_config(&self) -> Result<ApiServerConfig, Error> {
        debug!("fetching server config");
        self.get(&["server", "getconfig"]).await
    }

    /// `GET /api/networks`
    pub async fn list_networks(&self) -> Result<Vec<ApiNetwork>, Error> {
        debug!("listing networks");
        let networks: Option<Vec<ApiNetwork>> = self.get(&["networks"]).await?;
        Ok(networks.unwrap_or_default())
    }

    /// `GET /api/networks/{netid}`
    pub async fn get_network(&self, netid: &str) -> Result<ApiNetwork, Error> {
        debug!(netid, "fetching network");
        self.get(&["networks", netid]).await
    }

    /// `PUT /api/networks/{netid}`
    ///
    /// The submitted record replaces the server's copy in full.
    pub async fn update_network(&self, network: &ApiNetwork) -> Result<ApiNetwork, Error> {
        debug!(netid = %network.netid, "updating network");
        self.put(&["networks", &network.netid], network).await
    }

    /// `GET /api/nodes/{netid}`
    pub async fn list_nodes(&self, netid: &str) -> Result<Vec<ApiNode>, Error> {
        debug!(netid, "listing nodes");
        let nodes: Option<Vec<ApiNode>> = self.get(&["nodes", netid]).await?;
        Ok(nodes.unwrap_or_default())
    }

    /// `GET /api/extclients/{netid}`
    pub async fn list_ext_clients(&self, netid: &str) -> Result<Vec<ApiExtClient>, Error> {
        debug!(netid, "listing external clients");
        let clients: Option<Vec<ApiExtClient>> = self.get(&["extclients", netid]).await?;
        Ok(clients.unwrap_or_default())
    }

    /// `POST /api/extclients/{netid}/{nodeid}`
    ///
    /// The server generates keys and address; the new client shows up in
    /// the next `list_ext_clients` call.
    pub async fn create_ext_client(&self, netid: &str, gateway_node_id: &str) -> Result<(), Error> {
        debug!(netid, gateway_node_id, "creating external client");
        let url = self.url(&["extclients", netid, gateway_node_id])?;
        debug!("POST {url}");
        let resp = self
            .http
            .post(url)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        self.handle_empty(resp).await
    }

    /// `PUT /api/extclients/{netid}/{clientid}`
    ///
    /// Returns the record as stored, under its new `clientid` if renamed.
    pub async fn update_ext_client(
        &self,
        netid: &str,
        clientid: &str,
        update: &ApiExtClientUpdate,
    ) -> Result<ApiExtClient, Error> {
        debug!(netid, clientid, new_clientid = %update.clientid, "updating external client");
        self.put(&["extclients", netid, clientid], update).await
    }

    /// `GET /api/extclients/{netid}/{clientid}/{file|qr}`
    ///
    /// Raw body: WireGuard config text for `File`, PNG bytes for `Qr`.
    pub async fn ext_client_config(
        &self,
        netid: &str,
        clientid: &str,
        kind: ExtClientConfigKind,
    ) -> Result<Vec<u8>, Error> {
        debug!(netid, clientid, kind = kind.as_segment(), "downloading external client config");
        let url = self.url(&["extclients", netid, clientid, kind.as_segment()])?;
        debug!("GET {url}");
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(resp.bytes().await?.to_vec())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    /// `DELETE /api/extclients/{netid}/{clientid}`
    pub async fn delete_ext_client(&self, netid: &str, clientid: &str) -> Result<(), Error> {
        debug!(netid, clientid, "deleting external client");
        let url = self.url(&["extclients", netid, clientid])?;
        debug!("DELETE {url}");
        let resp = self.http.delete(url).send().await?;
        self.handle_empty(resp).await
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build `{base}/api/{segments...}` with each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, Error> {
        let url = self.url(segments)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        self.handle_response(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(segments)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let path = resp.url().path().to_owned();
        let raw = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|err| err.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                if raw.trim().is_empty() {
                    status.to_string()
                } else {
                    raw.trim().to_owned()
                }
            });

        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Error::Authentication { message }
            }
            reqwest::StatusCode::NOT_FOUND => Error::NotFound { path },
            _ => Error::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}
