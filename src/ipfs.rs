//! IPFS pinning and retrieval.
//!
//! Uploads go to the Pinata pinning API with a server-held bearer token;
//! retrieval walks a fixed list of public gateways in order and takes the
//! first success. Failures are terminal, never retried beyond the gateway
//! walk.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Public gateways tried in order for content retrieval.
pub const DEFAULT_GATEWAYS: &[&str] = &[
    "https://ipfs.io/ipfs/",
    "https://gateway.pinata.cloud/ipfs/",
    "https://cloudflare-ipfs.com/ipfs/",
    "https://dweb.link/ipfs/",
];

pub const DEFAULT_PINATA_API_URL: &str = "https://api.pinata.cloud";

#[derive(Debug, Error)]
pub enum IpfsError {
    #[error("pinning service returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid json payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("all gateways failed for {hash}")]
    AllGatewaysFailed { hash: String },

    #[error("pinning response missing field {0}")]
    MissingField(&'static str),
}

/// The JSON document pinned alongside each audio file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicMetadata {
    pub title: String,
    pub artist: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub audio_file: String,
    pub created_at: String,
}

/// A pinned file as reported by the pinning service.
#[derive(Debug, Clone, Serialize)]
pub struct IpfsFile {
    pub path: String,
    pub hash: String,
    pub size: u64,
}

/// One part of a multipart body forwarded to the pinning API.
#[derive(Debug, Clone)]
pub struct ForwardPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

pub struct IpfsService {
    http: reqwest::Client,
    base_url: String,
    jwt: String,
    gateways: Vec<String>,
}

impl IpfsService {
    pub fn new(base_url: impl Into<String>, jwt: impl Into<String>) -> Self {
        IpfsService {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            jwt: jwt.into(),
            gateways: DEFAULT_GATEWAYS.iter().map(|g| (*g).to_owned()).collect(),
        }
    }

    pub fn with_gateways(mut self, gateways: Vec<String>) -> Self {
        self.gateways = gateways;
        self
    }

    /// Forward a multipart body to the pinning API verbatim and return the
    /// upstream JSON body verbatim.
    pub async fn pin_file(&self, parts: Vec<ForwardPart>) -> Result<Value, IpfsError> {
        let mut form = reqwest::multipart::Form::new();
        for part in parts {
            let mut piece = reqwest::multipart::Part::bytes(part.data);
            if let Some(file_name) = part.file_name {
                piece = piece.file_name(file_name);
            }
            if let Some(content_type) = part.content_type {
                piece = piece.mime_str(&content_type)?;
            }
            form = form.part(part.name, piece);
        }

        let response = self
            .http
            .post(format!("{}/pinning/pinFileToIPFS", self.base_url))
            .bearer_auth(&self.jwt)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %body, "pinning upload failed");
            return Err(IpfsError::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    /// Pin a single file and report its hash and pinned size.
    pub async fn upload_file(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        data: Vec<u8>,
    ) -> Result<IpfsFile, IpfsError> {
        let parts = vec![ForwardPart {
            name: "file".to_owned(),
            file_name: Some(file_name.to_owned()),
            content_type: content_type.map(str::to_owned),
            data,
        }];
        let body = self.pin_file(parts).await?;
        let hash = body
            .get("IpfsHash")
            .and_then(Value::as_str)
            .ok_or(IpfsError::MissingField("IpfsHash"))?;
        let size = body.get("PinSize").and_then(Value::as_u64).unwrap_or(0);
        Ok(IpfsFile {
            path: file_name.to_owned(),
            hash: hash.to_owned(),
            size,
        })
    }

    /// Pin the metadata document as `metadata.json`, returning its hash.
    pub async fn upload_metadata(&self, metadata: &MusicMetadata) -> Result<String, IpfsError> {
        let data = serde_json::to_vec(metadata)?;
        let parts = vec![
            ForwardPart {
                name: "file".to_owned(),
                file_name: Some("metadata.json".to_owned()),
                content_type: Some("application/json".to_owned()),
                data,
            },
            ForwardPart {
                name: "pinataMetadata".to_owned(),
                file_name: None,
                content_type: None,
                data: serde_json::to_vec(&json!({ "name": "metadata.json" }))?,
            },
            ForwardPart {
                name: "pinataOptions".to_owned(),
                file_name: None,
                content_type: None,
                data: serde_json::to_vec(&json!({ "cidVersion": 1 }))?,
            },
        ];
        let body = self.pin_file(parts).await?;
        body.get("IpfsHash")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(IpfsError::MissingField("IpfsHash"))
    }

    /// Ask the pinning service to pin content that is already on the
    /// network.
    pub async fn pin_by_hash(&self, hash: &str) -> Result<(), IpfsError> {
        let body = json!({
            "hashToPin": hash,
            "pinataMetadata": {
                "name": format!("saya-pin-{hash}"),
                "keyvalues": {
                    "service": "saya-platform",
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                },
            },
        });

        let response = self
            .http
            .post(format!("{}/pinning/pinByHash", self.base_url))
            .bearer_auth(&self.jwt)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %hash, %body, "pin by hash failed");
            return Err(IpfsError::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    /// Fetch a JSON document by hash, trying each gateway in order until one
    /// returns a parseable 2xx response.
    pub async fn fetch_json(&self, hash: &str) -> Result<Value, IpfsError> {
        for gateway in &self.gateways {
            let url = format!("{gateway}{hash}");
            match self.http.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    match response.json::<Value>().await {
                        Ok(value) => return Ok(value),
                        Err(err) => {
                            tracing::warn!(%url, "gateway returned unparseable body: {}", err);
                        }
                    }
                }
                Ok(response) => {
                    tracing::warn!(%url, status = response.status().as_u16(), "gateway miss");
                }
                Err(err) => {
                    tracing::warn!(%url, "gateway unreachable: {}", err);
                }
            }
        }
        Err(IpfsError::AllGatewaysFailed {
            hash: hash.to_owned(),
        })
    }

    pub async fn fetch_metadata(&self, hash: &str) -> Result<MusicMetadata, IpfsError> {
        let value = self.fetch_json(hash).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Public URL for a hash on the primary gateway.
    pub fn gateway_url(&self, hash: &str) -> String {
        let gateway = self
            .gateways
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_GATEWAYS[0]);
        format!("{gateway}{hash}")
    }
}
