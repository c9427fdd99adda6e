//! Vault request and response shapes.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Body of `POST auth/approle/role/{role}/secret-id`.
#[derive(Debug, Serialize)]
pub struct SecretIdRequest {
    /// JSON-encoded metadata string
    pub metadata: String,
    /// Secret id TTL in seconds
    pub ttl: u64,
    /// Number of logins the secret id allows
    pub num_uses: u32,
}

/// Response of the secret id endpoint.
#[derive(Debug, Deserialize)]
pub struct SecretIdResponse {
    /// Response data
    pub data: SecretIdData,
}

/// Secret id payload.
#[derive(Debug, Deserialize)]
pub struct SecretIdData {
    /// The single-use secret id
    #[serde(default)]
    pub secret_id: String,
    /// Accessor for the secret id
    #[serde(default)]
    pub secret_id_accessor: String,
    /// TTL granted by Vault
    #[serde(default)]
    pub secret_id_ttl: u64,
    /// Uses granted by Vault
    #[serde(default)]
    pub secret_id_num_uses: u32,
}

/// Body of `POST auth/approle/login`. No `Debug`: it carries the secret id.
#[derive(Serialize)]
pub struct AppRoleLoginRequest<'a> {
    /// Role id
    pub role_id: &'a str,
    /// Secret id
    pub secret_id: &'a str,
}

/// Body of `POST auth/token/renew-self`.
#[derive(Debug, Serialize)]
pub struct RenewSelfRequest<'a> {
    /// Requested extension
    pub increment: &'a str,
}

/// Vault auth response, returned by login and renewal.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    /// Auth block
    pub auth: AuthData,
}

/// Auth block of an auth response.
#[derive(Debug, Deserialize)]
pub struct AuthData {
    /// Issued token
    #[serde(default)]
    pub client_token: String,
    /// Token accessor
    #[serde(default)]
    pub accessor: String,
    /// Policies attached to the token
    #[serde(default)]
    pub policies: Vec<String>,
    /// Lease duration in seconds
    #[serde(default)]
    pub lease_duration: u64,
    /// Whether the token can be renewed
    #[serde(default)]
    pub renewable: bool,
}

/// Response of `GET auth/token/lookup-self`.
#[derive(Debug, Deserialize)]
pub struct TokenLookupResponse {
    /// Token data
    pub data: TokenLookupData,
}

/// Token properties reported by lookup.
#[derive(Debug, Deserialize)]
pub struct TokenLookupData {
    /// Remaining TTL in seconds
    #[serde(default)]
    pub ttl: u64,
    /// Display name
    #[serde(default)]
    pub display_name: String,
    /// Attached policies
    #[serde(default)]
    pub policies: Vec<String>,
    /// Whether the token can be renewed
    #[serde(default)]
    pub renewable: bool,
    /// Expiry timestamp, absent for root tokens
    #[serde(default)]
    pub expire_time: Option<String>,
}

/// Vault KV v2 response wrapper.
#[derive(Debug, Deserialize)]
pub struct KvResponse<T> {
    /// KV data envelope
    pub data: KvData<T>,
}

/// KV v2 data envelope.
#[derive(Debug, Deserialize)]
pub struct KvData<T> {
    /// Stored value
    pub data: T,
    /// Version metadata
    #[serde(default)]
    pub metadata: Option<KvMetadata>,
}

/// KV v2 version metadata.
#[derive(Debug, Deserialize)]
pub struct KvMetadata {
    /// Creation time
    #[serde(default)]
    pub created_time: String,
    /// Version number
    #[serde(default)]
    pub version: u32,
}

/// The demo secret as stored in Vault.
#[derive(Deserialize)]
pub struct DemoSecretData {
    /// Database connection block
    pub database: DatabaseRecord,
}

/// Database block as stored in Vault. Converted to [`DatabaseSecret`]
/// before it goes anywhere; the password is plain text here.
#[derive(Deserialize)]
pub struct DatabaseRecord {
    /// Database host
    #[serde(default)]
    pub host: String,
    /// Database port, stored either as a number or a numeric string
    #[serde(default, deserialize_with = "deserialize_port")]
    pub port: u16,
    /// Database user
    #[serde(default)]
    pub user: String,
    /// Database password
    #[serde(default)]
    pub pass: String,
    /// Database name
    #[serde(default)]
    pub name: String,
}

impl DatabaseRecord {
    /// True when every field decoded to its default.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.host.is_empty()
            && self.port == 0
            && self.user.is_empty()
            && self.pass.is_empty()
            && self.name.is_empty()
    }
}

fn deserialize_port<'de, D>(d: D) -> Result<u16, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(d)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) if text.trim().is_empty() => Ok(0),
        Port::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Database credential bundle read from the KV secret.
#[derive(Debug, Clone)]
pub struct DatabaseSecret {
    /// Database host
    pub host: String,
    /// Database port
    pub port: u16,
    /// Database user
    pub user: String,
    /// Database password
    pub pass: SecretString,
    /// Database name
    pub name: String,
    /// KV version the bundle was read from
    pub version: Option<u32>,
}

impl DatabaseSecret {
    /// `None` when the stored database block is empty.
    pub(crate) fn from_kv(response: KvResponse<DemoSecretData>) -> Option<Self> {
        let version = response.data.metadata.map(|m| m.version);
        let db = response.data.data.database;
        if db.is_empty() {
            return None;
        }

        Some(Self {
            host: db.host,
            port: db.port,
            user: db.user,
            pass: SecretString::from(db.pass),
            name: db.name,
            version,
        })
    }
}

impl PartialEq for DatabaseSecret {
    fn eq(&self, other: &Self) -> bool {
        use secrecy::ExposeSecret;

        self.host == other.host
            && self.port == other.port
            && self.user == other.user
            && self.pass.expose_secret() == other.pass.expose_secret()
            && self.name == other.name
    }
}
