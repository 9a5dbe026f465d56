use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::cookies::{CookieJar, SignedCookieSet};
use super::policy::{encode_cookie_safe, Policy};
use super::signer::PolicySigner;
use crate::config::GateConfig;
use crate::error::ServiceError;
use crate::store::SecretStore;

/// Username and password submitted to `POST /auth`.
#[derive(Clone, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Credential {
    /// Parses a request body. Missing body and malformed JSON are validation errors.
    pub fn from_body(body: Option<&str>) -> Result<Self, ServiceError> {
        let body = body
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| ServiceError::validation("Request body is missing"))?;
        serde_json::from_str(body)
            .map_err(|_| ServiceError::validation("Invalid JSON in request body"))
    }
}

/// Stored credential: the username and the lowercase hex SHA-256 of the password.
#[derive(Clone, Deserialize)]
pub struct SecretRecord {
    pub username: String,
    #[serde(rename = "passwordHash")]
    pub password_hash: String,
}

impl std::fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretRecord")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl SecretRecord {
    /// Both fields compared in constant time, both always evaluated.
    pub fn matches(&self, credential: &Credential) -> bool {
        let digest = password_digest(&credential.password);
        let expected = self.password_hash.trim().to_ascii_lowercase();

        let username_ok = self.username.as_bytes().ct_eq(credential.username.as_bytes());
        let digest_ok = expected.as_bytes().ct_eq(digest.as_bytes());
        bool::from(username_ok & digest_ok)
    }
}

/// Lowercase hex SHA-256 of a password.
pub fn password_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Result of a successful [`CredentialGate::issue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCookies {
    pub cookies: SignedCookieSet,
    /// Policy expiry, epoch seconds.
    pub expire_time: i64,
}

/// Issues and checks signed access cookies.
///
/// The secret record and the signing key are fetched on first use and kept
/// for the life of the process. A failed fetch is not cached.
pub struct CredentialGate {
    store: Arc<dyn SecretStore>,
    config: GateConfig,
    record: OnceCell<SecretRecord>,
    signer: OnceCell<Arc<PolicySigner>>,
}

impl std::fmt::Debug for CredentialGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialGate")
            .field("config", &self.config)
            .field("record_cached", &self.record.initialized())
            .field("signer_cached", &self.signer.initialized())
            .finish()
    }
}

impl CredentialGate {
    pub fn new(store: Arc<dyn SecretStore>, config: GateConfig) -> Self {
        Self {
            store,
            config,
            record: OnceCell::new(),
            signer: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Verifies `credential` and, on a match, returns a freshly signed cookie set.
    pub async fn issue(&self, credential: &Credential) -> Result<IssuedCookies, ServiceError> {
        self.issue_at(credential, Utc::now().timestamp()).await
    }

    /// [`issue`](Self::issue) with an explicit clock, epoch seconds.
    pub async fn issue_at(
        &self,
        credential: &Credential,
        now: i64,
    ) -> Result<IssuedCookies, ServiceError> {
        let (record, signer) = tokio::try_join!(self.secret_record(), self.signer())?;
        let key_pair_id = self.config.key_pair_id()?;

        if !record.matches(credential) {
            warn!(event = "auth.rejected", "credential check failed");
            return Err(ServiceError::Authentication);
        }

        let expire_time = now.checked_add(self.config.ttl_secs).ok_or_else(|| {
            ServiceError::configuration(format!(
                "cookie lifetime of {}s is out of range",
                self.config.ttl_secs
            ))
        })?;
        let policy_json = Policy::until(self.config.resource.as_str(), expire_time).to_json();
        let cookies = SignedCookieSet {
            policy: encode_cookie_safe(policy_json.as_bytes()),
            signature: signer.sign(&policy_json),
            key_pair_id: key_pair_id.to_string(),
        };

        info!(
            event = "auth.issued",
            expire_time,
            resource = %self.config.resource,
            "signed cookies issued"
        );

        Ok(IssuedCookies {
            cookies,
            expire_time,
        })
    }

    /// True iff all three cookies are present and the policy expiry is in the future.
    /// Never fails; anything undecodable is `false`.
    pub fn check(&self, jar: &CookieJar) -> bool {
        Self::check_at(jar, Utc::now().timestamp())
    }

    /// [`check`](Self::check) with an explicit clock, epoch seconds.
    pub fn check_at(jar: &CookieJar, now: i64) -> bool {
        let Some(cookies) = SignedCookieSet::from_jar(jar) else {
            debug!(event = "auth.check", reason = "missing_cookies", "not authenticated");
            return false;
        };

        match Policy::from_cookie_value(&cookies.policy).and_then(|p| p.expires_at()) {
            Some(expires_at) if now < expires_at => true,
            Some(expires_at) => {
                debug!(event = "auth.check", expires_at, now, "policy expired");
                false
            }
            None => {
                debug!(event = "auth.check", reason = "undecodable_policy", "not authenticated");
                false
            }
        }
    }

    async fn secret_record(&self) -> Result<&SecretRecord, ServiceError> {
        self.record
            .get_or_try_init(|| async {
                let name = self.config.auth_secret_name()?;
                let raw = self.store.secret_string(name).await.map_err(|e| {
                    warn!(event = "auth.secret_fetch_failed", secret = name, error = %e);
                    ServiceError::dependency("secrets", e.to_string())
                })?;
                let record: SecretRecord = serde_json::from_str(&raw).map_err(|e| {
                    ServiceError::configuration(format!(
                        "secret {name} is not a {{username, passwordHash}} record (line {}, column {})",
                        e.line(),
                        e.column()
                    ))
                })?;
                debug!(event = "auth.secret_cached", secret = name);
                Ok::<_, ServiceError>(record)
            })
            .await
    }

    async fn signer(&self) -> Result<&Arc<PolicySigner>, ServiceError> {
        self.signer
            .get_or_try_init(|| async {
                let name = self.config.private_key_secret_name()?;
                let pem = self.store.secret_string(name).await.map_err(|e| {
                    warn!(event = "auth.secret_fetch_failed", secret = name, error = %e);
                    ServiceError::dependency("secrets", e.to_string())
                })?;
                let signer = PolicySigner::from_pem(&pem)?;
                debug!(event = "auth.signing_key_cached", secret = name);
                Ok::<_, ServiceError>(Arc::new(signer))
            })
            .await
    }
}
