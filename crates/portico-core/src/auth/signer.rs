//! RSA-SHA1 policy signing, the scheme CloudFront verifies signed cookies with.

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha1::Sha1;

use super::policy::encode_cookie_safe;
use crate::error::ServiceError;

pub struct PolicySigner {
    key: SigningKey<Sha1>,
}

impl std::fmt::Debug for PolicySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicySigner").finish_non_exhaustive()
    }
}

impl PolicySigner {
    /// Accepts PKCS#1 (`BEGIN RSA PRIVATE KEY`) or PKCS#8 (`BEGIN PRIVATE KEY`) PEM.
    pub fn from_pem(pem: &str) -> Result<Self, ServiceError> {
        let pem = pem.trim();
        let key = RsaPrivateKey::from_pkcs1_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
            .map_err(|_| {
                ServiceError::configuration("signing key secret is not an RSA private key PEM")
            })?;

        Ok(Self {
            key: SigningKey::<Sha1>::new(key),
        })
    }

    /// Signs the exact policy bytes; returns the cookie-safe base64 signature.
    pub fn sign(&self, policy_json: &str) -> String {
        let signature = self.key.sign(policy_json.as_bytes());
        encode_cookie_safe(&signature.to_bytes())
    }
}
