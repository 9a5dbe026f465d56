//! Signed-cookie credential gate.
//!
//! `POST /auth` trades a username and password for three CloudFront cookies
//! (policy, signature, key-pair id). `GET /auth/check` only looks at the
//! policy expiry; the CDN is what verifies the signature.

mod cookies;
mod gate;
pub mod policy;
mod signer;

pub use cookies::{
    CookieJar, SignedCookieSet, KEY_PAIR_ID_COOKIE, POLICY_COOKIE, SIGNATURE_COOKIE,
};
pub use gate::{password_digest, Credential, CredentialGate, IssuedCookies, SecretRecord};
pub use signer::PolicySigner;
