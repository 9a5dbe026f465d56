//! CloudFront custom policy and its cookie-safe base64 form.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(rename = "Statement")]
    pub statement: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "Resource")]
    pub resource: String,
    #[serde(rename = "Condition")]
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "DateLessThan")]
    pub date_less_than: EpochTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochTime {
    #[serde(rename = "AWS:EpochTime")]
    pub epoch_time: i64,
}

impl Policy {
    /// Single-statement policy granting `resource` until `expires_at`.
    pub fn until(resource: impl Into<String>, expires_at: i64) -> Self {
        Self {
            statement: vec![Statement {
                resource: resource.into(),
                condition: Condition {
                    date_less_than: EpochTime {
                        epoch_time: expires_at,
                    },
                },
            }],
        }
    }

    /// Compact JSON. These exact bytes are what gets signed.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Expiry of the first statement.
    pub fn expires_at(&self) -> Option<i64> {
        self.statement
            .first()
            .map(|s| s.condition.date_less_than.epoch_time)
    }

    /// Parses the cookie value form. `None` on any decode or parse failure.
    pub fn from_cookie_value(value: &str) -> Option<Self> {
        let json = decode_cookie_safe(value)?;
        serde_json::from_slice(&json).ok()
    }
}

/// Base64 with the characters CloudFront rejects in cookies swapped out
/// (`+` → `-`, `=` → `_`, `/` → `~`).
pub fn encode_cookie_safe(bytes: &[u8]) -> String {
    STANDARD
        .encode(bytes)
        .chars()
        .map(|c| match c {
            '+' => '-',
            '=' => '_',
            '/' => '~',
            other => other,
        })
        .collect()
}

/// Inverse of [`encode_cookie_safe`]. Plain standard base64 passes through.
pub fn decode_cookie_safe(value: &str) -> Option<Vec<u8>> {
    let standard: String = value
        .trim()
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '=',
            '~' => '/',
            other => other,
        })
        .collect();
    STANDARD.decode(standard).ok()
}
