//! Cookie header parsing and `Set-Cookie` rendering for the signed cookie set.

use std::collections::HashMap;

pub const POLICY_COOKIE: &str = "CloudFront-Policy";
pub const SIGNATURE_COOKIE: &str = "CloudFront-Signature";
pub const KEY_PAIR_ID_COOKIE: &str = "CloudFront-Key-Pair-Id";

/// Cookies sent by the client, first occurrence of each name wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: HashMap<String, String>,
}

impl CookieJar {
    /// Parses one or more `Cookie` header values (`a=1; b=2`).
    pub fn parse<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut cookies = HashMap::new();
        for header in headers {
            for pair in header.split(';') {
                let Some((name, value)) = pair.split_once('=') else {
                    continue;
                };
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let value = value.trim().trim_matches('"');
                cookies
                    .entry(name.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }
        Self { cookies }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// The three cookies CloudFront needs for a custom-policy signed request.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedCookieSet {
    pub policy: String,
    pub signature: String,
    pub key_pair_id: String,
}

impl std::fmt::Debug for SignedCookieSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedCookieSet")
            .field("key_pair_id", &self.key_pair_id)
            .finish_non_exhaustive()
    }
}

impl SignedCookieSet {
    /// `None` unless all three cookies are present and non-empty.
    pub fn from_jar(jar: &CookieJar) -> Option<Self> {
        let field = |name| jar.get(name).filter(|v| !v.is_empty()).map(str::to_string);
        Some(Self {
            policy: field(POLICY_COOKIE)?,
            signature: field(SIGNATURE_COOKIE)?,
            key_pair_id: field(KEY_PAIR_ID_COOKIE)?,
        })
    }

    /// One `Set-Cookie` value per cookie.
    pub fn set_cookie_headers(&self, domain: Option<&str>) -> Vec<String> {
        let attributes = match domain {
            Some(domain) => format!("Domain={domain}; Path=/; Secure; HttpOnly; SameSite=None"),
            None => "Path=/; Secure; HttpOnly; SameSite=None".to_string(),
        };
        [
            (POLICY_COOKIE, &self.policy),
            (SIGNATURE_COOKIE, &self.signature),
            (KEY_PAIR_ID_COOKIE, &self.key_pair_id),
        ]
        .into_iter()
        .map(|(name, value)| format!("{name}={value}; {attributes}"))
        .collect()
    }
}
