use std::{
    fmt,
    fmt::{Debug, Display},
};

/// A connection URL whose credentials must not end up in logs.
///
/// Formatting keeps the scheme, host and path so that operators can still tell which database is in use, but replaces
/// the password (or a bare user token) with `****`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretUrl(String);

impl SecretUrl {
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self(url.into())
    }

    pub fn reveal(&self) -> &str {
        self.0.as_str()
    }

    /// The URL with its credentials masked
    pub fn masked(&self) -> String {
        let Some(scheme_end) = self.0.find("://").map(|i| i + 3) else {
            return self.0.clone();
        };
        let rest = &self.0[scheme_end..];
        let authority_end = rest.find('/').unwrap_or(rest.len());
        let Some(at) = rest[..authority_end].rfind('@') else {
            return self.0.clone();
        };
        let user = match rest[..at].split_once(':') {
            Some((user, _)) => format!("{user}:****"),
            None => "****".to_string(),
        };
        format!("{}{user}{}", &self.0[..scheme_end], &rest[at..])
    }
}

impl From<String> for SecretUrl {
    fn from(url: String) -> Self {
        Self(url)
    }
}

impl Debug for SecretUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretUrl({})", self.masked())
    }
}

impl Display for SecretUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}
