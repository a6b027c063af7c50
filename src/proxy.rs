//! Proxy descriptors and their validated form.

use crate::error::MalformedProxyUrl;

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;
use std::str::FromStr;

// scheme://[user:pass@]host:port, port is 2 to 7 decimal digits without a leading zero.
static PROXY_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\w+)://(?:([\w-]+):([\w-]+)@)?([\w.-]+):([1-9]\d{1,6})$")
        .expect("proxy URL pattern is valid")
});

/// Username and password presented to the proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// A parsed proxy endpoint that has not been probed yet.
///
/// Every value renders to a URL that `parse` accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyDescriptor {
    /// Protocol scheme (e.g. "socks5").
    scheme: String,
    /// Optional credentials; both fields are present or the whole value is absent.
    credentials: Option<Credentials>,
    /// Proxy host.
    host: String,
    /// Proxy port.
    port: u32,
}

impl ProxyDescriptor {
    /// Parse a proxy URL of the form `scheme://[user:pass@]host:port`.
    pub fn parse(url: &str) -> Result<Self, MalformedProxyUrl> {
        let caps = PROXY_URL
            .captures(url)
            .ok_or_else(|| MalformedProxyUrl(url.to_string()))?;

        let port = caps[5]
            .parse()
            .map_err(|_| MalformedProxyUrl(url.to_string()))?;

        // The pattern captures user and pass together or not at all.
        let credentials = match (caps.get(2), caps.get(3)) {
            (Some(user), Some(pass)) => Some(Credentials {
                username: user.as_str().to_string(),
                password: pass.as_str().to_string(),
            }),
            _ => None,
        };

        Ok(Self {
            scheme: caps[1].to_string(),
            credentials,
            host: caps[4].to_string(),
            port,
        })
    }

    /// Create a descriptor carrying credentials, checked against the URL grammar.
    pub fn with_credentials(
        scheme: &str,
        username: &str,
        password: &str,
        host: &str,
        port: u32,
    ) -> Result<Self, MalformedProxyUrl> {
        // None of the component classes admit ':' or '@', so a successful parse
        // yields exactly these components.
        Self::parse(&format!("{}://{}:{}@{}:{}", scheme, username, password, host, port))
    }

    /// Build from components already known to match the URL grammar.
    pub(crate) fn from_checked_parts(
        scheme: &str,
        username: String,
        password: String,
        host: &str,
        port: u32,
    ) -> Self {
        Self {
            scheme: scheme.to_string(),
            credentials: Some(Credentials { username, password }),
            host: host.to_string(),
            port,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u32 {
        self.port
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Get the username, if the proxy carries credentials.
    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }

    /// Get the password, if the proxy carries credentials.
    pub fn password(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.password.as_str())
    }

    /// Render the canonical URL used by the transport to select a route.
    pub fn render(&self) -> String {
        match &self.credentials {
            Some(c) => format!(
                "{}://{}:{}@{}:{}",
                self.scheme, c.username, c.password, self.host, self.port
            ),
            None => format!("{}://{}:{}", self.scheme, self.host, self.port),
        }
    }
}

impl FromStr for ProxyDescriptor {
    type Err = MalformedProxyUrl;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ProxyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// A proxy that answered a probe, together with the external IP it exits from.
///
/// Identity is the discovered IP: two validated proxies that exit from the same
/// address compare equal even if their endpoints differ. Only the validator
/// produces values of this type, so an unprobed descriptor can never take part
/// in deduplication.
#[derive(Debug, Clone)]
pub struct ValidatedProxy {
    descriptor: ProxyDescriptor,
    ip: IpAddr,
}

impl ValidatedProxy {
    pub(crate) fn new(descriptor: ProxyDescriptor, ip: IpAddr) -> Self {
        Self { descriptor, ip }
    }

    /// Get the endpoint this proxy was probed through.
    pub fn descriptor(&self) -> &ProxyDescriptor {
        &self.descriptor
    }

    /// External IP discovered through this proxy.
    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// Render the proxy URL used to route worker sessions.
    pub fn url(&self) -> String {
        self.descriptor.render()
    }
}

impl PartialEq for ValidatedProxy {
    fn eq(&self, other: &Self) -> bool {
        self.ip == other.ip
    }
}

impl Eq for ValidatedProxy {}

impl Hash for ValidatedProxy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ip.hash(state);
    }
}

impl fmt::Display for ValidatedProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.descriptor, self.ip)
    }
}
