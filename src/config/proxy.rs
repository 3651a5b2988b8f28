use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::error::{ScraperError, ScraperResult};

/// One proxy credential, written as `ip:port:username:password`
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyEntry {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl ProxyEntry {
    /// Proxy server address as the browser expects it
    pub fn server(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl FromStr for ProxyEntry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        let [host, port, username, password] = parts.as_slice() else {
            return Err(format!(
                "expected ip:port:username:password, found {} field(s)",
                parts.len()
            ));
        };

        let port = port
            .parse::<u16>()
            .map_err(|_| format!("port '{}' is not a number", port))?;

        Ok(Self {
            host: host.to_string(),
            port,
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

// Credentials end up in logs; never print the password.
impl fmt::Display for ProxyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.host, self.port, self.username)
    }
}

impl fmt::Debug for ProxyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyEntry")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Parse a proxy list. Blank lines are ignored; any other malformed line is fatal.
pub fn parse_proxies(content: &str) -> ScraperResult<Vec<ProxyEntry>> {
    let proxies = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            line.parse::<ProxyEntry>()
                .map_err(|reason| ScraperError::InvalidProxy { line: index + 1, reason })
        })
        .collect::<ScraperResult<Vec<_>>>()?;

    if proxies.is_empty() {
        return Err(ScraperError::config("Proxies file is empty"));
    }

    Ok(proxies)
}

/// Load and validate the proxy list file
pub async fn load_proxies<P: AsRef<Path>>(path: P) -> ScraperResult<Vec<ProxyEntry>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        ScraperError::config(format!("Proxies file {} not readable: {}", path.display(), e))
    })?;

    let proxies = parse_proxies(&content)?;
    info!("Loaded {} proxies from {}", proxies.len(), path.display());
    Ok(proxies)
}

/// Fixed-order round-robin over the proxy list
#[derive(Debug, Clone)]
pub struct ProxyRotation {
    proxies: Vec<ProxyEntry>,
    next: usize,
}

impl ProxyRotation {
    pub fn new(proxies: Vec<ProxyEntry>) -> ScraperResult<Self> {
        if proxies.is_empty() {
            return Err(ScraperError::config("Proxy rotation needs at least one proxy"));
        }
        Ok(Self { proxies, next: 0 })
    }

    /// Proxy for the next session, wrapping after the last one
    pub fn next_proxy(&mut self) -> &ProxyEntry {
        let index = self.next;
        self.next = (self.next + 1) % self.proxies.len();
        &self.proxies[index]
    }

    /// Number of distinct proxies in the rotation
    pub fn proxy_count(&self) -> usize {
        self.proxies.len()
    }
}
