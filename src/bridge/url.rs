/// Database URL parsing
///
/// Accepted forms:
/// - `remote:<host>:<port>/<database>` (port defaults to 2424 when omitted)
/// - `memory:<database>`
/// - `plocal:<directory>/<database>`

use crate::error::{BridgeError, BridgeResult};
use std::fmt;
use std::path::PathBuf;

/// Default binary-protocol port for `remote:` URLs without one
pub const DEFAULT_PORT: u16 = 2424;

/// Where a database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Network server
    Remote { host: String, port: u16 },
    /// In-process server
    Memory,
    /// Local data directory holding the database
    Plocal { path: PathBuf },
}

/// Parsed database URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbUrl {
    raw: String,
    endpoint: Endpoint,
    database: String,
}

impl DbUrl {
    /// Parse a database URL
    ///
    /// # Returns
    /// * `Err(BridgeError::Connection)` echoing `raw` when it is malformed
    pub fn parse(raw: &str) -> BridgeResult<Self> {
        let malformed = |reason: &str| BridgeError::connection(raw, reason);

        let (scheme, rest) = raw
            .split_once(':')
            .ok_or_else(|| malformed("missing URL scheme"))?;

        let (endpoint, database) = match scheme {
            "remote" => {
                let (authority, database) = rest
                    .split_once('/')
                    .ok_or_else(|| malformed("missing database name"))?;
                let (host, port) = match authority.rsplit_once(':') {
                    Some((host, port)) => {
                        let port = port
                            .parse::<u16>()
                            .map_err(|_| malformed("invalid port"))?;
                        (host, port)
                    }
                    None => (authority, DEFAULT_PORT),
                };
                if host.is_empty() {
                    return Err(malformed("missing host"));
                }
                (
                    Endpoint::Remote {
                        host: host.to_string(),
                        port,
                    },
                    database,
                )
            }
            "memory" => (Endpoint::Memory, rest),
            "plocal" => {
                let (dir, database) = rest
                    .rsplit_once('/')
                    .ok_or_else(|| malformed("missing database directory"))?;
                (
                    Endpoint::Plocal {
                        path: PathBuf::from(if dir.is_empty() { "/" } else { dir }),
                    },
                    database,
                )
            }
            _ => return Err(malformed("unsupported URL scheme")),
        };

        if database.is_empty() || database.contains('/') {
            return Err(malformed("missing database name"));
        }

        Ok(Self {
            raw: raw.to_string(),
            endpoint,
            database: database.to_string(),
        })
    }

    /// The URL exactly as given
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

impl fmt::Display for DbUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
