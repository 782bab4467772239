/// Connection resolution
///
/// Turns a database URL plus two-tier credentials into an authenticated
/// session:
/// 1. parse and validate the URL
/// 2. check that the given server is the endpoint the URL names
/// 3. authenticate the root credential (administrative access)
/// 4. create the database if it is absent (export only)
/// 5. open the database with the user credential (data access)

use super::url::DbUrl;
use crate::error::{BridgeError, BridgeResult};
use crate::server::{GraphDatabase, GraphServer};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// User and root credentials for one call
#[derive(Clone)]
pub struct Credentials {
    pub user_name: String,
    pub password: String,
    pub root_password: String,
}

impl Credentials {
    pub fn new(
        user_name: impl Into<String>,
        password: impl Into<String>,
        root_password: impl Into<String>,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            password: password.into(),
            root_password: root_password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_name", &self.user_name)
            .field("password", &"***")
            .field("root_password", &"***")
            .finish()
    }
}

/// Whether resolution may create the target database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create the database if absent (export path)
    CreateIfMissing,
    /// The database must already exist (import path)
    MustExist,
}

/// Authenticated session on one database
#[derive(Clone)]
pub struct Connection {
    url: DbUrl,
    session: Arc<dyn GraphDatabase>,
}

impl Connection {
    pub fn new(url: DbUrl, session: Arc<dyn GraphDatabase>) -> Self {
        Self { url, session }
    }

    pub fn url(&self) -> &DbUrl {
        &self.url
    }

    /// The URL exactly as the caller gave it
    pub fn db_uri(&self) -> &str {
        self.url.as_str()
    }

    pub fn session(&self) -> &Arc<dyn GraphDatabase> {
        &self.session
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("url", &self.url.as_str())
            .field("database", &self.session.name())
            .finish()
    }
}

/// Resolve a database URL against a server
///
/// # Returns
/// * `Ok(connection)` on success
/// * `Err(BridgeError::Connection)` for a malformed or unreachable URL, or a
///   missing database in `MustExist` mode
/// * `Err(BridgeError::RootAuth)` if the root password is rejected
/// * `Err(BridgeError::UserAuth)` if the user login is rejected
pub async fn resolve(
    server: &dyn GraphServer,
    db_url: &str,
    credentials: &Credentials,
    mode: OpenMode,
) -> BridgeResult<Connection> {
    let url = DbUrl::parse(db_url)?;
    if !server.serves(&url) {
        return Err(BridgeError::connection(db_url, "cannot reach the remote server"));
    }

    let to_bridge = |e| BridgeError::from_server(&url, e);
    let root = credentials.root_password.as_str();
    server.authenticate_root(root).await.map_err(to_bridge)?;

    let exists = server
        .database_exists(root, url.database())
        .await
        .map_err(to_bridge)?;
    if !exists {
        match mode {
            OpenMode::CreateIfMissing => {
                server
                    .create_database(root, url.database())
                    .await
                    .map_err(to_bridge)?;
                info!("Created database {}", url.database());
            }
            OpenMode::MustExist => {
                return Err(BridgeError::connection(
                    db_url,
                    format!("database '{}' does not exist", url.database()),
                ));
            }
        }
    }

    let session = server
        .open_database(url.database(), &credentials.user_name, &credentials.password)
        .await
        .map_err(to_bridge)?;
    debug!("Opened {} as {}", url, credentials.user_name);

    Ok(Connection::new(url, session))
}
