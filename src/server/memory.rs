/// In-memory graph server
///
/// Holds every database in process memory. Besides serving `memory:` URLs and
/// `remote:` URLs for its own host/port, it can simulate connection loss so
/// callers can exercise their failure paths:
/// - `disconnect()`: every following call fails with `ConnectionClosed`
/// - `disconnect_after_writes(n)`: the connection drops on the (n+1)-th batch write

use super::error::{ServerError, ServerResult};
use super::{validate_database_name, GraphDatabase, GraphServer, DEFAULT_USERS};
use crate::bridge::{DbUrl, Endpoint};
use crate::types::{ClassInfo, ClassKind, Edge, NewEdge, NewVertex, RecordId, Vertex};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

/// Connection state shared by a server and all of its sessions
#[derive(Debug)]
struct LinkState {
    disconnected: AtomicBool,
    /// Remaining batch writes before the link drops; negative means unlimited
    write_budget: AtomicI64,
}

impl LinkState {
    fn new() -> Self {
        Self {
            disconnected: AtomicBool::new(false),
            write_budget: AtomicI64::new(-1),
        }
    }

    fn check_online(&self) -> ServerResult<()> {
        if self.disconnected.load(Ordering::SeqCst) {
            Err(ServerError::ConnectionClosed)
        } else {
            Ok(())
        }
    }

    fn begin_write(&self) -> ServerResult<()> {
        self.check_online()?;
        let spent = self
            .write_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |budget| match budget {
                0 => None,
                b if b > 0 => Some(b - 1),
                b => Some(b),
            });
        if spent.is_err() {
            self.disconnected.store(true, Ordering::SeqCst);
            return Err(ServerError::ConnectionClosed);
        }
        Ok(())
    }
}

/// In-memory graph server
pub struct MemoryServer {
    host: String,
    port: u16,
    root_password: String,
    databases: RwLock<HashMap<String, Arc<MemoryDatabase>>>,
    link: Arc<LinkState>,
}

impl MemoryServer {
    /// Create a server answering for `remote:<host>:<port>/...` and `memory:...`
    pub fn new(host: impl Into<String>, port: u16, root_password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            root_password: root_password.into(),
            databases: RwLock::new(HashMap::new()),
            link: Arc::new(LinkState::new()),
        }
    }

    /// Drop the connection: every following call fails
    pub fn disconnect(&self) {
        self.link.disconnected.store(true, Ordering::SeqCst);
    }

    /// Let `writes` more batch writes through, then drop the connection
    pub fn disconnect_after_writes(&self, writes: u32) {
        self.link
            .write_budget
            .store(i64::from(writes), Ordering::SeqCst);
    }

    /// Restore the connection and clear any write budget
    pub fn reconnect(&self) {
        self.link.write_budget.store(-1, Ordering::SeqCst);
        self.link.disconnected.store(false, Ordering::SeqCst);
    }

    /// Names of all databases, sorted
    pub fn database_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.databases.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn check_root(&self, password: &str) -> ServerResult<()> {
        self.link.check_online()?;
        if password == self.root_password {
            Ok(())
        } else {
            Err(ServerError::InvalidRootCredentials)
        }
    }
}

#[async_trait]
impl GraphServer for MemoryServer {
    fn serves(&self, url: &DbUrl) -> bool {
        match url.endpoint() {
            Endpoint::Remote { host, port } => *host == self.host && *port == self.port,
            Endpoint::Memory => true,
            Endpoint::Plocal { .. } => false,
        }
    }

    async fn authenticate_root(&self, password: &str) -> ServerResult<()> {
        self.check_root(password)
    }

    async fn database_exists(&self, root_password: &str, name: &str) -> ServerResult<bool> {
        self.check_root(root_password)?;
        Ok(self.databases.read().contains_key(name))
    }

    async fn create_database(&self, root_password: &str, name: &str) -> ServerResult<bool> {
        self.check_root(root_password)?;
        validate_database_name(name)?;

        let mut databases = self.databases.write();
        if databases.contains_key(name) {
            return Ok(false);
        }
        databases.insert(
            name.to_string(),
            Arc::new(MemoryDatabase::new(name, self.link.clone())),
        );
        Ok(true)
    }

    async fn open_database(
        &self,
        name: &str,
        user: &str,
        password: &str,
    ) -> ServerResult<Arc<dyn GraphDatabase>> {
        self.link.check_online()?;
        let db = self
            .databases
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ServerError::DatabaseNotFound(name.to_string()))?;

        if db.users.get(user).map(String::as_str) != Some(password) {
            return Err(ServerError::InvalidUserCredentials {
                database: name.to_string(),
            });
        }
        Ok(db)
    }
}

/// Mutable content of one in-memory database
#[derive(Default)]
struct DbState {
    classes: BTreeMap<(ClassKind, String), ClassInfo>,
    next_class_id: u16,
    vertices: HashMap<u16, Vec<Vertex>>,
    edges: HashMap<u16, Vec<Edge>>,
    /// Vertex key index: key -> record address
    keys: HashMap<String, RecordId>,
}

impl DbState {
    fn class(&self, kind: ClassKind, name: &str) -> ServerResult<&ClassInfo> {
        self.classes
            .get(&(kind, name.to_string()))
            .ok_or_else(|| ServerError::ClassNotFound {
                kind,
                name: name.to_string(),
            })
    }
}

/// One in-memory database
pub struct MemoryDatabase {
    name: String,
    users: HashMap<String, String>,
    state: RwLock<DbState>,
    link: Arc<LinkState>,
}

impl MemoryDatabase {
    fn new(name: &str, link: Arc<LinkState>) -> Self {
        let users = DEFAULT_USERS
            .iter()
            .map(|(user, password)| (user.to_string(), password.to_string()))
            .collect();
        Self {
            name: name.to_string(),
            users,
            state: RwLock::new(DbState {
                next_class_id: 1,
                ..DbState::default()
            }),
            link,
        }
    }
}

#[async_trait]
impl GraphDatabase for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_class(
        &self,
        kind: ClassKind,
        name: &str,
        label_column: Option<&str>,
    ) -> ServerResult<bool> {
        self.link.begin_write()?;
        let mut state = self.state.write();
        let key = (kind, name.to_string());
        if state.classes.contains_key(&key) {
            return Ok(false);
        }

        let id = state.next_class_id;
        state.next_class_id = id
            .checked_add(1)
            .ok_or_else(|| ServerError::TooManyClasses(self.name.clone()))?;
        state.classes.insert(
            key,
            ClassInfo {
                id,
                name: name.to_string(),
                kind,
                label_column: label_column.map(str::to_string),
            },
        );
        Ok(true)
    }

    async fn classes(&self, kind: ClassKind) -> ServerResult<Vec<ClassInfo>> {
        self.link.check_online()?;
        let state = self.state.read();
        Ok(state
            .classes
            .values()
            .filter(|c| c.kind == kind)
            .cloned()
            .collect())
    }

    async fn insert_vertices(&self, class: &str, batch: Vec<NewVertex>) -> ServerResult<usize> {
        self.link.begin_write()?;
        let mut state = self.state.write();
        let class_id = state.class(ClassKind::Vertex, class)?.id;

        let mut batch_keys = HashSet::new();
        for vertex in &batch {
            if state.keys.contains_key(&vertex.key) || !batch_keys.insert(vertex.key.as_str()) {
                return Err(ServerError::DuplicateKey(vertex.key.clone()));
            }
        }

        let start = state.vertices.get(&class_id).map_or(0, Vec::len) as u64;
        let mut stored = Vec::with_capacity(batch.len());
        for (offset, vertex) in batch.into_iter().enumerate() {
            let rid = RecordId::new(class_id, start + offset as u64)?;
            stored.push(Vertex::new(rid, class, vertex.key, vertex.properties));
        }

        let inserted = stored.len();
        for vertex in &stored {
            state.keys.insert(vertex.key.clone(), vertex.rid);
        }
        state.vertices.entry(class_id).or_default().extend(stored);
        Ok(inserted)
    }

    async fn insert_edges(&self, class: &str, batch: Vec<NewEdge>) -> ServerResult<usize> {
        self.link.begin_write()?;
        let mut state = self.state.write();
        let class_id = state.class(ClassKind::Edge, class)?.id;

        let resolve = |key: &str| {
            state
                .keys
                .get(key)
                .copied()
                .ok_or_else(|| ServerError::VertexNotFound(key.to_string()))
        };

        let start = state.edges.get(&class_id).map_or(0, Vec::len) as u64;
        let mut stored = Vec::with_capacity(batch.len());
        for (offset, edge) in batch.into_iter().enumerate() {
            let out_rid = resolve(&edge.out_key)?;
            let in_rid = resolve(&edge.in_key)?;
            stored.push(Edge {
                rid: RecordId::new(class_id, start + offset as u64)?,
                class: class.to_string(),
                out_rid,
                in_rid,
                out_key: edge.out_key,
                in_key: edge.in_key,
                properties: edge.properties,
            });
        }

        let inserted = stored.len();
        state.edges.entry(class_id).or_default().extend(stored);
        Ok(inserted)
    }

    async fn scan_vertices(&self, class: &str) -> ServerResult<Vec<Vertex>> {
        self.link.check_online()?;
        let state = self.state.read();
        let class_id = state.class(ClassKind::Vertex, class)?.id;
        Ok(state.vertices.get(&class_id).cloned().unwrap_or_default())
    }

    async fn scan_edges(&self, class: &str) -> ServerResult<Vec<Edge>> {
        self.link.check_online()?;
        let state = self.state.read();
        let class_id = state.class(ClassKind::Edge, class)?.id;
        Ok(state.edges.get(&class_id).cloned().unwrap_or_default())
    }

    async fn count(&self, kind: ClassKind, class: &str) -> ServerResult<u64> {
        self.link.check_online()?;
        let state = self.state.read();
        let class_id = state.class(kind, class)?.id;
        let count = match kind {
            ClassKind::Vertex => state.vertices.get(&class_id).map_or(0, Vec::len),
            ClassKind::Edge => state.edges.get(&class_id).map_or(0, Vec::len),
        };
        Ok(count as u64)
    }
}
