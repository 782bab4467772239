/// RocksDB-backed graph server
///
/// Every database lives in its own RocksDB instance at `<data_dir>/<name>`.
///
/// Key space design (per database):
/// - User:     u:{name} → password
/// - Class:    k:{v|e}:{name} → ClassInfo (JSON)
/// - ClassSeq: s:class → next class id
/// - Counter:  c:{class_id} → next position
/// - Vertex:   v:{class_id}:{position} → Vertex (JSON)
/// - Edge:     e:{class_id}:{position} → Edge (JSON)
/// - KeyIndex: x:{vertex key} → RecordId

use super::error::{ServerError, ServerResult};
use super::{validate_database_name, GraphDatabase, GraphServer, DEFAULT_USERS};
use crate::bridge::{DbUrl, Endpoint};
use crate::types::{ClassInfo, ClassKind, Edge, NewEdge, NewVertex, RecordId, Vertex};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rocksdb::{Options, WriteBatch, DB};
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Marker key written when a database is created
const CREATED_KEY: &str = "s:created";
const CLASS_SEQ_KEY: &str = "s:class";

/// RocksDB-backed graph server
pub struct RocksDbServer {
    data_dir: PathBuf,
    host: String,
    port: u16,
    root_password: String,
    /// Databases opened by this process; RocksDB allows one handle per path
    open: Mutex<HashMap<String, Arc<RocksDbDatabase>>>,
}

impl RocksDbServer {
    /// Create a server storing its databases under `data_dir`
    pub fn new<P: AsRef<Path>>(
        data_dir: P,
        host: impl Into<String>,
        port: u16,
        root_password: impl Into<String>,
    ) -> ServerResult<Self> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        Ok(Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            host: host.into(),
            port,
            root_password: root_password.into(),
            open: Mutex::new(HashMap::new()),
        })
    }

    /// Directory holding all databases
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn check_root(&self, password: &str) -> ServerResult<()> {
        if password == self.root_password {
            Ok(())
        } else {
            Err(ServerError::InvalidRootCredentials)
        }
    }

    fn database_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Get an open handle, opening the database from disk if needed
    fn handle(&self, name: &str, create: bool) -> ServerResult<Option<Arc<RocksDbDatabase>>> {
        validate_database_name(name)?;
        let mut open = self.open.lock();
        if let Some(db) = open.get(name) {
            return Ok(Some(db.clone()));
        }

        let path = self.database_path(name);
        if !create && !path.exists() {
            return Ok(None);
        }

        let db = Arc::new(RocksDbDatabase::open(name, &path)?);
        open.insert(name.to_string(), db.clone());
        Ok(Some(db))
    }
}

#[async_trait]
impl GraphServer for RocksDbServer {
    fn serves(&self, url: &DbUrl) -> bool {
        match url.endpoint() {
            Endpoint::Remote { host, port } => *host == self.host && *port == self.port,
            Endpoint::Plocal { path } => path == &self.data_dir,
            Endpoint::Memory => false,
        }
    }

    async fn authenticate_root(&self, password: &str) -> ServerResult<()> {
        self.check_root(password)
    }

    async fn database_exists(&self, root_password: &str, name: &str) -> ServerResult<bool> {
        self.check_root(root_password)?;
        match self.handle(name, false)? {
            Some(db) => db.is_initialized(),
            None => Ok(false),
        }
    }

    async fn create_database(&self, root_password: &str, name: &str) -> ServerResult<bool> {
        self.check_root(root_password)?;
        let db = self
            .handle(name, true)?
            .ok_or_else(|| ServerError::DatabaseNotFound(name.to_string()))?;
        let created = db.initialize()?;
        if created {
            info!("Created database {} at {}", name, self.database_path(name).display());
        }
        Ok(created)
    }

    async fn open_database(
        &self,
        name: &str,
        user: &str,
        password: &str,
    ) -> ServerResult<Arc<dyn GraphDatabase>> {
        let db = self
            .handle(name, false)?
            .ok_or_else(|| ServerError::DatabaseNotFound(name.to_string()))?;
        if !db.is_initialized()? {
            return Err(ServerError::DatabaseNotFound(name.to_string()));
        }
        db.authenticate(user, password)?;
        Ok(db)
    }
}

/// One RocksDB-backed database
pub struct RocksDbDatabase {
    name: String,
    db: Arc<DB>,
    /// Class cache: (kind, name) -> descriptor
    classes: RwLock<HashMap<(ClassKind, String), ClassInfo>>,
    /// Serializes batch writes so key checks and counter bumps are atomic
    write_lock: Mutex<()>,
}

impl RocksDbDatabase {
    fn open(name: &str, path: &Path) -> ServerResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, path)?;
        let database = Self {
            name: name.to_string(),
            db: Arc::new(db),
            classes: RwLock::new(HashMap::new()),
            write_lock: Mutex::new(()),
        };

        database.load_classes()?;
        Ok(database)
    }

    fn is_initialized(&self) -> ServerResult<bool> {
        Ok(self.db.get(CREATED_KEY.as_bytes())?.is_some())
    }

    /// Seed users on first creation; returns whether anything was written
    fn initialize(&self) -> ServerResult<bool> {
        let _guard = self.write_lock.lock();
        if self.is_initialized()? {
            return Ok(false);
        }

        let mut batch = WriteBatch::default();
        for (user, password) in DEFAULT_USERS {
            batch.put(make_user_key(user).as_bytes(), password.as_bytes());
        }
        batch.put(CLASS_SEQ_KEY.as_bytes(), 1u16.to_le_bytes());
        batch.put(CREATED_KEY.as_bytes(), b"");
        self.db.write(batch)?;
        Ok(true)
    }

    fn authenticate(&self, user: &str, password: &str) -> ServerResult<()> {
        match self.db.get(make_user_key(user).as_bytes())? {
            Some(stored) if stored == password.as_bytes() => Ok(()),
            _ => Err(ServerError::InvalidUserCredentials {
                database: self.name.clone(),
            }),
        }
    }

    /// Load existing classes from the database
    fn load_classes(&self) -> ServerResult<()> {
        let mut cache = self.classes.write();
        for item in self.db.prefix_iterator(b"k:") {
            let (key, value) = item?;
            if !key.starts_with(b"k:") {
                break;
            }
            let info: ClassInfo = serde_json::from_slice(&value)?;
            cache.insert((info.kind, info.name.clone()), info);
        }
        Ok(())
    }

    fn class(&self, kind: ClassKind, name: &str) -> ServerResult<ClassInfo> {
        self.classes
            .read()
            .get(&(kind, name.to_string()))
            .cloned()
            .ok_or_else(|| ServerError::ClassNotFound {
                kind,
                name: name.to_string(),
            })
    }

    fn read_u64(&self, key: &str) -> ServerResult<u64> {
        match self.db.get(key.as_bytes())? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| ServerError::Corrupted(key.to_string()))?;
                Ok(u64::from_le_bytes(raw))
            }
            None => Ok(0),
        }
    }

    fn lookup_key(&self, key: &str) -> ServerResult<Option<RecordId>> {
        match self.db.get(make_index_key(key).as_bytes())? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| ServerError::Corrupted(format!("index entry for {}", key)))?;
                Ok(Some(RecordId::from_raw(u64::from_le_bytes(raw))))
            }
            None => Ok(None),
        }
    }

    /// Scan all records under a prefix, in key order
    fn scan_prefix<T: DeserializeOwned>(&self, prefix: &str) -> ServerResult<Vec<T>> {
        let mut records = Vec::new();
        for item in self.db.prefix_iterator(prefix.as_bytes()) {
            let (key, value) = item?;
            // Check if key still matches prefix
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }
}

#[async_trait]
impl GraphDatabase for RocksDbDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_class(
        &self,
        kind: ClassKind,
        name: &str,
        label_column: Option<&str>,
    ) -> ServerResult<bool> {
        let _guard = self.write_lock.lock();
        if self.classes.read().contains_key(&(kind, name.to_string())) {
            return Ok(false);
        }

        let id = match self.db.get(CLASS_SEQ_KEY.as_bytes())? {
            Some(bytes) if bytes.len() == 2 => u16::from_le_bytes([bytes[0], bytes[1]]),
            _ => return Err(ServerError::Corrupted(CLASS_SEQ_KEY.to_string())),
        };
        let next = id
            .checked_add(1)
            .ok_or_else(|| ServerError::TooManyClasses(self.name.clone()))?;

        let info = ClassInfo {
            id,
            name: name.to_string(),
            kind,
            label_column: label_column.map(str::to_string),
        };

        let mut batch = WriteBatch::default();
        batch.put(make_class_key(kind, name).as_bytes(), serde_json::to_vec(&info)?);
        batch.put(CLASS_SEQ_KEY.as_bytes(), next.to_le_bytes());
        self.db.write(batch)?;

        debug!("Created {} class {} (id {}) in {}", kind, name, id, self.name);
        self.classes.write().insert((kind, name.to_string()), info);
        Ok(true)
    }

    async fn classes(&self, kind: ClassKind) -> ServerResult<Vec<ClassInfo>> {
        let mut classes: Vec<ClassInfo> = self
            .classes
            .read()
            .values()
            .filter(|c| c.kind == kind)
            .cloned()
            .collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(classes)
    }

    async fn insert_vertices(&self, class: &str, batch: Vec<NewVertex>) -> ServerResult<usize> {
        let _guard = self.write_lock.lock();
        let info = self.class(ClassKind::Vertex, class)?;

        let mut batch_keys = HashSet::new();
        for vertex in &batch {
            if !batch_keys.insert(vertex.key.as_str()) || self.lookup_key(&vertex.key)?.is_some() {
                return Err(ServerError::DuplicateKey(vertex.key.clone()));
            }
        }

        let counter_key = make_counter_key(info.id);
        let start = self.read_u64(&counter_key)?;
        let mut write = WriteBatch::default();
        let inserted = batch.len();

        for (offset, vertex) in batch.into_iter().enumerate() {
            let position = start + offset as u64;
            let rid = RecordId::new(info.id, position)?;
            let record = Vertex::new(rid, class, vertex.key, vertex.properties);
            write.put(
                make_record_key(ClassKind::Vertex, info.id, position).as_bytes(),
                serde_json::to_vec(&record)?,
            );
            write.put(make_index_key(&record.key).as_bytes(), rid.as_raw().to_le_bytes());
        }
        write.put(counter_key.as_bytes(), (start + inserted as u64).to_le_bytes());

        self.db.write(write)?;
        Ok(inserted)
    }

    async fn insert_edges(&self, class: &str, batch: Vec<NewEdge>) -> ServerResult<usize> {
        let _guard = self.write_lock.lock();
        let info = self.class(ClassKind::Edge, class)?;

        let mut resolved: HashMap<String, RecordId> = HashMap::new();
        for edge in &batch {
            for key in [&edge.out_key, &edge.in_key] {
                if resolved.contains_key(key) {
                    continue;
                }
                let rid = self
                    .lookup_key(key)?
                    .ok_or_else(|| ServerError::VertexNotFound(key.clone()))?;
                resolved.insert(key.clone(), rid);
            }
        }

        let counter_key = make_counter_key(info.id);
        let start = self.read_u64(&counter_key)?;
        let mut write = WriteBatch::default();
        let inserted = batch.len();

        for (offset, edge) in batch.into_iter().enumerate() {
            let position = start + offset as u64;
            let record = Edge {
                rid: RecordId::new(info.id, position)?,
                class: class.to_string(),
                out_rid: resolved[&edge.out_key],
                in_rid: resolved[&edge.in_key],
                out_key: edge.out_key,
                in_key: edge.in_key,
                properties: edge.properties,
            };
            write.put(
                make_record_key(ClassKind::Edge, info.id, position).as_bytes(),
                serde_json::to_vec(&record)?,
            );
        }
        write.put(counter_key.as_bytes(), (start + inserted as u64).to_le_bytes());

        self.db.write(write)?;
        Ok(inserted)
    }

    async fn scan_vertices(&self, class: &str) -> ServerResult<Vec<Vertex>> {
        let info = self.class(ClassKind::Vertex, class)?;
        self.scan_prefix(&make_record_prefix(ClassKind::Vertex, info.id))
    }

    async fn scan_edges(&self, class: &str) -> ServerResult<Vec<Edge>> {
        let info = self.class(ClassKind::Edge, class)?;
        self.scan_prefix(&make_record_prefix(ClassKind::Edge, info.id))
    }

    async fn count(&self, kind: ClassKind, class: &str) -> ServerResult<u64> {
        let info = self.class(kind, class)?;
        self.read_u64(&make_counter_key(info.id))
    }
}

fn make_user_key(user: &str) -> String {
    format!("u:{}", user)
}

fn make_class_key(kind: ClassKind, name: &str) -> String {
    format!("k:{}:{}", kind.tag(), name)
}

fn make_counter_key(class_id: u16) -> String {
    format!("c:{}", class_id)
}

/// Positions are zero-padded so key order equals insertion order
fn make_record_key(kind: ClassKind, class_id: u16, position: u64) -> String {
    format!("{}{:015}", make_record_prefix(kind, class_id), position)
}

fn make_record_prefix(kind: ClassKind, class_id: u16) -> String {
    format!("{}:{}:", kind.tag(), class_id)
}

fn make_index_key(key: &str) -> String {
    format!("x:{}", key)
}
