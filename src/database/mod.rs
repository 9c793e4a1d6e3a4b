//! Datastore access: row model, backend seam, pool and gateway.
//!
//! Layout:
//! - `pool.rs`: bounded connection pool over any [`Connect`] backend
//! - `gateway.rs`: query/execute with charset bridging on both directions
//! - `mysql.rs`: sqlx `MySqlPool` as a [`Datastore`]

use std::future::Future;

use chrono::NaiveDateTime;

use crate::charset::LegacyBytes;
use crate::error::DataAccessError;

pub mod gateway;
pub mod mysql;
pub mod pool;

pub use gateway::{QueryGateway, Transcode};
pub use pool::{ConnectionPool, PoolStatus, PooledConnection};

/// A single column value.
///
/// Text read from the datastore arrives as [`Value::Legacy`] and becomes
/// [`Value::Text`] once the gateway has bridged it. [`Value::Bytes`] is binary
/// data and is never transcoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Legacy(LegacyBytes),
    Bytes(Vec<u8>),
    DateTime(NaiveDateTime),
    Record(Row),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer view of numeric values. Floats are truncated toward zero.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt(v) => i64::try_from(*v).ok(),
            Value::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_legacy(&self) -> Option<&LegacyBytes> {
        match self {
            Value::Legacy(b) => Some(b),
            _ => None,
        }
    }
}

/// Ordered mapping of column name to value, in the datastore's column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            columns: Vec::with_capacity(n),
        }
    }

    /// Builder-style push.
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.columns.push((name.into(), value));
    }

    /// First column with this name. Names compare case-insensitively, as
    /// MySQL column labels do.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Rebuild the row by mapping every value, keeping names and order.
    pub fn map_values(self, mut f: impl FnMut(Value) -> Value) -> Self {
        Self {
            columns: self
                .columns
                .into_iter()
                .map(|(n, v)| (n, f(v)))
                .collect(),
        }
    }
}

/// A statement parameter as supplied by callers.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    /// UTF-8 text; bridged to the legacy charset before binding.
    Text(String),
    /// Binary data; bound as-is.
    Bytes(Vec<u8>),
    DateTime(NaiveDateTime),
}

impl From<&str> for Param {
    fn from(s: &str) -> Self {
        Param::Text(s.to_owned())
    }
}

impl From<String> for Param {
    fn from(s: String) -> Self {
        Param::Text(s)
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(v)
    }
}

impl From<u64> for Param {
    fn from(v: u64) -> Self {
        Param::UInt(v)
    }
}

/// A parameter in wire form. There is no text variant: by the time a
/// statement reaches a [`Connection`], every string is legacy bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Bytes(Vec<u8>),
    DateTime(NaiveDateTime),
}

impl Bound {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Bound::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

/// Result of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteResult {
    pub insert_id: u64,
    pub affected_rows: u64,
}

/// Opens physical connections for the pool.
pub trait Connect: Send + Sync + 'static {
    type Conn: Connection;

    fn connect(&self) -> impl Future<Output = Result<Self::Conn, sqlx::Error>> + Send;
}

/// One live datastore connection. Parameters are always bound server-side,
/// never interpolated into `sql`.
pub trait Connection: Send + 'static {
    fn fetch_all(
        &mut self,
        sql: &str,
        params: &[Bound],
    ) -> impl Future<Output = Result<Vec<Row>, sqlx::Error>> + Send;

    fn execute(
        &mut self,
        sql: &str,
        params: &[Bound],
    ) -> impl Future<Output = Result<WriteResult, sqlx::Error>> + Send;

    /// Cheap round trip; an error means the connection is dead.
    fn ping(&mut self) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
}

/// A bounded source of checked-out connections.
///
/// Dropping a checked-out connection returns it; [`Datastore::discard`]
/// closes it instead. A checkout that cannot complete within the store's
/// acquire timeout, connect included, fails with
/// [`DataAccessError::AcquireTimeout`].
pub trait Datastore: Clone + Send + Sync + 'static {
    type Conn: Connection;

    fn acquire(&self) -> impl Future<Output = Result<Self::Conn, DataAccessError>> + Send;

    /// Close a connection that failed mid-statement; its slot is freed.
    fn discard(conn: Self::Conn);

    fn status(&self) -> PoolStatus;

    /// Refuse new checkouts and close idle connections.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// Short category of a driver error, safe to log: never the server message,
/// which can echo parameter values back.
pub fn error_kind(e: &sqlx::Error) -> String {
    match e {
        sqlx::Error::Database(db) => match db.code() {
            Some(code) => format!("database code={}", code),
            None => "database".to_string(),
        },
        sqlx::Error::Io(_) => "io".to_string(),
        sqlx::Error::Tls(_) => "tls".to_string(),
        sqlx::Error::Protocol(_) => "protocol".to_string(),
        sqlx::Error::PoolTimedOut => "pool_timeout".to_string(),
        sqlx::Error::PoolClosed => "pool_closed".to_string(),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => "decode".to_string(),
        sqlx::Error::Configuration(_) => "configuration".to_string(),
        _ => "other".to_string(),
    }
}

/// True for failures that leave the connection unusable.
pub fn is_connection_error(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Protocol(_)
    )
}
