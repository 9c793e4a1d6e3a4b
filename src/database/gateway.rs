//! Query gateway
//!
//! Runs statements through a [`Datastore`] and applies the charset bridge on both
//! sides: string parameters go out as legacy bytes, string fields come back
//! as UTF-8. Nothing is retried here; writes are not guaranteed idempotent,
//! so a retry is the caller's decision.

use super::{error_kind, is_connection_error, Bound, Connection, Datastore, Param, Row, Value, WriteResult};
use crate::charset::CharsetBridge;
use crate::error::DataAccessError;

/// Whether `query` bridges string fields of the result rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transcode {
    /// Every legacy text field, at any nesting depth, becomes UTF-8.
    Rows,
    /// Rows come back untouched; the caller bridges selected fields itself.
    Skip,
}

#[derive(Clone)]
pub struct QueryGateway<D: Datastore> {
    store: D,
    bridge: CharsetBridge,
}

impl<D: Datastore> QueryGateway<D> {
    pub fn new(store: D, bridge: CharsetBridge) -> Self {
        Self { store, bridge }
    }

    pub fn bridge(&self) -> &CharsetBridge {
        &self.bridge
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    /// Run a read statement. Rows keep the datastore's order; pass an
    /// `ORDER BY` when a specific order matters.
    pub async fn query(
        &self,
        sql: &str,
        params: &[Param],
        transcode: Transcode,
    ) -> Result<Vec<Row>, DataAccessError> {
        let bound = self.bind(params);
        let mut conn = self.store.acquire().await?;
        let rows = match conn.fetch_all(sql, &bound).await {
            Ok(rows) => rows,
            Err(e) => {
                let kind = error_kind(&e);
                tracing::warn!("[db] [query_failed] kind={}", kind);
                if is_connection_error(&e) {
                    D::discard(conn);
                }
                return Err(DataAccessError::Statement { kind });
            }
        };
        drop(conn);

        Ok(match transcode {
            Transcode::Rows => rows.into_iter().map(|row| self.unicode_row(row)).collect(),
            Transcode::Skip => rows,
        })
    }

    /// Run a write statement. Same parameter bridging as [`query`](Self::query);
    /// nothing to bridge on the way back.
    pub async fn execute(&self, sql: &str, params: &[Param]) -> Result<WriteResult, DataAccessError> {
        let bound = self.bind(params);
        let mut conn = self.store.acquire().await?;
        match conn.execute(sql, &bound).await {
            Ok(result) => Ok(result),
            Err(e) => {
                let kind = error_kind(&e);
                tracing::warn!("[db] [execute_failed] kind={}", kind);
                if is_connection_error(&e) {
                    D::discard(conn);
                }
                Err(DataAccessError::Statement { kind })
            }
        }
    }

    fn bind(&self, params: &[Param]) -> Vec<Bound> {
        params
            .iter()
            .map(|p| match p {
                Param::Null => Bound::Null,
                Param::Int(v) => Bound::Int(*v),
                Param::UInt(v) => Bound::UInt(*v),
                Param::Float(v) => Bound::Float(*v),
                Param::Text(s) => Bound::Bytes(self.bridge.to_legacy(s).into_inner()),
                Param::Bytes(b) => Bound::Bytes(b.clone()),
                Param::DateTime(d) => Bound::DateTime(*d),
            })
            .collect()
    }

    fn unicode_row(&self, row: Row) -> Row {
        row.map_values(|v| self.unicode_value(v))
    }

    fn unicode_value(&self, value: Value) -> Value {
        match value {
            Value::Legacy(bytes) => Value::Text(self.bridge.to_unicode(bytes.as_bytes())),
            Value::Record(row) => Value::Record(self.unicode_row(row)),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::LegacyBytes;
    use crate::database::{Connect, ConnectionPool};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Seen = Arc<Mutex<Vec<(String, Vec<Bound>)>>>;

    #[derive(Clone)]
    struct Scripted {
        rows: Vec<Row>,
        fail: Option<fn() -> sqlx::Error>,
        seen: Seen,
    }

    struct ScriptedConn(Scripted);

    impl Connection for ScriptedConn {
        async fn fetch_all(&mut self, sql: &str, params: &[Bound]) -> Result<Vec<Row>, sqlx::Error> {
            self.0.seen.lock().unwrap().push((sql.to_string(), params.to_vec()));
            match self.0.fail {
                Some(make) => Err(make()),
                None => Ok(self.0.rows.clone()),
            }
        }

        async fn execute(&mut self, sql: &str, params: &[Bound]) -> Result<WriteResult, sqlx::Error> {
            self.0.seen.lock().unwrap().push((sql.to_string(), params.to_vec()));
            match self.0.fail {
                Some(make) => Err(make()),
                None => Ok(WriteResult { insert_id: 42, affected_rows: 1 }),
            }
        }

        async fn ping(&mut self) -> Result<(), sqlx::Error> {
            Ok(())
        }
    }

    impl Connect for Scripted {
        type Conn = ScriptedConn;

        async fn connect(&self) -> Result<ScriptedConn, sqlx::Error> {
            Ok(ScriptedConn(self.clone()))
        }
    }

    fn gateway(
        rows: Vec<Row>,
        fail: Option<fn() -> sqlx::Error>,
    ) -> (QueryGateway<ConnectionPool<Scripted>>, Seen) {
        let seen: Seen = Arc::default();
        let connector = Scripted { rows, fail, seen: Arc::clone(&seen) };
        let pool = ConnectionPool::new(connector, 2, Duration::from_secs(1));
        (QueryGateway::new(pool, CharsetBridge::gbk()), seen)
    }

    fn gbk(s: &str) -> Value {
        Value::Legacy(CharsetBridge::gbk().to_legacy(s))
    }

    #[tokio::test]
    async fn test_string_params_are_sent_as_legacy_bytes() {
        let (gw, seen) = gateway(Vec::new(), None);
        gw.query("SELECT 1 WHERE a = ? AND b = ?", &["中国".into(), Param::Int(5)], Transcode::Rows)
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        let (sql, params) = &seen[0];
        assert_eq!(sql, "SELECT 1 WHERE a = ? AND b = ?");
        assert_eq!(params[0], Bound::Bytes(vec![0xD6, 0xD0, 0xB9, 0xFA]));
        assert_eq!(params[1], Bound::Int(5));
    }

    #[tokio::test]
    async fn test_binary_params_are_not_transcoded() {
        let (gw, seen) = gateway(Vec::new(), None);
        gw.execute("UPDATE t SET b = ?", &[Param::Bytes(vec![0xFF, 0x00])])
            .await
            .unwrap();
        assert_eq!(seen.lock().unwrap()[0].1[0], Bound::Bytes(vec![0xFF, 0x00]));
    }

    #[tokio::test]
    async fn test_rows_are_bridged_recursively() {
        let nested = Row::new().with("guildName", gbk("王宫"));
        let row = Row::new()
            .with("Name", gbk("剑士"))
            .with("Lv", Value::Int(10))
            .with("Blob", Value::Bytes(vec![0xD6, 0xD0]))
            .with("Guild", Value::Record(nested));
        let (gw, _) = gateway(vec![row], None);

        let rows = gw.query("SELECT ...", &[], Transcode::Rows).await.unwrap();
        let row = &rows[0];
        assert_eq!(row.get("Name").and_then(Value::as_str), Some("剑士"));
        assert_eq!(row.get("Lv"), Some(&Value::Int(10)));
        assert_eq!(row.get("Blob"), Some(&Value::Bytes(vec![0xD6, 0xD0])));
        match row.get("Guild") {
            Some(Value::Record(inner)) => {
                assert_eq!(inner.get("guildName").and_then(Value::as_str), Some("王宫"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_skip_leaves_legacy_fields_for_the_caller() {
        let (gw, _) = gateway(vec![Row::new().with("Name", gbk("中国"))], None);
        let rows = gw.query("SELECT ...", &[], Transcode::Skip).await.unwrap();
        let raw = rows[0].get("Name").and_then(Value::as_legacy).cloned();
        assert_eq!(raw, Some(LegacyBytes::new(vec![0xD6, 0xD0, 0xB9, 0xFA])));
        assert_eq!(gw.bridge().to_unicode(raw.unwrap().as_bytes()), "中国");
    }

    #[tokio::test]
    async fn test_execute_returns_counts() {
        let (gw, _) = gateway(Vec::new(), None);
        let res = gw.execute("INSERT ...", &["x".into()]).await.unwrap();
        assert_eq!(res, WriteResult { insert_id: 42, affected_rows: 1 });
    }

    #[tokio::test]
    async fn test_statement_error_is_data_access_without_details() {
        fn duplicate() -> sqlx::Error {
            sqlx::Error::Protocol("Duplicate entry 'hunter2'".into())
        }
        let (gw, _) = gateway(Vec::new(), Some(duplicate));
        let err = gw.execute("INSERT ...", &["hunter2".into()]).await.unwrap_err();
        let text = err.to_string();
        assert!(matches!(err, DataAccessError::Statement { .. }));
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("INSERT"));
        assert_eq!(gw.store().status().in_use, 0);
    }

    #[tokio::test]
    async fn test_broken_connection_is_not_returned_to_idle() {
        fn broken() -> sqlx::Error {
            sqlx::Error::Io(std::io::Error::from(std::io::ErrorKind::ConnectionReset))
        }
        let (gw, _) = gateway(Vec::new(), Some(broken));
        assert!(gw.query("SELECT 1", &[], Transcode::Rows).await.is_err());
        assert_eq!(gw.store().status().idle, 0);
        assert_eq!(gw.store().status().in_use, 0);
    }

    fn broken_pipe() -> sqlx::Error {
        sqlx::Error::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
    }

    /// Connections the server closes after one statement, as `wait_timeout` does.
    #[derive(Clone, Default)]
    struct OneShot {
        opened: Arc<std::sync::atomic::AtomicUsize>,
    }

    struct OneShotConn {
        used: bool,
    }

    impl OneShotConn {
        fn run(&mut self) -> Result<(), sqlx::Error> {
            if self.used {
                return Err(broken_pipe());
            }
            self.used = true;
            Ok(())
        }
    }

    impl Connection for OneShotConn {
        async fn fetch_all(&mut self, _sql: &str, _params: &[Bound]) -> Result<Vec<Row>, sqlx::Error> {
            self.run()?;
            Ok(Vec::new())
        }

        async fn execute(&mut self, _sql: &str, _params: &[Bound]) -> Result<WriteResult, sqlx::Error> {
            self.run()?;
            Ok(WriteResult::default())
        }

        async fn ping(&mut self) -> Result<(), sqlx::Error> {
            if self.used {
                Err(broken_pipe())
            } else {
                Ok(())
            }
        }
    }

    impl Connect for OneShot {
        type Conn = OneShotConn;

        async fn connect(&self) -> Result<OneShotConn, sqlx::Error> {
            self.opened.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(OneShotConn { used: false })
        }
    }

    #[tokio::test]
    async fn test_dead_idle_connection_is_not_handed_out() {
        let connector = OneShot::default();
        let opened = Arc::clone(&connector.opened);
        let pool = ConnectionPool::new(connector, 2, Duration::from_secs(1));
        let gw = QueryGateway::new(pool, CharsetBridge::gbk());

        gw.query("SELECT 1", &[], Transcode::Rows).await.unwrap();
        assert_eq!(gw.store().status().idle, 1);

        gw.query("SELECT 1", &[], Transcode::Rows).await.unwrap();
        gw.execute("UPDATE t SET a = 1", &[]).await.unwrap();
        assert_eq!(opened.load(std::sync::atomic::Ordering::SeqCst), 3);
    }
}
