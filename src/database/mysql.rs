//! MySQL backend.
//!
//! The deployment runs on sqlx's `MySqlPool`: bounded by `pool_size`, idle
//! connections pinged before reuse and retired after the idle timeout or
//! maximum lifetime, and the acquire timeout covering connect as well as the
//! wait for a slot.
//!
//! Every connection is opened with the configured legacy charset, so text
//! columns arrive as raw legacy bytes. Text columns are therefore decoded as
//! byte strings, never as Rust `String`s; the gateway bridges them.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlPoolOptions, MySqlRow, MySqlTypeInfo};
use sqlx::pool::PoolConnection;
use sqlx::query::Query;
use sqlx::{Column, MySql, MySqlConnection, MySqlPool, Row as _, TypeInfo, ValueRef};

use super::{error_kind, Bound, Connection, Datastore, PoolStatus, Row, Value, WriteResult};
use crate::charset::LegacyBytes;
use crate::config::ServerConfig;
use crate::error::DataAccessError;

/// Connect options for the legacy database, charset fixed from config.
pub fn connect_options(config: &ServerConfig) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&config.sql_ip)
        .port(config.sql_port)
        .username(&config.sql_id)
        .password(&config.sql_pw)
        .database(&config.sql_db)
        .charset(&config.sql_charset)
}

/// Pool described by `config`. No connection is opened until first use.
pub fn pool_from_config(config: &ServerConfig) -> MySqlPool {
    MySqlPoolOptions::new()
        .max_connections(config.pool_size)
        .acquire_timeout(config.pool_acquire_timeout())
        .idle_timeout(config.pool_idle_timeout())
        .max_lifetime(config.pool_max_lifetime())
        .test_before_acquire(true)
        .connect_lazy_with(connect_options(config))
}

impl Datastore for MySqlPool {
    type Conn = PoolConnection<MySql>;

    async fn acquire(&self) -> Result<PoolConnection<MySql>, DataAccessError> {
        sqlx::Pool::acquire(self).await.map_err(|e| match e {
            sqlx::Error::PoolTimedOut => {
                tracing::warn!(
                    "[db] [acquire_timeout] capacity={} waited_ms={}",
                    self.options().get_max_connections(),
                    self.options().get_acquire_timeout().as_millis()
                );
                DataAccessError::AcquireTimeout
            }
            sqlx::Error::PoolClosed => DataAccessError::PoolClosed,
            e => {
                tracing::error!("[db] [connect_failed] kind={}", error_kind(&e));
                DataAccessError::Connect
            }
        })
    }

    fn discard(conn: PoolConnection<MySql>) {
        // Detached, the connection no longer counts against the pool and is
        // closed when dropped.
        drop(conn.detach());
    }

    fn status(&self) -> PoolStatus {
        let size = self.size() as usize;
        let idle = self.num_idle();
        PoolStatus {
            capacity: self.options().get_max_connections() as usize,
            in_use: size.saturating_sub(idle),
            idle,
        }
    }

    async fn close(&self) {
        sqlx::Pool::close(self).await;
        tracing::info!("[db] [pool_closed]");
    }
}

impl Connection for PoolConnection<MySql> {
    async fn fetch_all(&mut self, sql: &str, params: &[Bound]) -> Result<Vec<Row>, sqlx::Error> {
        let conn: &mut MySqlConnection = self;
        let rows = bind_all(sqlx::query(sql), params).fetch_all(&mut *conn).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&mut self, sql: &str, params: &[Bound]) -> Result<WriteResult, sqlx::Error> {
        let conn: &mut MySqlConnection = self;
        let done = bind_all(sqlx::query(sql), params).execute(&mut *conn).await?;
        Ok(WriteResult {
            insert_id: done.last_insert_id(),
            affected_rows: done.rows_affected(),
        })
    }

    async fn ping(&mut self) -> Result<(), sqlx::Error> {
        let conn: &mut MySqlConnection = self;
        sqlx::Connection::ping(conn).await
    }
}

fn bind_all<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    params: &'q [Bound],
) -> Query<'q, MySql, MySqlArguments> {
    for param in params {
        query = match param {
            Bound::Null => query.bind(None::<i64>),
            Bound::Int(v) => query.bind(*v),
            Bound::UInt(v) => query.bind(*v),
            Bound::Float(v) => query.bind(*v),
            Bound::Bytes(b) => query.bind(b.as_slice()),
            Bound::DateTime(d) => query.bind(*d),
        };
    }
    query
}

fn decode_row(row: &MySqlRow) -> Result<Row, sqlx::Error> {
    let mut out = Row::with_capacity(row.len());
    for (i, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, i, column.type_info())?;
        out.push(column.name(), value);
    }
    Ok(out)
}

fn decode_column(row: &MySqlRow, i: usize, ty: &MySqlTypeInfo) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(i)?.is_null() {
        return Ok(Value::Null);
    }

    let name = ty.name();
    let value = match name {
        "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET"
        | "DECIMAL" | "JSON" => {
            Value::Legacy(LegacyBytes::new(row.try_get_unchecked::<Vec<u8>, _>(i)?))
        }
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            Value::Int(row.try_get::<i64, _>(i)?)
        }
        _ if name.ends_with(" UNSIGNED") => Value::UInt(row.try_get::<u64, _>(i)?),
        "FLOAT" => Value::Float(f64::from(row.try_get::<f32, _>(i)?)),
        "DOUBLE" => Value::Float(row.try_get::<f64, _>(i)?),
        "DATETIME" | "TIMESTAMP" => Value::DateTime(row.try_get::<NaiveDateTime, _>(i)?),
        "DATE" => Value::DateTime(row.try_get::<NaiveDate, _>(i)?.and_time(NaiveTime::MIN)),
        // BINARY, VARBINARY, BLOB variants, BIT, GEOMETRY, TIME, YEAR, ...
        _ => Value::Bytes(row.try_get_unchecked::<Vec<u8>, _>(i)?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig::from_str(
            "sql_ip: \"127.0.0.1\"\nsql_id: \"u\"\nsql_pw: \"p\"\npool_size: 3\npool_acquire_timeout_secs: 2\n",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_pool_options_follow_config() {
        let pool = pool_from_config(&config());
        let options = pool.options();
        assert_eq!(options.get_max_connections(), 3);
        assert_eq!(options.get_acquire_timeout(), std::time::Duration::from_secs(2));
        assert_eq!(options.get_idle_timeout(), Some(std::time::Duration::from_secs(600)));
        assert_eq!(options.get_max_lifetime(), Some(std::time::Duration::from_secs(1800)));
        assert!(options.get_test_before_acquire());
        assert_eq!(
            Datastore::status(&pool),
            PoolStatus { capacity: 3, in_use: 0, idle: 0 }
        );
    }
}
