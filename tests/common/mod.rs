//! In-memory stand-in for the legacy MySQL tables.
//!
//! Text is stored as GBK bytes and compared byte-wise, like the real tables
//! with a binary-bound parameter. Every statement is counted.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use cg_portal::auth::AuthGuard;
use cg_portal::charset::{CharsetBridge, LegacyBytes};
use cg_portal::database::{
    Bound, Connect, Connection, ConnectionPool, QueryGateway, Row, Value, WriteResult,
};
use cg_portal::servers::portal::db::{SELECT_CHARACTERS, SELECT_USER, UPDATE_PASSWORD};
use cg_portal::servers::portal::{routes, PortalState};

pub const COOKIE: &str = "cg_session";
pub const MAX_AGE_SECS: u64 = 3600;

struct User {
    account: Vec<u8>,
    password: Vec<u8>,
    cd_key: Vec<u8>,
}

struct Character {
    cd_key: Vec<u8>,
    regist_number: i64,
    name: Vec<u8>,
    main_job: i64,
    str_points: i64,
    guild: Option<Vec<u8>>,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    characters: Vec<Character>,
    /// Password another writer sets just before the next UPDATE lands.
    concurrent_change: Option<(Vec<u8>, Vec<u8>)>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    statements: Arc<AtomicUsize>,
}

fn gbk(s: &str) -> Vec<u8> {
    CharsetBridge::gbk().to_legacy(s).into_inner()
}

fn legacy(bytes: &[u8]) -> Value {
    Value::Legacy(LegacyBytes::from(bytes))
}

fn bytes(param: &Bound) -> &[u8] {
    param.as_bytes().expect("text parameter must be bound as bytes")
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account whose CdKey equals its name, as the game creates them.
    pub fn add_user(&self, account: &str, password: &str) {
        self.tables.lock().unwrap().users.push(User {
            account: gbk(account),
            password: gbk(password),
            cd_key: gbk(account),
        });
    }

    pub fn add_character(
        &self,
        account: &str,
        regist_number: i64,
        name: &str,
        main_job: i64,
        str_points: i64,
        guild: Option<&str>,
    ) {
        self.tables.lock().unwrap().characters.push(Character {
            cd_key: gbk(account),
            regist_number,
            name: gbk(name),
            main_job,
            str_points,
            guild: guild.map(gbk),
        });
    }

    /// Simulate another session changing `account`'s password between this
    /// session's verify and its write.
    pub fn change_password_before_next_update(&self, account: &str, password: &str) {
        self.tables.lock().unwrap().concurrent_change = Some((gbk(account), gbk(password)));
    }

    /// Stored password, decoded.
    pub fn password_of(&self, account: &str) -> Option<String> {
        let account = gbk(account);
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .iter()
            .find(|u| u.account == account)
            .map(|u| CharsetBridge::gbk().to_unicode(&u.password))
    }

    /// Statements executed so far.
    pub fn statements(&self) -> usize {
        self.statements.load(Ordering::SeqCst)
    }

    fn select_user(&self, params: &[Bound]) -> Vec<Row> {
        let tables = self.tables.lock().unwrap();
        tables
            .users
            .iter()
            .filter(|u| u.account == bytes(&params[0]) && u.password == bytes(&params[1]))
            .take(1)
            .map(|u| {
                Row::new()
                    .with("CdKey", legacy(&u.cd_key))
                    .with("AccountID", legacy(&u.account))
                    .with("AccountPassword", legacy(&u.password))
            })
            .collect()
    }

    fn select_characters(&self, params: &[Bound]) -> Vec<Row> {
        let limit = match params[1] {
            Bound::UInt(n) => n as usize,
            ref other => panic!("LIMIT bound as {:?}", other),
        };
        let tables = self.tables.lock().unwrap();
        let mut owned: Vec<&Character> = tables
            .characters
            .iter()
            .filter(|c| c.cd_key == bytes(&params[0]))
            .collect();
        owned.sort_by_key(|c| c.regist_number);

        owned
            .into_iter()
            .take(limit)
            .map(|c| {
                let mut row = Row::new()
                    .with("Name", legacy(&c.name))
                    .with("Lv", Value::Int(10))
                    .with("MainJob", Value::Int(c.main_job))
                    .with("Hp", Value::Int(120))
                    .with("ForcePoint", Value::Int(80))
                    .with("Exp", Value::UInt(5000))
                    .with("Gold", Value::Int(300))
                    .with("Fame", Value::Int(0))
                    .with("MapId", Value::Int(1000))
                    .with("Floor", Value::Int(0))
                    .with("X", Value::Int(242))
                    .with("Y", Value::Int(88))
                    .with("Str", Value::Int(c.str_points))
                    .with("Vital", Value::Int(1500))
                    .with("Tough", Value::Int(200))
                    .with("Quick", Value::Int(100))
                    .with("Magic", Value::Null);
                for name in [
                    "Power", "Dex", "Intelligence", "Charm", "Attrib_Earth", "Attrib_Water",
                    "Attrib_Fire", "Attrib_Wind", "LoginCount", "DeadCount", "TalkCount",
                    "GetPetCount", "WalkCount",
                ] {
                    row.push(name, Value::Int(1));
                }
                let guild = c.guild.as_deref().map(legacy).unwrap_or(Value::Null);
                row.with("guildName", guild)
            })
            .collect()
    }

    fn update_password(&self, params: &[Bound]) -> WriteResult {
        let mut tables = self.tables.lock().unwrap();
        if let Some((account, password)) = tables.concurrent_change.take() {
            for u in tables.users.iter_mut().filter(|u| u.account == account) {
                u.password = password.clone();
            }
        }
        let mut affected = 0;
        for u in tables
            .users
            .iter_mut()
            .filter(|u| u.account == bytes(&params[1]) && u.password == bytes(&params[2]))
        {
            u.password = bytes(&params[0]).to_vec();
            affected += 1;
        }
        WriteResult { insert_id: 0, affected_rows: affected }
    }
}

pub struct MemoryConn(MemoryStore);

impl Connection for MemoryConn {
    async fn fetch_all(&mut self, sql: &str, params: &[Bound]) -> Result<Vec<Row>, sqlx::Error> {
        self.0.statements.fetch_add(1, Ordering::SeqCst);
        match sql {
            SELECT_USER => Ok(self.0.select_user(params)),
            SELECT_CHARACTERS => Ok(self.0.select_characters(params)),
            _ => Err(sqlx::Error::Protocol("unsupported statement".into())),
        }
    }

    async fn execute(&mut self, sql: &str, params: &[Bound]) -> Result<WriteResult, sqlx::Error> {
        self.0.statements.fetch_add(1, Ordering::SeqCst);
        match sql {
            UPDATE_PASSWORD => Ok(self.0.update_password(params)),
            _ => Err(sqlx::Error::Protocol("unsupported statement".into())),
        }
    }

    async fn ping(&mut self) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

impl Connect for MemoryStore {
    type Conn = MemoryConn;

    async fn connect(&self) -> Result<MemoryConn, sqlx::Error> {
        Ok(MemoryConn(self.clone()))
    }
}

/// A datastore that refuses every connection.
#[derive(Clone, Default)]
pub struct DownStore;

impl Connect for DownStore {
    type Conn = MemoryConn;

    async fn connect(&self) -> Result<MemoryConn, sqlx::Error> {
        Err(sqlx::Error::Io(std::io::Error::from(std::io::ErrorKind::ConnectionRefused)))
    }
}

pub fn state<C: Connect>(connector: C) -> PortalState<ConnectionPool<C>> {
    let pool = ConnectionPool::new(connector, 4, Duration::from_secs(1));
    PortalState::new(
        QueryGateway::new(pool, CharsetBridge::gbk()),
        AuthGuard::new(COOKIE, Duration::from_secs(MAX_AGE_SECS)),
        false,
    )
}

pub fn app<C: Connect>(state: PortalState<ConnectionPool<C>>) -> Router {
    routes::router(state)
}
