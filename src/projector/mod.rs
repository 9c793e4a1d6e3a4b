//! Record projection
//!
//! Turns bridged character rows into the records the portal returns:
//! allocatable attributes scaled down by 100, the job code labelled, nulls
//! defaulted. No state and no I/O. A row that lacks a column, or carries
//! the wrong kind of value, is a query/projector mismatch and is reported
//! as [`ProjectionError`].

pub mod jobs;

use serde::Serialize;
use thiserror::Error as ThisError;

use crate::database::{Row, Value};
pub use jobs::{job_label, UNKNOWN_JOB};

/// Allocatable attributes are stored multiplied by this.
pub const ALLOCATABLE_SCALE: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ProjectionError {
    #[error("column {0} missing from row")]
    MissingColumn(&'static str),

    #[error("column {column} is not {expected}")]
    TypeMismatch {
        column: &'static str,
        expected: &'static str,
    },
}

/// Stored allocatable value to display points, truncating toward zero.
pub fn scale_allocatable(stored: i64) -> i64 {
    stored / ALLOCATABLE_SCALE
}

/// One character as shown on the portal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CharacterRecord {
    pub name: String,
    pub lv: i64,
    pub job: &'static str,
    pub hp: i64,
    /// Taken from `ForcePoint`.
    pub mp: i64,
    pub exp: i64,
    pub gold: i64,
    pub fame: i64,
    pub map_id: i64,
    pub floor: i64,
    pub x: i64,
    pub y: i64,
    pub main_job: i64,
    pub guild_name: Option<String>,

    // Allocatable, already scaled.
    pub str: i64,
    pub vital: i64,
    pub tough: i64,
    pub quick: i64,
    pub magic: i64,

    pub power: i64,
    pub dex: i64,
    pub intelligence: i64,
    pub charm: i64,

    #[serde(rename = "Attrib_Earth")]
    pub attrib_earth: i64,
    #[serde(rename = "Attrib_Water")]
    pub attrib_water: i64,
    #[serde(rename = "Attrib_Fire")]
    pub attrib_fire: i64,
    #[serde(rename = "Attrib_Wind")]
    pub attrib_wind: i64,

    pub login_count: i64,
    pub dead_count: i64,
    pub talk_count: i64,
    pub get_pet_count: i64,
    pub walk_count: i64,
}

/// Maps bridged rows of the character query to [`CharacterRecord`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordProjector;

impl RecordProjector {
    pub fn new() -> Self {
        Self
    }

    pub fn project_all(&self, rows: &[Row]) -> Result<Vec<CharacterRecord>, ProjectionError> {
        rows.iter().map(|row| self.project(row)).collect()
    }

    pub fn project(&self, row: &Row) -> Result<CharacterRecord, ProjectionError> {
        let main_job = int(row, "MainJob")?;
        Ok(CharacterRecord {
            name: text(row, "Name")?.unwrap_or_default(),
            lv: int(row, "Lv")?,
            job: job_label(main_job),
            hp: int(row, "Hp")?,
            mp: int(row, "ForcePoint")?,
            exp: int(row, "Exp")?,
            gold: int(row, "Gold")?,
            fame: int(row, "Fame")?,
            map_id: int(row, "MapId")?,
            floor: int(row, "Floor")?,
            x: int(row, "X")?,
            y: int(row, "Y")?,
            main_job,
            guild_name: text(row, "guildName")?.filter(|g| !g.is_empty()),
            str: scale_allocatable(int(row, "Str")?),
            vital: scale_allocatable(int(row, "Vital")?),
            tough: scale_allocatable(int(row, "Tough")?),
            quick: scale_allocatable(int(row, "Quick")?),
            magic: scale_allocatable(int(row, "Magic")?),
            power: int(row, "Power")?,
            dex: int(row, "Dex")?,
            intelligence: int(row, "Intelligence")?,
            charm: int(row, "Charm")?,
            attrib_earth: int(row, "Attrib_Earth")?,
            attrib_water: int(row, "Attrib_Water")?,
            attrib_fire: int(row, "Attrib_Fire")?,
            attrib_wind: int(row, "Attrib_Wind")?,
            login_count: int(row, "LoginCount")?,
            dead_count: int(row, "DeadCount")?,
            talk_count: int(row, "TalkCount")?,
            get_pet_count: int(row, "GetPetCount")?,
            walk_count: int(row, "WalkCount")?,
        })
    }
}

fn column<'r>(row: &'r Row, name: &'static str) -> Result<&'r Value, ProjectionError> {
    row.get(name).ok_or(ProjectionError::MissingColumn(name))
}

/// Numeric column; NULL reads as 0.
fn int(row: &Row, name: &'static str) -> Result<i64, ProjectionError> {
    let value = column(row, name)?;
    if value.is_null() {
        return Ok(0);
    }
    value.as_i64().ok_or(ProjectionError::TypeMismatch {
        column: name,
        expected: "an integer",
    })
}

/// Text column, already bridged to UTF-8; NULL reads as `None`.
fn text(row: &Row, name: &'static str) -> Result<Option<String>, ProjectionError> {
    match column(row, name)? {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s.clone())),
        _ => Err(ProjectionError::TypeMismatch {
            column: name,
            expected: "UTF-8 text",
        }),
    }
}
