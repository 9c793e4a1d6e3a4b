//! Statements against the legacy account/character tables.
//!
//! Every value goes through [`QueryGateway`] as a bound parameter; string
//! parameters reach MySQL as legacy bytes.

use crate::database::{Datastore, Param, QueryGateway, Row, Transcode, Value};
use crate::error::GatewayError;
use crate::projector::ProjectionError;

/// Characters shown per account.
pub const MAX_CHARACTERS: u64 = 2;

pub const SELECT_USER: &str = "SELECT CdKey, AccountID, AccountPassword FROM tbl_user \
     WHERE AccountID = ? AND AccountPassword = ? LIMIT 1";

/// Guarded on the old password so a concurrent change cannot be overwritten.
pub const UPDATE_PASSWORD: &str = "UPDATE tbl_user SET AccountPassword = ? \
     WHERE AccountID = ? AND AccountPassword = ?";

pub const SELECT_CHARACTERS: &str = "SELECT \
     c.Name, c.Lv, c.MainJob, c.Hp, c.ForcePoint, c.Exp, c.Gold, c.Fame, \
     c.MapId, c.Floor, c.X, c.Y, \
     c.Str, c.Vital, c.Tough, c.Quick, c.Magic, \
     c.Power, c.Dex, c.Intelligence, c.Charm, \
     c.Attrib_Earth, c.Attrib_Water, c.Attrib_Fire, c.Attrib_Wind, \
     c.LoginCount, c.DeadCount, c.TalkCount, c.GetPetCount, c.WalkCount, \
     g.guildName \
     FROM tbl_character c \
     LEFT JOIN tbl_guild g ON c.guildID = g.guildID \
     WHERE c.CdKey = ? \
     ORDER BY c.RegistNumber \
     LIMIT ?";

/// The account row matched by a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub account: String,
    pub cd_key: String,
}

/// Look up an account by credentials. `None` when nothing matches.
pub async fn find_user<D: Datastore>(
    gateway: &QueryGateway<D>,
    account: &str,
    password: &str,
) -> Result<Option<UserRow>, GatewayError> {
    let rows = gateway
        .query(SELECT_USER, &[account.into(), password.into()], Transcode::Rows)
        .await?;

    let Some(row) = rows.first() else {
        return Ok(None);
    };
    Ok(Some(UserRow {
        account: text_column(row, "AccountID")?,
        cd_key: text_column(row, "CdKey")?,
    }))
}

/// Rows for up to [`MAX_CHARACTERS`] characters, in registration order.
pub async fn characters_for<D: Datastore>(
    gateway: &QueryGateway<D>,
    cd_key: &str,
) -> Result<Vec<Row>, GatewayError> {
    let params = [cd_key.into(), Param::UInt(MAX_CHARACTERS)];
    Ok(gateway
        .query(SELECT_CHARACTERS, &params, Transcode::Rows)
        .await?)
}

/// Conditional password write. Returns the affected row count: 0 means the
/// stored password no longer equals `old_password`.
pub async fn update_password<D: Datastore>(
    gateway: &QueryGateway<D>,
    account: &str,
    old_password: &str,
    new_password: &str,
) -> Result<u64, GatewayError> {
    let params = [new_password.into(), account.into(), old_password.into()];
    let result = gateway.execute(UPDATE_PASSWORD, &params).await?;
    Ok(result.affected_rows)
}

fn text_column(row: &Row, name: &'static str) -> Result<String, ProjectionError> {
    match row.get(name) {
        Some(Value::Text(s)) => Ok(s.clone()),
        Some(_) => Err(ProjectionError::TypeMismatch {
            column: name,
            expected: "UTF-8 text",
        }),
        None => Err(ProjectionError::MissingColumn(name)),
    }
}
