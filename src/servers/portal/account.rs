//! Portal operations.
//!
//! Input is validated before any statement runs. Login and password change
//! are each a read followed by an optional write; the two steps are not a
//! transaction. The password write is conditional on the old password, so
//! of two concurrent changes only one can succeed.

use super::db;
use super::PortalState;
use crate::auth::{validate_login, validate_password_change};
use crate::database::Datastore;
use crate::error::GatewayError;
use crate::projector::CharacterRecord;
use crate::session::{Identity, Token};

impl<D: Datastore> PortalState<D> {
    /// Check credentials and issue a fresh identity.
    pub async fn login(&self, account: &str, password: &str) -> Result<Identity, GatewayError> {
        validate_login(account, password)?;

        let Some(user) = db::find_user(&self.gateway, account, password).await? else {
            tracing::info!("[portal] [login_failed] account={}", account);
            return Err(GatewayError::InvalidCredential);
        };

        tracing::info!("[portal] [login_ok] account={}", user.account);
        Ok(Identity::issue(user.account, user.cd_key))
    }

    /// Token for `identity`, to be stored in the session cookie.
    pub fn issue_token(&self, identity: &Identity) -> Token {
        self.guard.codec().encode(identity)
    }

    /// Identity for a raw cookie value.
    pub fn current_identity(&self, token: Option<&str>) -> Result<Identity, GatewayError> {
        self.guard.current_identity_at(token, chrono::Utc::now())
    }

    /// The caller's characters in registration order, at most two.
    pub async fn list_characters(
        &self,
        identity: &Identity,
    ) -> Result<Vec<CharacterRecord>, GatewayError> {
        // Character rows are keyed by CdKey, which the game sets to the account name.
        let rows = db::characters_for(&self.gateway, identity.account()).await?;
        Ok(self.projector.project_all(&rows)?)
    }

    pub async fn change_password(
        &self,
        identity: &Identity,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), GatewayError> {
        validate_password_change(old_password, new_password)?;
        let account = identity.account();

        if db::find_user(&self.gateway, account, old_password).await?.is_none() {
            tracing::info!("[portal] [password_rejected] account={}", account);
            return Err(GatewayError::InvalidOldPassword);
        }

        if old_password == new_password {
            return Ok(());
        }

        let changed = db::update_password(&self.gateway, account, old_password, new_password).await?;
        if changed == 0 {
            // Someone else changed it between the check and the write.
            tracing::warn!("[portal] [password_race] account={}", account);
            return Err(GatewayError::InvalidOldPassword);
        }

        tracing::info!("[portal] [password_changed] account={}", account);
        Ok(())
    }
}
