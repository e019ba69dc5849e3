use tracing::warn;
use uuid::Uuid;

use super::error::{AccountError, AccountResult};
use super::model::User;
use super::password::{hash_password, is_usable, make_unusable_password, verify_password};

/// Capability of a record that can be authenticated with a password.
pub trait Authenticatable {
    fn auth_id(&self) -> Uuid;
    /// Login identifier.
    fn username(&self) -> &str;
    fn password_hash(&self) -> &str;
    fn is_active(&self) -> bool;

    fn has_usable_password(&self) -> bool {
        is_usable(self.password_hash())
    }

    /// Inactive accounts, unusable passwords and hashes in a foreign
    /// format never match.
    fn check_password(&self, raw: &str) -> AccountResult<bool> {
        if !self.is_active() || !self.has_usable_password() {
            return Ok(false);
        }
        match verify_password(raw, self.password_hash()) {
            Err(AccountError::Crypto(e)) => {
                warn!(
                    user_id = %self.auth_id(),
                    error = %e,
                    "stored password hash not verifiable"
                );
                Ok(false)
            }
            other => other,
        }
    }
}

impl Authenticatable for User {
    fn auth_id(&self) -> Uuid {
        self.id
    }

    fn username(&self) -> &str {
        &self.email
    }

    fn password_hash(&self) -> &str {
        &self.password
    }

    fn is_active(&self) -> bool {
        self.is_active
    }
}

impl User {
    /// Hash `raw` into the password field; `None` stores an unusable password.
    /// Does not save and does not touch `encrypted_password`.
    pub fn set_password(&mut self, raw: Option<&str>) -> AccountResult<()> {
        self.password = match raw {
            Some(p) => hash_password(p)?,
            None => make_unusable_password(),
        };
        Ok(())
    }
}
