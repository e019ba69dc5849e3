use std::sync::Arc;

use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::cipher::PasswordCipher;
use super::credentials::Authenticatable;
use super::error::{AccountError, AccountResult};
use super::media::{
    document_ext, ext_from_mime, object_key, resize_image, ID_PROOF_PREFIX, PNG_CONTENT_TYPE,
    PROFILE_PREFIX, THUMBNAIL_PREFIX,
};
use super::model::{ExtraFields, User};
use super::repo::UserStore;
use crate::config::ThumbnailConfig;
use crate::storage::StorageClient;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Strip surrounding whitespace and lowercase the domain part.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Creates, saves and looks up users.
#[derive(Clone)]
pub struct UserManager {
    store: Arc<dyn UserStore>,
    storage: Arc<dyn StorageClient>,
    cipher: PasswordCipher,
    thumbnail: ThumbnailConfig,
}

impl UserManager {
    pub fn new(
        store: Arc<dyn UserStore>,
        storage: Arc<dyn StorageClient>,
        cipher: PasswordCipher,
        thumbnail: ThumbnailConfig,
    ) -> Self {
        Self {
            store,
            storage,
            cipher,
            thumbnail,
        }
    }

    /// Create and persist a user.
    ///
    /// `password = None` stores an unusable password and no encrypted copy.
    #[instrument(skip(self, password, extra))]
    pub async fn create_user(
        &self,
        email: &str,
        password: Option<&str>,
        extra: ExtraFields,
    ) -> AccountResult<User> {
        if email.trim().is_empty() {
            return Err(AccountError::Validation("the email field must be set".into()));
        }
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(AccountError::Validation(format!(
                "invalid email address: {}",
                email
            )));
        }
        let mut user = User::new(email);
        extra.apply(&mut user);

        user.encrypted_password = password.map(|p| self.cipher.encrypt(p)).transpose()?;
        user.set_password(password)?;

        self.save(&mut user).await?;
        info!(user_id = %user.id, email = %user.email, "user created");
        Ok(user)
    }

    /// Like [`create_user`](Self::create_user) with `is_staff` and
    /// `is_superuser` defaulting to true.
    #[instrument(skip(self, password, extra))]
    pub async fn create_superuser(
        &self,
        email: &str,
        password: Option<&str>,
        mut extra: ExtraFields,
    ) -> AccountResult<User> {
        extra.is_staff = Some(extra.is_staff.unwrap_or(true));
        extra.is_superuser = Some(extra.is_superuser.unwrap_or(true));
        self.create_user(email, password, extra).await
    }

    /// Persist `user`, inserting it on first save.
    ///
    /// On update, a changed image regenerates the thumbnail before the row is
    /// written. The write fails with `Conflict` if the row changed since `user`
    /// was loaded.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn save(&self, user: &mut User) -> AccountResult<()> {
        user.validate()?;

        if user.is_adding() {
            *user = self.store.insert(user).await?;
            return Ok(());
        }

        // `user` is only replaced once the row write succeeds
        let mut staged = user.clone();
        match user.image.as_deref() {
            Some(image) => {
                let old = self.store.get(user.id).await?;
                if old.image.as_deref() != Some(image) {
                    staged.thumbnail_image = Some(self.generate_thumbnail(image).await?);
                }
            }
            None => {
                if let Some(thumb) = staged.thumbnail_image.take() {
                    debug!(thumbnail = %thumb, "image cleared, dropping thumbnail");
                }
            }
        }

        *user = self.store.update(&staged, user.date_updated).await?;
        Ok(())
    }

    async fn generate_thumbnail(&self, image_key: &str) -> AccountResult<String> {
        let source = self.storage.get_object(image_key).await?;
        let size = (self.thumbnail.width, self.thumbnail.height);
        let (name, payload) = resize_image(&source, image_key, size)?;

        let key = format!("{}{}-{}", THUMBNAIL_PREFIX, Uuid::new_v4(), name);
        self.storage
            .put_object(&key, payload, PNG_CONTENT_TYPE)
            .await?;
        info!(image = %image_key, thumbnail = %key, "thumbnail regenerated");
        Ok(key)
    }

    /// Upload a profile image and point `user.image` at it. Does not save.
    #[instrument(skip(self, user, body), fields(user_id = %user.id))]
    pub async fn attach_image(
        &self,
        user: &mut User,
        body: Bytes,
        content_type: &str,
    ) -> AccountResult<()> {
        let ext = ext_from_mime(content_type).ok_or_else(|| {
            AccountError::Validation(format!("unsupported image type: {}", content_type))
        })?;
        let key = object_key(PROFILE_PREFIX, ext);
        self.storage.put_object(&key, body, content_type).await?;
        user.image = Some(key);
        Ok(())
    }

    /// Upload an identity document and point `user.id_proof` at it. Does not save.
    #[instrument(skip(self, user, body), fields(user_id = %user.id))]
    pub async fn attach_id_proof(
        &self,
        user: &mut User,
        body: Bytes,
        content_type: &str,
    ) -> AccountResult<()> {
        let key = object_key(ID_PROOF_PREFIX, document_ext(content_type));
        self.storage.put_object(&key, body, content_type).await?;
        user.id_proof = Some(key);
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> AccountResult<User> {
        self.store.get(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> AccountResult<Option<User>> {
        self.store.find_by_email(&normalize_email(email)).await
    }

    pub async fn list(&self) -> AccountResult<Vec<User>> {
        self.store.list().await
    }

    /// Recover the plaintext kept in `encrypted_password`, if any.
    pub fn decrypt_password(&self, user: &User) -> AccountResult<Option<String>> {
        user.encrypted_password
            .as_deref()
            .map(|c| self.cipher.decrypt(c))
            .transpose()
    }

    /// Look up by email and check the password. Records the login on success.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> AccountResult<Option<User>> {
        let Some(mut user) = self.find_by_email(email).await? else {
            warn!("authenticate unknown email");
            return Ok(None);
        };
        if !user.check_password(password)? {
            warn!(user_id = %user.id, "authenticate invalid password");
            return Ok(None);
        }
        self.record_login(&mut user).await?;
        Ok(Some(user))
    }

    pub async fn record_login(&self, user: &mut User) -> AccountResult<()> {
        user.last_login = Some(OffsetDateTime::now_utc());
        self.save(user).await
    }

    /// Flag the user as deleted. The row stays visible to every lookup.
    #[instrument(skip(self))]
    pub async fn soft_delete(&self, id: Uuid) -> AccountResult<User> {
        let mut user = self.store.get(id).await?;
        user.is_deleted = true;
        self.save(&mut user).await?;
        info!(user_id = %id, "user soft-deleted");
        Ok(user)
    }

    /// Remove the row. Stored media files are left in place.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> AccountResult<()> {
        self.store.delete(id).await?;
        info!(user_id = %id, "user deleted");
        Ok(())
    }
}
