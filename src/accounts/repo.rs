use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::{AccountError, AccountResult};
use super::model::User;

/// Persistence of user rows.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new row; sets `date_joined` and `date_updated`.
    async fn insert(&self, user: &User) -> AccountResult<User>;

    /// Fetch by primary key, `NotFound` when absent. Soft-deleted rows are returned.
    async fn get(&self, id: Uuid) -> AccountResult<User>;

    async fn find_by_email(&self, email: &str) -> AccountResult<Option<User>>;

    /// All rows, newest `date_joined` first.
    async fn list(&self) -> AccountResult<Vec<User>>;

    /// Write every column of `user` provided the stored `date_updated`
    /// still equals `expected`.
    async fn update(&self, user: &User, expected: Option<OffsetDateTime>) -> AccountResult<User>;

    async fn delete(&self, id: Uuid) -> AccountResult<()>;
}

const COLUMNS: &str = "id, email, password, encrypted_password, name, first_name, last_name, \
     profile_type, age, birth_date, qualification, employee_id, id_proof, is_deleted, gender, \
     image, thumbnail_image, is_active, is_staff, is_superuser, last_login, date_joined, \
     date_updated";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_unique(e: sqlx::Error) -> AccountError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AccountError::EmailTaken,
        _ => AccountError::Database(e),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: &User) -> AccountResult<User> {
        let sql = format!(
            r#"
            INSERT INTO accounts_user (
                id, email, password, encrypted_password, name, first_name, last_name,
                profile_type, age, birth_date, qualification, employee_id, id_proof,
                is_deleted, gender, image, thumbnail_image, is_active, is_staff,
                is_superuser, last_login, date_joined, date_updated
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, now(), now())
            RETURNING {COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.password)
            .bind(&user.encrypted_password)
            .bind(&user.name)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.profile_type)
            .bind(user.age)
            .bind(user.birth_date)
            .bind(&user.qualification)
            .bind(&user.employee_id)
            .bind(&user.id_proof)
            .bind(user.is_deleted)
            .bind(user.gender)
            .bind(&user.image)
            .bind(&user.thumbnail_image)
            .bind(user.is_active)
            .bind(user.is_staff)
            .bind(user.is_superuser)
            .bind(user.last_login)
            .fetch_one(&self.db)
            .await
            .map_err(map_unique)?;
        Ok(row)
    }

    async fn get(&self, id: Uuid) -> AccountResult<User> {
        let sql = format!("SELECT {COLUMNS} FROM accounts_user WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AccountError::NotFound { id })
    }

    async fn find_by_email(&self, email: &str) -> AccountResult<Option<User>> {
        let sql = format!("SELECT {COLUMNS} FROM accounts_user WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn list(&self) -> AccountResult<Vec<User>> {
        let sql = format!("SELECT {COLUMNS} FROM accounts_user ORDER BY date_joined DESC");
        let rows = sqlx::query_as::<_, User>(&sql).fetch_all(&self.db).await?;
        Ok(rows)
    }

    async fn update(&self, user: &User, expected: Option<OffsetDateTime>) -> AccountResult<User> {
        let sql = format!(
            r#"
            UPDATE accounts_user
               SET email = $2, password = $3, encrypted_password = $4, name = $5,
                   first_name = $6, last_name = $7, profile_type = $8, age = $9,
                   birth_date = $10, qualification = $11, employee_id = $12,
                   id_proof = $13, is_deleted = $14, gender = $15, image = $16,
                   thumbnail_image = $17, is_active = $18, is_staff = $19,
                   is_superuser = $20, last_login = $21, date_updated = now()
             WHERE id = $1
               AND date_updated IS NOT DISTINCT FROM $22
            RETURNING {COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.password)
            .bind(&user.encrypted_password)
            .bind(&user.name)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(user.profile_type)
            .bind(user.age)
            .bind(user.birth_date)
            .bind(&user.qualification)
            .bind(&user.employee_id)
            .bind(&user.id_proof)
            .bind(user.is_deleted)
            .bind(user.gender)
            .bind(&user.image)
            .bind(&user.thumbnail_image)
            .bind(user.is_active)
            .bind(user.is_staff)
            .bind(user.is_superuser)
            .bind(user.last_login)
            .bind(expected)
            .fetch_optional(&self.db)
            .await
            .map_err(map_unique)?;

        if let Some(row) = row {
            return Ok(row);
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM accounts_user WHERE id = $1)")
                .bind(user.id)
                .fetch_one(&self.db)
                .await?;
        if exists {
            Err(AccountError::Conflict { id: user.id })
        } else {
            Err(AccountError::NotFound { id: user.id })
        }
    }

    async fn delete(&self, id: Uuid) -> AccountResult<()> {
        let result = sqlx::query("DELETE FROM accounts_user WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AccountError::NotFound { id });
        }
        Ok(())
    }
}
