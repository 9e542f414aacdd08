//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use bazaar_core::{Email, Role, UserId};

use super::RepositoryError;
use crate::models::user::{NewUser, ProfileUpdate, User};

/// Internal row type for user queries.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    role: Role,
    store_name: Option<String>,
    store_description: Option<String>,
    avatar: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    city: Option<String>,
    zip_code: Option<String>,
    is_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            email,
            role: row.role,
            store_name: row.store_name,
            store_description: row.store_description,
            avatar: row.avatar,
            phone: row.phone,
            address: row.address,
            city: row.city,
            zip_code: row.zip_code,
            is_verified: row.is_verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, email, role, store_name, store_description, avatar,
                   phone, address, city, zip_code, is_verified, created_at, updated_at
            FROM bazaar.user
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get several users at once, in no particular order. Unknown ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[UserId]) -> Result<Vec<User>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<uuid::Uuid> = ids.iter().map(UserId::as_uuid).collect();
        let rows = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, email, role, store_name, store_description, avatar,
                   phone, address, city, zip_code, is_verified, created_at, updated_at
            FROM bazaar.user
            WHERE id = ANY($1)
            ",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        insert(self.pool, user).await
    }

    /// Get a user and their password hash by email.
    ///
    /// Returns `None` if no account uses the email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(
            r"
            SELECT id, name, email, role, store_name, store_description, avatar,
                   phone, address, city, zip_code, is_verified, created_at, updated_at,
                   password_hash
            FROM bazaar.user
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let user = User::try_from(row.user)?;
        Ok(Some((user, row.password_hash)))
    }

    /// Apply a validated profile edit. Absent fields keep their value.
    ///
    /// Returns `None` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE bazaar.user
            SET name = COALESCE($2, name),
                avatar = COALESCE($3, avatar),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                city = COALESCE($6, city),
                zip_code = COALESCE($7, zip_code),
                store_name = COALESCE($8, store_name),
                store_description = COALESCE($9, store_description)
            WHERE id = $1
            RETURNING id, name, email, role, store_name, store_description, avatar,
                      phone, address, city, zip_code, is_verified, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.avatar.as_deref())
        .bind(update.phone.as_deref())
        .bind(update.address.as_deref())
        .bind(update.city.as_deref())
        .bind(update.zip_code.as_deref())
        .bind(update.store_name.as_deref())
        .bind(update.store_description.as_deref())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }
}

/// Look up an account by email on any executor.
pub(crate) async fn find_by_email<'e, E>(
    executor: E,
    email: &Email,
) -> Result<Option<User>, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, UserRow>(
        r"
        SELECT id, name, email, role, store_name, store_description, avatar,
               phone, address, city, zip_code, is_verified, created_at, updated_at
        FROM bazaar.user
        WHERE email = $1
        ",
    )
    .bind(email.as_str())
    .fetch_optional(executor)
    .await?;

    row.map(User::try_from).transpose()
}

/// Insert an account on any executor (pool or open transaction).
pub(crate) async fn insert<'e, E>(executor: E, user: &NewUser) -> Result<User, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, UserRow>(
        r"
        INSERT INTO bazaar.user
            (name, email, password_hash, role, store_name, store_description,
             phone, address, city, zip_code)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, name, email, role, store_name, store_description, avatar,
                  phone, address, city, zip_code, is_verified, created_at, updated_at
        ",
    )
    .bind(&user.name)
    .bind(user.email.as_str())
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(user.store_name.as_deref())
    .bind(user.store_description.as_deref())
    .bind(user.phone.as_deref())
    .bind(user.address.as_deref())
    .bind(user.city.as_deref())
    .bind(user.zip_code.as_deref())
    .fetch_one(executor)
    .await
    .map_err(|e| RepositoryError::on_unique_violation(e, "email already exists"))?;

    User::try_from(row)
}
