use airport_core::filter::{Page, PageRequest};
use airport_core::repository::UserRepository;
use airport_core::user::{NewUser, User, UserChanges};
use airport_core::{CoreError, CoreResult};
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;
use crate::database::{internal, write_error, PgStore};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    is_staff: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            is_staff: row.is_staff,
        }
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn list_users(&self, page: PageRequest) -> CoreResult<Page<User>> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(internal)?;

        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, is_staff FROM users ORDER BY email LIMIT $1 OFFSET $2",
        )
        .bind(page.bounds().1)
        .bind(page.bounds().0)
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;

        Ok(Page {
            count: count as u64,
            results: rows.into_iter().map(User::from).collect(),
        })
    }

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT id, email, password_hash, is_staff FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, is_staff FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;
        Ok(row.map(User::from))
    }

    async fn create_user(&self, user: &NewUser) -> CoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (id, email, password_hash, is_staff) VALUES ($1, $2, $3, $4) \
             RETURNING id, email, password_hash, is_staff",
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_staff)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)?;

        info!("Created user {} (staff: {})", row.email, row.is_staff);
        Ok(row.into())
    }

    async fn update_user(&self, id: Uuid, changes: &UserChanges) -> CoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "UPDATE users SET email = COALESCE($2, email), password_hash = COALESCE($3, password_hash), \
             is_staff = COALESCE($4, is_staff) WHERE id = $1 RETURNING id, email, password_hash, is_staff",
        )
        .bind(id)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .bind(changes.is_staff)
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error)?;

        row.map(User::from).ok_or_else(|| CoreError::not_found("user", id))
    }
}
