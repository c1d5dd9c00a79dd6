//! Credential store: user identity, password hash and the admin flag.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::core::error::ApiError;
use crate::core::shared::schema::{enrollments, lesson_progress, users};
use crate::core::shared::utils::{with_conn, DbPool};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = users)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: bool,
}

impl NewUser {
    /// `email` is expected to be normalized already.
    pub fn new(
        email: String,
        password_hash: String,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            first_name,
            last_name,
            is_admin: false,
        }
    }
}

pub fn find_user(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<Option<User>> {
    users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()
}

pub fn find_user_by_email(conn: &mut PgConnection, email: &str) -> QueryResult<Option<User>> {
    users::table
        .filter(users::email.eq(email))
        .select(User::as_select())
        .first(conn)
        .optional()
}

pub struct UserStore {
    db: DbPool,
}

impl UserStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User, ApiError> {
        with_conn(&self.db, move |conn| {
            conn.transaction::<_, ApiError, _>(|conn| {
                if find_user_by_email(conn, &new_user.email)?.is_some() {
                    return Err(ApiError::Conflict("User already exists".into()));
                }

                let user = diesel::insert_into(users::table)
                    .values(&new_user)
                    .returning(User::as_returning())
                    .get_result(conn)?;
                Ok(user)
            })
        })
        .await
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, ApiError> {
        with_conn(&self.db, move |conn| Ok(find_user(conn, user_id)?)).await
    }

    pub async fn get_user_by_email(&self, email: String) -> Result<Option<User>, ApiError> {
        with_conn(&self.db, move |conn| Ok(find_user_by_email(conn, &email)?)).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        with_conn(&self.db, |conn| {
            Ok(users::table
                .order(users::created_at.desc())
                .select(User::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn promote_to_admin(&self, user_id: Uuid) -> Result<User, ApiError> {
        let user = with_conn(&self.db, move |conn| {
            diesel::update(users::table.find(user_id))
                .set((users::is_admin.eq(true), users::updated_at.eq(Utc::now())))
                .returning(User::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("User"))
        })
        .await?;

        info!("User {} promoted to admin", user.id);
        Ok(user)
    }

    /// Removes the user together with their enrollments and lesson progress.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), ApiError> {
        with_conn(&self.db, move |conn| {
            conn.transaction::<_, ApiError, _>(|conn| {
                diesel::delete(lesson_progress::table.filter(lesson_progress::user_id.eq(user_id)))
                    .execute(conn)?;
                diesel::delete(enrollments::table.filter(enrollments::user_id.eq(user_id)))
                    .execute(conn)?;

                let deleted = diesel::delete(users::table.find(user_id)).execute(conn)?;
                if deleted == 0 {
                    return Err(ApiError::not_found("User"));
                }
                Ok(())
            })
        })
        .await?;

        info!("User {user_id} deleted");
        Ok(())
    }
}
