//! User persistence.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnection;
use uuid::Uuid;

use crate::domain::aggregates::{Profile, User};
use crate::store::is_unique_violation;
use crate::{GroceryError, Result};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    role: String,
    firstname: Option<String>,
    lastname: Option<String>,
    gender: Option<String>,
    birth_date: Option<String>,
    is_verified: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = GroceryError;
    fn try_from(r: UserRow) -> Result<Self> {
        let role = r.role.parse().map_err(|e| GroceryError::Corrupt(format!("user {}: {e}", r.id)))?;
        let profile = Profile { firstname: r.firstname, lastname: r.lastname, gender: r.gender, birth_date: r.birth_date };
        Ok(User::rehydrate(r.id, r.username, r.password_hash, role, profile, r.is_verified, r.created_at))
    }
}

pub async fn insert(conn: &mut SqliteConnection, u: &User) -> Result<()> {
    let p = u.profile();
    sqlx::query(
        "INSERT INTO users (id, username, password_hash, role, firstname, lastname, gender, birth_date, is_verified, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
    .bind(u.id()).bind(u.username()).bind(u.password_hash()).bind(u.role().as_str())
    .bind(&p.firstname).bind(&p.lastname).bind(&p.gender).bind(&p.birth_date)
    .bind(u.is_verified()).bind(u.created_at())
    .execute(conn).await
    .map_err(|e| if is_unique_violation(&e) { GroceryError::Conflict("Username already exists".into()) } else { e.into() })?;
    Ok(())
}

pub async fn save(conn: &mut SqliteConnection, u: &User) -> Result<()> {
    let p = u.profile();
    let result = sqlx::query(
        "UPDATE users SET password_hash = ?2, role = ?3, firstname = ?4, lastname = ?5, gender = ?6, birth_date = ?7, is_verified = ?8 WHERE id = ?1",
    )
    .bind(u.id()).bind(u.password_hash()).bind(u.role().as_str())
    .bind(&p.firstname).bind(&p.lastname).bind(&p.gender).bind(&p.birth_date).bind(u.is_verified())
    .execute(conn).await?;
    if result.rows_affected() == 0 { return Err(GroceryError::not_found("User", u.id())); }
    Ok(())
}

pub async fn get(conn: &mut SqliteConnection, id: Uuid) -> Result<User> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?1")
        .bind(id).fetch_optional(conn).await?
        .ok_or_else(|| GroceryError::not_found("User", id))?
        .try_into()
}

pub async fn find_by_username(conn: &mut SqliteConnection, username: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = ?1")
        .bind(username.trim()).fetch_optional(conn).await?
        .map(User::try_from)
        .transpose()
}

pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<User>> {
    let rows = sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY username").fetch_all(conn).await?;
    rows.into_iter().map(User::try_from).collect()
}

pub async fn delete(conn: &mut SqliteConnection, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?1").bind(id).execute(conn).await?;
    if result.rows_affected() == 0 { return Err(GroceryError::not_found("User", id)); }
    Ok(())
}
