use std::collections::BTreeMap;

use ahash::AHashSet;
use chrono::Utc;
use lookbook_assoc::{Associations, SetColumn, group_labels, label_all, merge_associations};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};
use tracing::{debug, info};

use crate::db::{DbUser, SetColumnRef, SqliteStore, StoreTx, TableRow};
use crate::engine::row_ids;
use crate::error::LookbookError;

/// Label given to directly favorited posts in a profile.
const POST_LABEL: &str = "Post";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub gender: String,
    pub age: i64,
    pub height: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_available: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    pub username: String,
    pub gender: String,
    pub age: i64,
    pub height: String,
    /// Subscribed category id -> name.
    pub categories: BTreeMap<String, String>,
    /// Post id -> labels: "Post" for a favorited post, clothing types for
    /// favorited articles of that post.
    pub favorites: Associations,
}

async fn exists(tx: &mut StoreTx, column: &str, value: &str) -> Result<bool, LookbookError> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM users WHERE {column} = ?)");
    let found: bool = sqlx::query_scalar(&sql)
        .bind(value)
        .fetch_one(tx.conn())
        .await?;
    Ok(found)
}

pub async fn create_user(store: &SqliteStore, new_user: NewUser) -> Result<i64, LookbookError> {
    let username = new_user.username.trim();
    let email = new_user.email.trim();
    if username.is_empty() || email.is_empty() {
        return Err(LookbookError::InvalidRequest(
            "username and email are required".to_string(),
        ));
    }

    let mut tx = store.begin().await?;
    if exists(&mut tx, "username", username).await? {
        return Err(LookbookError::InvalidRequest(format!(
            "username {username} is taken"
        )));
    }
    if exists(&mut tx, "email", email).await? {
        return Err(LookbookError::InvalidRequest(format!(
            "email {email} is already registered"
        )));
    }

    let id = sqlx::query(
        "INSERT INTO users (username, email, gender, age, height, user_posts, favorite_posts, \
         favorite_clothing, user_categories, created_at) VALUES (?, ?, ?, ?, ?, '', '', '', '', ?)",
    )
    .bind(username)
    .bind(email)
    .bind(&new_user.gender)
    .bind(new_user.age)
    .bind(&new_user.height)
    .bind(Utc::now())
    .execute(tx.conn())
    .await?
    .last_insert_rowid();
    tx.commit().await?;

    info!(user_id = id, username, "user created");
    Ok(id)
}

/// Reports whether each given value is free. Unset inputs are not checked.
pub async fn check_availability(
    store: &SqliteStore,
    username: Option<&str>,
    email: Option<&str>,
) -> Result<Availability, LookbookError> {
    let mut tx = store.begin().await?;
    let mut availability = Availability::default();
    if let Some(username) = username {
        availability.username_available = Some(!exists(&mut tx, "username", username.trim()).await?);
    }
    if let Some(email) = email {
        availability.email_available = Some(!exists(&mut tx, "email", email.trim()).await?);
    }
    tx.commit().await?;
    Ok(availability)
}

/// Profile of `username` with its subscribed categories and a merged view of
/// its favorites.
///
/// Directly favorited posts are labelled "Post". Favorited clothing is
/// grouped by the post it belongs to, labelled with the clothing type, and
/// merged in: a post already present gains only the types it lacks.
pub async fn user_profile(store: &SqliteStore, username: &str) -> Result<UserProfile, LookbookError> {
    let mut tx = store.begin().await?;
    let sql = format!("SELECT {} FROM users WHERE username = ?", DbUser::COLUMNS);
    let user = sqlx::query_as::<_, DbUser>(&sql)
        .bind(username)
        .fetch_optional(tx.conn())
        .await?
        .ok_or_else(|| LookbookError::not_found("user", username))?;

    let category_ids = row_ids(
        &SetColumn::decode(user.user_categories.as_deref()),
        SetColumnRef::UserCategories,
    )?;
    let categories = category_names(&mut tx, &category_ids).await?;

    let favorite_posts = SetColumn::decode(user.favorite_posts.as_deref());
    let direct = label_all(favorite_posts.iter(), POST_LABEL);

    let mut seen = AHashSet::new();
    let clothing_ids: Vec<i64> = row_ids(
        &SetColumn::decode(user.favorite_clothing.as_deref()),
        SetColumnRef::UserFavoriteClothing,
    )?
    .into_iter()
    .filter(|id| seen.insert(*id))
    .collect();
    let clothing = clothing_labels(&mut tx, &clothing_ids).await?;
    tx.commit().await?;

    let derived = group_labels(clothing);
    let favorites = merge_associations(direct, derived);

    debug!(
        user_id = user.id,
        categories = categories.len(),
        favorites = favorites.len(),
        "profile assembled"
    );
    Ok(UserProfile {
        user_id: user.id,
        username: user.username,
        gender: user.gender,
        age: user.age,
        height: user.height,
        categories,
        favorites,
    })
}

async fn category_names(
    tx: &mut StoreTx,
    ids: &[i64],
) -> Result<BTreeMap<String, String>, LookbookError> {
    if ids.is_empty() {
        return Ok(BTreeMap::new());
    }
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT id, category_name FROM categories WHERE id IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let rows: Vec<(i64, String)> = qb.build_query_as().fetch_all(tx.conn()).await?;
    Ok(rows
        .into_iter()
        .map(|(id, name)| (id.to_string(), name))
        .collect())
}

/// `(post_id, clothing type)` for each favorited article of a live post.
async fn clothing_labels(
    tx: &mut StoreTx,
    ids: &[i64],
) -> Result<Vec<(i64, String)>, LookbookError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT ca.post_id, ca.type FROM clothing_articles ca \
         JOIN posts p ON p.id = ca.post_id \
         WHERE p.deleted_at IS NULL AND ca.id IN (",
    );
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY ca.id");

    let rows: Vec<(i64, String)> = qb.build_query_as().fetch_all(tx.conn()).await?;
    Ok(rows)
}
