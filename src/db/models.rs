use chrono::{DateTime, Utc};
use lookbook_assoc::{SetColumn, VoteSets};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::sqlite::SqliteRow;

use crate::db::columns::Table;

/// A row type that can be fetched by primary key or scanned from its table.
pub trait TableRow: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    const TABLE: Table;
    /// Column list for the SELECT; must match the struct's fields.
    const COLUMNS: &'static str;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub gender: String,
    pub age: i64,
    pub height: String,
    pub user_posts: Option<String>,
    pub favorite_posts: Option<String>,
    pub favorite_clothing: Option<String>,
    pub user_categories: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TableRow for DbUser {
    const TABLE: Table = Table::Users;
    const COLUMNS: &'static str = "id, username, email, gender, age, height, user_posts, \
        favorite_posts, favorite_clothing, user_categories, created_at";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbCategory {
    pub id: i64,
    pub category_name: String,
    pub public: bool,
    pub post_ids: Option<String>,
}

impl TableRow for DbCategory {
    const TABLE: Table = Table::Categories;
    const COLUMNS: &'static str = "id, category_name, public, post_ids";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbPost {
    pub id: i64,
    pub owner_id: i64,
    pub category: String,
    pub description: String,
    pub clothing_items: String,
    /// Blob locator of the post image.
    pub image_url: Option<String>,
    pub gender_restriction: String,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Logical delete marker; set once, never cleared.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DbPost {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl TableRow for DbPost {
    const TABLE: Table = Table::Posts;
    const COLUMNS: &'static str = "id, owner_id, category, description, clothing_items, \
        image_url, gender_restriction, comments, created_at, deleted_at";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbClothingArticle {
    pub id: i64,
    pub post_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub up_votes: Option<String>,
    pub down_votes: Option<String>,
    pub favorites: Option<String>,
}

impl DbClothingArticle {
    pub fn vote_sets(&self) -> VoteSets {
        VoteSets::new(
            SetColumn::decode(self.up_votes.as_deref()),
            SetColumn::decode(self.down_votes.as_deref()),
        )
    }
}

impl TableRow for DbClothingArticle {
    const TABLE: Table = Table::ClothingArticles;
    const COLUMNS: &'static str = "id, post_id, type, up_votes, down_votes, favorites";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbComment {
    pub id: i64,
    pub post_id: i64,
    pub owner_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl TableRow for DbComment {
    const TABLE: Table = Table::Comments;
    const COLUMNS: &'static str = "id, post_id, owner_id, text, created_at";
}

/// The user columns that can reference a post.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct UserPostRefs {
    pub id: i64,
    pub user_posts: Option<String>,
    pub favorite_posts: Option<String>,
}

impl TableRow for UserPostRefs {
    const TABLE: Table = Table::Users;
    const COLUMNS: &'static str = "id, user_posts, favorite_posts";
}

/// The category column that can reference a post.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CategoryPostRefs {
    pub id: i64,
    pub post_ids: Option<String>,
}

impl TableRow for CategoryPostRefs {
    const TABLE: Table = Table::Categories;
    const COLUMNS: &'static str = "id, post_ids";
}
