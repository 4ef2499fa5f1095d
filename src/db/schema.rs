//! SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema includes:
/// - `users` table (owns the `user_posts`, `favorite_posts`, `favorite_clothing` and
///   `user_categories` id lists)
/// - `categories` table (owns the `post_ids` list)
/// - `posts` table (owns the `comments` list; `deleted_at` marks a logical delete)
/// - `clothing_articles` table (owns the `up_votes`, `down_votes` and `favorites` lists)
/// - `comments` table
///
/// Id lists are comma-joined TEXT; NULL and '' both mean "no members".
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Users
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY NOT NULL,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    gender TEXT NOT NULL,
    age INTEGER NOT NULL,
    height TEXT NOT NULL,
    user_posts TEXT NULL,
    favorite_posts TEXT NULL,
    favorite_clothing TEXT NULL,
    user_categories TEXT NULL,
    created_at TEXT NOT NULL -- RFC3339
);

-- ---------------------------------------------------------------------------
-- Categories
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY NOT NULL,
    category_name TEXT NOT NULL UNIQUE,
    public INTEGER NOT NULL DEFAULT 1,
    post_ids TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_categories_public ON categories(public);

-- ---------------------------------------------------------------------------
-- Posts (rows are never physically deleted)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY NOT NULL,
    owner_id INTEGER NOT NULL,
    category TEXT NOT NULL,
    description TEXT NOT NULL,
    clothing_items TEXT NOT NULL,
    image_url TEXT NULL,
    gender_restriction TEXT NOT NULL,
    comments TEXT NULL,
    created_at TEXT NOT NULL, -- RFC3339
    deleted_at TEXT NULL -- RFC3339
);

-- ---------------------------------------------------------------------------
-- Clothing articles (one per item of a post)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS clothing_articles (
    id INTEGER PRIMARY KEY NOT NULL,
    post_id INTEGER NOT NULL,
    type TEXT NOT NULL,
    up_votes TEXT NULL,
    down_votes TEXT NULL,
    favorites TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_clothing_articles_post_id ON clothing_articles(post_id);

-- ---------------------------------------------------------------------------
-- Comments
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY NOT NULL,
    post_id INTEGER NOT NULL,
    owner_id INTEGER NOT NULL,
    text TEXT NOT NULL,
    created_at TEXT NOT NULL -- RFC3339
);
"#;
