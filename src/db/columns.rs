//! Closed registry of tables and id-list columns.
//!
//! Table and column names are interpolated into SQL, so they only ever come
//! from these enums.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    Categories,
    Posts,
    ClothingArticles,
    Comments,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Categories => "categories",
            Table::Posts => "posts",
            Table::ClothingArticles => "clothing_articles",
            Table::Comments => "comments",
        }
    }

    /// Entity name used in not-found errors.
    pub fn entity(self) -> &'static str {
        match self {
            Table::Users => "user",
            Table::Categories => "category",
            Table::Posts => "post",
            Table::ClothingArticles => "clothing article",
            Table::Comments => "comment",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every id-list column in the schema, with the table that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetColumnRef {
    UserPosts,
    UserFavoritePosts,
    UserFavoriteClothing,
    UserCategories,
    CategoryPostIds,
    PostComments,
    ArticleUpVotes,
    ArticleDownVotes,
    ArticleFavorites,
}

impl SetColumnRef {
    pub fn table(self) -> Table {
        match self {
            SetColumnRef::UserPosts
            | SetColumnRef::UserFavoritePosts
            | SetColumnRef::UserFavoriteClothing
            | SetColumnRef::UserCategories => Table::Users,
            SetColumnRef::CategoryPostIds => Table::Categories,
            SetColumnRef::PostComments => Table::Posts,
            SetColumnRef::ArticleUpVotes
            | SetColumnRef::ArticleDownVotes
            | SetColumnRef::ArticleFavorites => Table::ClothingArticles,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            SetColumnRef::UserPosts => "user_posts",
            SetColumnRef::UserFavoritePosts => "favorite_posts",
            SetColumnRef::UserFavoriteClothing => "favorite_clothing",
            SetColumnRef::UserCategories => "user_categories",
            SetColumnRef::CategoryPostIds => "post_ids",
            SetColumnRef::PostComments => "comments",
            SetColumnRef::ArticleUpVotes => "up_votes",
            SetColumnRef::ArticleDownVotes => "down_votes",
            SetColumnRef::ArticleFavorites => "favorites",
        }
    }

    /// `table.column`, for logs and error payloads.
    pub fn qualified(self) -> &'static str {
        match self {
            SetColumnRef::UserPosts => "users.user_posts",
            SetColumnRef::UserFavoritePosts => "users.favorite_posts",
            SetColumnRef::UserFavoriteClothing => "users.favorite_clothing",
            SetColumnRef::UserCategories => "users.user_categories",
            SetColumnRef::CategoryPostIds => "categories.post_ids",
            SetColumnRef::PostComments => "posts.comments",
            SetColumnRef::ArticleUpVotes => "clothing_articles.up_votes",
            SetColumnRef::ArticleDownVotes => "clothing_articles.down_votes",
            SetColumnRef::ArticleFavorites => "clothing_articles.favorites",
        }
    }
}

impl fmt::Display for SetColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.qualified())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_name_matches_table_and_column() {
        for col in [
            SetColumnRef::UserPosts,
            SetColumnRef::UserFavoritePosts,
            SetColumnRef::UserFavoriteClothing,
            SetColumnRef::UserCategories,
            SetColumnRef::CategoryPostIds,
            SetColumnRef::PostComments,
            SetColumnRef::ArticleUpVotes,
            SetColumnRef::ArticleDownVotes,
            SetColumnRef::ArticleFavorites,
        ] {
            assert_eq!(
                col.qualified(),
                format!("{}.{}", col.table().name(), col.column())
            );
        }
    }
}
