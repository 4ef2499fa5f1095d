//! Serializable operation requests and their outcomes.
//!
//! [`Operation`] is the unit the database actor executes; each variant maps
//! to one engine call and one transaction.

use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use lookbook_assoc::{Tally, ToggleAction, VoteDirection, VoteOp};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::{
    self, Availability, CascadeReport, CategoryFeed, CategorySummary, CreatedComment,
    CreatedPost, EngineContext, FavoriteTarget, FeedRequest, NewCategory, NewPost, NewUser,
    PostCard, PostDetails, PostList, UserPostView, UserProfile,
};
use crate::error::{IsRetryable, LookbookError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Operation {
    CreateUser(NewUser),
    CheckAvailability {
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        email: Option<String>,
    },
    CreateCategory(NewCategory),
    CreatePost(NewPost),
    DeletePost {
        post_id: i64,
    },
    ToggleFavorite {
        user_id: i64,
        target: FavoriteTarget,
        item_id: i64,
    },
    ToggleSubscription {
        user_id: i64,
        category_id: i64,
    },
    Vote {
        article_id: i64,
        voter_id: i64,
        direction: VoteDirection,
        op: VoteOp,
    },
    ArticleTally {
        article_id: i64,
    },
    SubmitComment {
        post_id: i64,
        owner_id: i64,
        text: String,
    },
    DeleteComment {
        post_id: i64,
        comment_id: i64,
    },
    UserProfile {
        username: String,
    },
    UserPostView {
        post_id: i64,
        user_id: i64,
    },
    PostDetails {
        post_id: i64,
    },
    ListUserPosts {
        user_id: i64,
        list: PostList,
    },
    PostsByIds {
        post_ids: Vec<i64>,
    },
    PublicCategories,
    SubscribedCategories {
        user_id: i64,
    },
    CategoryFeed(FeedRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Outcome {
    Created { id: i64 },
    Availability(Availability),
    PostCreated(CreatedPost),
    CommentCreated(CreatedComment),
    PostDeleted(CascadeReport),
    Toggled { action: ToggleAction },
    Tally(Tally),
    Done,
    Profile(UserProfile),
    PostView(UserPostView),
    PostDetails(PostDetails),
    Posts(Vec<PostCard>),
    Categories(Vec<CategorySummary>),
    Feed(CategoryFeed),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateUser(_) => "create_user",
            Operation::CheckAvailability { .. } => "check_availability",
            Operation::CreateCategory(_) => "create_category",
            Operation::CreatePost(_) => "create_post",
            Operation::DeletePost { .. } => "delete_post",
            Operation::ToggleFavorite { .. } => "toggle_favorite",
            Operation::ToggleSubscription { .. } => "toggle_subscription",
            Operation::Vote { .. } => "vote",
            Operation::ArticleTally { .. } => "article_tally",
            Operation::SubmitComment { .. } => "submit_comment",
            Operation::DeleteComment { .. } => "delete_comment",
            Operation::UserProfile { .. } => "user_profile",
            Operation::UserPostView { .. } => "user_post_view",
            Operation::PostDetails { .. } => "post_details",
            Operation::ListUserPosts { .. } => "list_user_posts",
            Operation::PostsByIds { .. } => "posts_by_ids",
            Operation::PublicCategories => "public_categories",
            Operation::SubscribedCategories { .. } => "subscribed_categories",
            Operation::CategoryFeed(_) => "category_feed",
        }
    }

    /// Whether the operation writes. Only writes can lose a compare-and-swap.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Operation::CreateUser(_)
                | Operation::CreateCategory(_)
                | Operation::CreatePost(_)
                | Operation::DeletePost { .. }
                | Operation::ToggleFavorite { .. }
                | Operation::ToggleSubscription { .. }
                | Operation::Vote { .. }
                | Operation::SubmitComment { .. }
                | Operation::DeleteComment { .. }
        )
    }

    /// Runs the operation once.
    pub async fn run(self, ctx: &EngineContext) -> Result<Outcome, LookbookError> {
        let store = &ctx.store;
        let outcome = match self {
            Operation::CreateUser(new_user) => Outcome::Created {
                id: engine::create_user(store, new_user).await?,
            },
            Operation::CheckAvailability { username, email } => Outcome::Availability(
                engine::check_availability(store, username.as_deref(), email.as_deref()).await?,
            ),
            Operation::CreateCategory(new_category) => Outcome::Created {
                id: engine::create_category(store, new_category).await?,
            },
            Operation::CreatePost(new_post) => {
                Outcome::PostCreated(engine::create_post(ctx, new_post).await?)
            }
            Operation::DeletePost { post_id } => {
                Outcome::PostDeleted(engine::delete_post(store, post_id).await?)
            }
            Operation::ToggleFavorite {
                user_id,
                target,
                item_id,
            } => Outcome::Toggled {
                action: engine::toggle_favorite(store, user_id, target, item_id).await?,
            },
            Operation::ToggleSubscription {
                user_id,
                category_id,
            } => Outcome::Toggled {
                action: engine::toggle_subscription(store, user_id, category_id).await?,
            },
            Operation::Vote {
                article_id,
                voter_id,
                direction,
                op,
            } => Outcome::Tally(
                engine::vote(
                    store,
                    ctx.config.vote_policy(),
                    article_id,
                    voter_id,
                    direction,
                    op,
                )
                .await?,
            ),
            Operation::ArticleTally { article_id } => {
                Outcome::Tally(engine::article_tally(store, article_id).await?)
            }
            Operation::SubmitComment {
                post_id,
                owner_id,
                text,
            } => Outcome::CommentCreated(
                engine::submit_comment(store, post_id, owner_id, &text).await?,
            ),
            Operation::DeleteComment {
                post_id,
                comment_id,
            } => {
                engine::delete_comment(store, post_id, comment_id).await?;
                Outcome::Done
            }
            Operation::UserProfile { username } => {
                Outcome::Profile(engine::user_profile(store, &username).await?)
            }
            Operation::UserPostView { post_id, user_id } => {
                Outcome::PostView(engine::user_post_view(ctx, post_id, user_id).await?)
            }
            Operation::PostDetails { post_id } => {
                Outcome::PostDetails(engine::post_details(ctx, post_id).await?)
            }
            Operation::ListUserPosts { user_id, list } => {
                Outcome::Posts(engine::list_user_posts(ctx, user_id, list).await?)
            }
            Operation::PostsByIds { post_ids } => {
                Outcome::Posts(engine::posts_by_ids(ctx, &post_ids).await?)
            }
            Operation::PublicCategories => {
                Outcome::Categories(engine::public_categories(store).await?)
            }
            Operation::SubscribedCategories { user_id } => {
                Outcome::Categories(engine::subscribed_categories(store, user_id).await?)
            }
            Operation::CategoryFeed(request) => {
                Outcome::Feed(engine::category_feed(ctx, request).await?)
            }
        };
        Ok(outcome)
    }
}

/// Runs `op`. A mutating operation that fails with a retryable error is
/// repeated from scratch, up to the configured number of attempts.
pub async fn execute_with_retry(
    ctx: &EngineContext,
    op: Operation,
) -> Result<Outcome, LookbookError> {
    if !op.is_mutating() {
        return op.run(ctx).await;
    }
    let name = op.name();
    retry_conflicts(ctx.config.conflict_retry_policy(), name, || op.clone().run(ctx)).await
}

/// Calls `attempt` until it succeeds, fails with an error that is not
/// retryable, or `policy` runs out of attempts.
pub(crate) async fn retry_conflicts<T, F, Fut>(
    policy: ExponentialBuilder,
    name: &str,
    attempt: F,
) -> Result<T, LookbookError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LookbookError>>,
{
    attempt
        .retry(policy)
        .when(|err: &LookbookError| err.is_retryable())
        .notify(|err, dur: Duration| {
            warn!(operation = name, "retrying after error {} in {:?}", err, dur);
        })
        .await
}
