use lookbook_assoc::{Tally, VoteDirection, VoteOp, VotePolicy, VoteSets};
use tracing::{debug, info};

use crate::db::{DbClothingArticle, LoadedSet, SetColumnRef, SqliteStore};
use crate::error::LookbookError;

/// Records `voter_id`'s vote on a clothing article and returns the tally of
/// the committed state. Only the lists the vote actually changed are written.
pub async fn vote(
    store: &SqliteStore,
    policy: VotePolicy,
    article_id: i64,
    voter_id: i64,
    direction: VoteDirection,
    op: VoteOp,
) -> Result<Tally, LookbookError> {
    let mut tx = store.begin().await?;
    let article = tx.require_row::<DbClothingArticle>(article_id).await?;

    let mut up = LoadedSet::from_raw(
        SetColumnRef::ArticleUpVotes,
        article_id,
        article.up_votes.as_deref(),
    );
    let mut down = LoadedSet::from_raw(
        SetColumnRef::ArticleDownVotes,
        article_id,
        article.down_votes.as_deref(),
    );

    let mut sets = VoteSets::new(std::mem::take(&mut up.set), std::mem::take(&mut down.set));
    let change = sets
        .apply(voter_id, direction, op, policy)
        .map_err(LookbookError::malformed(
            SetColumnRef::ArticleUpVotes.qualified(),
        ))?;
    let tally = sets.tally();
    up.set = sets.approvers;
    down.set = sets.disapprovers;

    if change.approvers {
        tx.store_set(&up).await?;
    }
    if change.disapprovers {
        tx.store_set(&down).await?;
    }
    tx.commit().await?;

    if change.any() {
        info!(
            article_id,
            voter_id,
            direction = ?direction,
            op = ?op,
            percentage_approve = tally.percentage_approve,
            total_votes = tally.total_votes,
            "vote recorded"
        );
    } else {
        debug!(article_id, voter_id, direction = ?direction, op = ?op, "vote already in requested state");
    }
    Ok(tally)
}

/// Current tally of one article without voting.
pub async fn article_tally(store: &SqliteStore, article_id: i64) -> Result<Tally, LookbookError> {
    let mut tx = store.begin().await?;
    let article = tx.require_row::<DbClothingArticle>(article_id).await?;
    tx.commit().await?;
    Ok(article.vote_sets().tally())
}
