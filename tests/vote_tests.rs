mod common;

use common::TestDb;
use lookbook::LookbookError;
use lookbook::config::EngineConfig;
use lookbook::db::SetColumnRef;
use lookbook::engine;
use lookbook_assoc::{Tally, VoteDirection, VoteOp};

#[tokio::test]
async fn votes_update_lists_and_tally() {
    let db = TestDb::new("votes").await;
    let owner = db.user("owner").await;
    let alice = db.user("alice").await;
    let bob = db.user("bob").await;
    db.category("Casual").await;
    let article = db.post(owner, "Casual", &["Sneakers"]).await.clothing_article_ids[0];
    let policy = db.ctx.config.vote_policy();

    let tally = engine::vote(db.store(), policy, article, alice, VoteDirection::Approve, VoteOp::Add)
        .await
        .unwrap();
    assert_eq!(
        tally,
        Tally {
            percentage_approve: 100,
            total_votes: 1
        }
    );

    let tally = engine::vote(db.store(), policy, article, bob, VoteDirection::Disapprove, VoteOp::Add)
        .await
        .unwrap();
    assert_eq!(tally.percentage_approve, 50);
    assert_eq!(tally.total_votes, 2);

    // Replaying the same vote is a no-op.
    let tally = engine::vote(db.store(), policy, article, alice, VoteDirection::Approve, VoteOp::Add)
        .await
        .unwrap();
    assert_eq!(tally.total_votes, 2);
    assert_eq!(
        db.raw(SetColumnRef::ArticleUpVotes, article).await.as_deref(),
        Some(alice.to_string().as_str())
    );

    let tally = engine::vote(db.store(), policy, article, bob, VoteDirection::Disapprove, VoteOp::Remove)
        .await
        .unwrap();
    assert_eq!(
        tally,
        Tally {
            percentage_approve: 100,
            total_votes: 1
        }
    );
    assert_eq!(
        engine::article_tally(db.store(), article).await.unwrap(),
        tally
    );

    db.cleanup().await;
}

#[tokio::test]
async fn voter_may_sit_in_both_lists_by_default() {
    let db = TestDb::new("votes_both").await;
    let owner = db.user("owner").await;
    let alice = db.user("alice").await;
    db.category("Casual").await;
    let article = db.post(owner, "Casual", &["Hat"]).await.clothing_article_ids[0];
    let policy = db.ctx.config.vote_policy();

    engine::vote(db.store(), policy, article, alice, VoteDirection::Approve, VoteOp::Add)
        .await
        .unwrap();
    let tally = engine::vote(db.store(), policy, article, alice, VoteDirection::Disapprove, VoteOp::Add)
        .await
        .unwrap();
    assert_eq!(tally.total_votes, 2);
    assert_eq!(tally.percentage_approve, 50);

    db.cleanup().await;
}

#[tokio::test]
async fn exclusive_voting_moves_the_voter() {
    let config = EngineConfig {
        exclusive_voting: true,
        ..EngineConfig::default()
    };
    let db = TestDb::with_config("votes_exclusive", config).await;
    let owner = db.user("owner").await;
    let alice = db.user("alice").await;
    db.category("Casual").await;
    let article = db.post(owner, "Casual", &["Hat"]).await.clothing_article_ids[0];
    let policy = db.ctx.config.vote_policy();

    engine::vote(db.store(), policy, article, alice, VoteDirection::Approve, VoteOp::Add)
        .await
        .unwrap();
    let tally = engine::vote(db.store(), policy, article, alice, VoteDirection::Disapprove, VoteOp::Add)
        .await
        .unwrap();
    assert_eq!(
        tally,
        Tally {
            percentage_approve: 0,
            total_votes: 1
        }
    );
    assert_eq!(
        db.raw(SetColumnRef::ArticleUpVotes, article).await.as_deref(),
        Some("")
    );

    db.cleanup().await;
}

#[tokio::test]
async fn voting_on_missing_article_is_not_found() {
    let db = TestDb::new("votes_missing").await;
    let alice = db.user("alice").await;
    let err = engine::vote(
        db.store(),
        db.ctx.config.vote_policy(),
        31337,
        alice,
        VoteDirection::Approve,
        VoteOp::Add,
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        LookbookError::NotFound {
            entity: "clothing article",
            ..
        }
    ));

    db.cleanup().await;
}
