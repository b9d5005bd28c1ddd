//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use agora_core::{
  Error, VotingPeriod, VotingRules, VotingService,
  account::{Caller, NewUser, ProfileUpdate},
  ballot::{CastOutcome, NewPost, PostFilter, PostPatch, VotingPeriodStatus},
  library::{
    AssetKind, ContentType, NewAnnouncement, NewAsset, NewRecording, NewSubmission,
    Priority, SubmissionReview, SubmissionStatus,
  },
  store::{AccountStore, BallotStore, LibraryStore},
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn service() -> (Arc<SqliteStore>, VotingService<SqliteStore>) {
  service_with(VotingRules::default()).await
}

async fn service_with(rules: VotingRules) -> (Arc<SqliteStore>, VotingService<SqliteStore>) {
  let store = Arc::new(store().await);
  let svc = VotingService::new(Arc::clone(&store), rules);
  (store, svc)
}

fn june() -> VotingPeriod { VotingPeriod::new(2025, 6).unwrap() }

fn admin() -> Caller {
  Caller {
    user_id:        Uuid::new_v4(),
    email:          "admin@example.com".into(),
    may_vote:       true,
    may_administer: true,
  }
}

fn voter(email: &str) -> Caller {
  Caller {
    user_id:        Uuid::new_v4(),
    email:          email.into(),
    may_vote:       true,
    may_administer: false,
  }
}

async fn post(svc: &VotingService<SqliteStore>, title: &str, period: VotingPeriod) -> Uuid {
  svc
    .create_post(&admin(), title.into(), format!("{title} description"), None, Some(period))
    .await
    .unwrap()
    .post_id
}

// ─── Full cycle ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn june_cycle_counts_ranks_and_closes() {
  let (store, svc) = service().await;
  let a = post(&svc, "A", june()).await;
  let b = post(&svc, "B", june()).await;

  svc.start(&admin(), Some(june())).await.unwrap();

  let x = voter("x@example.com");
  let y = voter("y@example.com");
  svc.cast_vote(&x, a).await.unwrap();
  svc.cast_vote(&y, a).await.unwrap();
  let receipt = svc.cast_vote(&y, b).await.unwrap();
  assert_eq!(receipt.votes_used, 2);
  assert_eq!(receipt.votes_remaining, 0);

  assert_eq!(svc.count_for_post(a).await.unwrap(), 2);
  assert_eq!(svc.count_for_post(b).await.unwrap(), 1);
  assert_eq!(svc.get_post(a).await.unwrap().cached_votes, 2);

  let results = svc.stop(&admin()).await.unwrap();
  assert_eq!(results.len(), 2);
  assert_eq!((results[0].post_id, results[0].total_votes, results[0].rank), (a, 2, 1));
  assert_eq!((results[1].post_id, results[1].total_votes, results[1].rank), (b, 1, 2));

  assert!(svc.get_post(a).await.unwrap().closed);
  assert!(svc.get_post(b).await.unwrap().closed);
  assert!(!svc.status().await.unwrap().active);
  assert!(store.active_voting_period().await.unwrap().is_none());

  let stored = svc.results(june()).await.unwrap();
  assert_eq!(stored.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2]);
  assert_eq!(svc.result_periods().await.unwrap(), vec![june()]);

  let history = svc.history(&admin()).await.unwrap();
  assert_eq!(history.len(), 1);
  assert!(!history[0].active);
  assert!(history[0].ended_at.is_some());
}

#[tokio::test]
async fn status_reports_active_period_and_countdown() {
  let (_, svc) = service().await;
  assert!(!svc.status().await.unwrap().active);

  svc.start(&admin(), Some(june())).await.unwrap();
  let status = svc.status().await.unwrap();
  assert!(status.active);
  assert_eq!(status.period, Some(june()));
  let remaining = status.remaining_ms.unwrap();
  assert!(remaining > 0 && remaining <= Duration::hours(48).num_milliseconds());
}

// ─── Vote rules ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn third_vote_exceeds_quota() {
  let (_, svc) = service().await;
  let posts = [
    post(&svc, "A", june()).await,
    post(&svc, "B", june()).await,
    post(&svc, "C", june()).await,
  ];
  svc.start(&admin(), Some(june())).await.unwrap();

  let x = voter("x@example.com");
  svc.cast_vote(&x, posts[0]).await.unwrap();
  svc.cast_vote(&x, posts[1]).await.unwrap();
  let err = svc.cast_vote(&x, posts[2]).await.unwrap_err();
  assert!(matches!(err, Error::QuotaExceeded { cap: 2, .. }), "got {err:?}");
  assert_eq!(svc.count_for_post(posts[2]).await.unwrap(), 0);
}

#[tokio::test]
async fn second_vote_for_same_post_is_duplicate() {
  let (_, svc) = service().await;
  let a = post(&svc, "A", june()).await;
  svc.start(&admin(), Some(june())).await.unwrap();

  let x = voter("x@example.com");
  svc.cast_vote(&x, a).await.unwrap();
  let err = svc.cast_vote(&x, a).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateVote { .. }), "got {err:?}");
  assert_eq!(svc.count_for_post(a).await.unwrap(), 1);
}

#[tokio::test]
async fn duplicate_takes_precedence_over_quota() {
  let s = store().await;
  let a = Uuid::new_v4();
  let b = Uuid::new_v4();

  assert!(matches!(
    s.cast_vote("x".into(), a, june(), 2).await.unwrap(),
    CastOutcome::Recorded(_)
  ));
  assert!(matches!(
    s.cast_vote("x".into(), b, june(), 2).await.unwrap(),
    CastOutcome::Recorded(_)
  ));
  assert!(matches!(
    s.cast_vote("x".into(), a, june(), 2).await.unwrap(),
    CastOutcome::Duplicate
  ));
}

#[tokio::test]
async fn quota_is_per_period() {
  let s = store().await;
  let may = june().previous();

  s.cast_vote("x".into(), Uuid::new_v4(), may, 1).await.unwrap();
  assert!(matches!(
    s.cast_vote("x".into(), Uuid::new_v4(), june(), 1).await.unwrap(),
    CastOutcome::Recorded(_)
  ));
  assert!(matches!(
    s.cast_vote("x".into(), Uuid::new_v4(), june(), 1).await.unwrap(),
    CastOutcome::QuotaExceeded
  ));
}

#[tokio::test]
async fn concurrent_votes_respect_quota() {
  let (store, svc) = service().await;
  let mut posts = Vec::new();
  for i in 0..6 {
    posts.push(post(&svc, &format!("P{i}"), june()).await);
  }
  svc.start(&admin(), Some(june())).await.unwrap();

  let handles: Vec<_> = posts
    .iter()
    .map(|&post_id| {
      let svc = svc.clone();
      tokio::spawn(async move { svc.cast_vote(&voter("x@example.com"), post_id).await })
    })
    .collect();

  let mut recorded = 0;
  for handle in handles {
    if handle.await.unwrap().is_ok() {
      recorded += 1;
    }
  }
  assert_eq!(recorded, 2);
  let votes = store
    .vote_status_for_voter("x@example.com".into(), june())
    .await
    .unwrap();
  assert_eq!(votes.total, 2);
}

#[tokio::test]
async fn voting_requires_active_period() {
  let (_, svc) = service().await;
  let a = post(&svc, "A", june()).await;

  let err = svc.cast_vote(&voter("x@example.com"), a).await.unwrap_err();
  assert!(matches!(err, Error::VotingInactive));
}

#[tokio::test]
async fn voting_after_scheduled_end_is_rejected() {
  let (store, svc) = service().await;
  let a = post(&svc, "A", june()).await;
  let started = Utc::now() - Duration::hours(49);
  store
    .insert_voting_period(VotingPeriodStatus {
      status_id:     Uuid::new_v4(),
      active:        true,
      period:        june(),
      started_at:    started,
      scheduled_end: started + Duration::hours(48),
      ended_at:      None,
    })
    .await
    .unwrap();

  let err = svc.cast_vote(&voter("x@example.com"), a).await.unwrap_err();
  assert!(matches!(err, Error::VotingInactive));
  assert_eq!(svc.status().await.unwrap().remaining_ms, Some(0));
}

#[tokio::test]
async fn start_rejects_durations_that_never_open() {
  for duration in [Duration::zero(), Duration::hours(-1), Duration::hours(2_000_000_000_000)] {
    let rules = VotingRules { duration, ..VotingRules::default() };
    let (_, svc) = service_with(rules).await;
    let err = svc.start(&admin(), Some(june())).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "{duration:?}: {err:?}");
    assert!(!svc.status().await.unwrap().active);
  }
}

#[tokio::test]
async fn votes_must_target_open_posts_of_the_active_period() {
  let (_, svc) = service().await;
  let may_post = post(&svc, "Old", june().previous()).await;
  let closed = post(&svc, "Closed", june()).await;
  svc.start(&admin(), Some(june())).await.unwrap();
  svc.close_all_for_period(&admin(), june()).await.unwrap();

  let x = voter("x@example.com");
  assert!(matches!(
    svc.cast_vote(&x, may_post).await.unwrap_err(),
    Error::PostNotInPeriod { .. }
  ));
  assert!(matches!(svc.cast_vote(&x, closed).await.unwrap_err(), Error::PostClosed(_)));
  assert!(matches!(
    svc.cast_vote(&x, Uuid::new_v4()).await.unwrap_err(),
    Error::PostNotFound(_)
  ));
}

#[tokio::test]
async fn unwhitelisted_caller_cannot_vote() {
  let (_, svc) = service().await;
  let a = post(&svc, "A", june()).await;
  svc.start(&admin(), Some(june())).await.unwrap();

  let guest = Caller { may_vote: false, ..voter("g@example.com") };
  assert!(matches!(svc.cast_vote(&guest, a).await.unwrap_err(), Error::Forbidden(_)));
}

#[tokio::test]
async fn ballot_lists_votes_in_active_period() {
  let (_, svc) = service().await;
  let a = post(&svc, "A", june()).await;
  let x = voter("x@example.com");

  let empty = svc.ballot(&x).await.unwrap();
  assert_eq!(empty.period, None);
  assert_eq!(empty.votes_remaining, 2);

  svc.start(&admin(), Some(june())).await.unwrap();
  svc.cast_vote(&x, a).await.unwrap();
  let ballot = svc.ballot(&x).await.unwrap();
  assert_eq!(ballot.period, Some(june()));
  assert_eq!(ballot.voted_post_ids, vec![a]);
  assert_eq!((ballot.votes_used, ballot.votes_remaining), (1, 1));
}

// ─── Period lifecycle ────────────────────────────────────────────────────────

#[tokio::test]
async fn start_twice_is_already_active() {
  let (_, svc) = service().await;
  svc.start(&admin(), Some(june())).await.unwrap();
  let err = svc.start(&admin(), None).await.unwrap_err();
  assert!(matches!(err, Error::AlreadyActive(p) if p == june()));
}

#[tokio::test]
async fn store_rejects_second_active_row() {
  let (store, svc) = service().await;
  let first = svc.start(&admin(), Some(june())).await.unwrap();

  let second = agora_core::ballot::VotingPeriodStatus {
    status_id: Uuid::new_v4(),
    ..first
  };
  let err: Error = store.insert_voting_period(second).await.unwrap_err().into();
  assert!(matches!(err, Error::AlreadyActive(_)), "got {err:?}");
}

#[tokio::test]
async fn stop_without_active_period_fails() {
  let (_, svc) = service().await;
  assert!(matches!(svc.stop(&admin()).await.unwrap_err(), Error::NoActiveVoting));
  assert!(matches!(svc.cancel(&admin()).await.unwrap_err(), Error::NoActiveVoting));
}

#[tokio::test]
async fn stop_without_posts_leaves_state_unchanged() {
  let (_, svc) = service().await;
  svc.start(&admin(), Some(june())).await.unwrap();

  let err = svc.stop(&admin()).await.unwrap_err();
  assert!(matches!(err, Error::NoPostsForPeriod(p) if p == june()));
  assert!(svc.status().await.unwrap().active);
  assert!(svc.results(june()).await.unwrap().is_empty());
}

#[tokio::test]
async fn cancel_ends_period_without_results() {
  let (_, svc) = service().await;
  let a = post(&svc, "A", june()).await;
  svc.start(&admin(), Some(june())).await.unwrap();

  let cancelled = svc.cancel(&admin()).await.unwrap();
  assert!(!cancelled.active);
  assert!(!svc.status().await.unwrap().active);
  assert!(svc.results(june()).await.unwrap().is_empty());
  assert!(!svc.get_post(a).await.unwrap().closed);

  // A fresh period may start after cancelling.
  svc.start(&admin(), Some(june())).await.unwrap();
}

#[tokio::test]
async fn concurrent_stops_close_the_period_once() {
  let (_, svc) = service().await;
  let a = post(&svc, "A", june()).await;
  svc.start(&admin(), Some(june())).await.unwrap();
  svc.cast_vote(&voter("x@example.com"), a).await.unwrap();

  let ad = admin();
  let (first, second) = tokio::join!(svc.stop(&ad), svc.stop(&ad));
  let (results, err) = match (first, second) {
    (Ok(results), Err(err)) | (Err(err), Ok(results)) => (results, err),
    other => panic!("expected exactly one stop to succeed, got {other:?}"),
  };
  assert!(matches!(err, Error::NoActiveVoting), "got {err:?}");
  assert_eq!(results.len(), 1);
  assert_eq!(results[0].total_votes, 1);

  assert_eq!(svc.results(june()).await.unwrap().len(), 1);
  let history = svc.history(&admin()).await.unwrap();
  assert_eq!(history.len(), 1);
  assert!(!history[0].active);
}

#[tokio::test]
async fn finalize_refuses_a_cancelled_row() {
  let (store, svc) = service().await;
  let a = post(&svc, "A", june()).await;
  let status = svc.start(&admin(), Some(june())).await.unwrap();
  svc.cancel(&admin()).await.unwrap();

  let err: Error = store
    .finalize_period(status.status_id, june(), Utc::now())
    .await
    .unwrap_err()
    .into();
  assert!(matches!(err, Error::NoActiveVoting), "got {err:?}");
  assert!(svc.results(june()).await.unwrap().is_empty());
  assert!(!svc.get_post(a).await.unwrap().closed);

  assert!(!store.deactivate_voting_period(status.status_id, Utc::now()).await.unwrap());
}

#[tokio::test]
async fn finalize_counts_votes_the_cache_has_not_seen() {
  let (store, svc) = service().await;
  let a = post(&svc, "A", june()).await;
  let status = svc.start(&admin(), Some(june())).await.unwrap();

  // Straight to the store: the post's cached count is not refreshed.
  let outcome = store.cast_vote("x@example.com".into(), a, june(), 2).await.unwrap();
  assert!(matches!(outcome, CastOutcome::Recorded(_)));
  assert_eq!(svc.get_post(a).await.unwrap().cached_votes, 0);

  let results = store
    .finalize_period(status.status_id, june(), Utc::now())
    .await
    .unwrap();
  assert_eq!(results[0].total_votes, 1);
  assert_eq!(svc.results(june()).await.unwrap()[0].total_votes, 1);
  assert_eq!(svc.get_post(a).await.unwrap().cached_votes, 1);
}

#[tokio::test]
async fn lifecycle_requires_admin() {
  let (_, svc) = service().await;
  let x = voter("x@example.com");
  assert!(matches!(svc.start(&x, None).await.unwrap_err(), Error::Forbidden(_)));
  assert!(matches!(svc.stop(&x).await.unwrap_err(), Error::Forbidden(_)));
  assert!(matches!(
    svc.create_post(&x, "t".into(), "d".into(), None, None).await.unwrap_err(),
    Error::Forbidden(_)
  ));
}

#[tokio::test]
async fn restart_replaces_results_of_same_period() {
  let (_, svc) = service().await;
  let a = post(&svc, "A", june()).await;
  svc.start(&admin(), Some(june())).await.unwrap();
  svc.cast_vote(&voter("x@example.com"), a).await.unwrap();
  svc.stop(&admin()).await.unwrap();

  let b = post(&svc, "B", june()).await;
  svc.start(&admin(), Some(june())).await.unwrap();
  let results = svc.stop(&admin()).await.unwrap();
  assert_eq!(results.len(), 1);
  assert_eq!(results[0].post_id, b);

  let stored = svc.results(june()).await.unwrap();
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0].post_id, b);
}

// ─── Posts ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn close_all_is_idempotent() {
  let (_, svc) = service().await;
  post(&svc, "A", june()).await;
  post(&svc, "B", june()).await;
  post(&svc, "Other", june().previous()).await;

  assert_eq!(svc.close_all_for_period(&admin(), june()).await.unwrap(), 2);
  assert_eq!(svc.close_all_for_period(&admin(), june()).await.unwrap(), 0);
  assert!(svc.list_open_posts(Some(june())).await.unwrap().is_empty());
  assert_eq!(svc.list_open_posts(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn posts_list_newest_first() {
  let (_, svc) = service().await;
  let first = post(&svc, "First", june()).await;
  let second = post(&svc, "Second", june()).await;

  let listed = svc
    .list_posts(PostFilter { period: Some(june()), include_closed: true })
    .await
    .unwrap();
  assert_eq!(listed.iter().map(|p| p.post_id).collect::<Vec<_>>(), vec![second, first]);
}

#[tokio::test]
async fn default_post_period_is_previous_month() {
  let (_, svc) = service().await;
  let p = svc
    .create_post(&admin(), "T".into(), "D".into(), Some("  ".into()), None)
    .await
    .unwrap();
  assert_eq!(p.period, VotingPeriod::preceding(Utc::now()));
  assert_eq!(p.link, None);
}

#[tokio::test]
async fn update_and_delete_post() {
  let (store, svc) = service().await;
  let a = post(&svc, "A", june()).await;
  svc.start(&admin(), Some(june())).await.unwrap();
  svc.cast_vote(&voter("x@example.com"), a).await.unwrap();

  let patch = PostPatch {
    title: Some("Renamed".into()),
    link:  Some("https://example.com".into()),
    ..PostPatch::default()
  };
  let updated = svc.update_post(&admin(), a, patch).await.unwrap();
  assert_eq!(updated.title, "Renamed");
  assert_eq!(updated.link.as_deref(), Some("https://example.com"));
  assert_eq!(updated.description, "A description");

  svc.delete_post(&admin(), a).await.unwrap();
  assert!(matches!(svc.get_post(a).await.unwrap_err(), Error::PostNotFound(_)));
  assert!(matches!(svc.delete_post(&admin(), a).await.unwrap_err(), Error::PostNotFound(_)));
  // Votes survive the post.
  assert_eq!(store.count_for_post(a, june()).await.unwrap(), 1);
}

#[tokio::test]
async fn sync_repairs_drifted_cache() {
  let (store, svc) = service().await;
  let a = post(&svc, "A", june()).await;
  store.cast_vote("x@example.com".into(), a, june(), 2).await.unwrap();

  let report = svc.sync_vote_counts(&admin()).await.unwrap();
  assert_eq!(report.len(), 1);
  assert_eq!((report[0].old_votes, report[0].new_votes), (0, 1));
  assert_eq!(svc.get_post(a).await.unwrap().cached_votes, 1);
}

// ─── Accounts ────────────────────────────────────────────────────────────────

fn new_user(email: &str, username: Option<&str>) -> NewUser {
  NewUser {
    name:          "Test User".into(),
    email:         email.into(),
    username:      username.map(Into::into),
    password_hash: "hash".into(),
  }
}

#[tokio::test]
async fn create_user_rejects_taken_email_and_username() {
  let s = store().await;
  s.create_user(new_user("a@example.com", Some("alice"))).await.unwrap();

  let err: Error = s
    .create_user(new_user("a@example.com", None))
    .await
    .unwrap_err()
    .into();
  assert!(matches!(err, Error::UserExists("email")));

  let err: Error = s
    .create_user(new_user("b@example.com", Some("alice")))
    .await
    .unwrap_err()
    .into();
  assert!(matches!(err, Error::UserExists("username")));
}

#[tokio::test]
async fn credentials_and_flags() {
  let s = store().await;
  let user = s.create_user(new_user("a@example.com", None)).await.unwrap();
  assert!(!user.is_whitelisted && !user.is_admin);

  let creds = s.get_credentials("a@example.com".into()).await.unwrap().unwrap();
  assert_eq!(creds.password_hash, "hash");
  assert_eq!(creds.user.user_id, user.user_id);

  let user = s.set_whitelisted("a@example.com".into(), true).await.unwrap().unwrap();
  assert!(user.is_whitelisted);
  let user = s.set_admin("a@example.com".into(), true).await.unwrap().unwrap();
  assert!(user.is_admin);
  assert!(s.set_admin("nobody@example.com".into(), true).await.unwrap().is_none());
}

#[tokio::test]
async fn profile_update_clears_and_checks_username() {
  let s = store().await;
  s.create_user(new_user("a@example.com", Some("alice"))).await.unwrap();
  let bob = s.create_user(new_user("b@example.com", None)).await.unwrap();

  let update = ProfileUpdate {
    bio: Some("hello".into()),
    ..ProfileUpdate::default()
  };
  let bob = s.update_profile(bob.user_id, update).await.unwrap().unwrap();
  assert_eq!(bob.bio.as_deref(), Some("hello"));

  let update = ProfileUpdate { bio: Some(String::new()), ..ProfileUpdate::default() };
  let bob = s.update_profile(bob.user_id, update).await.unwrap().unwrap();
  assert_eq!(bob.bio, None);

  let update = ProfileUpdate { username: Some("alice".into()), ..ProfileUpdate::default() };
  let err: Error = s.update_profile(bob.user_id, update).await.unwrap_err().into();
  assert!(matches!(err, Error::UserExists("username")));
}

#[tokio::test]
async fn sessions_expire_and_can_be_deleted() {
  let s = store().await;
  let user = s.create_user(new_user("a@example.com", None)).await.unwrap();
  let now = Utc::now();

  s.create_session("live".into(), user.user_id, now + Duration::days(30))
    .await
    .unwrap();
  s.create_session("stale".into(), user.user_id, now - Duration::seconds(1))
    .await
    .unwrap();

  let found = s.session_user("live".into(), now).await.unwrap().unwrap();
  assert_eq!(found.user_id, user.user_id);
  assert!(s.session_user("stale".into(), now).await.unwrap().is_none());
  assert!(s.session_user("missing".into(), now).await.unwrap().is_none());

  s.delete_session("live".into()).await.unwrap();
  assert!(s.session_user("live".into(), now).await.unwrap().is_none());
}

#[tokio::test]
async fn expired_and_other_sessions_are_removed() {
  let s = store().await;
  let a = s.create_user(new_user("a@example.com", None)).await.unwrap();
  let b = s.create_user(new_user("b@example.com", None)).await.unwrap();
  let now = Utc::now();
  let later = now + Duration::days(30);

  s.create_session("stale".into(), a.user_id, now - Duration::seconds(1)).await.unwrap();
  s.create_session("phone".into(), a.user_id, later).await.unwrap();
  s.create_session("laptop".into(), a.user_id, later).await.unwrap();
  s.create_session("other".into(), b.user_id, later).await.unwrap();

  assert_eq!(s.purge_expired_sessions(now).await.unwrap(), 1);
  assert_eq!(s.purge_expired_sessions(now).await.unwrap(), 0);

  assert_eq!(s.delete_other_sessions(a.user_id, "laptop".into()).await.unwrap(), 1);
  assert!(s.session_user("phone".into(), now).await.unwrap().is_none());
  assert!(s.session_user("laptop".into(), now).await.unwrap().is_some());
  assert!(s.session_user("other".into(), now).await.unwrap().is_some());
}

// ─── Library ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn announcements_crud() {
  let s = store().await;
  let input = |title: &str, active| NewAnnouncement {
    title:    title.into(),
    content:  "body".into(),
    priority: Priority::High,
    active,
  };

  let live = s
    .create_announcement(input("Live", true), "admin@example.com".into())
    .await
    .unwrap();
  s.create_announcement(input("Hidden", false), "admin@example.com".into())
    .await
    .unwrap();

  assert_eq!(s.list_announcements(false).await.unwrap().len(), 2);
  let active = s.list_announcements(true).await.unwrap();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].priority, Priority::High);

  let updated = s
    .update_announcement(live.announcement_id, input("Renamed", false))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.title, "Renamed");
  assert!(s.list_announcements(true).await.unwrap().is_empty());

  assert!(s.delete_announcement(live.announcement_id).await.unwrap());
  assert!(!s.delete_announcement(live.announcement_id).await.unwrap());
  assert!(s.update_announcement(live.announcement_id, input("x", true)).await.unwrap().is_none());
}

#[tokio::test]
async fn assets_filter_by_kind() {
  let s = store().await;
  let asset = |kind| NewAsset {
    title:       "Logo".into(),
    description: None,
    drive_link:  "https://drive.example.com/logo".into(),
    kind,
    category:    Some("brand".into()),
  };
  let banner = s.create_asset(asset(AssetKind::Banner)).await.unwrap();
  s.create_asset(asset(AssetKind::Image)).await.unwrap();

  assert_eq!(s.list_assets(None).await.unwrap().len(), 2);
  let banners = s.list_assets(Some(AssetKind::Banner)).await.unwrap();
  assert_eq!(banners.len(), 1);
  assert_eq!(banners[0].asset_id, banner.asset_id);

  let moved = s
    .update_asset(banner.asset_id, asset(AssetKind::Video))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(moved.kind, AssetKind::Video);
  assert!(s.delete_asset(banner.asset_id).await.unwrap());
}

#[tokio::test]
async fn recordings_most_recent_first() {
  let s = store().await;
  let rec = |title: &str, days_ago| NewRecording {
    title:         title.into(),
    description:   None,
    drive_link:    "https://drive.example.com/rec".into(),
    recorded_on:   Utc::now() - Duration::days(days_ago),
    thumbnail_url: None,
    duration:      Some("1h".into()),
  };
  s.create_recording(rec("Older", 14)).await.unwrap();
  let newer = s.create_recording(rec("Newer", 7)).await.unwrap();

  let listed = s.list_recordings().await.unwrap();
  assert_eq!(listed.first().map(|r| r.recording_id), Some(newer.recording_id));

  let renamed = s
    .update_recording(newer.recording_id, rec("Renamed", 7))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(renamed.title, "Renamed");
  assert!(s.delete_recording(newer.recording_id).await.unwrap());
}

#[tokio::test]
async fn submissions_review_flow() {
  let s = store().await;
  let input = NewSubmission {
    twitter_handle:   "@maker".into(),
    discord_username: "maker#1".into(),
    content_link:     "https://x.com/maker/1".into(),
    content_type:     ContentType::StreamClip,
    title:            Some("Clip".into()),
    description:      None,
  };
  let sub = s
    .create_submission(input, "maker@example.com".into())
    .await
    .unwrap();
  assert_eq!(sub.status, SubmissionStatus::Pending);

  assert_eq!(s.list_submissions(None).await.unwrap().len(), 1);
  assert_eq!(
    s.list_submissions(Some("maker@example.com".into())).await.unwrap().len(),
    1
  );
  assert!(s.list_submissions(Some("other@example.com".into())).await.unwrap().is_empty());

  let review = SubmissionReview {
    status:      SubmissionStatus::Approved,
    admin_notes: Some("great".into()),
  };
  let reviewed = s
    .review_submission(sub.submission_id, review)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(reviewed.status, SubmissionStatus::Approved);
  assert_eq!(reviewed.content_type, ContentType::StreamClip);
  assert_eq!(reviewed.admin_notes.as_deref(), Some("great"));

  assert!(s.delete_submission(sub.submission_id).await.unwrap());
}

#[tokio::test]
async fn posts_survive_reopen_on_disk() {
  let dir = std::env::temp_dir().join(format!("agora-test-{}", Uuid::new_v4()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("agora.db");

  let id = {
    let s = SqliteStore::open(&path).await.unwrap();
    s.create_post(NewPost {
      title:       "Persisted".into(),
      description: "d".into(),
      link:        None,
      period:      june(),
    })
    .await
    .unwrap()
    .post_id
  };

  let s = SqliteStore::open(&path).await.unwrap();
  let p = s.get_post(id).await.unwrap().unwrap();
  assert_eq!(p.title, "Persisted");
  assert_eq!(p.period, june());

  let _ = std::fs::remove_dir_all(&dir);
}
