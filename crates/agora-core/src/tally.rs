//! Ranking of a period's posts into a results snapshot.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  ballot::{PostTally, UNKNOWN_AUTHOR_EMAIL, UNKNOWN_AUTHOR_NAME, VotingResult},
  period::VotingPeriod,
};

/// Rank `tallies` by vote count, highest first.
///
/// The sort is stable: posts with equal counts keep their input order, which
/// the store supplies newest first. Ranks are 1-based and contiguous.
pub fn rank(
  period: VotingPeriod,
  mut tallies: Vec<PostTally>,
  now: DateTime<Utc>,
) -> Vec<VotingResult> {
  tallies.sort_by(|a, b| b.votes.cmp(&a.votes));

  tallies
    .into_iter()
    .enumerate()
    .map(|(i, t)| VotingResult {
      result_id:    Uuid::new_v4(),
      post_id:      t.post.post_id,
      title:        t.post.title,
      description:  t.post.description,
      link:         t.post.link,
      author_email: UNKNOWN_AUTHOR_EMAIL.to_owned(),
      author_name:  UNKNOWN_AUTHOR_NAME.to_owned(),
      total_votes:  t.votes,
      rank:         i as u32 + 1,
      period,
      created_at:   now,
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ballot::Post;

  fn tally(title: &str, votes: u32) -> PostTally {
    PostTally {
      post: Post {
        post_id:      Uuid::new_v4(),
        title:        title.into(),
        description:  format!("{title} description"),
        link:         None,
        cached_votes: 0,
        period:       june(),
        closed:       false,
        created_at:   Utc::now(),
      },
      votes,
    }
  }

  fn june() -> VotingPeriod { VotingPeriod::new(2025, 6).unwrap() }

  #[test]
  fn ranks_descending_by_votes() {
    let results = rank(
      june(),
      vec![tally("b", 1), tally("c", 5), tally("a", 3)],
      Utc::now(),
    );
    let order: Vec<_> = results.iter().map(|r| (r.title.as_str(), r.rank)).collect();
    assert_eq!(order, vec![("c", 1), ("a", 2), ("b", 3)]);
  }

  #[test]
  fn ties_keep_input_order() {
    let results = rank(
      june(),
      vec![tally("first", 2), tally("second", 2), tally("third", 4)],
      Utc::now(),
    );
    let titles: Vec<_> = results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["third", "first", "second"]);
  }

  #[test]
  fn ranks_are_contiguous_and_carry_placeholders() {
    let results = rank(
      june(),
      vec![tally("x", 0), tally("y", 0), tally("z", 0)],
      Utc::now(),
    );
    let ranks: Vec<_> = results.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    assert!(results.iter().all(|r| r.period == june()));
    assert!(results.iter().all(|r| r.author_name == UNKNOWN_AUTHOR_NAME));
  }

  #[test]
  fn empty_input_yields_no_results() {
    assert!(rank(june(), Vec::new(), Utc::now()).is_empty());
  }
}
