//! Voting period labels.
//!
//! A voting period is one calendar month. Its canonical label, e.g.
//! `"June 2025"`, is what gets stored on posts, votes and results, so the
//! `Display` and `FromStr` forms must stay in sync.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

const MONTH_NAMES: [&str; 12] = [
  "January",
  "February",
  "March",
  "April",
  "May",
  "June",
  "July",
  "August",
  "September",
  "October",
  "November",
  "December",
];

/// A calendar month that votes, posts and results are grouped under.
///
/// Ordering is chronological: fields are compared year first.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "String", try_from = "String")]
pub struct VotingPeriod {
  year:  i32,
  month: u32,
}

impl VotingPeriod {
  /// Build a period from a year and a 1-based month.
  pub fn new(year: i32, month: u32) -> Result<Self, Error> {
    if !(1..=12).contains(&month) {
      return Err(Error::InvalidPeriod(format!("{month}/{year}")));
    }
    Ok(Self { year, month })
  }

  /// The period of the calendar month containing `at`.
  pub fn containing(at: DateTime<Utc>) -> Self {
    Self { year: at.year(), month: at.month() }
  }

  /// The period of the calendar month before the one containing `at`.
  ///
  /// Content produced during a month is voted on as part of the previous
  /// month's recap.
  pub fn preceding(at: DateTime<Utc>) -> Self { Self::containing(at).previous() }

  pub fn previous(self) -> Self {
    if self.month == 1 {
      Self { year: self.year - 1, month: 12 }
    } else {
      Self { year: self.year, month: self.month - 1 }
    }
  }

  pub fn year(&self) -> i32 { self.year }

  pub fn month(&self) -> u32 { self.month }

  pub fn month_name(&self) -> &'static str {
    MONTH_NAMES[(self.month - 1) as usize]
  }
}

impl fmt::Display for VotingPeriod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.month_name(), self.year)
  }
}

impl FromStr for VotingPeriod {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || Error::InvalidPeriod(s.to_owned());

    let (month, year) = s.trim().split_once(' ').ok_or_else(invalid)?;
    let month = MONTH_NAMES
      .iter()
      .position(|name| name.eq_ignore_ascii_case(month.trim()))
      .ok_or_else(invalid)?;
    let year: i32 = year.trim().parse().map_err(|_| invalid())?;

    Ok(Self { year, month: month as u32 + 1 })
  }
}

impl From<VotingPeriod> for String {
  fn from(p: VotingPeriod) -> Self { p.to_string() }
}

impl TryFrom<String> for VotingPeriod {
  type Error = Error;

  fn try_from(s: String) -> Result<Self, Self::Error> { s.parse() }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
  }

  #[test]
  fn label_for_current_month() {
    assert_eq!(VotingPeriod::containing(at(2025, 6, 3)).to_string(), "June 2025");
  }

  #[test]
  fn preceding_mid_year() {
    assert_eq!(
      VotingPeriod::preceding(at(2025, 9, 15)).to_string(),
      "August 2025"
    );
  }

  #[test]
  fn preceding_wraps_to_december() {
    assert_eq!(
      VotingPeriod::preceding(at(2025, 1, 10)).to_string(),
      "December 2024"
    );
  }

  #[test]
  fn parse_is_case_insensitive() {
    let p: VotingPeriod = "june 2025".parse().unwrap();
    assert_eq!(p, VotingPeriod::new(2025, 6).unwrap());
    assert_eq!(p.to_string(), "June 2025");
  }

  #[test]
  fn parse_rejects_garbage() {
    assert!("Juneuary 2025".parse::<VotingPeriod>().is_err());
    assert!("June".parse::<VotingPeriod>().is_err());
    assert!("June twenty".parse::<VotingPeriod>().is_err());
    assert!(VotingPeriod::new(2025, 13).is_err());
  }

  #[test]
  fn ordering_is_chronological() {
    let dec: VotingPeriod = "December 2024".parse().unwrap();
    let jan: VotingPeriod = "January 2025".parse().unwrap();
    let aug: VotingPeriod = "August 2025".parse().unwrap();
    let mut periods = vec![aug, dec, jan];
    periods.sort();
    assert_eq!(periods, vec![dec, jan, aug]);
  }

  #[test]
  fn serializes_as_label() {
    let p = VotingPeriod::new(2025, 6).unwrap();
    assert_eq!(serde_json::to_string(&p).unwrap(), "\"June 2025\"");
    let back: VotingPeriod = serde_json::from_str("\"June 2025\"").unwrap();
    assert_eq!(back, p);
  }
}
