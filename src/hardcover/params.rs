//! List parameters: status filter, page size and sort order.
//!
//! A [`ListKey`] identifies one tracked list in the cache. Two views asking
//! for the same status, limit and sort share the same cached list.

use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
  #[error("unknown book status '{0}' (expected one of: tbr, reading, read, paused, dnf)")]
  Status(String),
  #[error("invalid sort '{0}' (expected progress|added|updated, optionally followed by .asc or .desc)")]
  Sort(String),
  #[error("limit must be at least 1")]
  Limit,
}

/// Shelf status of a user book, with Hardcover's numeric ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum BookStatus {
  Tbr,
  #[default]
  Reading,
  Read,
  Paused,
  Dnf,
  Ignored,
}

impl BookStatus {
  pub fn id(self) -> i64 {
    match self {
      Self::Tbr => 1,
      Self::Reading => 2,
      Self::Read => 3,
      Self::Paused => 4,
      Self::Dnf => 5,
      Self::Ignored => 6,
    }
  }

  pub fn from_id(id: i64) -> Option<Self> {
    match id {
      1 => Some(Self::Tbr),
      2 => Some(Self::Reading),
      3 => Some(Self::Read),
      4 => Some(Self::Paused),
      5 => Some(Self::Dnf),
      6 => Some(Self::Ignored),
      _ => None,
    }
  }

  pub fn key(self) -> &'static str {
    match self {
      Self::Tbr => "tbr",
      Self::Reading => "reading",
      Self::Read => "read",
      Self::Paused => "paused",
      Self::Dnf => "dnf",
      Self::Ignored => "ignored",
    }
  }

  /// Phrase used in empty-list messages ("No books you ...")
  pub fn label(self) -> &'static str {
    match self {
      Self::Tbr => "want to read",
      Self::Reading => "are currently reading",
      Self::Read => "have finished reading",
      Self::Paused => "have paused reading",
      Self::Dnf => "did not finish reading",
      Self::Ignored => "have ignored",
    }
  }

  /// Sort applied when a list is requested without one
  pub fn default_sort(self) -> SortSpec {
    match self {
      Self::Tbr => SortSpec::new(SortType::Added, SortDirection::Desc),
      _ => SortSpec::new(SortType::Updated, SortDirection::Desc),
    }
  }
}

impl FromStr for BookStatus {
  type Err = ParamError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "tbr" => Ok(Self::Tbr),
      "reading" => Ok(Self::Reading),
      "read" => Ok(Self::Read),
      "paused" => Ok(Self::Paused),
      "dnf" => Ok(Self::Dnf),
      _ => Err(ParamError::Status(s.to_string())),
    }
  }
}

impl TryFrom<String> for BookStatus {
  type Error = ParamError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl fmt::Display for BookStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.key())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortType {
  Progress,
  Added,
  Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
  Asc,
  #[default]
  Desc,
}

/// Sort order for a list, written as `type[.direction]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct SortSpec {
  pub sort_type: SortType,
  pub direction: SortDirection,
}

impl SortSpec {
  pub const fn new(sort_type: SortType, direction: SortDirection) -> Self {
    Self {
      sort_type,
      direction,
    }
  }

  /// GraphQL `order_by` argument for the user_books query
  pub fn order_by(&self) -> Value {
    let dir = match self.direction {
      SortDirection::Asc => "asc_nulls_last",
      SortDirection::Desc => "desc_nulls_last",
    };

    let clause = match self.sort_type {
      SortType::Progress => json!({ "user_book_reads_aggregate": { "max": { "progress": dir } } }),
      SortType::Added => json!({ "date_added": dir }),
      SortType::Updated => json!({ "reading_journal_summary": { "last_updated_at": dir } }),
    };
    json!([clause])
  }
}

impl FromStr for SortSpec {
  type Err = ParamError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || ParamError::Sort(s.to_string());
    let (ty, dir) = match s.trim().split_once('.') {
      Some((ty, dir)) => (ty, Some(dir)),
      None => (s.trim(), None),
    };

    let sort_type = match ty {
      "progress" => SortType::Progress,
      "added" => SortType::Added,
      "updated" => SortType::Updated,
      _ => return Err(invalid()),
    };
    let direction = match dir {
      None => SortDirection::Desc,
      Some("asc") => SortDirection::Asc,
      Some("desc") => SortDirection::Desc,
      Some(_) => return Err(invalid()),
    };

    Ok(Self::new(sort_type, direction))
  }
}

impl TryFrom<String> for SortSpec {
  type Error = ParamError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl fmt::Display for SortSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let ty = match self.sort_type {
      SortType::Progress => "progress",
      SortType::Added => "added",
      SortType::Updated => "updated",
    };
    let dir = match self.direction {
      SortDirection::Asc => "asc",
      SortDirection::Desc => "desc",
    };
    write!(f, "{}.{}", ty, dir)
  }
}

/// Composite key of a tracked list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListKey {
  pub status: BookStatus,
  pub limit: u32,
  pub sort: SortSpec,
}

impl ListKey {
  pub fn new(status: BookStatus, limit: u32, sort: Option<SortSpec>) -> Result<Self, ParamError> {
    if limit == 0 {
      return Err(ParamError::Limit);
    }
    Ok(Self {
      status,
      limit,
      sort: sort.unwrap_or_else(|| status.default_sort()),
    })
  }

  /// Human-readable description for logs and titles
  pub fn description(&self) -> String {
    format!("{} (limit {}, sort {})", self.status, self.limit, self.sort)
  }
}

impl Default for ListKey {
  fn default() -> Self {
    let status = BookStatus::default();
    Self {
      status,
      limit: DEFAULT_LIMIT,
      sort: status.default_sort(),
    }
  }
}
