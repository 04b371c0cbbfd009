use crate::utils::git::{Describer, DIRTY_MARKER};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum hash length requested from `git describe`.
pub const ABBREV: usize = 8;

/// Version used whenever no tag has ever been created.
pub const ZERO_VERSION: &str = "0.0.0";

/// `post` value meaning "not applicable".
pub const NO_POST: &str = "-1";

lazy_static! {
    // [v]<tag>-<distance>-g<hash>[-dirty]
    static ref DESCRIBE: Regex =
        Regex::new(r"^v?(?P<tag>.+)-(?P<post>[0-9]+)-g(?P<commit>[0-9A-Za-z]+)(?P<dirty>-dirty)?$")
            .expect("invalid describe pattern");
}

/// Everything known about the version of a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    #[serde(rename = "pep386")]
    pub normalized: String,
    pub short: String,
    pub long: String,
    pub date: String,
    pub dirty: bool,
    pub commit: String,
    pub post: String,
}

impl VersionRecord {
    /// The record used when neither git nor a persisted copy is available.
    pub fn fallback() -> Self {
        VersionRecord {
            normalized: ZERO_VERSION.to_string(),
            short: ZERO_VERSION.to_string(),
            long: ZERO_VERSION.to_string(),
            date: String::new(),
            dirty: false,
            commit: String::new(),
            post: NO_POST.to_string(),
        }
    }

    /// `post` as a number. The field always holds a base-10 integer.
    pub fn post_number(&self) -> i64 {
        self.post.parse().unwrap_or(-1)
    }

    pub fn is_release(&self) -> bool {
        self.normalized == self.short
    }
}

impl fmt::Display for VersionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized)
    }
}

/// Literal text purged from the describe output before it is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovePattern {
    Single(String),
    Many(Vec<String>),
}

impl RemovePattern {
    /// Removes every occurrence of each pattern, in order. Absent patterns are no-ops.
    pub fn apply(&self, s: &str) -> String {
        match self {
            RemovePattern::Single(p) => remove_literal(s, p),
            RemovePattern::Many(ps) => ps
                .iter()
                .fold(s.to_string(), |acc, p| remove_literal(&acc, p)),
        }
    }
}

fn remove_literal(s: &str, pattern: &str) -> String {
    if pattern.is_empty() {
        return s.to_string();
    }
    s.replace(pattern, "")
}

impl From<&str> for RemovePattern {
    fn from(p: &str) -> Self {
        RemovePattern::Single(p.to_string())
    }
}

impl From<String> for RemovePattern {
    fn from(p: String) -> Self {
        RemovePattern::Single(p)
    }
}

impl From<Vec<String>> for RemovePattern {
    fn from(ps: Vec<String>) -> Self {
        RemovePattern::Many(ps)
    }
}

impl From<Vec<&str>> for RemovePattern {
    fn from(ps: Vec<&str>) -> Self {
        RemovePattern::Many(ps.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for RemovePattern {
    fn from(ps: &[&str]) -> Self {
        RemovePattern::Many(ps.iter().map(|p| p.to_string()).collect())
    }
}

/// Turns describe output into a [`VersionRecord`].
#[derive(Debug, Clone)]
pub struct VersionResolver<D> {
    describer: D,
    abbrev: usize,
}

impl<D: Describer> VersionResolver<D> {
    pub fn new(describer: D) -> Self {
        VersionResolver {
            describer,
            abbrev: ABBREV,
        }
    }

    pub fn abbrev(mut self, abbrev: usize) -> Self {
        self.abbrev = abbrev;
        self
    }

    pub fn describer(&self) -> &D {
        &self.describer
    }

    /// Resolves the current version, or `None` when there is no repository.
    pub fn resolve(&self, remove: Option<&RemovePattern>) -> Option<VersionRecord> {
        let described = self.describer.describe(self.abbrev)?;
        let date = self.describer.log_date(&described).unwrap_or_default();

        let long = match remove {
            Some(pattern) => pattern.apply(&described),
            None => described,
        };
        debug!("describe output: {}", long);

        let parsed = DESCRIBE.captures(&long).map(|caps| {
            (
                caps["tag"].to_string(),
                caps["post"].to_string(),
                caps["commit"].to_string(),
                caps.name("dirty").is_some(),
            )
        });

        let record = match parsed {
            Some((short, post, commit, dirty)) => {
                //any nonzero digit makes the distance positive, however long
                let normalized = if post.bytes().any(|b| b != b'0') {
                    dev_version(&short, &post, &commit)
                } else {
                    short.clone()
                };
                let long = if dirty {
                    long[..long.len() - DIRTY_MARKER.len()].to_string()
                } else {
                    long
                };

                VersionRecord {
                    normalized,
                    short,
                    long,
                    date,
                    dirty,
                    commit,
                    post,
                }
            }
            None => {
                //no tag reachable, describe gave us a bare object name
                let dirty = long.ends_with(DIRTY_MARKER);
                let commit = if dirty {
                    long[..long.len() - DIRTY_MARKER.len()].to_string()
                } else {
                    long
                };
                let post = self
                    .describer
                    .commit_count(&commit)
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| NO_POST.to_string());

                let normalized = match post.parse::<i64>() {
                    Ok(n) if n != 0 => dev_version(ZERO_VERSION, &post, &commit),
                    _ => ZERO_VERSION.to_string(),
                };

                VersionRecord {
                    normalized,
                    short: ZERO_VERSION.to_string(),
                    long: ZERO_VERSION.to_string(),
                    date,
                    dirty,
                    commit,
                    post,
                }
            }
        };

        Some(record)
    }
}

fn dev_version(short: &str, post: &str, commit: &str) -> String {
    format!("{}.dev{}+g{}", short, post, commit)
}
