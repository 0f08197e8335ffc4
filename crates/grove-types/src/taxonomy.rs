//! The fixed life-area taxonomy that sprouts, leaves, and reflections
//! attach to.
//!
//! The tree has [`BRANCH_COUNT`] branches, each with [`TWIGS_PER_BRANCH`]
//! twigs. A twig is addressed by the string id `branch-{b}-twig-{t}`; that
//! string is what travels in events, so the parser here is the only place
//! allowed to decide whether a twig reference is valid.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Number of branches on the tree.
pub const BRANCH_COUNT: u8 = 8;

/// Number of twigs on every branch.
pub const TWIGS_PER_BRANCH: u8 = 8;

/// A twig reference that does not name a node of the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTwig(pub String);

/// Identifier of one twig in the fixed taxonomy.
///
/// Always holds a canonical `branch-{b}-twig-{t}` string with both indices
/// in range. Deserialization rejects anything else.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(try_from = "String", into = "String")]
#[ts(export, export_to = "bindings/")]
pub struct TwigId(String);

impl TwigId {
    /// Build the id of twig `twig` on branch `branch`.
    ///
    /// Returns `None` if either index is outside the taxonomy.
    pub fn new(branch: u8, twig: u8) -> Option<Self> {
        (branch < BRANCH_COUNT && twig < TWIGS_PER_BRANCH)
            .then(|| Self(format!("branch-{branch}-twig-{twig}")))
    }

    /// Parse a twig id string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTwig`] unless the string is exactly
    /// `branch-{b}-twig-{t}` with in-range decimal indices.
    pub fn parse(raw: &str) -> Result<Self, InvalidTwig> {
        split_indices(raw)
            .and_then(|(branch, twig)| Self::new(branch, twig))
            .filter(|twig| twig.0 == raw)
            .ok_or_else(|| InvalidTwig(raw.to_owned()))
    }

    /// Every twig in the taxonomy, branch-major order.
    pub fn all() -> Vec<Self> {
        (0..BRANCH_COUNT)
            .flat_map(|b| (0..TWIGS_PER_BRANCH).filter_map(move |t| Self::new(b, t)))
            .collect()
    }

    /// Index of the branch this twig grows on.
    pub fn branch(&self) -> u8 {
        split_indices(&self.0).map_or(0, |(b, _)| b)
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Extract `(branch, twig)` from `branch-{b}-twig-{t}` without range checks.
fn split_indices(raw: &str) -> Option<(u8, u8)> {
    let rest = raw.strip_prefix("branch-")?;
    let (branch, twig) = rest.split_once("-twig-")?;
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit());
    if !all_digits(branch) || !all_digits(twig) {
        return None;
    }
    Some((branch.parse().ok()?, twig.parse().ok()?))
}

impl TryFrom<String> for TwigId {
    type Error = InvalidTwig;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<TwigId> for String {
    fn from(id: TwigId) -> Self {
        id.0
    }
}

impl core::fmt::Display for TwigId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::fmt::Display for InvalidTwig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "not a twig of the taxonomy: {:?}", self.0)
    }
}

impl std::error::Error for InvalidTwig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_has_sixty_four_twigs() {
        let all = TwigId::all();
        assert_eq!(all.len(), 64);
        assert_eq!(all.first().map(TwigId::as_str), Some("branch-0-twig-0"));
        assert_eq!(all.last().map(TwigId::as_str), Some("branch-7-twig-7"));
    }

    #[test]
    fn parse_accepts_canonical_ids() {
        let twig = TwigId::parse("branch-3-twig-5");
        assert!(twig.is_ok());
        assert_eq!(twig.map(|t| t.branch()).ok(), Some(3));
    }

    #[test]
    fn parse_rejects_out_of_range_and_garbage() {
        for raw in [
            "branch-8-twig-0",
            "branch-0-twig-8",
            "branch--twig-1",
            "branch-+1-twig-1",
            "twig-1",
            "branch-1-twig-1-extra",
            "branch-01-twig-1",
            "",
        ] {
            assert!(TwigId::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn serde_rejects_unknown_twig() {
        let ok: Result<TwigId, _> = serde_json::from_str("\"branch-0-twig-1\"");
        assert!(ok.is_ok());
        let bad: Result<TwigId, _> = serde_json::from_str("\"branch-9-twig-1\"");
        assert!(bad.is_err());
    }
}
