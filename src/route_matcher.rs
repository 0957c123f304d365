//! Compiled segment matchers
//!
//! A [`SegmentMatcher`] is the compiled form of one pattern segment:
//!
//! - **Static**: an exact literal, rendered as an escaped regex fragment
//! - **Param**: a constraint regex capturing one or more named parameters
//!
//! Matchers from different routes are OR-combined into a single regex per
//! dispatch bucket, so condition expressions take a *unique key* that
//! keeps capture-group names collision-free, and structurally identical
//! matchers can merge their parameter keys instead of emitting duplicate
//! branches. Structural hashes are FNV-1a rather than `std` hashing
//! because they are persisted in the cache artifact and must be stable
//! across processes.

use crate::route_segment::{DEFAULT_PARAM_PATTERN, Segment};
use std::collections::BTreeMap;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a, folded over `bytes` starting from `seed`
pub(crate) fn fnv1a(bytes: &[u8], seed: u64) -> u64 {
    let mut hash = seed;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

pub(crate) const FNV_SEED: u64 = FNV_OFFSET;

/// Matches one literal path segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticMatcher {
    text: String,
}

impl StaticMatcher {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Regex fragment performing a direct equality test on the segment
    pub fn condition_expression(&self) -> String {
        regex::escape(&self.text)
    }

    pub fn hash(&self) -> u64 {
        fnv1a(self.text.as_bytes(), fnv1a(&[0], FNV_SEED))
    }
}

/// Matches one parameterized path segment.
///
/// Holds the constraint regex plus the parameter keys its capture groups
/// produce, ordered by capture position. After merging, a position can
/// carry several alias names; the first one is the primary name used for
/// group naming and extraction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterMatcher {
    pattern: String,
    keys: BTreeMap<usize, Vec<String>>,
    optional: bool,
}

impl ParameterMatcher {
    pub fn new(name: impl Into<String>, constraint: Option<&str>, optional: bool) -> Self {
        let mut keys = BTreeMap::new();
        keys.insert(0, vec![name.into()]);
        Self {
            pattern: constraint.unwrap_or(DEFAULT_PARAM_PATTERN).to_string(),
            keys,
            optional,
        }
    }

    /// The constraint regex this matcher tests segments against
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Ordered parameter keys, by capture position
    pub fn parameter_keys(&self) -> &BTreeMap<usize, Vec<String>> {
        &self.keys
    }

    /// Union another matcher's parameter keys into this one.
    ///
    /// Only meaningful for structurally identical matchers (equal
    /// [`hash`](Self::hash)): the shared capture group then serves every
    /// merged route.
    pub fn merge_parameter_keys(&mut self, other: &ParameterMatcher) {
        for (position, names) in &other.keys {
            let entry = self.keys.entry(*position).or_default();
            for name in names {
                if !entry.contains(name) {
                    entry.push(name.clone());
                }
            }
        }
    }

    /// Regex fragment capturing this parameter under a collision-free
    /// group name derived from `unique_key`
    pub fn condition_expression(&self, unique_key: &str) -> String {
        let mut expression = String::new();
        for (position, names) in &self.keys {
            let primary = &names[0];
            expression.push_str(&format!(
                "(?P<{primary}_{unique_key}_{position}>{})",
                self.pattern
            ));
        }
        expression
    }

    /// `(capture-group name, parameter name)` pairs a successful match of
    /// this matcher produces, in position order
    pub fn matched_parameter_expressions(&self, unique_key: &str) -> Vec<(String, String)> {
        self.keys
            .iter()
            .map(|(position, names)| {
                let primary = &names[0];
                (
                    format!("{primary}_{unique_key}_{position}"),
                    primary.clone(),
                )
            })
            .collect()
    }

    /// Structural hash: constraint regex only. Parameter names are
    /// deliberately excluded so routes differing only in naming merge.
    pub fn hash(&self) -> u64 {
        fnv1a(self.pattern.as_bytes(), fnv1a(&[1], FNV_SEED))
    }
}

/// The compiled matching primitive for one pattern segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SegmentMatcher {
    Static(StaticMatcher),
    Param(ParameterMatcher),
}

impl SegmentMatcher {
    pub fn from_segment(segment: &Segment) -> Self {
        match segment {
            Segment::Static(text) => SegmentMatcher::Static(StaticMatcher::new(text.clone())),
            Segment::Param {
                name,
                constraint,
                optional,
            } => SegmentMatcher::Param(ParameterMatcher::new(
                name.clone(),
                constraint.as_deref(),
                *optional,
            )),
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, SegmentMatcher::Static(_))
    }

    pub fn is_optional(&self) -> bool {
        match self {
            SegmentMatcher::Static(_) => false,
            SegmentMatcher::Param(param) => param.is_optional(),
        }
    }

    /// Parameter names this matcher produces, in position order
    pub fn parameter_names(&self) -> Vec<&str> {
        match self {
            SegmentMatcher::Static(_) => Vec::new(),
            SegmentMatcher::Param(param) => param
                .parameter_keys()
                .values()
                .map(|names| names[0].as_str())
                .collect(),
        }
    }

    pub fn condition_expression(&self, unique_key: &str) -> String {
        match self {
            SegmentMatcher::Static(matcher) => matcher.condition_expression(),
            SegmentMatcher::Param(matcher) => matcher.condition_expression(unique_key),
        }
    }

    pub fn matched_parameter_expressions(&self, unique_key: &str) -> Vec<(String, String)> {
        match self {
            SegmentMatcher::Static(_) => Vec::new(),
            SegmentMatcher::Param(matcher) => matcher.matched_parameter_expressions(unique_key),
        }
    }

    /// Merge parameter keys from a structurally identical matcher.
    /// Static matchers have no keys, so the merge is a no-op for them.
    pub fn merge_parameter_keys(&mut self, other: &SegmentMatcher) {
        if let (SegmentMatcher::Param(own), SegmentMatcher::Param(theirs)) = (self, other) {
            own.merge_parameter_keys(theirs);
        }
    }

    pub fn hash(&self) -> u64 {
        match self {
            SegmentMatcher::Static(matcher) => matcher.hash(),
            SegmentMatcher::Param(matcher) => matcher.hash(),
        }
    }
}

/// Structural hash of a whole matcher chain, used to de-duplicate
/// branches within a dispatch bucket
pub(crate) fn chain_hash(matchers: &[SegmentMatcher]) -> u64 {
    let mut hash = FNV_SEED;
    for matcher in matchers {
        hash = fnv1a(&matcher.hash().to_le_bytes(), hash);
    }
    hash
}
