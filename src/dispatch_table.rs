//! Compiled dispatch tables
//!
//! The table turns a [`RouteCollection`] into the structure dispatch
//! actually runs against:
//!
//! - **Per-method buckets**: routes are grouped by HTTP method, then by
//!   segment count, so a request only ever consults one bucket.
//! - **Combined expressions**: every route chain in a bucket becomes one
//!   alternative of a single anchored regex. An empty named marker group
//!   `(?P<r{i}>)` prefixes each alternative and identifies the winning
//!   branch after a match, keeping match cost proportional to buckets
//!   rather than routes. Alternation order is insertion order, so the
//!   first-registered route wins ties.
//! - **Cache artifact**: the table serializes to JSON carrying a format
//!   version and the source collection's fingerprint; both are checked
//!   before a cached table is trusted.
//!
//! Structurally identical chains are merged into one branch via
//! [`SegmentMatcher::merge_parameter_keys`], which keeps the compiled
//! expression sub-linear in route count.

use crate::route_matcher::{SegmentMatcher, StaticMatcher, chain_hash};
use crate::{Error, Route, RouteCollection};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};

/// Serialization format version; bump when the table structure changes
pub const FORMAT_VERSION: u32 = 1;

// ============================================================================
// Match Outcomes
// ============================================================================

/// Terminal outcome of one dispatch call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteMatch {
    /// No route matches the method + path
    NotFound,
    /// Exactly one route matched
    Found {
        identifier: String,
        params: HashMap<String, String>,
    },
    /// The path matches under other methods only
    MethodNotAllowed { allowed: Vec<String> },
}

impl RouteMatch {
    pub const NOT_FOUND: u8 = 0;
    pub const FOUND: u8 = 1;
    pub const HTTP_METHOD_NOT_ALLOWED: u8 = 2;

    /// Contract constant for this outcome
    pub fn outcome_code(&self) -> u8 {
        match self {
            RouteMatch::NotFound => Self::NOT_FOUND,
            RouteMatch::Found { .. } => Self::FOUND,
            RouteMatch::MethodNotAllowed { .. } => Self::HTTP_METHOD_NOT_ALLOWED,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, RouteMatch::Found { .. })
    }
}

// ============================================================================
// Table Structure
// ============================================================================

/// One alternative of a bucket's combined expression.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Branch {
    /// Identifier of the route this branch resolves to
    pub route: String,
    /// Name of the empty marker group identifying this branch
    pub marker: String,
    /// `(capture-group, parameter-name)` pairs, in parameter order
    pub params: Vec<(String, String)>,
    /// Values for optional parameters this truncated chain omits
    pub defaults: Vec<(String, String)>,
}

/// All routes of one method sharing a segment count, combined into a
/// single anchored regex.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bucket {
    expression: String,
    branches: Vec<Branch>,
    #[serde(skip)]
    regex: OnceLock<Regex>,
}

impl Bucket {
    /// The combined regex source for this bucket
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    // The regex is rebuilt lazily after deserialization; the expression
    // string is the persisted form.
    fn regex(&self) -> Result<&Regex, Error> {
        if let Some(regex) = self.regex.get() {
            return Ok(regex);
        }
        let compiled = Regex::new(&self.expression)
            .map_err(|e| Error::Cache(format!("invalid compiled expression: {e}")))?;
        Ok(self.regex.get_or_init(|| compiled))
    }

    fn is_match(&self, path: &str) -> Result<bool, Error> {
        Ok(self.regex()?.is_match(path))
    }

    fn match_path(&self, path: &str) -> Result<Option<(String, HashMap<String, String>)>, Error> {
        let Some(caps) = self.regex()?.captures(path) else {
            return Ok(None);
        };

        // Exactly one alternative participates in a match; its marker
        // group tells us which.
        for branch in &self.branches {
            if caps.name(&branch.marker).is_none() {
                continue;
            }

            let mut params = HashMap::new();
            for (group, name) in &branch.params {
                if let Some(value) = caps.name(group) {
                    params.insert(name.clone(), value.as_str().to_string());
                }
            }
            for (name, value) in &branch.defaults {
                params
                    .entry(name.clone())
                    .or_insert_with(|| value.clone());
            }
            return Ok(Some((branch.route.clone(), params)));
        }

        Ok(None)
    }
}

/// The compiled, cacheable form of a route collection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompiledTable {
    version: u32,
    fingerprint: u64,
    methods: BTreeMap<String, BTreeMap<usize, Bucket>>,
}

impl CompiledTable {
    /// Compile a route collection into its dispatch table.
    ///
    /// Deterministic: the same collection always produces a
    /// byte-identical serialized table.
    pub fn compile(collection: &RouteCollection) -> Result<Self, Error> {
        let mut builders: BTreeMap<String, BTreeMap<usize, BucketBuilder>> = BTreeMap::new();

        for route in collection.routes() {
            let identifier = route.identifier();
            let variants = admissible_chains(route);

            let mut methods: Vec<&str> = route.methods().iter().map(|m| m.as_str()).collect();
            methods.sort_unstable();
            methods.dedup();

            for method in methods {
                let buckets = builders.entry(method.to_string()).or_default();
                for (chain, defaults) in &variants {
                    buckets
                        .entry(chain.len())
                        .or_default()
                        .insert(&identifier, chain, defaults);
                }
            }
        }

        let methods = builders
            .into_iter()
            .map(|(method, buckets)| {
                let buckets = buckets
                    .into_iter()
                    .map(|(count, builder)| (count, builder.build()))
                    .collect();
                (method, buckets)
            })
            .collect();

        debug!(routes = collection.len(), "compiled route dispatch table");
        Ok(Self {
            version: FORMAT_VERSION,
            fingerprint: collection.fingerprint(),
            methods,
        })
    }

    /// Resolve a method + path to an outcome.
    pub fn match_path(&self, method: &str, path: &str) -> Result<RouteMatch, Error> {
        let normalized = normalize_path(path);
        let count = segment_count(normalized);

        if let Some(buckets) = self.methods.get(method)
            && let Some(bucket) = buckets.get(&count)
            && let Some((identifier, params)) = bucket.match_path(normalized)?
        {
            return Ok(RouteMatch::Found { identifier, params });
        }

        // No match for the requested method; report the methods that
        // would have matched this path, in deterministic order.
        let mut allowed = Vec::new();
        for (other, buckets) in &self.methods {
            if other == method {
                continue;
            }
            if let Some(bucket) = buckets.get(&count)
                && bucket.is_match(normalized)?
            {
                allowed.push(other.clone());
            }
        }

        if allowed.is_empty() {
            Ok(RouteMatch::NotFound)
        } else {
            Ok(RouteMatch::MethodNotAllowed { allowed })
        }
    }

    /// Whether this table can serve the given collection fingerprint
    pub fn is_current(&self, fingerprint: u64) -> bool {
        self.version == FORMAT_VERSION && self.fingerprint == fingerprint
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Deterministic serialized form of the table
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(self).map_err(|e| Error::Cache(e.to_string()))
    }

    /// Persist the table, writing to a sibling temporary file and
    /// renaming into place so readers never observe a partial artifact.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let bytes = self.to_bytes()?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        info!(path = %path.display(), "wrote compiled route table");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let bytes = fs::read(path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Cache(format!("undecodable compiled table: {e}")))
    }

    #[cfg(test)]
    fn bucket(&self, method: &str, count: usize) -> Option<&Bucket> {
        self.methods.get(method)?.get(&count)
    }
}

// ============================================================================
// Compilation
// ============================================================================

#[derive(Default)]
struct BucketBuilder {
    chains: Vec<ChainEntry>,
    seen: HashMap<u64, usize>,
}

struct ChainEntry {
    matchers: Vec<SegmentMatcher>,
    route: String,
    defaults: Vec<(String, String)>,
}

impl BucketBuilder {
    fn insert(&mut self, identifier: &str, chain: &[SegmentMatcher], defaults: &[(String, String)]) {
        let hash = chain_hash(chain);
        if let Some(&existing) = self.seen.get(&hash) {
            // Structurally identical to an earlier route: the first
            // registration keeps the branch, later parameter keys merge
            // into its capture groups.
            let entry = &mut self.chains[existing];
            for (own, theirs) in entry.matchers.iter_mut().zip(chain) {
                own.merge_parameter_keys(theirs);
            }
            debug!(
                route = %identifier,
                branch = %entry.route,
                "merged structurally identical route chain"
            );
            return;
        }

        self.seen.insert(hash, self.chains.len());
        self.chains.push(ChainEntry {
            matchers: chain.to_vec(),
            route: identifier.to_string(),
            defaults: defaults.to_vec(),
        });
    }

    fn build(self) -> Bucket {
        let mut alternatives = Vec::with_capacity(self.chains.len());
        let mut branches = Vec::with_capacity(self.chains.len());

        for (index, entry) in self.chains.into_iter().enumerate() {
            let key = format!("r{index}");
            let body: Vec<String> = entry
                .matchers
                .iter()
                .map(|m| m.condition_expression(&key))
                .collect();
            alternatives.push(format!("(?P<{key}>){}", body.join("/")));

            let params = entry
                .matchers
                .iter()
                .flat_map(|m| m.matched_parameter_expressions(&key))
                .collect();
            branches.push(Branch {
                route: entry.route,
                marker: key,
                params,
                defaults: entry.defaults,
            });
        }

        Bucket {
            expression: format!("^(?:{})$", alternatives.join("|")),
            branches,
            regex: OnceLock::new(),
        }
    }
}

/// Every chain a route occupies in the table.
///
/// A route without optional parameters contributes its full matcher
/// chain; trailing optionals additionally contribute each truncated
/// prefix, paired with the default values for the parameters the
/// truncation drops. Truncating to zero segments yields the root chain.
fn admissible_chains(route: &Route) -> Vec<(Vec<SegmentMatcher>, Vec<(String, String)>)> {
    let matchers = route.matchers();
    let first_optional = matchers
        .iter()
        .position(SegmentMatcher::is_optional)
        .unwrap_or(matchers.len());

    let mut variants = Vec::new();
    for length in first_optional..=matchers.len() {
        let chain = if length == 0 {
            vec![SegmentMatcher::Static(StaticMatcher::new(""))]
        } else {
            matchers[..length].to_vec()
        };

        let mut defaults = Vec::new();
        for matcher in &matchers[length..] {
            for name in matcher.parameter_names() {
                if let Some(value) = route.defaults().get(name) {
                    defaults.push((name.to_string(), value.clone()));
                }
            }
        }

        variants.push((chain, defaults));
    }
    variants
}

// ============================================================================
// Path Normalization
// ============================================================================

/// Strip the leading slash and a single trailing slash (except for the
/// root path, which normalizes to the empty string). Case is preserved.
pub(crate) fn normalize_path(path: &str) -> &str {
    let path = path.strip_prefix('/').unwrap_or(path);
    path.strip_suffix('/').unwrap_or(path)
}

/// Number of `/`-delimited parts; the root path counts as one
pub(crate) fn segment_count(normalized: &str) -> usize {
    normalized.split('/').count()
}
