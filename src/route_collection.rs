// Indexed store of registered routes

use crate::route_matcher::{FNV_SEED, chain_hash, fnv1a};
use crate::{Error, Route};
use std::collections::HashMap;

/// Insertion-ordered store of all registered routes, indexed by
/// identifier, name and action signature.
///
/// The identifier index is maintained eagerly so duplicate registrations
/// fail at `add` time. Names and actions are assigned through the
/// returned route handle *after* insertion, so those two indices are
/// rebuilt by [`refresh_lookups`](Self::refresh_lookups); the Router does
/// this before dispatching.
#[derive(Debug, Default)]
pub struct RouteCollection {
    routes: Vec<Route>,
    identifiers: HashMap<String, usize>,
    names: HashMap<String, usize>,
    actions: HashMap<String, usize>,
}

impl RouteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route, rejecting duplicate identifiers.
    ///
    /// Returns a handle to the stored route for post-registration
    /// configuration (name, constraints, defaults).
    pub fn add(&mut self, route: Route) -> Result<&mut Route, Error> {
        let identifier = route.identifier();
        if self.identifiers.contains_key(&identifier) {
            return Err(Error::RouteConflict(identifier));
        }

        let index = self.routes.len();
        self.identifiers.insert(identifier, index);
        self.routes.push(route);
        Ok(&mut self.routes[index])
    }

    /// Look up a route by identifier; absence is a caller error
    pub fn match_identifier(&self, identifier: &str) -> Result<&Route, Error> {
        self.identifiers
            .get(identifier)
            .map(|&index| &self.routes[index])
            .ok_or_else(|| Error::RouteLookup(format!("no route with identifier `{identifier}`")))
    }

    /// Non-throwing lookup by route name
    pub fn get_by_name(&self, name: &str) -> Option<&Route> {
        self.names.get(name).map(|&index| &self.routes[index])
    }

    /// Non-throwing lookup by action signature (e.g. `Users@show`)
    pub fn get_by_action(&self, signature: &str) -> Option<&Route> {
        self.actions.get(signature).map(|&index| &self.routes[index])
    }

    /// Rebuild the identifier, name and action indices from the current
    /// routes. Names (and pattern prefixes/suffixes) are assigned
    /// through route handles after insertion, so the indices go stale
    /// until this runs; the Router refreshes before every dispatch.
    pub fn refresh_lookups(&mut self) {
        self.identifiers.clear();
        self.names.clear();
        self.actions.clear();
        for (index, route) in self.routes.iter().enumerate() {
            self.identifiers.entry(route.identifier()).or_insert(index);
            if let Some(name) = route.get_name() {
                self.names.entry(name.to_string()).or_insert(index);
            }
            if let Some(signature) = route.action().signature() {
                self.actions.entry(signature).or_insert(index);
            }
        }
    }

    /// Insertion-ordered snapshot of all routes
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Stable digest of everything dispatch depends on: identifiers,
    /// matcher structure and optional-parameter defaults. Used to detect
    /// stale compiled-table caches.
    pub fn fingerprint(&self) -> u64 {
        let mut hash = FNV_SEED;
        for route in &self.routes {
            hash = fnv1a(route.identifier().as_bytes(), hash);
            hash = fnv1a(&chain_hash(route.matchers()).to_le_bytes(), hash);

            let mut defaults: Vec<_> = route.defaults().iter().collect();
            defaults.sort();
            for (param, value) in defaults {
                hash = fnv1a(param.as_bytes(), hash);
                hash = fnv1a(value.as_bytes(), hash);
            }
        }
        hash
    }
}
