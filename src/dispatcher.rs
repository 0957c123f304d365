// Dispatcher: compiles a route collection into a match table, optionally
// persisting it, and resolves incoming method + path pairs

use crate::dispatch_table::{CompiledTable, RouteMatch};
use crate::{Error, HttpRequest, HttpResponse, Route, RouteCollection};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Compiles routes and resolves requests against the compiled table.
///
/// Stateless between dispatch calls apart from the compiled-table memo
/// and the current-route memo `handle` maintains. When a cache path is
/// configured, the compiled table is persisted there and reused across
/// processes; a format-version or fingerprint mismatch transparently
/// falls back to recompilation.
#[derive(Debug, Default)]
pub struct Dispatcher {
    cache_path: Option<PathBuf>,
    refresh_cache: bool,
    table: Option<CompiledTable>,
    current: Option<Route>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure where the compiled table is persisted
    pub fn set_cache_path(&mut self, path: impl Into<PathBuf>) {
        self.cache_path = Some(path.into());
    }

    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    /// Force recompilation even when a cache file exists
    pub fn refresh_cache(&mut self, refresh: bool) {
        self.refresh_cache = refresh;
    }

    /// Compile a collection into a dispatch table
    pub fn compile(collection: &RouteCollection) -> Result<CompiledTable, Error> {
        CompiledTable::compile(collection)
    }

    /// Ensure an up-to-date compiled table is in memory, loading it from
    /// the cache file when possible and rewriting the cache after a
    /// recompile.
    pub fn prepare(&mut self, collection: &RouteCollection) -> Result<(), Error> {
        let fingerprint = collection.fingerprint();
        if let Some(table) = &self.table
            && table.is_current(fingerprint)
        {
            return Ok(());
        }

        if let Some(path) = &self.cache_path
            && !self.refresh_cache
            && path.exists()
        {
            match CompiledTable::load(path) {
                Ok(table) if table.is_current(fingerprint) => {
                    debug!(path = %path.display(), "loaded compiled route table from cache");
                    self.table = Some(table);
                    return Ok(());
                }
                Ok(_) => {
                    warn!(path = %path.display(), "cached route table is stale, recompiling");
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cached route table unreadable, recompiling");
                }
            }
        }

        let table = CompiledTable::compile(collection)?;
        if let Some(path) = &self.cache_path {
            table.save(path)?;
        }
        self.table = Some(table);
        Ok(())
    }

    /// Resolve a method + path to a typed outcome.
    ///
    /// A non-match is an outcome, not an error; only infrastructure
    /// failures (cache I/O, corrupt expressions) surface as `Err`.
    pub fn dispatch(
        &mut self,
        collection: &RouteCollection,
        method: &str,
        path: &str,
    ) -> Result<RouteMatch, Error> {
        self.prepare(collection)?;
        let table = self
            .table
            .as_ref()
            .ok_or_else(|| Error::RouteLookup("dispatcher has no compiled table".to_string()))?;
        table.match_path(method, path)
    }

    /// Dispatch a request, record the resolved route, and execute it.
    ///
    /// The non-match outcomes become typed errors here, at the boundary:
    /// `RouteNotFound` for 404, `MethodNotAllowed` (carrying the allowed
    /// methods) for 405.
    pub fn handle(
        &mut self,
        collection: &RouteCollection,
        request: &HttpRequest,
    ) -> Result<HttpResponse, Error> {
        let (path, query) = request
            .path
            .split_once('?')
            .map(|(p, q)| (p, Some(q)))
            .unwrap_or((request.path.as_str(), None));

        match self.dispatch(collection, &request.method, path)? {
            RouteMatch::Found { identifier, params } => {
                let mut resolved = collection.match_identifier(&identifier)?.clone();
                resolved.set_params(params.clone());
                debug!(route = %identifier, "dispatching matched route");

                let mut request = request.clone();
                request.path_params = params;
                if let Some(query) = query {
                    request.query_params = parse_query_string(query);
                }

                self.current = Some(resolved.clone());
                resolved.run(request)
            }
            RouteMatch::MethodNotAllowed { allowed } => Err(Error::MethodNotAllowed {
                path: path.to_string(),
                allowed,
            }),
            RouteMatch::NotFound => Err(Error::RouteNotFound(format!(
                "{} {}",
                request.method, path
            ))),
        }
    }

    /// The route resolved by the most recent successful `handle` call
    pub fn current_route(&self) -> Option<&Route> {
        self.current.as_ref()
    }
}

/// Parse a query string into a map of parameters
fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            let mut split = part.splitn(2, '=');
            let key = split.next()?;
            let value = split.next().unwrap_or("");
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}
