//! Route group attributes for organizing routes with shared configuration
//!
//! Groups let routes inherit a shared:
//! - Path prefix
//! - Domain
//! - Controller namespace
//! - Middleware (with per-group disabled entries)
//!
//! The Router owns an explicit stack of these attribute records, pushed
//! around each `group()` call and merged outer-to-inner.
//!
//! # Examples
//!
//! ```
//! use gantry::GroupAttributes;
//!
//! let api = GroupAttributes::new().prefix("/api/v1");
//!
//! // Routes registered inside this group get the prefix applied:
//! assert_eq!(api.apply_prefix("/users"), "api/v1/users");
//! ```

/// Attribute record for one level of route grouping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupAttributes {
    /// Path prefix for all routes in this group
    prefix: String,

    /// Domain applied to routes that declare none themselves
    domain: Option<String>,

    /// Namespace prefix for controller actions
    namespace: Option<String>,

    /// Middleware to apply to all routes
    middleware: Vec<String>,

    /// Middleware disabled for this group, overriding inherited entries
    excluded_middleware: Vec<String>,
}

impl GroupAttributes {
    /// Create an empty attribute record
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the path prefix for this group.
    ///
    /// Leading and trailing slashes are normalized away; the prefix is
    /// stored in the same slash-free form route URIs use.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into().trim_matches('/').to_string();
        self
    }

    /// Set the domain inherited by routes in this group
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the controller namespace for this group
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Add middleware to this group
    pub fn middleware(mut self, middleware: impl Into<String>) -> Self {
        self.middleware.push(middleware.into());
        self
    }

    /// Add multiple middleware to this group
    pub fn with_middleware<I, S>(mut self, middleware: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.middleware.extend(middleware.into_iter().map(Into::into));
        self
    }

    /// Disable a middleware for this group, overriding inherited entries
    pub fn without_middleware(mut self, middleware: impl Into<String>) -> Self {
        self.excluded_middleware.push(middleware.into());
        self
    }

    pub fn get_prefix(&self) -> &str {
        &self.prefix
    }

    pub fn get_domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn get_namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn get_middleware(&self) -> &[String] {
        &self.middleware
    }

    pub fn get_excluded_middleware(&self) -> &[String] {
        &self.excluded_middleware
    }

    /// Apply the group's prefix to a route URI.
    ///
    /// The result is in normalized (slash-free) form.
    pub fn apply_prefix(&self, uri: &str) -> String {
        let uri = uri.trim_matches('/');
        if self.prefix.is_empty() {
            uri.to_string()
        } else if uri.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}/{}", self.prefix, uri)
        }
    }

    /// Combine an outer group's attributes with an inner group's.
    ///
    /// Prefixes concatenate; domain and namespace fall back outer-to-
    /// inner; middleware is the union of both minus the outer group's
    /// disabled entries.
    pub fn merge(outer: &GroupAttributes, inner: &GroupAttributes) -> GroupAttributes {
        let prefix = match (outer.prefix.is_empty(), inner.prefix.is_empty()) {
            (true, _) => inner.prefix.clone(),
            (_, true) => outer.prefix.clone(),
            (false, false) => format!("{}/{}", outer.prefix, inner.prefix),
        };

        let mut middleware = Vec::new();
        for m in outer.middleware.iter().chain(&inner.middleware) {
            if !middleware.contains(m) && !outer.excluded_middleware.contains(m) {
                middleware.push(m.clone());
            }
        }

        let mut excluded_middleware = outer.excluded_middleware.clone();
        for m in &inner.excluded_middleware {
            if !excluded_middleware.contains(m) {
                excluded_middleware.push(m.clone());
            }
        }

        GroupAttributes {
            prefix,
            domain: inner.domain.clone().or_else(|| outer.domain.clone()),
            namespace: inner.namespace.clone().or_else(|| outer.namespace.clone()),
            middleware,
            excluded_middleware,
        }
    }
}
