// Route domain object: pattern, methods, action, middleware, matchers

use crate::route_matcher::SegmentMatcher;
use crate::route_segment;
use crate::{Error, HttpMethod, HttpRequest, HttpResponse};
use std::collections::HashMap;
use std::sync::Arc;

/// Synchronous route handler function type
pub type HandlerFn = Arc<dyn Fn(HttpRequest) -> Result<HttpResponse, Error> + Send + Sync>;

/// What a route executes when it matches.
///
/// Resolved once at registration; closures run in-crate, controller and
/// invokable actions name code the embedding application owns.
#[derive(Clone)]
pub enum Action {
    Closure(HandlerFn),
    ControllerMethod { controller: String, method: String },
    Invokable(String),
}

impl Action {
    /// Build a closure action from any suitable function
    pub fn closure<F>(handler: F) -> Self
    where
        F: Fn(HttpRequest) -> Result<HttpResponse, Error> + Send + Sync + 'static,
    {
        Action::Closure(Arc::new(handler))
    }

    /// Parse a `Controller@method` reference; a bare name is an
    /// invokable controller
    pub fn controller(reference: &str) -> Self {
        match reference.split_once('@') {
            Some((controller, method)) => Action::ControllerMethod {
                controller: controller.to_string(),
                method: method.to_string(),
            },
            None => Action::Invokable(reference.to_string()),
        }
    }

    /// Stable lookup signature. Closures have no identity and are not
    /// indexable by action.
    pub fn signature(&self) -> Option<String> {
        match self {
            Action::Closure(_) => None,
            Action::ControllerMethod { controller, method } => {
                Some(format!("{controller}@{method}"))
            }
            Action::Invokable(controller) => Some(controller.clone()),
        }
    }

    /// Qualify the controller reference with a namespace prefix
    pub(crate) fn qualify(&mut self, namespace: &str) {
        match self {
            Action::Closure(_) => {}
            Action::ControllerMethod { controller, .. } | Action::Invokable(controller) => {
                *controller = format!("{namespace}::{controller}");
            }
        }
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Closure(_) => f.write_str("Closure"),
            Action::ControllerMethod { controller, method } => {
                write!(f, "ControllerMethod({controller}@{method})")
            }
            Action::Invokable(controller) => write!(f, "Invokable({controller})"),
        }
    }
}

/// A registered mapping from (HTTP method set, URI pattern) to an action.
///
/// Routes are built during bootstrap and treated as immutable once the
/// dispatcher has compiled them; `params` is only ever populated on the
/// resolved clone a successful dispatch produces.
#[derive(Clone, Debug)]
pub struct Route {
    methods: Vec<HttpMethod>,
    uri: String,
    prefix: String,
    suffix: String,
    name: Option<String>,
    domain: Option<String>,
    action: Action,
    middleware: Vec<String>,
    excluded_middleware: Vec<String>,
    conditions: HashMap<String, String>,
    defaults: HashMap<String, String>,
    params: HashMap<String, String>,
    matchers: Vec<SegmentMatcher>,
}

impl Route {
    pub fn new(
        methods: Vec<HttpMethod>,
        uri: impl Into<String>,
        action: Action,
    ) -> Result<Self, Error> {
        Self::with_conditions(methods, uri, action, HashMap::new())
    }

    /// Build a route with pre-seeded parameter constraints (the Router
    /// passes its global patterns through here)
    pub fn with_conditions(
        methods: Vec<HttpMethod>,
        uri: impl Into<String>,
        action: Action,
        conditions: HashMap<String, String>,
    ) -> Result<Self, Error> {
        let uri = normalize_uri(&uri.into());
        if methods.is_empty() {
            return Err(Error::InvalidRoutePattern {
                pattern: uri,
                reason: "route declares no HTTP methods".to_string(),
            });
        }

        let matchers = compile_matchers(&uri, &conditions)?;
        Ok(Self {
            methods,
            uri,
            prefix: String::new(),
            suffix: String::new(),
            name: None,
            domain: None,
            action,
            middleware: Vec::new(),
            excluded_middleware: Vec::new(),
            conditions,
            defaults: HashMap::new(),
            params: HashMap::new(),
            matchers,
        })
    }

    pub fn methods(&self) -> &[HttpMethod] {
        &self.methods
    }

    /// Normalized pattern, without leading or trailing slashes
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// `/`-prefixed pattern for display; `/` for the root route
    pub fn display_uri(&self) -> String {
        format!("/{}", self.uri)
    }

    /// Canonical identifier: sorted, de-duplicated methods plus the
    /// display URI, e.g. `GET|HEAD /user/{id}`
    pub fn identifier(&self) -> String {
        let mut methods: Vec<&str> = self.methods.iter().map(HttpMethod::as_str).collect();
        methods.sort_unstable();
        methods.dedup();
        format!("{} {}", methods.join("|"), self.display_uri())
    }

    /// Prepend a prefix to the pattern, recompiling the matcher chain.
    ///
    /// Registration-time configuration: groups apply their prefix this
    /// way before the route enters a collection.
    pub fn prefix(&mut self, prefix: &str) -> Result<&mut Self, Error> {
        let prefix = prefix.trim_matches('/');
        if !prefix.is_empty() {
            self.uri = if self.uri.is_empty() {
                prefix.to_string()
            } else {
                format!("{}/{}", prefix, self.uri)
            };
            self.prefix = prefix.to_string();
            self.matchers = compile_matchers(&self.uri, &self.conditions)?;
        }
        Ok(self)
    }

    pub fn get_prefix(&self) -> &str {
        &self.prefix
    }

    /// Append a suffix to the pattern, recompiling the matcher chain.
    ///
    /// The suffix glues onto the final segment (`users` + `.html` =
    /// `users.html`); a suffixed parameter part no longer matches the
    /// `{...}` form and becomes a literal.
    pub fn suffix(&mut self, suffix: &str) -> Result<&mut Self, Error> {
        if !suffix.is_empty() {
            self.uri.push_str(suffix);
            self.suffix = suffix.to_string();
            self.matchers = compile_matchers(&self.uri, &self.conditions)?;
        }
        Ok(self)
    }

    pub fn get_suffix(&self) -> &str {
        &self.suffix
    }

    /// Assign the route's unique name
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn domain(&mut self, domain: impl Into<String>) -> &mut Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn get_domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Constrain a parameter to a regex, recompiling the matcher chain
    pub fn constrain(
        &mut self,
        param: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Result<&mut Self, Error> {
        self.conditions.insert(param.into(), pattern.into());
        self.matchers = compile_matchers(&self.uri, &self.conditions)?;
        Ok(self)
    }

    pub fn conditions(&self) -> &HashMap<String, String> {
        &self.conditions
    }

    /// Value substituted for an optional parameter the path omitted
    pub fn default_value(
        &mut self,
        param: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.defaults.insert(param.into(), value.into());
        self
    }

    pub fn defaults(&self) -> &HashMap<String, String> {
        &self.defaults
    }

    pub fn middleware(&mut self, middleware: impl Into<String>) -> &mut Self {
        self.middleware.push(middleware.into());
        self
    }

    pub fn get_middleware(&self) -> &[String] {
        &self.middleware
    }

    /// Disable an inherited middleware for this route
    pub fn without_middleware(&mut self, middleware: impl Into<String>) -> &mut Self {
        self.excluded_middleware.push(middleware.into());
        self
    }

    pub fn get_excluded_middleware(&self) -> &[String] {
        &self.excluded_middleware
    }

    /// The effective middleware set: enabled minus disabled entries
    pub fn effective_middleware(&self) -> Vec<&str> {
        self.middleware
            .iter()
            .filter(|m| !self.excluded_middleware.contains(m))
            .map(String::as_str)
            .collect()
    }

    /// Compiled segment matchers, one per `/`-delimited pattern part
    pub fn matchers(&self) -> &[SegmentMatcher] {
        &self.matchers
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    pub(crate) fn set_domain_if_unset(&mut self, domain: Option<&str>) {
        if self.domain.is_none() {
            self.domain = domain.map(str::to_string);
        }
    }

    pub(crate) fn inherit_middleware(&mut self, middleware: &[String], excluded: &[String]) {
        for m in middleware {
            if !self.middleware.contains(m) {
                self.middleware.push(m.clone());
            }
        }
        for m in excluded {
            if !self.excluded_middleware.contains(m) {
                self.excluded_middleware.push(m.clone());
            }
        }
    }

    pub(crate) fn qualify_action(&mut self, namespace: &str) {
        self.action.qualify(namespace);
    }

    /// Execute the route's action.
    ///
    /// Only closures are executable in-crate; controller and invokable
    /// actions belong to the embedding application.
    pub fn run(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        match &self.action {
            Action::Closure(handler) => handler(request),
            action => Err(Error::Handler(format!(
                "action {action:?} for route `{}` must be invoked by the embedding application",
                self.identifier()
            ))),
        }
    }
}

fn normalize_uri(uri: &str) -> String {
    uri.trim_matches('/').to_string()
}

fn compile_matchers(
    uri: &str,
    conditions: &HashMap<String, String>,
) -> Result<Vec<SegmentMatcher>, Error> {
    let segments = route_segment::parse(uri, conditions)?;
    Ok(segments.iter().map(SegmentMatcher::from_segment).collect())
}
