// Router facade: verb registration, route groups, global parameter
// patterns, resource routes, and the dispatch entry point

use crate::route_group::GroupAttributes;
use crate::{
    ALL_METHODS, Action, Dispatcher, Error, HttpMethod, HttpRequest, HttpResponse, Route,
    RouteCollection,
};
use std::collections::HashMap;

/// Options for `Router::resource`: filter the conventional action set
/// or override the URI parameter name.
#[derive(Clone, Debug, Default)]
pub struct ResourceOptions {
    only: Option<Vec<String>>,
    except: Vec<String>,
    param: Option<String>,
}

impl ResourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register only the named actions
    pub fn only<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    /// Register everything except the named actions
    pub fn except<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.except = actions.into_iter().map(Into::into).collect();
        self
    }

    /// Override the URI parameter name (default: singularized resource)
    pub fn param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }

    fn includes(&self, action: &str) -> bool {
        if let Some(only) = &self.only
            && !only.iter().any(|a| a == action)
        {
            return false;
        }
        !self.except.iter().any(|a| a == action)
    }
}

/// The route registration and dispatch facade.
///
/// Owns the route collection, the dispatcher, the global parameter
/// patterns, and the group-attribute stack pushed/popped around
/// `group()` calls.
#[derive(Debug, Default)]
pub struct Router {
    collection: RouteCollection,
    dispatcher: Dispatcher,
    patterns: HashMap<String, String>,
    group_stack: Vec<GroupAttributes>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, uri: &str, action: Action) -> Result<&mut Route, Error> {
        self.add_route(vec![HttpMethod::GET], uri, action)
    }

    pub fn post(&mut self, uri: &str, action: Action) -> Result<&mut Route, Error> {
        self.add_route(vec![HttpMethod::POST], uri, action)
    }

    pub fn put(&mut self, uri: &str, action: Action) -> Result<&mut Route, Error> {
        self.add_route(vec![HttpMethod::PUT], uri, action)
    }

    pub fn patch(&mut self, uri: &str, action: Action) -> Result<&mut Route, Error> {
        self.add_route(vec![HttpMethod::PATCH], uri, action)
    }

    pub fn head(&mut self, uri: &str, action: Action) -> Result<&mut Route, Error> {
        self.add_route(vec![HttpMethod::HEAD], uri, action)
    }

    pub fn delete(&mut self, uri: &str, action: Action) -> Result<&mut Route, Error> {
        self.add_route(vec![HttpMethod::DELETE], uri, action)
    }

    pub fn options(&mut self, uri: &str, action: Action) -> Result<&mut Route, Error> {
        self.add_route(vec![HttpMethod::OPTIONS], uri, action)
    }

    /// Register a route answering every supported method
    pub fn any(&mut self, uri: &str, action: Action) -> Result<&mut Route, Error> {
        self.add_route(ALL_METHODS.to_vec(), uri, action)
    }

    /// Register a route for an explicit method set
    pub fn match_methods(
        &mut self,
        methods: Vec<HttpMethod>,
        uri: &str,
        action: Action,
    ) -> Result<&mut Route, Error> {
        self.add_route(methods, uri, action)
    }

    /// Set a global constraint applied to the named parameter of every
    /// subsequently registered route, unless overridden locally
    pub fn pattern(&mut self, name: impl Into<String>, regex: impl Into<String>) {
        self.patterns.insert(name.into(), regex.into());
    }

    /// Set several global parameter constraints at once
    pub fn patterns(&mut self, patterns: HashMap<String, String>) {
        self.patterns.extend(patterns);
    }

    pub fn get_patterns(&self) -> &HashMap<String, String> {
        &self.patterns
    }

    /// Register routes under shared group attributes.
    ///
    /// The attributes are merged with the enclosing group (if any),
    /// pushed for the duration of the builder call, and popped on
    /// return - nesting works to arbitrary depth.
    pub fn group<F>(&mut self, attributes: GroupAttributes, routes: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Router) -> Result<(), Error>,
    {
        let merged = match self.group_stack.last() {
            Some(outer) => GroupAttributes::merge(outer, &attributes),
            None => attributes,
        };

        self.group_stack.push(merged);
        let result = routes(self);
        self.group_stack.pop();
        result
    }

    pub fn has_group_stack(&self) -> bool {
        !self.group_stack.is_empty()
    }

    pub fn group_stack(&self) -> &[GroupAttributes] {
        &self.group_stack
    }

    /// Register the conventional CRUD route set for a resource
    /// controller: index, create, store, show, edit, update, destroy.
    pub fn resource(
        &mut self,
        name: &str,
        controller: &str,
        options: ResourceOptions,
    ) -> Result<(), Error> {
        let param = options.param.clone().unwrap_or_else(|| singular(name));

        let actions: [(&str, &[HttpMethod], String); 7] = [
            ("index", &[HttpMethod::GET], String::new()),
            ("create", &[HttpMethod::GET], "create".to_string()),
            ("store", &[HttpMethod::POST], String::new()),
            ("show", &[HttpMethod::GET], format!("{{{param}}}")),
            ("edit", &[HttpMethod::GET], format!("{{{param}}}/edit")),
            (
                "update",
                &[HttpMethod::PUT, HttpMethod::PATCH],
                format!("{{{param}}}"),
            ),
            ("destroy", &[HttpMethod::DELETE], format!("{{{param}}}")),
        ];

        for (action, methods, suffix) in actions {
            if !options.includes(action) {
                continue;
            }

            let uri = if suffix.is_empty() {
                name.to_string()
            } else {
                format!("{name}/{suffix}")
            };
            self.add_route(
                methods.to_vec(),
                &uri,
                Action::ControllerMethod {
                    controller: controller.to_string(),
                    method: action.to_string(),
                },
            )?
            .name(format!("{name}.{action}"));
        }

        Ok(())
    }

    /// Dispatch a request to its matching route and execute it.
    ///
    /// Non-matches surface as `Error::RouteNotFound` /
    /// `Error::MethodNotAllowed` for the embedding application's error
    /// layer to render as 404/405.
    pub fn dispatch(&mut self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        self.collection.refresh_lookups();
        self.dispatcher.handle(&self.collection, request)
    }

    /// The route resolved by the most recent successful dispatch
    pub fn current_route(&self) -> Option<&Route> {
        self.dispatcher.current_route()
    }

    pub fn routes(&self) -> &RouteCollection {
        &self.collection
    }

    pub fn routes_mut(&mut self) -> &mut RouteCollection {
        &mut self.collection
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    fn add_route(
        &mut self,
        methods: Vec<HttpMethod>,
        uri: &str,
        action: Action,
    ) -> Result<&mut Route, Error> {
        let attributes = self.group_stack.last().cloned();
        let mut route = Route::with_conditions(methods, uri, action, self.patterns.clone())?;
        if let Some(attrs) = &attributes {
            route.prefix(attrs.get_prefix())?;
            if let Some(namespace) = attrs.get_namespace() {
                route.qualify_action(namespace);
            }
            route.set_domain_if_unset(attrs.get_domain());
            route.inherit_middleware(attrs.get_middleware(), attrs.get_excluded_middleware());
        }

        self.collection.add(route)
    }
}

fn singular(name: &str) -> String {
    name.strip_suffix('s').unwrap_or(name).to_string()
}
