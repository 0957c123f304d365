// Core library for the gantry routing engine
// Pattern parsing, compiled segment matchers, and cacheable dispatch tables

pub mod dispatch_table;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod route;
pub mod route_collection;
pub mod route_group;
pub mod route_matcher;
pub mod route_segment;
pub mod routing;

// Re-export commonly used types
pub use dispatch_table::{CompiledTable, FORMAT_VERSION, RouteMatch};
pub use dispatcher::Dispatcher;
pub use error::Error;
pub use http::{ALL_METHODS, HttpMethod, HttpRequest, HttpResponse};
pub use route::{Action, HandlerFn, Route};
pub use route_collection::RouteCollection;
pub use route_group::GroupAttributes;
pub use route_matcher::{ParameterMatcher, SegmentMatcher, StaticMatcher};
pub use route_segment::{DEFAULT_PARAM_PATTERN, Segment}; // `parse` stays namespaced
pub use routing::{ResourceOptions, Router};
