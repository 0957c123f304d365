use gantry::{
    Action, Dispatcher, Error, GroupAttributes, HttpMethod, HttpRequest, HttpResponse,
    ResourceOptions, Route, RouteMatch, Router,
};

fn ok_handler() -> Action {
    Action::closure(|_req| Ok(HttpResponse::ok()))
}

#[test]
fn test_static_route() {
    let mut router = Router::new();
    router
        .get(
            "hello",
            Action::closure(|_req| {
                Ok(HttpResponse::ok().with_body(b"Hello, World!".to_vec()))
            }),
        )
        .unwrap();

    let response = router
        .dispatch(&HttpRequest::new("GET", "/hello"))
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"Hello, World!");
}

#[test]
fn test_path_parameter() {
    let mut router = Router::new();
    router
        .get(
            "users/{id}",
            Action::closure(|req| {
                let id = req.param("id").unwrap().clone();
                Ok(HttpResponse::ok().with_body(id.into_bytes()))
            }),
        )
        .unwrap();

    let response = router
        .dispatch(&HttpRequest::new("GET", "/users/123"))
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"123");
}

#[test]
fn test_constrained_parameter() {
    let mut router = Router::new();
    router
        .get("user/{id}", ok_handler())
        .unwrap()
        .constrain("id", r"\d+")
        .unwrap();

    assert!(router.dispatch(&HttpRequest::new("GET", "/user/42")).is_ok());

    let err = router
        .dispatch(&HttpRequest::new("GET", "/user/abc"))
        .unwrap_err();
    assert!(matches!(err, Error::RouteNotFound(_)));
}

#[test]
fn test_route_not_found() {
    let mut router = Router::new();
    router.get("users", ok_handler()).unwrap();

    let err = router
        .dispatch(&HttpRequest::new("GET", "/nonexistent"))
        .unwrap_err();
    assert!(matches!(err, Error::RouteNotFound(_)));
    assert_eq!(err.status_code(), 404);
}

#[test]
fn test_method_not_allowed_carries_allowed_methods() {
    let mut router = Router::new();
    router.post("users", ok_handler()).unwrap();
    router.put("users", ok_handler()).unwrap();

    let err = router
        .dispatch(&HttpRequest::new("GET", "/users"))
        .unwrap_err();
    assert_eq!(err.status_code(), 405);
    assert_eq!(
        err.allowed_methods(),
        Some(&["POST".to_string(), "PUT".to_string()][..])
    );

    // The allowed list feeds the Allow header at the HTTP boundary.
    let response = HttpResponse::method_not_allowed(err.allowed_methods().unwrap());
    assert_eq!(response.headers.get("Allow"), Some(&"POST, PUT".to_string()));
}

#[test]
fn test_query_parameters() {
    let mut router = Router::new();
    router
        .get(
            "search",
            Action::closure(|req| {
                let q = req.query("q").unwrap().clone();
                Ok(HttpResponse::ok().with_body(q.into_bytes()))
            }),
        )
        .unwrap();

    let response = router
        .dispatch(&HttpRequest::new("GET", "/search?q=rust"))
        .unwrap();
    assert_eq!(response.body, b"rust");
}

#[test]
fn test_root_route() {
    let mut router = Router::new();
    router.get("/", ok_handler()).unwrap();

    assert!(router.dispatch(&HttpRequest::new("GET", "/")).is_ok());
    assert!(router.dispatch(&HttpRequest::new("GET", "/home")).is_err());
}

#[test]
fn test_optional_parameter_with_default() {
    let mut router = Router::new();
    router
        .get(
            "pages/{slug?}",
            Action::closure(|req| {
                let slug = req.param("slug").cloned().unwrap_or_default();
                Ok(HttpResponse::ok().with_body(slug.into_bytes()))
            }),
        )
        .unwrap()
        .default_value("slug", "home");

    let response = router
        .dispatch(&HttpRequest::new("GET", "/pages/intro"))
        .unwrap();
    assert_eq!(response.body, b"intro");

    let response = router.dispatch(&HttpRequest::new("GET", "/pages")).unwrap();
    assert_eq!(response.body, b"home");
}

#[test]
fn test_first_registered_route_wins() {
    let mut router = Router::new();
    router
        .get(
            "user/{id}",
            Action::closure(|_req| Ok(HttpResponse::ok().with_body(b"first".to_vec()))),
        )
        .unwrap();
    router
        .get(
            "user/{slug}",
            Action::closure(|_req| Ok(HttpResponse::ok().with_body(b"second".to_vec()))),
        )
        .unwrap();

    let response = router
        .dispatch(&HttpRequest::new("GET", "/user/42"))
        .unwrap();
    assert_eq!(response.body, b"first");
}

#[test]
fn test_current_route_exposes_params() {
    let mut router = Router::new();
    router
        .get("user/{id}", ok_handler())
        .unwrap()
        .name("user.show");

    router
        .dispatch(&HttpRequest::new("GET", "/user/42"))
        .unwrap();

    let current = router.current_route().unwrap();
    assert_eq!(current.get_name(), Some("user.show"));
    assert_eq!(current.param("id"), Some("42"));
    assert_eq!(current.identifier(), "GET /user/{id}");
}

#[test]
fn test_resource_routes_resolve() {
    let mut router = Router::new();
    router
        .resource("photos", "PhotoController", ResourceOptions::new())
        .unwrap();

    // Controller actions are resolved by the dispatcher but executed by
    // the embedding application.
    let mut dispatcher = Dispatcher::new();
    let outcome = dispatcher
        .dispatch(router.routes(), "GET", "/photos/42")
        .unwrap();

    match outcome {
        RouteMatch::Found { identifier, params } => {
            assert_eq!(identifier, "GET /photos/{photo}");
            assert_eq!(params.get("photo"), Some(&"42".to_string()));
        }
        other => panic!("expected Found, got {other:?}"),
    }
}

#[test]
fn test_route_suffix() {
    let mut router = Router::new();
    router
        .get("reports/latest", ok_handler())
        .unwrap()
        .suffix(".csv")
        .unwrap();

    assert!(router
        .dispatch(&HttpRequest::new("GET", "/reports/latest.csv"))
        .is_ok());
    assert!(router
        .dispatch(&HttpRequest::new("GET", "/reports/latest"))
        .is_err());
}

#[test]
fn test_match_methods_registration() {
    let mut router = Router::new();
    router
        .match_methods(
            vec![HttpMethod::GET, HttpMethod::POST],
            "form",
            ok_handler(),
        )
        .unwrap();

    assert!(router.dispatch(&HttpRequest::new("GET", "/form")).is_ok());
    assert!(router.dispatch(&HttpRequest::new("POST", "/form")).is_ok());
    assert!(router.dispatch(&HttpRequest::new("DELETE", "/form")).is_err());
}

#[test]
fn test_lookup_by_name_and_action() {
    let mut router = Router::new();
    router
        .get("users", Action::controller("UserController@index"))
        .unwrap()
        .name("users.index");
    router.routes_mut().refresh_lookups();

    assert!(router.routes().get_by_name("users.index").is_some());
    assert!(router.routes().get_by_action("UserController@index").is_some());
    assert!(router.routes().get_by_name("users.show").is_none());
}

#[test]
fn test_group_and_pattern_interaction() {
    let mut router = Router::new();
    router.pattern("id", r"\d+");
    router
        .group(GroupAttributes::new().prefix("api"), |r| {
            r.get("user/{id}", ok_handler())?;
            Ok(())
        })
        .unwrap();

    router
        .dispatch(&HttpRequest::new("GET", "/api/user/7"))
        .unwrap();
    assert_eq!(router.current_route().unwrap().uri(), "api/user/{id}");

    assert!(router
        .dispatch(&HttpRequest::new("GET", "/api/user/seven"))
        .is_err());
}

#[test]
fn test_invalid_pattern_fails_registration() {
    let mut router = Router::new();
    let err = router.get("user/{id", ok_handler()).unwrap_err();
    assert!(matches!(err, Error::InvalidRoutePattern { .. }));

    let route = Route::new(vec![HttpMethod::GET], "user/{}", ok_handler());
    assert!(route.is_err());
}
