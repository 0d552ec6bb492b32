use super::*;

fn page(name: &'static str) -> impl Fn(&RouteParams) -> ComponentNode {
    move |_| span(name)
}

fn table(routes: Vec<Route>) -> RouteTable {
    RouteTable::new(routes).expect("valid routes")
}

#[test]
fn literal_path_beats_template_declared_first() {
    let routes = table(vec![
        Route::new("/users/:id", page("user")),
        Route::new("/users/new", page("new user")),
    ]);
    let found = match_route("/users/new", &routes, &Access::anonymous());
    assert_eq!(found.outcome, RouteOutcome::Matched);
    assert_eq!(found.route.map(|route| route.path.as_str()), Some("/users/new"));
    assert!(found.params.is_empty());

    let found = match_route("/users/42", &routes, &Access::anonymous());
    assert_eq!(found.route.map(|route| route.path.as_str()), Some("/users/:id"));
    assert_eq!(found.params.get("id"), Some("42"));
}

#[test]
fn settings_literal_wins_over_section_template() {
    let routes = table(vec![
        Route::new("/:section", page("section")),
        Route::new("/settings", page("settings")),
    ]);
    let found = match_route("/settings", &routes, &Access::anonymous());
    assert_eq!(found.route.map(|route| route.path.as_str()), Some("/settings"));

    let found = match_route("/billing", &routes, &Access::anonymous());
    assert_eq!(found.params.get("section"), Some("billing"));
}

#[test]
fn params_keep_template_order() {
    let routes = table(vec![Route::new("/org/:org/repo/:repo", page("repo"))]);
    let found = match_route("/org/rust/repo/regex", &routes, &Access::anonymous());
    let params: Vec<_> = found.params.iter().collect();
    assert_eq!(params, vec![("org", "rust"), ("repo", "regex")]);
}

#[test]
fn match_is_anchored_to_whole_path() {
    let routes = table(vec![Route::new("/about", page("about"))]);
    let anonymous = Access::anonymous();
    assert_eq!(match_route("/about/team", &routes, &anonymous).outcome, RouteOutcome::NotFound);
    assert_eq!(match_route("/x/about", &routes, &anonymous).outcome, RouteOutcome::NotFound);
    assert!(match_route("/nowhere", &routes, &anonymous).route.is_none());
}

#[test]
fn template_segment_may_be_empty() {
    let routes = table(vec![Route::new("/posts/:slug", page("post"))]);
    let found = match_route("/posts/", &routes, &Access::anonymous());
    assert_eq!(found.outcome, RouteOutcome::Matched);
    assert_eq!(found.params.get("slug"), Some(""));
}

#[test]
fn role_checks_pick_fallback_by_login_state() {
    let routes = table(vec![Route::new("/admin", page("admin")).roles(["admin"])]);

    let admin = Access::logged_in(["editor", "admin"]);
    assert_eq!(match_route("/admin", &routes, &admin).outcome, RouteOutcome::Matched);

    let editor = Access::logged_in(["editor"]);
    let refused = match_route("/admin", &routes, &editor);
    assert_eq!(refused.outcome, RouteOutcome::Unauthorized);
    assert_eq!(refused.route.map(|route| route.path.as_str()), Some("/admin"));

    let anonymous = Access::anonymous();
    assert_eq!(match_route("/admin", &routes, &anonymous).outcome, RouteOutcome::NotLoggedIn);
}

#[test]
fn invalid_template_is_reported() {
    let err = RouteTable::new(vec![Route::new("/files/:na-me", page("file"))]).expect_err("bad group name");
    match err {
        RouteError::Template { path, .. } => assert_eq!(path, "/files/:na-me"),
    }
}

#[test]
fn index_html_is_stripped_to_directory() {
    assert_eq!(strip_index_html("/docs/index.html"), "/docs/");
    assert_eq!(strip_index_html("/index.html"), "/");
    assert_eq!(strip_index_html("/notindex.html"), "/notindex.html");
    assert_eq!(strip_index_html("/docs"), "/docs");
}

#[test]
fn navigation_lists_flagged_routes_in_declaration_order() {
    let routes = table(vec![
        Route::new("/users/:id", page("user"))
            .default_path("/users/me")
            .in_navigation("Profile")
            .group("account"),
        Route::new("/hidden", page("hidden")),
        Route::new("/about", page("about")).in_navigation("About"),
    ]);
    assert_eq!(
        routes.navigation(),
        vec![
            NavigationEntry {
                label: "Profile",
                path: "/users/me",
                group: Some("account"),
            },
            NavigationEntry {
                label: "About",
                path: "/about",
                group: None,
            },
        ]
    );
    assert_eq!(routes.len(), 3);
    assert_eq!(routes.routes()[1].path, "/hidden");
}
