use super::*;

fn leaf(name: &str) -> ComponentNode {
    ComponentNode::new(ComponentName::fixed(name), |_cx: &mut RenderContext<'_>| {})
}

#[test]
fn unkeyed_children_get_positional_keys() {
    let mut parent = leaf("list");
    parent.append(leaf("item"));
    parent.append_text("hello");
    parent.append(leaf("item"));
    parent.append_text("world");

    let keys: Vec<&str> = parent.children().iter().map(|c| c.resolved_key()).collect();
    assert_eq!(keys, vec!["auto_0_item", "text_0", "auto_1_item", "text_1"]);
    assert_eq!(parent.indexed_child_count, 2);
}

#[test]
fn explicit_key_is_used_verbatim_and_not_counted() {
    let mut parent = leaf("list");
    parent.append(leaf("item").key("first"));
    parent.append(leaf("item"));
    let keys: Vec<&str> = parent.children().iter().map(|c| c.resolved_key()).collect();
    assert_eq!(keys, vec!["first", "auto_0_item"]);
}

#[test]
fn blank_or_missing_key_is_ignored() {
    let node = leaf("item").key("");
    assert_eq!(node.base().key, None);
    let node = leaf("item").maybe_key(None::<String>);
    assert_eq!(node.base().key, None);
    let node = leaf("item").maybe_key(Some("k"));
    assert_eq!(node.base().key.as_deref(), Some("k"));
}

#[test]
fn builders_record_presence_and_explicit_absence() {
    let listener = Listener::new(|_| {});
    let node = leaf("box")
        .style("width", 10)
        .without_style("height")
        .attr("title", "hi")
        .without_attr("hidden")
        .class_name("a b")
        .class_name(["c"])
        .css_var("accent", "red")
        .on("click", listener.clone())
        .without_event("input");

    let base = node.base();
    assert_eq!(base.style.get("width"), Some(&Some(StyleValue::Number(10.0))));
    assert_eq!(base.style.get("height"), Some(&None));
    assert_eq!(base.attribute.get("title"), Some(&Some(AttrValue::from("hi"))));
    assert_eq!(base.attribute.get("hidden"), Some(&None));
    assert_eq!(base.class_name, vec!["a", "b", "c"]);
    assert_eq!(base.css_vars.get("accent"), Some(&Some(StyleValue::from("red"))));
    assert_eq!(base.events.get("click"), Some(&Some(listener)));
    assert_eq!(base.events.get("input"), Some(&None));
}

#[test]
fn name_resolution_prefers_the_override() {
    assert_eq!(
        ComponentName::resolve("card", &ComponentOptions::default()).unwrap(),
        ComponentName::fixed("card")
    );
    assert_eq!(
        ComponentName::resolve("card", &ComponentOptions::named("panel")).unwrap(),
        ComponentName::fixed("panel")
    );
    assert!(ComponentName::resolve("card", &ComponentOptions::fragment())
        .unwrap()
        .is_fragment());
}

#[test]
fn empty_derived_name_is_rejected() {
    let err = ComponentDef::<()>::new("", ComponentOptions::default(), |_cx, _args| {});
    assert!(matches!(err, Err(ComponentError::EmptyName { .. })));

    let def = ComponentDef::<()>::new("", ComponentOptions::fragment(), |_cx, _args| {}).unwrap();
    assert!(def.name().is_fragment());
}

#[test]
fn calling_a_definition_builds_an_unrendered_node() {
    let def = ComponentDef::new("greeting", ComponentOptions::default(), |cx, name: &String| {
        cx.append_text(format!("hello {name}"));
    })
    .unwrap();
    let node = def.call("ada".to_owned());
    assert_eq!(node.name().as_str(), "greeting");
    assert!(node.children().is_empty());
    assert!(node.metadata.is_none());
}

#[test]
fn shallow_clone_keeps_declared_children_only() {
    let mut parent = leaf("list").key("root");
    parent.append(leaf("declared"));
    parent.mark_declared();
    parent.append(leaf("rendered"));
    parent.base_mut().class_name.push("added-in-render".into());

    let clone = parent.shallow_clone();
    assert_eq!(clone.resolved_key(), parent.resolved_key());
    assert_eq!(clone.base().key.as_deref(), Some("root"));
    assert!(clone.base().class_name.is_empty());
    assert_eq!(clone.children().len(), 1);
    assert_eq!(clone.children()[0].resolved_key(), "auto_0_declared");
}

#[test]
fn text_nodes_are_flagged() {
    assert!(ComponentNode::text("x").is_text());
    assert!(!leaf("x").is_text());
    assert_eq!(ComponentNode::text("x").name().as_str(), TEXT_COMPONENT);
}
