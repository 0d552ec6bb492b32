use super::*;

fn style_map(entries: &[(&str, Option<StyleValue>)]) -> PropMap<StyleValue> {
    entries
        .iter()
        .map(|(key, value)| ((*key).to_owned(), value.clone()))
        .collect()
}

#[test]
fn numeric_styles_get_px_suffix() {
    assert_eq!(StyleValue::from(12).to_css(), "12px");
    assert_eq!(StyleValue::from(0.5).to_css(), "0.5px");
    assert_eq!(StyleValue::from("1em").to_css(), "1em");
}

#[test]
fn false_attribute_serializes_to_absent() {
    assert_eq!(AttrValue::from(false).to_attribute(), None);
    assert_eq!(AttrValue::from(true).to_attribute().as_deref(), Some("true"));
    assert_eq!(AttrValue::from(3).to_attribute().as_deref(), Some("3"));
}

#[test]
fn class_list_normalizes_strings_and_lists() {
    assert_eq!(
        ClassList::from("  row  selected "),
        ClassList(vec!["row".into(), "selected".into()])
    );
    assert_eq!(
        ClassList::from(["row", "selected"]),
        ClassList(vec!["row".into(), "selected".into()])
    );
}

#[test]
fn merge_prefers_own_values_and_appends_classes() {
    let inherited = InheritedProps {
        style: style_map(&[("color", Some("red".into())), ("margin", Some(4.into()))]),
        class_name: vec!["outer".into()],
        ..InheritedProps::default()
    };
    let mut own = BaseProps::default();
    own.style.insert("color".into(), Some("blue".into()));
    own.class_name.push("inner".into());

    let merged = inherited.merge(&own);
    assert_eq!(merged.style.get("color"), Some(&Some(StyleValue::from("blue"))));
    assert_eq!(merged.style.get("margin"), Some(&Some(StyleValue::from(4))));
    assert_eq!(merged.class_name, vec!["outer".to_string(), "inner".to_string()]);
}

#[test]
fn diff_treats_zero_as_present() {
    let old = style_map(&[("opacity", Some(1.into()))]);
    let new = style_map(&[("opacity", Some(0.into()))]);
    let changes = diff_props(&old, &new);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].key, "opacity");
    assert_eq!(changes[0].new, Some(&StyleValue::from(0)));
}

#[test]
fn diff_reports_removals_and_ignores_explicit_none_additions() {
    let old = style_map(&[("color", Some("red".into()))]);
    let new = style_map(&[("color", None), ("width", None)]);
    let changes = diff_props(&old, &new);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].key, "color");
    assert!(changes[0].new.is_none());
}

#[test]
fn diff_of_equal_maps_is_empty() {
    let map = style_map(&[("color", Some("red".into())), ("width", Some(10.into()))]);
    assert!(diff_props(&map, &map.clone()).is_empty());
}

#[test]
fn class_diff_splits_removed_and_added() {
    let old = vec!["a".to_string(), "b".to_string()];
    let new = vec!["b".to_string(), "c".to_string()];
    let (removed, added) = diff_classes(&old, &new);
    assert_eq!(removed, vec!["a"]);
    assert_eq!(added, vec!["c"]);
}

#[test]
fn kebab_case_converts_camel_case() {
    assert_eq!(kebab_case("dataSize"), "data-size");
    assert_eq!(kebab_case("maxWidth"), "max-width");
    assert_eq!(kebab_case("tabindex"), "tabindex");
    assert_eq!(kebab_case("ariaLabelledBy"), "aria-labelled-by");
}
