//! Small helpers over `kuchiki` nodes: selector lookup, ancestry, class lists,
//! attributes and inline style.
//!
//! Invalid selectors never error here; they simply match nothing, so a
//! misconfigured selector turns the owning controller into a no-op.

use kuchiki::{NodeRef, Selectors};

pub fn select_first(root: &NodeRef, selector: &str) -> Option<NodeRef> {
    root.select_first(selector)
        .ok()
        .map(|n| n.as_node().clone())
}

pub fn select_all(root: &NodeRef, selector: &str) -> Vec<NodeRef> {
    match root.select(selector) {
        Ok(nodes) => nodes.map(|n| n.as_node().clone()).collect(),
        Err(()) => Vec::new(),
    }
}

/// Element descendants of `root` (not `root` itself) matching `selector`.
pub fn select_within(root: &NodeRef, selector: &str) -> Vec<NodeRef> {
    select_all(root, selector)
        .into_iter()
        .filter(|n| n != root)
        .collect()
}

pub fn matches(node: &NodeRef, selector: &str) -> bool {
    let Ok(selectors) = Selectors::compile(selector) else {
        return false;
    };
    match node.clone().into_element_ref() {
        Some(el) => selectors.matches(&el),
        None => false,
    }
}

/// Nearest inclusive ancestor matching `selector`.
pub fn closest(node: &NodeRef, selector: &str) -> Option<NodeRef> {
    let selectors = Selectors::compile(selector).ok()?;
    node.inclusive_ancestors().find(|n| {
        n.clone()
            .into_element_ref()
            .is_some_and(|el| selectors.matches(&el))
    })
}

/// True when `node` is `ancestor` or lives beneath it.
pub fn contains(ancestor: &NodeRef, node: &NodeRef) -> bool {
    node.inclusive_ancestors().any(|n| &n == ancestor)
}

pub fn attr(node: &NodeRef, name: &str) -> Option<String> {
    let el = node.as_element()?;
    el.attributes.borrow().get(name).map(|s| s.to_string())
}

pub fn set_attr(node: &NodeRef, name: &str, value: &str) {
    if let Some(el) = node.as_element() {
        el.attributes
            .borrow_mut()
            .insert(name, value.to_string());
    }
}

pub fn remove_attr(node: &NodeRef, name: &str) {
    if let Some(el) = node.as_element() {
        el.attributes.borrow_mut().remove(name);
    }
}

fn classes(node: &NodeRef) -> Vec<String> {
    attr(node, "class")
        .map(|c| c.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

fn write_classes(node: &NodeRef, classes: &[String]) {
    if classes.is_empty() {
        remove_attr(node, "class");
    } else {
        set_attr(node, "class", &classes.join(" "));
    }
}

pub fn has_class(node: &NodeRef, class: &str) -> bool {
    classes(node).iter().any(|c| c == class)
}

pub fn add_class(node: &NodeRef, class: &str) {
    let mut list = classes(node);
    if !list.iter().any(|c| c == class) {
        list.push(class.to_string());
        write_classes(node, &list);
    }
}

pub fn remove_class(node: &NodeRef, class: &str) {
    let mut list = classes(node);
    let before = list.len();
    list.retain(|c| c != class);
    if list.len() != before {
        write_classes(node, &list);
    }
}

fn style_declarations(node: &NodeRef) -> Vec<(String, String)> {
    let Some(style) = attr(node, "style") else {
        return Vec::new();
    };
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            if prop.is_empty() {
                return None;
            }
            Some((prop, value.trim().to_string()))
        })
        .collect()
}

pub fn style_property(node: &NodeRef, property: &str) -> Option<String> {
    style_declarations(node)
        .into_iter()
        .find(|(p, _)| p == property)
        .map(|(_, v)| v)
}

pub fn set_style_property(node: &NodeRef, property: &str, value: &str) {
    let mut decls = style_declarations(node);
    match decls.iter_mut().find(|(p, _)| p == property) {
        Some(decl) => decl.1 = value.to_string(),
        None => decls.push((property.to_string(), value.to_string())),
    }
    let rendered = decls
        .iter()
        .map(|(p, v)| format!("{p}: {v}"))
        .collect::<Vec<_>>()
        .join("; ");
    set_attr(node, "style", &rendered);
}

pub fn tag_name(node: &NodeRef) -> Option<String> {
    node.as_element()
        .map(|el| el.name.local.as_ref().to_ascii_lowercase())
}
