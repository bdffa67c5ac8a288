//! Inclusion-markup renderers for internalized assets.

use std::collections::BTreeMap;

/// Attribute map rendered into a tag; `None` or an empty value renders a
/// bare attribute name.
pub type Attributes = BTreeMap<String, Option<String>>;

/// Render a `<script>` tag pointing at `url` with the cache-busting suffix
/// applied.
pub fn script_tag(url: &str, attributes: &Attributes, cache_bust: &str) -> String {
    format!(
        "<script src=\"{}{}\"{}></script>",
        url,
        bust_suffix(cache_bust),
        render_attributes(attributes)
    )
}

/// Render a `<link>` tag pointing at `url` with the cache-busting suffix
/// applied.
pub fn link_tag(url: &str, attributes: &Attributes, cache_bust: &str) -> String {
    format!(
        "<link href=\"{}{}\"{}>",
        url,
        bust_suffix(cache_bust),
        render_attributes(attributes)
    )
}

fn bust_suffix(token: &str) -> String {
    if token.is_empty() {
        String::new()
    } else {
        format!("?{token}")
    }
}

fn render_attributes(attributes: &Attributes) -> String {
    let mut rendered = String::new();
    for (name, value) in attributes {
        match value {
            Some(value) if !value.is_empty() => {
                rendered.push_str(&format!(" {name}=\"{value}\""));
            }
            _ => rendered.push_str(&format!(" {name}")),
        }
    }
    rendered
}
