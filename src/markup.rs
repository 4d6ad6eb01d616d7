use kuchiki::NodeRef;
use kuchiki::traits::TendrilSink as _;
use maud::{Markup, html};

pub struct TocLink<'a> {
    pub id: &'a str,
    pub text: &'a str,
    pub level: u8,
}

pub fn toc_list(links: &[TocLink<'_>]) -> Markup {
    html! {
        ul class="toc-list" {
            @for link in links {
                li class=(format!("toc-item toc-level-{}", link.level)) {
                    a class=(format!("toc-link toc-level-{}", link.level)) href=(format!("#{}", link.id)) {
                        (link.text)
                    }
                }
            }
        }
    }
}

/// Parses `markup` on its own and returns the first element matching
/// `selector`, detached and ready to graft into another document.
pub fn fragment_node(markup: Markup, selector: &str) -> Option<NodeRef> {
    let doc = kuchiki::parse_html().one(markup.into_string());
    let node = doc.select_first(selector).ok()?.as_node().clone();
    node.detach();
    Some(node)
}

pub fn parse_document(html: &str) -> NodeRef {
    kuchiki::parse_html().one(html)
}

pub fn serialize(node: &NodeRef) -> std::io::Result<String> {
    let mut out = Vec::new();
    node.serialize(&mut out)?;
    String::from_utf8(out).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
