//! Static HTML snapshot implementing `DocumentView` on top of `scraper`
use super::{DocumentView, NodeRef, Rect, Viewport};
use async_trait::async_trait;
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Node, Selector};
use std::cell::RefCell;
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Elements whose content is never rendered
const NON_RENDERED_TAGS: [&str; 8] = [
    "head", "script", "style", "template", "meta", "link", "title", "noscript",
];

/// Elements that break lines in rendered text
const BLOCK_TAGS: [&str; 24] = [
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li",
    "main", "p", "section",
];

/// Scripted reaction: clicking an element matching `selector` (or inside one)
/// swaps the whole document for `html`
struct ClickReaction {
    selector: Selector,
    html: String,
}

/// Parsed markup plus its elements in document order, so a `NodeRef` resolves
/// without walking the tree
struct Snapshot {
    html: Html,
    order: Vec<NodeId>,
}

impl Snapshot {
    fn parse(markup: &str) -> Self {
        let html = Html::parse_document(markup);
        let order = elements(&html).map(|el| el.id()).collect();
        Self { html, order }
    }

    fn element(&self, node: NodeRef) -> Option<ElementRef<'_>> {
        let id = *self.order.get(node.0)?;
        ElementRef::wrap(self.html.tree.get(id)?)
    }
}

/// A parsed page snapshot.
///
/// Layout is not computed from CSS; hosts that know element boxes register them
/// with `with_layout`. Clicks can be scripted with `on_click` so UI-revealing
/// flows can be replayed offline.
pub struct HtmlDocument {
    snapshot: RefCell<Snapshot>,
    reactions: Vec<ClickReaction>,
    layout: Vec<(Selector, Rect)>,
    viewport: Viewport,
    mutations: Notify,
    clicks: RefCell<Vec<String>>,
}

impl HtmlDocument {
    /// Parse a full HTML document
    pub fn parse(html: &str) -> Self {
        Self {
            snapshot: RefCell::new(Snapshot::parse(html)),
            reactions: Vec::new(),
            layout: Vec::new(),
            viewport: Viewport::default(),
            mutations: Notify::new(),
            clicks: RefCell::new(Vec::new()),
        }
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Give elements matching `selector` a bounding box
    pub fn with_layout(mut self, selector: &str, rect: Rect) -> Self {
        match Selector::parse(selector) {
            Ok(parsed) => self.layout.push((parsed, rect)),
            Err(e) => warn!("Ignoring layout for invalid selector {}: {:?}", selector, e),
        }
        self
    }

    /// Replace the document with `html` whenever an element matching `selector`
    /// (or one of its descendants) is clicked
    pub fn on_click(mut self, selector: &str, html: &str) -> Self {
        match Selector::parse(selector) {
            Ok(parsed) => self.reactions.push(ClickReaction {
                selector: parsed,
                html: html.to_string(),
            }),
            Err(e) => warn!("Ignoring click reaction for invalid selector {}: {:?}", selector, e),
        }
        self
    }

    /// Swap in new markup and notify mutation observers
    pub fn replace(&self, html: &str) {
        *self.snapshot.borrow_mut() = Snapshot::parse(html);
        self.mutations.notify_one();
    }

    /// Short descriptions of every clicked element, in click order
    pub fn clicks(&self) -> Vec<String> {
        self.clicks.borrow().clone()
    }

    fn with_element<T>(&self, node: NodeRef, f: impl FnOnce(ElementRef<'_>) -> T) -> Option<T> {
        let snapshot = self.snapshot.borrow();
        snapshot.element(node).map(f)
    }
}

fn elements(html: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    html.root_element().descendants().filter_map(ElementRef::wrap)
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!("Invalid selector {}: {:?}", selector, e);
            None
        }
    }
}

/// Descendants of `scope` matching `selector`, mapped to document-order handles.
/// Pre-order numbering puts the k-th descendant of element i at index i + k.
fn matching_descendants(scope: ElementRef<'_>, base: usize, selector: &Selector) -> Vec<NodeRef> {
    scope
        .descendants()
        .filter_map(ElementRef::wrap)
        .enumerate()
        .skip(1)
        .filter(|(_, el)| selector.matches(el))
        .map(|(offset, _)| NodeRef(base + offset))
        .collect()
}

fn is_hidden_element(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    if NON_RENDERED_TAGS.contains(&value.name()) || value.attr("hidden").is_some() {
        return true;
    }
    if value.name() == "input" && value.attr("type") == Some("hidden") {
        return true;
    }
    value.attr("style").is_some_and(|style| {
        let compact: String = style.chars().filter(|c| !c.is_whitespace()).collect();
        let compact = compact.to_ascii_lowercase();
        compact.contains("display:none") || compact.contains("visibility:hidden")
    })
}

fn collect_rendered_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(child_element) = ElementRef::wrap(child) else {
                    continue;
                };
                if is_hidden_element(&child_element) {
                    continue;
                }
                let block = BLOCK_TAGS.contains(&child_element.value().name());
                if block {
                    out.push('\n');
                }
                collect_rendered_text(child_element, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn describe(element: &ElementRef<'_>) -> String {
    let value = element.value();
    let mut description = value.name().to_string();
    if let Some(id) = value.attr("id") {
        description.push('#');
        description.push_str(id);
    }
    if let Some(class) = value.attr("class") {
        for name in class.split_whitespace() {
            description.push('.');
            description.push_str(name);
        }
    }
    description
}

#[async_trait(?Send)]
impl DocumentView for HtmlDocument {
    fn query_all(&self, selector: &str) -> Vec<NodeRef> {
        let Some(selector) = parse_selector(selector) else {
            return Vec::new();
        };
        let snapshot = self.snapshot.borrow();
        elements(&snapshot.html)
            .enumerate()
            .filter(|(_, el)| selector.matches(el))
            .map(|(i, _)| NodeRef(i))
            .collect()
    }

    fn query_within(&self, scope: NodeRef, selector: &str) -> Vec<NodeRef> {
        let Some(selector) = parse_selector(selector) else {
            return Vec::new();
        };
        self.with_element(scope, |el| matching_descendants(el, scope.0, &selector))
            .unwrap_or_default()
    }

    fn query_shadow(&self, host: NodeRef, selector: &str) -> Vec<NodeRef> {
        // Declarative shadow roots are the only shadow trees a snapshot can carry
        self.query_within(host, "template[shadowrootmode]")
            .into_iter()
            .flat_map(|root| self.query_within(root, selector))
            .collect()
    }

    fn text_content(&self, node: NodeRef) -> String {
        self.with_element(node, |el| el.text().collect::<String>())
            .unwrap_or_default()
    }

    fn inner_text(&self, node: NodeRef) -> String {
        self.with_element(node, |el| {
            let mut out = String::new();
            if !is_hidden_element(&el) {
                collect_rendered_text(el, &mut out);
            }
            out
        })
        .unwrap_or_default()
    }

    fn attribute(&self, node: NodeRef, name: &str) -> Option<String> {
        self.with_element(node, |el| el.value().attr(name).map(str::to_string))
            .flatten()
    }

    fn tag_name(&self, node: NodeRef) -> String {
        self.with_element(node, |el| el.value().name().to_string())
            .unwrap_or_default()
    }

    fn is_rendered(&self, node: NodeRef) -> bool {
        self.with_element(node, |el| {
            if is_hidden_element(&el) {
                return false;
            }
            !el.ancestors()
                .filter_map(ElementRef::wrap)
                .any(|ancestor| is_hidden_element(&ancestor))
        })
        .unwrap_or(false)
    }

    fn bounding_box(&self, node: NodeRef) -> Option<Rect> {
        self.with_element(node, |el| {
            self.layout
                .iter()
                .find(|(selector, _)| selector.matches(&el))
                .map(|(_, rect)| *rect)
        })
        .flatten()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn click(&self, node: NodeRef) {
        let reaction = self.with_element(node, |el| {
            self.clicks.borrow_mut().push(describe(&el));
            // Click events bubble, so wrappers react to clicks on their children
            let mut chain = std::iter::once(el).chain(el.ancestors().filter_map(ElementRef::wrap));
            chain.find_map(|target| {
                self.reactions
                    .iter()
                    .find(|reaction| reaction.selector.matches(&target))
                    .map(|reaction| reaction.html.clone())
            })
        });

        match reaction.flatten() {
            Some(html) => {
                debug!("Click on {:?} changed the document", node);
                self.replace(&html);
            }
            None => debug!("Click on {:?} had no scripted effect", node),
        }
    }

    async fn mutated(&self) {
        self.mutations.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <div id="outer" class="wrap">
            <p>First <b>bold</b> para</p>
            <button id="btn">Go</button>
            <div hidden><span class="ghost">hidden text</span></div>
        </div>
        <section style="display: none"><a id="link">nope</a></section>
        <script>var x = 1;</script>
    </body></html>"#;

    #[test]
    fn test_query_order_and_scope() {
        let doc = HtmlDocument::parse(PAGE);
        let outer = doc.query_first("#outer").unwrap();
        let inner = doc.query_within(outer, "p, button");
        assert_eq!(inner.len(), 2);
        assert_eq!(doc.tag_name(inner[0]), "p");
        assert_eq!(doc.tag_name(inner[1]), "button");
        assert_eq!(inner[1], doc.query_first("#btn").unwrap());
        // Scope itself is excluded
        assert!(doc.query_within(outer, "#outer").is_empty());
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let doc = HtmlDocument::parse(PAGE);
        assert!(doc.query_all("[[[").is_empty());
    }

    #[test]
    fn test_rendering_rules() {
        let doc = HtmlDocument::parse(PAGE);
        assert!(doc.is_rendered(doc.query_first("#btn").unwrap()));
        assert!(!doc.is_rendered(doc.query_first(".ghost").unwrap()));
        assert!(!doc.is_rendered(doc.query_first("#link").unwrap()));
    }

    #[test]
    fn test_text_variants() {
        let doc = HtmlDocument::parse(PAGE);
        let outer = doc.query_first("#outer").unwrap();
        let rendered = doc.inner_text(outer);
        assert!(rendered.contains("First bold para"));
        assert!(!rendered.contains("hidden text"));
        assert!(doc.text_content(outer).contains("hidden text"));
    }

    #[test]
    fn test_scripted_click_replaces_document() {
        let doc = HtmlDocument::parse(PAGE)
            .on_click("#outer", "<html><body><p id=\"after\">done</p></body></html>");
        let button = doc.query_first("#btn").unwrap();
        doc.click(button);

        assert_eq!(doc.clicks(), vec!["button#btn".to_string()]);
        assert!(doc.query_first("#after").is_some());
        assert!(doc.query_first("#btn").is_none());
    }

    #[test]
    fn test_mutation_is_observed_after_click() {
        let doc = HtmlDocument::parse(PAGE).on_click("#btn", "<html><body></body></html>");
        doc.click(doc.query_first("#btn").unwrap());
        // The pending notification resolves the next wait immediately
        tokio_test::block_on(doc.mutated());
    }

    #[test]
    fn test_layout_lookup() {
        let doc = HtmlDocument::parse(PAGE).with_layout("#btn", Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(
            doc.bounding_box(doc.query_first("#btn").unwrap()),
            Some(Rect::new(0.0, 0.0, 10.0, 10.0))
        );
        assert_eq!(doc.bounding_box(doc.query_first("#outer").unwrap()), None);
    }

    fn long_page(rows: usize, marker: &str) -> String {
        let body: String = (0..rows)
            .map(|i| format!("<div class=\"row\"><span>{} {}</span></div>", marker, i))
            .collect();
        format!("<html><body>{}<p id=\"tail\">{} end</p></body></html>", body, marker)
    }

    #[test]
    fn test_handles_resolve_across_large_page() {
        let doc = HtmlDocument::parse(&long_page(5_000, "row"));
        let rows = doc.query_all(".row");
        assert_eq!(rows.len(), 5_000);

        // Every lookup goes through the order index; this stays linear overall
        let texts: Vec<String> = rows.iter().map(|&row| doc.inner_text(row)).collect();
        assert_eq!(texts[0].trim(), "row 0");
        assert_eq!(texts[4_999].trim(), "row 4999");

        let last = rows[4_999];
        let spans = doc.query_within(last, "span");
        assert_eq!(spans.len(), 1);
        assert_eq!(doc.tag_name(spans[0]), "span");
        assert_eq!(doc.text_content(spans[0]), "row 4999");

        let tail = doc.query_first("#tail").unwrap();
        assert_eq!(doc.text_content(tail), "row end");
        assert_eq!(doc.tag_name(NodeRef(usize::MAX)), "");
    }

    #[test]
    fn test_replace_rebuilds_handles() {
        let doc = HtmlDocument::parse(&long_page(50, "before"));
        let old_tail = doc.query_first("#tail").unwrap();

        doc.replace(&long_page(10, "after"));
        let tail = doc.query_first("#tail").unwrap();
        assert!(tail.0 < old_tail.0);
        assert_eq!(doc.text_content(tail), "after end");
        assert_eq!(doc.query_all(".row").len(), 10);
        // Handles from the old document past the new end resolve to nothing
        assert_eq!(doc.attribute(old_tail, "id"), None);
    }
}
