//! Article markup rewriting.
//!
//! Raw story markup from the portal is written for the ePaper viewer and
//! carries viewer chrome (cross-page references, navigation arrows, clipping
//! markers, duplicate headline blocks, kickers, gallery-limit markers) that
//! has no place in a feed reader. [`transform`] applies a fixed, ordered
//! rewrite rule set and yields clean HTML plus the rendered plain text:
//!
//! 1. drop chrome elements by class,
//! 2. prepend a localized `FRAGE` label inside question blocks,
//! 3. append separators after labels, byline initials, keyword tags and
//!    place tags,
//! 4. prefix the author name with `VON `,
//! 5. resolve a single inline-image placeholder: download the lead image
//!    and reference it with an `<img>` as the placeholder's first child,
//! 6. derive plain text from the rewritten tree.
//!
//! The rules are applied while serializing a read-only parse of the markup,
//! so a second pass over already-rewritten output cannot duplicate the
//! injected nodes.

use crate::error::Error;
use crate::models::Edition;
use crate::portal::{session::Session, story};
use ego_tree::NodeRef;
use once_cell::sync::Lazy;
use scraper::{Html, Node, Selector};
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument, warn};

/// Viewer chrome removed wholesale, identified by class.
const REMOVE_CLASSES: &[&str] = &[
    "seitenverweis-ipad",
    "pfeil-ipad",
    "klammeraffe-ipad",
    "headline",
    "overhead",
    "BildergalerieMax",
];

/// Elements that never take children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

static IMAGE_PLACEHOLDER_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"aside[data-type="I"]"#).expect("placeholder selector"));

/// Rewritten story markup plus its rendered plain text.
///
/// The plain text is used downstream only for emptiness testing; a story
/// whose rewritten text trims to nothing is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rewritten {
    pub html: String,
    pub text: String,
}

/// A resolved inline-image placeholder.
///
/// Placeholder ids are composite: `imageId@storyId`. The story id embedded
/// in the placeholder, not the one of the enclosing story, addresses the
/// image endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImagePlaceholder {
    pub image_id: String,
    pub story_id: String,
    pub element_id: String,
}

/// The `<img>` injection derived from a downloaded placeholder image.
#[derive(Debug, Clone)]
pub(crate) struct InjectedImage {
    /// `id` attribute of the placeholder element to inject into.
    pub element_id: String,
    /// Externally served image URL.
    pub src: String,
}

/// Rewrite one story's raw markup.
///
/// If a single image placeholder is present, its image is downloaded into
/// `images/{imageId}.jpg` under the issue directory before rendering; the
/// caller is suspended until the download completes and image-fetch failures
/// propagate as [`Error::Fetch`]. Empty input yields empty output without
/// error.
#[instrument(level = "debug", skip_all, fields(story = %story_id, page = fetch_page))]
pub async fn transform(
    session: &Session,
    edition: &Edition,
    fetch_page: u32,
    story_id: &str,
    raw: &str,
    issue_dir: &Path,
    base_url: &str,
) -> Result<Rewritten, Error> {
    if raw.trim().is_empty() {
        return Ok(Rewritten::default());
    }

    let injected = match find_image_placeholder(raw) {
        Some(placeholder) => {
            let bytes = story::fetch_image(
                session,
                edition,
                fetch_page,
                &placeholder.story_id,
                &placeholder.image_id,
            )
            .await?;
            let path = issue_dir
                .join("images")
                .join(format!("{}.jpg", placeholder.image_id));
            fs::write(&path, &bytes)
                .await
                .map_err(|e| Error::write(&path, e))?;
            debug!(image = %placeholder.image_id, bytes = bytes.len(), "Stored lead image");
            Some(InjectedImage {
                element_id: placeholder.element_id,
                src: format!(
                    "{}/{}/images/{}.jpg",
                    base_url, edition.id, placeholder.image_id
                ),
            })
        }
        None => None,
    };

    Ok(rewrite(raw, injected.as_ref()))
}

/// Locate the story's inline-image placeholder, if exactly one exists.
pub(crate) fn find_image_placeholder(raw: &str) -> Option<ImagePlaceholder> {
    let doc = Html::parse_fragment(raw);
    let mut matches = doc.select(&IMAGE_PLACEHOLDER_SEL);
    let first = matches.next()?;
    if matches.next().is_some() {
        warn!("multiple image placeholders in one story; skipping image injection");
        return None;
    }
    let element_id = first.value().attr("id")?;
    let Some((image_id, story_id)) = element_id.split_once('@') else {
        warn!(id = element_id, "image placeholder id is not imageId@storyId");
        return None;
    };
    Some(ImagePlaceholder {
        image_id: image_id.to_string(),
        story_id: story_id.to_string(),
        element_id: element_id.to_string(),
    })
}

/// Apply the rewrite rule set while serializing the parsed markup.
pub(crate) fn rewrite(raw: &str, injected: Option<&InjectedImage>) -> Rewritten {
    let doc = Html::parse_fragment(raw);
    let mut out = Rewritten::default();
    for child in doc.root_element().children() {
        render_node(child, injected, &mut out);
    }
    out
}

fn render_node(node: NodeRef<'_, Node>, injected: Option<&InjectedImage>, out: &mut Rewritten) {
    match node.value() {
        Node::Text(text) => {
            escape_into(text, &mut out.html);
            out.text.push_str(text);
        }
        Node::Comment(comment) => {
            out.html.push_str("<!--");
            out.html.push_str(comment);
            out.html.push_str("-->");
        }
        Node::Element(_) => render_element(node, injected, out),
        _ => {}
    }
}

fn render_element(node: NodeRef<'_, Node>, injected: Option<&InjectedImage>, out: &mut Rewritten) {
    let Node::Element(el) = node.value() else {
        return;
    };
    if el.classes().any(|c| REMOVE_CLASSES.contains(&c)) {
        return;
    }

    let name = el.name();
    out.html.push('<');
    out.html.push_str(name);
    for (attr, value) in el.attrs() {
        out.html.push(' ');
        out.html.push_str(attr);
        out.html.push_str("=\"");
        escape_attr_into(value, &mut out.html);
        out.html.push('"');
    }
    if VOID_ELEMENTS.contains(&name) {
        out.html.push_str(" />");
        return;
    }
    out.html.push('>');

    let has_class = |class: &str| el.classes().any(|c| c == class);

    if let Some(img) = injected {
        if name == "aside" && el.attr("id") == Some(img.element_id.as_str()) && !has_lead_image(node)
        {
            out.html.push_str("<img class=\"image\" src=\"");
            escape_attr_into(&img.src, &mut out.html);
            out.html.push_str("\" />");
        }
    }
    if has_class("frage-ipad") {
        out.html.push_str("<div class=\"name-ipad\">FRAGE: </div>");
        out.text.push_str("FRAGE: ");
    }
    if has_class("autor-ipad") {
        out.html.push_str("VON ");
        out.text.push_str("VON ");
    }

    for child in node.children() {
        render_node(child, injected, out);
    }

    if has_class("name-ipad") {
        out.html.push_str(": ");
        out.text.push_str(": ");
    }
    if has_class("autorenkuerzel-ipad") {
        out.html.push_str(" - ");
        out.text.push_str(" - ");
    }
    if name == "stichwort" || has_class("ortsmarke-ipad") {
        out.html.push(' ');
        out.text.push(' ');
    }

    out.html.push_str("</");
    out.html.push_str(name);
    out.html.push('>');
}

/// True when the placeholder already starts with an injected lead image,
/// which happens when already-rewritten markup is fed back in.
fn has_lead_image(node: NodeRef<'_, Node>) -> bool {
    node.children()
        .find_map(|child| match child.value() {
            Node::Element(el) => Some(el.name() == "img" && el.classes().any(|c| c == "image")),
            _ => None,
        })
        .unwrap_or(false)
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr_into(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

/// Minimal HTML text escaping, shared with the article page shell.
pub(crate) fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(text, &mut out);
    out
}
