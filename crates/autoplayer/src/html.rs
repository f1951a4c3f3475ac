//! Lightweight regex scanning over raw page HTML.
//!
//! The game pages are small, server-rendered tables. Classifying them and
//! pulling out a handful of values never needs a DOM, only the opening tags
//! and the text between them.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([a-zA-Z][a-zA-Z0-9-]*)((?:\s+[^<>]*?)?)\s*/?>").expect("static regex is valid")
});

static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([a-zA-Z_:@][-a-zA-Z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("static regex is valid")
});

static SKIPPED_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<!--.*?-->|<script\b.*?</script\s*>|<style\b.*?</style\s*>")
        .expect("static regex is valid")
});

static ANY_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("static regex is valid"));

/// An opening tag with its attributes, names lowercased
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Byte offset of the tag in the scanned HTML
    pub offset: usize,
}

impl Tag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.attributes
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|token| token == class))
    }

    /// Exact attribute match. `class` also matches a single class token, so
    /// both `"login-form"` and `"container theme-bg"` work as expected.
    pub fn matches(&self, name: &str, value: &str) -> bool {
        match self.attr(name) {
            Some(actual) if actual == value => true,
            Some(_) if name.eq_ignore_ascii_case("class") => {
                let wanted: Vec<&str> = value.split_whitespace().collect();
                !wanted.is_empty() && wanted.iter().all(|w| self.has_class(w))
            }
            _ => false,
        }
    }
}

/// All opening tags in document order, optionally filtered by tag name.
pub fn tags(html: &str, name: Option<&str>) -> Vec<Tag> {
    let html = mask_skipped_blocks(html);
    TAG_RE
        .captures_iter(&html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let tag_name = caps.get(1)?.as_str().to_ascii_lowercase();
            if name.is_some_and(|n| !n.eq_ignore_ascii_case(&tag_name)) {
                return None;
            }
            let attributes = caps
                .get(2)
                .map(|raw| parse_attributes(raw.as_str()))
                .unwrap_or_default();
            Some(Tag {
                name: tag_name,
                attributes,
                offset: whole.start(),
            })
        })
        .collect()
}

fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(raw)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            Some((key, value))
        })
        .collect()
}

/// True when some tag (of `name`, if given) carries every attribute in `attrs`.
pub fn has_tag_with(html: &str, name: Option<&str>, attrs: &[(&str, &str)]) -> bool {
    find_tag_with(html, name, attrs).is_some()
}

pub fn find_tag_with(html: &str, name: Option<&str>, attrs: &[(&str, &str)]) -> Option<Tag> {
    tags(html, name)
        .into_iter()
        .find(|tag| attrs.iter().all(|(k, v)| tag.matches(k, v)))
}

/// The text nodes of the document in order, trimmed, entities decoded,
/// empty ones dropped. Scripts, styles and comments are skipped.
pub fn text_segments(html: &str) -> Vec<String> {
    let html = SKIPPED_BLOCK_RE.replace_all(html, "<br>");
    ANY_TAG_RE
        .split(&html)
        .map(|s| decode_entities(s).trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Markup stripped down to whitespace-normalised text.
pub fn strip_tags(html: &str) -> String {
    text_segments(html).join(" ")
}

/// The HTML from the first tag carrying `class` onwards, or the whole
/// document when no such tag exists.
pub fn from_class<'a>(html: &'a str, class: &str) -> &'a str {
    tags(html, None)
        .into_iter()
        .find(|tag| tag.has_class(class))
        .and_then(|tag| html.get(tag.offset..))
        .unwrap_or(html)
}

pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

// Blank out comments and script bodies without moving byte offsets
fn mask_skipped_blocks(html: &str) -> std::borrow::Cow<'_, str> {
    SKIPPED_BLOCK_RE.replace_all(html, |caps: &regex::Captures| " ".repeat(caps[0].len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_scanning_handles_quoting_and_case() {
        let html = r#"<DIV Class="contentModule phpGamesNonPortalView"><INPUT type=hidden name='nxactor' value="3"><img src="//images.neopets.com/nq2/x/com_atk.gif" border=0></DIV>"#;
        let inputs = tags(html, Some("input"));
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].attr("TYPE"), Some("hidden"));
        assert_eq!(inputs[0].attr("name"), Some("nxactor"));
        assert_eq!(inputs[0].attr("value"), Some("3"));

        let img = find_tag_with(html, Some("img"), &[("src", "//images.neopets.com/nq2/x/com_atk.gif")]);
        assert_eq!(img.and_then(|t| t.attr("border").map(str::to_string)), Some("0".into()));
    }

    #[test]
    fn test_class_matching() {
        let html = r#"<div class="container theme-bg home"></div><form class="login-form"></form>"#;
        assert!(has_tag_with(html, None, &[("class", "container theme-bg")]));
        assert!(has_tag_with(html, Some("form"), &[("class", "login-form")]));
        assert!(!has_tag_with(html, None, &[("class", "theme-fg")]));
    }

    #[test]
    fn test_commented_markup_is_ignored() {
        let html = r#"<!-- <map name="navmap"></map> --><script>var s = "<img alt='Begin the Fight!'>";</script><p>hi</p>"#;
        assert!(!has_tag_with(html, None, &[("name", "navmap")]));
        assert!(!has_tag_with(html, Some("img"), &[("alt", "Begin the Fight!")]));
        assert_eq!(strip_tags(html), "hi");
    }

    #[test]
    fn test_text_segments() {
        let html = "<td><b>Rohane</b><br><font size=1>45/60</font>&nbsp;</td><td>Giant&amp;Bat</td>";
        assert_eq!(text_segments(html), vec!["Rohane", "45/60", "Giant&Bat"]);
    }

    #[test]
    fn test_from_class() {
        let html = r#"<div class="header">Rohane</div><div class="contentModule phpGamesNonPortalView">game</div>"#;
        assert!(from_class(html, "phpGamesNonPortalView").starts_with("<div class=\"contentModule"));
        assert_eq!(from_class("<p>x</p>", "missing"), "<p>x</p>");
    }
}
