/// Represents ways to locate an element in the page DOM
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Standard CSS selector, evaluated with `querySelectorAll`
    Css(String),
    /// XPath expression, evaluated with `document.evaluate`
    XPath(String),
    /// Element whose own trimmed text equals the given string
    Text(String),
    /// Represents an invalid selector string, with a reason.
    Invalid(String),
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::Css(s) => write!(f, "css:{s}"),
            Selector::XPath(s) => write!(f, "xpath:{s}"),
            Selector::Text(s) => write!(f, "text:{s}"),
            Selector::Invalid(reason) => write!(f, "invalid({reason})"),
        }
    }
}

impl Selector {
    pub fn css(s: impl Into<String>) -> Self {
        Selector::Css(s.into())
    }

    pub fn xpath(s: impl Into<String>) -> Self {
        Selector::XPath(s.into())
    }

    pub fn text(s: impl Into<String>) -> Self {
        Selector::Text(s.into())
    }

    /// JavaScript expression evaluating to an array of matching elements.
    ///
    /// Returns `None` for `Selector::Invalid`.
    pub fn to_js_query(&self) -> Option<String> {
        match self {
            Selector::Css(css) => Some(format!(
                "Array.from(document.querySelectorAll({}))",
                js_string(css)
            )),
            Selector::XPath(xpath) => Some(format!(
                "(function(){{const r=document.evaluate({},document,null,XPathResult.ORDERED_NODE_SNAPSHOT_TYPE,null);const out=[];for(let i=0;i<r.snapshotLength;i++){{out.push(r.snapshotItem(i));}}return out;}})()",
                js_string(xpath)
            )),
            Selector::Text(text) => Some(format!(
                "Array.from(document.querySelectorAll('body *')).filter(e=>Array.from(e.childNodes).some(n=>n.nodeType===3&&n.textContent.trim()==={}))",
                js_string(text)
            )),
            Selector::Invalid(_) => None,
        }
    }
}

/// Quote a Rust string as a JavaScript string literal.
fn js_string(s: &str) -> String {
    // JSON string literals are valid JavaScript string literals
    serde_json::Value::String(s.to_string()).to_string()
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return Selector::Invalid("empty selector".to_string());
        }

        if let Some(rest) = s.strip_prefix("xpath:") {
            return Selector::XPath(rest.trim().to_string());
        }
        if let Some(rest) = s.strip_prefix("text:") {
            return Selector::Text(rest.trim().to_string());
        }
        if let Some(rest) = s.strip_prefix("css:") {
            return Selector::Css(rest.trim().to_string());
        }
        if s.starts_with('/') || s.starts_with("(/") {
            return Selector::XPath(s.to_string());
        }

        Selector::Css(s.to_string())
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        Selector::from(s.as_str())
    }
}

impl From<&String> for Selector {
    fn from(s: &String) -> Self {
        Selector::from(s.as_str())
    }
}
