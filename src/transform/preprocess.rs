//! Input clean-up before any parser sees the content

use crate::models::Dialect;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref XML_DECLARATION: Regex =
        Regex::new(r"^<\?xml[^>]*\?>").expect("static declaration pattern");
    static ref DOCTYPE: Regex =
        Regex::new(r"(?s)<!DOCTYPE[^>\[]*(\[.*?\])?\s*>").expect("static doctype pattern");
    /// Name of the root start tag, past any leading comments or processing instructions
    static ref ROOT_TAG: Regex =
        Regex::new(r"(?s)^(?:\s*(?:<\?.*?\?>|<!--.*?-->))*\s*<([A-Za-z_][\w:.\-]*)")
            .expect("static root pattern");
}

/// Strip a byte order mark, normalize line endings and trim
pub fn preprocess(content: &str) -> String {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    content.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

/// [`preprocess`] plus XML repairs
///
/// The declaration is removed (it is re-derived on output), any `<!DOCTYPE>`
/// is dropped, and `xmlns:cmme` / `xmlns:mei` are declared on the root when
/// passthrough-prefixed attributes appear without a declaration.
pub fn preprocess_xml(content: &str) -> String {
    let content = preprocess(content);
    let content = XML_DECLARATION.replace(&content, "");
    let content = DOCTYPE.replace_all(&content, "");
    let mut content = content.trim().to_string();

    for dialect in [Dialect::Cmme, Dialect::Mei] {
        if let Some(repaired) = declare_prefix(&content, dialect) {
            log::debug!("declared missing xmlns:{} on the root element", dialect.prefix());
            content = repaired;
        }
    }
    content
}

/// `content` with `xmlns:<prefix>` added to the root, if it needs one
fn declare_prefix(content: &str, dialect: Dialect) -> Option<String> {
    let prefix = dialect.prefix();
    let declaration = format!("xmlns:{}=", prefix);
    if content.contains(&declaration) || !uses_prefix(content, prefix) {
        return None;
    }
    let at = ROOT_TAG.captures(content)?.get(1)?.end();
    Some(format!(
        "{} xmlns:{}=\"{}\"{}",
        &content[..at],
        prefix,
        dialect.namespace(),
        &content[at..]
    ))
}

/// An attribute or element name qualified with `prefix:` occurs somewhere
fn uses_prefix(content: &str, prefix: &str) -> bool {
    let attribute = format!(" {}:", prefix);
    let element = format!("<{}:", prefix);
    content.contains(&attribute)
        || content.contains(&element)
        || content.contains(&format!("\n{}:", prefix))
        || content.contains(&format!("\t{}:", prefix))
}
