//! A small CSS selector engine.
//!
//! Supported: type and universal selectors, `#id`, `.class`, attribute
//! selectors (`[a]`, `=`, `~=`, `*=`, `^=`, `$=`, optional ` i` flag),
//! compound selectors, descendant and child combinators, and comma lists.
//! Anything else (pseudo-classes, sibling combinators) is rejected with
//! [`PageError::UnsupportedSelector`].

use crate::document::Document;
use crate::error::{PageError, PageResult};
use crate::node::{Element, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals,
    Includes,
    Contains,
    Prefix,
    Suffix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    op: AttrOp,
    value: String,
    case_insensitive: bool,
}

impl AttrSelector {
    fn matches(&self, el: &Element) -> bool {
        let Some(actual) = el.attr(&self.name) else {
            return false;
        };
        let (actual, expected) = if self.case_insensitive {
            (actual.to_ascii_lowercase(), self.value.to_ascii_lowercase())
        } else {
            (actual.to_string(), self.value.clone())
        };
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == expected,
            AttrOp::Includes => actual.split_ascii_whitespace().any(|w| w == expected),
            AttrOp::Contains => !expected.is_empty() && actual.contains(&expected),
            AttrOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
            AttrOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

impl Compound {
    fn matches(&self, el: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if el.tag() != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self
            .classes
            .iter()
            .all(|class| el.classes().any(|c| c == class))
        {
            return false;
        }
        self.attrs.iter().all(|attr| attr.matches(el))
    }

    fn specificity(&self) -> Specificity {
        Specificity(
            u32::from(self.id.is_some()),
            (self.classes.len() + self.attrs.len()) as u32,
            u32::from(self.tag.is_some()),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// Selector weight as (ids, classes and attributes, types). Ordered
/// lexicographically, so a single id outranks any number of classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl std::ops::Add for Specificity {
    type Output = Specificity;

    fn add(self, other: Specificity) -> Specificity {
        Specificity(self.0 + other.0, self.1 + other.1, self.2 + other.2)
    }
}

/// The subject compound plus its ancestor constraints, nearest first. Each
/// combinator links an ancestor to the compound just before it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    subject: Compound,
    ancestors: Vec<(Combinator, Compound)>,
}

impl Complex {
    fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some(el) = doc.element(id) else {
            return false;
        };
        self.subject.matches(el) && self.match_ancestors(doc, id, 0)
    }

    fn match_ancestors(&self, doc: &Document, id: NodeId, index: usize) -> bool {
        let Some((combinator, compound)) = self.ancestors.get(index) else {
            return true;
        };
        let mut cursor = doc.parent(id);
        while let Some(current) = cursor {
            if let Some(el) = doc.element(current) {
                if compound.matches(el) && self.match_ancestors(doc, current, index + 1) {
                    return true;
                }
            }
            if *combinator == Combinator::Child {
                return false;
            }
            cursor = doc.parent(current);
        }
        false
    }

    fn specificity(&self) -> Specificity {
        self.ancestors
            .iter()
            .fold(self.subject.specificity(), |acc, (_, compound)| {
                acc + compound.specificity()
            })
    }
}

/// A parsed, comma-separated selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<Complex>,
}

impl SelectorList {
    pub fn parse(input: &str) -> PageResult<Self> {
        let selectors = split_top_level(input, ',')
            .into_iter()
            .map(|part| parse_complex(part.trim(), input))
            .collect::<PageResult<Vec<_>>>()?;
        if selectors.is_empty() {
            return Err(unsupported(input));
        }
        Ok(Self { selectors })
    }

    /// Whether the node is an element matching any selector in the list.
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        self.selectors.iter().any(|sel| sel.matches(doc, id))
    }

    /// Specificity of the heaviest selector in the list that matches the
    /// node, or `None` when nothing matches.
    pub fn match_specificity(&self, doc: &Document, id: NodeId) -> Option<Specificity> {
        self.selectors
            .iter()
            .filter(|sel| sel.matches(doc, id))
            .map(Complex::specificity)
            .max()
    }
}

fn unsupported(input: &str) -> PageError {
    PageError::UnsupportedSelector(input.to_string())
}

/// Split on `sep` outside brackets and quotes.
fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, c) if c == sep && depth == 0 => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn parse_complex(text: &str, whole: &str) -> PageResult<Complex> {
    if text.is_empty() {
        return Err(unsupported(whole));
    }
    // Tokenize into compounds and combinators, left to right.
    let mut compounds: Vec<Compound> = Vec::new();
    let mut combinators: Vec<Combinator> = Vec::new();
    let mut pending: Option<Combinator> = None;
    let chars: Vec<char> = text.chars().collect();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            if !compounds.is_empty() && pending.is_none() {
                pending = Some(Combinator::Descendant);
            }
            pos += 1;
            continue;
        }
        if c == '>' {
            if compounds.is_empty() || pending == Some(Combinator::Child) {
                return Err(unsupported(whole));
            }
            pending = Some(Combinator::Child);
            pos += 1;
            continue;
        }
        if matches!(c, '+' | '~' | ':') {
            return Err(unsupported(whole));
        }
        let (compound, next) = parse_compound(&chars, pos, whole)?;
        if let Some(combinator) = pending.take() {
            combinators.push(combinator);
        } else if !compounds.is_empty() {
            return Err(unsupported(whole));
        }
        compounds.push(compound);
        pos = next;
    }

    if pending == Some(Combinator::Child) {
        return Err(unsupported(whole));
    }
    let subject = compounds.pop().ok_or_else(|| unsupported(whole))?;
    let mut ancestors = Vec::with_capacity(compounds.len());
    while let Some(compound) = compounds.pop() {
        let combinator = combinators.pop().unwrap_or(Combinator::Descendant);
        ancestors.push((combinator, compound));
    }
    Ok(Complex { subject, ancestors })
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn read_ident(chars: &[char], mut pos: usize) -> (String, usize) {
    let start = pos;
    while pos < chars.len() && is_ident_char(chars[pos]) {
        pos += 1;
    }
    (chars[start..pos].iter().collect(), pos)
}

fn parse_compound(chars: &[char], mut pos: usize, whole: &str) -> PageResult<(Compound, usize)> {
    let mut compound = Compound::default();
    let start = pos;

    if chars[pos] == '*' {
        pos += 1;
    } else if is_ident_char(chars[pos]) {
        let (tag, next) = read_ident(chars, pos);
        compound.tag = Some(tag.to_ascii_lowercase());
        pos = next;
    }

    while pos < chars.len() {
        match chars[pos] {
            '#' => {
                let (id, next) = read_ident(chars, pos + 1);
                if id.is_empty() {
                    return Err(unsupported(whole));
                }
                compound.id = Some(id);
                pos = next;
            }
            '.' => {
                let (class, next) = read_ident(chars, pos + 1);
                if class.is_empty() {
                    return Err(unsupported(whole));
                }
                compound.classes.push(class);
                pos = next;
            }
            '[' => {
                let (attr, next) = parse_attr(chars, pos + 1, whole)?;
                compound.attrs.push(attr);
                pos = next;
            }
            _ => break,
        }
    }

    if pos == start {
        return Err(unsupported(whole));
    }
    Ok((compound, pos))
}

fn skip_ws(chars: &[char], mut pos: usize) -> usize {
    while pos < chars.len() && chars[pos].is_whitespace() {
        pos += 1;
    }
    pos
}

fn parse_attr(chars: &[char], pos: usize, whole: &str) -> PageResult<(AttrSelector, usize)> {
    let pos = skip_ws(chars, pos);
    let (name, pos) = read_ident(chars, pos);
    if name.is_empty() {
        return Err(unsupported(whole));
    }
    let mut pos = skip_ws(chars, pos);

    let op = match (chars.get(pos), chars.get(pos + 1)) {
        (Some(']'), _) => {
            let attr = AttrSelector {
                name: name.to_ascii_lowercase(),
                op: AttrOp::Exists,
                value: String::new(),
                case_insensitive: false,
            };
            return Ok((attr, pos + 1));
        }
        (Some('='), _) => {
            pos += 1;
            AttrOp::Equals
        }
        (Some(c), Some('=')) => {
            pos += 2;
            match c {
                '~' => AttrOp::Includes,
                '*' => AttrOp::Contains,
                '^' => AttrOp::Prefix,
                '$' => AttrOp::Suffix,
                _ => return Err(unsupported(whole)),
            }
        }
        _ => return Err(unsupported(whole)),
    };

    pos = skip_ws(chars, pos);
    let value = match chars.get(pos) {
        Some(&q) if q == '"' || q == '\'' => {
            let close = chars[pos + 1..]
                .iter()
                .position(|c| *c == q)
                .ok_or_else(|| unsupported(whole))?;
            let value: String = chars[pos + 1..pos + 1 + close].iter().collect();
            pos += close + 2;
            value
        }
        _ => {
            let (value, next) = read_ident(chars, pos);
            pos = next;
            value
        }
    };

    pos = skip_ws(chars, pos);
    let mut case_insensitive = false;
    if matches!(chars.get(pos), Some('i' | 'I')) {
        case_insensitive = true;
        pos = skip_ws(chars, pos + 1);
    }
    if chars.get(pos) != Some(&']') {
        return Err(unsupported(whole));
    }

    Ok((
        AttrSelector {
            name: name.to_ascii_lowercase(),
            op,
            value,
            case_insensitive,
        },
        pos + 1,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let html = doc.create_element("html");
        let body = doc.create_element("body");
        let section = doc.create_element("section");
        let frame = doc.create_element("iframe");
        let img = doc.create_element("img");
        doc.append_child(doc.root(), html).unwrap();
        doc.append_child(html, body).unwrap();
        doc.append_child(body, section).unwrap();
        doc.append_child(section, frame).unwrap();
        doc.append_child(body, img).unwrap();
        doc.set_attr(section, "id", "sidebar").unwrap();
        doc.set_attr(section, "class", "ads sponsored").unwrap();
        doc.set_attr(frame, "src", "https://doubleclick.net/ads/x").unwrap();
        doc.set_attr(img, "src", "/media/cat.GIF").unwrap();
        (doc, section, frame, img)
    }

    fn matches(doc: &Document, id: NodeId, sel: &str) -> bool {
        SelectorList::parse(sel).unwrap().matches(doc, id)
    }

    #[test]
    fn test_simple_selectors() {
        let (doc, section, frame, _) = page();
        assert!(matches(&doc, section, "section"));
        assert!(matches(&doc, section, "#sidebar"));
        assert!(matches(&doc, section, ".ads"));
        assert!(matches(&doc, section, ".ads.sponsored"));
        assert!(!matches(&doc, section, ".ads.popup"));
        assert!(matches(&doc, frame, "*"));
    }

    #[test]
    fn test_attribute_operators() {
        let (doc, _, frame, img) = page();
        assert!(matches(&doc, frame, "iframe[src]"));
        assert!(matches(&doc, frame, r#"iframe[src*="ads"]"#));
        assert!(matches(&doc, frame, "[src^='https://']"));
        assert!(!matches(&doc, img, r#"img[src$=".gif"]"#));
        assert!(matches(&doc, img, r#"img[src$=".gif" i]"#));
        assert!(!matches(&doc, img, r#"img[src*="ads"]"#));
    }

    #[test]
    fn test_combinators() {
        let (doc, _, frame, img) = page();
        assert!(matches(&doc, frame, "body iframe"));
        assert!(matches(&doc, frame, "section > iframe"));
        assert!(!matches(&doc, frame, "body > iframe"));
        assert!(matches(&doc, frame, "html body > section iframe"));
        assert!(!matches(&doc, img, "section img"));
    }

    #[test]
    fn test_selector_list() {
        let (doc, section, _, img) = page();
        let list = SelectorList::parse("img, video, #sidebar").unwrap();
        assert!(list.matches(&doc, img));
        assert!(list.matches(&doc, section));
    }

    #[test]
    fn test_specificity_counts_every_compound() {
        let spec = |sel: &str| SelectorList::parse(sel).unwrap().selectors[0].specificity();
        assert_eq!(spec("*"), Specificity(0, 0, 0));
        assert_eq!(spec("div"), Specificity(0, 0, 1));
        assert_eq!(spec("#main"), Specificity(1, 0, 0));
        assert_eq!(spec("section.ads[data-x]"), Specificity(0, 2, 1));
        assert_eq!(spec("body > section#sidebar .ads"), Specificity(1, 1, 2));
        assert!(spec("#main") > spec("html body div.a.b.c"));
    }

    #[test]
    fn test_match_specificity_takes_heaviest_matching_selector() {
        let (doc, section, _, img) = page();
        let list = SelectorList::parse("section, #sidebar, .ads.sponsored, video").unwrap();
        assert_eq!(list.match_specificity(&doc, section), Some(Specificity(1, 0, 0)));
        assert_eq!(list.match_specificity(&doc, img), None);
    }

    #[test]
    fn test_non_elements_never_match() {
        let (doc, _, _, _) = page();
        assert!(!matches(&doc, doc.root(), "*"));
    }

    #[test]
    fn test_unsupported_selectors() {
        for sel in ["a:hover", "a + b", "a ~ b", "", "a,", "[=x]", "div >", "[src*=\"x\""] {
            assert!(
                matches!(
                    SelectorList::parse(sel),
                    Err(PageError::UnsupportedSelector(_))
                ),
                "{sel} should be rejected"
            );
        }
    }
}
