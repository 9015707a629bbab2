//! Inline style declarations, colours, and a minimal computed-style cascade.
//!
//! The cascade is deliberately small: inline style wins, then the matching
//! `<style>` rule with the highest selector specificity (later rules break
//! ties), then inheritance (only `color` inherits), then initial values.
//! `!important` is accepted and ignored.

use std::fmt;

use crate::document::Document;
use crate::error::{PageError, PageResult};
use crate::node::NodeId;
use crate::selector::SelectorList;

/// An sRGB colour with alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a CSS colour: `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()`,
    /// `transparent`, or a common named colour.
    pub fn parse(value: &str) -> Option<Color> {
        let value = value.trim().to_ascii_lowercase();
        if value == "transparent" {
            return Some(Self::TRANSPARENT);
        }
        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(args) = value
            .strip_prefix("rgba(")
            .or_else(|| value.strip_prefix("rgb("))
        {
            return parse_rgb_args(args.strip_suffix(')')?);
        }
        named_color(&value)
    }

    /// Perceived luminance, `0.299·r + 0.587·g + 0.114·b`.
    pub fn luminance(&self) -> f64 {
        0.299 * f64::from(self.r) + 0.587 * f64::from(self.g) + 0.114 * f64::from(self.b)
    }

    /// Light colours have a luminance above 200. Alpha is not considered.
    pub fn is_light(&self) -> bool {
        self.luminance() > 200.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a >= 1.0 {
            write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
        } else {
            write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
        }
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let digit = |c: char| c.to_digit(16).map(|d| d as u8);
    let chars: Vec<char> = hex.chars().collect();
    match chars.len() {
        3 | 4 => {
            let mut parts = chars.iter().map(|c| digit(*c).map(|d| d * 17));
            let r = parts.next()??;
            let g = parts.next()??;
            let b = parts.next()??;
            let a = match parts.next() {
                Some(a) => f32::from(a?) / 255.0,
                None => 1.0,
            };
            Some(Color::rgba(r, g, b, a))
        }
        6 | 8 => {
            let byte = |i: usize| Some(digit(chars[i])? * 16 + digit(chars[i + 1])?);
            let a = if chars.len() == 8 {
                f32::from(byte(6)?) / 255.0
            } else {
                1.0
            };
            Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, a))
        }
        _ => None,
    }
}

fn parse_rgb_args(args: &str) -> Option<Color> {
    let parts: Vec<&str> = args
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();
    if parts.len() < 3 {
        return None;
    }
    let channel = |raw: &str| -> Option<u8> {
        let value = match raw.strip_suffix('%') {
            Some(pct) => pct.parse::<f64>().ok()? * 2.55,
            None => raw.parse::<f64>().ok()?,
        };
        Some(value.round().clamp(0.0, 255.0) as u8)
    };
    let alpha = match parts.get(3) {
        Some(raw) => match raw.strip_suffix('%') {
            Some(pct) => pct.parse::<f32>().ok()? / 100.0,
            None => raw.parse::<f32>().ok()?,
        },
        None => 1.0,
    };
    Some(Color::rgba(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha.clamp(0.0, 1.0),
    ))
}

fn named_color(name: &str) -> Option<Color> {
    let color = match name {
        "white" => Color::WHITE,
        "black" => Color::BLACK,
        "whitesmoke" => Color::rgb(245, 245, 245),
        "gainsboro" => Color::rgb(220, 220, 220),
        "lightgray" | "lightgrey" => Color::rgb(211, 211, 211),
        "silver" => Color::rgb(192, 192, 192),
        "gray" | "grey" => Color::rgb(128, 128, 128),
        "ivory" => Color::rgb(255, 255, 240),
        "snow" => Color::rgb(255, 250, 250),
        "beige" => Color::rgb(245, 245, 220),
        "linen" => Color::rgb(250, 240, 230),
        "red" => Color::rgb(255, 0, 0),
        "green" => Color::rgb(0, 128, 0),
        "blue" => Color::rgb(0, 0, 255),
        "navy" => Color::rgb(0, 0, 128),
        "yellow" => Color::rgb(255, 255, 0),
        _ => return None,
    };
    Some(color)
}

/// Parse a `prop: value; ...` block. Property names are lowercased.
pub fn parse_declarations(text: &str) -> Vec<(String, String)> {
    text.split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim();
            if prop.is_empty() || value.is_empty() {
                return None;
            }
            Some((prop, value.to_string()))
        })
        .collect()
}

/// Serialize declarations back into an inline `style` attribute.
pub fn serialize_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(prop, value)| format!("{prop}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One rule from a `<style>` block.
#[derive(Debug, Clone)]
pub struct StyleRule {
    pub selectors: SelectorList,
    pub declarations: Vec<(String, String)>,
}

/// Parse stylesheet text into rules, skipping at-rules and selectors the
/// matcher cannot handle.
pub fn parse_stylesheet(text: &str) -> Vec<StyleRule> {
    let text = strip_comments(text);
    let mut rules = Vec::new();
    for block in text.split('}') {
        let Some((prelude, body)) = block.split_once('{') else {
            continue;
        };
        let prelude = prelude.trim();
        if prelude.is_empty() || prelude.starts_with('@') {
            continue;
        }
        let Ok(selectors) = SelectorList::parse(prelude) else {
            continue;
        };
        let declarations = parse_declarations(body)
            .into_iter()
            .map(|(prop, value)| (prop, strip_important(&value).to_string()))
            .collect();
        rules.push(StyleRule {
            selectors,
            declarations,
        });
    }
    rules
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

fn strip_important(value: &str) -> &str {
    value
        .trim()
        .strip_suffix("!important")
        .map(str::trim_end)
        .unwrap_or(value.trim())
}

/// First colour token in a shorthand value such as `1px solid #eee`.
fn first_color_in(value: &str) -> Option<Color> {
    if let Some(color) = Color::parse(value) {
        return Some(color);
    }
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut tokens = Vec::new();
    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => {
                tokens.push(&value[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    tokens.push(&value[start..]);
    tokens
        .into_iter()
        .filter(|token| !token.is_empty())
        .find_map(Color::parse)
}

/// The resolved colours the dark-mode pass inspects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedStyle {
    pub background_color: Color,
    pub color: Color,
    pub border_color: Color,
    /// No border colour was declared, so `border_color` is `currentColor`.
    pub border_follows_text: bool,
}

/// One parse of the document's `<style>` blocks.
///
/// Detached from the document so callers can keep resolving while they
/// edit inline styles; re-read it after `<style>` contents change.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    rules: Vec<StyleRule>,
}

impl Stylesheet {
    pub fn from_document(doc: &Document) -> Self {
        let mut rules = Vec::new();
        for id in doc.descendants(doc.root()) {
            if doc.tag_name(id) == Some("style") {
                rules.extend(parse_stylesheet(&doc.text_content(id)));
            }
        }
        Self { rules }
    }

    /// Number of parsed rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Computed colours for an element.
    pub fn computed(&self, doc: &Document, id: NodeId) -> PageResult<ComputedStyle> {
        if !doc.is_alive(id) {
            return Err(PageError::StyleUnavailable(id));
        }
        if doc.element(id).is_none() {
            return Err(PageError::NotAnElement(id));
        }

        let color = self.inherited_color(doc, id);
        let background_color = self
            .declared(doc, id, &["background-color", "background"])
            .and_then(|(prop, value)| match prop.as_str() {
                "background" => first_color_in(&value),
                _ => Color::parse(&value),
            })
            .unwrap_or(Color::TRANSPARENT);
        let border = self
            .declared(doc, id, &["border-color", "border"])
            .and_then(|(_, value)| first_color_in(&value));

        Ok(ComputedStyle {
            background_color,
            color,
            border_color: border.unwrap_or(color),
            border_follows_text: border.is_none(),
        })
    }

    fn inherited_color(&self, doc: &Document, id: NodeId) -> Color {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if doc.element(current).is_some() {
                if let Some(color) = self
                    .declared(doc, current, &["color"])
                    .and_then(|(_, value)| Color::parse(&value))
                {
                    return color;
                }
            }
            cursor = doc.parent(current);
        }
        Color::BLACK
    }

    /// The winning declaration of any of `props` for an element, returned
    /// with the property that supplied it.
    ///
    /// Inline style beats every rule. Among rules the highest selector
    /// specificity wins, ties going to the later rule, and within one rule
    /// the later declaration wins. A longhand and its shorthand compete on
    /// the same footing, so `background` after `background-color` resets it.
    fn declared(&self, doc: &Document, id: NodeId, props: &[&str]) -> Option<(String, String)> {
        let wanted = |name: &str| props.contains(&name);
        if let Some(style) = doc.attr(id, "style") {
            if let Some((prop, value)) = parse_declarations(style)
                .into_iter()
                .filter(|(name, _)| wanted(name))
                .last()
            {
                return Some((prop, strip_important(&value).to_string()));
            }
        }
        self.rules
            .iter()
            .enumerate()
            .filter_map(|(index, rule)| {
                let specificity = rule.selectors.match_specificity(doc, id)?;
                Some((specificity, index, rule))
            })
            .flat_map(|(specificity, index, rule)| {
                rule.declarations
                    .iter()
                    .enumerate()
                    .filter(move |(_, (name, _))| wanted(name))
                    .map(move |(position, decl)| ((specificity, index, position), decl))
            })
            .max_by_key(|(key, _)| *key)
            .map(|(_, (prop, value))| (prop.clone(), value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rgb() {
        assert_eq!(Color::parse("rgb(255, 255, 255)"), Some(Color::WHITE));
        assert_eq!(
            Color::parse("rgba(10, 20, 30, 0.5)"),
            Some(Color::rgba(10, 20, 30, 0.5))
        );
        assert_eq!(Color::parse("rgb(255 0 0 / 50%)"), Some(Color::rgba(255, 0, 0, 0.5)));
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(Color::parse("#fff"), Some(Color::WHITE));
        assert_eq!(Color::parse("#181818"), Some(Color::rgb(24, 24, 24)));
        assert_eq!(Color::parse("#ff000080").map(|c| c.r), Some(255));
        assert_eq!(Color::parse("#12345"), None);
    }

    #[test]
    fn test_parse_named_and_invalid() {
        assert_eq!(Color::parse("White"), Some(Color::WHITE));
        assert_eq!(Color::parse("transparent"), Some(Color::TRANSPARENT));
        assert_eq!(Color::parse("papayawhipish"), None);
        assert_eq!(Color::parse("rgb(1, 2)"), None);
    }

    #[test]
    fn test_luminance_threshold() {
        assert!(Color::WHITE.is_light());
        assert!((Color::WHITE.luminance() - 255.0).abs() < 1e-9);
        assert!(!Color::rgb(24, 24, 24).is_light());
        assert!(!Color::TRANSPARENT.is_light());
        // 0.299*200 + 0.587*200 + 0.114*200 = 200, not above the threshold
        assert!(!Color::rgb(200, 200, 200).is_light());
    }

    #[test]
    fn test_color_display() {
        assert_eq!(Color::WHITE.to_string(), "rgb(255, 255, 255)");
        assert_eq!(Color::TRANSPARENT.to_string(), "rgba(0, 0, 0, 0)");
    }

    #[test]
    fn test_declarations_roundtrip() {
        let decls = parse_declarations("Color: red; ; background-color:#fff ;bogus");
        assert_eq!(
            decls,
            vec![
                ("color".to_string(), "red".to_string()),
                ("background-color".to_string(), "#fff".to_string()),
            ]
        );
        assert_eq!(
            serialize_declarations(&decls),
            "color: red; background-color: #fff;"
        );
    }

    #[test]
    fn test_parse_stylesheet_skips_unsupported() {
        let rules = parse_stylesheet(
            "/* c */ .card { background: #fff !important; }\n\
             @media print { }\n\
             a:hover { color: red; }\n\
             body, p { color: #222 }",
        );
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].declarations[0].1, "#fff");
    }

    #[test]
    fn test_first_color_in_shorthand() {
        assert_eq!(first_color_in("1px solid #eee"), Color::parse("#eee"));
        assert_eq!(
            first_color_in("url(x.png) rgb(250, 250, 250) no-repeat"),
            Some(Color::rgb(250, 250, 250))
        );
        assert_eq!(first_color_in("none"), None);
    }

    #[test]
    fn test_stylesheet_survives_inline_edits() {
        let mut doc = crate::html::parse_html("<style>p { color: #fff }</style><p id=a>x</p>");
        let sheet = doc.stylesheet();
        let p = doc.get_element_by_id("a").unwrap();
        assert_eq!(sheet.rule_count(), 1);
        assert!(sheet.computed(&doc, p).unwrap().color.is_light());
        doc.set_style(p, "color", "#ccc").unwrap();
        assert!(!sheet.computed(&doc, p).unwrap().color.is_light());
    }

    fn computed_for(html: &str, id: &str) -> ComputedStyle {
        let doc = crate::html::parse_html(html);
        let node = doc.get_element_by_id(id).unwrap();
        doc.computed_style(node).unwrap()
    }

    #[test]
    fn test_id_rule_beats_later_type_rule() {
        let style = computed_for(
            "<style>#main{background-color:#ffffff} div{background-color:#222222}</style><div id=main>x</div>",
            "main",
        );
        assert_eq!(style.background_color, Color::WHITE);
    }

    #[test]
    fn test_equal_specificity_goes_to_later_rule() {
        let style = computed_for(
            "<style>.a{color:#ffffff} .b{color:#111111}</style><p id=p class='b a'>x</p>",
            "p",
        );
        assert_eq!(style.color, Color::rgb(17, 17, 17));
    }

    #[test]
    fn test_shorthand_and_longhand_compete_by_position() {
        let later_shorthand = computed_for(
            "<style>div{background-color:#ffffff; background:url(x.png) #222222}</style><div id=d>x</div>",
            "d",
        );
        assert_eq!(later_shorthand.background_color, Color::rgb(34, 34, 34));

        let later_longhand = computed_for(
            "<style>div{background:#222222} .c{background-color:#ffffff}</style><div id=d class=c>x</div>",
            "d",
        );
        assert_eq!(later_longhand.background_color, Color::WHITE);

        let colourless_shorthand = computed_for(
            "<style>div{background-color:#ffffff; background:url(x.png)}</style><div id=d>x</div>",
            "d",
        );
        assert_eq!(colourless_shorthand.background_color, Color::TRANSPARENT);
    }

    #[test]
    fn test_inline_beats_id_rule() {
        let style = computed_for(
            "<style>#d{color:#ffffff !important}</style><div id=d style='color: #101010'>x</div>",
            "d",
        );
        assert_eq!(style.color, Color::rgb(16, 16, 16));
    }

    #[test]
    fn test_border_records_current_color_fallback() {
        let page = "<style>.x{color:#ffffff; border:1px solid #ffffff} .y{color:#ffffff; border:1px solid}</style>\
                    <div id=x class=x>a</div><div id=y class=y>b</div>";
        let declared = computed_for(page, "x");
        assert_eq!(declared.border_color, Color::WHITE);
        assert!(!declared.border_follows_text);

        let fallback = computed_for(page, "y");
        assert_eq!(fallback.border_color, Color::WHITE);
        assert!(fallback.border_follows_text);
    }
}
