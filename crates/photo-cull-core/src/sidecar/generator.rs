//! Edit-instruction document generation.
//!
//! The template is treated as an attribute table: the first
//! `rdf:Description` start tag is parsed into attribute spans, the
//! straighten field is spliced in before the anchor attribute and the crop
//! flag is rewritten in place. Templates whose start tag cannot be parsed go
//! through a plain text fallback. All bytes outside the touched fields are
//! preserved.

use serde::Serialize;
use tracing::{debug, warn};

/// Attribute the straighten field is inserted before.
pub const ANCHOR_ATTRIBUTE: &str = "crs:AsShotTint";
/// Signed straighten angle in degrees.
pub const STRAIGHTEN_ATTRIBUTE: &str = "crs:StraightenAngle";
/// Auto-crop flag.
pub const HAS_CROP_ATTRIBUTE: &str = "crs:HasCrop";
/// Tilts at or below this magnitude (degrees) are not corrected.
pub const MIN_STRAIGHTEN_ANGLE: f64 = 0.1;

const DESCRIPTION_TAG: &str = "<rdf:Description";

/// Built-in camera-raw preset.
pub const BUILTIN_TEMPLATE: &str = include_str!("preset.xmp");

/// How the straighten field was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionStrategy {
    /// Tilt below the noise floor; template emitted as is.
    Unchanged,
    /// Start tag parsed and edited as an attribute table.
    AttributeTable,
    /// Start tag not parseable; inserted before the anchor text.
    TextAnchor,
    /// Neither shape found; template emitted as is.
    Untouched,
}

/// Generated sidecar content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarDocument {
    /// Full document text.
    pub content: String,
    /// Path taken by the generator.
    pub strategy: InjectionStrategy,
}

/// Sidecar generator over a fixed template.
#[derive(Debug, Clone)]
pub struct SidecarGenerator {
    template: String,
}

impl Default for SidecarGenerator {
    fn default() -> Self {
        Self::new(BUILTIN_TEMPLATE)
    }
}

impl SidecarGenerator {
    /// Creates a generator over `template`.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Returns the template text.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Generates the sidecar for a photo with the given tilt.
    #[must_use]
    pub fn generate(&self, tilt_angle: f64) -> SidecarDocument {
        generate(&self.template, tilt_angle)
    }
}

/// Generates a sidecar from `template` for a photo tilted by `tilt_angle` degrees.
#[must_use]
pub fn generate(template: &str, tilt_angle: f64) -> SidecarDocument {
    if !tilt_angle.is_finite() || tilt_angle.abs() <= MIN_STRAIGHTEN_ANGLE {
        return SidecarDocument {
            content: template.to_owned(),
            strategy: InjectionStrategy::Unchanged,
        };
    }

    let angle = format!("{tilt_angle:.2}");

    if let Some(tag) = parse_start_tag(template) {
        debug!(attributes = tag.attributes.len(), "Editing attribute table");
        return SidecarDocument {
            content: edit_attribute_table(template, &tag, &angle),
            strategy: InjectionStrategy::AttributeTable,
        };
    }

    if let Some(content) = edit_text_anchor(template, &angle) {
        debug!("Start tag not parseable, used anchor text");
        return SidecarDocument {
            content,
            strategy: InjectionStrategy::TextAnchor,
        };
    }

    warn!("Template has no description tag and no anchor, straighten angle {angle} not applied");
    SidecarDocument {
        content: template.to_owned(),
        strategy: InjectionStrategy::Untouched,
    }
}

/// Byte spans of one `name="value"` pair.
#[derive(Debug, Clone, Copy)]
struct AttributeSpan {
    /// Start of the whitespace run preceding the name.
    lead: usize,
    /// Start of the name.
    name_start: usize,
    /// End of the name.
    name_end: usize,
    /// Start of the value (after the opening quote).
    value_start: usize,
    /// End of the value (before the closing quote).
    value_end: usize,
}

impl AttributeSpan {
    fn name<'a>(&self, text: &'a str) -> &'a str {
        &text[self.name_start..self.name_end]
    }

    fn leading_whitespace<'a>(&self, text: &'a str) -> &'a str {
        &text[self.lead..self.name_start]
    }
}

/// Parsed start tag of the first description element.
#[derive(Debug)]
struct StartTag {
    attributes: Vec<AttributeSpan>,
    /// Offset of the closing `>` or `/>`.
    close: usize,
}

impl StartTag {
    fn find(&self, text: &str, name: &str) -> Option<AttributeSpan> {
        self.attributes.iter().copied().find(|a| a.name(text) == name)
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b':' | b'_' | b'-' | b'.')
}

/// Parses the attribute table of the first `rdf:Description` start tag.
///
/// Returns `None` for any shape other than whitespace-separated
/// `name="value"` or `name='value'` pairs closed by `>` or `/>`.
fn parse_start_tag(text: &str) -> Option<StartTag> {
    let bytes = text.as_bytes();
    let mut pos = text.find(DESCRIPTION_TAG)? + DESCRIPTION_TAG.len();
    let mut attributes = Vec::new();

    loop {
        let lead = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        match bytes.get(pos)? {
            b'>' => return Some(StartTag { attributes, close: pos }),
            b'/' if bytes.get(pos + 1) == Some(&b'>') => {
                return Some(StartTag { attributes, close: pos })
            }
            _ => {}
        }
        // Attributes must be separated by whitespace.
        if pos == lead {
            return None;
        }

        let name_start = pos;
        while pos < bytes.len() && is_name_byte(bytes[pos]) {
            pos += 1;
        }
        let name_end = pos;
        if name_end == name_start || bytes.get(pos) != Some(&b'=') {
            return None;
        }
        pos += 1;

        let quote = *bytes.get(pos)?;
        if quote != b'"' && quote != b'\'' {
            return None;
        }
        let value_start = pos + 1;
        let value_len = text[value_start..].find(char::from(quote))?;
        let value_end = value_start + value_len;
        pos = value_end + 1;

        attributes.push(AttributeSpan {
            lead,
            name_start,
            name_end,
            value_start,
            value_end,
        });
    }
}

/// A pending replacement of `text[start..end]`.
struct Splice {
    start: usize,
    end: usize,
    text: String,
}

fn apply_splices(text: &str, mut splices: Vec<Splice>) -> String {
    splices.sort_by_key(|s| std::cmp::Reverse(s.start));
    let mut out = text.to_owned();
    for splice in splices {
        out.replace_range(splice.start..splice.end, &splice.text);
    }
    out
}

fn edit_attribute_table(text: &str, tag: &StartTag, angle: &str) -> String {
    let mut splices = Vec::new();
    let mut inserted = Vec::new();

    match tag.find(text, STRAIGHTEN_ATTRIBUTE) {
        Some(existing) => splices.push(Splice {
            start: existing.value_start,
            end: existing.value_end,
            text: angle.to_owned(),
        }),
        None => inserted.push(format!("{STRAIGHTEN_ATTRIBUTE}=\"{angle}\"")),
    }

    match tag.find(text, HAS_CROP_ATTRIBUTE) {
        Some(existing) => splices.push(Splice {
            start: existing.value_start,
            end: existing.value_end,
            text: String::from("True"),
        }),
        None => inserted.push(format!("{HAS_CROP_ATTRIBUTE}=\"True\"")),
    }

    if !inserted.is_empty() {
        if let Some(anchor) = tag.find(text, ANCHOR_ATTRIBUTE) {
            // Reuse the anchor's indentation after every inserted field.
            let separator = match anchor.leading_whitespace(text) {
                "" => " ",
                ws => ws,
            };
            let mut block = String::new();
            for field in &inserted {
                block.push_str(field);
                block.push_str(separator);
            }
            splices.push(Splice {
                start: anchor.name_start,
                end: anchor.name_start,
                text: block,
            });
        } else {
            let separator = tag
                .attributes
                .last()
                .map(|a| a.leading_whitespace(text))
                .filter(|ws| !ws.is_empty())
                .unwrap_or(" ");
            let mut block = String::new();
            for field in &inserted {
                block.push_str(separator);
                block.push_str(field);
            }
            // Keep the tag's own spacing before `>` or `/>`.
            let mut at = tag.close;
            while at > 0 && text.as_bytes()[at - 1].is_ascii_whitespace() {
                at -= 1;
            }
            splices.push(Splice {
                start: at,
                end: at,
                text: block,
            });
        }
    }

    apply_splices(text, splices)
}

fn edit_text_anchor(text: &str, angle: &str) -> Option<String> {
    let anchor = text.find(&format!("{ANCHOR_ATTRIBUTE}="))?;

    let line_start = text[..anchor]
        .char_indices()
        .rev()
        .find(|(_, c)| !c.is_whitespace())
        .map_or(0, |(i, c)| i + c.len_utf8());
    let separator = match &text[line_start..anchor] {
        "" => " ",
        ws => ws,
    };

    let mut splices = vec![];
    let mut block = format!("{STRAIGHTEN_ATTRIBUTE}=\"{angle}\"{separator}");

    let false_flag = format!("{HAS_CROP_ATTRIBUTE}=\"False\"");
    let true_flag = format!("{HAS_CROP_ATTRIBUTE}=\"True\"");
    if let Some(at) = text.find(&false_flag) {
        splices.push(Splice {
            start: at,
            end: at + false_flag.len(),
            text: true_flag,
        });
    } else if !text.contains(&true_flag) {
        block.push_str(&true_flag);
        block.push_str(separator);
    }

    splices.push(Splice {
        start: anchor,
        end: anchor,
        text: block,
    });
    Some(apply_splices(text, splices))
}
