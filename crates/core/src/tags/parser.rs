use serde::{Deserialize, Serialize};

use super::registry::{CustomTagDef, TagBehavior, TagRegistry, TagShape, TagVariant};
use super::TagError;

/// Position of a tag relative to the text it marks up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagBoundary {
    /// `<tag>`
    Start,
    /// `</tag>`
    End,
    /// `<tag/>`
    Marker,
}

/// A syntactically valid tag span, borrowed from the source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawTag<'a> {
    pub boundary: TagBoundary,
    pub name: &'a str,
    /// Everything between the name and the closing `>` (or `/>`).
    pub body: &'a str,
    /// Byte offset of the opening `<`.
    pub start: usize,
    /// Byte offset one past the closing `>`.
    pub end: usize,
    body_offset: usize,
}

impl<'a> RawTag<'a> {
    pub fn attributes(&self) -> AttributeIter<'a> {
        AttributeIter {
            tag: self.name,
            body: self.body,
            base: self.body_offset,
            pos: 0,
            started: false,
            failed: false,
        }
    }
}

/// Result of probing the text at a `<`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scan<'a> {
    Tag(RawTag<'a>),
    NotATag,
    /// A quote inside the span never closes. Only an error for names the caller recognizes.
    UnterminatedQuote { name: &'a str, offset: usize },
}

/// Probes for a tag whose `<` sits at byte `start`.
///
/// A valid span has at least one name character (letters and `-`), may carry quoted values
/// that contain `<` or `>`, and ends at the first unquoted `>`. `</tag/>` is rejected.
pub fn scan_tag(text: &str, start: usize) -> Scan<'_> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'<') {
        return Scan::NotATag;
    }
    let mut cursor = start + 1;
    let closing = bytes.get(cursor) == Some(&b'/');
    if closing {
        cursor += 1;
    }

    let name_start = cursor;
    while cursor < bytes.len() && is_name_byte(bytes[cursor]) {
        cursor += 1;
    }
    if cursor == name_start {
        return Scan::NotATag;
    }
    let name = &text[name_start..cursor];
    let body_start = cursor;
    match bytes.get(cursor) {
        Some(b'>' | b'=' | b'/') => {}
        Some(byte) if byte.is_ascii_whitespace() => {}
        _ => return Scan::NotATag,
    }

    loop {
        let Some(&byte) = bytes.get(cursor) else {
            return Scan::NotATag;
        };
        match byte {
            b'"' | b'\'' => match bytes[cursor + 1..].iter().position(|&b| b == byte) {
                Some(relative) => cursor += relative + 2,
                None => {
                    return Scan::UnterminatedQuote {
                        name,
                        offset: cursor,
                    }
                }
            },
            b'<' => return Scan::NotATag,
            b'>' => break,
            _ => cursor += 1,
        }
    }

    let close = cursor;
    let self_closing = close > body_start && bytes[close - 1] == b'/';
    if closing && self_closing {
        return Scan::NotATag;
    }
    let boundary = if closing {
        TagBoundary::End
    } else if self_closing {
        TagBoundary::Marker
    } else {
        TagBoundary::Start
    };
    let body_end = if self_closing { close - 1 } else { close };
    Scan::Tag(RawTag {
        boundary,
        name,
        body: &text[body_start..body_end],
        start,
        end: close + 1,
        body_offset: body_start,
    })
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'-'
}

/// One attribute; `name` is `None` for the implicit `<tag=value>` form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: Option<&'a str>,
    pub value: &'a str,
}

/// Walks a tag body without allocating. Stops after the first error.
#[derive(Clone, Debug)]
pub struct AttributeIter<'a> {
    tag: &'a str,
    body: &'a str,
    base: usize,
    pos: usize,
    started: bool,
    failed: bool,
}

impl<'a> AttributeIter<'a> {
    fn fail(&mut self, error: TagError) -> Option<Result<Attribute<'a>, TagError>> {
        self.failed = true;
        Some(Err(error))
    }

    fn value(&mut self, name: Option<&'a str>) -> Option<Result<Attribute<'a>, TagError>> {
        let body = self.body;
        let bytes = body.as_bytes();
        let value_start = self.pos;
        let value = match bytes.get(self.pos) {
            Some(&quote) if quote == b'"' || quote == b'\'' => {
                match bytes[self.pos + 1..].iter().position(|&b| b == quote) {
                    Some(relative) => {
                        let value = &body[self.pos + 1..self.pos + 1 + relative];
                        self.pos += relative + 2;
                        value
                    }
                    None => {
                        return self.fail(TagError::UnterminatedQuote {
                            tag: self.tag.to_string(),
                            offset: self.base + value_start,
                        })
                    }
                }
            }
            _ => {
                while self.pos < bytes.len() && !bytes[self.pos].is_ascii_whitespace() {
                    self.pos += 1;
                }
                &body[value_start..self.pos]
            }
        };
        if value.is_empty() {
            return self.fail(TagError::EmptyAttributeValue {
                tag: self.tag.to_string(),
                offset: self.base + value_start,
            });
        }
        Some(Ok(Attribute { name, value }))
    }
}

impl<'a> Iterator for AttributeIter<'a> {
    type Item = Result<Attribute<'a>, TagError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let body = self.body;
        let bytes = body.as_bytes();
        if !self.started {
            self.started = true;
            if bytes.first() == Some(&b'=') {
                self.pos = 1;
                return self.value(None);
            }
        }

        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return None;
        }

        let name_start = self.pos;
        while self.pos < bytes.len()
            && bytes[self.pos] != b'='
            && !bytes[self.pos].is_ascii_whitespace()
        {
            self.pos += 1;
        }
        let name = &body[name_start..self.pos];
        if name.is_empty() || !name.bytes().all(is_name_byte) {
            return self.fail(TagError::InvalidAttributeName {
                tag: self.tag.to_string(),
                attribute: name.to_string(),
                offset: self.base + name_start,
            });
        }
        if bytes.get(self.pos) != Some(&b'=') {
            return self.fail(TagError::EmptyAttributeValue {
                tag: self.tag.to_string(),
                offset: self.base + self.pos,
            });
        }
        self.pos += 1;
        self.value(Some(name))
    }
}

/// A custom tag activation, positioned in display-text character coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TagInstance {
    pub name: String,
    pub variant: TagVariant,
    pub shape: TagShape,
    pub behavior: TagBehavior,
    /// First character covered (span) or the bound character index (single).
    pub start: usize,
    /// Characters covered; always zero for single tags.
    pub length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
}

impl TagInstance {
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Display text with custom markup removed, plus the removed tags.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedText {
    pub text: String,
    pub tags: Vec<TagInstance>,
}

impl ParsedText {
    /// Length of the display text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Splits raw dialogue text into display text and custom tags.
#[derive(Clone, Copy, Debug)]
pub struct TagParser<'r> {
    registry: &'r TagRegistry,
}

impl<'r> TagParser<'r> {
    pub fn new(registry: &'r TagRegistry) -> Self {
        Self { registry }
    }

    /// Parses `text`, failing on the first malformed custom tag.
    ///
    /// Span tags left open run to the end of the text.
    pub fn parse(&self, text: &str) -> Result<ParsedText, TagError> {
        let bytes = text.as_bytes();
        let mut output = String::with_capacity(text.len());
        let mut out_chars = 0usize;
        let mut tags: Vec<TagInstance> = Vec::new();
        let mut open: Vec<usize> = Vec::new();
        let mut cursor = 0usize;

        while cursor < text.len() {
            if bytes[cursor] == b'<' {
                match scan_tag(text, cursor) {
                    Scan::Tag(raw) => {
                        match self.registry.custom(raw.name) {
                            Some(def) => apply_custom(def, &raw, out_chars, &mut tags, &mut open)?,
                            None => {
                                let source = &text[raw.start..raw.end];
                                output.push_str(source);
                                out_chars += source.chars().count();
                            }
                        }
                        cursor = raw.end;
                        continue;
                    }
                    Scan::UnterminatedQuote { name, offset } => {
                        if self.registry.custom(name).is_some() {
                            return Err(TagError::UnterminatedQuote {
                                tag: name.to_string(),
                                offset,
                            });
                        }
                    }
                    Scan::NotATag => {}
                }
            }
            let Some(ch) = text[cursor..].chars().next() else {
                break;
            };
            output.push(ch);
            out_chars += 1;
            cursor += ch.len_utf8();
        }

        for index in open {
            tags[index].length = out_chars - tags[index].start;
        }
        Ok(ParsedText {
            text: output,
            tags,
        })
    }
}

fn apply_custom(
    def: &CustomTagDef,
    raw: &RawTag<'_>,
    position: usize,
    tags: &mut Vec<TagInstance>,
    open: &mut Vec<usize>,
) -> Result<(), TagError> {
    let expected = match raw.boundary {
        TagBoundary::Start | TagBoundary::End => TagShape::Span,
        TagBoundary::Marker => TagShape::Single,
    };
    if expected != def.shape {
        return Err(TagError::ShapeMismatch {
            tag: raw.name.to_string(),
            expected: def.shape,
            offset: raw.start,
        });
    }

    if raw.boundary == TagBoundary::End {
        let slot = open
            .iter()
            .rposition(|&index| tags[index].name == def.name)
            .ok_or_else(|| TagError::UnmatchedEnd {
                tag: raw.name.to_string(),
                offset: raw.start,
            })?;
        let index = open.remove(slot);
        tags[index].length = position - tags[index].start;
        return Ok(());
    }

    let mut parameter = None;
    let mut attributes = Vec::new();
    for attribute in raw.attributes() {
        let attribute = attribute?;
        match attribute.name {
            None => parameter = Some(attribute.value.to_string()),
            Some(name) => attributes.push((name.to_string(), attribute.value.to_string())),
        }
    }

    tags.push(TagInstance {
        name: def.name.clone(),
        variant: TagVariant::Custom,
        shape: def.shape,
        behavior: def.behavior,
        start: position,
        length: 0,
        parameter,
        attributes,
    });
    if raw.boundary == TagBoundary::Start {
        open.push(tags.len() - 1);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/tag_tests.rs"]
mod tests;
