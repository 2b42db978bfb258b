use std::fmt;

use serde::{Deserialize, Serialize};

use super::TagError;

/// Tag names understood by the host text renderer. Matched case-insensitively.
pub const NATIVE_TAGS: &[&str] = &[
    "align",
    "alpha",
    "b",
    "color",
    "cspace",
    "font",
    "font-weight",
    "i",
    "indent",
    "line-height",
    "line-indent",
    "link",
    "lowercase",
    "margin",
    "mark",
    "mspace",
    "nobr",
    "noparse",
    "page",
    "pos",
    "rotate",
    "s",
    "size",
    "smallcaps",
    "space",
    "sprite",
    "strikethrough",
    "style",
    "sub",
    "sup",
    "u",
    "uppercase",
    "voffset",
    "width",
];

/// Which family a tag name belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagVariant {
    Native,
    Custom,
}

/// How a custom tag is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagShape {
    /// `<tag>...</tag>`, covering a range of characters.
    Span,
    /// `<tag/>`, bound to a single character index.
    Single,
}

impl fmt::Display for TagShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagShape::Span => write!(f, "span"),
            TagShape::Single => write!(f, "single"),
        }
    }
}

/// What the runtime does with a custom tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagBehavior {
    /// Inserts a pause into the reveal curve.
    Wait,
    /// Interpolates a color across the span.
    Gradient,
    /// Stripped and reported; the host implements the effect.
    Host,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomTagDef {
    pub name: String,
    pub shape: TagShape,
    pub behavior: TagBehavior,
}

impl CustomTagDef {
    pub fn new(name: impl Into<String>, shape: TagShape, behavior: TagBehavior) -> Self {
        Self {
            name: name.into(),
            shape,
            behavior,
        }
    }
}

/// Lookup table from tag name to family and custom behavior.
#[derive(Clone, Debug, Default)]
pub struct TagRegistry {
    custom: Vec<CustomTagDef>,
}

impl TagRegistry {
    /// A registry that knows only the native names.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Native names plus the `wait` and `gradient` custom tags.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.custom.push(CustomTagDef::new(
            "wait",
            TagShape::Single,
            TagBehavior::Wait,
        ));
        registry.custom.push(CustomTagDef::new(
            "gradient",
            TagShape::Span,
            TagBehavior::Gradient,
        ));
        registry
    }

    /// Adds or replaces a custom tag. Native names cannot be shadowed.
    pub fn register(&mut self, def: CustomTagDef) -> Result<(), TagError> {
        if is_native(&def.name) {
            return Err(TagError::ReservedName { tag: def.name });
        }
        if let Some(existing) = self
            .custom
            .iter_mut()
            .find(|existing| existing.name.eq_ignore_ascii_case(&def.name))
        {
            *existing = def;
        } else {
            self.custom.push(def);
        }
        Ok(())
    }

    pub fn classify(&self, name: &str) -> Option<TagVariant> {
        if is_native(name) {
            Some(TagVariant::Native)
        } else if self.custom(name).is_some() {
            Some(TagVariant::Custom)
        } else {
            None
        }
    }

    pub fn custom(&self, name: &str) -> Option<&CustomTagDef> {
        self.custom
            .iter()
            .find(|def| def.name.eq_ignore_ascii_case(name))
    }

    pub fn custom_tags(&self) -> impl Iterator<Item = &CustomTagDef> {
        self.custom.iter()
    }
}

fn is_native(name: &str) -> bool {
    NATIVE_TAGS
        .iter()
        .any(|native| native.eq_ignore_ascii_case(name))
}
