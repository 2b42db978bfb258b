//! Behaviors bound to the built-in custom tags.

use serde::{Deserialize, Serialize};

use super::parser::TagInstance;
use super::registry::TagBehavior;
use super::TagError;

/// A pause of `seconds` once `index` characters are visible.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaitPoint {
    pub index: usize,
    pub seconds: f32,
}

/// 8-bit RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn parse_hex(input: &str) -> Option<Self> {
        let digits = input.trim().strip_prefix('#')?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
        match digits.len() {
            3 => {
                let short = |index: usize| channel(index..index + 1).map(|v| v * 17);
                Some(Self::new(short(0)?, short(1)?, short(2)?, 255))
            }
            6 => Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?, 255)),
            8 => Some(Self::new(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => None,
        }
    }

    pub fn lerp(from: Rgba, to: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgba::new(
            mix(from.r, to.r),
            mix(from.g, to.g),
            mix(from.b, to.b),
            mix(from.a, to.a),
        )
    }
}

/// A color ramp over `length` characters starting at `start`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientSpan {
    pub start: usize,
    pub length: usize,
    pub from: Rgba,
    pub to: Rgba,
}

impl GradientSpan {
    /// Color of the character at `index`, or `None` outside the span.
    pub fn color_at(&self, index: usize) -> Option<Rgba> {
        if index < self.start || index >= self.start + self.length {
            return None;
        }
        let t = if self.length <= 1 {
            0.0
        } else {
            (index - self.start) as f32 / (self.length - 1) as f32
        };
        Some(Rgba::lerp(self.from, self.to, t))
    }
}

/// Effects derived from a parsed text's custom tags.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextEffects {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub waits: Vec<WaitPoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gradients: Vec<GradientSpan>,
}

impl TextEffects {
    /// Interprets the tags whose behavior the runtime implements; host tags are skipped.
    pub fn from_tags(tags: &[TagInstance]) -> Result<Self, TagError> {
        let mut effects = Self::default();
        for tag in tags {
            match tag.behavior {
                TagBehavior::Wait => effects.waits.push(WaitPoint {
                    index: tag.start,
                    seconds: wait_seconds(tag)?,
                }),
                TagBehavior::Gradient => {
                    let (from, to) = gradient_colors(tag)?;
                    effects.gradients.push(GradientSpan {
                        start: tag.start,
                        length: tag.length,
                        from,
                        to,
                    });
                }
                TagBehavior::Host => {}
            }
        }
        Ok(effects)
    }

    pub fn is_empty(&self) -> bool {
        self.waits.is_empty() && self.gradients.is_empty()
    }

    pub fn total_wait(&self) -> f32 {
        self.waits.iter().map(|wait| wait.seconds).sum()
    }

    /// Color for a character; the innermost (last opened) gradient wins.
    pub fn color_at(&self, index: usize) -> Option<Rgba> {
        self.gradients
            .iter()
            .rev()
            .find_map(|gradient| gradient.color_at(index))
    }
}

fn invalid(tag: &TagInstance, parameter: &str, reason: &str) -> TagError {
    TagError::InvalidParameter {
        tag: tag.name.clone(),
        parameter: parameter.to_string(),
        reason: reason.to_string(),
    }
}

fn wait_seconds(tag: &TagInstance) -> Result<f32, TagError> {
    let raw = tag
        .parameter
        .as_deref()
        .or_else(|| tag.attribute("seconds"))
        .ok_or_else(|| invalid(tag, "", "missing duration"))?;
    let seconds: f32 = raw
        .trim()
        .trim_end_matches('s')
        .parse()
        .map_err(|_| invalid(tag, raw, "expected a number of seconds"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(invalid(tag, raw, "duration must be finite and non-negative"));
    }
    Ok(seconds)
}

fn gradient_colors(tag: &TagInstance) -> Result<(Rgba, Rgba), TagError> {
    let (from, to) = match tag.parameter.as_deref() {
        Some(parameter) => parameter
            .split_once(',')
            .ok_or_else(|| invalid(tag, parameter, "expected `from,to` colors"))?,
        None => (
            tag.attribute("from")
                .ok_or_else(|| invalid(tag, "", "missing `from` color"))?,
            tag.attribute("to")
                .ok_or_else(|| invalid(tag, "", "missing `to` color"))?,
        ),
    };
    let parse = |color: &str| {
        Rgba::parse_hex(color).ok_or_else(|| invalid(tag, color, "expected a #hex color"))
    };
    Ok((parse(from)?, parse(to)?))
}
