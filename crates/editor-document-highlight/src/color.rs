//! Highlighting colors.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::HighlightError;

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel; 255 is opaque.
    pub a: u8,
}

impl Rgba {
    /// An opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn parse(value: &str) -> Result<Self, HighlightError> {
        let invalid = || HighlightError::InvalidColorValue(value.to_string());
        let hex = value.strip_prefix('#').ok_or_else(invalid)?;
        if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if hex.len() == 8 { channel(6)? } else { 255 },
        })
    }
}

impl FromStr for Rgba {
    type Err = HighlightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

/// Font weight of a highlighting color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    /// Regular weight.
    Normal,
    /// Bold.
    Bold,
}

/// Font style of a highlighting color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    /// Upright.
    Normal,
    /// Italic.
    Italic,
    /// Oblique.
    Oblique,
}

/// Visual attributes applied to highlighted text.
///
/// Unset attributes inherit from whatever the renderer draws underneath. Colors are
/// shared through `Arc`, and sections compare them by identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HighlightingColor {
    /// Name under which the color was defined, if any.
    pub name: Option<String>,
    /// Text color.
    pub foreground: Option<Rgba>,
    /// Background color.
    pub background: Option<Rgba>,
    /// Font weight.
    pub font_weight: Option<FontWeight>,
    /// Font style.
    pub font_style: Option<FontStyle>,
    /// Whether text is underlined.
    pub underline: Option<bool>,
}

impl HighlightingColor {
    /// A color with only a foreground.
    pub fn foreground(name: impl Into<String>, foreground: Rgba) -> Self {
        Self {
            name: Some(name.into()),
            foreground: Some(foreground),
            ..Self::default()
        }
    }

    /// Whether the color sets no attribute at all.
    pub fn is_empty(&self) -> bool {
        self.foreground.is_none()
            && self.background.is_none()
            && self.font_weight.is_none()
            && self.font_style.is_none()
            && self.underline.is_none()
    }
}

impl fmt::Display for HighlightingColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(foreground) = self.foreground {
            parts.push(format!("foreground: {foreground}"));
        }
        if let Some(background) = self.background {
            parts.push(format!("background: {background}"));
        }
        if let Some(weight) = self.font_weight {
            parts.push(format!("font-weight: {weight:?}"));
        }
        if let Some(style) = self.font_style {
            parts.push(format!("font-style: {style:?}"));
        }
        if let Some(underline) = self.underline {
            parts.push(format!("underline: {underline}"));
        }
        match &self.name {
            Some(name) => write!(f, "{name} {{ {} }}", parts.join("; ")),
            None => write!(f, "{{ {} }}", parts.join("; ")),
        }
    }
}
