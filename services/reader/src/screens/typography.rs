//! services/reader/src/screens/typography.rs
//!
//! Readability controls for the converted text.

use std::fmt;
use std::str::FromStr;

pub const FONT_SIZE_RANGE: (u32, u32) = (12, 32);
pub const LETTER_SPACING_RANGE: (f32, f32) = (0.0, 0.5);
pub const LETTER_SPACING_STEP: f32 = 0.05;
pub const LINE_HEIGHT_RANGE: (f32, f32) = (1.0, 3.0);
pub const LINE_HEIGHT_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    Arial,
    Helvetica,
    Verdana,
    OpenDyslexic,
    ComicSans,
}

impl FontFamily {
    pub const ALL: [FontFamily; 5] = [
        FontFamily::Arial,
        FontFamily::Helvetica,
        FontFamily::Verdana,
        FontFamily::OpenDyslexic,
        FontFamily::ComicSans,
    ];

    /// The CSS `font-family` value.
    pub fn css(&self) -> &'static str {
        match self {
            FontFamily::Arial => "Arial",
            FontFamily::Helvetica => "Helvetica",
            FontFamily::Verdana => "Verdana",
            FontFamily::OpenDyslexic => "OpenDyslexic",
            FontFamily::ComicSans => "'Comic Sans MS', cursive",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FontFamily::ComicSans => "Comic Sans",
            other => other.css(),
        }
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypographyError {
    #[error("Unknown font '{0}'. Choose one of: Arial, Helvetica, Verdana, OpenDyslexic, Comic Sans.")]
    UnknownFont(String),
    #[error("'{0}' is not a colour. Use the #rrggbb form.")]
    InvalidColor(String),
}

impl FromStr for FontFamily {
    type Err = TypographyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "arial" => Ok(FontFamily::Arial),
            "helvetica" => Ok(FontFamily::Helvetica),
            "verdana" => Ok(FontFamily::Verdana),
            "opendyslexic" | "dyslexic" => Ok(FontFamily::OpenDyslexic),
            "comic" | "comicsans" | "comicsansms" => Ok(FontFamily::ComicSans),
            _ => Err(TypographyError::UnknownFont(s.to_string())),
        }
    }
}

/// Font and spacing settings applied when rendering converted text.
#[derive(Debug, Clone, PartialEq)]
pub struct Typography {
    pub font_family: FontFamily,
    pub font_size: u32,
    pub letter_spacing: f32,
    pub line_height: f32,
    pub text_color: String,
    pub background_color: String,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_family: FontFamily::Arial,
            font_size: 16,
            letter_spacing: 0.1,
            line_height: 1.5,
            // Off-black on cream.
            text_color: "#333333".to_string(),
            background_color: "#f9f9f9".to_string(),
        }
    }
}

impl Typography {
    pub fn set_font_family(&mut self, family: FontFamily) {
        self.font_family = family;
    }

    pub fn set_font_size(&mut self, px: u32) {
        self.font_size = px.clamp(FONT_SIZE_RANGE.0, FONT_SIZE_RANGE.1);
    }

    pub fn set_letter_spacing(&mut self, em: f32) {
        self.letter_spacing = snap(em, LETTER_SPACING_RANGE, LETTER_SPACING_STEP);
    }

    pub fn set_line_height(&mut self, ratio: f32) {
        self.line_height = snap(ratio, LINE_HEIGHT_RANGE, LINE_HEIGHT_STEP);
    }

    pub fn set_text_color(&mut self, color: &str) -> Result<(), TypographyError> {
        self.text_color = parse_color(color)?;
        Ok(())
    }

    pub fn set_background_color(&mut self, color: &str) -> Result<(), TypographyError> {
        self.background_color = parse_color(color)?;
        Ok(())
    }

    /// Inline CSS for the converted-text panel.
    pub fn css(&self) -> String {
        format!(
            "font-family: {}; font-size: {}px; letter-spacing: {:.2}em; line-height: {:.1}; \
             color: {}; background-color: {}; text-align: left; max-width: 70ch",
            self.font_family.css(),
            self.font_size,
            self.letter_spacing,
            self.line_height,
            self.text_color,
            self.background_color
        )
    }
}

/// Splits converted text into the paragraphs it is displayed as.
pub fn paragraphs(text: &str) -> Vec<&str> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn snap(value: f32, (min, max): (f32, f32), step: f32) -> f32 {
    if !value.is_finite() {
        return min;
    }
    let clamped = value.clamp(min, max);
    let steps = ((clamped - min) / step).round();
    // Round away float noise so 0.15 stays 0.15.
    ((min + steps * step) * 100.0).round() / 100.0
}

fn parse_color(color: &str) -> Result<String, TypographyError> {
    let trimmed = color.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(format!("#{}", hex.to_ascii_lowercase()))
    } else {
        Err(TypographyError::InvalidColor(color.to_string()))
    }
}
