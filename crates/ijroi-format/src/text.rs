//! Text labels and the metrics used to size them.

use serde::Serialize;

use crate::catalog::field::{decode_utf16_be, encode_utf16_be};
use crate::catalog::layout::text;
use crate::error::{Result, RoiError};

/// Font used when none is given.
pub const DEFAULT_FONT: &str = "Courier";

/// Measures rendered text.
pub trait TextMetrics {
    /// Horizontal advance of one line of `text`.
    fn advance_width(&self, font_name: &str, size: f32, text: &str) -> f32;

    /// Distance between consecutive baselines.
    fn line_height(&self, font_name: &str, size: f32) -> f32;
}

/// Fixed-pitch approximation: every character is `0.6 × size` wide and lines
/// are `1.2 × size` apart.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonospaceMetrics;

impl TextMetrics for MonospaceMetrics {
    fn advance_width(&self, _font_name: &str, size: f32, text: &str) -> f32 {
        0.6 * size * text.chars().count() as f32
    }

    fn line_height(&self, _font_name: &str, size: f32) -> f32 {
        1.2 * size
    }
}

/// Content and font of a text shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLabel {
    pub font_size: i32,
    pub style: i32,
    pub font_name: String,
    pub text: String,
}

impl TextLabel {
    #[must_use]
    pub fn new(text: impl Into<String>, font_size: i32) -> Self {
        Self {
            font_size,
            style: 0,
            font_name: DEFAULT_FONT.to_string(),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn with_font(mut self, font_name: impl Into<String>) -> Self {
        self.font_name = font_name.into();
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: i32) -> Self {
        self.style = style;
        self
    }

    /// Width and height of the rendered label. Lines split on `\n`.
    pub fn measure(&self, metrics: &dyn TextMetrics) -> (f32, f32) {
        let size = self.font_size as f32;
        let mut lines = 0usize;
        let mut width = 0.0f32;
        for line in self.text.split('\n') {
            lines += 1;
            width = width.max(metrics.advance_width(&self.font_name, size, line));
        }
        (width, lines as f32 * metrics.line_height(&self.font_name, size))
    }

    /// Encode the text block stored in place of coordinates.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let font_units = units(&self.font_name)?;
        let text_units = units(&self.text)?;
        let mut block = [0u8; text::BLOCK_SIZE];
        text::FONT_SIZE.write_i32(&mut block, self.font_size);
        text::STYLE.write_i32(&mut block, self.style);
        text::FONT_NAME_LENGTH.write_i32(&mut block, font_units);
        text::TEXT_LENGTH.write_i32(&mut block, text_units);

        let mut out = block.to_vec();
        out.extend(encode_utf16_be(&self.font_name));
        out.extend(encode_utf16_be(&self.text));
        Ok(out)
    }

    /// Decode a text block starting at `data[0]`.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < text::BLOCK_SIZE {
            return Err(RoiError::truncated("text block", text::BLOCK_SIZE, data.len()));
        }
        let font_units = length(text::FONT_NAME_LENGTH.read_i32(data), "font_name_length")?;
        let text_units = length(text::TEXT_LENGTH.read_i32(data), "text_length")?;
        let needed = text::BLOCK_SIZE + 2 * (font_units + text_units);
        let font_name = decode_utf16_be(data, text::BLOCK_SIZE, font_units);
        let text = decode_utf16_be(data, text::BLOCK_SIZE + 2 * font_units, text_units);
        match (font_name, text) {
            (Some(font_name), Some(text)) => Ok(Self {
                font_size: text::FONT_SIZE.read_i32(data),
                style: text::STYLE.read_i32(data),
                font_name,
                text,
            }),
            _ => Err(RoiError::truncated("text block", needed, data.len())),
        }
    }
}

fn units(s: &str) -> Result<i32> {
    i32::try_from(s.encode_utf16().count())
        .map_err(|_| RoiError::invalid_arguments("text label too long"))
}

fn length(value: i32, field: &'static str) -> Result<usize> {
    usize::try_from(value).map_err(|_| RoiError::InvalidOffset { field, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_layout() {
        let label = TextLabel::new("hi", 12);
        let bytes = label.encode().unwrap();
        assert_eq!(&bytes[0..4], &12i32.to_be_bytes());
        assert_eq!(&bytes[8..12], &7i32.to_be_bytes());
        assert_eq!(&bytes[12..16], &2i32.to_be_bytes());
        assert_eq!(bytes.len(), 16 + 2 * 7 + 2 * 2);
        assert_eq!(TextLabel::decode(&bytes).unwrap(), label);
    }

    #[test]
    fn test_decode_truncated() {
        let bytes = TextLabel::new("hello", 10).encode().unwrap();
        let err = TextLabel::decode(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(err.is_format_error());
        assert!(TextLabel::decode(&bytes[..8]).is_err());
    }

    #[test]
    fn test_monospace_measure() {
        let label = TextLabel::new("abcd\nab", 10);
        let (w, h) = label.measure(&MonospaceMetrics);
        assert!((w - 24.0).abs() < 1e-5);
        assert!((h - 24.0).abs() < 1e-5);
    }
}
