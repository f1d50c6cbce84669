//! Packed ARGB color fields.

use serde::Serialize;

use crate::error::{Result, RoiError};

/// A stroke, fill or overlay color, stored as alpha/red/green/blue bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Color {
    pub alpha: u8,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    /// Build a color from its channels.
    #[must_use]
    pub const fn argb(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Self {
            alpha,
            red,
            green,
            blue,
        }
    }

    /// Decode from the on-disk byte order.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::argb(bytes[0], bytes[1], bytes[2], bytes[3])
    }

    /// Encode in the on-disk byte order.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 4] {
        [self.alpha, self.red, self.green, self.blue]
    }

    /// Return a copy with the named channels replaced.
    ///
    /// Channels not named keep their current value. Keys are `alpha`, `red`,
    /// `green` and `blue`.
    pub fn with_channels<I, K>(self, channels: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, u8)>,
        K: AsRef<str>,
    {
        let mut color = self;
        for (key, value) in channels {
            match key.as_ref() {
                "alpha" => color.alpha = value,
                "red" => color.red = value,
                "green" => color.green = value,
                "blue" => color.blue = value,
                other => {
                    return Err(RoiError::invalid_arguments(format!(
                        "unknown color channel '{other}'"
                    )));
                }
            }
        }
        Ok(color)
    }
}

impl From<(u8, u8, u8, u8)> for Color {
    fn from((alpha, red, green, blue): (u8, u8, u8, u8)) -> Self {
        Self::argb(alpha, red, green, blue)
    }
}

impl From<[u8; 4]> for Color {
    fn from(bytes: [u8; 4]) -> Self {
        Self::from_bytes(bytes)
    }
}
