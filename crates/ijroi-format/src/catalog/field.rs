//! Typed field descriptors over fixed-layout big-endian records.
//!
//! A [`Field`] names one slot of a record: its byte offset and its storage
//! type. Headers are parsed and built exclusively through these descriptors,
//! so every offset in the format is written down once, in [`super::layout`].

use super::color::Color;

/// Storage type of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Four raw bytes (the magic tag).
    Tag,
    /// Unsigned byte.
    U8,
    /// Big-endian signed short.
    I16,
    /// Big-endian unsigned short.
    U16,
    /// Big-endian signed int.
    I32,
    /// Big-endian IEEE single.
    F32,
    /// Packed alpha/red/green/blue bytes.
    Color,
}

impl FieldType {
    /// Width in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::Tag | Self::I32 | Self::F32 | Self::Color => 4,
        }
    }
}

/// A named slot inside a fixed-size record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Field name, as it appears in diagnostics.
    pub name: &'static str,
    /// Byte offset from the start of the record.
    pub offset: usize,
    /// Storage type.
    pub ty: FieldType,
}

impl Field {
    /// Describe a field.
    #[must_use]
    pub const fn new(name: &'static str, offset: usize, ty: FieldType) -> Self {
        Self { name, offset, ty }
    }

    /// One past the last byte of the field.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.ty.size()
    }

    fn bytes<const N: usize>(&self, data: &[u8]) -> [u8; N] {
        debug_assert_eq!(N, self.ty.size(), "field {} read with wrong width", self.name);
        let mut out = [0u8; N];
        out.copy_from_slice(&data[self.offset..self.offset + N]);
        out
    }

    fn put(&self, buf: &mut [u8], bytes: &[u8]) {
        debug_assert_eq!(bytes.len(), self.ty.size(), "field {} written with wrong width", self.name);
        buf[self.offset..self.offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Read the raw four-byte tag.
    pub fn read_tag(&self, data: &[u8]) -> [u8; 4] {
        self.bytes(data)
    }

    /// Read an unsigned byte.
    pub fn read_u8(&self, data: &[u8]) -> u8 {
        data[self.offset]
    }

    /// Read a big-endian i16.
    pub fn read_i16(&self, data: &[u8]) -> i16 {
        i16::from_be_bytes(self.bytes(data))
    }

    /// Read a big-endian u16.
    pub fn read_u16(&self, data: &[u8]) -> u16 {
        u16::from_be_bytes(self.bytes(data))
    }

    /// Read a big-endian i32.
    pub fn read_i32(&self, data: &[u8]) -> i32 {
        i32::from_be_bytes(self.bytes(data))
    }

    /// Read a big-endian f32.
    pub fn read_f32(&self, data: &[u8]) -> f32 {
        f32::from_be_bytes(self.bytes(data))
    }

    /// Read an ARGB color.
    pub fn read_color(&self, data: &[u8]) -> Color {
        Color::from_bytes(self.bytes(data))
    }

    /// Write the raw four-byte tag.
    pub fn write_tag(&self, buf: &mut [u8], value: [u8; 4]) {
        self.put(buf, &value);
    }

    /// Write an unsigned byte.
    pub fn write_u8(&self, buf: &mut [u8], value: u8) {
        self.put(buf, &[value]);
    }

    /// Write a big-endian i16.
    pub fn write_i16(&self, buf: &mut [u8], value: i16) {
        self.put(buf, &value.to_be_bytes());
    }

    /// Write a big-endian u16.
    pub fn write_u16(&self, buf: &mut [u8], value: u16) {
        self.put(buf, &value.to_be_bytes());
    }

    /// Write a big-endian i32.
    pub fn write_i32(&self, buf: &mut [u8], value: i32) {
        self.put(buf, &value.to_be_bytes());
    }

    /// Write a big-endian f32.
    pub fn write_f32(&self, buf: &mut [u8], value: f32) {
        self.put(buf, &value.to_be_bytes());
    }

    /// Write an ARGB color.
    pub fn write_color(&self, buf: &mut [u8], value: Color) {
        self.put(buf, &value.to_bytes());
    }
}

/// Encode a string as big-endian UTF-16 code units.
#[must_use]
pub fn encode_utf16_be(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_be_bytes).collect()
}

/// Decode `units` big-endian UTF-16 code units starting at `offset`.
///
/// Returns `None` when the slice is too short.
#[must_use]
pub fn decode_utf16_be(data: &[u8], offset: usize, units: usize) -> Option<String> {
    let bytes = data.get(offset..offset.checked_add(units.checked_mul(2)?)?)?;
    let code_units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    Some(String::from_utf16_lossy(&code_units))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT: Field = Field::new("short", 2, FieldType::I16);
    const FLOAT: Field = Field::new("float", 4, FieldType::F32);

    #[test]
    fn test_big_endian_layout() {
        let mut buf = [0u8; 8];
        SHORT.write_i16(&mut buf, 0x1234);
        assert_eq!(&buf[2..4], &[0x12, 0x34]);
        assert_eq!(SHORT.read_i16(&buf), 0x1234);

        FLOAT.write_f32(&mut buf, 1.5);
        assert_eq!(&buf[4..8], &1.5f32.to_be_bytes());
        assert_eq!(FLOAT.read_f32(&buf), 1.5);
        assert_eq!(FLOAT.end(), 8);
    }

    #[test]
    fn test_utf16_be() {
        let encoded = encode_utf16_be("cell-3");
        assert_eq!(encoded.len(), 12);
        assert_eq!(&encoded[..2], &[0x00, b'c']);
        assert_eq!(decode_utf16_be(&encoded, 0, 6).as_deref(), Some("cell-3"));
        assert_eq!(decode_utf16_be(&encoded, 2, 5).as_deref(), Some("ell-3"));
        assert!(decode_utf16_be(&encoded, 0, 7).is_none());
    }
}
