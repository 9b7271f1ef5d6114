//! Sequential big-endian reader over an immutable byte buffer.

use crate::{Error, Result};

/// Read position over a borrowed byte slice.
///
/// Every read either advances the position or fails with
/// [`Error::UnexpectedEndOfData`]; a failed read leaves the position untouched.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left between the position and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Move to an absolute position. Seeking past the end is allowed; the
    /// next read reports the shortfall.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// A cursor over the next `len` bytes (clamped to the buffer end), starting at 0.
    ///
    /// The parent cursor does not move.
    pub fn window(&self, len: usize) -> ByteCursor<'a> {
        let start = self.pos.min(self.data.len());
        let end = self.pos.saturating_add(len).min(self.data.len());
        ByteCursor::new(&self.data[start..end])
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Owned copy of the next `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        Ok(self.take(n)?.to_vec())
    }

    /// Next `n` bytes as Latin-1 text, one char per byte.
    pub fn read_ascii(&mut self, n: usize) -> Result<String> {
        Ok(self.take(n)?.iter().map(|&b| b as char).collect())
    }

    /// Decode a MIDI variable-length quantity.
    ///
    /// At most four bytes are consumed. If the fourth byte still has its
    /// continuation bit set, the value accumulated so far is returned as-is.
    pub fn read_vlq(&mut self) -> Result<u32> {
        let mut value: u32 = 0;
        for _ in 0..4 {
            let byte = self.read_u8()?;
            value = (value << 7) | (byte & 0x7F) as u32;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Ok(value)
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or(Error::UnexpectedEndOfData {
                offset: self.pos,
                needed: n,
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlq(bytes: &[u8]) -> (u32, usize) {
        let mut cursor = ByteCursor::new(bytes);
        let value = cursor.read_vlq().expect("decode vlq");
        (value, cursor.position())
    }

    #[test]
    fn vlq_single_byte_values() {
        assert_eq!(vlq(&[0x00]), (0, 1));
        assert_eq!(vlq(&[0x7F]), (127, 1));
    }

    #[test]
    fn vlq_multi_byte_values() {
        assert_eq!(vlq(&[0x81, 0x00]), (128, 2));
        assert_eq!(vlq(&[0x83, 0x60]), (480, 2));
        assert_eq!(vlq(&[0xFF, 0xFF, 0xFF, 0x7F]), ((1 << 28) - 1, 4));
    }

    #[test]
    fn vlq_never_reads_a_fifth_byte() {
        // Four continuation bytes, then a byte that must stay unread.
        let (value, consumed) = vlq(&[0x81, 0x80, 0x80, 0x80, 0x42]);
        assert_eq!(consumed, 4);
        assert_eq!(value, 1 << 21);
    }

    #[test]
    fn vlq_truncated_fails() {
        let mut cursor = ByteCursor::new(&[0x81]);
        assert!(matches!(
            cursor.read_vlq(),
            Err(Error::UnexpectedEndOfData { offset: 1, needed: 1 })
        ));
    }

    #[test]
    fn big_endian_reads() {
        let mut cursor = ByteCursor::new(&[0x01, 0x02, 0x00, 0x00, 0x01, 0xE0, 0xFE]);
        assert_eq!(cursor.read_u16_be().unwrap(), 0x0102);
        assert_eq!(cursor.read_u32_be().unwrap(), 480);
        assert_eq!(cursor.read_i8().unwrap(), -2);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn read_past_end_leaves_position() {
        let mut cursor = ByteCursor::new(b"MTr");
        assert!(cursor.read_ascii(4).is_err());
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.read_ascii(3).unwrap(), "MTr");
    }

    #[test]
    fn read_bytes_is_an_owned_copy() {
        let data = [1u8, 2, 3];
        let mut cursor = ByteCursor::new(&data);
        let mut copy = cursor.read_bytes(2).unwrap();
        copy[0] = 99;
        assert_eq!(data[0], 1);
        assert_eq!(copy, vec![99, 2]);
    }

    #[test]
    fn window_is_clamped_and_independent() {
        let data = [0u8, 1, 2, 3, 4];
        let mut cursor = ByteCursor::new(&data);
        cursor.skip(3).unwrap();
        let mut window = cursor.window(10);
        assert_eq!(window.len(), 2);
        assert_eq!(window.read_u8().unwrap(), 3);
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn seek_past_end_then_read_fails() {
        let mut cursor = ByteCursor::new(&[1, 2]);
        cursor.seek(5);
        assert_eq!(cursor.remaining(), 0);
        assert!(cursor.read_u8().is_err());
    }
}
