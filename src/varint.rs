//!QUIC variable-length integers (RFC 9000 section 16).

use crate::{ReadByte, WriteByte};
use std::io::Error;

const USABLE_BITS: u8 = 0b0011_1111;
const TWO_MOST_SIGNIFICANT_BITS_01: u8 = 0b0100_0000;
const TWO_MOST_SIGNIFICANT_BITS_10: u8 = 0b1000_0000;
const TWO_MOST_SIGNIFICANT_BITS_11: u8 = 0b1100_0000;

///The largest value a varint can carry, 2^62 - 1.
pub const MAX_VARINT: u64 = (1 << 62) - 1;

///The longest encoding of a varint.
pub const MAX_VARINT_LENGTH: usize = 8;

///Returns the encoded length announced by the first byte of a varint.
#[inline]
pub fn varint_len_from_first_byte(b: u8) -> usize {
    1 << (b >> 6)
}

///Returns the number of bytes `n` takes when encoded, or 0 if it exceeds [`MAX_VARINT`].
#[inline]
pub fn varint_len(n: u64) -> usize {
    match n {
        ..=63 => 1,
        ..=16383 => 2,
        ..=1073741823 => 4,
        ..=MAX_VARINT => 8,
        _ => 0,
    }
}

///Encodes `n` in its shortest form. Values above [`MAX_VARINT`] write nothing.
pub fn encode_varint(n: u64, writer: &mut impl WriteByte) -> Option<Error> {
    match varint_len(n) {
        1 => writer.put(n as u8 & USABLE_BITS),
        2 => {
            let b = (n as u16).to_be_bytes();
            writer.put(b[0] & USABLE_BITS | TWO_MOST_SIGNIFICANT_BITS_01);
            writer.put(b[1])
        }
        4 => {
            let b = (n as u32).to_be_bytes();
            writer.put(b[0] & USABLE_BITS | TWO_MOST_SIGNIFICANT_BITS_10);
            writer.put_all(&b[1..])
        }
        8 => {
            let b = n.to_be_bytes();
            writer.put(b[0] & USABLE_BITS | TWO_MOST_SIGNIFICANT_BITS_11);
            writer.put_all(&b[1..])
        }
        _ => None,
    }
}

///Decodes a varint whose bytes are all present in `buf`.
#[inline]
pub(crate) fn varint_from_bytes(buf: &[u8]) -> u64 {
    let mut bytes = buf.iter();
    let mut v = match bytes.next() {
        Some(b) => (b & USABLE_BITS) as u64,
        None => return 0,
    };
    for b in bytes {
        v = (v << 8) | *b as u64;
    }
    v
}

///Decodes one varint, returning None when the reader ends before the varint does.
pub fn decode_varint(reader: &mut impl ReadByte) -> Option<u64> {
    let len = varint_len_from_first_byte(reader.peek()?);
    reader.fetch_all(len).map(varint_from_bytes)
}

///Accumulates the bytes of one varint across calls.
#[derive(Debug, Default)]
pub(crate) struct VarintReader {
    bytes: [u8; MAX_VARINT_LENGTH],
    read: usize,
    length: usize,
}

impl VarintReader {
    ///Returns true while a varint has been started but not finished.
    pub(crate) fn in_progress(&self) -> bool {
        self.read > 0
    }

    ///Returns the full length of the varint being read, once its first byte is known.
    pub(crate) fn pending_length(&self) -> Option<usize> {
        if self.read > 0 {
            Some(self.length)
        } else {
            None
        }
    }

    ///Consumes bytes from the reader until the varint is complete or the reader is exhausted.
    ///
    ///Returns the value and its encoded length when complete.
    pub(crate) fn read(&mut self, reader: &mut impl ReadByte) -> Option<(u64, usize)> {
        if self.read == 0 {
            let first = reader.fetch()?;
            self.length = varint_len_from_first_byte(first);
            self.bytes[0] = first;
            self.read = 1;
        }
        while self.read < self.length {
            self.bytes[self.read] = reader.fetch()?;
            self.read += 1;
        }
        let value = varint_from_bytes(&self.bytes[..self.length]);
        let length = self.length;
        self.read = 0;
        self.length = 0;
        Some((value, length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc_sample_values() {
        let samples: &[(&[u8], u64)] = &[
            (&[0xc2, 0x19, 0x7c, 0x5e, 0xff, 0x14, 0xe8, 0x8c], 151288809941952652),
            (&[0x9d, 0x7f, 0x3e, 0x7d], 494878333),
            (&[0x7b, 0xbd], 15293),
            (&[0x25], 37),
        ];
        for (bytes, value) in samples {
            let mut o = *bytes;
            assert_eq!(decode_varint(&mut o), Some(*value));
            assert!(o.is_empty());

            let mut v = Vec::new();
            encode_varint(*value, &mut v);
            assert_eq!(&v, bytes);
        }
    }

    #[test]
    fn non_minimal_encoding_is_accepted() {
        let a: &[u8] = &[0x40, 0x25];
        let mut o = a;
        assert_eq!(decode_varint(&mut o), Some(37));
    }

    #[test]
    fn truncated_varint() {
        let a: &[u8] = &[0x9d, 0x7f];
        let mut o = a;
        assert_eq!(decode_varint(&mut o), None);
    }

    #[test]
    fn too_large_value_writes_nothing() {
        let mut v = Vec::new();
        encode_varint(MAX_VARINT + 1, &mut v);
        assert!(v.is_empty());
        assert_eq!(varint_len(MAX_VARINT), 8);
        assert_eq!(varint_len(MAX_VARINT + 1), 0);
    }

    #[test]
    fn reader_resumes_across_chunks() {
        let mut r = VarintReader::default();
        let a: &[u8] = &[0x9d, 0x7f];
        let mut o = a;
        assert_eq!(r.read(&mut o), None);
        assert!(r.in_progress());
        assert_eq!(r.pending_length(), Some(4));

        let b: &[u8] = &[0x3e, 0x7d, 0x25];
        let mut o = b;
        assert_eq!(r.read(&mut o), Some((494878333, 4)));
        assert!(!r.in_progress());
        assert_eq!(o, &[0x25]);
    }
}
