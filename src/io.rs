use std::io::Error;

///A trait for reading bytes from a source.
pub trait ReadByte {
    ///Returns the number of bytes between the current position and the end.
    fn surplus(&self) -> usize;

    ///Advance the internal cursor.
    fn advance(&mut self, n: usize);

    ///Returns the next byte without advancing.
    fn peek(&self) -> Option<u8>;

    ///Gets an unsigned 8 bit integer from self.
    fn fetch(&mut self) -> Option<u8>;

    ///Gets exactly n bytes from self, or None if fewer remain.
    fn fetch_all(&mut self, n: usize) -> Option<&[u8]>;

    ///Returns true if there are any more bytes to read.
    #[inline]
    fn has_surplus(&self) -> bool {
        self.surplus() > 0
    }
}

impl ReadByte for &[u8] {
    #[inline]
    fn surplus(&self) -> usize {
        self.len()
    }

    #[inline]
    fn advance(&mut self, n: usize) {
        if n < self.len() {
            *self = &self[n..];
        } else {
            *self = &[];
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.first().copied()
    }

    #[inline]
    fn fetch(&mut self) -> Option<u8> {
        let r = self.peek()?;
        self.advance(1);
        Some(r)
    }

    #[inline]
    fn fetch_all(&mut self, n: usize) -> Option<&[u8]> {
        if n <= self.len() {
            let whole: &[u8] = *self;
            let (r, rest) = whole.split_at(n);
            *self = rest;
            Some(r)
        } else {
            None
        }
    }
}

///A trait for writing bytes to a buffer.
pub trait WriteByte {
    ///Writes an unsigned 8 bit integer to self.
    fn put(&mut self, o: u8) -> Option<Error>;

    ///Writes a buffer to self.
    ///self must have enough surplus to contain all bytes.
    fn put_all(&mut self, buf: &[u8]) -> Option<Error>;
}

impl WriteByte for Vec<u8> {
    #[inline]
    fn put(&mut self, o: u8) -> Option<Error> {
        self.push(o);
        None
    }

    #[inline]
    fn put_all(&mut self, buf: &[u8]) -> Option<Error> {
        self.extend_from_slice(buf);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_reader() {
        let a: &[u8] = &[1, 2, 3, 4];
        let mut o = a;
        assert_eq!(o.peek(), Some(1));
        assert_eq!(o.fetch(), Some(1));
        assert_eq!(o.fetch_all(2), Some(&[2u8, 3][..]));
        assert_eq!(o.fetch_all(2), None);
        assert_eq!(o.surplus(), 1);
        o.advance(5);
        assert!(!o.has_surplus());
        assert_eq!(o.fetch(), None);
    }
}
