use super::{WriteError, WriteResult};

/// Append-only view over a caller provided byte slice.
///
/// Every write is checked against the slice length first, so nothing is
/// ever written past the end.
#[derive(Debug)]
pub struct BoundedBuffer<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> BoundedBuffer<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn written(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    fn reserve(&self, additional: usize) -> WriteResult<()> {
        let needed = self.len + additional;
        if needed > self.buf.len() {
            return Err(WriteError::CapacityExceeded {
                capacity: self.buf.len(),
                needed,
            });
        }
        Ok(())
    }

    pub fn push(&mut self, bytes: &[u8]) -> WriteResult<()> {
        self.reserve(bytes.len())?;
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }

    pub fn push_byte(&mut self, byte: u8) -> WriteResult<()> {
        self.push(&[byte])
    }

    pub fn push_repeated(&mut self, byte: u8, count: usize) -> WriteResult<()> {
        self.reserve(count)?;
        self.buf[self.len..self.len + count].fill(byte);
        self.len += count;
        Ok(())
    }

    /// Replaces single separator bytes at `positions` (ascending, all inside
    /// the written range) with the bytes produced by `replacement`, shifting
    /// everything after them to the right in place.
    pub fn expand_separators(
        &mut self,
        positions: &[usize],
        replacement: impl Fn(usize) -> Vec<u8>,
    ) -> WriteResult<()> {
        let replacements: Vec<Vec<u8>> = (0..positions.len()).map(&replacement).collect();
        let growth: usize = replacements.iter().map(|r| r.len().saturating_sub(1)).sum();
        self.reserve(growth)?;

        let mut shift = growth;
        let mut tail_end = self.len;
        for (&pos, text) in positions.iter().zip(&replacements).rev() {
            self.buf.copy_within(pos + 1..tail_end, pos + 1 + shift);
            let grow = text.len().saturating_sub(1);
            let at = pos + shift - grow;
            self.buf[at..at + text.len()].copy_from_slice(text);
            shift -= grow;
            tail_end = pos;
        }

        self.len += growth;
        Ok(())
    }
}
