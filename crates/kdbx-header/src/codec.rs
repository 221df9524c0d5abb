//! Little-endian primitive reads over an immutable byte slice
//!
//! Every read checks `offset + width <= len` first and reports
//! `KdbxError::TruncatedInput` instead of panicking.

use byteorder::{ByteOrder, LittleEndian};
use kdbx_core::{KdbxError, KdbxResult};

fn check(buf: &[u8], offset: usize, width: usize) -> KdbxResult<usize> {
    match offset.checked_add(width) {
        Some(end) if end <= buf.len() => Ok(end),
        _ => Err(KdbxError::TruncatedInput {
            offset,
            needed: width,
            len: buf.len(),
        }),
    }
}

pub fn read_u8(buf: &[u8], offset: usize) -> KdbxResult<u8> {
    check(buf, offset, 1)?;
    Ok(buf[offset])
}

pub fn read_u16(buf: &[u8], offset: usize) -> KdbxResult<u16> {
    let end = check(buf, offset, 2)?;
    Ok(LittleEndian::read_u16(&buf[offset..end]))
}

pub fn read_u32(buf: &[u8], offset: usize) -> KdbxResult<u32> {
    let end = check(buf, offset, 4)?;
    Ok(LittleEndian::read_u32(&buf[offset..end]))
}

pub fn read_u64(buf: &[u8], offset: usize) -> KdbxResult<u64> {
    let end = check(buf, offset, 8)?;
    Ok(LittleEndian::read_u64(&buf[offset..end]))
}

/// Borrow `len` bytes starting at `offset`.
pub fn read_slice(buf: &[u8], offset: usize, len: usize) -> KdbxResult<&[u8]> {
    let end = check(buf, offset, len)?;
    Ok(&buf[offset..end])
}

/// Copy exactly `N` bytes starting at `offset` into an array.
pub fn read_array<const N: usize>(buf: &[u8], offset: usize) -> KdbxResult<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(read_slice(buf, offset, N)?);
    Ok(out)
}

/// Forward-only cursor over a byte slice built on the checked reads above.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn read_u8(&mut self) -> KdbxResult<u8> {
        let v = read_u8(self.buf, self.pos)?;
        self.pos += 1;
        Ok(v)
    }

    pub fn read_u16(&mut self) -> KdbxResult<u16> {
        let v = read_u16(self.buf, self.pos)?;
        self.pos += 2;
        Ok(v)
    }

    pub fn read_u32(&mut self) -> KdbxResult<u32> {
        let v = read_u32(self.buf, self.pos)?;
        self.pos += 4;
        Ok(v)
    }

    pub fn read_u64(&mut self) -> KdbxResult<u64> {
        let v = read_u64(self.buf, self.pos)?;
        self.pos += 8;
        Ok(v)
    }

    pub fn read_slice(&mut self, len: usize) -> KdbxResult<&'a [u8]> {
        let v = read_slice(self.buf, self.pos, len)?;
        self.pos += len;
        Ok(v)
    }
}
