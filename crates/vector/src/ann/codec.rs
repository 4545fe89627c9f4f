//! Little-endian framing shared by the index formats

use std::io::{self, Read, Write};

pub(crate) fn write_u8(w: &mut dyn Write, v: u8) -> io::Result<()> {
    w.write_all(&[v])
}

pub(crate) fn write_u32(w: &mut dyn Write, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

pub(crate) fn write_u64(w: &mut dyn Write, v: u64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

/// Write a usize that must fit the u32 on-disk field
pub(crate) fn write_len(w: &mut dyn Write, v: usize) -> io::Result<()> {
    let v = u32::try_from(v)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "Value exceeds u32 range"))?;
    write_u32(w, v)
}

pub(crate) fn write_f32s(w: &mut dyn Write, values: &[f32]) -> io::Result<()> {
    for v in values {
        w.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

pub(crate) fn read_u8<R: Read + ?Sized>(r: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub(crate) fn read_u32<R: Read + ?Sized>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_u64<R: Read + ?Sized>(r: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read `count` f32 values without trusting `count` for preallocation
pub(crate) fn read_f32s<R: Read + ?Sized>(r: &mut R, count: usize) -> io::Result<Vec<f32>> {
    let mut out = Vec::with_capacity(count.min(1 << 20));
    let mut buf = [0u8; 4];
    for _ in 0..count {
        r.read_exact(&mut buf)?;
        out.push(f32::from_le_bytes(buf));
    }
    Ok(out)
}

pub(crate) fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}
