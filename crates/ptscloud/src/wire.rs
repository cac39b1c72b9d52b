//! Little-endian field readers over byte slices.
//!
//! Readers return `None` when the slice is too short; each archive parser maps
//! that to its own error kind with the name of the field being read.

#[inline(always)]
pub(crate) fn take<'a>(buf: &mut &'a [u8], n: usize) -> Option<&'a [u8]> {
    if buf.len() < n {
        return None;
    }
    let (head, tail) = buf.split_at(n);
    *buf = tail;
    Some(head)
}

#[inline(always)]
pub(crate) fn le_i32(buf: &mut &[u8]) -> Option<i32> {
    let b = take(buf, 4)?;
    Some(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

#[inline(always)]
pub(crate) fn le_f64(buf: &mut &[u8]) -> Option<f64> {
    let b = take(buf, 8)?;
    Some(f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
}

pub(crate) fn le_f64x16(buf: &mut &[u8]) -> Option<[f64; 16]> {
    let raw = take(buf, 16 * 8)?;
    let mut m = [0.0f64; 16];
    for (dst, chunk) in m.iter_mut().zip(raw.chunks_exact(8)) {
        let mut b = [0u8; 8];
        b.copy_from_slice(chunk);
        *dst = f64::from_le_bytes(b);
    }
    Some(m)
}

/// Decode a packed block of `[f32; 3]` records.
pub(crate) fn f32x3_block(raw: &[u8]) -> Vec<[f32; 3]> {
    #[cfg(target_endian = "little")]
    {
        // Zero-copy view when the block happens to be 4-aligned in memory.
        if let Ok(view) = bytemuck::try_cast_slice::<u8, [f32; 3]>(raw) {
            return view.to_vec();
        }
    }

    raw.chunks_exact(12)
        .map(|c| {
            [
                f32::from_le_bytes([c[0], c[1], c[2], c[3]]),
                f32::from_le_bytes([c[4], c[5], c[6], c[7]]),
                f32::from_le_bytes([c[8], c[9], c[10], c[11]]),
            ]
        })
        .collect()
}

/// Decode a packed block of `[u8; 3]` records.
pub(crate) fn u8x3_block(raw: &[u8]) -> Vec<[u8; 3]> {
    bytemuck::cast_slice::<u8, [u8; 3]>(raw).to_vec()
}

/// Decode a packed block of `i32`.
pub(crate) fn i32_block(raw: &[u8]) -> Vec<i32> {
    #[cfg(target_endian = "little")]
    {
        if let Ok(view) = bytemuck::try_cast_slice::<u8, i32>(raw) {
            return view.to_vec();
        }
    }

    raw.chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
