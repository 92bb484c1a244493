//! Packed dot rows.
//!
//! A row stores `bits` bits per dot, most significant bits first, padded to
//! a whole byte. Masks always use one bit per dot.

/// Bytes needed for `dots` dots at `bits` bits each.
#[inline]
pub fn row_bytes(dots: u32, bits: u8) -> usize {
    (dots as usize * usize::from(bits)).div_ceil(8)
}

/// Read dot `x`.
#[inline]
pub fn get_dot(row: &[u8], x: usize, bits: u8) -> u8 {
    let bits = usize::from(bits);
    let bit = x * bits;
    let shift = 8 - bits - bit % 8;
    (row[bit / 8] >> shift) & ((1u8 << bits) - 1)
}

/// Write dot `x`.
#[inline]
pub fn set_dot(row: &mut [u8], x: usize, bits: u8, value: u8) {
    let bits = usize::from(bits);
    let bit = x * bits;
    let shift = 8 - bits - bit % 8;
    let mask = ((1u8 << bits) - 1) << shift;
    let byte = &mut row[bit / 8];
    *byte = (*byte & !mask) | ((value << shift) & mask);
}

/// Whether a row carries no ink.
#[inline]
pub fn is_blank(row: &[u8]) -> bool {
    row.iter().all(|&b| b == 0)
}

/// Clear every dot whose mask bit is 0.
pub fn apply_mask(row: &mut [u8], mask: &[u8], dots: u32, bits: u8) {
    if bits == 1 {
        for (byte, m) in row.iter_mut().zip(mask) {
            *byte &= m;
        }
        return;
    }
    for x in 0..dots as usize {
        if get_dot(mask, x, 1) == 0 {
            set_dot(row, x, bits, 0);
        }
    }
}

/// Dots of one sub-pass.
///
/// Sub-pass `j` of `h_passes × v_passes` takes the columns `x` with
/// `x % h_passes == j % h_passes`; of those, vertical sub-pass
/// `j / h_passes` keeps every `v_passes`-th one. The output is
/// `dots.div_ceil(h_passes)` dots wide for every sub-pass.
pub fn split_subpass(
    row: &[u8],
    dots: u32,
    bits: u8,
    h_passes: u32,
    v_passes: u32,
    subpass: u32,
    out: &mut [u8],
) {
    out.fill(0);
    let h_passes = h_passes.max(1) as usize;
    let v_passes = v_passes.max(1) as usize;
    let h = subpass as usize % h_passes;
    let v = subpass as usize / h_passes;
    let width = (dots as usize).div_ceil(h_passes);
    for i in (v..width).step_by(v_passes) {
        let x = i * h_passes + h;
        if x >= dots as usize {
            break;
        }
        let dot = get_dot(row, x, bits);
        if dot != 0 {
            set_dot(out, i, bits, dot);
        }
    }
}
