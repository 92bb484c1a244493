//! PackBits line compression.
//!
//! | Header byte | Meaning |
//! |-------------|---------|
//! | `0..=127` | `h + 1` literal bytes follow |
//! | `129..=255` | repeat the next byte `257 - h` times |
//! | `128` | no-op |
//!
//! Runs and literals are at most 128 bytes long.

const MAX_RUN: usize = 128;

/// Compress one line, appending to `out`.
pub fn encode_into(data: &[u8], out: &mut Vec<u8>) {
    let mut i = 0;
    while i < data.len() {
        let run = repeat_len(&data[i..]);
        if run >= 2 {
            out.push((1 - run as i16) as i8 as u8);
            out.push(data[i]);
            i += run;
            continue;
        }

        // Literal until the next run of at least two
        let start = i;
        while i < data.len() && i - start < MAX_RUN {
            if repeat_len(&data[i..]) >= 2 {
                break;
            }
            i += 1;
        }
        out.push((i - start - 1) as u8);
        out.extend_from_slice(&data[start..i]);
    }
}

/// Compress one line.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / MAX_RUN + 1);
    encode_into(data, &mut out);
    out
}

fn repeat_len(data: &[u8]) -> usize {
    let first = data[0];
    data.iter()
        .take(MAX_RUN)
        .take_while(|&&b| b == first)
        .count()
}

/// A compressed line of `len` zero bytes.
pub fn blank_line(len: usize, out: &mut Vec<u8>) {
    let mut left = len;
    while left >= MAX_RUN {
        out.push(0x81);
        out.push(0);
        left -= MAX_RUN;
    }
    match left {
        0 => {}
        1 => {
            out.push(0);
            out.push(0);
        }
        n => {
            out.push((257 - n) as u8);
            out.push(0);
        }
    }
}

/// Decompress a stream. Returns `None` on truncated input.
pub fn decode(data: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let header = data[i];
        i += 1;
        match header {
            0..=127 => {
                let n = usize::from(header) + 1;
                out.extend_from_slice(data.get(i..i + n)?);
                i += n;
            }
            128 => {}
            _ => {
                let byte = *data.get(i)?;
                i += 1;
                out.extend(std::iter::repeat_n(byte, 257 - usize::from(header)));
            }
        }
    }
    Some(out)
}
