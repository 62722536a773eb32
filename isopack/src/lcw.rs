//! Format80 (LCW) compression, used by overlay packs.
//!
//! Commands:
//! - `0cccpppp pppppppp`: copy `c + 3` bytes from `p` bytes back in the output
//! - `10cccccc`: copy `c` literal bytes from the input; `c == 0` ends the stream
//! - `11cccccc pppp`: copy `c + 3` bytes from absolute output offset `p`
//! - `0xFE cccc v`: fill `c` bytes with `v`
//! - `0xFF cccc pppp`: copy `c` bytes from absolute output offset `p`

use crate::error::{FormatError, Result};

const END: u8 = 0x80;
const MAX_LITERALS: usize = 0x3F;
const MAX_RELATIVE_COUNT: usize = 10;
const MAX_RELATIVE_DISTANCE: usize = 0x0FFF;
const MAX_MEDIUM_COUNT: usize = 64;
const MIN_FILL: usize = 4;
const HASH_BITS: u32 = 12;

/// Decompress one Format80 stream that must expand to exactly `output_size` bytes.
pub fn decompress(input: &[u8], output_size: usize) -> Result<Vec<u8>> {
    let mut out: Vec<u8> = Vec::with_capacity(output_size);
    let mut ip = 0usize;

    while ip < input.len() {
        let cmd = input[ip];
        ip += 1;

        if cmd & 0x80 == 0 {
            let low = read_u8(input, &mut ip)? as usize;
            let count = ((cmd & 0x70) >> 4) as usize + 3;
            let distance = (((cmd & 0x0F) as usize) << 8) | low;
            if distance == 0 || distance > out.len() {
                return Err(FormatError::LookBehindOverrun {
                    distance,
                    position: out.len(),
                });
            }
            let from = out.len() - distance;
            copy_within(&mut out, from, count, output_size)?;
        } else if cmd & 0x40 == 0 {
            let count = (cmd & 0x3F) as usize;
            if count == 0 {
                break;
            }
            let end = ip + count;
            if end > input.len() {
                return Err(FormatError::InputOverrun { offset: input.len() });
            }
            check_room(&out, count, output_size)?;
            out.extend_from_slice(&input[ip..end]);
            ip = end;
        } else if cmd == 0xFE {
            let count = read_u16(input, &mut ip)? as usize;
            let value = read_u8(input, &mut ip)?;
            check_room(&out, count, output_size)?;
            out.resize(out.len() + count, value);
        } else if cmd == 0xFF {
            let count = read_u16(input, &mut ip)? as usize;
            let from = read_u16(input, &mut ip)? as usize;
            copy_within(&mut out, from, count, output_size)?;
        } else {
            let count = (cmd & 0x3F) as usize + 3;
            let from = read_u16(input, &mut ip)? as usize;
            copy_within(&mut out, from, count, output_size)?;
        }
    }

    if out.len() != output_size {
        return Err(FormatError::OutputUnderrun {
            expected: output_size,
            actual: out.len(),
        });
    }
    Ok(out)
}

fn read_u8(input: &[u8], ip: &mut usize) -> Result<u8> {
    let b = *input.get(*ip).ok_or(FormatError::InputOverrun { offset: *ip })?;
    *ip += 1;
    Ok(b)
}

fn read_u16(input: &[u8], ip: &mut usize) -> Result<u16> {
    let lo = read_u8(input, ip)?;
    let hi = read_u8(input, ip)?;
    Ok(u16::from_le_bytes([lo, hi]))
}

fn check_room(out: &[u8], count: usize, limit: usize) -> Result<()> {
    if out.len() + count > limit {
        return Err(FormatError::OutputOverrun { expected: limit });
    }
    Ok(())
}

fn copy_within(out: &mut Vec<u8>, from: usize, count: usize, limit: usize) -> Result<()> {
    if from >= out.len() && count > 0 {
        return Err(FormatError::CopySourceOverrun {
            source_pos: from,
            position: out.len(),
        });
    }
    check_room(out, count, limit)?;
    for i in 0..count {
        let b = out[from + i];
        out.push(b);
    }
    Ok(())
}

/// Compress `input` into a Format80 stream terminated by the end command.
pub fn compress(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() + input.len() / MAX_LITERALS + 8);
    let mut table = vec![usize::MAX; 1 << HASH_BITS];
    let mut lit_start = 0usize;
    let mut pos = 0usize;

    while pos < input.len() {
        let run = run_length(input, pos);
        let (match_from, match_len) = find_match(input, pos, &mut table);

        if run >= MIN_FILL && run >= match_len {
            emit_literals(&mut out, &input[lit_start..pos]);
            out.push(0xFE);
            out.extend_from_slice(&(run as u16).to_le_bytes());
            out.push(input[pos]);
            pos += run;
            lit_start = pos;
        } else if match_len >= 3 {
            emit_literals(&mut out, &input[lit_start..pos]);
            emit_copy(&mut out, pos, match_from, match_len);
            pos += match_len;
            lit_start = pos;
        } else {
            pos += 1;
        }
    }

    emit_literals(&mut out, &input[lit_start..]);
    out.push(END);
    out
}

fn run_length(input: &[u8], pos: usize) -> usize {
    let value = input[pos];
    input[pos..]
        .iter()
        .take(u16::MAX as usize)
        .take_while(|&&b| b == value)
        .count()
}

fn find_match(input: &[u8], pos: usize, table: &mut [usize]) -> (usize, usize) {
    if pos + 3 > input.len() || pos > u16::MAX as usize {
        return (0, 0);
    }
    let slot = hash3(&input[pos..]);
    let candidate = table[slot];
    table[slot] = pos;
    if candidate == usize::MAX || candidate > u16::MAX as usize {
        return (0, 0);
    }
    let len = input[pos..]
        .iter()
        .zip(&input[candidate..])
        .take(u16::MAX as usize)
        .take_while(|(a, b)| a == b)
        .count();
    (candidate, len)
}

fn hash3(bytes: &[u8]) -> usize {
    let v = (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2]);
    (v.wrapping_mul(0x9E37_79B1) >> (32 - HASH_BITS)) as usize
}

fn emit_literals(out: &mut Vec<u8>, literals: &[u8]) {
    for chunk in literals.chunks(MAX_LITERALS) {
        out.push(0x80 | chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
}

fn emit_copy(out: &mut Vec<u8>, pos: usize, from: usize, len: usize) {
    let distance = pos - from;
    if len <= MAX_RELATIVE_COUNT && distance <= MAX_RELATIVE_DISTANCE {
        out.push((((len - 3) << 4) | (distance >> 8)) as u8);
        out.push((distance & 0xFF) as u8);
    } else if len <= MAX_MEDIUM_COUNT {
        out.push(0xC0 | (len - 3) as u8);
        out.extend_from_slice(&(from as u16).to_le_bytes());
    } else {
        out.push(0xFF);
        out.extend_from_slice(&(len as u16).to_le_bytes());
        out.extend_from_slice(&(from as u16).to_le_bytes());
    }
}
