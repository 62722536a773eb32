//! LZO1X block compression
//!
//! The decoder accepts the full LZO1X instruction set:
//!
//! | first byte    | meaning                                                      |
//! |---------------|--------------------------------------------------------------|
//! | `> 17` (start)| `b - 17` literals                                            |
//! | `0..=15`      | literal run (state 0), or M1 short match (states 1..=4)      |
//! | `16..=31`     | M4 match, distance `0x4000..=0xBFFF`; distance 0 ends stream |
//! | `32..=63`     | M3 match, distance `1..=0x4000`                              |
//! | `64..=255`    | M2 match, length `3..=8`, distance `1..=0x800`               |
//!
//! The low two bits of the last byte of a match encode 0-3 trailing literals.
//! The encoder only emits literal runs, M2 and M3, which is enough for the
//! 8 KiB blocks used by map packs.

use crate::error::{FormatError, Result};

const M2_MAX_OFFSET: usize = 0x0800;
const M3_MAX_OFFSET: usize = 0x4000;
const M4_BASE_OFFSET: usize = 0x4000;
const MIN_MATCH: usize = 3;
const HASH_BITS: u32 = 13;
const END_MARKER: [u8; 3] = [0x11, 0x00, 0x00];

/// Decompress one LZO1X stream that must expand to exactly `output_size` bytes.
pub fn decompress(input: &[u8], output_size: usize) -> Result<Vec<u8>> {
    let mut decoder = Decoder {
        input,
        ip: 0,
        out: Vec::with_capacity(output_size),
        limit: output_size,
    };
    decoder.run()?;
    Ok(decoder.out)
}

struct Decoder<'a> {
    input: &'a [u8],
    ip: usize,
    out: Vec<u8>,
    limit: usize,
}

impl<'a> Decoder<'a> {
    fn byte(&mut self) -> Result<usize> {
        let b = *self
            .input
            .get(self.ip)
            .ok_or(FormatError::InputOverrun { offset: self.ip })?;
        self.ip += 1;
        Ok(b as usize)
    }

    /// Zero bytes add 255 each, the first non-zero byte terminates.
    fn extended_length(&mut self, base: usize) -> Result<usize> {
        let mut total = 0usize;
        loop {
            let b = self.byte()?;
            if b != 0 {
                return Ok(total + base + b);
            }
            total += 255;
        }
    }

    fn literals(&mut self, count: usize) -> Result<()> {
        let end = self.ip + count;
        if end > self.input.len() {
            return Err(FormatError::InputOverrun { offset: self.input.len() });
        }
        if self.out.len() + count > self.limit {
            return Err(FormatError::OutputOverrun { expected: self.limit });
        }
        self.out.extend_from_slice(&self.input[self.ip..end]);
        self.ip = end;
        Ok(())
    }

    fn copy_match(&mut self, distance: usize, len: usize) -> Result<()> {
        if distance == 0 || distance > self.out.len() {
            return Err(FormatError::LookBehindOverrun {
                distance,
                position: self.out.len(),
            });
        }
        if self.out.len() + len > self.limit {
            return Err(FormatError::OutputOverrun { expected: self.limit });
        }
        let start = self.out.len() - distance;
        // Overlapping copies repeat the pattern, so go byte by byte.
        for i in 0..len {
            let b = self.out[start + i];
            self.out.push(b);
        }
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        // Literals copied by the previous instruction: 0 after a bare match,
        // 1..=3 after trailing literals, 4 after a full literal run.
        let mut state = 0usize;

        let first = *self
            .input
            .first()
            .ok_or(FormatError::InputOverrun { offset: 0 })? as usize;
        if first > 17 {
            self.ip = 1;
            let count = first - 17;
            self.literals(count)?;
            state = count.min(4);
        }

        loop {
            let t = self.byte()?;
            let trailing;
            if t >= 64 {
                let high = self.byte()?;
                let distance = 1 + ((t >> 2) & 7) + (high << 3);
                self.copy_match(distance, (t >> 5) + 1)?;
                trailing = t & 3;
            } else if t >= 32 {
                let mut len = t & 31;
                if len == 0 {
                    len = self.extended_length(31)?;
                }
                let lo = self.byte()?;
                let hi = self.byte()?;
                let distance = 1 + (lo >> 2) + (hi << 6);
                self.copy_match(distance, len + 2)?;
                trailing = lo & 3;
            } else if t >= 16 {
                let mut len = t & 7;
                if len == 0 {
                    len = self.extended_length(7)?;
                }
                let lo = self.byte()?;
                let hi = self.byte()?;
                let distance = ((t & 8) << 11) + (lo >> 2) + (hi << 6);
                if distance == 0 {
                    return self.finish();
                }
                self.copy_match(distance + M4_BASE_OFFSET, len + 2)?;
                trailing = lo & 3;
            } else if state == 0 {
                let len = if t == 0 { self.extended_length(15)? } else { t };
                self.literals(len + 3)?;
                state = 4;
                continue;
            } else if state < 4 {
                let high = self.byte()?;
                let distance = 1 + (t >> 2) + (high << 2);
                self.copy_match(distance, 2)?;
                trailing = t & 3;
            } else {
                let high = self.byte()?;
                let distance = 1 + M2_MAX_OFFSET + (t >> 2) + (high << 2);
                self.copy_match(distance, 3)?;
                trailing = t & 3;
            }

            if trailing > 0 {
                self.literals(trailing)?;
            }
            state = trailing;
        }
    }

    fn finish(&mut self) -> Result<()> {
        if self.out.len() != self.limit {
            return Err(FormatError::OutputUnderrun {
                expected: self.limit,
                actual: self.out.len(),
            });
        }
        Ok(())
    }
}

/// Compress `input` into a single LZO1X stream using a greedy single-probe matcher.
pub fn compress(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() + input.len() / 16 + 64 + END_MARKER.len());
    let mut table = vec![usize::MAX; 1 << HASH_BITS];
    let mut last_match: Option<usize> = None;
    let mut lit_start = 0usize;
    let mut pos = 0usize;

    while pos + MIN_MATCH <= input.len() {
        let slot = hash3(&input[pos..]);
        let candidate = table[slot];
        table[slot] = pos;

        if candidate != usize::MAX
            && pos - candidate <= M3_MAX_OFFSET
            && input[candidate..candidate + MIN_MATCH] == input[pos..pos + MIN_MATCH]
        {
            let mut len = MIN_MATCH;
            while pos + len < input.len() && input[candidate + len] == input[pos + len] {
                len += 1;
            }

            emit_literals(&mut out, &input[lit_start..pos], last_match);
            last_match = Some(emit_match(&mut out, pos - candidate, len));

            let hash_end = (pos + len).min(input.len().saturating_sub(MIN_MATCH - 1));
            for p in pos + 1..hash_end {
                table[hash3(&input[p..])] = p;
            }
            pos += len;
            lit_start = pos;
        } else {
            pos += 1;
        }
    }

    emit_literals(&mut out, &input[lit_start..], last_match);
    out.extend_from_slice(&END_MARKER);
    out
}

fn hash3(bytes: &[u8]) -> usize {
    let v = (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2]);
    (v.wrapping_mul(0x9E37_79B1) >> (32 - HASH_BITS)) as usize
}

fn emit_literals(out: &mut Vec<u8>, literals: &[u8], last_match: Option<usize>) {
    let n = literals.len();
    if n == 0 {
        return;
    }
    match last_match {
        Some(idx) if n <= 3 => out[idx] |= n as u8,
        None if out.is_empty() && n <= 238 => out.push(17 + n as u8),
        _ if n <= 3 => unreachable!("short literal run without a preceding match"),
        _ if n <= 18 => out.push((n - 3) as u8),
        _ => {
            out.push(0);
            push_extended(out, n - 18);
        }
    }
    out.extend_from_slice(literals);
}

/// Returns the index of the byte that carries the trailing-literal bits.
fn emit_match(out: &mut Vec<u8>, distance: usize, len: usize) -> usize {
    let d = distance - 1;
    if len <= 8 && d < M2_MAX_OFFSET {
        let idx = out.len();
        out.push((((len - 1) << 5) | ((d & 7) << 2)) as u8);
        out.push((d >> 3) as u8);
        return idx;
    }

    let l = len - 2;
    if l <= 31 {
        out.push(32 | l as u8);
    } else {
        out.push(32);
        push_extended(out, l - 31);
    }
    let idx = out.len();
    out.push(((d & 63) << 2) as u8);
    out.push((d >> 6) as u8);
    idx
}

fn push_extended(out: &mut Vec<u8>, mut n: usize) {
    while n > 255 {
        out.push(0);
        n -= 255;
    }
    out.push(n as u8);
}
