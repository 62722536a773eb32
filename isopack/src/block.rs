//! Block framing shared by every map pack.
//!
//! A pack is a sequence of blocks, each `input_size: u16 LE`, `output_size: u16 LE`
//! followed by `input_size` bytes compressed independently with the pack's inner format.

use crate::error::{FormatError, Result};
use crate::{lcw, lzo};

/// Largest uncompressed payload of a single block.
pub const MAX_BLOCK_SIZE: usize = 8192;

const HEADER_SIZE: usize = 4;

/// Inner compression of a block stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// LZO1X, format version 5 (tile packs)
    Lzo,
    /// Format80 / LCW, format version 80 (overlay packs)
    Lcw,
}

impl Format {
    pub fn from_version(version: u32) -> Result<Self> {
        match version {
            5 => Ok(Self::Lzo),
            80 => Ok(Self::Lcw),
            other => Err(FormatError::UnsupportedVersion(other)),
        }
    }

    pub fn version(self) -> u32 {
        match self {
            Self::Lzo => 5,
            Self::Lcw => 80,
        }
    }

    fn decompress(self, input: &[u8], output_size: usize) -> Result<Vec<u8>> {
        match self {
            Self::Lzo => lzo::decompress(input, output_size),
            Self::Lcw => lcw::decompress(input, output_size),
        }
    }

    fn compress(self, input: &[u8]) -> Vec<u8> {
        match self {
            Self::Lzo => lzo::compress(input),
            Self::Lcw => lcw::compress(input),
        }
    }
}

/// Header of one framed block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub input_size: u16,
    pub output_size: u16,
}

/// Iterates the framed blocks of a pack without decompressing them.
pub struct BlockReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BlockReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Read the next block, or `None` once the pack is exhausted.
    pub fn next_block(&mut self) -> Result<Option<(BlockHeader, &'a [u8])>> {
        if self.remaining() == 0 {
            return Ok(None);
        }
        if self.remaining() < HEADER_SIZE {
            return Err(FormatError::BlockOverrun {
                offset: self.pos,
                declared: HEADER_SIZE,
                available: self.remaining(),
            });
        }
        let d = &self.data[self.pos..];
        let header = BlockHeader {
            input_size: u16::from_le_bytes([d[0], d[1]]),
            output_size: u16::from_le_bytes([d[2], d[3]]),
        };
        let start = self.pos + HEADER_SIZE;
        let end = start + header.input_size as usize;
        if end > self.data.len() {
            return Err(FormatError::BlockOverrun {
                offset: self.pos,
                declared: header.input_size as usize,
                available: self.data.len() - start,
            });
        }
        self.pos = end;
        Ok(Some((header, &self.data[start..end])))
    }
}

/// Decode every block of a pack and concatenate their outputs.
pub fn decode_blocks(data: &[u8], format: Format) -> Result<Vec<u8>> {
    let mut reader = BlockReader::new(data);
    let mut out = Vec::new();
    while let Some((header, payload)) = reader.next_block()? {
        let block = format.decompress(payload, header.output_size as usize)?;
        out.extend_from_slice(&block);
    }
    Ok(out)
}

/// Split `data` into blocks of at most [`MAX_BLOCK_SIZE`] bytes and compress each.
pub fn encode_blocks(data: &[u8], format: Format) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 2 + HEADER_SIZE);
    for chunk in data.chunks(MAX_BLOCK_SIZE) {
        let packed = format.compress(chunk);
        out.extend_from_slice(&(packed.len() as u16).to_le_bytes());
        out.extend_from_slice(&(chunk.len() as u16).to_le_bytes());
        out.extend_from_slice(&packed);
    }
    out
}
