//! Block-framed compression used by isometric map packs
//!
//! Layers:
//! 1. `block` - `(input_size, output_size, payload)` framing and block splitting
//! 2. `lzo` - LZO1X inner format (tile packs, format version 5)
//! 3. `lcw` - Format80 inner format (overlay packs, format version 80)

mod block;
mod error;
pub mod lcw;
pub mod lzo;

pub use block::{decode_blocks, encode_blocks, BlockHeader, BlockReader, Format, MAX_BLOCK_SIZE};
pub use error::{FormatError, Result};
