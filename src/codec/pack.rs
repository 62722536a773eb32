//! Binary packs embedded in the container as base64 text split over numbered keys.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use isopack::{decode_blocks, encode_blocks, Format, FormatError};

use super::ini::{IniFile, IniSection};
use super::reader::BinaryReader;
use super::writer::BinaryWriter;
use crate::error::Result;

/// Longest base64 value written per key.
pub const MAX_LINE_LENGTH: usize = 70;

/// Side of the fixed overlay grid; cell `(x, y)` lives at `y * OVERLAY_GRID_SIZE + x`.
pub const OVERLAY_GRID_SIZE: usize = 512;
pub const OVERLAY_PACK_LEN: usize = OVERLAY_GRID_SIZE * OVERLAY_GRID_SIZE;
pub const NO_OVERLAY: u8 = 0xFF;

const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Concatenate the values of `section` in numeric key order and decode them.
/// Keys that are not numbers are ignored.
pub fn read_base64_section(section: &IniSection) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let mut lines: Vec<(u32, &str)> = section
        .iter()
        .filter_map(|(k, v)| k.trim().parse::<u32>().ok().map(|n| (n, v)))
        .collect();
    lines.sort_by_key(|&(n, _)| n);
    let text: String = lines.into_iter().map(|(_, v)| v.trim()).collect();
    ENGINE.decode(text.as_bytes())
}

/// Encode `bytes` into a section with keys `1`, `2`, ...
pub fn base64_section(name: &str, bytes: &[u8]) -> IniSection {
    let text = ENGINE.encode(bytes);
    let mut section = IniSection::new(name);
    // base64 output is ASCII, so byte chunks are valid str slices
    for (i, chunk) in text.as_bytes().chunks(MAX_LINE_LENGTH).enumerate() {
        section.set((i + 1).to_string(), String::from_utf8_lossy(chunk));
    }
    section
}

/// Replace section `name` of `ini` with the encoding of `bytes`.
pub fn write_base64_section(ini: &mut IniFile, name: &str, bytes: &[u8]) {
    ini.put_section(base64_section(name, bytes));
}

// ============================================================================
// Tile pack
// ============================================================================

/// Serialized size of one [`IsoTileRecord`].
pub const TILE_RECORD_SIZE: usize = 11;

/// One terrain cell as stored in the tile pack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IsoTileRecord {
    pub x: u16,
    pub y: u16,
    pub tile_index: u32,
    pub sub_tile: u8,
    pub level: u8,
    pub ice_growth: u8,
}

impl IsoTileRecord {
    pub fn read(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            x: reader.read_u16_le()?,
            y: reader.read_u16_le()?,
            tile_index: reader.read_u32_le()?,
            sub_tile: reader.read_u8()?,
            level: reader.read_u8()?,
            ice_growth: reader.read_u8()?,
        })
    }

    pub fn write(&self, writer: &mut BinaryWriter) {
        writer.write_u16_le(self.x);
        writer.write_u16_le(self.y);
        writer.write_u32_le(self.tile_index);
        writer.write_u8(self.sub_tile);
        writer.write_u8(self.level);
        writer.write_u8(self.ice_growth);
    }
}

/// Records decoded from a tile pack plus the length of any trailing partial record.
#[derive(Debug, Default)]
pub struct TilePack {
    pub records: Vec<IsoTileRecord>,
    pub trailing_bytes: usize,
}

pub fn decode_tile_pack(packed: &[u8]) -> std::result::Result<TilePack, FormatError> {
    let raw = decode_blocks(packed, Format::Lzo)?;
    let mut reader = BinaryReader::new(&raw);
    let mut pack = TilePack::default();
    while reader.remaining() >= TILE_RECORD_SIZE {
        // remaining() guarantees a whole record
        if let Ok(record) = IsoTileRecord::read(&mut reader) {
            pack.records.push(record);
        }
    }
    pack.trailing_bytes = reader.remaining();
    Ok(pack)
}

pub fn encode_tile_pack(records: &[IsoTileRecord]) -> Vec<u8> {
    let mut writer = BinaryWriter::with_capacity(records.len() * TILE_RECORD_SIZE);
    for record in records {
        record.write(&mut writer);
    }
    encode_blocks(&writer.into_vec(), Format::Lzo)
}

// ============================================================================
// Overlay packs
// ============================================================================

pub fn decode_overlay_pack(packed: &[u8]) -> std::result::Result<Vec<u8>, FormatError> {
    let grid = decode_blocks(packed, Format::Lcw)?;
    if grid.len() != OVERLAY_PACK_LEN {
        return Err(FormatError::OutputUnderrun {
            expected: OVERLAY_PACK_LEN,
            actual: grid.len(),
        });
    }
    Ok(grid)
}

pub fn encode_overlay_pack(grid: &[u8]) -> Vec<u8> {
    encode_blocks(grid, Format::Lcw)
}

pub fn overlay_grid_index(x: i16, y: i16) -> Option<usize> {
    let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
    (x < OVERLAY_GRID_SIZE && y < OVERLAY_GRID_SIZE).then_some(y * OVERLAY_GRID_SIZE + x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_section_line_split() {
        let bytes: Vec<u8> = (0..200u8).collect();
        let mut ini = IniFile::new();
        write_base64_section(&mut ini, "Pack", &bytes);
        let section = ini.section("Pack").unwrap();
        assert!(section.values().all(|v| v.len() <= MAX_LINE_LENGTH));
        assert_eq!(section.get("1").map(str::len), Some(MAX_LINE_LENGTH));
        assert_eq!(read_base64_section(section).unwrap(), bytes);
    }

    #[test]
    fn test_base64_numeric_key_order() {
        let encoded = ENGINE.encode(b"hello world, packs");
        let (a, b) = encoded.split_at(8);
        let mut section = IniSection::new("Pack");
        section.set("10", b);
        section.set("2", a);
        assert_eq!(read_base64_section(&section).unwrap(), b"hello world, packs");
    }

    #[test]
    fn test_tile_pack_with_trailing_bytes() {
        let records = vec![
            IsoTileRecord { x: 10, y: 40, tile_index: 5, sub_tile: 1, level: 3, ice_growth: 0 },
            IsoTileRecord { x: 11, y: 40, tile_index: 70_000, sub_tile: 0, level: 0, ice_growth: 1 },
        ];
        let packed = encode_tile_pack(&records);
        let pack = decode_tile_pack(&packed).unwrap();
        assert_eq!(pack.records, records);
        assert_eq!(pack.trailing_bytes, 0);

        let mut writer = BinaryWriter::new();
        records[0].write(&mut writer);
        let mut raw = writer.into_vec();
        raw.extend_from_slice(&[1, 2, 3]);
        let pack = decode_tile_pack(&encode_blocks(&raw, Format::Lzo)).unwrap();
        assert_eq!(pack.records.len(), 1);
        assert_eq!(pack.trailing_bytes, 3);
    }

    #[test]
    fn test_overlay_pack_size_checked() {
        let mut grid = vec![NO_OVERLAY; OVERLAY_PACK_LEN];
        grid[overlay_grid_index(3, 2).unwrap()] = 7;
        let decoded = decode_overlay_pack(&encode_overlay_pack(&grid)).unwrap();
        assert_eq!(decoded[2 * OVERLAY_GRID_SIZE + 3], 7);

        let short = encode_overlay_pack(&grid[..100]);
        assert!(decode_overlay_pack(&short).is_err());
        assert_eq!(overlay_grid_index(512, 0), None);
    }
}
