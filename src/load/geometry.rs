use crate::codec::pack::{decode_tile_pack, read_base64_section};
use crate::codec::CellPos;
use crate::error::MapLoadError;
use crate::load::LoadContext;
use crate::state::{Basic, Map, MapRect, MapSize};

/// Largest accepted `Size` width.
pub const MAX_MAP_WIDTH: i32 = 300;
/// Largest accepted `Size` height.
pub const MAX_MAP_HEIGHT: i32 = 299;

const DEFAULT_THEATER: &str = "TEMPERATE";

pub(super) struct Geometry {
    pub size: MapSize,
    pub local_size: MapRect,
    pub theater: String,
}

pub(super) fn read_basic(cx: &mut LoadContext) -> Basic {
    let (basic, rejected) = Basic::from_section(cx.ini.section("Basic"));
    for key in rejected {
        cx.warn("Basic", key, "unreadable value, using the default");
    }
    basic
}

fn parse_rect(value: &str) -> Option<MapRect> {
    let parts: Vec<i32> = value.split(',').map(|p| p.trim().parse().ok()).collect::<Option<_>>()?;
    match parts.as_slice() {
        &[x, y, width, height] => Some(MapRect { x, y, width, height }),
        _ => None,
    }
}

pub(super) fn read_map_section(cx: &mut LoadContext) -> Result<Geometry, MapLoadError> {
    let section = cx.ini.section("Map").ok_or(MapLoadError::MissingSection("Map"))?;
    let size_text = section.get("Size").ok_or(MapLoadError::MalformedSize { value: String::new() })?;
    let rect = parse_rect(size_text)
        .filter(|r| r.width > 0 && r.height > 0)
        .ok_or_else(|| MapLoadError::MalformedSize { value: size_text.to_string() })?;
    if rect.width > MAX_MAP_WIDTH || rect.height > MAX_MAP_HEIGHT {
        return Err(MapLoadError::SizeTooLarge {
            width: rect.width,
            height: rect.height,
            max_width: MAX_MAP_WIDTH,
            max_height: MAX_MAP_HEIGHT,
        });
    }
    let size = MapSize {
        width: rect.width,
        height: rect.height,
    };
    let full = MapRect {
        x: 0,
        y: 0,
        width: rect.width,
        height: rect.height,
    };

    let theater = section.get("Theater").unwrap_or(DEFAULT_THEATER).to_string();
    let local_text = section.get("LocalSize").map(str::to_string);
    let local_size = match local_text {
        Some(text) => parse_rect(&text).unwrap_or_else(|| {
            cx.warn("Map", "LocalSize", format!("malformed rectangle {text:?}, using the full map"));
            full
        }),
        None => full,
    };

    Ok(Geometry { size, local_size, theater })
}

pub(super) fn load_tile_pack(cx: &mut LoadContext, map: &mut Map) -> Result<(), MapLoadError> {
    let Some(section) = cx.ini.section("IsoMapPack5") else {
        return Ok(());
    };
    let bytes = match read_base64_section(section) {
        Ok(bytes) => bytes,
        Err(err) => {
            cx.diagnostics
                .severe("IsoMapPack5", None, format!("tile pack is not valid base64 ({err}), using default tiles"));
            return Ok(());
        }
    };
    let pack = decode_tile_pack(&bytes)?;

    if pack.trailing_bytes > 0 {
        cx.diagnostics.warn(
            "IsoMapPack5",
            None,
            format!("{} trailing bytes after the last tile record", pack.trailing_bytes),
        );
    }

    let mut outside = 0usize;
    for record in &pack.records {
        let pos = match (i16::try_from(record.x), i16::try_from(record.y)) {
            (Ok(x), Ok(y)) => CellPos::new(x, y),
            _ => {
                outside += 1;
                continue;
            }
        };
        let Some(tile) = map.tiles.get_mut(pos) else {
            outside += 1;
            continue;
        };
        tile.tile_index = u16::try_from(record.tile_index).ok().filter(|&i| i != u16::MAX).unwrap_or(0);
        tile.sub_tile_index = record.sub_tile;
        tile.level = record.level;
        tile.ice_growth = record.ice_growth;
    }
    if outside > 0 {
        cx.diagnostics.warn(
            "IsoMapPack5",
            None,
            format!("{outside} tile records outside the map were dropped"),
        );
    }
    tracing::debug!(records = pack.records.len(), dropped = outside, "tile pack decoded");
    Ok(())
}
