use crate::codec::pack::{
    base64_section, encode_overlay_pack, encode_tile_pack, overlay_grid_index, IsoTileRecord, NO_OVERLAY,
    OVERLAY_PACK_LEN,
};
use crate::codec::IniSection;
use crate::save::SaveContext;
use crate::state::{Map, MapRect};

pub(super) fn write_basic(cx: &mut SaveContext, map: &Map) {
    cx.emit(map.basic.to_section());
}

fn rect_text(rect: MapRect) -> String {
    format!("{},{},{},{}", rect.x, rect.y, rect.width, rect.height)
}

/// `[Map]` keeps any keys it does not own.
pub(super) fn write_map_section(cx: &mut SaveContext, map: &Map) {
    let mut section = map
        .source()
        .section("Map")
        .cloned()
        .unwrap_or_else(|| IniSection::new("Map"));
    let size = map.size();
    section.set(
        "Size",
        rect_text(MapRect {
            x: 0,
            y: 0,
            width: size.width,
            height: size.height,
        }),
    );
    section.set("Theater", &map.theater);
    section.set("LocalSize", rect_text(map.local_size));
    cx.emit(section);
}

/// Default tiles are left out. Records are ordered by column, then level, then
/// tile index, which is the order the game expects to draw them in.
pub(super) fn write_tile_pack(cx: &mut SaveContext, map: &Map) {
    let mut records: Vec<IsoTileRecord> = map
        .tiles()
        .iter()
        .filter(|tile| !tile.is_default_terrain())
        .map(|tile| IsoTileRecord {
            x: tile.pos.x as u16,
            y: tile.pos.y as u16,
            tile_index: u32::from(tile.tile_index),
            sub_tile: tile.sub_tile_index,
            level: tile.level,
            ice_growth: tile.ice_growth,
        })
        .collect();
    records.sort_by_key(|r| (r.x, r.level, r.tile_index));

    cx.emit(base64_section("IsoMapPack5", &encode_tile_pack(&records)));
}

pub(super) fn write_overlay_packs(cx: &mut SaveContext, map: &Map) {
    let mut types = vec![NO_OVERLAY; OVERLAY_PACK_LEN];
    let mut frames = vec![0u8; OVERLAY_PACK_LEN];
    let mut unplaceable = 0usize;
    for tile in map.tiles().iter() {
        let Some(overlay) = tile.overlay() else {
            continue;
        };
        match overlay_grid_index(tile.pos.x, tile.pos.y) {
            Some(index) => {
                types[index] = overlay.type_index;
                frames[index] = overlay.frame;
            }
            None => unplaceable += 1,
        }
    }
    if unplaceable > 0 {
        cx.diagnostics.warn(
            "OverlayPack",
            None,
            format!("{unplaceable} overlays lie outside the overlay grid and were not saved"),
        );
    }

    cx.emit(base64_section("OverlayPack", &encode_overlay_pack(&types)));
    cx.emit(base64_section("OverlayDataPack", &encode_overlay_pack(&frames)));
}
