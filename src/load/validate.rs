use tracing::debug;

use crate::load::LoadContext;
use crate::state::{Map, Terrain};

const SECTION: &str = "IsoMapPack5";

/// Reset tiles the theater does not know, or whose sub-tile is out of range, to
/// tile 0 sub-tile 0. Resetting is severe when tile 0 itself has nothing to draw.
/// An empty catalog means no theater data is available and skips the check.
pub(super) fn validate_tiles(cx: &mut LoadContext, map: &mut Map) {
    let catalog = cx.theater;
    if catalog.tile_count() == 0 {
        debug!("empty theater catalog, tile validation skipped");
        return;
    }
    let mut reset = 0usize;
    for tile in map.tiles.iter_mut() {
        let known = catalog
            .tile(tile.tile_index)
            .is_some_and(|info| usize::from(tile.sub_tile_index) < info.sub_tile_count());
        if known || (tile.tile_index == 0 && tile.sub_tile_index == 0) {
            continue;
        }
        tile.set_terrain(Terrain {
            tile_index: 0,
            sub_tile_index: 0,
            level: tile.level,
        });
        reset += 1;
    }
    if reset == 0 {
        return;
    }

    let message = format!(
        "{reset} tiles are not in theater {:?} (catalog holds {} tiles) and were reset to tile 0",
        map.theater,
        catalog.tile_count()
    );
    if catalog.tile(0).is_some_and(|t| t.has_sub_tiles()) {
        cx.diagnostics.warn(SECTION, None, message);
    } else {
        cx.diagnostics.severe(SECTION, None, message);
    }
}
