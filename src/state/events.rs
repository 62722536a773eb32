use crate::codec::CellPos;
use crate::state::HouseId;

/// Change notifications queued by the registry for observers such as a renderer
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// A house was added, removed or replaced
    HousesChanged,

    /// A house's color changed
    HouseColorChanged {
        house: HouseId,
    },

    /// The visible local rectangle changed
    LocalSizeChanged,

    /// The map was resized and the tile grid rebuilt
    MapResized,

    /// The map was written to disk
    MapWritten,

    /// Terrain of these cells changed and needs redrawing
    CellsInvalidated {
        cells: Vec<CellPos>,
    },
}
