//! Editing operations that place terrain features and can be undone.

pub mod cliff;
pub mod history;
pub mod lat;
pub mod overlay;

pub use cliff::{draw_cliff, CliffCatalog, CliffLimits, CliffOptions, CliffOutcome, CliffPiece, CliffSide, ConnectionPoint, SegmentReport};
pub use history::{EditHistory, EditRecord, OverlayUndo, TerrainUndo, MAX_HISTORY_SIZE};
pub use lat::{apply_auto_lat, apply_auto_lat_around, select_lat, LatPair, LatTile};
pub use overlay::{place_connected_overlay, remove_connected_overlay};
