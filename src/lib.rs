//! Isometric Map Core
//!
//! Loading, saving and terrain placement for isometric RTS map files:
//! the INI-style container and its compressed tile and overlay packs, the
//! cross-referenced entity registry, and the cliff, connected overlay and
//! auto-LAT solvers used by the editor.

pub mod codec;
pub mod config;
pub mod diagnostics;
pub mod edit;
pub mod error;
pub mod issues;
pub mod load;
pub mod save;
pub mod state;
pub mod theater;

pub use error::{Error, MapLoadError, Result};
pub use codec::{
    CellPos, Direction, DirectionMask,
    IniFile, IniSection, IsoTileRecord,
};
pub use config::EditorConfig;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use edit::{
    draw_cliff, CliffCatalog, CliffOptions, CliffOutcome,
    EditHistory, EditRecord, OverlayUndo, TerrainUndo,
    apply_auto_lat, place_connected_overlay, remove_connected_overlay,
};
pub use issues::{check_map, Issue, IssueKind};
pub use load::{load_map, load_map_file, LoadOutcome};
pub use save::{save_map, save_map_file, SaveOutcome};
pub use state::{
    Map, MapEvent, MapSize, House, HouseOrigin,
    Structure, Unit, Infantry, Aircraft, Techno,
    Trigger, Tag, TeamType, TaskForce, Script,
};
pub use theater::{Rules, Theater, TheaterCatalog, TileInfo, TileSetInfo};
