pub mod arena;
pub mod basic;
pub mod events;
pub mod house;
pub mod map;
pub mod objects;
pub mod team;
pub mod techno;
pub mod tile;
pub mod trigger;

pub use arena::{Arena, Id};
pub use basic::Basic;
pub use events::MapEvent;
pub use house::{BaseNode, House, HouseOrigin, MAX_BASE_NODES};
pub use map::{Map, MapRect, PlacementError, PlacementResult, TechnoRef};
pub use objects::{
    name_to_waypoint, waypoint_to_name, CellTag, LocalVariable, Smudge, TerrainObject, Tube, Waypoint, MAX_WAYPOINT,
};
pub use team::{AiTriggerType, Script, ScriptAction, TaskForce, TaskForceEntry, TeamType};
pub use techno::{Aircraft, Foundation, Infantry, Orders, Structure, Techno, TechnoObject, Unit};
pub use tile::{MapSize, Overlay, SubCell, Terrain, Tile, TileGrid, MAP_BUFFER_SIZE};
pub use trigger::{Action, Condition, Tag, TagRepeat, Trigger};

pub type HouseId = Id<House>;
pub type StructureId = Id<Structure>;
pub type UnitId = Id<Unit>;
pub type InfantryId = Id<Infantry>;
pub type AircraftId = Id<Aircraft>;
pub type TerrainObjectId = Id<TerrainObject>;
pub type SmudgeId = Id<Smudge>;
pub type WaypointId = Id<Waypoint>;
pub type CellTagId = Id<CellTag>;
pub type TriggerId = Id<Trigger>;
pub type TagId = Id<Tag>;
pub type TaskForceId = Id<TaskForce>;
pub type ScriptId = Id<Script>;
pub type TeamTypeId = Id<TeamType>;
pub type AiTriggerTypeId = Id<AiTriggerType>;
