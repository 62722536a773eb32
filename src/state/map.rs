use ahash::AHashSet;
use tracing::debug;

use crate::codec::{CellPos, IniFile};
use crate::state::{
    AiTriggerType, AiTriggerTypeId, Aircraft, AircraftId, Arena, Basic, CellTag, CellTagId, House, HouseId,
    HouseOrigin, Infantry, InfantryId, LocalVariable, MapEvent, MapSize, Overlay, Script, ScriptId, Smudge,
    SmudgeId, Structure, StructureId, SubCell, Tag, TagId, TaskForce, TaskForceId, TeamType, TeamTypeId, Techno,
    TechnoObject, TerrainObject, TerrainObjectId, Tile, TileGrid, Trigger, TriggerId, Tube, Unit, UnitId, Waypoint,
    WaypointId, MAX_WAYPOINT,
};
use crate::theater::Rules;

/// First id handed out by [`Map::next_free_id`].
pub const FIRST_GENERATED_ID: u32 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("cell {0} is outside the map")]
    InvalidCell(CellPos),

    #[error("cell {0} already holds a {1}")]
    Occupied(CellPos, &'static str),

    #[error("sub-cell {1:?} of cell {0} is occupied")]
    SubCellOccupied(CellPos, SubCell),

    #[error("waypoint {0} already exists")]
    DuplicateWaypoint(u16),

    #[error("waypoint {0} is out of range")]
    WaypointOutOfRange(u16),

    #[error("unknown house")]
    UnknownHouse,

    #[error("house still owns {0} objects")]
    HouseInUse(usize),
}

pub type PlacementResult<T> = std::result::Result<T, PlacementError>;

/// Visible rectangle inside the map (`[Map] LocalSize`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Handle to any placed combat object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TechnoRef {
    Structure(StructureId),
    Unit(UnitId),
    Infantry(InfantryId),
    Aircraft(AircraftId),
}

/// Every entity of one map and the cross references between them.
///
/// Entities live in arenas; tiles and other entities refer to them by handle.
/// Placement and removal go through the methods here so that both sides of
/// each reference stay in agreement.
#[derive(Debug, Clone)]
pub struct Map {
    pub basic: Basic,

    /// Theater name from `[Map] Theater`
    pub theater: String,

    pub local_size: MapRect,

    /// Container the map was loaded from; sections nobody owns are written back from it
    pub(crate) source: IniFile,

    pub(crate) tiles: TileGrid,
    pub(crate) houses: Arena<House>,
    pub(crate) structures: Arena<Structure>,
    pub(crate) units: Arena<Unit>,
    pub(crate) infantry: Arena<Infantry>,
    pub(crate) aircraft: Arena<Aircraft>,
    pub(crate) terrain_objects: Arena<TerrainObject>,
    pub(crate) smudges: Arena<Smudge>,
    pub(crate) waypoints: Arena<Waypoint>,
    pub(crate) cell_tags: Arena<CellTag>,
    pub(crate) triggers: Arena<Trigger>,
    pub(crate) tags: Arena<Tag>,
    pub(crate) task_forces: Arena<TaskForce>,
    pub(crate) scripts: Arena<Script>,
    pub(crate) team_types: Arena<TeamType>,
    pub(crate) ai_triggers: Arena<AiTriggerType>,

    pub tubes: Vec<Tube>,
    pub local_variables: Vec<LocalVariable>,

    events: Vec<MapEvent>,
}

impl Map {
    /// Empty map with the ruleset's standard houses and default terrain everywhere.
    pub fn new(size: MapSize, theater: impl Into<String>, rules: &Rules) -> Self {
        let mut houses = Arena::new();
        for country in &rules.countries {
            houses.insert(House::new(country.name.clone(), HouseOrigin::Standard));
        }
        Self {
            basic: Basic::default(),
            theater: theater.into(),
            local_size: MapRect {
                x: 0,
                y: 0,
                width: size.width,
                height: size.height,
            },
            source: IniFile::new(),
            tiles: TileGrid::new(size),
            houses,
            structures: Arena::new(),
            units: Arena::new(),
            infantry: Arena::new(),
            aircraft: Arena::new(),
            terrain_objects: Arena::new(),
            smudges: Arena::new(),
            waypoints: Arena::new(),
            cell_tags: Arena::new(),
            triggers: Arena::new(),
            tags: Arena::new(),
            task_forces: Arena::new(),
            scripts: Arena::new(),
            team_types: Arena::new(),
            ai_triggers: Arena::new(),
            tubes: Vec::new(),
            local_variables: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn size(&self) -> MapSize {
        self.tiles.size()
    }

    pub fn source(&self) -> &IniFile {
        &self.source
    }

    // ========================================================================
    // Tiles
    // ========================================================================

    pub fn tiles(&self) -> &TileGrid {
        &self.tiles
    }

    pub fn is_valid(&self, pos: CellPos) -> bool {
        self.tiles.is_valid(pos)
    }

    pub fn tile(&self, pos: CellPos) -> Option<&Tile> {
        self.tiles.get(pos)
    }

    /// Terrain fields are free to edit; occupant lists are not reachable from here.
    pub fn tile_mut(&mut self, pos: CellPos) -> Option<&mut Tile> {
        self.tiles.get_mut(pos)
    }

    fn valid_tile_mut(&mut self, pos: CellPos) -> PlacementResult<&mut Tile> {
        self.tiles.get_mut(pos).ok_or(PlacementError::InvalidCell(pos))
    }

    /// Set or clear the overlay on a cell, returning the previous value.
    pub fn set_overlay(&mut self, pos: CellPos, overlay: Option<Overlay>) -> PlacementResult<Option<Overlay>> {
        let tile = self.valid_tile_mut(pos)?;
        Ok(std::mem::replace(&mut tile.overlay, overlay))
    }

    /// Rebuild the grid for a new size. Terrain of cells valid in both sizes is kept;
    /// objects on cells that fall outside are removed.
    pub fn resize(&mut self, size: MapSize) {
        let mut probe = TileGrid::new(size);
        let lost = |pos: CellPos| !probe.is_valid(pos);

        let structures: Vec<_> = self.structures.iter().filter(|(_, s)| lost(s.techno.position)).map(|(id, _)| id).collect();
        let units: Vec<_> = self.units.iter().filter(|(_, u)| lost(u.techno.position)).map(|(id, _)| id).collect();
        let infantry: Vec<_> = self.infantry.iter().filter(|(_, i)| lost(i.techno.position)).map(|(id, _)| id).collect();
        let aircraft: Vec<_> = self.aircraft.iter().filter(|(_, a)| lost(a.techno.position)).map(|(id, _)| id).collect();
        let terrain: Vec<_> = self.terrain_objects.iter().filter(|(_, t)| lost(t.position)).map(|(id, _)| id).collect();
        let smudges: Vec<_> = self.smudges.iter().filter(|(_, s)| lost(s.position)).map(|(id, _)| id).collect();
        let waypoints: Vec<_> = self.waypoints.iter().filter(|(_, w)| lost(w.position)).map(|(id, _)| id).collect();
        let cell_tags: Vec<_> = self.cell_tags.iter().filter(|(_, c)| lost(c.position)).map(|(id, _)| id).collect();

        for id in structures {
            self.remove_structure(id);
        }
        for id in units {
            self.remove_unit(id);
        }
        for id in infantry {
            self.remove_infantry(id);
        }
        for id in aircraft {
            self.remove_aircraft(id);
        }
        for id in terrain {
            self.remove_terrain_object(id);
        }
        for id in smudges {
            self.remove_smudge(id);
        }
        for id in waypoints {
            self.remove_waypoint(id);
        }
        for id in cell_tags {
            self.remove_cell_tag(id);
        }

        for tile in self.tiles.iter() {
            if let Some(slot) = probe.get_mut(tile.pos) {
                *slot = tile.clone();
            }
        }
        self.tiles = probe;
        debug!(width = size.width, height = size.height, "map resized");
        self.events.push(MapEvent::MapResized);
    }

    pub fn set_local_size(&mut self, rect: MapRect) {
        if self.local_size != rect {
            self.local_size = rect;
            self.events.push(MapEvent::LocalSizeChanged);
        }
    }

    /// Queue a redraw of terrain that changed outside the registry's own mutators.
    pub fn invalidate_cells(&mut self, cells: Vec<CellPos>) {
        if !cells.is_empty() {
            self.events.push(MapEvent::CellsInvalidated { cells });
        }
    }

    pub fn events(&self) -> &[MapEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: MapEvent) {
        self.events.push(event);
    }

    // ========================================================================
    // Houses
    // ========================================================================

    pub fn houses(&self) -> &Arena<House> {
        &self.houses
    }

    pub fn house(&self, id: HouseId) -> Option<&House> {
        self.houses.get(id)
    }

    pub fn house_mut(&mut self, id: HouseId) -> Option<&mut House> {
        self.houses.get_mut(id)
    }

    pub fn find_house(&self, name: &str) -> Option<HouseId> {
        self.houses.find(|h| h.name == name)
    }

    /// Add a map-defined house. A house with the same name takes its place,
    /// keeping its handle so existing owners stay attached.
    pub fn define_house(&mut self, house: House) -> HouseId {
        let id = match self.find_house(&house.name) {
            Some(id) => {
                self.houses.replace(id, house);
                id
            }
            None => self.houses.insert(house),
        };
        self.events.push(MapEvent::HousesChanged);
        id
    }

    /// House named `name`, creating an unsaved placeholder if none exists.
    pub fn placeholder_house(&mut self, name: &str) -> HouseId {
        if let Some(id) = self.find_house(name) {
            return id;
        }
        self.houses.insert(House::new(name, HouseOrigin::Placeholder))
    }

    pub fn remove_house(&mut self, id: HouseId) -> PlacementResult<House> {
        if !self.houses.contains(id) {
            return Err(PlacementError::UnknownHouse);
        }
        let owned = self.structures.values().filter(|s| s.techno.owner == id).count()
            + self.units.values().filter(|u| u.techno.owner == id).count()
            + self.infantry.values().filter(|i| i.techno.owner == id).count()
            + self.aircraft.values().filter(|a| a.techno.owner == id).count();
        if owned > 0 {
            return Err(PlacementError::HouseInUse(owned));
        }
        for team in self.team_types.values_mut() {
            if team.house == Some(id) {
                team.house = None;
            }
        }
        let house = self.houses.remove(id).ok_or(PlacementError::UnknownHouse)?;
        self.events.push(MapEvent::HousesChanged);
        Ok(house)
    }

    pub fn set_house_color(&mut self, id: HouseId, color: Option<i32>) -> PlacementResult<()> {
        let house = self.houses.get_mut(id).ok_or(PlacementError::UnknownHouse)?;
        if house.color != color {
            house.color = color;
            self.events.push(MapEvent::HouseColorChanged { house: id });
        }
        Ok(())
    }

    /// Explicit color, or the color of the house's country.
    pub fn house_color(&self, id: HouseId, rules: &Rules) -> Option<i32> {
        let house = self.houses.get(id)?;
        house.color.or_else(|| rules.country(&house.country).map(|c| c.color))
    }

    // ========================================================================
    // Technos
    // ========================================================================

    pub fn structures(&self) -> &Arena<Structure> {
        &self.structures
    }

    pub fn units(&self) -> &Arena<Unit> {
        &self.units
    }

    pub fn infantry(&self) -> &Arena<Infantry> {
        &self.infantry
    }

    pub fn aircraft(&self) -> &Arena<Aircraft> {
        &self.aircraft
    }

    fn check_owner(&self, techno: &Techno) -> PlacementResult<()> {
        if self.houses.contains(techno.owner) {
            Ok(())
        } else {
            Err(PlacementError::UnknownHouse)
        }
    }

    pub fn place_structure(&mut self, structure: Structure) -> PlacementResult<StructureId> {
        let origin = structure.techno.position;
        if !self.is_valid(origin) {
            return Err(PlacementError::InvalidCell(origin));
        }
        self.check_owner(&structure.techno)?;
        let cells: Vec<_> = structure.foundation.cells(origin).collect();
        let id = self.structures.insert(structure);
        for cell in cells {
            if let Some(tile) = self.tiles.get_mut(cell) {
                tile.structures.push(id);
            }
        }
        Ok(id)
    }

    pub fn remove_structure(&mut self, id: StructureId) -> Option<Structure> {
        let structure = self.structures.remove(id)?;
        for cell in structure.foundation.cells(structure.techno.position) {
            if let Some(tile) = self.tiles.get_mut(cell) {
                tile.structures.retain(|&s| s != id);
            }
        }
        Some(structure)
    }

    pub fn place_unit(&mut self, unit: Unit) -> PlacementResult<UnitId> {
        let pos = unit.techno.position;
        self.check_owner(&unit.techno)?;
        self.valid_tile_mut(pos)?;
        let id = self.units.insert(unit);
        if let Some(tile) = self.tiles.get_mut(pos) {
            tile.units.push(id);
        }
        Ok(id)
    }

    /// Remove a unit; units that followed it stop following.
    pub fn remove_unit(&mut self, id: UnitId) -> Option<Unit> {
        let unit = self.units.remove(id)?;
        if let Some(tile) = self.tiles.get_mut(unit.techno.position) {
            tile.units.retain(|&u| u != id);
        }
        for other in self.units.values_mut() {
            if other.follower == Some(id) {
                other.follower = None;
            }
        }
        Some(unit)
    }

    pub fn set_follower(&mut self, id: UnitId, follower: Option<UnitId>) -> bool {
        if follower.is_some_and(|f| !self.units.contains(f)) {
            return false;
        }
        match self.units.get_mut(id) {
            Some(unit) => {
                unit.follower = follower;
                true
            }
            None => false,
        }
    }

    pub fn place_infantry(&mut self, infantry: Infantry) -> PlacementResult<InfantryId> {
        let pos = infantry.techno.position;
        let sub_cell = infantry.sub_cell;
        self.check_owner(&infantry.techno)?;
        if self.valid_tile_mut(pos)?.infantry(sub_cell).is_some() {
            return Err(PlacementError::SubCellOccupied(pos, sub_cell));
        }
        let id = self.infantry.insert(infantry);
        if let Some(tile) = self.tiles.get_mut(pos) {
            tile.infantry[sub_cell.index()] = Some(id);
        }
        Ok(id)
    }

    pub fn remove_infantry(&mut self, id: InfantryId) -> Option<Infantry> {
        let infantry = self.infantry.remove(id)?;
        if let Some(tile) = self.tiles.get_mut(infantry.techno.position) {
            tile.infantry[infantry.sub_cell.index()] = None;
        }
        Some(infantry)
    }

    pub fn place_aircraft(&mut self, aircraft: Aircraft) -> PlacementResult<AircraftId> {
        let pos = aircraft.techno.position;
        self.check_owner(&aircraft.techno)?;
        if self.valid_tile_mut(pos)?.aircraft.is_some() {
            return Err(PlacementError::Occupied(pos, "aircraft"));
        }
        let id = self.aircraft.insert(aircraft);
        if let Some(tile) = self.tiles.get_mut(pos) {
            tile.aircraft = Some(id);
        }
        Ok(id)
    }

    pub fn remove_aircraft(&mut self, id: AircraftId) -> Option<Aircraft> {
        let aircraft = self.aircraft.remove(id)?;
        if let Some(tile) = self.tiles.get_mut(aircraft.techno.position) {
            tile.aircraft = None;
        }
        Some(aircraft)
    }

    fn techno_object_mut(&mut self, target: TechnoRef) -> Option<&mut dyn TechnoObject> {
        match target {
            TechnoRef::Structure(id) => self.structures.get_mut(id).map(|s| s as &mut dyn TechnoObject),
            TechnoRef::Unit(id) => self.units.get_mut(id).map(|u| u as &mut dyn TechnoObject),
            TechnoRef::Infantry(id) => self.infantry.get_mut(id).map(|i| i as &mut dyn TechnoObject),
            TechnoRef::Aircraft(id) => self.aircraft.get_mut(id).map(|a| a as &mut dyn TechnoObject),
        }
    }

    pub fn techno(&self, target: TechnoRef) -> Option<&Techno> {
        match target {
            TechnoRef::Structure(id) => self.structures.get(id).map(TechnoObject::techno),
            TechnoRef::Unit(id) => self.units.get(id).map(TechnoObject::techno),
            TechnoRef::Infantry(id) => self.infantry.get(id).map(TechnoObject::techno),
            TechnoRef::Aircraft(id) => self.aircraft.get(id).map(TechnoObject::techno),
        }
    }

    pub fn set_techno_tag(&mut self, target: TechnoRef, tag: Option<TagId>) -> bool {
        if tag.is_some_and(|t| !self.tags.contains(t)) {
            return false;
        }
        match self.techno_object_mut(target) {
            Some(object) => {
                object.techno_mut().tag = tag;
                true
            }
            None => false,
        }
    }

    pub fn set_techno_owner(&mut self, target: TechnoRef, owner: HouseId) -> PlacementResult<()> {
        if !self.houses.contains(owner) {
            return Err(PlacementError::UnknownHouse);
        }
        if let Some(object) = self.techno_object_mut(target) {
            object.techno_mut().owner = owner;
        }
        Ok(())
    }

    // ========================================================================
    // Cell objects
    // ========================================================================

    pub fn terrain_objects(&self) -> &Arena<TerrainObject> {
        &self.terrain_objects
    }

    pub fn place_terrain_object(&mut self, object: TerrainObject) -> PlacementResult<TerrainObjectId> {
        let pos = object.position;
        if self.valid_tile_mut(pos)?.terrain_object.is_some() {
            return Err(PlacementError::Occupied(pos, "terrain object"));
        }
        let id = self.terrain_objects.insert(object);
        if let Some(tile) = self.tiles.get_mut(pos) {
            tile.terrain_object = Some(id);
        }
        Ok(id)
    }

    pub fn remove_terrain_object(&mut self, id: TerrainObjectId) -> Option<TerrainObject> {
        let object = self.terrain_objects.remove(id)?;
        if let Some(tile) = self.tiles.get_mut(object.position) {
            tile.terrain_object = None;
        }
        Some(object)
    }

    pub fn smudges(&self) -> &Arena<Smudge> {
        &self.smudges
    }

    pub fn place_smudge(&mut self, smudge: Smudge) -> PlacementResult<SmudgeId> {
        let pos = smudge.position;
        if self.valid_tile_mut(pos)?.smudge.is_some() {
            return Err(PlacementError::Occupied(pos, "smudge"));
        }
        let id = self.smudges.insert(smudge);
        if let Some(tile) = self.tiles.get_mut(pos) {
            tile.smudge = Some(id);
        }
        Ok(id)
    }

    pub fn remove_smudge(&mut self, id: SmudgeId) -> Option<Smudge> {
        let smudge = self.smudges.remove(id)?;
        if let Some(tile) = self.tiles.get_mut(smudge.position) {
            tile.smudge = None;
        }
        Some(smudge)
    }

    pub fn waypoints(&self) -> &Arena<Waypoint> {
        &self.waypoints
    }

    pub fn find_waypoint(&self, number: u16) -> Option<WaypointId> {
        self.waypoints.find(|w| w.number == number)
    }

    /// Waypoint numbers are unique per map and a cell holds at most one.
    pub fn add_waypoint(&mut self, waypoint: Waypoint) -> PlacementResult<WaypointId> {
        let pos = waypoint.position;
        if waypoint.number > MAX_WAYPOINT {
            return Err(PlacementError::WaypointOutOfRange(waypoint.number));
        }
        if self.find_waypoint(waypoint.number).is_some() {
            return Err(PlacementError::DuplicateWaypoint(waypoint.number));
        }
        if self.valid_tile_mut(pos)?.waypoint.is_some() {
            return Err(PlacementError::Occupied(pos, "waypoint"));
        }
        let id = self.waypoints.insert(waypoint);
        if let Some(tile) = self.tiles.get_mut(pos) {
            tile.waypoint = Some(id);
        }
        Ok(id)
    }

    pub fn remove_waypoint(&mut self, id: WaypointId) -> Option<Waypoint> {
        let waypoint = self.waypoints.remove(id)?;
        if let Some(tile) = self.tiles.get_mut(waypoint.position) {
            tile.waypoint = None;
        }
        Some(waypoint)
    }

    pub fn cell_tags(&self) -> &Arena<CellTag> {
        &self.cell_tags
    }

    pub fn add_cell_tag(&mut self, cell_tag: CellTag) -> PlacementResult<CellTagId> {
        let pos = cell_tag.position;
        if self.valid_tile_mut(pos)?.cell_tag.is_some() {
            return Err(PlacementError::Occupied(pos, "cell tag"));
        }
        let id = self.cell_tags.insert(cell_tag);
        if let Some(tile) = self.tiles.get_mut(pos) {
            tile.cell_tag = Some(id);
        }
        Ok(id)
    }

    pub fn remove_cell_tag(&mut self, id: CellTagId) -> Option<CellTag> {
        let cell_tag = self.cell_tags.remove(id)?;
        if let Some(tile) = self.tiles.get_mut(cell_tag.position) {
            tile.cell_tag = None;
        }
        Some(cell_tag)
    }

    // ========================================================================
    // Triggers and tags
    // ========================================================================

    pub fn triggers(&self) -> &Arena<Trigger> {
        &self.triggers
    }

    pub fn trigger_mut(&mut self, id: TriggerId) -> Option<&mut Trigger> {
        self.triggers.get_mut(id)
    }

    pub fn find_trigger(&self, id: &str) -> Option<TriggerId> {
        self.triggers.find(|t| t.id == id)
    }

    pub fn add_trigger(&mut self, trigger: Trigger) -> TriggerId {
        self.triggers.insert(trigger)
    }

    /// Remove a trigger; tags firing it and triggers linked to it lose the reference.
    pub fn remove_trigger(&mut self, id: TriggerId) -> Option<Trigger> {
        let trigger = self.triggers.remove(id)?;
        for tag in self.tags.values_mut() {
            if tag.trigger == Some(id) {
                tag.trigger = None;
            }
        }
        for other in self.triggers.values_mut() {
            if other.linked == Some(id) {
                other.linked = None;
            }
        }
        Some(trigger)
    }

    pub fn tags(&self) -> &Arena<Tag> {
        &self.tags
    }

    pub fn tag_mut(&mut self, id: TagId) -> Option<&mut Tag> {
        self.tags.get_mut(id)
    }

    pub fn find_tag(&self, id: &str) -> Option<TagId> {
        self.tags.find(|t| t.id == id)
    }

    /// First tag that fires `trigger`.
    pub fn tag_of_trigger(&self, trigger: TriggerId) -> Option<TagId> {
        self.tags.find(|t| t.trigger == Some(trigger))
    }

    pub fn add_tag(&mut self, tag: Tag) -> TagId {
        self.tags.insert(tag)
    }

    /// Remove a tag; objects and team types carrying it lose it and cell tags using it are removed.
    pub fn remove_tag(&mut self, id: TagId) -> Option<Tag> {
        let tag = self.tags.remove(id)?;
        let clear = |techno: &mut Techno| {
            if techno.tag == Some(id) {
                techno.tag = None;
            }
        };
        self.structures.values_mut().for_each(|s| clear(&mut s.techno));
        self.units.values_mut().for_each(|u| clear(&mut u.techno));
        self.infantry.values_mut().for_each(|i| clear(&mut i.techno));
        self.aircraft.values_mut().for_each(|a| clear(&mut a.techno));
        for team in self.team_types.values_mut() {
            if team.tag == Some(id) {
                team.tag = None;
            }
        }
        let stale: Vec<_> = self.cell_tags.iter().filter(|(_, c)| c.tag == id).map(|(cid, _)| cid).collect();
        for cid in stale {
            self.remove_cell_tag(cid);
        }
        Some(tag)
    }

    // ========================================================================
    // Teams
    // ========================================================================

    pub fn task_forces(&self) -> &Arena<TaskForce> {
        &self.task_forces
    }

    pub fn task_force_mut(&mut self, id: TaskForceId) -> Option<&mut TaskForce> {
        self.task_forces.get_mut(id)
    }

    pub fn find_task_force(&self, id: &str) -> Option<TaskForceId> {
        self.task_forces.find(|t| t.id == id)
    }

    pub fn add_task_force(&mut self, task_force: TaskForce) -> TaskForceId {
        self.task_forces.insert(task_force)
    }

    pub fn remove_task_force(&mut self, id: TaskForceId) -> Option<TaskForce> {
        let removed = self.task_forces.remove(id)?;
        for team in self.team_types.values_mut() {
            if team.task_force == Some(id) {
                team.task_force = None;
            }
        }
        Some(removed)
    }

    pub fn scripts(&self) -> &Arena<Script> {
        &self.scripts
    }

    pub fn script_mut(&mut self, id: ScriptId) -> Option<&mut Script> {
        self.scripts.get_mut(id)
    }

    pub fn find_script(&self, id: &str) -> Option<ScriptId> {
        self.scripts.find(|s| s.id == id)
    }

    pub fn add_script(&mut self, script: Script) -> ScriptId {
        self.scripts.insert(script)
    }

    pub fn remove_script(&mut self, id: ScriptId) -> Option<Script> {
        let removed = self.scripts.remove(id)?;
        for team in self.team_types.values_mut() {
            if team.script == Some(id) {
                team.script = None;
            }
        }
        Some(removed)
    }

    pub fn team_types(&self) -> &Arena<TeamType> {
        &self.team_types
    }

    pub fn team_type_mut(&mut self, id: TeamTypeId) -> Option<&mut TeamType> {
        self.team_types.get_mut(id)
    }

    pub fn find_team_type(&self, id: &str) -> Option<TeamTypeId> {
        self.team_types.find(|t| t.id == id)
    }

    pub fn add_team_type(&mut self, team: TeamType) -> TeamTypeId {
        self.team_types.insert(team)
    }

    pub fn remove_team_type(&mut self, id: TeamTypeId) -> Option<TeamType> {
        let removed = self.team_types.remove(id)?;
        for trigger in self.ai_triggers.values_mut() {
            if trigger.team_type == Some(id) {
                trigger.team_type = None;
            }
            if trigger.second_team_type == Some(id) {
                trigger.second_team_type = None;
            }
        }
        Some(removed)
    }

    pub fn ai_triggers(&self) -> &Arena<AiTriggerType> {
        &self.ai_triggers
    }

    pub fn add_ai_trigger(&mut self, trigger: AiTriggerType) -> AiTriggerTypeId {
        self.ai_triggers.insert(trigger)
    }

    pub fn remove_ai_trigger(&mut self, id: AiTriggerTypeId) -> Option<AiTriggerType> {
        self.ai_triggers.remove(id)
    }

    /// Lowest unused eight-digit id shared by triggers, tags, task forces,
    /// scripts, team types and AI trigger types.
    pub fn next_free_id(&self) -> String {
        let used: AHashSet<u32> = self
            .triggers
            .values()
            .map(|t| t.id.as_str())
            .chain(self.tags.values().map(|t| t.id.as_str()))
            .chain(self.task_forces.values().map(|t| t.id.as_str()))
            .chain(self.scripts.values().map(|s| s.id.as_str()))
            .chain(self.team_types.values().map(|t| t.id.as_str()))
            .chain(self.ai_triggers.values().map(|t| t.id.as_str()))
            .filter_map(|id| id.parse().ok())
            .collect();
        let mut candidate = FIRST_GENERATED_ID;
        while used.contains(&candidate) {
            candidate += 1;
        }
        format!("{candidate:08}")
    }

    /// Every handle stored on a tile points at an entity positioned on that tile,
    /// and every positioned entity is listed on its tile(s).
    pub fn occupancy_consistent(&self) -> bool {
        let tiles_ok = self.tiles.iter().all(|tile| {
            let pos = tile.pos;
            tile.structures.iter().all(|&id| {
                self.structures
                    .get(id)
                    .is_some_and(|s| s.foundation.cells(s.techno.position).any(|c| c == pos))
            }) && tile.units.iter().all(|&id| self.units.get(id).is_some_and(|u| u.techno.position == pos))
                && tile.aircraft.map_or(true, |id| self.aircraft.get(id).is_some_and(|a| a.techno.position == pos))
                && SubCell::ALL.into_iter().all(|s| {
                    tile.infantry(s).map_or(true, |id| {
                        self.infantry.get(id).is_some_and(|i| i.techno.position == pos && i.sub_cell == s)
                    })
                })
                && tile.terrain_object.map_or(true, |id| self.terrain_objects.get(id).is_some_and(|t| t.position == pos))
                && tile.smudge.map_or(true, |id| self.smudges.get(id).is_some_and(|s| s.position == pos))
                && tile.waypoint.map_or(true, |id| self.waypoints.get(id).is_some_and(|w| w.position == pos))
                && tile.cell_tag.map_or(true, |id| self.cell_tags.get(id).is_some_and(|c| c.position == pos))
        });
        let listed = |pos: CellPos, check: &dyn Fn(&Tile) -> bool| self.tiles.get(pos).is_some_and(check);
        tiles_ok
            && self.units.iter().all(|(id, u)| listed(u.techno.position, &|t| t.units.contains(&id)))
            && self.aircraft.iter().all(|(id, a)| listed(a.techno.position, &|t| t.aircraft == Some(id)))
            && self.infantry.iter().all(|(id, i)| listed(i.techno.position, &|t| t.infantry(i.sub_cell) == Some(id)))
            && self.structures.iter().all(|(id, s)| listed(s.techno.position, &|t| t.structures.contains(&id)))
            && self.waypoints.iter().all(|(id, w)| listed(w.position, &|t| t.waypoint == Some(id)))
            && self.cell_tags.iter().all(|(id, c)| listed(c.position, &|t| t.cell_tag == Some(id)))
            && self.smudges.iter().all(|(id, s)| listed(s.position, &|t| t.smudge == Some(id)))
            && self.terrain_objects.iter().all(|(id, o)| listed(o.position, &|t| t.terrain_object == Some(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Foundation, Orders, TagRepeat};

    fn test_map() -> (Map, HouseId) {
        let rules = Rules::default();
        let mut map = Map::new(MapSize { width: 20, height: 20 }, "TEMPERATE", &rules);
        let house = map.define_house(House::new("Allies", HouseOrigin::Map));
        map.take_events();
        (map, house)
    }

    fn infantry(owner: HouseId, pos: CellPos, sub_cell: SubCell) -> Infantry {
        Infantry {
            techno: Techno::new(owner, "E1", pos),
            orders: Orders::default(),
            sub_cell,
        }
    }

    #[test]
    fn test_waypoint_single_occupant() {
        let (mut map, _) = test_map();
        let pos = CellPos::new(20, 20);
        map.add_waypoint(Waypoint { number: 0, position: pos }).unwrap();
        assert_eq!(
            map.add_waypoint(Waypoint { number: 1, position: pos }),
            Err(PlacementError::Occupied(pos, "waypoint"))
        );
        assert_eq!(
            map.add_waypoint(Waypoint { number: 0, position: CellPos::new(21, 20) }),
            Err(PlacementError::DuplicateWaypoint(0))
        );
        assert_eq!(map.waypoints().len(), 1);
        assert!(map.occupancy_consistent());
    }

    #[test]
    fn test_aircraft_and_infantry_slots() {
        let (mut map, house) = test_map();
        let pos = CellPos::new(20, 20);
        let aircraft = Aircraft {
            techno: Techno::new(house, "ORCA", pos),
            orders: Orders::default(),
        };
        map.place_aircraft(aircraft.clone()).unwrap();
        assert!(matches!(map.place_aircraft(aircraft), Err(PlacementError::Occupied(_, "aircraft"))));

        map.place_infantry(infantry(house, pos, SubCell::Top)).unwrap();
        assert_eq!(
            map.place_infantry(infantry(house, pos, SubCell::Top)),
            Err(PlacementError::SubCellOccupied(pos, SubCell::Top))
        );
        map.place_infantry(infantry(house, pos, SubCell::Left)).unwrap();
        assert_eq!(map.infantry().len(), 2);
        assert_eq!(map.aircraft().len(), 1);
        assert!(map.occupancy_consistent());
    }

    #[test]
    fn test_invalid_cell_rejected() {
        let (mut map, house) = test_map();
        let pos = CellPos::new(1, 1);
        assert_eq!(
            map.place_infantry(infantry(house, pos, SubCell::Center)),
            Err(PlacementError::InvalidCell(pos))
        );
        assert!(map.infantry().is_empty());
    }

    #[test]
    fn test_structure_footprint_and_removal() {
        let (mut map, house) = test_map();
        let origin = CellPos::new(20, 20);
        let id = map
            .place_structure(Structure::new(Techno::new(house, "GAPOWR", origin), Foundation { width: 2, height: 2 }))
            .unwrap();
        assert_eq!(map.tile(CellPos::new(21, 21)).unwrap().structures(), &[id]);
        assert!(map.occupancy_consistent());
        map.remove_structure(id).unwrap();
        assert!(map.tile(CellPos::new(21, 21)).unwrap().structures().is_empty());
    }

    #[test]
    fn test_remove_tag_clears_references() {
        let (mut map, house) = test_map();
        let trigger = map.add_trigger(Trigger::new("01000000", "t", "Allies"));
        let tag = map.add_tag(Tag {
            id: "01000001".into(),
            name: "tag".into(),
            repeat: TagRepeat::OnceAny,
            trigger: Some(trigger),
        });
        let pos = CellPos::new(20, 20);
        let inf = map.place_infantry(infantry(house, pos, SubCell::Center)).unwrap();
        assert!(map.set_techno_tag(TechnoRef::Infantry(inf), Some(tag)));
        map.add_cell_tag(CellTag { position: pos, tag }).unwrap();
        assert_eq!(map.tag_of_trigger(trigger), Some(tag));

        map.remove_tag(tag).unwrap();
        assert_eq!(map.techno(TechnoRef::Infantry(inf)).unwrap().tag, None);
        assert!(map.cell_tags().is_empty());
        assert_eq!(map.tile(pos).unwrap().cell_tag(), None);
        assert_eq!(map.tag_of_trigger(trigger), None);
    }

    #[test]
    fn test_remove_trigger_clears_links() {
        let (mut map, _) = test_map();
        let a = map.add_trigger(Trigger::new("01000000", "a", "Allies"));
        let b = map.add_trigger(Trigger::new("01000001", "b", "Allies"));
        map.trigger_mut(b).unwrap().linked = Some(a);
        map.remove_trigger(a);
        assert_eq!(map.triggers().get(b).unwrap().linked, None);
    }

    #[test]
    fn test_follower_cleared_on_removal() {
        let (mut map, house) = test_map();
        let unit = |x| Unit {
            techno: Techno::new(house, "MTNK", CellPos::new(x, 20)),
            orders: Orders::default(),
            follower: None,
        };
        let lead = map.place_unit(unit(20)).unwrap();
        let tail = map.place_unit(unit(21)).unwrap();
        assert!(map.set_follower(tail, Some(lead)));
        map.remove_unit(lead);
        assert_eq!(map.units().get(tail).unwrap().follower, None);
    }

    #[test]
    fn test_define_house_replaces_in_place() {
        let mut rules = Rules::default();
        rules.countries.push(crate::theater::rules::Country {
            name: "Americans".into(),
            color: 7,
            side: "GDI".into(),
        });
        let mut map = Map::new(MapSize { width: 10, height: 10 }, "TEMPERATE", &rules);
        let standard = map.find_house("Americans").unwrap();
        assert_eq!(map.house_color(standard, &rules), Some(7));

        let mut custom = House::new("Americans", HouseOrigin::Map);
        custom.credits = 5000;
        let id = map.define_house(custom);
        assert_eq!(id, standard);
        assert_eq!(map.houses().len(), 1);
        assert_eq!(map.house(id).unwrap().credits, 5000);

        map.set_house_color(id, Some(2)).unwrap();
        assert_eq!(map.house_color(id, &rules), Some(2));
        assert_eq!(
            map.take_events(),
            vec![MapEvent::HousesChanged, MapEvent::HouseColorChanged { house: id }]
        );
    }

    #[test]
    fn test_remove_house_in_use() {
        let (mut map, house) = test_map();
        map.place_infantry(infantry(house, CellPos::new(20, 20), SubCell::Center)).unwrap();
        assert_eq!(map.remove_house(house).unwrap_err(), PlacementError::HouseInUse(1));
    }

    #[test]
    fn test_next_free_id_skips_used() {
        let (mut map, _) = test_map();
        assert_eq!(map.next_free_id(), "01000000");
        map.add_trigger(Trigger::new("01000000", "a", "Allies"));
        map.add_task_force(TaskForce {
            id: "01000001".into(),
            name: "tf".into(),
            group: -1,
            entries: Vec::new(),
        });
        assert_eq!(map.next_free_id(), "01000002");
    }

    #[test]
    fn test_resize_drops_outside_objects() {
        let (mut map, house) = test_map();
        let inside = CellPos::new(12, 12);
        let outside = CellPos::new(30, 30);
        map.tile_mut(inside).unwrap().tile_index = 9;
        map.place_infantry(infantry(house, inside, SubCell::Center)).unwrap();
        map.place_infantry(infantry(house, outside, SubCell::Center)).unwrap();

        map.resize(MapSize { width: 10, height: 10 });
        assert!(map.is_valid(inside));
        assert!(!map.is_valid(outside));
        assert_eq!(map.tile(inside).unwrap().tile_index, 9);
        assert_eq!(map.infantry().len(), 1);
        assert!(map.occupancy_consistent());
        assert_eq!(map.take_events(), vec![MapEvent::MapResized]);
    }
}
