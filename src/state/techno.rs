use crate::codec::CellPos;
use crate::state::{HouseId, SubCell, TagId, UnitId};

/// Default health on the 0..=256 scale.
pub const FULL_HEALTH: i32 = 256;

/// Fields shared by every placed combat object
#[derive(Debug, Clone, PartialEq)]
pub struct Techno {
    pub owner: HouseId,
    pub type_name: String,
    pub health: i32,
    pub position: CellPos,
    pub facing: u8,
    pub tag: Option<TagId>,
}

impl Techno {
    pub fn new(owner: HouseId, type_name: impl Into<String>, position: CellPos) -> Self {
        Self {
            owner,
            type_name: type_name.into(),
            health: FULL_HEALTH,
            position,
            facing: 64,
            tag: None,
        }
    }
}

/// Access to the shared [`Techno`] part of structures, units, infantry and aircraft.
pub trait TechnoObject {
    fn techno(&self) -> &Techno;
    fn techno_mut(&mut self) -> &mut Techno;
}

macro_rules! impl_techno_object {
    ($($ty:ty),*) => {
        $(impl TechnoObject for $ty {
            fn techno(&self) -> &Techno {
                &self.techno
            }

            fn techno_mut(&mut self) -> &mut Techno {
                &mut self.techno
            }
        })*
    };
}

impl_techno_object!(Structure, Unit, Infantry, Aircraft);

/// Footprint of a structure in cells, anchored at its top-left position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Foundation {
    pub width: u8,
    pub height: u8,
}

impl Default for Foundation {
    fn default() -> Self {
        Self { width: 1, height: 1 }
    }
}

impl Foundation {
    pub fn cells(self, origin: CellPos) -> impl Iterator<Item = CellPos> {
        (0..self.height as i16).flat_map(move |dy| (0..self.width as i16).map(move |dx| origin.offset(dx, dy)))
    }
}

/// Most upgrades a structure carries.
pub const MAX_UPGRADES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub techno: Techno,
    pub foundation: Foundation,
    pub ai_sellable: bool,
    pub ai_rebuildable: bool,
    pub powered: bool,
    pub spotlight: i32,
    pub upgrades: Vec<String>,
    pub ai_repairable: bool,
    pub nominal: bool,
}

impl Structure {
    pub fn new(techno: Techno, foundation: Foundation) -> Self {
        Self {
            techno,
            foundation,
            ai_sellable: true,
            ai_rebuildable: false,
            powered: true,
            spotlight: 0,
            upgrades: Vec::new(),
            ai_repairable: false,
            nominal: false,
        }
    }
}

/// Orders and flags common to mobile objects
#[derive(Debug, Clone, PartialEq)]
pub struct Orders {
    pub mission: String,
    pub veterancy: i32,
    pub group: i32,
    pub high: bool,
    pub autocreate_no_recruitable: bool,
    pub autocreate_yes_recruitable: bool,
}

impl Default for Orders {
    fn default() -> Self {
        Self {
            mission: "Guard".to_string(),
            veterancy: 0,
            group: -1,
            high: false,
            autocreate_no_recruitable: false,
            autocreate_yes_recruitable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub techno: Techno,
    pub orders: Orders,
    /// Unit this one trails behind
    pub follower: Option<UnitId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Infantry {
    pub techno: Techno,
    pub orders: Orders,
    pub sub_cell: SubCell,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aircraft {
    pub techno: Techno,
    pub orders: Orders,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foundation_cells() {
        let cells: Vec<_> = Foundation { width: 2, height: 3 }.cells(CellPos::new(10, 20)).collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], CellPos::new(10, 20));
        assert_eq!(cells[1], CellPos::new(11, 20));
        assert_eq!(cells[5], CellPos::new(11, 22));
    }
}
