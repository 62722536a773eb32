use crate::codec::CellPos;
use crate::state::TagId;

/// Highest waypoint number ("ZZ").
pub const MAX_WAYPOINT: u16 = 701;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainObject {
    pub type_name: String,
    pub position: CellPos,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Smudge {
    pub type_name: String,
    pub position: CellPos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Waypoint {
    pub number: u16,
    pub position: CellPos,
}

impl Waypoint {
    pub fn name(&self) -> String {
        waypoint_to_name(self.number)
    }
}

/// Letter name of a waypoint number: 0 is "A", 25 is "Z", 26 is "AA".
pub fn waypoint_to_name(number: u16) -> String {
    let mut n = number as u32 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Inverse of [`waypoint_to_name`]; `None` for anything but 1-2 ASCII letters.
pub fn name_to_waypoint(name: &str) -> Option<u16> {
    let name = name.trim();
    if name.is_empty() || name.len() > 2 {
        return None;
    }
    let mut n: u32 = 0;
    for c in name.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        n = n * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    u16::try_from(n - 1).ok()
}

/// Tag bound to a cell rather than an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellTag {
    pub position: CellPos,
    pub tag: TagId,
}

/// Tunnel between two cells. `directions` are the facings walked from entry to exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tube {
    pub entry: CellPos,
    pub entry_facing: i8,
    pub exit: CellPos,
    pub directions: Vec<i8>,
}

/// Scenario-local boolean
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable {
    pub name: String,
    pub initial: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waypoint_names() {
        assert_eq!(waypoint_to_name(0), "A");
        assert_eq!(waypoint_to_name(25), "Z");
        assert_eq!(waypoint_to_name(26), "AA");
        assert_eq!(waypoint_to_name(MAX_WAYPOINT), "ZZ");
        for n in [0, 1, 25, 26, 27, 300, MAX_WAYPOINT] {
            assert_eq!(name_to_waypoint(&waypoint_to_name(n)), Some(n));
        }
        assert_eq!(name_to_waypoint("a"), Some(0));
        assert_eq!(name_to_waypoint("A1"), None);
        assert_eq!(name_to_waypoint("ABC"), None);
    }
}
