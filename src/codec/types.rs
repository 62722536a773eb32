use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Cell numbers in the container encode `y * CELL_NUMBER_STRIDE + x`.
pub const CELL_NUMBER_STRIDE: i32 = 1000;

/// Integer cell coordinate on the isometric grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct CellPos {
    pub x: i16,
    pub y: i16,
}

impl CellPos {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    pub fn from_cell_number(number: i32) -> Option<Self> {
        if number < 0 {
            return None;
        }
        let x = i16::try_from(number % CELL_NUMBER_STRIDE).ok()?;
        let y = i16::try_from(number / CELL_NUMBER_STRIDE).ok()?;
        Some(Self { x, y })
    }

    pub fn cell_number(self) -> i32 {
        self.y as i32 * CELL_NUMBER_STRIDE + self.x as i32
    }

    pub fn offset(self, dx: i16, dy: i16) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.to_offset();
        self.offset(dx, dy)
    }

    pub fn distance_to(self, other: Self) -> f64 {
        let dx = (self.x as f64) - (other.x as f64);
        let dy = (self.y as f64) - (other.y as f64);
        (dx * dx + dy * dy).sqrt()
    }
}

impl std::ops::Add for CellPos {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.offset(rhs.x, rhs.y)
    }
}

impl std::ops::Sub for CellPos {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.offset(rhs.x.saturating_neg(), rhs.y.saturating_neg())
    }
}

impl std::fmt::Display for CellPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// 8-way screen direction on the isometric grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    #[default]
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
        Self::NorthWest,
    ];

    pub fn from_u8(v: u8) -> Option<Self> {
        Self::ALL.get(v as usize).copied()
    }

    /// Cell offset of one step in this direction. Screen north is up-left in cell space.
    pub fn to_offset(self) -> (i16, i16) {
        match self {
            Self::North => (-1, -1),
            Self::NorthEast => (0, -1),
            Self::East => (1, -1),
            Self::SouthEast => (1, 0),
            Self::South => (1, 1),
            Self::SouthWest => (0, 1),
            Self::West => (-1, 1),
            Self::NorthWest => (-1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        Self::ALL[(self as usize + 4) % 8]
    }

    pub fn rotate_cw(self) -> Self {
        Self::ALL[(self as usize + 1) % 8]
    }

    pub fn rotate_ccw(self) -> Self {
        Self::ALL[(self as usize + 7) % 8]
    }

    pub fn mask(self) -> DirectionMask {
        DirectionMask::from_bits_truncate(0x80 >> (self as u8))
    }
}

bitflags! {
    /// One bit per direction, north in the most significant bit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DirectionMask: u8 {
        const NORTH = 0x80;
        const NORTH_EAST = 0x40;
        const EAST = 0x20;
        const SOUTH_EAST = 0x10;
        const SOUTH = 0x08;
        const SOUTH_WEST = 0x04;
        const WEST = 0x02;
        const NORTH_WEST = 0x01;
    }
}

// Stored as the raw byte in rules files.
impl Serialize for DirectionMask {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for DirectionMask {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        u8::deserialize(deserializer).map(Self::from_bits_retain)
    }
}

impl DirectionMask {
    /// Every direction mirrored through the origin.
    pub fn reversed(self) -> Self {
        Self::from_bits_truncate(self.bits().rotate_right(4))
    }

    pub fn directions(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.contains(d.mask()))
    }
}
