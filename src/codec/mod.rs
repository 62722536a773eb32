pub mod fields;
pub mod ini;
pub mod pack;
pub mod reader;
pub mod types;
pub mod writer;

pub use ini::{IniFile, IniSection};
pub use pack::IsoTileRecord;
pub use reader::BinaryReader;
pub use types::*;
pub use writer::BinaryWriter;
