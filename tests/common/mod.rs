// Shared fixtures for the pipeline tests
#![allow(dead_code)]

use isomap::codec::pack::{base64_section, encode_tile_pack};
use isomap::theater::rules::Country;
use isomap::{IniFile, IsoTileRecord, Rules, Theater};

/// Two countries; every other type list is left empty so any type name loads.
pub fn rules() -> Rules {
    Rules {
        countries: vec![
            Country {
                name: "Americans".into(),
                color: 3,
                side: "Allied".into(),
            },
            Country {
                name: "Russians".into(),
                color: 11,
                side: "Soviet".into(),
            },
        ],
        ..Rules::default()
    }
}

/// Clear tile 0 plus a three-tile "Rough" set (tiles 1..=3), all 1x1.
pub fn theater() -> Theater {
    let mut theater = Theater::new("TEMPERATE");
    theater.add_tile_set("Clear", "clear", vec![(1, 1, vec![true])]);
    theater.add_tile_set("Rough", "rough", vec![(1, 1, vec![true]); 3]);
    theater
}

pub fn tile(x: u16, y: u16, tile_index: u32, level: u8) -> IsoTileRecord {
    IsoTileRecord {
        x,
        y,
        tile_index,
        sub_tile: 0,
        level,
        ice_growth: 0,
    }
}

pub const FIXTURE: &str = "\
; sample scenario
[Basic]
Name=Fixture
Author=Tests

[Map]
Size=0,0,20,20
Theater=TEMPERATE
LocalSize=2,4,16,14

[Houses]
0=Player House

[Player House]
Country=Americans
Credits=5000
Edge=West
Allies=Player House
PlayerControl=yes
NodeCount=1
000=GAPOWR,21,20

[Triggers]
01000000=Player House,<none>,Start,0,1,1,1,0
01000001=Player House,01000000,Follow,0,1,1,0,0

[Events]
01000000=1,13,0,5

[Actions]
01000000=1,53,2,01000001,0,0,0,0,A

[Tags]
01000002=0,Start tag,01000000

[TaskForces]
0=01000003

[01000003]
Name=Tanks
Group=-1
0=2,MTNK

[ScriptTypes]
0=01000004

[01000004]
Name=Attack
0=0,2

[TeamTypes]
0=01000005

[01000005]
Name=Strike
House=Player House
Script=01000004
TaskForce=01000003
Tag=01000002

[AITriggerTypes]
0=02000000,Early strike,01000005,Americans,1,0,<none>,0000000003000000000000000000000000000000000000000000000000000000,50.000000,30.000000,100.000000,1,0,1,0,<none>,1,1,0

[Structures]
0=Player House,GAPOWR,256,21,20,64,None,1,1,1,0,0,None,None,None,1,0

[Units]
0=Player House,MTNK,256,22,20,64,Guard,01000002,0,-1,0,-1,0,0
1=Player House,MTNK,200,23,20,32,Guard,None,0,-1,0,-1,0,0
2=Player House,HTNK,256,24,20,0,Guard,None,0,-1,0,0,0,0

[Infantry]
0=Player House,E1,256,22,21,0,Guard,64,None,0,-1,0,0,0

[Aircraft]
0=Player House,ORCA,256,25,21,64,Guard,None,0,-1,0,0

[Waypoints]
0=20021
1=21022

[CellTags]
20022=01000002

[Lighting]
Ambient=1.000000
";

/// The fixture container with a small tile pack attached.
pub fn fixture_ini() -> IniFile {
    let mut ini = IniFile::parse(FIXTURE);
    let records = [tile(20, 20, 1, 2), tile(21, 20, 3, 0), tile(22, 22, 0, 4)];
    ini.put_section(base64_section("IsoMapPack5", &encode_tile_pack(&records)));
    ini
}
