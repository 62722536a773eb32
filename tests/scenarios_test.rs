// Edge-case scenarios for loading, placement and the editing solvers

use isomap::codec::pack::{base64_section, encode_tile_pack};
use isomap::codec::{CellPos, Direction, DirectionMask};
use isomap::edit::cliff::{CliffPiece, CliffSide, ConnectionPoint};
use isomap::edit::overlay::{observed_mask, select_frame};
use isomap::state::tile::is_in_diamond;
use isomap::state::{MapEvent, Overlay, MAP_BUFFER_SIZE};
use isomap::theater::rules::{ConnectedFrame, ConnectedOverlay, OverlayType};
use isomap::{
    draw_cliff, load_map, load_map_file, save_map_file, CliffCatalog, CliffOptions, IniFile, MapLoadError, Rules,
    Severity, TheaterCatalog,
};

#[path = "common/mod.rs"]
mod common;

const SMALL_MAP: &str = "\
[Map]
Size=0,0,10,10
";

#[test]
fn test_missing_tile_pack_fills_defaults() {
    let outcome = load_map(IniFile::parse(SMALL_MAP), &common::rules(), &common::theater()).unwrap();
    let map = &outcome.map;
    assert_eq!(outcome.diagnostics.in_section("IsoMapPack5").count(), 0);

    let mut valid = 0;
    for y in 0..MAP_BUFFER_SIZE as i16 {
        for x in 0..MAP_BUFFER_SIZE as i16 {
            let pos = CellPos::new(x, y);
            let tile = map.tile(pos);
            if is_in_diamond(map.size(), pos) {
                let tile = tile.unwrap();
                assert_eq!((tile.tile_index, tile.level), (0, 0));
                valid += 1;
            } else {
                assert!(tile.is_none());
            }
        }
    }
    assert_eq!(valid, map.tiles().len());
}

#[test]
fn test_tiles_within_theater_after_load() {
    let mut ini = IniFile::parse("[Map]\nSize=0,0,20,20\n");
    let mut bad_sub_tile = common::tile(21, 20, 1, 3);
    bad_sub_tile.sub_tile = 5;
    let records = [
        common::tile(20, 20, 99, 2),
        bad_sub_tile,
        common::tile(22, 20, 0xFFFF, 1),
        common::tile(23, 20, 2, 1),
        common::tile(0, 0, 1, 0),
    ];
    ini.put_section(base64_section("IsoMapPack5", &encode_tile_pack(&records)));

    let theater = common::theater();
    let outcome = load_map(ini, &common::rules(), &theater).unwrap();
    let map = &outcome.map;
    for tile in map.tiles().iter() {
        let info = theater.tile(tile.tile_index).unwrap();
        assert!(usize::from(tile.sub_tile_index) < info.sub_tile_count());
    }

    let reset = map.tile(CellPos::new(20, 20)).unwrap();
    assert_eq!((reset.tile_index, reset.level), (0, 2));
    assert_eq!(map.tile(CellPos::new(21, 20)).unwrap().tile_index, 0);
    assert_eq!(map.tile(CellPos::new(22, 20)).unwrap().tile_index, 0);
    assert_eq!(map.tile(CellPos::new(23, 20)).unwrap().tile_index, 2);

    // one for the dropped record, one for the reset tiles
    let messages: Vec<_> = outcome.diagnostics.in_section("IsoMapPack5").collect();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|d| d.severity == Severity::Warning));
}

#[test]
fn test_reset_is_severe_without_drawable_tile_zero() {
    let mut ini = IniFile::parse("[Map]\nSize=0,0,20,20\n");
    ini.put_section(base64_section("IsoMapPack5", &encode_tile_pack(&[common::tile(20, 20, 50, 0)])));
    let mut theater = isomap::Theater::new("TEMPERATE");
    theater.add_tile_set("Clear", "clear", vec![(1, 1, vec![false])]);
    let outcome = load_map(ini, &common::rules(), &theater).unwrap();
    assert!(outcome.diagnostics.has_severe());
}

#[test]
fn test_undecodable_tile_pack_text_keeps_default_tiles() {
    let text = "[Map]\nSize=0,0,20,20\n\n[IsoMapPack5]\n1=!!not*base64!!\n";
    let outcome = load_map(IniFile::parse(text), &common::rules(), &common::theater()).unwrap();
    assert!(outcome.diagnostics.has_severe());
    assert_eq!(outcome.diagnostics.in_section("IsoMapPack5").count(), 1);
    assert!(outcome.map.tiles().iter().all(|t| t.is_default_terrain()));
}

#[test]
fn test_follower_index_counts_loaded_units_only() {
    let text = "\
[Map]
Size=0,0,20,20

[Houses]
0=Player House

[Units]
0=Player House,MTNK,256
1=Player House,MTNK,256,22,20,64,Guard,None,0,-1,0,-1,0,0
2=Player House,HTNK,256,23,20,64,Guard,None,0,-1,0,0,0,0
";
    let rules = common::rules();
    let outcome = load_map(IniFile::parse(text), &rules, &common::theater()).unwrap();
    assert_eq!(outcome.diagnostics.in_section("Units").count(), 1);

    let units = outcome.map.units();
    assert_eq!(units.len(), 2);
    let leader = units.id_at(0).unwrap();
    let follower = units.get(units.id_at(1).unwrap()).unwrap();
    assert_eq!(follower.techno.type_name, "HTNK");
    assert_eq!(follower.follower, Some(leader));

    let saved = isomap::save_map(&outcome.map, &rules).ini;
    assert_eq!(
        saved.get("Units", "1"),
        Some("Player House,HTNK,256,23,20,64,Guard,None,0,-1,0,0,0,0")
    );
}

#[test]
fn test_bad_map_section_is_fatal() {
    let theater = common::theater();
    let rules = common::rules();
    let err = load_map(IniFile::parse("[Basic]\nName=x\n"), &rules, &theater).unwrap_err();
    assert!(matches!(err, MapLoadError::MissingSection("Map")));
    let err = load_map(IniFile::parse("[Map]\nSize=0,0,400,10\n"), &rules, &theater).unwrap_err();
    assert!(matches!(err, MapLoadError::SizeTooLarge { .. }));
    let err = load_map(IniFile::parse("[Map]\nSize=0,0,ten\n"), &rules, &theater).unwrap_err();
    assert!(matches!(err, MapLoadError::MalformedSize { .. }));
}

#[test]
fn test_single_occupant_slots_reject_second_claim() {
    let text = format!(
        "{}\
[Houses]
0=Player House

[Waypoints]
0=20021
1=20021

[Aircraft]
0=Player House,ORCA,256,21,20,64,Guard,None,0,-1,0,0
1=Player House,ORCA,128,21,20,64,Guard,None,0,-1,0,0

[Infantry]
0=Player House,E1,256,22,20,2,Guard,64,None,0,-1,0,0,0
1=Player House,E2,256,22,20,2,Guard,64,None,0,-1,0,0,0
2=Player House,E2,256,22,20,3,Guard,64,None,0,-1,0,0,0
",
        "[Map]\nSize=0,0,20,20\n\n"
    );
    let outcome = load_map(IniFile::parse(&text), &common::rules(), &common::theater()).unwrap();
    let map = &outcome.map;

    assert_eq!(map.waypoints().len(), 1);
    assert_eq!(map.aircraft().len(), 1);
    assert_eq!(map.aircraft().values().next().unwrap().techno.health, 256);
    assert_eq!(map.infantry().len(), 2);
    assert_eq!(outcome.diagnostics.in_section("Waypoints").count(), 1);
    assert_eq!(outcome.diagnostics.in_section("Aircraft").count(), 1);
    assert_eq!(outcome.diagnostics.in_section("Infantry").count(), 1);
}

#[test]
fn test_unknown_owner_gets_placeholder_house() {
    let text = "[Map]\nSize=0,0,20,20\n\n[Units]\n0=Ghosts,MTNK,256,22,20,64,Guard,None,0,-1,0,-1,0,0\n";
    let rules = common::rules();
    let outcome = load_map(IniFile::parse(text), &rules, &common::theater()).unwrap();
    let map = &outcome.map;
    assert_eq!(map.units().len(), 1);
    let owner = map.units().values().next().unwrap().techno.owner;
    assert_eq!(map.house(owner).unwrap().name, "Ghosts");
    assert!(!map.house(owner).unwrap().is_written());
    assert_eq!(outcome.diagnostics.in_section("Units").count(), 1);
}

#[test]
fn test_cliff_with_north_only_piece_gives_best_effort() {
    let mut map = load_map(IniFile::parse(SMALL_MAP), &common::rules(), &common::theater())
        .unwrap()
        .map;
    let catalog = CliffCatalog {
        pieces: vec![CliffPiece {
            name: "north".into(),
            tile_indices: vec![1],
            connection_points: vec![ConnectionPoint {
                offset: CellPos::new(0, 0),
                directions: DirectionMask::NORTH,
                side: CliffSide::Front,
            }],
            height_offset: 0,
        }],
    };
    let start = CellPos::new(10, 10);
    let end = start.step(Direction::East);
    let outcome = draw_cliff(
        &mut map,
        &common::rules(),
        &common::theater(),
        &catalog,
        &[start, end],
        &CliffOptions::default(),
    );
    assert_eq!(outcome.segments.len(), 1);
    assert!(!outcome.segments[0].reached);
    assert!(outcome.segments[0].distance >= 1.0);
}

#[test]
fn test_connected_overlay_masked_frame() {
    let participating = DirectionMask::NORTH | DirectionMask::NORTH_EAST | DirectionMask::EAST | DirectionMask::SOUTH_EAST;
    assert_eq!(participating.bits(), 0b1111_0000);
    let north_east = DirectionMask::NORTH | DirectionMask::EAST;
    let rules = Rules {
        overlays: vec![OverlayType {
            name: "GAWALL".into(),
            connected: Some(ConnectedOverlay {
                family: "wall".into(),
                connection_mask: participating,
                frames: vec![
                    ConnectedFrame {
                        frame: 3,
                        connects_to: DirectionMask::NORTH,
                    },
                    ConnectedFrame {
                        frame: 6,
                        connects_to: north_east,
                    },
                ],
            }),
        }],
        ..common::rules()
    };
    let mut map = load_map(IniFile::parse("[Map]\nSize=0,0,20,20\n"), &rules, &common::theater())
        .unwrap()
        .map;
    let center = CellPos::new(20, 20);
    for d in [Direction::North, Direction::East] {
        map.set_overlay(center.step(d), Some(Overlay { type_index: 0, frame: 0 })).unwrap();
    }
    let observed = observed_mask(&map, &rules, center, "wall");
    let connected = rules.connected_overlay(0).unwrap();
    assert_eq!(observed & connected.connection_mask, north_east);
    assert_eq!(select_frame(connected, observed), Some(6));
    assert_eq!(select_frame(connected, DirectionMask::EAST), None);
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("fixture.map");
    let output = dir.path().join("resaved.map");
    common::fixture_ini().write_file(&input).unwrap();

    let rules = common::rules();
    let theater = common::theater();
    let mut outcome = load_map_file(&input, &rules, &theater).unwrap();
    let diagnostics = save_map_file(&mut outcome.map, &rules, &output).unwrap();
    assert!(diagnostics.is_empty());
    assert!(outcome.map.take_events().contains(&MapEvent::MapWritten));

    let reloaded = load_map_file(&output, &rules, &theater).unwrap();
    assert_eq!(reloaded.map.units().len(), 3);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        reloaded.map.source().to_text()
    );
}
