use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use isomap::codec::pack::{decode_tile_pack, read_base64_section};
use isomap::config::{self, EditorConfig};
use isomap::{check_map, load_map_file, save_map_file, Diagnostics, Map, Rules, Theater};

#[derive(Parser)]
#[command(name = "isomap")]
#[command(about = "Inspect, check and resave isometric RTS map files")]
struct Cli {
    /// Rules JSON (defaults to the config file's rules_path)
    #[arg(long, global = true)]
    rules: Option<PathBuf>,
    /// Theater JSON (defaults to the config file's theater_path)
    #[arg(long, global = true)]
    theater: Option<PathBuf>,
    /// Editor config JSON
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a map and print a summary with its diagnostics
    Inspect {
        map: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Load a map and save it again
    Resave { input: PathBuf, output: PathBuf },
    /// Run the advisory consistency checks
    Check { map: PathBuf },
    /// Dump the raw tile records of the tile pack
    UnpackTiles {
        map: PathBuf,
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Serialize)]
struct Summary<'a> {
    name: &'a str,
    theater: &'a str,
    width: i32,
    height: i32,
    houses: usize,
    structures: usize,
    units: usize,
    infantry: usize,
    aircraft: usize,
    triggers: usize,
    tags: usize,
    team_types: usize,
    waypoints: usize,
    diagnostics: &'a Diagnostics,
}

impl<'a> Summary<'a> {
    fn new(map: &'a Map, diagnostics: &'a Diagnostics) -> Self {
        Self {
            name: &map.basic.name,
            theater: &map.theater,
            width: map.size().width,
            height: map.size().height,
            houses: map.houses().len(),
            structures: map.structures().len(),
            units: map.units().len(),
            infantry: map.infantry().len(),
            aircraft: map.aircraft().len(),
            triggers: map.triggers().len(),
            tags: map.tags().len(),
            team_types: map.team_types().len(),
            waypoints: map.waypoints().len(),
            diagnostics,
        }
    }
}

struct Env {
    rules: Rules,
    theater: Theater,
}

fn load_env(cli: &Cli) -> Result<Env, Box<dyn std::error::Error>> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_path);
    let config = EditorConfig::load(&config_path)?;

    let mut rules = match cli.rules.as_ref().or(config.rules_path.as_ref()) {
        Some(path) => Rules::from_json_file(path)?,
        None => Rules::default(),
    };
    config.apply_to_rules(&mut rules);

    let theater = match cli.theater.as_ref().or(config.theater_path.as_ref()) {
        Some(path) => Theater::from_json_file(path)?,
        None => {
            tracing::warn!("no theater given, tiles are not validated");
            Theater::new("")
        }
    };
    Ok(Env { rules, theater })
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.iter() {
        println!("  {:?}: {}", diagnostic.severity, diagnostic);
    }
}

fn inspect(env: &Env, path: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = load_map_file(path, &env.rules, &env.theater)?;
    let summary = Summary::new(&outcome.map, &outcome.diagnostics);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    println!("Map: {} ({})", summary.name, summary.theater);
    println!("Size: {}x{}", summary.width, summary.height);
    println!(
        "Houses: {}  Structures: {}  Units: {}  Infantry: {}  Aircraft: {}",
        summary.houses, summary.structures, summary.units, summary.infantry, summary.aircraft
    );
    println!(
        "Triggers: {}  Tags: {}  Team types: {}  Waypoints: {}",
        summary.triggers, summary.tags, summary.team_types, summary.waypoints
    );
    println!("Diagnostics: {}", outcome.diagnostics.len());
    print_diagnostics(&outcome.diagnostics);
    Ok(())
}

fn resave(env: &Env, input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut outcome = load_map_file(input, &env.rules, &env.theater)?;
    println!("Loaded with {} diagnostics", outcome.diagnostics.len());
    print_diagnostics(&outcome.diagnostics);
    let diagnostics = save_map_file(&mut outcome.map, &env.rules, output)?;
    println!("Saved {} with {} diagnostics", output.display(), diagnostics.len());
    print_diagnostics(&diagnostics);
    Ok(())
}

fn check(env: &Env, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = load_map_file(path, &env.rules, &env.theater)?;
    let issues = check_map(&outcome.map, &env.rules);
    if issues.is_empty() {
        println!("No issues found");
    }
    for issue in &issues {
        println!("{:?} {}", issue.kind, issue);
    }
    Ok(())
}

fn unpack_tiles(path: &Path, limit: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let ini = isomap::IniFile::read_file(path)?;
    let Some(section) = ini.section("IsoMapPack5") else {
        println!("No [IsoMapPack5] section");
        return Ok(());
    };
    let pack = decode_tile_pack(&read_base64_section(section)?)?;
    println!("{} records ({} trailing bytes)", pack.records.len(), pack.trailing_bytes);
    println!("     x     y  tile  sub  level  ice");
    for record in pack.records.iter().take(limit.unwrap_or(usize::MAX)) {
        println!(
            "{:6}{:6}{:6}{:5}{:7}{:5}",
            record.x, record.y, record.tile_index, record.sub_tile, record.level, record.ice_growth
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Inspect { map, json } => inspect(&load_env(&cli)?, map, *json),
        Commands::Resave { input, output } => resave(&load_env(&cli)?, input, output),
        Commands::Check { map } => check(&load_env(&cli)?, map),
        Commands::UnpackTiles { map, limit } => unpack_tiles(map, *limit),
    }
}
