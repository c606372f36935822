//! objmap CLI - Tool for inspecting and converting Analyze object maps.

use std::env;
use std::path::Path;

use anyhow::{bail, Context, Result};
use objmap::core::compression;
use objmap::objmap::{read_header, VERSION_KEY};
use objmap::prelude::*;
use serde_json::json;
use tracing::{debug, info, trace, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "OBJMAP_LOG";

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = None;
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = Some("debug"),
            "-vv" | "--trace" => level = Some("trace"),
            "-q" | "--quiet" => level = Some("error"),
            _ => filtered_args.push(arg),
        }
    }
    init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let args = &filtered_args[1..];
    let result = match filtered_args[0] {
        "info" | "i" => arg(args, 0, "info <file.obj>").and_then(cmd_info),
        "dump" | "d" => cmd_dump(args),
        "copy" | "c" => cmd_copy(args),
        "pick" | "p" => cmd_pick(args),
        "build" | "b" => cmd_build(args),
        "color" => cmd_color(args),
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_help();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn arg<'a>(args: &[&'a str], index: usize, usage: &str) -> Result<&'a str> {
    match args.get(index) {
        Some(a) => Ok(*a),
        None => bail!("missing argument\nUsage: objmap-cli {}", usage),
    }
}

fn print_help() {
    println!("objmap-cli - Analyze object map toolkit");
    println!();
    println!("USAGE:");
    println!("    objmap-cli [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info  <file>                 Show header and entry summary");
    println!("    d, dump  <file> [--json]        Dump every entry record");
    println!("    c, copy  <in> <out>             Re-write a file and compare bytes");
    println!("    p, pick  <in> <index> <out>     Extract one entry as a binary mask");
    println!("    b, build <raw> <x> <y> <z> <out> Build an object map from raw u8 labels");
    println!("    color    <in> <out.rgba>        Write the color projection as raw RGBA");
    println!("    h, help                         Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Only show errors");
    println!();
    println!("ENVIRONMENT:");
    println!("    {}     Log filter when no verbosity flag is given", LOG_ENV);
    println!();
    println!("EXAMPLES:");
    println!("    objmap-cli info head.obj                   # Quick overview");
    println!("    objmap-cli dump head.obj --json            # Entries as JSON");
    println!("    objmap-cli copy head.obj out.obj.gz        # Round-trip through gzip");
    println!("    objmap-cli pick head.obj 2 brain.obj       # Mask of entry 2");
}

fn read_map(path: &str) -> Result<LabelMap> {
    info!("Opening object map: {}", path);
    read_label_map(path, &ReadOptions::default())
        .with_context(|| format!("failed to read {}", path))
}

fn cmd_info(path: &str) -> Result<()> {
    let (header, swapped) = read_header(path).with_context(|| format!("failed to read {}", path))?;
    let map = read_map(path)?;
    debug!("label map loaded");

    println!("File: {}", path);
    println!("Version: {}", header.version);
    let big_endian = swapped == cfg!(target_endian = "little");
    println!("Byte order: {}", if big_endian { "big-endian" } else { "little-endian" });
    println!("Dimensions: {}", map.dims());
    println!("Voxels: {}", map.volume().len());
    println!();
    println!("Entries: {}", map.len());
    let background = map.volume().count(0);
    println!("  {:>3}  {:<32} {:>10}", 0, map.background().name(), background);
    for (i, entry) in map.entries().iter().enumerate() {
        let label = (i + 1) as u8;
        trace!("counting label {}", label);
        println!("  {:>3}  {:<32} {:>10}", label, entry.name(), map.volume().count(label));
    }
    Ok(())
}

fn cmd_dump(args: &[&str]) -> Result<()> {
    let json_mode = args.contains(&"--json");
    let rest: Vec<&str> = args.iter().copied().filter(|a| *a != "--json").collect();
    let path = arg(&rest, 0, "dump <file.obj> [--json]")?;
    let map = read_map(path)?;
    let records = std::iter::once(map.background()).chain(map.entries());

    if json_mode {
        let entries: Vec<_> = records.map(entry_json).collect();
        let doc = json!({
            "file": path,
            "dimensions": map.dims().sizes(),
            "entries": entries,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        for (i, entry) in records.enumerate() {
            println!("[{}]", i);
            println!("{}", entry);
            println!();
        }
    }
    Ok(())
}

fn entry_json(e: &ObjectEntry) -> serde_json::Value {
    json!({
        "name": e.name(),
        "display_flag": e.display_flag(),
        "copy_flag": e.copy_flag(),
        "mirror_flag": e.mirror_flag(),
        "status_flag": e.status_flag(),
        "neighbors_used_flag": e.neighbors_used_flag(),
        "shades": e.shades(),
        "start_color": e.start_color().to_array(),
        "end_color": e.end_color().to_array(),
        "rotation": e.rotation().to_array(),
        "translation": e.translation().to_array(),
        "center": e.center().to_array(),
        "rotation_increment": e.rotation_increment().to_array(),
        "translation_increment": e.translation_increment().to_array(),
        "minimum": e.minimum_coordinate().to_array(),
        "maximum": e.maximum_coordinate().to_array(),
        "opacity": e.opacity(),
        "opacity_thickness": e.opacity_thickness(),
        "blend_factor": e.blend_factor(),
    })
}

fn cmd_copy(args: &[&str]) -> Result<()> {
    let usage = "copy <in.obj> <out.obj>";
    let (input, output) = (arg(args, 0, usage)?, arg(args, 1, usage)?);
    info!("Copying {} -> {}", input, output);
    let volume = read_object_map(input, &ReadOptions::default())
        .with_context(|| format!("failed to read {}", input))?;

    // Keep the input's revision so the bytes can match
    let version = volume
        .metadata()
        .get_int(VERSION_KEY)
        .map(|v| v as i32)
        .unwrap_or(objmap::objmap::CURRENT_VERSION);
    let options = WriteOptions::default().with_version(version);
    write_object_map(&volume, output, &options)
        .with_context(|| format!("failed to write {}", output))?;

    let (a, b) = (Path::new(input), Path::new(output));
    if compression::is_gzip_path(a) || compression::is_gzip_path(b) {
        let back = read_object_map(output, &ReadOptions::default())?;
        if back != volume {
            bail!("{} does not decode to the same volume", output);
        }
        println!("Copied {} -> {} (volumes identical)", input, output);
        return Ok(());
    }

    let original = std::fs::read(a)?;
    let copy = std::fs::read(b)?;
    match original.iter().zip(&copy).position(|(x, y)| x != y) {
        None if original.len() == copy.len() => {
            println!("Copied {} -> {} ({} bytes, identical)", input, output, copy.len());
            Ok(())
        }
        None => {
            warn!("sizes differ: {} vs {} bytes", original.len(), copy.len());
            bail!("copy differs in length ({} vs {} bytes)", original.len(), copy.len())
        }
        Some(offset) => bail!("copy differs from the input at byte {}", offset),
    }
}

fn cmd_pick(args: &[&str]) -> Result<()> {
    let usage = "pick <in.obj> <index> <out.obj>";
    let input = arg(args, 0, usage)?;
    let index: usize = arg(args, 1, usage)?.parse().context("index must be a number")?;
    let output = arg(args, 2, usage)?;
    let map = read_map(input)?;
    let mask = map.pick_entry(index)?;
    info!("Entry {} covers {} voxels", index, mask.count(1));
    write_object_map(&mask, output, &WriteOptions::default())
        .with_context(|| format!("failed to write {}", output))?;
    println!("Wrote {} ('{}')", output, map.entry(index)?.name());
    Ok(())
}

fn cmd_build(args: &[&str]) -> Result<()> {
    let usage = "build <labels.raw> <x> <y> <z> <out.obj>";
    let input = arg(args, 0, usage)?;
    let mut dims = [0usize; 3];
    for (i, d) in dims.iter_mut().enumerate() {
        *d = arg(args, 1 + i, usage)?.parse().context("dimensions must be numbers")?;
    }
    let output = arg(args, 4, usage)?;
    let data = std::fs::read(input).with_context(|| format!("failed to read {}", input))?;
    let image = LabelVolume::from_vec(Dimensions::from_slice(&dims), data)?;
    let map = LabelMap::from_volume(image)?;
    info!("Built {} entries", map.len());
    write_label_map(&map, output, &WriteOptions::default())
        .with_context(|| format!("failed to write {}", output))?;
    for (i, entry) in map.entries().iter().enumerate() {
        println!("  {:>3}  {}", i + 1, entry.name());
    }
    Ok(())
}

fn cmd_color(args: &[&str]) -> Result<()> {
    let usage = "color <in.obj> <out.rgba>";
    let (input, output) = (arg(args, 0, usage)?, arg(args, 1, usage)?);
    let map = read_map(input)?;
    let color = map.to_color_image();
    std::fs::write(output, color.as_bytes())
        .with_context(|| format!("failed to write {}", output))?;
    println!("Wrote {} ({} RGBA pixels, {})", output, color.pixels().len(), color.dims());
    Ok(())
}
