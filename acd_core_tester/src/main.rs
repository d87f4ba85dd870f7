use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use acd_core::adapters::acd::{AcdCodec, AcdConfig, AcdReader};
use acd_core::domain::{AcdDocument, Project};
use acd_core::ports::{DiagnosticLog, ProjectCodec};
use acd_core::ProjectService;
use anyhow::{bail, Context, Result};
use log::info;

const USAGE: &str = "usage: acd_core_tester <inspect|roundtrip|dump|export> <input> [output]";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (command, input) = match (args.first(), args.get(1)) {
        (Some(command), Some(input)) => (command.as_str(), PathBuf::from(input)),
        _ => bail!(USAGE),
    };
    let output = args.get(2).map(PathBuf::from);

    match command {
        "inspect" => inspect(&input),
        "roundtrip" => roundtrip(&input),
        "dump" => dump(&input, output),
        "export" => export(&input, output),
        other => bail!("unknown command '{other}'\n{USAGE}"),
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn inspect(path: &Path) -> Result<()> {
    let bytes = read_bytes(path)?;
    let reader = AcdReader::new(&bytes);
    let header = reader
        .read_header()
        .with_context(|| format!("{} is not an ACD file", path.display()))?;

    println!("[ok] {} ({} bytes)", path.display(), bytes.len());
    println!(
        "  signature='{}' version='{}' timestamp={}",
        header.signature,
        header.version,
        header
            .timestamp()
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| header.timestamp_ms.to_string())
    );
    if !header.metadata.is_empty() {
        println!("  metadata={}", serde_json::Value::Object(header.metadata.clone()));
    }
    for section in reader.sections() {
        let name = section
            .section_type()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "  - section 0x{:02X} {} at {} len={}",
            section.type_code,
            name,
            section.offset,
            section.len()
        );
    }

    let doc = AcdCodec::default().decode_document(&bytes)?;
    print_summary(&doc);
    Ok(())
}

fn print_summary(doc: &AcdDocument) {
    let project = &doc.project;
    println!(
        "  programs={} global_tags={} flat_tags={}",
        project.programs.len(),
        project.global_tags.len(),
        doc.flat_tags.len()
    );
    for program in &project.programs {
        for routine in &program.routines {
            println!(
                "  - {}/{} tags={} rungs={}",
                program.name,
                routine.name,
                routine.tags.len(),
                routine.ladder_logic.rungs.len()
            );
        }
    }
}

/// Decode, re-encode with the original timestamp, decode again and compare.
fn roundtrip(path: &Path) -> Result<()> {
    let bytes = read_bytes(path)?;
    let log = Arc::new(DiagnosticLog::new());
    let first = AcdCodec::default()
        .with_sink(log.clone())
        .decode_document(&bytes)?;

    let mut config = AcdConfig::reproducible(first.header.timestamp_ms);
    config.metadata = first.header.metadata.clone();
    let service = ProjectService::new(AcdCodec::new(config).with_sink(log.clone()));

    let encoded = service.encode(&first.project)?;
    let second = service.decode(&encoded)?;

    for diagnostic in log.entries() {
        println!("  ! {diagnostic}");
    }
    if second != first.project {
        bail!("round trip of {} changed the project", path.display());
    }
    println!(
        "[ok] {} round trip: {} -> {} bytes",
        path.display(),
        bytes.len(),
        encoded.len()
    );
    Ok(())
}

fn dump(path: &Path, output: Option<PathBuf>) -> Result<()> {
    let bytes = read_bytes(path)?;
    let project = ProjectService::new(AcdCodec::default()).decode(&bytes)?;
    let json = serde_json::to_string_pretty(&project)?;

    let out_path = output.unwrap_or_else(|| path.with_extension("json"));
    fs::write(&out_path, json).with_context(|| format!("failed to write {}", out_path.display()))?;
    info!("wrote {}", out_path.display());
    Ok(())
}

fn export(path: &Path, output: Option<PathBuf>) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let project: Project = serde_json::from_str(&text)
        .with_context(|| format!("invalid project JSON in {}", path.display()))?;

    let service = ProjectService::new(AcdCodec::default());
    let bytes = service.encode(&project)?;

    let out_path = output.unwrap_or_else(|| path.with_extension("ACD"));
    fs::write(&out_path, &bytes)
        .with_context(|| format!("failed to write {}", out_path.display()))?;
    info!("wrote {} ({} bytes, {})", out_path.display(), bytes.len(), service.format_name());
    Ok(())
}
