// Sun Oct 18 2026 - Alex

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use itertools::Itertools;
use std::path::PathBuf;
use std::sync::Arc;
use swift_introspect::{
    config::Config,
    registry::Registry,
    utils::{format_duration, logging, measure_time, pluralize},
    ImageHost, LoadedModule, Runtime, Type,
};

#[derive(Parser, Debug)]
#[command(version)]
#[command(about = "Lists the Swift types, conformances and symbols of binary images", long_about = None)]
struct Args {
    /// Image to inspect; may be repeated
    #[arg(short, long)]
    binary: Vec<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// List demangled Swift symbols of every image
    #[arg(long)]
    symbols: bool,

    /// List every type with its conformances
    #[arg(long)]
    types: bool,

    #[arg(short, long)]
    verbose: bool,

    /// JSON config file; defaults to $SWIFT_INTROSPECT_CONFIG
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::from_env().context("loading config from environment")?,
    };
    config.module_paths.extend(args.binary.iter().cloned());

    if let Some(path) = &config.log_file {
        let level = if args.verbose {
            log::LevelFilter::Debug
        } else {
            logging::level_from_str(&config.log_level)
        };
        logging::init_with_file(level, path).with_context(|| format!("opening log file {}", path.display()))?;
    } else if args.verbose {
        logging::init_logger(true);
    } else if std::env::var_os("RUST_LOG").is_some() {
        logging::init_from_env();
    } else {
        logging::init_with_level(logging::level_from_str(&config.log_level));
    }

    if config.module_paths.is_empty() {
        bail!("no images given; pass --binary or set {}", swift_introspect::config::MODULES_ENV);
    }

    let host = ImageHost::from_paths(&config.module_paths);
    if host.is_empty() {
        bail!("none of the {} could be opened", pluralize(config.module_paths.len(), "image", "images"));
    }
    Runtime::install(Arc::new(host));

    let runtime = Runtime::from_config(&config)?;
    let (registry, elapsed) = measure_time(|| runtime.registry());
    let registry = registry?;

    let symbols = if args.symbols {
        collect_symbols(&runtime)?
    } else {
        Vec::new()
    };

    if args.json {
        print_json(registry, args.types, &symbols)?;
        return Ok(());
    }

    println!(
        "{} Scanned {} in {}",
        "[+]".green(),
        pluralize(registry.report().modules_scanned, "image", "images"),
        format_duration(elapsed)
    );
    print_summary(registry);
    if args.types {
        print_types(registry.types());
    }
    for (module, records) in &symbols {
        println!();
        println!("{}", format!("Symbols in {}:", module).yellow().bold());
        for record in records {
            println!("  {} {}", format!("{}", record.address).dimmed(), record.demangled.cyan());
        }
    }
    Ok(())
}

fn collect_symbols(runtime: &Runtime) -> Result<Vec<(String, Vec<swift_introspect::SymbolRecord>)>> {
    let mut all = Vec::new();
    for module in runtime.modules()? {
        match runtime.enumerate_demangled_symbols(module.as_ref()) {
            Ok(records) => all.push((module.name().to_string(), records)),
            Err(e) => eprintln!("{} {}: {}", "[!]".red(), module.name(), e),
        }
    }
    Ok(all)
}

fn print_summary(registry: &Registry) {
    println!("{}", "Modules".cyan().bold());
    println!("{}", "-".repeat(60).cyan());
    for (name, module) in registry.modules() {
        let summary = module.summary();
        println!(
            "  {:<24} {:>5} classes {:>5} structs {:>5} enums {:>5} protocols",
            name.green(),
            summary.classes,
            summary.structs,
            summary.enums,
            summary.protocols
        );
    }

    let report = registry.report();
    for skipped in &report.skipped_modules {
        println!("  {} {}: {}", "skipped".red(), skipped.name, skipped.reason);
    }
    if !report.is_clean() {
        println!("{} {}", "[!]".yellow(), report);
    }
}

fn print_types(types: &[Type]) {
    println!();
    println!("{}", "Types".cyan().bold());
    for ty in types {
        let conformances = ty.conformances().iter().map(|c| c.protocol().full_name()).join(", ");
        if conformances.is_empty() {
            println!("  {:<9} {}", ty.kind().to_string().yellow(), ty.full_name());
        } else {
            println!("  {:<9} {} : {}", ty.kind().to_string().yellow(), ty.full_name(), conformances.dimmed());
        }
    }
}

fn print_json(registry: &Registry, with_types: bool, symbols: &[(String, Vec<swift_introspect::SymbolRecord>)]) -> Result<()> {
    let modules: serde_json::Map<String, serde_json::Value> = registry
        .modules()
        .iter()
        .map(|(name, module)| (name.clone(), module.to_json()))
        .collect();

    let mut out = serde_json::json!({
        "modules": modules,
        "report": registry.report(),
    });
    if with_types {
        out["types"] = serde_json::to_value(registry.types())?;
    }
    if !symbols.is_empty() {
        let symbols: serde_json::Map<String, serde_json::Value> = symbols
            .iter()
            .map(|(module, records)| Ok((module.clone(), serde_json::to_value(records)?)))
            .collect::<Result<_>>()?;
        out["symbols"] = serde_json::Value::Object(symbols);
    }

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
