// src/main.rs

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::info;

use gaffer::{
    CatalogContext, GafferError, GraphStore, HdriLook, LookParam, LookParameters, Preferences,
    StageKind, Variant, VariantRequest,
};

#[derive(Parser)]
#[command(name = "gaffer-hdri")]
#[command(version, about = "HDRI world graph synthesizer", long_about = None)]
struct Cli {
    /// Preferences file
    #[arg(long, value_name = "FILE", default_value = "gaffer_prefs.json", global = true)]
    prefs: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan folders for HDRI files and write the catalog
    Scan {
        /// Folders to scan (defaults to the folders in preferences)
        #[arg(value_name = "DIR")]
        dirs: Vec<PathBuf>,

        /// Catalog file to write (defaults to the preferences catalog path)
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Build the world graph for one image and print it
    Build {
        /// Catalog file (defaults to the preferences catalog path)
        #[arg(short, long, value_name = "FILE")]
        catalog: Option<PathBuf>,

        /// Logical image name (defaults to the first catalog entry)
        #[arg(short, long, value_name = "NAME")]
        image: Option<String>,

        /// Look parameters JSON file
        #[arg(short, long, value_name = "FILE")]
        look: Option<PathBuf>,

        /// Variant: "smallest", "biggest" or an exact catalog path
        #[arg(long, value_name = "VARIANT")]
        variant: Option<VariantRequest>,

        /// Print the graph as JSON
        #[arg(long)]
        json: bool,
    },

    /// List look parameters with their ranges and defaults
    Params,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scan { dirs, out } => cmd_scan(&cli.prefs, dirs, out),
        Commands::Build {
            catalog,
            image,
            look,
            variant,
            json,
        } => cmd_build(&cli.prefs, catalog, image, look, variant, json),
        Commands::Params => {
            cmd_params();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_scan(prefs_path: &Path, dirs: Vec<PathBuf>, out: Option<PathBuf>) -> gaffer::Result<()> {
    let prefs = Preferences::load_or_default(prefs_path)?;
    let roots = if dirs.is_empty() {
        prefs.hdri_folders.clone()
    } else {
        dirs
    };
    let out = out.unwrap_or(prefs.catalog_path);

    let mut ctx = CatalogContext::open(&out)?;
    ctx.rescan(&roots)?;
    ctx.save()?;

    info!("scanned {} folder(s)", roots.len());
    println!(
        "{} image(s) written to {}",
        ctx.catalog().len(),
        ctx.path().display()
    );
    Ok(())
}

fn cmd_build(
    prefs_path: &Path,
    catalog: Option<PathBuf>,
    image: Option<String>,
    look_path: Option<PathBuf>,
    variant: Option<VariantRequest>,
    json: bool,
) -> gaffer::Result<()> {
    let prefs = Preferences::load_or_default(prefs_path)?;
    let ctx = CatalogContext::open(catalog.unwrap_or(prefs.catalog_path.clone()))?;

    let image = match image {
        Some(name) => name,
        None if prefs.auto_select_first => ctx
            .catalog()
            .names()
            .next()
            .map(str::to_string)
            .ok_or_else(|| GafferError::VariantNotFound {
                name: "<first>".to_string(),
                variant: prefs.default_variant.to_string(),
            })?,
        None => {
            return Err(GafferError::VariantNotFound {
                name: "<none>".to_string(),
                variant: prefs.default_variant.to_string(),
            });
        }
    };
    let request = variant.unwrap_or(prefs.default_variant);

    let mut look = HdriLook::new();
    if let Some(path) = look_path {
        let text = std::fs::read_to_string(&path).map_err(|source| GafferError::Io {
            path: path.clone(),
            source,
        })?;
        let params: LookParameters = serde_json::from_str(&text)?;
        look.set_parameters(params)?;
    }

    let bound = look.enable(ctx.catalog(), &image, &request)?;
    if look.needs_attention() {
        eprintln!("Warning: requested variant '{}' not found, bound {}", request, bound);
    }

    if json {
        println!("{}", look.graph().to_json()?);
        return Ok(());
    }

    let graph = look.graph();
    let live = graph
        .find_stage(&StageKind::FinalOutput.stage_name(Variant::Foreground))
        .map(|output| graph.upstream_of(output))
        .unwrap_or_default();

    println!("{} -> {}", image, bound);
    for id in graph.evaluation_order()? {
        let stage = graph.stage(id)?;
        let muted = if stage.muted { " (muted)" } else { "" };
        let detached = if live.contains(&id) { "" } else { " (detached)" };
        match &stage.image {
            Some(img) => println!("  {}{}{} [{}]", stage.name, muted, detached, img),
            None => println!("  {}{}{}", stage.name, muted, detached),
        }
    }
    println!("{} link(s)", graph.links.len());
    Ok(())
}

fn cmd_params() {
    let defaults = LookParameters::default();
    for param in LookParam::all() {
        let info = param.info();
        println!(
            "{:<32} {:<24} {}",
            info.name,
            info.label,
            match defaults.get(param) {
                gaffer::ParamValue::Float(v) => format!("{} [{}, {}]", info.format(v), info.min, info.max),
                gaffer::ParamValue::Toggle(b) => b.to_string(),
            }
        );
    }
}
