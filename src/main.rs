//! rxnpredict CLI
//!
//! Applies a named reaction template to reactant SMILES and writes the
//! product and template depictions as SVG files.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rxnpredict::{Depiction, Predictor, Settings, TemplateCatalog};
use tracing_subscriber::EnvFilter;

/// Reactant text offered by the interactive prompt.
const DEFAULT_REACTANTS: &str = "c1ccccc1 + BrBr";

/// Chemical reaction predictor
///
/// Applies SMARTS reaction templates to reactant molecules given as SMILES
/// joined by `+`, and renders the distinct products.
#[derive(Parser, Debug)]
#[command(name = "rxnpredict")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: rxnpredict.toml in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Extra catalog file (.toml or .json) extending the built-in templates
    #[arg(long, value_name = "FILE", global = true)]
    catalog: Option<PathBuf>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Predict the products of one reaction
    Predict {
        /// Reactant SMILES joined by `+`, e.g. "c1ccccc1 + BrBr"
        #[arg(value_name = "REACTANTS")]
        reactants: String,

        /// Reaction name from the catalog
        #[arg(short, long, value_name = "NAME")]
        reaction: String,

        /// Directory for product_N.svg and template.svg
        #[arg(short, long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Skip rendering and only print the products
        #[arg(long)]
        no_images: bool,
    },
    /// List the available reactions
    List {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one reaction template and draw its schematic
    Show {
        /// Reaction name from the catalog
        #[arg(value_name = "NAME")]
        name: String,

        /// Write the schematic SVG to this file
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Prompt for reactants and reactions until end of input
    Interactive,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(catalog) = args.catalog {
        settings.catalog = Some(catalog);
    }
    settings.validate()?;
    tracing::debug!(settings = ?settings, "Effective settings");

    let catalog = settings.build_catalog()?;
    tracing::debug!(templates = catalog.len(), "Catalog ready");
    let predictor = Predictor::new(&catalog).with_render_options(settings.render);

    match args.command {
        Command::Predict {
            reactants,
            reaction,
            out_dir,
            json,
            no_images,
        } => {
            let out_dir = out_dir.unwrap_or_else(|| settings.output_dir.clone());
            predict(&predictor, &reactants, &reaction, &out_dir, json, no_images)
        }
        Command::List { json } => list(&catalog, json),
        Command::Show { name, out } => show(&predictor, &name, out.as_deref()),
        Command::Interactive => interactive(&predictor, &settings.output_dir),
    }
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let settings = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("config file not found: {}", path.display());
            }
            Settings::load_from_file(path)?
        }
        None => Settings::load()?,
    };
    Ok(settings)
}

fn predict(
    predictor: &Predictor<'_>,
    reactants: &str,
    reaction: &str,
    out_dir: &Path,
    json: bool,
    no_images: bool,
) -> anyhow::Result<()> {
    if no_images {
        let products = predictor.predict(reactants, reaction)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&products)?);
        } else {
            print_products(products.iter());
        }
        return Ok(());
    }

    let prediction = predictor.run(reactants, reaction)?;
    let written = write_images(
        out_dir,
        prediction.images.iter().map(|p| &p.depiction),
        &prediction.schematic,
    )?;
    if json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
    } else {
        print_products(prediction.products.iter());
        for path in &written {
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

fn print_products<'a>(products: impl Iterator<Item = &'a str>) {
    for (i, smiles) in products.enumerate() {
        println!("{:>3}. {smiles}", i + 1);
    }
}

/// Writes `product_N.svg` (from 1) and `template.svg`.
fn write_images<'a>(
    out_dir: &Path,
    products: impl Iterator<Item = &'a Depiction>,
    schematic: &Depiction,
) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;
    let mut written = Vec::new();
    for (i, depiction) in products.enumerate() {
        let path = out_dir.join(format!("product_{}.svg", i + 1));
        write_svg(&path, depiction)?;
        written.push(path);
    }
    let path = out_dir.join("template.svg");
    write_svg(&path, schematic)?;
    written.push(path);
    Ok(written)
}

fn write_svg(path: &Path, depiction: &Depiction) -> anyhow::Result<()> {
    std::fs::write(path, &depiction.svg)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Wrote image");
    Ok(())
}

fn list(catalog: &TemplateCatalog, json: bool) -> anyhow::Result<()> {
    if json {
        let entries: indexmap::IndexMap<&str, &str> = catalog.iter().collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    let width = catalog.names().map(str::len).max().unwrap_or(0);
    for (name, template) in catalog.iter() {
        println!("{name:<width$}  {template}");
    }
    Ok(())
}

fn show(predictor: &Predictor<'_>, name: &str, out: Option<&Path>) -> anyhow::Result<()> {
    let catalog = predictor.catalog();
    let template = catalog
        .lookup(name)
        .ok_or_else(|| rxnpredict::PredictError::UnknownTemplate {
            name: name.to_owned(),
        })?;
    let schematic = predictor.render_template(name)?;
    let parsed = rxnpredict::from_reaction_smarts(template)?;
    println!("{name}");
    println!("  template:  {template}");
    println!("  reactants: {}", parsed.reactant_count());
    println!("  products:  {}", parsed.product_templates().len());
    if let Some(out) = out {
        write_svg(out, &schematic)?;
        println!("wrote {}", out.display());
    }
    Ok(())
}

fn interactive(predictor: &Predictor<'_>, out_dir: &Path) -> anyhow::Result<()> {
    let names: Vec<&str> = predictor.catalog().names().collect();
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let Some(reactants) = prompt(&mut lines, &format!("Reactants [{DEFAULT_REACTANTS}]: "))?
        else {
            return Ok(());
        };
        let reactants = if reactants.is_empty() {
            DEFAULT_REACTANTS.to_owned()
        } else {
            reactants
        };
        if matches!(reactants.as_str(), "q" | "quit" | "exit") {
            return Ok(());
        }

        for (i, name) in names.iter().enumerate() {
            println!("{:>3}. {name}", i + 1);
        }
        let Some(choice) = prompt(&mut lines, "Reaction [1]: ")? else {
            return Ok(());
        };
        let Some(name) = select(&names, &choice) else {
            eprintln!("Error: no reaction '{choice}'");
            continue;
        };

        match predictor.run(&reactants, name) {
            Ok(prediction) => {
                print_products(prediction.products.iter());
                let written = write_images(
                    out_dir,
                    prediction.images.iter().map(|p| &p.depiction),
                    &prediction.schematic,
                )?;
                for path in &written {
                    println!("wrote {}", path.display());
                }
            }
            Err(e) => eprintln!("Error: {e}"),
        }
    }
}

/// Prints `message` and reads one trimmed line; `None` at end of input.
fn prompt(
    lines: &mut impl Iterator<Item = std::io::Result<String>>,
    message: &str,
) -> anyhow::Result<Option<String>> {
    print!("{message}");
    std::io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(Some(line?.trim().to_owned())),
        None => Ok(None),
    }
}

/// Resolves a 1-based number or an exact name. Empty input picks the first.
fn select<'a>(names: &[&'a str], choice: &str) -> Option<&'a str> {
    if choice.is_empty() {
        return names.first().copied();
    }
    if let Ok(n) = choice.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| names.get(i)).copied();
    }
    names.iter().find(|name| **name == choice).copied()
}
