// =============================================================================
// OPENCONTROL — Point d'entrée en ligne de commande
// =============================================================================
//
//   opencontrol --datadir ./opencontrols list
//   opencontrol sitemap --format json
//   opencontrol control NIST-800-53 AC-1
//   opencontrol component AU_policy
//   opencontrol nav /standards/NIST-800-53
//
// Le niveau de log vient de RUST_LOG (défaut : warn) ; -v passe en debug.
//
// =============================================================================

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use opencontrol::core::{nest, Database};
use opencontrol::nav::NodeRef;
use opencontrol::query::{ComponentPage, ControlPage, PopulatedSatisfaction};
use opencontrol::{build_sitemap, find_component, find_control, load, Error};

#[derive(Parser)]
#[command(name = "opencontrol")]
#[command(version)]
#[command(about = "Browse OpenControl compliance data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to opencontrols data
    #[arg(short, long, global = true, env = "OPENCONTROL_DATADIR", default_value = "./opencontrols")]
    datadir: PathBuf,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    format: OutputFormat,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List all OpenControl artefacts
    #[command(alias = "ls")]
    List,

    /// Print the navigation tree
    Sitemap,

    /// Show a control with its satisfactions and certifications
    Control { standard: String, control: String },

    /// Show a component with its satisfactions
    Component { key: String },

    /// Show navigation context for a path
    Nav { path: String },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = if verbose > 0 {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            let not_found = err
                .downcast_ref::<Error>()
                .map(Error::is_not_found)
                .unwrap_or(false);
            if not_found {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let db = load::load(&cli.datadir)
        .with_context(|| format!("loading {}", cli.datadir.display()))?;

    match &cli.command {
        Commands::List => list(&db, cli.format),
        Commands::Sitemap => {
            let site = build_sitemap(&db)?;
            match cli.format {
                OutputFormat::Json => print_json(&site),
                OutputFormat::Text => {
                    print_tree(site.root(), 0);
                    Ok(())
                }
            }
        }
        Commands::Control { standard, control } => {
            let page = find_control(&db, standard, control)?;
            match cli.format {
                OutputFormat::Json => print_json(&page),
                OutputFormat::Text => {
                    print_control(&page);
                    Ok(())
                }
            }
        }
        Commands::Component { key } => {
            let page = find_component(&db, key)?;
            match cli.format {
                OutputFormat::Json => print_json(&page),
                OutputFormat::Text => {
                    print_component(&page);
                    Ok(())
                }
            }
        }
        Commands::Nav { path } => {
            let site = build_sitemap(&db)?;
            let nav = site.require(path)?;
            match cli.format {
                OutputFormat::Json => print_json(&nav),
                OutputFormat::Text => {
                    let crumbs: Vec<&str> = nav.breadcrumbs.iter().map(|n| n.label()).collect();
                    println!("{} > {}", crumbs.join(" > "), nav.node.label());
                    for child in &nav.children {
                        println!("  {}  {}", child.path(), child.title().unwrap_or(child.label()));
                    }
                    Ok(())
                }
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct Listing<'a> {
    components: Vec<&'a str>,
    standards: Vec<(String, usize)>,
    certifications: Vec<(String, usize)>,
}

fn list(db: &Database, format: OutputFormat) -> anyhow::Result<()> {
    let by_standard = nest(db.controls().iter().collect(), &["standard_key"]);
    let listing = Listing {
        components: db.components().iter().map(|c| c.key.as_str()).collect(),
        standards: by_standard
            .entries()
            .iter()
            .map(|(k, n)| (k.to_string(), n.leaf_count()))
            .collect(),
        certifications: db
            .certifications()
            .chain()
            .group_by("certification")
            .iter()
            .map(|(k, rows)| (k.to_string(), rows.len()))
            .collect(),
    };

    match format {
        OutputFormat::Json => print_json(&listing),
        OutputFormat::Text => {
            println!("Components ({}):", listing.components.len());
            for key in &listing.components {
                println!("  {}", key);
            }
            println!("Standards ({}):", listing.standards.len());
            for (name, n) in &listing.standards {
                println!("  {} ({} controls)", name, n);
            }
            println!("Certifications ({}):", listing.certifications.len());
            for (name, n) in &listing.certifications {
                println!("  {} ({} controls)", name, n);
            }
            Ok(())
        }
    }
}

fn print_tree(node: NodeRef<'_>, depth: usize) {
    if !node.is_root() {
        println!(
            "{}{}  {}",
            "  ".repeat(depth - 1),
            node.title().unwrap_or(node.label()),
            node.path()
        );
    }
    for child in node.children() {
        print_tree(child, depth + 1);
    }
}

fn print_satisfaction(sat: &PopulatedSatisfaction<'_>, show_component: bool) {
    let s = sat.satisfaction;
    if show_component {
        let name = sat.component.map(|c| c.name.as_str()).unwrap_or("(unknown component)");
        println!("  {} - {}", s.component_key, name);
    } else {
        let name = sat.control.map(|c| c.name.as_str()).unwrap_or("(unknown control)");
        println!("  {} {} - {}", s.standard_key, s.control_key, name);
    }
    for (key, text) in s.narrative.parts() {
        match key {
            Some(k) => println!("      [{}] {}", k, text.trim()),
            None => println!("      {}", text.trim()),
        }
    }
}

fn print_control(page: &ControlPage<'_>) {
    let c = page.control;
    println!("{} {} - {}", c.standard_key, c.key, c.name);
    println!("family: {}", c.family);
    if !c.description.is_empty() {
        println!("\n{}\n", c.description.trim());
    }
    println!("Satisfied by ({}):", page.satisfied.len());
    for sat in &page.satisfied {
        print_satisfaction(sat, true);
    }
    println!("Certifications ({}):", page.certifications.len());
    for cert in &page.certifications {
        println!("  {}", cert.certification);
    }
}

fn print_component(page: &ComponentPage<'_>) {
    let c = page.component;
    println!("{} - {}", c.key, c.name);
    if let Some(system) = &c.system {
        println!("system: {}", system);
    }
    println!("Satisfies ({}):", page.satisfies.len());
    for sat in &page.satisfies {
        print_satisfaction(sat, false);
    }
}
