use branch_locator::{
    cli::{Cli, Commands},
    config::Config,
    directions::directions_url,
    location::{self, CachedSource, LocationSource},
    logging,
    report::{branch_table, BranchReport},
    BranchFinder, Coordinate, Facility, FacilityRegistry, RegistryError, Resolver,
};
use clap::Parser;
use color_eyre::Result;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, config_problems) = Config::load(&cli.config);

    // Instrumentation and error reporting
    let _log_guard = logging::initialize_logging(&config.logging.directory, &config.logging.file);
    color_eyre::install()?;

    // The log file is easy to miss, so config problems also go to stderr
    for problem in &config_problems {
        warn!("{}", problem);
        eprintln!("warning: {problem}");
    }

    // One registry for the whole process; every consumer gets a clone of it
    let registry = match &config.registry.path {
        Some(path) => FacilityRegistry::load(path)?,
        None => FacilityRegistry::builtin(),
    };
    let resolver = Resolver::new(registry);
    let maps = config.directions.base_url.as_str();

    match cli.command {
        Commands::Nearest { lat, lon } => {
            let position = Coordinate::try_new(lat, lon)?;
            let resolution = resolver.resolve(position)?;
            emit(cli.json, &BranchReport::from_resolution(&resolution, position, maps))?;
        }
        Commands::Locate => {
            let finder = build_finder(&config, resolver)?;
            let lookup = finder.find().await?;
            emit(cli.json, &BranchReport::from_lookup(&lookup, maps))?;
        }
        Commands::Watch { interval } => {
            let finder = build_finder(&config, resolver)?;
            let every = Duration::from_secs(interval.max(1));
            // The cached source only reaches the provider once the previous
            // fix has gone stale.
            let interrupted = async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Interrupted, stopping watch.");
            };
            finder
                .watch(every, interrupted, |lookup| {
                    emit(cli.json, &BranchReport::from_lookup(lookup, maps))?;
                    if !cli.json {
                        println!();
                    }
                    Ok::<_, color_eyre::Report>(())
                })
                .await?;
        }
        Commands::List { lat, lon } => {
            let rows: Vec<(&Facility, Option<f64>)> = match (lat, lon) {
                (Some(lat), Some(lon)) => resolver
                    .rank(Coordinate::try_new(lat, lon)?)
                    .into_iter()
                    .map(|r| (r.facility, Some(r.distance_km)))
                    .collect(),
                _ => resolver.registry().iter().map(|f| (f, None)).collect(),
            };
            if cli.json {
                let rows: Vec<_> = rows
                    .iter()
                    .map(|(branch, distance_km)| json!({ "branch": branch, "distance_km": distance_km }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print!("{}", branch_table(rows));
            }
        }
        Commands::Directions { id } => {
            let facility = resolver
                .registry()
                .get(&id)
                .ok_or_else(|| RegistryError::UnknownFacility(id.clone()))?;
            let url = directions_url(maps, facility);
            if cli.json {
                println!("{}", json!({ "id": facility.id, "directions": url }));
            } else {
                println!("{url}");
            }
        }
    }

    Ok(())
}

fn build_finder(
    config: &Config,
    resolver: Resolver,
) -> Result<BranchFinder<CachedSource<Box<dyn LocationSource>>>> {
    let source = CachedSource::new(
        location::source_from_config(&config.location)?,
        config.location.max_age(),
    );
    let mut finder = BranchFinder::new(source, resolver).with_timeout(config.location.timeout());
    if let Some(id) = &config.registry.fallback_id {
        finder = finder.with_fallback(id.clone())?;
    }
    Ok(finder)
}

fn emit(json: bool, report: &BranchReport<'_>) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", report.to_text());
    }
    Ok(())
}
