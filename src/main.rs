use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use shelterfinder::api::{DirectoryClient, HttpClient, NewsClient, PlacesClient};
use shelterfinder::geo;
use shelterfinder::location_resolver::{FixedLocationProvider, LocationParser};
use shelterfinder::logging;
use shelterfinder::models::{GeoPoint, ShelterProposalDraft};
use shelterfinder::navigation;
use shelterfinder::{ShelterFinder, ShelterFinderConfig, ShelterFinderError};

/// Disaster-relief shelter finder: nearest shelters, shelter details and news
#[derive(Debug, Parser)]
#[command(name = "shelterfinder", version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print debug diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Great-circle distance between two points
    Distance {
        /// Start point as "lat,lon"
        #[arg(long, allow_hyphen_values = true)]
        from: String,
        /// End point as "lat,lon"
        #[arg(long, allow_hyphen_values = true)]
        to: String,
    },
    /// Find the shelter closest to you
    Nearest {
        /// Your location as "lat,lon"
        #[arg(long, allow_hyphen_values = true)]
        location: Option<String>,
    },
    /// List shelters around you, closest first
    Shelters {
        #[arg(long, allow_hyphen_values = true)]
        location: Option<String>,
        /// Search radius in km
        #[arg(long)]
        radius: Option<f64>,
        /// Maximum number of shelters to list
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Distance, resources and contact details for one shelter
    Details {
        /// Shelter name as listed by the directory
        #[arg(long)]
        name: String,
        #[arg(long, allow_hyphen_values = true)]
        location: Option<String>,
    },
    /// Propose a new shelter for verification
    Propose {
        #[arg(long)]
        name: String,
        /// Shelter location as "lat,lon"
        #[arg(long, allow_hyphen_values = true)]
        location: Option<String>,
        /// Number of available beds
        #[arg(long, default_value = "")]
        beds: String,
        #[arg(long)]
        food: bool,
        #[arg(long)]
        water: bool,
        #[arg(long)]
        electricity: bool,
        #[arg(long)]
        first_aid: bool,
    },
    /// Shelters proposed by users that await verification
    Unverified,
    /// Latest news, newest first
    News {
        /// Search query, defaults to news.default_query
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn parse_optional_location(input: Option<&str>) -> Result<Option<GeoPoint>> {
    input
        .map(LocationParser::parse)
        .transpose()
        .map_err(Into::into)
}

fn print_banner(config: &ShelterFinderConfig, cli: &Cli) {
    println!("ShelterFinder v{}", shelterfinder::VERSION);
    println!("Find the nearest disaster-relief shelter, shelter details and news.");
    println!();
    println!("Try: shelterfinder nearest --location 33.7756,-84.3963");
    println!("     shelterfinder --help");

    if config.places.api_key.is_none() {
        println!("Hint: set SHELTERFINDER_PLACES__API_KEY to enable shelter contact details.");
    }
    if config.news.api_key.is_none() {
        println!("Hint: set SHELTERFINDER_NEWS__API_KEY to enable the news feed.");
    }

    if cli.verbose {
        let path = cli
            .config
            .clone()
            .or_else(ShelterFinderConfig::get_config_path)
            .map_or_else(|| "defaults".to_string(), |p| p.display().to_string());
        println!();
        println!("Using config from: {path}");
        println!("Directory API: {}", config.directory.base_url);
        println!("Log level: {}", config.logging.level);
    }
}

async fn run(cli: &Cli, config: ShelterFinderConfig) -> Result<()> {
    let Some(command) = &cli.command else {
        print_banner(&config, cli);
        return Ok(());
    };

    let http = HttpClient::new(config.directory.timeout_seconds, config.directory.max_retries)?;
    let directory = Arc::new(DirectoryClient::new(http.clone(), &config.directory));

    match command {
        Command::Distance { from, to } => {
            let from = LocationParser::parse(from)?;
            let to = LocationParser::parse(to)?;
            println!("Distance: {}", geo::distance(from, to).format());
        }
        Command::Nearest { location } => {
            let origin = parse_optional_location(location.as_deref())?;
            let finder = ShelterFinder::new(Arc::new(FixedLocationProvider::new(origin)), directory);

            match finder.find_nearest().await? {
                Some(found) => {
                    println!("Nearest shelter: {}", found.shelter.name);
                    println!("  Coordinates: {}", found.shelter.point.format_coordinates());
                    println!("  Distance:    {}", found.distance.format());
                    println!(
                        "  Directions:  {}",
                        navigation::maps_search_url(found.shelter.point)
                    );
                }
                None => println!("No shelters found."),
            }
        }
        Command::Shelters {
            location,
            radius,
            limit,
        } => {
            let origin = parse_optional_location(location.as_deref())?;
            let radius = radius.unwrap_or(f64::from(config.defaults.search_radius_km));
            let limit = limit.unwrap_or(config.defaults.max_results as usize);
            let finder = ShelterFinder::new(Arc::new(FixedLocationProvider::new(origin)), directory);

            let nearby = finder.nearby(radius, limit).await?;
            if nearby.is_empty() {
                println!("No shelters within {radius} km.");
            }
            for (i, found) in nearby.iter().enumerate() {
                println!(
                    "{:>2}. {} ({})",
                    i + 1,
                    found.shelter.name,
                    found.distance.format()
                );
            }
        }
        Command::Details { name, location } => {
            let origin = parse_optional_location(location.as_deref())?;
            let mut finder =
                ShelterFinder::new(Arc::new(FixedLocationProvider::new(origin)), directory);
            match PlacesClient::new(http.clone(), &config.places) {
                Ok(places) => finder = finder.with_places(Arc::new(places)),
                Err(e) => warn!("Contact details disabled: {}", e),
            }

            let overview = finder.shelter_overview(name).await?;
            println!("{}", overview.shelter.name);
            match overview.distance {
                Some(distance) => println!("  Distance:  {}", distance.format()),
                None => println!("  Distance:  unknown (pass --location)"),
            }
            if let Some(place) = &overview.place {
                if let Some(address) = &place.formatted_address {
                    println!("  Address:   {address}");
                }
                if let Some(phone) = &place.formatted_phone_number {
                    println!("  Phone:     {phone}");
                }
                if let Some(website) = &place.website {
                    println!("  Website:   {website}");
                }
            }
            if let Some(photo) = &overview.photo_url {
                println!("  Photo:     {photo}");
            }
            match &overview.resources {
                Some(r) => println!(
                    "  Resources: beds {}, food {}, water {}, electricity {}, first aid {}",
                    r.beds, r.food, r.water, r.electricity, r.first_aid
                ),
                None => println!("  Resources: not reported"),
            }
            println!("  Directions: {}", overview.maps_url);
            println!("  Apple Maps: {}", overview.apple_maps_url);
            println!("  Android:    {}", overview.geo_uri);
        }
        Command::Propose {
            name,
            location,
            beds,
            food,
            water,
            electricity,
            first_aid,
        } => {
            let draft = ShelterProposalDraft {
                name: name.clone(),
                location: parse_optional_location(location.as_deref())?,
                beds: beds.clone(),
                food: *food,
                water: *water,
                electricity: *electricity,
                first_aid: *first_aid,
            };
            let proposal = draft.validate().map_err(ShelterFinderError::from)?;
            debug!("Validated proposal: {:?}", proposal);

            let created = directory.propose_shelter(&proposal).await?;
            println!(
                "Submitted '{}' at {} for verification.",
                created.name,
                created.location.format_coordinates()
            );
        }
        Command::Unverified => {
            let shelters = directory.unverified_shelters().await?;
            if shelters.is_empty() {
                println!("No shelters awaiting verification.");
            }
            for shelter in &shelters {
                let a = &shelter.amenities;
                println!(
                    "- {} ({}) beds: {}, food: {}, water: {}, electricity: {}, first aid: {}",
                    shelter.name,
                    shelter.location.format_coordinates(),
                    a.number_of_beds,
                    a.food,
                    a.water,
                    a.electricity,
                    a.first_aid
                );
            }
        }
        Command::News { query, limit } => {
            let client = NewsClient::new(http, &config.news)?;
            let query = query.as_deref().unwrap_or(&config.news.default_query);
            let limit = limit.unwrap_or(config.defaults.max_results as usize);

            let articles = client.search(query).await?;
            if articles.is_empty() {
                println!("No news for '{query}'.");
            }
            for article in articles.iter().take(limit) {
                println!("{}", article.headline());
                println!("    {}", article.url);
            }
        }
    }

    Ok(())
}

fn report(error: &anyhow::Error, verbose: bool) {
    match error.downcast_ref::<ShelterFinderError>() {
        Some(e) => eprintln!("Error: {}", e.user_message()),
        None => eprintln!("Error: {error:#}"),
    }
    if verbose {
        eprintln!("{error:?}");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ShelterFinderConfig::load_from_path(cli.config.clone())
        .context("Failed to load configuration")
    {
        Ok(config) => config,
        Err(e) => {
            report(&e, cli.verbose);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.logging, cli.verbose) {
        eprintln!("Warning: {e:#}");
    }

    match run(&cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e, cli.verbose);
            ExitCode::FAILURE
        }
    }
}
