#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the NJ Safe Drinking Water explorer.
//!
//! Each dashboard page is a subcommand that prints its charts and a table
//! preview and can save the page's CSV. Without a subcommand the tool asks
//! which page and area to show. `serve` starts the API server.
//!
//! Uses `indicatif-log-bridge` (via [`nj_sdwa_cli_utils::init_logger`]) so
//! log lines and spinners never fight for the terminal.

mod output;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use dialoguer::{Input, Select};
use nj_sdwa_cli_utils::{MultiProgress, Spinner, prompt_region};
use nj_sdwa_dashboard::{Dashboard, DashboardConfig, PageError};
use nj_sdwa_models::{EjMeasure, Region, RegionRequest};
use nj_sdwa_server_models::PageQueryParams;

#[derive(Parser)]
#[command(name = "nj_sdwa", about = "NJ Safe Drinking Water explorer")]
struct Cli {
    /// Configuration file (defaults to `NJ_SDWA_CONFIG` or the built-in one)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Where to look. Without any of these the default box over northern New
/// Jersey is used.
#[derive(Args, Default)]
struct RegionArgs {
    /// Bounding box as `west,south,east,north`
    #[arg(long, allow_hyphen_values = true)]
    bbox: Option<String>,
    /// File holding a drawn polygon as `GeoJSON`
    #[arg(long)]
    geojson: Option<PathBuf>,
    /// Dropped marker as `lat,lng`
    #[arg(long, allow_hyphen_values = true)]
    point: Option<String>,
    /// Radius around `--point` in kilometers
    #[arg(long)]
    radius_km: Option<f64>,
}

#[derive(Args, Default)]
struct OutputArgs {
    /// Write the page's table to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Print the whole page as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Every public water system in the state
    Overview {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Systems located in or serving an area
    Systems {
        #[command(flatten)]
        region: RegionArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Safe Drinking Water Act violations since 2001
    Violations {
        #[command(flatten)]
        region: RegionArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// `EJScreen` indicators for the area's block groups
    Ej {
        #[command(flatten)]
        region: RegionArgs,
        /// Socioeconomic column, e.g. `LOWINCPCT`
        #[arg(long)]
        socio: Option<String>,
        /// Environmental column, e.g. `PM25`
        #[arg(long)]
        env: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Lead service lines per purveyor service area
    Lead {
        #[command(flatten)]
        region: RegionArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Pollutant discharges in the area's watersheds
    Watershed {
        #[command(flatten)]
        region: RegionArgs,
        /// Pollutant (`PARAMETER_DESC`); defaults to the most reported one
        #[arg(long)]
        pollutant: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Start the API server
    Serve,
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => DashboardConfig::from_file(path)?,
        None => DashboardConfig::load()?,
    };
    if path.is_some() {
        config.apply_overrides(|name| std::env::var(name).ok());
    }
    Ok(config)
}

/// Turns the region flags into a request, falling back to the default box.
fn region_request(args: &RegionArgs) -> Result<RegionRequest, Box<dyn std::error::Error>> {
    let geojson = args
        .geojson
        .as_deref()
        .map(std::fs::read_to_string)
        .transpose()?;
    let params = PageQueryParams {
        bbox: args.bbox.clone(),
        point: args.point.clone(),
        radius_km: args.radius_km,
        geojson,
        ..PageQueryParams::default()
    };
    Ok(params
        .region_request()?
        .unwrap_or_else(|| RegionRequest::BoundingBox {
            bbox: Region::default_box().bounding_box(),
        }))
}

fn measure(value: Option<&str>) -> Result<Option<EjMeasure>, PageError> {
    value
        .map(|v| {
            EjMeasure::from_column(v).ok_or_else(|| PageError::InvalidMeasure {
                measure: v.to_string(),
            })
        })
        .transpose()
}

#[allow(clippy::too_many_lines)]
async fn run_page(
    dashboard: &Dashboard,
    multi: &MultiProgress,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Overview { output } => {
            let spinner = Spinner::start(multi, "Loading statewide systems...");
            let page = dashboard.statewide_overview().await?;
            spinner.clear();
            let charts: Vec<_> = page.charts.iter().collect();
            output::report(&page, &charts, output.csv.as_deref(), output.json)?;
        }
        Commands::Systems { region, output } => {
            let region = dashboard.resolve_region(&region_request(&region)?)?;
            let spinner = Spinner::start(multi, "Finding systems...");
            let page = dashboard.find_systems(&region).await?;
            spinner.finish(format!(
                "{} systems, {} service areas",
                page.table.len(),
                page.service_area_count
            ));
            let charts: Vec<_> = page.charts.iter().collect();
            output::report(&page, &charts, output.csv.as_deref(), output.json)?;
        }
        Commands::Violations { region, output } => {
            let region = dashboard.resolve_region(&region_request(&region)?)?;
            let spinner = Spinner::start(multi, "Loading violations...");
            let page = dashboard.violations(&region).await?;
            spinner.finish(format!("{} systems", page.counts.len()));
            output::report(&page, &[&page.chart], output.csv.as_deref(), output.json)?;
        }
        Commands::Ej {
            region,
            socio,
            env,
            output,
        } => {
            let socio = measure(socio.as_deref())?;
            let env = measure(env.as_deref())?;
            let region = dashboard.resolve_region(&region_request(&region)?)?;
            let spinner = Spinner::start(multi, "Loading EJScreen indicators...");
            let page = dashboard.environmental_justice(&region, socio, env).await?;
            spinner.clear();
            if !output.json {
                for panel in [&page.socioeconomic, &page.environmental] {
                    println!("{} ({})", panel.label, panel.measure);
                    println!("  {}", panel.definition);
                }
                println!();
            }
            output::report(&page, &[], output.csv.as_deref(), output.json)?;
        }
        Commands::Lead { region, output } => {
            let region = dashboard.resolve_region(&region_request(&region)?)?;
            let spinner = Spinner::start(multi, "Loading lead service lines...");
            let page = dashboard.lead_service_lines(&region).await?;
            spinner.clear();
            output::report(&page, &[&page.chart], output.csv.as_deref(), output.json)?;
        }
        Commands::Watershed {
            region,
            pollutant,
            output,
        } => {
            let region = dashboard.resolve_region(&region_request(&region)?)?;
            let spinner = Spinner::start(multi, "Loading watershed discharges...");
            let page = dashboard
                .watershed_pollution(&region, pollutant.as_deref())
                .await?;
            spinner.finish(format!("{} watersheds", page.watersheds.len()));
            output::report(
                &page,
                &[&page.top_pollutants, &page.totals],
                output.csv.as_deref(),
                output.json,
            )?;
        }
        Commands::Serve => unreachable!("serve is handled before pages"),
    }
    Ok(())
}

/// Pages offered when no subcommand is given.
const PAGES: &[&str] = &[
    "Statewide overview",
    "Find systems",
    "Violations",
    "Environmental justice",
    "Lead service lines",
    "Watershed discharges",
    "Start server",
];

/// Asks which page and area to show and builds the matching command.
fn prompt_command() -> Result<Commands, Box<dyn std::error::Error>> {
    let idx = Select::new()
        .with_prompt("What would you like to see?")
        .items(PAGES)
        .default(0)
        .interact()?;

    if idx == 0 {
        return Ok(Commands::Overview {
            output: OutputArgs::default(),
        });
    }
    if idx == PAGES.len() - 1 {
        return Ok(Commands::Serve);
    }

    let region = match prompt_region()? {
        RegionRequest::Point { lat, lng, radius_km } => RegionArgs {
            point: Some(format!("{lat},{lng}")),
            radius_km,
            ..RegionArgs::default()
        },
        RegionRequest::BoundingBox { bbox } => RegionArgs {
            bbox: Some(bbox.to_string()),
            ..RegionArgs::default()
        },
        _ => RegionArgs::default(),
    };
    let csv: String = Input::new()
        .with_prompt("Save CSV to (leave empty to skip)")
        .allow_empty(true)
        .interact_text()?;
    let output = OutputArgs {
        csv: Some(PathBuf::from(csv)).filter(|p| !p.as_os_str().is_empty()),
        json: false,
    };

    Ok(match idx {
        1 => Commands::Systems { region, output },
        2 => Commands::Violations { region, output },
        3 => Commands::Ej {
            region,
            socio: None,
            env: None,
            output,
        },
        4 => Commands::Lead { region, output },
        _ => Commands::Watershed {
            region,
            pollutant: None,
            output,
        },
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = nj_sdwa_cli_utils::init_logger();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let (command, interactive) = match cli.command {
        Some(command) => (command, false),
        None => (prompt_command()?, true),
    };

    if matches!(command, Commands::Serve) {
        // The server uses actix-web's runtime, so run it in a blocking task
        // to avoid nesting tokio runtimes.
        tokio::task::spawn_blocking(move || {
            actix_web::rt::System::new().block_on(async move {
                if interactive {
                    nj_sdwa_server::interactive::run(config).await
                } else {
                    nj_sdwa_server::run_server(config).await
                }
            })
        })
        .await??;
        return Ok(());
    }

    let dashboard = Dashboard::remote(config);
    run_page(&dashboard, &multi, command).await
}

#[cfg(test)]
mod tests {
    use nj_sdwa_models::BoundingBox;

    use super::*;

    #[test]
    fn no_flags_means_default_box() {
        let request = region_request(&RegionArgs::default()).unwrap();
        assert_eq!(
            request,
            RegionRequest::BoundingBox {
                bbox: Region::default_box().bounding_box()
            }
        );
    }

    #[test]
    fn bbox_flag() {
        let args = RegionArgs {
            bbox: Some("-74.2,40.9,-74.1,41.0".to_string()),
            ..RegionArgs::default()
        };
        assert_eq!(
            region_request(&args).unwrap(),
            RegionRequest::BoundingBox {
                bbox: BoundingBox::new(-74.2, 40.9, -74.1, 41.0)
            }
        );
    }

    #[test]
    fn point_flag_with_radius() {
        let args = RegionArgs {
            point: Some("40.9,-74.2".to_string()),
            radius_km: Some(3.0),
            ..RegionArgs::default()
        };
        assert!(matches!(
            region_request(&args).unwrap(),
            RegionRequest::Point {
                radius_km: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn measure_names() {
        assert_eq!(measure(Some("pm25")).unwrap(), Some(EjMeasure::Pm25));
        assert!(measure(Some("nope")).is_err());
        assert_eq!(measure(None).unwrap(), None);
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "nj_sdwa",
            "watershed",
            "--bbox",
            "-74.2,40.9,-74.1,41.0",
            "--pollutant",
            "Zinc",
            "--csv",
            "out.csv",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Watershed {
                region,
                pollutant,
                output,
            }) => {
                assert_eq!(region.bbox.as_deref(), Some("-74.2,40.9,-74.1,41.0"));
                assert_eq!(pollutant.as_deref(), Some("Zinc"));
                assert_eq!(output.csv, Some(PathBuf::from("out.csv")));
            }
            _ => panic!("expected the watershed command"),
        }
    }
}
