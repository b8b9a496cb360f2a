//! Command dispatch

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::application::services::{RefreshOutcome, RefreshReport, ViewOutcome};
use crate::application::ApplicationError;
use crate::cli::args::{BaselineCommands, Cli, Commands, ConfigCommands, Format};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::facet::ALL;
use crate::domain::{Facet, FacetSelection, PartnerType, SolutionSelection};
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::{InfraError, ServiceContainer};

pub fn execute(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Commands::Refresh { strict, format } => refresh(&container(cli)?, *strict, *format),
        Commands::View {
            partner_type,
            region,
            country,
            solution,
            product,
            format,
        } => {
            let selection = FacetSelection::default()
                .with_partner_type(partner_type.parse::<PartnerType>()?)
                .with_region(Facet::parse(region))
                .with_country(Facet::parse(country))
                .with_solutions(SolutionSelection::parse(solution)?)
                .with_product(Facet::parse(product));
            view(&container(cli)?, &selection, *format)
        }
        Commands::Options {
            region,
            solution,
            toggle,
        } => options(&container(cli)?, region, solution, toggle),
        Commands::Baseline { command } => match command {
            BaselineCommands::Freeze => baseline_freeze(&container(cli)?),
        },
        Commands::Config { command } => config(cli, command),
        Commands::Completion { shell } => completion(*shell),
    }
}

fn container(cli: &Cli) -> CliResult<ServiceContainer> {
    let settings = Settings::load(cli.config.as_deref())?;
    Ok(ServiceContainer::new(settings))
}

fn to_json(value: &impl serde::Serialize, context: &str) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| InfraError::serialization(context, e).into())
}

#[instrument(skip(container))]
fn refresh(container: &ServiceContainer, strict: bool, format: Format) -> CliResult<()> {
    match container.refresh.run() {
        RefreshOutcome::Completed(report) => {
            match format {
                Format::Json => output::info(&to_json(&report, "refresh report")?),
                Format::Table => print_report(&report),
            }
            Ok(())
        }
        RefreshOutcome::Skipped { stage, reason } => {
            output::warning(&format!(
                "refresh skipped at {} stage, previous cache kept: {}",
                stage, reason
            ));
            if strict {
                return Err(CliError::RefreshSkipped {
                    stage: stage.to_string(),
                    reason,
                });
            }
            Ok(())
        }
    }
}

fn print_report(report: &RefreshReport) {
    output::success(&format!("refresh completed at {}", report.completed_at));
    output::detail(&format!(
        "roster entries: {} ({} discarded)",
        report.roster_entries, report.discarded
    ));
    output::detail(&format!(
        "partners: {} ({} managed, {} placeholders)",
        report.partners, report.managed, report.placeholders
    ));
    output::detail(&format!(
        "profiles: {} from {} score rows",
        report.profiles, report.rows_ingested
    ));
    output::detail(&format!("elapsed: {} ms", report.elapsed_ms));
    if report.truncated {
        output::warning("score rows exceeded the row cap; the matrix is incomplete");
    }
    for (product, rows) in &report.unknown_products {
        output::warning(&format!("{} rows for unknown product '{}'", rows, product));
    }
    if !report.baseline_present {
        output::warning("no baseline: all partners reported as new");
    }
}

#[instrument(skip(container))]
fn view(container: &ServiceContainer, selection: &FacetSelection, format: Format) -> CliResult<()> {
    let cache = container.facet_cache()?;
    match container.renderer.render(&cache, selection)? {
        ViewOutcome::Rows(view) => match format {
            Format::Json => output::info(&to_json(&view, "rendered view")?),
            Format::Table => {
                for line in output::table(&view) {
                    output::info(&line);
                }
            }
        },
        ViewOutcome::NoResults => match format {
            Format::Json => output::info(&serde_json::json!({ "rows": [] })),
            Format::Table => output::warning("no partners match the selection"),
        },
    }
    Ok(())
}

#[instrument(skip(container))]
fn options(
    container: &ServiceContainer,
    region: &str,
    solution: &str,
    toggle: &[String],
) -> CliResult<()> {
    let options = &container.options;
    let mut solutions = SolutionSelection::parse(solution)?;
    for value in toggle {
        solutions = options.toggle_solution(solutions, value)?;
    }
    debug!("options: solutions {}", solutions);

    let countries = match container.facet_cache() {
        Ok(cache) => options.countries(&cache, &Facet::parse(region)),
        Err(ApplicationError::CacheMissing(location)) => {
            output::warning(&format!("no facet cache at {}, countries unknown", location));
            vec![ALL.to_string()]
        }
        Err(e) => return Err(e.into()),
    };

    let sections = [
        ("Partner type", options.partner_types()),
        ("Region", options.regions()),
        ("Country", countries),
        ("Solution", options.solutions()),
        ("Product", options.products(&solutions)),
    ];
    for (title, values) in sections {
        output::header(title);
        for value in values {
            output::detail(&value);
        }
    }
    output::action("Selected solutions", &solutions);
    Ok(())
}

#[instrument(skip(container))]
fn baseline_freeze(container: &ServiceContainer) -> CliResult<()> {
    let snapshot = container.refresh.freeze_baseline()?;
    output::success(&format!(
        "baseline frozen: {} partners, {} columns",
        snapshot.rows.len(),
        snapshot.columns.len()
    ));
    Ok(())
}

fn config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(cli.config.as_deref())?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Init { force } => {
            let path = global_config_path()
                .ok_or_else(|| CliError::Usage("cannot determine config directory".into()))?;
            let fs = RealFileSystem;
            if fs.exists(&path) && !force {
                return Err(CliError::Usage(format!(
                    "config already exists: {} (use --force to overwrite)",
                    path.display()
                )));
            }
            fs.ensure_parent(&path)
                .and_then(|_| fs.write(&path, &Settings::template()))
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Created", &path.display());
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => {
                    let state = if path.exists() { "" } else { " (not found)" };
                    output::info(&format!("global: {}{}", path.display(), state));
                }
                None => output::info("global: <unavailable>"),
            }
            if let Some(path) = &cli.config {
                output::info(&format!("file:   {}", path.display()));
            }
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}

fn completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
