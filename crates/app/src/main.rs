use std::path::Path;
use std::process::ExitCode;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::Parser;

use landuse::datasets::Dataset;
use landuse::proforma::{FeasibilityTable, ProFormaConfig};
use landuse::registry::run_models;
use landuse::settings::Settings;
use landuse::{configure, LandUsePlugin, SimError};

mod cli;

use cli::{RunArgs, DATA_ENV, OUTPUT_ENV, PROFORMA_ENV, SETTINGS_ENV};

fn main() -> ExitCode {
    let run = RunArgs::parse();

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default(), LandUsePlugin));

    match drive(&mut app, run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn drive(app: &mut App, run: RunArgs) -> Result<(), SimError> {
    let years = run.years()?;
    let settings = match std::env::var(SETTINGS_ENV) {
        Ok(path) => Settings::from_path(path)?,
        Err(_) => Settings::default(),
    };
    let proforma = match std::env::var(PROFORMA_ENV) {
        Ok(path) => ProFormaConfig::from_path(path)?,
        Err(_) => ProFormaConfig::default(),
    };
    configure(app.world_mut(), settings, proforma)?;

    match std::env::var(DATA_ENV) {
        Ok(path) => Dataset::from_path(path)?.insert_into(app.world_mut()),
        Err(_) => warn!("{} is not set; starting from empty tables", DATA_ENV),
    }

    run_models(app.world_mut(), &run.models, years)?;

    let table = app.world().resource::<FeasibilityTable>();
    log_summary(table);
    if let Ok(path) = std::env::var(OUTPUT_ENV) {
        write_table(table, Path::new(&path))?;
    }
    Ok(())
}

fn log_summary(table: &FeasibilityTable) {
    let Some(year) = table.year() else {
        info!("Feasibility was not computed");
        return;
    };
    info!("Feasibility for {}: {} records", year, table.len());
    for form in table.forms() {
        let section = table.form_section(form).map_or(0, |s| s.len());
        info!("  {}: {} feasible parcels", form, section);
    }
}

fn write_table(table: &FeasibilityTable, path: &Path) -> Result<(), SimError> {
    let json = serde_json::to_string_pretty(table)?;
    std::fs::write(path, json)?;
    info!("Wrote feasibility table to {}", path.display());
    Ok(())
}
