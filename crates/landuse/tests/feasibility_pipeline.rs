//! End-to-end runs through the public driver: load a JSON dataset into a
//! headless app, dispatch models by name and read the published tables.
//!
//! Run: cargo test -p landuse --test feasibility_pipeline

use bevy::prelude::*;

use landuse::catalog::Form;
use landuse::datasets::{Dataset, FittedModel, FittedModels, Households, NodePrices};
use landuse::proforma::{FeasibilityTable, ParkingConfig, ProFormaConfig};
use landuse::registry::{parse_models, run_models};
use landuse::settings::Settings;
use landuse::{configure, LandUsePlugin, SimError};

const DATASET: &str = r#"{
    "parcels": [
        {"parcel_id": 1, "parcel_acres": 0.4591368227731864, "parcel_size": 20000.0,
         "zone_id": 1, "county_id": 1, "node_id": 1},
        {"parcel_id": 2, "parcel_acres": 0.4591368227731864, "parcel_size": 20000.0,
         "zone_id": 1, "county_id": 1, "node_id": 2},
        {"parcel_id": 99, "parcel_acres": 1.0, "parcel_size": 43560.0,
         "zone_id": 1, "county_id": 1, "node_id": 99}
    ],
    "buildings": [
        {"building_id": 1, "parcel_id": 99, "building_type_id": 1,
         "residential_units": 4, "building_sqft": 4000.0,
         "residential_sales_price": 1000.0}
    ],
    "households": [
        {"household_id": 1, "building_id": 1, "persons": 2, "income": 90000.0},
        {"household_id": 2, "building_id": 1, "persons": 1, "income": 60000.0},
        {"household_id": 3, "building_id": 1, "persons": 4, "income": 120000.0}
    ],
    "zoning_baseline": [
        {"parcel_id": 1, "max_far": 2.0, "capacities": {"2": 10.0}},
        {"parcel_id": 2, "max_far": 2.0, "nodev": true, "capacities": {"2": 10.0}}
    ]
}"#;

fn settings() -> Settings {
    Settings::default()
}

fn region(settings: Settings) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(LandUsePlugin);
    configure(app.world_mut(), settings, ProFormaConfig::default())
        .expect("test settings are valid");
    Dataset::from_json_str(DATASET)
        .expect("dataset parses")
        .insert_into(app.world_mut());
    app
}

fn run(app: &mut App, models: &[&str], years: std::ops::RangeInclusive<u32>) -> Result<(), SimError> {
    let ids = parse_models(models)?;
    run_models(app.world_mut(), &ids, years)
}

#[test]
fn test_feasibility_after_price_vars() {
    let mut app = region(settings());
    run(&mut app, &["neighborhood_vars", "price_vars", "feasibility"], 2010..=2010).unwrap();

    assert!(app.world().resource::<NodePrices>().0.is_some());
    let table = app.world().resource::<FeasibilityTable>();
    assert_eq!(table.year(), Some(2010));

    let record = table.get(1, Form::Residential).expect("parcel 1 builds residential");
    assert_eq!(record.max_profit_far, 2.0);
    assert_eq!(record.parking_config, ParkingConfig::Deck);
    assert_eq!(record.residential_units, 40);
    let expected = 40_000.0 * 0.7 * 50.0 / 0.05 - 40_000.0 * 233.75 - 20_000.0 * 12.21;
    assert!((record.max_profit - expected).abs() < 1e-3, "{}", record.max_profit);

    // Not allowed anywhere else, and the nodev parcel has no capacity.
    assert!(table.get(1, Form::Office).is_none());
    assert!(table.get(2, Form::Residential).is_none());
}

#[test]
fn test_each_year_replaces_the_table() {
    let mut app = region(settings());
    run(&mut app, &["feasibility"], 2010..=2012).unwrap();
    let table = app.world().resource::<FeasibilityTable>();
    assert_eq!(table.year(), Some(2012));
    assert!(table.get(1, Form::Residential).is_some());
}

#[test]
fn test_county_without_cost_shifter_is_rejected() {
    let mut settings = settings();
    settings.cost_shifters.remove("Alameda");
    let mut app = App::new();
    app.add_plugins(MinimalPlugins).add_plugins(LandUsePlugin);
    let err = configure(app.world_mut(), settings, ProFormaConfig::default()).unwrap_err();
    assert!(err.is_configuration());
    assert!(format!("{err}").contains("Alameda"), "got: {err}");
}

#[test]
fn test_unknown_model_rejected_before_running() {
    let mut app = region(settings());
    let err = run(&mut app, &["feasibility", "developer"], 2010..=2010).unwrap_err();
    assert!(err.is_configuration());
    assert!(app.world().resource::<FeasibilityTable>().year().is_none());
}

#[test]
fn test_simulate_without_coefficients_aborts_the_year() {
    let mut app = region(settings());
    let err = run(&mut app, &["rsh_simulate", "feasibility"], 2010..=2011).unwrap_err();
    assert!(matches!(err, SimError::UpstreamModel { ref model, .. } if model == "rsh_simulate"));
    assert!(app.world().resource::<FeasibilityTable>().year().is_none());
}

#[test]
fn test_rsh_simulate_with_fitted_coefficients() {
    let mut app = region(settings());
    let fitted = FittedModel {
        coefficients: [("intercept".to_string(), 500.0)].into_iter().collect(),
    };
    app.world_mut()
        .resource_mut::<FittedModels>()
        .0
        .insert("rsh.yaml".to_string(), fitted);
    run(&mut app, &["rsh_simulate"], 2010..=2010).unwrap();
    let buildings = app.world().resource::<landuse::datasets::Buildings>();
    assert_eq!(buildings.get(1).unwrap().residential_sales_price, Some(500.0));
}

#[test]
fn test_relocated_households_are_placed_again() {
    let mut moving = settings();
    moving.household_relocation_rate = 1.0;
    let mut app = region(moving);
    run(&mut app, &["households_relocation"], 2010..=2010).unwrap();
    let households = &app.world().resource::<Households>().0;
    assert!(households.iter().all(|h| h.building_id.is_none()));

    run(&mut app, &["hlcmo_simulate"], 2010..=2010).unwrap();
    let households = &app.world().resource::<Households>().0;
    assert!(households.iter().all(|h| h.building_id == Some(1)));
}

#[test]
fn test_transition_grows_households() {
    let mut growing = settings();
    growing.household_growth_rate = 1.0;
    let mut app = region(growing);
    run(&mut app, &["households_transition"], 2010..=2010).unwrap();
    let households = &app.world().resource::<Households>().0;
    assert_eq!(households.len(), 6);
    assert_eq!(households.iter().map(|h| h.household_id).max(), Some(6));
    assert_eq!(households.iter().filter(|h| h.building_id.is_none()).count(), 3);
}
