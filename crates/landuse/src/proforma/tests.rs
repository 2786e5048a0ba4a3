use std::collections::{BTreeMap, HashMap};

use super::*;
use crate::catalog::{Form, FormCatalog, Use};
use crate::datasets::{
    Building, Buildings, NodeTable, Parcel, Parcels, ScenarioInputs, ZoningBaseline, ZoningRow,
};
use crate::config::SQFT_PER_ACRE;
use crate::settings::Settings;
use crate::test_harness::TestRegion;
use crate::variables::is_allowed_on;

// =============================================================================
// Fixtures
// =============================================================================

const ALAMEDA: u32 = 1;

fn settings() -> Settings {
    Settings::default()
}

fn parcel(id: i64, node: Option<i64>) -> Parcel {
    Parcel {
        parcel_id: id,
        parcel_acres: 20_000.0 / 43_560.0,
        parcel_size: 20_000.0,
        zone_id: 1,
        county_id: ALAMEDA,
        pda: None,
        node_id: node,
    }
}

/// A sold home on a separate parcel sets the zone's residential price.
fn comparable(price: f64) -> Building {
    Building {
        building_id: 1,
        parcel_id: 99,
        building_type_id: 1,
        residential_units: 1,
        non_residential_sqft: 0.0,
        building_sqft: 1_000.0,
        job_spaces: 0,
        residential_sales_price: Some(price),
        residential_rent: None,
        non_residential_rent: None,
    }
}

fn zoned(parcel_id: i64, max_far: f64, codes: &[u32]) -> ZoningRow {
    ZoningRow {
        parcel_id,
        max_far: Some(max_far),
        capacities: codes.iter().map(|c| (*c, 10.0)).collect(),
        ..Default::default()
    }
}

struct Fixture {
    parcels: Parcels,
    buildings: Buildings,
    zoning: ZoningBaseline,
    scenario: ScenarioInputs,
    settings: Settings,
    surface: Option<NodeTable>,
}

impl Fixture {
    fn new(parcels: Vec<Parcel>, zoning: Vec<ZoningRow>) -> Self {
        let mut all = parcels;
        all.push(parcel(99, None));
        Self {
            parcels: Parcels::new(all),
            buildings: Buildings::new(vec![comparable(1_000.0)]),
            zoning: ZoningBaseline::new(zoning),
            scenario: ScenarioInputs::default(),
            settings: settings(),
            surface: None,
        }
    }

    fn with_surface(mut self, surface: NodeTable) -> Self {
        self.surface = Some(surface);
        self
    }

    fn run(&self) -> Result<FeasibilityTable, crate::SimError> {
        let config = ProFormaConfig::default();
        let catalog = FormCatalog::build(&self.settings, &config)?;
        let inputs = FeasibilityInputs {
            parcels: &self.parcels,
            buildings: &self.buildings,
            zoning: &self.zoning,
            scenario: &self.scenario,
            node_prices: self.surface.as_ref(),
            settings: &self.settings,
        };
        compute_feasibility(&inputs, &catalog, &config, Some(2010))
    }
}

fn commercial_surface(rent: f64, nodes: &[i64]) -> NodeTable {
    let values: HashMap<i64, f64> = nodes.iter().map(|n| (*n, rent)).collect();
    NodeTable::new()
        .with_column("retail", values.clone())
        .with_column("industrial", values.clone())
        .with_column("office", values)
}

fn inputs(max_far: Option<f64>) -> ParcelInputs {
    ParcelInputs {
        parcel_id: 1,
        parcel_size: 20_000.0,
        parcel_acres: 20_000.0 / 43_560.0,
        max_far,
        max_height: None,
        max_dua: None,
        nodev: false,
        land_cost: 0.0,
        prices: BTreeMap::new(),
    }
}

fn catalog() -> FormCatalog {
    FormCatalog::build(&settings(), &ProFormaConfig::default()).unwrap()
}

// =============================================================================
// Lookup helpers
// =============================================================================

#[test]
fn test_weighted_rent_capitalizes_residential() {
    let catalog = catalog();
    let entry = catalog.get(Form::MixedResidential).unwrap();
    let prices = BTreeMap::from([(Use::Retail, 30.0), (Use::Residential, 1_000.0)]);
    let rent = weighted_rent(entry, &prices, 0.05).unwrap();
    // 0.1 * 30 + 0.9 * (1000 * 0.05)
    assert!((rent - 48.0).abs() < 1e-9);
}

#[test]
fn test_weighted_rent_missing_price() {
    let catalog = catalog();
    let entry = catalog.get(Form::MixedOffice).unwrap();
    let prices = BTreeMap::from([(Use::Office, 30.0)]);
    assert_eq!(weighted_rent(entry, &prices, 0.05), None);
}

#[test]
fn test_max_far_takes_tightest_limit() {
    let config = ProFormaConfig::default();
    let catalog = catalog();
    let entry = catalog.get(Form::Residential).unwrap();

    let mut p = inputs(Some(4.0));
    assert_eq!(max_far_for_form(Form::Residential, entry, &p, &config), 4.0);

    // 30 ft over 12 ft stories on 80% coverage.
    p.max_height = Some(30.0);
    assert!((max_far_for_form(Form::Residential, entry, &p, &config) - 2.0).abs() < 1e-9);

    // 43.56 units/acre on 20,000 sqft: 20 units of 1000 sqft, FAR 1.0.
    p.max_dua = Some(43.56);
    assert!((max_far_for_form(Form::Residential, entry, &p, &config) - 1.0).abs() < 1e-9);
}

#[test]
fn test_max_far_density_ignored_for_commercial_forms() {
    let config = ProFormaConfig::default();
    let catalog = catalog();
    let mut p = inputs(Some(4.0));
    p.max_dua = Some(1.0);
    let entry = catalog.get(Form::Office).unwrap();
    assert_eq!(max_far_for_form(Form::Office, entry, &p, &config), 4.0);
}

#[test]
fn test_max_far_retail_capped() {
    let config = ProFormaConfig::default();
    let catalog = catalog();
    let entry = catalog.get(Form::Retail).unwrap();
    assert_eq!(max_far_for_form(Form::Retail, entry, &inputs(Some(6.0)), &config), 2.0);
}

#[test]
fn test_max_far_zero_without_limits_or_when_nodev() {
    let config = ProFormaConfig::default();
    let catalog = catalog();
    let entry = catalog.get(Form::Residential).unwrap();
    assert_eq!(max_far_for_form(Form::Residential, entry, &inputs(None), &config), 0.0);

    let mut p = inputs(Some(3.0));
    p.nodev = true;
    assert_eq!(max_far_for_form(Form::Residential, entry, &p, &config), 0.0);

    assert_eq!(max_far_for_form(Form::Residential, entry, &inputs(Some(-1.0)), &config), 0.0);
}

#[test]
fn test_evaluate_parcel_picks_cheapest_parking_at_max_far() {
    let config = ProFormaConfig::default();
    let catalog = catalog();
    let entry = catalog.get(Form::Residential).unwrap();
    let costs = CostTable::generate(&catalog, &config).unwrap();

    let mut p = inputs(Some(2.0));
    p.land_cost = 244_200.0;
    p.prices.insert(Use::Residential, 1_000.0);

    let record = evaluate_parcel(Form::Residential, entry, costs.entries(Form::Residential), &p, &config)
        .unwrap();
    assert_eq!(record.max_profit_far, 2.0);
    assert_eq!(record.parking_config, ParkingConfig::Deck);
    assert_eq!(record.building_sqft, 40_000.0);
    assert_eq!(record.residential_units, 40);
    assert_eq!(record.non_residential_sqft, 0.0);
    // Deck at FAR 2.0: (20,000 * 190 + 5,000 * 90) / 20,000 * 1.1 = 233.75 per sqft.
    let expected = 40_000.0 * 0.7 * 50.0 / 0.05 - 40_000.0 * 233.75 - 244_200.0;
    assert!((record.max_profit - expected).abs() < 1e-3, "{}", record.max_profit);
    assert!((record.weighted_rent - 50.0).abs() < 1e-9);
}

#[test]
fn test_evaluate_parcel_zero_prices_is_absent() {
    let config = ProFormaConfig::default();
    let catalog = catalog();
    let entry = catalog.get(Form::Office).unwrap();
    let costs = CostTable::generate(&catalog, &config).unwrap();
    let mut p = inputs(Some(4.0));
    p.prices.insert(Use::Office, 0.0);
    assert!(evaluate_parcel(Form::Office, entry, costs.entries(Form::Office), &p, &config).is_none());
}

#[test]
fn test_evaluate_parcel_land_cost_can_sink_profit() {
    let config = ProFormaConfig::default();
    let catalog = catalog();
    let entry = catalog.get(Form::Residential).unwrap();
    let costs = CostTable::generate(&catalog, &config).unwrap();
    let mut p = inputs(Some(2.0));
    p.prices.insert(Use::Residential, 1_000.0);
    p.land_cost = 1.0e9;
    assert!(
        evaluate_parcel(Form::Residential, entry, costs.entries(Form::Residential), &p, &config)
            .is_none()
    );
}

// =============================================================================
// Table
// =============================================================================

#[test]
fn test_profitable_residential_parcel_recorded() {
    let fixture = Fixture::new(vec![parcel(1, Some(10))], vec![zoned(1, 2.0, &[1])]);
    let table = fixture.run().unwrap();
    assert_eq!(table.year(), Some(2010));
    let record = table.get(1, Form::Residential).unwrap();
    assert_eq!(record.max_profit_far, 2.0);
    assert!(record.max_profit > 0.0);
}

#[test]
fn test_single_permitting_code_allows_form() {
    // Residential is permitted by codes 1, 2 and 3; capacity on 2 alone suffices.
    let fixture = Fixture::new(vec![parcel(2, Some(10))], vec![zoned(2, 2.0, &[2])]);
    let table = fixture.run().unwrap();
    assert!(table.get(2, Form::Residential).is_some());
}

#[test]
fn test_records_only_where_allowed() {
    let fixture = Fixture::new(
        vec![parcel(1, Some(10)), parcel(2, Some(10)), parcel(3, Some(10))],
        vec![zoned(1, 2.0, &[1]), zoned(2, 2.0, &[4, 10]), zoned(3, 2.0, &[12, 14])],
    )
    .with_surface(commercial_surface(60.0, &[10]));
    let table = fixture.run().unwrap();
    assert!(!table.is_empty());

    let config = ProFormaConfig::default();
    let catalog = FormCatalog::build(&fixture.settings, &config).unwrap();
    for form in table.forms() {
        let codes = &catalog.get(form).unwrap().building_types;
        for parcel_id in table.form_section(form).unwrap().keys() {
            assert!(
                is_allowed_on(&fixture.zoning, *parcel_id, codes),
                "{form} recorded on parcel {parcel_id} without zoning"
            );
        }
    }
    assert!(table.get(1, Form::Office).is_none());
    assert!(table.get(2, Form::Residential).is_none());
}

#[test]
fn test_zero_commercial_prices_leave_form_absent() {
    // No surface computed: every non-residential price is zero.
    let fixture = Fixture::new(vec![parcel(1, Some(10))], vec![zoned(1, 4.0, &[4])]);
    let table = fixture.run().unwrap();
    assert!(table.get(1, Form::Office).is_none());
    assert!(table.form_section(Form::Office).unwrap().is_empty());
}

#[test]
fn test_every_form_has_a_section() {
    let fixture = Fixture::new(vec![parcel(1, Some(10))], Vec::new());
    let table = fixture.run().unwrap();
    assert!(table.is_empty());
    assert_eq!(table.forms().count(), Form::ALL.len());
}

#[test]
fn test_missing_price_excludes_parcel_from_that_form_only() {
    // Parcel 1 has no node: its retail price is missing, so mixed residential
    // is skipped while pure residential still evaluates.
    let fixture = Fixture::new(vec![parcel(1, None)], vec![zoned(1, 2.0, &[1, 12])])
        .with_surface(commercial_surface(60.0, &[10]));
    let table = fixture.run().unwrap();
    assert!(table.get(1, Form::Residential).is_some());
    assert!(table.get(1, Form::MixedResidential).is_none());
}

#[test]
fn test_surface_missing_use_is_configuration_error() {
    let surface = NodeTable::new().with_column("retail", HashMap::from([(10, 30.0)]));
    let fixture = Fixture::new(vec![parcel(1, Some(10))], vec![zoned(1, 2.0, &[1])])
        .with_surface(surface);
    let err = fixture.run().unwrap_err();
    assert!(err.is_configuration(), "got: {err}");
}

#[test]
fn test_undefined_zoning_code_is_configuration_error() {
    let mut fixture = Fixture::new(vec![parcel(1, Some(10))], Vec::new());
    fixture.zoning = ZoningBaseline::with_building_types(vec![zoned(1, 2.0, &[1])], [1, 2, 3]);
    let err = fixture.run().unwrap_err();
    assert!(err.is_configuration(), "got: {err}");
}

#[test]
fn test_best_for_parcel_prefers_highest_profit() {
    let fixture = Fixture::new(vec![parcel(1, Some(10))], vec![zoned(1, 2.0, &[1, 12])])
        .with_surface(commercial_surface(5.0, &[10]));
    let table = fixture.run().unwrap();
    let row = table.row(1);
    assert!(!row.is_empty());
    let (form, best) = table.best_for_parcel(1).unwrap();
    for record in row.values() {
        assert!(best.max_profit >= record.max_profit);
    }
    assert!(row.contains_key(&form));
}

#[test]
fn test_replace_discards_previous_run() {
    let mut table = FeasibilityTable::new(Some(2010));
    table.insert(
        Form::Office,
        5,
        FeasibilityRecord {
            max_profit_far: 1.0,
            max_profit: 1.0,
            parking_config: ParkingConfig::Surface,
            building_sqft: 1.0,
            residential_sqft: 0.0,
            non_residential_sqft: 1.0,
            residential_units: 0,
            stories: 1.0,
            building_cost: 1.0,
            building_revenue: 2.0,
            weighted_rent: 1.0,
        },
    );
    table.replace(FeasibilityTable::new(Some(2011)));
    assert!(table.is_empty());
    assert_eq!(table.year(), Some(2011));
}

// =============================================================================
// Through the feasibility system
// =============================================================================

fn region() -> TestRegion {
    TestRegion::new()
        .with_parcel(1, 20_000.0)
        .with_parcel(99, SQFT_PER_ACRE)
        .with_home(1, 99, 1, 1_000.0)
        .with_far_zoning(1, 2.0, &[2])
}

#[test]
fn test_default_settings_price_residential_parcels() {
    let region = region().feasibility_for(2010);
    region.assert_feasible(1, Form::Residential);
    region.assert_not_feasible(1, Form::Office);
    region.assert_not_feasible(99, Form::Residential);
}

#[test]
fn test_upzone_applies_outside_baseline() {
    let baseline = region().with_upzone(1, Some(4.0), None).feasibility_for(2010);
    let record = baseline.record(1, Form::Residential).unwrap();
    assert_eq!(record.max_profit_far, 2.0);

    let upzoned = region()
        .with_settings_mut(|s| s.scenario = "plan_bay_area".into())
        .with_upzone(1, Some(4.0), None)
        .feasibility_for(2010);
    let record = upzoned.record(1, Form::Residential).unwrap();
    assert!(record.max_profit_far > 2.0, "{}", record.max_profit_far);
}

#[test]
fn test_nodev_blocks_development() {
    let region = region()
        .with_zoning(ZoningRow {
            parcel_id: 1,
            max_far: Some(2.0),
            nodev: true,
            capacities: [(2, 1.0)].into_iter().collect(),
            ..Default::default()
        })
        .feasibility_for(2010);
    region.assert_not_feasible(1, Form::Residential);
}

fn office_region() -> TestRegion {
    TestRegion::new()
        .with_parcel(1, 20_000.0)
        .with_far_zoning(1, 3.0, &[4])
        .with_uniform_prices(&[1], 60.0)
}

#[test]
fn test_office_priced_from_surface() {
    let region = office_region().feasibility_for(2010);
    region.assert_feasible(1, Form::Office);
    region.assert_not_feasible(1, Form::Residential);
}

#[test]
fn test_cap_rate_drives_commercial_revenue() {
    // At a 50% cap rate 60/sqft of rent capitalizes to 84/sqft, below cost.
    let config = ProFormaConfig {
        cap_rate: 0.5,
        ..ProFormaConfig::default()
    };
    let region = office_region().with_proforma(config).feasibility_for(2010);
    region.assert_not_feasible(1, Form::Office);
    assert!(region.feasibility().is_empty());
}
