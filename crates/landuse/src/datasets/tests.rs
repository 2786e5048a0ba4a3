use std::collections::{BTreeMap, HashMap};

use super::*;

fn building(id: BuildingId, parcel: ParcelId, sqft: f64, units: u32) -> Building {
    Building {
        building_id: id,
        parcel_id: parcel,
        building_type_id: 1,
        residential_units: units,
        non_residential_sqft: 0.0,
        building_sqft: sqft,
        job_spaces: 0,
        residential_sales_price: None,
        residential_rent: None,
        non_residential_rent: None,
    }
}

// -------------------------------------------------------------------------
// Tables
// -------------------------------------------------------------------------

#[test]
fn test_parcels_push_replaces_same_id() {
    let mut parcels = Parcels::default();
    let mut p = Parcel {
        parcel_id: 7,
        parcel_acres: 1.0,
        parcel_size: 43_560.0,
        zone_id: 1,
        county_id: 1,
        pda: None,
        node_id: None,
    };
    parcels.push(p.clone());
    p.zone_id = 2;
    parcels.push(p);
    assert_eq!(parcels.len(), 1);
    assert_eq!(parcels.get(7).unwrap().zone_id, 2);
    assert_eq!(parcels.position(7), Some(0));
    assert!(parcels.get(8).is_none());
}

#[test]
fn test_building_totals_by_parcel() {
    let buildings = Buildings::new(vec![
        building(1, 10, 5_000.0, 4),
        building(2, 10, 2_500.0, 2),
        building(3, 11, 1_000.0, 0),
    ]);
    let totals = buildings.totals_by_parcel();
    assert_eq!(totals[&10], (7_500.0, 6));
    assert_eq!(totals[&11], (1_000.0, 0));
    assert!(!totals.contains_key(&12));
}

#[test]
fn test_occupancy_counts_placed_agents_only() {
    let households = vec![
        Household { household_id: 1, building_id: Some(5), persons: 2, income: 1.0 },
        Household { household_id: 2, building_id: Some(5), persons: 1, income: 1.0 },
        Household { household_id: 3, building_id: None, persons: 3, income: 1.0 },
    ];
    let counts = occupancy(&households);
    assert_eq!(counts.get(&5), Some(&2));
    assert_eq!(counts.len(), 1);
}

#[test]
fn test_zoning_defines_standard_codes_and_row_codes() {
    let zoning = ZoningBaseline::new(vec![ZoningRow {
        parcel_id: 1,
        capacities: BTreeMap::from([(2, 5.0), (21, 1.0)]),
        ..Default::default()
    }]);
    assert!(zoning.defines(1));
    assert!(zoning.defines(14));
    assert!(zoning.defines(21));
    assert!(!zoning.defines(99));
    assert_eq!(zoning.capacity(1, 2), Some(5.0));
    assert_eq!(zoning.capacity(1, 3), None);
    assert_eq!(zoning.capacity(2, 2), None);
}

#[test]
fn test_zoning_nan_capacity_is_missing() {
    let zoning = ZoningBaseline::new(vec![ZoningRow {
        parcel_id: 1,
        capacities: BTreeMap::from([(1, f64::NAN)]),
        ..Default::default()
    }]);
    assert_eq!(zoning.capacity(1, 1), None);
}

#[test]
fn test_scenario_inputs_lookup() {
    let inputs = ScenarioInputs::new(vec![ScenarioUpzone {
        parcel_id: 3,
        far_up: Some(4.0),
        dua_up: None,
    }]);
    assert_eq!(inputs.far_up(3), Some(4.0));
    assert_eq!(inputs.dua_up(3), None);
    assert_eq!(inputs.far_up(4), None);
}

// -------------------------------------------------------------------------
// Frame
// -------------------------------------------------------------------------

#[test]
fn test_frame_rejects_misaligned_column() {
    let frame = Frame::new(vec![1, 2, 3]);
    assert!(frame.with_column("x", vec![1.0]).is_err());
}

#[test]
fn test_frame_merge_nodes_fills_nan() {
    let nodes = NodeTable::new().with_column("jobs_500m", HashMap::from([(100, 12.0)]));
    let mut frame = Frame::new(vec![1, 2, 3]);
    frame
        .merge_nodes(&[Some(100), Some(200), None], &nodes)
        .unwrap();
    let col = frame.column("jobs_500m").unwrap();
    assert_eq!(col[0], 12.0);
    assert!(col[1].is_nan());
    assert!(col[2].is_nan());
}

#[test]
fn test_frame_filter_keeps_alignment() {
    let frame = Frame::new(vec![10, 20, 30])
        .with_column("a", vec![1.0, 2.0, 3.0])
        .unwrap();
    let filtered = frame.filter(&[true, false, true]);
    assert_eq!(filtered.index(), &[10, 30]);
    assert_eq!(filtered.column("a").unwrap(), &[1.0, 3.0]);
}

// -------------------------------------------------------------------------
// Dataset loading
// -------------------------------------------------------------------------

#[test]
fn test_dataset_from_json() {
    let json = r#"{
        "parcels": [
            {"parcel_id": 1, "parcel_acres": 0.5, "parcel_size": 21780.0,
             "zone_id": 3, "county_id": 1, "pda": "Downtown", "node_id": 9}
        ],
        "zoning_baseline": [
            {"parcel_id": 1, "max_far": 2.0, "capacities": {"1": 10.0}}
        ],
        "costar": [
            {"record_id": 1, "parcel_id": 1, "PropertyType": "Office",
             "averageweightedrent": 31.5, "number_of_stories": 4}
        ]
    }"#;
    let dataset = Dataset::from_json_str(json).unwrap();
    assert_eq!(dataset.parcels.len(), 1);
    assert_eq!(dataset.parcels[0].pda.as_deref(), Some("Downtown"));
    assert_eq!(dataset.zoning_baseline[0].capacities[&1], 10.0);
    assert_eq!(dataset.costar[0].rent(), Some(31.5));
    assert_eq!(dataset.costar[0].general_type(), "Office");
    assert!(dataset.buildings.is_empty());
}

#[test]
fn test_dataset_unknown_table_rejected() {
    assert!(Dataset::from_json_str(r#"{"parcel": []}"#).is_err());
}
