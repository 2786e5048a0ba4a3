/// Gross floor area per dwelling unit used to convert FAR into unit counts.
pub const GROSS_AVE_UNIT_SIZE: f64 = 1000.0;
pub const SQFT_PER_ACRE: f64 = 43_560.0;

/// Plausible band for zone-level residential prices (per sqft), applied before
/// the county cost shifter and the PDA price shifter.
pub const RESIDENTIAL_PRICE_FLOOR: f64 = 150.0;
pub const RESIDENTIAL_PRICE_CEILING: f64 = 1250.0;

/// Land acquisition cost per sqft of parcel area on top of the purchase price
/// of existing buildings.
pub const LAND_COST_PER_SQFT: f64 = 12.21;

/// Underbuild capacity counts only when the additional units exceed this
/// fraction of the existing units.
pub const UNDERBUILD_MIN_RATIO: f64 = 0.5;

/// General building type whose observed prices feed the residential surface.
pub const RESIDENTIAL_GENERAL_TYPE: &str = "Residential";

pub const BASELINE_SCENARIO: &str = "baseline";

/// Building-type capacity columns carried by the baseline zoning table.
pub const ZONING_BUILDING_TYPE_CODES: [u32; 14] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14];

/// Agents without a building carry this id in frames handed to the runners.
pub const UNPLACED_BUILDING_ID: f64 = -1.0;
