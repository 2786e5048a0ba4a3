//! Derived variables over the input tables: zoning capacity, parcel
//! attributes, achievable prices, and the per-agent lookups the model frames
//! merge in.

mod agents;
mod parcels;
mod pricing;
mod zoning;


pub use agents::*;
pub use parcels::{ParcelAttributes, ParcelVariables};
pub use pricing::{
    adjust_residential_price, building_purchase_price, land_cost, quantile,
    zone_price_quantiles, ParcelPrices,
};
pub use zoning::{
    apply_pda_dua_floor, conditional_upzone, is_allowed, is_allowed_on, zoned_du,
    zoned_du_underbuild,
};
