//! Building, job and CoStar columns resolved through the parcel table and
//! the settings maps.

use crate::datasets::{Building, CostarRecord, Job, NodeId, Parcels, ZoneId};
use crate::settings::Settings;

pub fn building_zone_id(parcels: &Parcels, building: &Building) -> Option<ZoneId> {
    parcels.get(building.parcel_id).map(|p| p.zone_id)
}

pub fn building_node_id(parcels: &Parcels, building: &Building) -> Option<NodeId> {
    parcels.get(building.parcel_id).and_then(|p| p.node_id)
}

pub fn building_general_type<'s>(settings: &'s Settings, building: &Building) -> Option<&'s str> {
    settings.general_type(building.building_type_id)
}

pub fn job_naics(job: &Job) -> u32 {
    job.sector_id
}

pub fn job_empsix<'s>(settings: &'s Settings, job: &Job) -> Option<&'s str> {
    settings.empsix(job.sector_id)
}

pub fn job_empsix_id(settings: &Settings, job: &Job) -> Option<u32> {
    settings.empsix_id(job.sector_id)
}

pub fn costar_node_id(parcels: &Parcels, record: &CostarRecord) -> Option<NodeId> {
    parcels.get(record.parcel_id).and_then(|p| p.node_id)
}

pub fn costar_zone_id(parcels: &Parcels, record: &CostarRecord) -> Option<ZoneId> {
    parcels.get(record.parcel_id).map(|p| p.zone_id)
}
