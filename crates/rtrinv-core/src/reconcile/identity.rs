//! Identity and equality predicates
//!
//! Matching and content comparison are kept apart: an interface whose speed
//! changed still matches its stored counterpart and is reloaded in place.

use crate::model::{ManagedInterface, Router};

/// Absolute tolerance for geo-coordinate comparison
pub const GEO_TOLERANCE: f64 = 1e-9;

/// Same physical interface: router, name and ifIndex agree
pub fn same_identity(a: &ManagedInterface, b: &ManagedInterface) -> bool {
    a.router_id == b.router_id && a.name == b.name && a.index == b.index
}

/// Same mutable content: speed and alias agree
pub fn same_content(a: &ManagedInterface, b: &ManagedInterface) -> bool {
    a.speed == b.speed && a.alias == b.alias
}

/// Same identity and same content
pub fn same_interface(a: &ManagedInterface, b: &ManagedInterface) -> bool {
    same_identity(a, b) && same_content(a, b)
}

pub fn almost_equal(x: f64, y: f64) -> bool {
    (x - y).abs() <= GEO_TOLERANCE
}

/// Equality of the non-identity router columns
///
/// Mirrors [`Router::copy_attributes_from`]: storage-assigned identity and
/// timestamps are ignored, so a router built from configuration compares
/// equal to its stored row when nothing was edited.
pub fn same_attributes(a: &Router, b: &Router) -> bool {
    a.unique_name == b.unique_name
        && a.name == b.name
        && a.description == b.description
        && a.up_time == b.up_time
        && a.contact == b.contact
        && a.location == b.location
        && almost_equal(a.lat, b.lat)
        && almost_equal(a.lon, b.lon)
        && a.bulk_max_repetitions == b.bulk_max_repetitions
        && a.flow_source_ip == b.flow_source_ip
        && a.polling_interval_secs == b.polling_interval_secs
}

/// Field-by-field equality of every persisted router column
///
/// Includes identity and timestamps; interfaces and SNMP config are not
/// compared.
pub fn routers_equal(a: &Router, b: &Router) -> bool {
    a.id == b.id && a.created_at == b.created_at && a.updated_at == b.updated_at && same_attributes(a, b)
}
