use parking_lot::Mutex;
use std::collections::HashMap;
use crate::model::geo::GeoLocation;
use crate::utils::errors::{ErrorCode, WardenError};

///
/// Maps a client address to a location. Resolution is best-effort - an
/// address the resolver doesn't know yields an empty location.
///
pub trait GeoResolver: Send + Sync {
    fn resolve(&self, ip_address: &str) -> GeoLocation;
}

///
/// Used when no lookup table is configured. Nothing resolves, so no login is
/// ever flagged as suspicious.
///
pub struct NullGeoResolver;

impl GeoResolver for NullGeoResolver {
    fn resolve(&self, _ip_address: &str) -> GeoLocation {
        GeoLocation::default()
    }
}

///
/// A static address-to-location table loaded from a JSON file.
///
#[derive(Default)]
pub struct StaticGeoResolver {
    table: Mutex<HashMap<String, GeoLocation>>,
}

impl StaticGeoResolver {
    pub fn from_file(path: &str) -> Result<Self, WardenError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| ErrorCode::IOError
                .with_msg(&format!("Unable to read geo table {}: {}", path, err)))?;

        let table: HashMap<String, GeoLocation> = serde_json::from_str(&raw)?;
        Ok(StaticGeoResolver { table: Mutex::new(table) })
    }

    pub fn insert(&self, ip_address: &str, location: GeoLocation) {
        self.table.lock().insert(ip_address.to_string(), location);
    }
}

impl GeoResolver for StaticGeoResolver {
    fn resolve(&self, ip_address: &str) -> GeoLocation {
        self.table.lock().get(ip_address).cloned().unwrap_or_default()
    }
}
