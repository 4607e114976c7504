//! Best-effort IP geolocation seam.
//!
//! The production resolver is a collaborator owned by the wider product;
//! this subsystem only requires that resolution failures degrade to `None`
//! (a null `location` column), never an error.

/// Resolve a human-readable location for an IP address.
pub trait GeoResolver: Send + Sync {
    fn resolve(&self, ip_address: &str) -> Option<String>;
}

/// Resolver that never resolves. Default when no geo service is wired in.
pub struct NoGeoResolver;

impl GeoResolver for NoGeoResolver {
    fn resolve(&self, _ip_address: &str) -> Option<String> {
        None
    }
}
