
/// Field extraction, immediates and decode round-trips.
pub mod decode_properties;
