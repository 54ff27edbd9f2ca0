// Adapters layer: concrete implementations for external systems.

pub mod plz_api;

pub use plz_api::OpenPlzClient;
