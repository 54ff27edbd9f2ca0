// Domain layer: form model and ports. No HTTP or runtime concerns here.

pub mod model;
pub mod ports;
