pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::OpenPlzClient;
pub use config::ValidatorConfig;
pub use crate::core::controller::{AddressController, FormSettings};
pub use domain::model::{Dropdown, FormError, FormState, InputMode, Locality, LocalityQuery};
pub use domain::ports::{ConfigProvider, LocalityLookup};
pub use utils::error::{ErrorKind, LookupError, Result, ValidatorError};
