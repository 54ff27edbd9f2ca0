pub mod controller;
pub mod debounce;

pub use controller::{AddressController, ControllerEvent, FormSettings};
