pub mod controller;
pub mod dataset;
pub mod state;
pub mod view;

pub use controller::*;
pub use dataset::*;
pub use state::*;
pub use view::*;
