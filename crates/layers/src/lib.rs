pub mod scale;
pub mod symbology;

pub use scale::*;
pub use symbology::*;
