pub mod boundaries;
pub mod records;
pub mod source;

pub use boundaries::*;
pub use records::*;
pub use source::*;
