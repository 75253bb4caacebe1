pub mod enums;
pub mod client;
pub mod clinical_record;
pub mod plan;
pub mod visit;

pub use client::*;
pub use clinical_record::*;
pub use enums::*;
pub use plan::*;
pub use visit::*;
