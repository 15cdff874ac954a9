pub mod dcf;
pub mod normalize;
pub mod wacc;

pub use dcf::*;
pub use normalize::*;
pub use wacc::*;
