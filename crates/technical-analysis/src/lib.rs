pub mod indicators;
pub mod series;


pub use indicators::*;
pub use series::*;
