pub mod angle;
pub mod mat;
pub mod precision;
pub mod vec;

pub use angle::*;
pub use mat::*;
pub use precision::*;
pub use vec::*;
