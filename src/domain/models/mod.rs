pub mod cors;
pub mod object;
pub mod presign;

pub use cors::*;
pub use object::*;
pub use presign::*;
