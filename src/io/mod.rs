//! Input/output helpers.
//!
//! - raw table reshaping and coercion (`normalize`)
//! - date join + row cleaning (`align`)
//! - aligned table CSV export (`export`)
//! - run summary JSON read/write (`summary`)

pub mod align;
pub mod export;
pub mod normalize;
pub mod summary;

pub use align::*;
pub use export::*;
pub use normalize::*;
pub use summary::*;
