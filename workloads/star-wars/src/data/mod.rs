//! Movie data: API access, models and the filters applied before data
//! reaches a page context.

mod api;
mod filter;
mod types;

pub use api::*;
pub use filter::*;
pub use types::*;
