pub mod catalog;
pub mod cloud;
pub mod order;
pub mod parameters;
pub mod phase;
pub mod selectors;
pub mod ticket;

pub use catalog::*;
pub use cloud::*;
pub use order::*;
pub use parameters::*;
pub use phase::*;
pub use selectors::*;
pub use ticket::*;
