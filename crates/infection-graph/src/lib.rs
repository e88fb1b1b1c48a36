pub mod fixture;
pub mod graph;
pub mod plot;
pub mod propagation;

pub use fixture::*;
pub use graph::*;
pub use plot::*;
pub use propagation::*;
