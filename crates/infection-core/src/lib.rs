pub mod error;
pub mod node;
pub mod settings;
pub mod types;

pub use error::*;
pub use node::*;
pub use settings::*;
pub use types::*;
