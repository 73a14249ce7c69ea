pub mod modules;
pub mod project;
pub mod ranges;
pub mod reports;
pub mod sections;
pub mod util;

pub use modules::*;
pub use project::*;
pub use ranges::*;
pub use reports::*;
pub use sections::*;
pub use util::*;
