mod cwd;
mod display;
mod parse;
mod query;
mod types;

pub use cwd::*;
pub use display::*;
pub use parse::*;
pub use query::*;
pub use types::*;
