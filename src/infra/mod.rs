mod resolve;
mod resume;
mod scan;
mod session_index;

pub use resolve::*;
pub use resume::*;
pub use scan::*;
pub use session_index::*;
