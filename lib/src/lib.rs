mod analyzer;
mod cancel;
mod candidate;
mod criteria;
mod error;
mod executor;
mod fs;
mod path;
mod preset;
mod scanner;
mod session;
mod sizer;
pub mod utils;

pub use analyzer::*;
pub use cancel::*;
pub use candidate::*;
pub use criteria::*;
pub use error::*;
pub use executor::*;
pub use fs::{dir_is_empty, DirEntryEx};
pub use path::*;
pub use preset::*;
pub use scanner::*;
pub use session::*;
pub use sizer::SizeCalculator;
