pub mod error;
pub mod fragment_files;
pub mod result;

pub use error::*;
pub use fragment_files::*;
pub use result::*;
