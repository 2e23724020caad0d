pub mod dump;
pub mod find;
pub mod rebuild;
pub mod roundtrip;
pub mod search;
pub mod sections;
pub mod set_docset;
pub mod validate;

pub use dump::*;
pub use find::*;
pub use rebuild::*;
pub use roundtrip::*;
pub use search::*;
pub use sections::*;
pub use set_docset::*;
pub use validate::*;
