pub mod gemini;
pub mod outcome;
pub mod request;

pub use gemini::*;
pub use outcome::*;
pub use request::*;
