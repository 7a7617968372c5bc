mod questions;

pub use questions::*;
