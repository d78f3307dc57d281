//! Chat surfaces: the trait the session talks to and a terminal rendering.

pub mod surface;
pub mod terminal;
