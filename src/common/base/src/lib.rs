pub mod escape;
pub mod point;
