//! Built-in OLT model definitions.

pub mod fiberhome;
