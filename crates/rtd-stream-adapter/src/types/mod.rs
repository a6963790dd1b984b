/*
[INPUT]:  Provider contract data shapes (values, argument lists, refresh batches)
[OUTPUT]: Typed Rust structs/enums shared by providers and clients
[POS]:    Data layer - type definitions for the provider session contract
[UPDATE]: When the provider contract gains new data shapes
*/

pub mod batch;
pub mod text;
pub mod value;

pub use batch::*;
pub use text::*;
pub use value::*;
