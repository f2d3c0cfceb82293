//! Types shared by the container parsers.

mod fourcc;

pub use fourcc::FourCC;
