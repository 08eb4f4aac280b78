// Domain layer: value types and ports. No I/O here.

pub mod goal;
pub mod model;
pub mod ports;
