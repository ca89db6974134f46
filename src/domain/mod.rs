// Domain layer: entities, grid rules and ports. No I/O here.

pub mod grid;
pub mod ids;
pub mod model;
pub mod ports;
