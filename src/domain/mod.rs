// Domain layer: event models and the ports (interfaces) the engine talks to.

pub mod model;
pub mod ports;
