// Domain layer: core models and ports (interfaces) shared by the parser, engines and adapters.

pub mod model;
pub mod ports;
