// Domain layer: payload/response models and ports (interfaces).

pub mod model;
pub mod ports;
