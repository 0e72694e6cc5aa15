// Domain layer: records, tiers, boundaries and the ports the loader reads through.

pub mod geometry;
pub mod model;
pub mod ports;
pub mod tier;
