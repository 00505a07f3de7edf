mod body;
mod gravity;
mod propagator;
mod world;

pub use body::{Body, BodyId, BodyInit, Force};
pub use gravity::Gravity;
pub use propagator::{propagate, Propagation, Steps};
pub use world::World;
