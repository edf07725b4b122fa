//! Model data: the validated geometry descriptor, the LED buffer the host writes
//! into every frame, and a procedural shell for demos.

pub mod geometry;
pub mod leds;
pub mod shapes;

pub use geometry::{ModelGeometry, ModelGeometryBuilder};
pub use leds::{LedBuffer, LedColor};
