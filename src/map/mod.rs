mod geometry;
mod projection;
mod renderer;
mod spatial;

pub use projection::Viewport;
pub use renderer::{DisplaySettings, LineString, Lod, MapLayers, MapRenderer};
pub use spatial::SpatialGrid;
