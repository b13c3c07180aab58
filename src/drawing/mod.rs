pub mod normalize;
pub mod renderer;

pub use normalize::{CanvasSize, NormPoint, PixelPoint};
pub use renderer::{StrokeRenderer, Tool};
