pub mod frame;
pub mod locator;
pub mod region;

pub use frame::{Frame, FrameSource, LatestFrameSource, StillFrameSource};
pub use locator::{FaceLocator, FixedRegionLocator};
pub use region::{PixelRect, Region};
