use super::{Frame, Region};

/// Face localisation capability.
///
/// Implementations wrap a real detector; the pipeline calls `locate` on the
/// blocking pool, so it may do heavy CPU work.
pub trait FaceLocator: Send + Sync + 'static {
    /// Whether the underlying model has finished loading.
    fn is_ready(&self) -> bool {
        true
    }

    /// Find at most one face in `frame`.
    fn locate(&self, frame: &Frame) -> Option<Region>;
}

/// Reports the same region on every frame.
///
/// With no configured region it uses the centre half of the frame, which is
/// where a webcam user normally sits.
#[derive(Debug, Clone, Default)]
pub struct FixedRegionLocator {
    region: Option<Region>,
}

impl FixedRegionLocator {
    pub fn new(region: Option<Region>) -> Self {
        Self { region }
    }
}

impl FaceLocator for FixedRegionLocator {
    fn locate(&self, frame: &Frame) -> Option<Region> {
        if frame.width() == 0 || frame.height() == 0 {
            return None;
        }
        Some(
            self.region
                .unwrap_or_else(|| Region::centered(frame.width(), frame.height(), 0.5)),
        )
    }
}
