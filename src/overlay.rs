use image::{Rgba, RgbaImage};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

use crate::classifier::ClassificationResult;
use crate::vision::Region;

pub const BOX_COLOR: Rgba<u8> = Rgba([0x00, 0xff, 0x88, 0xff]);
pub const BOX_LINE_WIDTH: u32 = 3;
/// Label baseline sits this far above the box.
pub const LABEL_OFFSET: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayLabel {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// What to draw over the video for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    pub tick: u64,
    pub frame_width: u32,
    pub frame_height: u32,
    pub region: Option<Region>,
    pub label: Option<OverlayLabel>,
}

impl Overlay {
    /// Pure function of one tick's locator and classifier output.
    pub fn render(
        tick: u64,
        frame_width: u32,
        frame_height: u32,
        region: Option<Region>,
        result: Option<&ClassificationResult>,
    ) -> Self {
        let label = match (region, result) {
            (Some(region), Some(result)) => Some(OverlayLabel {
                text: result.caption(),
                x: region.x,
                y: region.y - LABEL_OFFSET,
            }),
            _ => None,
        };

        Self {
            tick,
            frame_width,
            frame_height,
            region,
            label,
        }
    }

    /// Draw the face box onto a transparent surface the size of the frame.
    ///
    /// Text is left to the UI sink; `label` carries its content and anchor.
    pub fn rasterize(&self) -> RgbaImage {
        let mut surface = RgbaImage::new(self.frame_width, self.frame_height);
        let Some(rect) = self
            .region
            .and_then(|region| region.clamp_to(self.frame_width, self.frame_height))
        else {
            return surface;
        };

        let right = rect.x + rect.width - 1;
        let bottom = rect.y + rect.height - 1;
        // strokes never cross the opposite edge of a box thinner than the line
        for t in 0..BOX_LINE_WIDTH.min(rect.height) {
            for x in rect.x..=right {
                stroke(&mut surface, x, rect.y + t);
                stroke(&mut surface, x, bottom - t);
            }
        }
        for t in 0..BOX_LINE_WIDTH.min(rect.width) {
            for y in rect.y..=bottom {
                stroke(&mut surface, rect.x + t, y);
                stroke(&mut surface, right - t, y);
            }
        }
        surface
    }
}

fn stroke(surface: &mut RgbaImage, x: u32, y: u32) {
    if let Some(pixel) = surface.get_pixel_mut_checked(x, y) {
        *pixel = BOX_COLOR;
    }
}

/// Publishes the overlay for the newest tick.
///
/// Each tick clears and redraws; a label arriving for an older tick is
/// dropped instead of decorating a newer frame.
#[derive(Clone)]
pub struct OverlayRenderer {
    tx: Arc<watch::Sender<Overlay>>,
}

impl OverlayRenderer {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Overlay::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Overlay {
        self.tx.borrow().clone()
    }

    /// Clear and draw the box (if any) for `tick`. Older ticks are ignored.
    pub fn begin_tick(&self, tick: u64, frame_width: u32, frame_height: u32, region: Option<Region>) -> bool {
        self.tx.send_if_modified(|overlay| {
            if tick < overlay.tick {
                return false;
            }
            *overlay = Overlay::render(tick, frame_width, frame_height, region, None);
            true
        })
    }

    /// Add the classification caption, only while `tick` is still on screen.
    pub fn attach_label(&self, tick: u64, result: &ClassificationResult) -> bool {
        self.tx.send_if_modified(|overlay| {
            if overlay.tick != tick || overlay.region.is_none() {
                return false;
            }
            *overlay = Overlay::render(
                tick,
                overlay.frame_width,
                overlay.frame_height,
                overlay.region,
                Some(result),
            );
            true
        })
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new()
    }
}
