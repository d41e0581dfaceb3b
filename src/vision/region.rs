use serde::{Deserialize, Serialize};

/// Bounding box of a detected face, in frame-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// X coordinate of the top-left corner (pixels).
    pub x: f64,
    /// Y coordinate of the top-left corner (pixels).
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Whole-pixel rectangle fully contained in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Region covering `fraction` of each frame dimension, centred.
    pub fn centered(frame_width: u32, frame_height: u32, fraction: f64) -> Self {
        let fraction = fraction.clamp(0.0, 1.0);
        let width = frame_width as f64 * fraction;
        let height = frame_height as f64 * fraction;
        Self {
            x: (frame_width as f64 - width) / 2.0,
            y: (frame_height as f64 - height) / 2.0,
            width,
            height,
        }
    }

    /// Clamp to a `frame_width` x `frame_height` frame and round to whole pixels.
    ///
    /// Returns `None` when nothing of the region remains inside the frame.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<PixelRect> {
        if ![self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
        {
            return None;
        }

        let max_x = frame_width as f64;
        let max_y = frame_height as f64;
        let left = self.x.round().clamp(0.0, max_x);
        let top = self.y.round().clamp(0.0, max_y);
        let right = (self.x + self.width).round().clamp(0.0, max_x);
        let bottom = (self.y + self.height).round().clamp(0.0, max_y);

        if right <= left || bottom <= top {
            return None;
        }

        Some(PixelRect {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inside_region_rounds_to_pixels() {
        let rect = Region::new(10.4, 20.6, 50.2, 40.0).clamp_to(640, 480).unwrap();
        assert_eq!(
            rect,
            PixelRect {
                x: 10,
                y: 21,
                width: 51,
                height: 40
            }
        );
    }

    #[test]
    fn region_hanging_off_the_edge_is_clipped() {
        let rect = Region::new(-20.0, 400.0, 100.0, 200.0).clamp_to(640, 480).unwrap();
        assert_eq!(rect.x, 0);
        assert_eq!(rect.width, 80);
        assert_eq!(rect.y, 400);
        assert_eq!(rect.height, 80);
    }

    #[test]
    fn region_outside_frame_is_empty() {
        assert_eq!(Region::new(700.0, 10.0, 50.0, 50.0).clamp_to(640, 480), None);
        assert_eq!(Region::new(10.0, 10.0, 0.0, 50.0).clamp_to(640, 480), None);
        assert_eq!(Region::new(f64::NAN, 10.0, 5.0, 5.0).clamp_to(640, 480), None);
    }

    #[test]
    fn centered_half_region() {
        let region = Region::centered(200, 100, 0.5);
        assert_eq!(region, Region::new(50.0, 25.0, 100.0, 50.0));
    }
}
