use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use image::RgbImage;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

const ENABLE_LOGS: bool = true;

use crate::log_info;

const STILL_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// One captured video frame. Cloning shares the pixel buffer.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: Arc<RgbImage>,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self::from_shared(Arc::new(image))
    }

    pub fn from_shared(image: Arc<RgbImage>) -> Self {
        Self {
            image,
            captured_at: Utc::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Anything that can hand out the current video frame.
///
/// `None` means the source is not ready yet (camera warming up, no frame
/// decoded); the tick that asked simply does nothing.
pub trait FrameSource: Send + Sync + 'static {
    fn current_frame(&self) -> Option<Frame>;
}

/// Frame source fed by a capture thread through a watch channel.
pub struct LatestFrameSource {
    rx: watch::Receiver<Option<Frame>>,
}

impl LatestFrameSource {
    /// Returns the source plus the sender a capture loop publishes into.
    pub fn channel() -> (watch::Sender<Option<Frame>>, Self) {
        let (tx, rx) = watch::channel(None);
        (tx, Self { rx })
    }
}

impl FrameSource for LatestFrameSource {
    fn current_frame(&self) -> Option<Frame> {
        self.rx.borrow().clone()
    }
}

/// Cycles through a fixed list of still images, one per request.
pub struct StillFrameSource {
    frames: Vec<Arc<RgbImage>>,
    cursor: AtomicUsize,
}

impl StillFrameSource {
    pub fn from_images(images: Vec<RgbImage>) -> Self {
        Self {
            frames: images.into_iter().map(Arc::new).collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Load every still image in `dir`, in file-name order.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read frames directory {}", dir.display()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("failed to list {}", dir.display()))?
                .path();
            let is_still = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| {
                    STILL_EXTENSIONS
                        .iter()
                        .any(|known| ext.eq_ignore_ascii_case(known))
                })
                .unwrap_or(false);
            if is_still {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            bail!("no still images found in {}", dir.display());
        }

        let mut images = Vec::with_capacity(paths.len());
        for path in &paths {
            let image = image::open(path)
                .with_context(|| format!("failed to decode frame {}", path.display()))?
                .to_rgb8();
            images.push(image);
        }

        log_info!("Loaded {} still frames from {}", images.len(), dir.display());
        Ok(Self::from_images(images))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for StillFrameSource {
    fn current_frame(&self) -> Option<Frame> {
        if self.frames.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.frames.len();
        Some(Frame::from_shared(Arc::clone(&self.frames[index])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn still_source_cycles_through_frames() {
        let source = StillFrameSource::from_images(vec![
            RgbImage::from_pixel(4, 4, Rgb([1, 1, 1])),
            RgbImage::from_pixel(8, 8, Rgb([2, 2, 2])),
        ]);

        let widths: Vec<u32> = (0..5)
            .map(|_| source.current_frame().unwrap().width())
            .collect();
        assert_eq!(widths, vec![4, 8, 4, 8, 4]);
    }

    #[test]
    fn empty_still_source_is_never_ready() {
        let source = StillFrameSource::from_images(Vec::new());
        assert!(source.current_frame().is_none());
    }

    #[test]
    fn latest_source_reports_published_frame() {
        let (tx, source) = LatestFrameSource::channel();
        assert!(source.current_frame().is_none());

        tx.send_replace(Some(Frame::new(RgbImage::new(16, 9))));
        let frame = source.current_frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (16, 9));
    }

    #[test]
    fn from_dir_loads_stills_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::new(6, 6).save(dir.path().join("b.png")).unwrap();
        RgbImage::new(3, 3).save(dir.path().join("a.png")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();

        let source = StillFrameSource::from_dir(dir.path()).unwrap();
        assert_eq!(source.len(), 2);
        assert_eq!(source.current_frame().unwrap().width(), 3);
        assert_eq!(source.current_frame().unwrap().width(), 6);
    }

    #[test]
    fn from_dir_rejects_missing_or_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(StillFrameSource::from_dir(dir.path()).is_err());
        assert!(StillFrameSource::from_dir(&dir.path().join("missing")).is_err());
    }
}
