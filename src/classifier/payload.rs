use image::{imageops, ImageFormat, RgbImage};
use std::io::Cursor;

use super::ClassifyError;
use crate::vision::PixelRect;

pub const PAYLOAD_MIME: &str = "image/png";
pub const PAYLOAD_FILE_NAME: &str = "face.png";

/// Encoded face crop ready to attach to a classification request.
#[derive(Debug, Clone)]
pub struct FacePayload {
    pub bytes: Vec<u8>,
    pub rect: PixelRect,
}

impl FacePayload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Cut `rect` out of `image` and PNG-encode it.
///
/// `rect` must already be clamped to the image bounds.
pub fn encode_crop(image: &RgbImage, rect: PixelRect) -> Result<FacePayload, ClassifyError> {
    let fits = rect.width > 0
        && rect.height > 0
        && rect.x.saturating_add(rect.width) <= image.width()
        && rect.y.saturating_add(rect.height) <= image.height();
    if !fits {
        return Err(ClassifyError::Encode(format!(
            "crop {}x{}+{}+{} outside {}x{} frame",
            rect.width,
            rect.height,
            rect.x,
            rect.y,
            image.width(),
            image.height()
        )));
    }

    let crop = imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image();

    let mut cursor = Cursor::new(Vec::new());
    crop.write_to(&mut cursor, ImageFormat::Png)
        .map_err(|err| ClassifyError::Encode(err.to_string()))?;

    Ok(FacePayload {
        bytes: cursor.into_inner(),
        rect,
    })
}
