pub mod client;
pub mod error;
pub mod payload;
pub mod response;
pub(crate) mod types;

pub use client::{Classifier, HttpClassifier};
pub use error::ClassifyError;
pub use payload::{encode_crop, FacePayload};
pub use response::parse_predict_body;
pub use types::ClassificationResult;
