use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of labels the classification service may return.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl Emotion {
    /// Every category in display order.
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Angry => "Angry",
            Emotion::Disgust => "Disgust",
            Emotion::Fear => "Fear",
            Emotion::Happy => "Happy",
            Emotion::Sad => "Sad",
            Emotion::Surprise => "Surprise",
            Emotion::Neutral => "Neutral",
        }
    }

    /// Chart colour used for this category's series and pie slice.
    pub fn color(&self) -> &'static str {
        match self {
            Emotion::Angry => "#ef4444",
            Emotion::Disgust => "#22c55e",
            Emotion::Fear => "#a855f7",
            Emotion::Happy => "#facc15",
            Emotion::Sad => "#3b82f6",
            Emotion::Surprise => "#f97316",
            Emotion::Neutral => "#06b6d4",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEmotion(pub String);

impl fmt::Display for UnknownEmotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown emotion label {:?}", self.0)
    }
}

impl std::error::Error for UnknownEmotion {}

impl FromStr for Emotion {
    type Err = UnknownEmotion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Emotion::ALL
            .iter()
            .copied()
            .find(|emotion| emotion.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownEmotion(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!("happy".parse::<Emotion>(), Ok(Emotion::Happy));
        assert_eq!(" Surprise ".parse::<Emotion>(), Ok(Emotion::Surprise));
        assert_eq!("NEUTRAL".parse::<Emotion>(), Ok(Emotion::Neutral));
    }

    #[test]
    fn rejects_labels_outside_the_set() {
        let err = "Contempt".parse::<Emotion>().unwrap_err();
        assert_eq!(err, UnknownEmotion("Contempt".to_string()));
    }

    #[test]
    fn display_order_is_stable() {
        let names: Vec<&str> = Emotion::ALL.iter().map(Emotion::as_str).collect();
        assert_eq!(
            names,
            vec!["Angry", "Disgust", "Fear", "Happy", "Sad", "Surprise", "Neutral"]
        );
    }
}
