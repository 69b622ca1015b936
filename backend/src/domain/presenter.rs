//! Result presentation returned to the visitor after a roast.

use serde::Serialize;
use utoipa::ToSchema;

use super::{CapturedImage, EvaluationResult};

/// Notice shown alongside every result.
pub const IMAGE_DISCARDED_NOTICE: &str =
    "Your image has been discarded and was not stored or shared.";

/// Rendered roast outcome.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoastPresentation {
    #[schema(example = 8.4)]
    pub score: f64,
    #[schema(example = "8.4/10")]
    pub score_label: String,
    #[schema(example = "Captain Selfie")]
    pub nickname: String,
    #[schema(example = "Bold lighting choice.")]
    pub roast: String,
    /// The captured image, echoed back for display only.
    #[schema(example = "data:image/jpeg;base64,/9j/4AAQ...")]
    pub image_data_url: String,
    /// Always `false`: the image is never persisted.
    pub image_retained: bool,
    #[schema(example = "Your image has been discarded and was not stored or shared.")]
    pub notice: String,
}

/// Build the presentation for `evaluation` and the image it was made from.
pub fn present(evaluation: &EvaluationResult, image: &CapturedImage) -> RoastPresentation {
    let score = evaluation.score();
    RoastPresentation {
        score: score.value(),
        score_label: score.label(),
        nickname: evaluation.nickname().to_owned(),
        roast: evaluation.roast().to_owned(),
        image_data_url: image.to_data_url(),
        image_retained: false,
        notice: IMAGE_DISCARDED_NOTICE.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image::test_images;
    use crate::domain::RoastScore;

    #[test]
    fn renders_score_label_and_notice() {
        let evaluation = EvaluationResult::new(
            RoastScore::clamped(8.44).expect("finite"),
            "Captain Selfie",
            "Bold lighting choice.",
        )
        .expect("valid evaluation");
        let image = test_images::jpeg(2, 2);

        let presentation = present(&evaluation, &image);

        assert_eq!(presentation.score, 8.4);
        assert_eq!(presentation.score_label, "8.4/10");
        assert!(!presentation.image_retained);
        assert_eq!(presentation.notice, IMAGE_DISCARDED_NOTICE);
        assert!(presentation.image_data_url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn whole_scores_keep_one_decimal() {
        let evaluation = EvaluationResult::new(RoastScore::clamped(10.0).expect("finite"), "X", "Y")
            .expect("valid evaluation");
        let presentation = present(&evaluation, &test_images::png(1, 1));
        assert_eq!(presentation.score_label, "10.0/10");
    }
}
