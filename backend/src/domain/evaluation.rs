//! Parsing and validation of evaluator responses.
//!
//! The evaluator is an untrusted text generator. Its reply is parsed into an
//! [`EvaluationOutcome`]: either a fully validated [`EvaluationResult`] or the
//! reason it was rejected. Nothing downstream ever sees a partial result.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Lowest score a roast can carry.
pub const SCORE_MIN: f64 = 7.0;
/// Highest score a roast can carry.
pub const SCORE_MAX: f64 = 10.0;

/// Score in `[SCORE_MIN, SCORE_MAX]`, rounded to one decimal.
///
/// # Examples
/// ```
/// use roasted::domain::RoastScore;
///
/// let score = RoastScore::clamped(11.0).expect("finite score");
/// assert_eq!(score.value(), 10.0);
/// assert_eq!(score.label(), "10.0/10");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct RoastScore(f64);

impl RoastScore {
    /// Clamp a raw score into range and round it to one decimal place.
    pub fn clamped(raw: f64) -> Result<Self, EvaluationRejection> {
        if !raw.is_finite() {
            return Err(EvaluationRejection::NonFiniteScore);
        }
        let bounded = raw.clamp(SCORE_MIN, SCORE_MAX);
        Ok(Self((bounded * 10.0).round() / 10.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Human-facing label such as `8.4/10`.
    pub fn label(self) -> String {
        format!("{self}/10")
    }
}

impl fmt::Display for RoastScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

impl Serialize for RoastScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for RoastScore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        Self::clamped(raw).map_err(serde::de::Error::custom)
    }
}

/// Why an evaluator reply was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationRejection {
    #[error("evaluation reply is not valid JSON: {message}")]
    NotJson { message: String },
    #[error("evaluation reply is not a JSON object")]
    NotAnObject,
    #[error("evaluation reply is missing `{field}`")]
    MissingField { field: &'static str },
    #[error("evaluation field `{field}` is blank")]
    BlankField { field: &'static str },
    #[error("evaluation field `{field}` has the wrong type")]
    WrongType { field: &'static str },
    #[error("evaluation score is not a number")]
    NonNumericScore,
    #[error("evaluation score is not finite")]
    NonFiniteScore,
}

/// Validated evaluator output.
///
/// ## Invariants
/// - `score` lies in `[7.0, 10.0]` with one decimal place.
/// - `nickname` and `roast` are non-empty once trimmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "EvaluationResultDto")]
pub struct EvaluationResult {
    score: RoastScore,
    nickname: String,
    roast: String,
}

impl EvaluationResult {
    /// Build a result from already-typed parts, trimming the text fields.
    pub fn new(
        score: RoastScore,
        nickname: impl AsRef<str>,
        roast: impl AsRef<str>,
    ) -> Result<Self, EvaluationRejection> {
        let nickname = nickname.as_ref().trim();
        if nickname.is_empty() {
            return Err(EvaluationRejection::BlankField { field: "nickname" });
        }
        let roast = roast.as_ref().trim();
        if roast.is_empty() {
            return Err(EvaluationRejection::BlankField { field: "roast" });
        }
        Ok(Self {
            score,
            nickname: nickname.to_owned(),
            roast: roast.to_owned(),
        })
    }

    pub fn score(&self) -> RoastScore {
        self.score
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn roast(&self) -> &str {
        &self.roast
    }
}

#[derive(Deserialize)]
struct EvaluationResultDto {
    score: RoastScore,
    nickname: String,
    roast: String,
}

impl TryFrom<EvaluationResultDto> for EvaluationResult {
    type Error = EvaluationRejection;

    fn try_from(value: EvaluationResultDto) -> Result<Self, Self::Error> {
        Self::new(value.score, value.nickname, value.roast)
    }
}

/// Result of parsing an evaluator reply.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    Valid(EvaluationResult),
    Invalid(EvaluationRejection),
}

impl EvaluationOutcome {
    /// Collapse into a `Result` for `?`-style propagation.
    pub fn into_result(self) -> Result<EvaluationResult, EvaluationRejection> {
        match self {
            Self::Valid(result) => Ok(result),
            Self::Invalid(reason) => Err(reason),
        }
    }
}

/// Parse and validate a raw evaluator reply.
///
/// Markdown code fences around the JSON object are tolerated. The score may
/// be a JSON number or a numeric string; out-of-range values are clamped.
///
/// # Examples
/// ```
/// use roasted::domain::{EvaluationOutcome, parse_evaluation};
///
/// let outcome = parse_evaluation(r#"{"score": 11, "nickname": "X", "roast": "Y"}"#);
/// let EvaluationOutcome::Valid(result) = outcome else { panic!("expected valid") };
/// assert_eq!(result.score().value(), 10.0);
/// ```
pub fn parse_evaluation(raw: &str) -> EvaluationOutcome {
    match parse_inner(raw) {
        Ok(result) => EvaluationOutcome::Valid(result),
        Err(reason) => EvaluationOutcome::Invalid(reason),
    }
}

fn parse_inner(raw: &str) -> Result<EvaluationResult, EvaluationRejection> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body).map_err(|err| EvaluationRejection::NotJson {
        message: err.to_string(),
    })?;
    let Value::Object(fields) = value else {
        return Err(EvaluationRejection::NotAnObject);
    };

    let score = read_score(&fields)?;
    let nickname = read_text(&fields, "nickname")?;
    let roast = read_text(&fields, "roast")?;
    EvaluationResult::new(score, nickname, roast)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`, `JSON`, ...) on the opening fence line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

fn read_score(fields: &Map<String, Value>) -> Result<RoastScore, EvaluationRejection> {
    let raw = match fields.get("score") {
        None | Some(Value::Null) => return Err(EvaluationRejection::MissingField { field: "score" }),
        Some(Value::Number(number)) => number
            .as_f64()
            .ok_or(EvaluationRejection::NonNumericScore)?,
        Some(Value::String(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(EvaluationRejection::BlankField { field: "score" });
            }
            text.parse::<f64>()
                .map_err(|_| EvaluationRejection::NonNumericScore)?
        }
        Some(_) => return Err(EvaluationRejection::NonNumericScore),
    };
    RoastScore::clamped(raw)
}

fn read_text<'a>(
    fields: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, EvaluationRejection> {
    match fields.get(field) {
        None | Some(Value::Null) => Err(EvaluationRejection::MissingField { field }),
        Some(Value::String(text)) if text.trim().is_empty() => {
            Err(EvaluationRejection::BlankField { field })
        }
        Some(Value::String(text)) => Ok(text.as_str()),
        Some(_) => Err(EvaluationRejection::WrongType { field }),
    }
}
