//! Request and response types for the `POST /predict` endpoint.
//!
//! The form sends whatever its three selects hold, so every field
//! serializes as a string (`{"hour": "13", "day": "Monday", "month": "7"}`).

use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{Display, EnumString};

/// Error returned when a form field cannot be parsed into its domain type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFieldError {
    /// Hour outside `0..=23` or not a number.
    #[error("invalid hour '{value}': expected 0-23")]
    Hour {
        /// The rejected input.
        value: String,
    },

    /// Unrecognized day-of-week name.
    #[error("invalid day '{value}': expected Monday-Sunday")]
    Day {
        /// The rejected input.
        value: String,
    },

    /// Month outside `1..=12` or an unknown month name.
    #[error("invalid month '{value}': expected 1-12 or a month name")]
    Month {
        /// The rejected input.
        value: String,
    },
}

/// Hour of day, `0..=23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hour(u8);

impl Hour {
    /// Creates an hour, returning `None` when `value > 23`.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= 23 { Some(Self(value)) } else { None }
    }

    /// Returns the hour as a number.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for Hour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Hour {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| ParseFieldError::Hour {
                value: s.to_string(),
            })
    }
}

impl Serialize for Hour {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Day of week, serialized with the capitalized name the model was
/// trained on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Weekday {
    /// Monday
    Monday,
    /// Tuesday
    Tuesday,
    /// Wednesday
    Wednesday,
    /// Thursday
    Thursday,
    /// Friday
    Friday,
    /// Saturday
    Saturday,
    /// Sunday
    Sunday,
}

impl Weekday {
    /// Returns all variants in select order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Monday,
            Self::Tuesday,
            Self::Wednesday,
            Self::Thursday,
            Self::Friday,
            Self::Saturday,
            Self::Sunday,
        ]
    }

    /// Converts from a zero-based offset where Monday is `0`.
    #[must_use]
    pub fn from_monday_offset(offset: u32) -> Self {
        Self::all()[(offset % 7) as usize]
    }

    /// Parses a form value, reporting failures as [`ParseFieldError`].
    ///
    /// # Errors
    ///
    /// Returns [`ParseFieldError::Day`] if `s` is not a day name.
    pub fn parse_field(s: &str) -> Result<Self, ParseFieldError> {
        s.trim().parse().map_err(|_| ParseFieldError::Day {
            value: s.to_string(),
        })
    }
}

/// Month of year, sent to the server as its number (`"1"`..`"12"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Month {
    /// January
    January = 1,
    /// February
    February,
    /// March
    March,
    /// April
    April,
    /// May
    May,
    /// June
    June,
    /// July
    July,
    /// August
    August,
    /// September
    September,
    /// October
    October,
    /// November
    November,
    /// December
    December,
}

impl Month {
    /// Returns all variants in calendar order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::January,
            Self::February,
            Self::March,
            Self::April,
            Self::May,
            Self::June,
            Self::July,
            Self::August,
            Self::September,
            Self::October,
            Self::November,
            Self::December,
        ]
    }

    /// Returns the month number, `1..=12`.
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Creates a month from its number.
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        if matches!(number, 1..=12) {
            Some(Self::all()[(number - 1) as usize])
        } else {
            None
        }
    }

    /// Three-letter option label (`"Jan"`).
    #[must_use]
    pub const fn abbrev(self) -> &'static str {
        match self {
            Self::January => "Jan",
            Self::February => "Feb",
            Self::March => "Mar",
            Self::April => "Apr",
            Self::May => "May",
            Self::June => "Jun",
            Self::July => "Jul",
            Self::August => "Aug",
            Self::September => "Sep",
            Self::October => "Oct",
            Self::November => "Nov",
            Self::December => "Dec",
        }
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl FromStr for Month {
    type Err = ParseFieldError;

    /// Accepts the month number or its name (full or abbreviated, any case).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(number) = trimmed.parse::<u8>() {
            return Self::from_number(number).ok_or_else(|| ParseFieldError::Month {
                value: s.to_string(),
            });
        }

        Self::all()
            .iter()
            .copied()
            .find(|m| {
                trimmed.eq_ignore_ascii_case(m.abbrev())
                    || trimmed.eq_ignore_ascii_case(&format!("{m:?}"))
            })
            .ok_or_else(|| ParseFieldError::Month {
                value: s.to_string(),
            })
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// JSON body of a `POST /predict` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PredictionQuery {
    /// Hour of day.
    pub hour: Hour,
    /// Day of week.
    pub day: Weekday,
    /// Month of year.
    pub month: Month,
}

/// Risk level reported by the prediction endpoint.
///
/// The server owns the set of levels (`"Low"`, `"Medium"`, `"High"`,
/// `"Danger"`...), so unknown values pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskLevel(pub String);

impl RiskLevel {
    /// Lower-cased style key used for the banner's severity class.
    ///
    /// Inner whitespace is joined with `-` so `"Very High"` stays one
    /// class (`very-high`).
    #[must_use]
    pub fn css_key(&self) -> String {
        self.0
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Risk probability, nominally in `[0, 1]`.
    pub prediction: f64,
    /// Risk level name.
    pub risk_level: RiskLevel,
    /// Human-readable summary.
    pub message: String,
}

impl PredictionResult {
    /// Prediction as a percentage, clamped to `[0, 100]`.
    ///
    /// Non-finite predictions render as `0`.
    #[must_use]
    pub fn percent(&self) -> f64 {
        let percent = self.prediction * 100.0;
        if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    /// Percentage with one decimal place, e.g. `"73.0%"`.
    #[must_use]
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.percent())
    }
}

/// Any JSON body the prediction endpoint can return.
///
/// A body carrying an `error` field is a failure even when other fields
/// are present.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    /// Application-level failure.
    Failure {
        /// Error text reported by the server.
        error: String,
    },
    /// Successful prediction.
    Success(PredictionResult),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_serializes_as_strings() {
        let query = PredictionQuery {
            hour: Hour::new(13).unwrap(),
            day: Weekday::Friday,
            month: Month::July,
        };
        let json = serde_json::to_value(query).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"hour": "13", "day": "Friday", "month": "7"})
        );
    }

    #[test]
    fn hour_rejects_out_of_range() {
        assert!(Hour::new(24).is_none());
        assert!("24".parse::<Hour>().is_err());
        assert!("abc".parse::<Hour>().is_err());
        assert_eq!("0".parse::<Hour>().unwrap().value(), 0);
        assert_eq!(" 23 ".parse::<Hour>().unwrap().value(), 23);
    }

    #[test]
    fn weekday_parses_case_insensitively() {
        assert_eq!("monday".parse::<Weekday>().unwrap(), Weekday::Monday);
        assert_eq!("SUNDAY".parse::<Weekday>().unwrap(), Weekday::Sunday);
        assert!(matches!(
            Weekday::parse_field("Funday"),
            Err(ParseFieldError::Day { .. })
        ));
        assert_eq!(Weekday::parse_field(" tuesday ").unwrap(), Weekday::Tuesday);
        assert_eq!(Weekday::from_monday_offset(6), Weekday::Sunday);
    }

    #[test]
    fn month_parses_numbers_and_names() {
        assert_eq!("7".parse::<Month>().unwrap(), Month::July);
        assert_eq!("jul".parse::<Month>().unwrap(), Month::July);
        assert_eq!("December".parse::<Month>().unwrap(), Month::December);
        assert!("13".parse::<Month>().is_err());
        assert!("0".parse::<Month>().is_err());
        for (i, month) in Month::all().iter().enumerate() {
            assert_eq!(usize::from(month.number()), i + 1);
        }
    }

    #[test]
    fn error_body_is_failure() {
        let body = serde_json::json!({"error": "model unavailable"});
        let response: PredictionResponse = serde_json::from_value(body).unwrap();
        assert_eq!(
            response,
            PredictionResponse::Failure {
                error: "model unavailable".to_string()
            }
        );
    }

    #[test]
    fn success_body_parses() {
        let body = serde_json::json!({
            "prediction": 0.73,
            "risk_level": "High",
            "message": "High risk detected"
        });
        let response: PredictionResponse = serde_json::from_value(body).unwrap();
        let PredictionResponse::Success(result) = response else {
            panic!("expected success");
        };
        assert_eq!(result.risk_level.css_key(), "high");
        assert!((result.percent() - 73.0).abs() < 1e-9);
        assert_eq!(result.percent_label(), "73.0%");
    }

    #[test]
    fn multi_word_level_is_one_class() {
        assert_eq!(RiskLevel(" Very  High ".to_string()).css_key(), "very-high");
        assert_eq!(RiskLevel("Danger".to_string()).css_key(), "danger");
    }

    #[test]
    fn percent_is_clamped() {
        let mut result = PredictionResult {
            prediction: 1.7,
            risk_level: RiskLevel("Danger".to_string()),
            message: String::new(),
        };
        assert!((result.percent() - 100.0).abs() < f64::EPSILON);
        result.prediction = -0.2;
        assert!(result.percent().abs() < f64::EPSILON);
        result.prediction = f64::NAN;
        assert_eq!(result.percent_label(), "0.0%");
    }
}
