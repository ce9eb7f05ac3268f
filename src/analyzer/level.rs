use std::cmp::Ordering;
use std::fmt;

/// Perceived connection quality of one (direction, media kind) channel.
///
/// The five produced levels are totally ordered, higher is better:
///
/// `NoTransmittedData < VeryBad < Bad < Medium < Good`
///
/// [`QualityLevel::Unknown`] is not a verdict but the absence of one: the
/// channel is still warming up, the transport is not connected, or the
/// analyzer was just reset. It takes no part in the ordering, so
/// comparisons against it return `None`:
///
/// ```
/// use rtc_quality::analyzer::QualityLevel;
///
/// assert!(QualityLevel::Good > QualityLevel::Bad);
/// assert!(QualityLevel::VeryBad > QualityLevel::NoTransmittedData);
/// assert_eq!(
///     QualityLevel::Unknown.partial_cmp(&QualityLevel::Good),
///     None
/// );
/// ```
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum QualityLevel {
    /// Everything sent over the window was lost, or the local counter has
    /// not advanced for three consecutive ticks.
    NoTransmittedData,
    /// Heavy loss, starved throughput or a round trip above one second.
    VeryBad,
    Bad,
    Medium,
    Good,
    /// No verdict held.
    #[default]
    Unknown,
}

impl QualityLevel {
    fn ordinal(&self) -> Option<u8> {
        match self {
            QualityLevel::NoTransmittedData => Some(0),
            QualityLevel::VeryBad => Some(1),
            QualityLevel::Bad => Some(2),
            QualityLevel::Medium => Some(3),
            QualityLevel::Good => Some(4),
            QualityLevel::Unknown => None,
        }
    }

    /// Returns true when a verdict is held.
    pub fn is_known(&self) -> bool {
        *self != QualityLevel::Unknown
    }
}

impl PartialOrd for QualityLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.ordinal(), other.ordinal()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            (None, None) => Some(Ordering::Equal),
            _ => None,
        }
    }
}

const LEVEL_NO_TRANSMITTED_DATA_STR: &str = "no-transmitted-data";
const LEVEL_VERY_BAD_STR: &str = "very-bad";
const LEVEL_BAD_STR: &str = "bad";
const LEVEL_MEDIUM_STR: &str = "medium";
const LEVEL_GOOD_STR: &str = "good";
const LEVEL_UNKNOWN_STR: &str = "unknown";

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            QualityLevel::NoTransmittedData => LEVEL_NO_TRANSMITTED_DATA_STR,
            QualityLevel::VeryBad => LEVEL_VERY_BAD_STR,
            QualityLevel::Bad => LEVEL_BAD_STR,
            QualityLevel::Medium => LEVEL_MEDIUM_STR,
            QualityLevel::Good => LEVEL_GOOD_STR,
            QualityLevel::Unknown => LEVEL_UNKNOWN_STR,
        };
        write!(f, "{s}")
    }
}

impl From<&str> for QualityLevel {
    fn from(raw: &str) -> Self {
        match raw {
            LEVEL_NO_TRANSMITTED_DATA_STR => QualityLevel::NoTransmittedData,
            LEVEL_VERY_BAD_STR => QualityLevel::VeryBad,
            LEVEL_BAD_STR => QualityLevel::Bad,
            LEVEL_MEDIUM_STR => QualityLevel::Medium,
            LEVEL_GOOD_STR => QualityLevel::Good,
            _ => QualityLevel::Unknown,
        }
    }
}
