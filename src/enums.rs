use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString, VariantNames};

/// Semantic names of the face landmarks used by the servo mappings.
#[derive(
    Debug, PartialEq, Eq, Hash, Clone, Copy, EnumString, EnumIter, AsRefStr, Display, VariantNames,
)]
#[strum(serialize_all = "camelCase")]
pub enum LandmarkName {
    LeftEyeOuter,
    RightEyeOuter,
    LeftEyebrow,
    LeftEyebrowCorner,
    RightEyebrow,
    RightEyebrowCorner,
    MiddleEyebrow,
    LeftEyeball,
    LeftUpperEyelid,
    LeftLowerEyelid,
    RightUpperEyelid,
    RightLowerEyelid,
    LeftUpperMouth,
    LeftLowerMouth,
    RightUpperMouth,
    RightLowerMouth,
    RightUpperCheek,
    RightLowerCheek,
    LeftUpperCheek,
    LeftLowerCheek,
    NoseTip,
    UpperLip,
    LowerLip,
    // Placeholder of the reference point when only the position of the other
    // point matters.
    Zero,
}

impl LandmarkName {
    /// Get the index of the landmark in the snapshot.
    ///
    /// # Returns
    /// 0-based index.
    pub fn index(&self) -> usize {
        match self {
            LandmarkName::LeftEyeOuter => 359,
            LandmarkName::RightEyeOuter => 130,
            LandmarkName::LeftEyebrow => 336,
            LandmarkName::LeftEyebrowCorner => 300,
            LandmarkName::RightEyebrow => 107,
            LandmarkName::RightEyebrowCorner => 70,
            LandmarkName::MiddleEyebrow => 8,
            LandmarkName::LeftEyeball => 473,
            LandmarkName::LeftUpperEyelid => 386,
            LandmarkName::LeftLowerEyelid => 374,
            LandmarkName::RightUpperEyelid => 159,
            LandmarkName::RightLowerEyelid => 145,
            LandmarkName::LeftUpperMouth => 391,
            LandmarkName::LeftLowerMouth => 314,
            LandmarkName::RightUpperMouth => 37,
            LandmarkName::RightLowerMouth => 84,
            LandmarkName::RightUpperCheek => 207,
            LandmarkName::RightLowerCheek => 214,
            LandmarkName::LeftUpperCheek => 427,
            LandmarkName::LeftLowerCheek => 434,
            LandmarkName::NoseTip => 4,
            LandmarkName::UpperLip => 11,
            LandmarkName::LowerLip => 16,
            LandmarkName::Zero => 0,
        }
    }
}

/// Metric between the two points of a servo mapping.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Distance,
}

/// Command status.
#[derive(Debug, VariantNames, AsRefStr)]
pub enum CommandStatus {
    Success,
    Fail,
    Ack,
    NoAck,
}

/// Reason to skip a whole dispatch cycle.
#[derive(Debug, PartialEq, Eq, Clone, Copy, AsRefStr)]
pub enum SkipReason {
    // The snapshot is absent, too short, or lacks the eye and nose points.
    NotReady,
    // The snapshot came too soon after the last accepted one.
    RateLimited,
    // The eye corners coincide or the geometry is not finite.
    DegenerateGeometry,
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::str::FromStr;
    use strum::{IntoEnumIterator, VariantNames};

    use crate::constants::NUM_LANDMARK;

    #[test]
    fn test_landmark_name_from_str() {
        assert_eq!(
            LandmarkName::from_str("leftEyeOuter").unwrap(),
            LandmarkName::LeftEyeOuter
        );
        assert_eq!(
            LandmarkName::from_str("rightLowerCheek").unwrap(),
            LandmarkName::RightLowerCheek
        );
        assert_eq!(LandmarkName::from_str("zero").unwrap(), LandmarkName::Zero);

        assert!(LandmarkName::from_str("LeftEyeOuter").is_err());
        assert!(LandmarkName::from_str("chin").is_err());
    }

    #[test]
    fn test_landmark_name_display() {
        assert_eq!(LandmarkName::NoseTip.to_string(), "noseTip");
        assert_eq!(LandmarkName::MiddleEyebrow.as_ref(), "middleEyebrow");
    }

    #[test]
    fn test_landmark_name_index() {
        assert_eq!(LandmarkName::VARIANTS.len(), 24);

        assert_eq!(LandmarkName::LeftEyeOuter.index(), 359);
        assert_eq!(LandmarkName::RightEyeOuter.index(), 130);
        assert_eq!(LandmarkName::NoseTip.index(), 4);
        assert_eq!(LandmarkName::Zero.index(), 0);

        // Every landmark is inside a ready snapshot and no two names share
        // an index.
        let indices: HashSet<usize> = LandmarkName::iter().map(|name| name.index()).collect();

        assert_eq!(indices.len(), LandmarkName::VARIANTS.len());
        assert!(indices.iter().all(|index| *index < NUM_LANDMARK));
    }

    #[test]
    fn test_axis_serde() {
        assert_eq!(serde_json::to_string(&Axis::Distance).unwrap(), "\"distance\"");
        assert_eq!(serde_json::from_str::<Axis>("\"x\"").unwrap(), Axis::X);
        assert!(serde_json::from_str::<Axis>("\"z\"").is_err());

        assert_eq!(Axis::Y.as_ref(), "y");
    }
}
