//! Pose back-end identifiers and per-source constants.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Historical RMSE constants
// ---------------------------------------------------------------------------

/// Historical movement-regression RMSE for the YOLO-based model.
pub const RMSE_YOLO: f64 = 0.7082;
/// Historical movement-regression RMSE for the MoveNet-based model.
pub const RMSE_MOVENET: f64 = 1.7612;
/// Historical movement-regression RMSE for the MediaPipe-based model.
pub const RMSE_MEDIAPIPE: f64 = 0.9285;

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// One of the three independent pose-estimation back-ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Yolo,
    Movenet,
    Mediapipe,
}

impl Source {
    /// All sources, in the canonical fusion order.
    pub const ALL: [Source; 3] = [Source::Yolo, Source::Movenet, Source::Mediapipe];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yolo => "yolo",
            Self::Movenet => "movenet",
            Self::Mediapipe => "mediapipe",
        }
    }

    /// Fixed, externally supplied per-source error estimate used for
    /// inverse-error weighting of the continuous output. Not re-estimated
    /// at run time.
    pub fn default_rmse(self) -> f64 {
        match self {
            Self::Yolo => RMSE_YOLO,
            Self::Movenet => RMSE_MOVENET,
            Self::Mediapipe => RMSE_MEDIAPIPE,
        }
    }
}

impl std::str::FromStr for Source {
    type Err = CoreError;

    /// An unrecognized source identifier is a configuration error, never
    /// a silent no-op.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yolo" => Ok(Self::Yolo),
            "movenet" => Ok(Self::Movenet),
            "mediapipe" => Ok(Self::Mediapipe),
            other => Err(CoreError::Config(format!(
                "Unknown source '{other}'. Must be one of: yolo, movenet, mediapipe"
            ))),
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SourceSet
// ---------------------------------------------------------------------------

/// A value per source. Used for record streams, RMSE estimates, vote
/// weights, and model predictions so that per-source data always travels
/// as a complete triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceSet<T> {
    pub yolo: T,
    pub movenet: T,
    pub mediapipe: T,
}

impl<T> SourceSet<T> {
    /// Build a set by evaluating `f` once per source, in canonical order.
    pub fn from_fn(mut f: impl FnMut(Source) -> T) -> Self {
        Self {
            yolo: f(Source::Yolo),
            movenet: f(Source::Movenet),
            mediapipe: f(Source::Mediapipe),
        }
    }

    pub fn get(&self, source: Source) -> &T {
        match source {
            Source::Yolo => &self.yolo,
            Source::Movenet => &self.movenet,
            Source::Mediapipe => &self.mediapipe,
        }
    }

    pub fn get_mut(&mut self, source: Source) -> &mut T {
        match source {
            Source::Yolo => &mut self.yolo,
            Source::Movenet => &mut self.movenet,
            Source::Mediapipe => &mut self.mediapipe,
        }
    }

    /// Borrow the three values in canonical source order.
    pub fn as_array(&self) -> [&T; 3] {
        [&self.yolo, &self.movenet, &self.mediapipe]
    }

    pub fn map<U>(&self, mut f: impl FnMut(Source, &T) -> U) -> SourceSet<U> {
        SourceSet {
            yolo: f(Source::Yolo, &self.yolo),
            movenet: f(Source::Movenet, &self.movenet),
            mediapipe: f(Source::Mediapipe, &self.mediapipe),
        }
    }

    /// Map each value through a fallible function, short-circuiting on the
    /// first error.
    pub fn try_map<U, E>(
        &self,
        mut f: impl FnMut(Source, &T) -> Result<U, E>,
    ) -> Result<SourceSet<U>, E> {
        Ok(SourceSet {
            yolo: f(Source::Yolo, &self.yolo)?,
            movenet: f(Source::Movenet, &self.movenet)?,
            mediapipe: f(Source::Mediapipe, &self.mediapipe)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::str::FromStr;

    #[test]
    fn source_round_trips_through_str() {
        for source in Source::ALL {
            assert_eq!(Source::from_str(source.as_str()).unwrap(), source);
        }
    }

    #[test]
    fn unknown_source_is_config_error() {
        assert_matches!(Source::from_str("openpose"), Err(CoreError::Config(_)));
        assert_matches!(Source::from_str(""), Err(CoreError::Config(_)));
    }

    #[test]
    fn default_rmse_matches_historical_values() {
        assert_eq!(Source::Yolo.default_rmse(), 0.7082);
        assert_eq!(Source::Movenet.default_rmse(), 1.7612);
        assert_eq!(Source::Mediapipe.default_rmse(), 0.9285);
    }

    #[test]
    fn source_set_get_matches_field() {
        let set = SourceSet {
            yolo: 1,
            movenet: 2,
            mediapipe: 3,
        };
        assert_eq!(*set.get(Source::Yolo), 1);
        assert_eq!(*set.get(Source::Movenet), 2);
        assert_eq!(*set.get(Source::Mediapipe), 3);
        assert_eq!(set.as_array(), [&1, &2, &3]);
    }

    #[test]
    fn source_set_from_fn_uses_canonical_order() {
        let mut seen = Vec::new();
        let set = SourceSet::from_fn(|s| {
            seen.push(s);
            s.as_str()
        });
        assert_eq!(seen, Source::ALL.to_vec());
        assert_eq!(set.yolo, "yolo");
        assert_eq!(set.mediapipe, "mediapipe");
    }

    #[test]
    fn source_set_try_map_short_circuits() {
        let set = SourceSet {
            yolo: 1,
            movenet: -1,
            mediapipe: 1,
        };
        let result: Result<SourceSet<i32>, &str> = set.try_map(|_, v| {
            if *v < 0 {
                Err("negative")
            } else {
                Ok(*v * 10)
            }
        });
        assert_eq!(result.unwrap_err(), "negative");
    }
}
