// THEORY:
// A `SortPolicy` names the scalar key a `Color` is ordered by during a line
// sort. The set of policies is closed: names are parsed once, at the API
// boundary, so an unknown name is rejected before a single line is touched
// instead of blowing up inside a worker halfway through a sort.

use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// The key a line sort orders pixels by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortPolicy {
    /// A fresh uniform draw in [0, 1) per pixel. Fully scrambles the line.
    Random,
    /// `position / 4 + uniform[0, 25)`. Keeps the coarse order, jitters locally.
    SemiRandom,
    /// Hue.
    Hue,
    /// Hue shifted by 0.15, with near-gray pixels pushed 900 below everything else.
    HueGrayFirst,
    /// Negative perceptual luminance, so the brightest pixel sorts first.
    Value,
    /// Saturation.
    Saturation,
}

impl SortPolicy {
    pub const ALL: [SortPolicy; 6] = [
        SortPolicy::Random,
        SortPolicy::SemiRandom,
        SortPolicy::Hue,
        SortPolicy::HueGrayFirst,
        SortPolicy::Value,
        SortPolicy::Saturation,
    ];

    /// The short name used on the command line and in recipes.
    pub fn name(self) -> &'static str {
        match self {
            SortPolicy::Random => "random",
            SortPolicy::SemiRandom => "semirandom",
            SortPolicy::Hue => "h",
            SortPolicy::HueGrayFirst => "h2",
            SortPolicy::Value => "v",
            SortPolicy::Saturation => "s",
        }
    }

    /// Whether computing the key draws from a random generator.
    pub fn is_random(self) -> bool {
        matches!(self, SortPolicy::Random | SortPolicy::SemiRandom)
    }
}

impl FromStr for SortPolicy {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        SortPolicy::ALL
            .into_iter()
            .find(|policy| policy.name() == name)
            .ok_or_else(|| Error::UnknownPolicy(name.to_string()))
    }
}

impl fmt::Display for SortPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
