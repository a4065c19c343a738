//! Builds the final instruction sent to the model from the user's text and
//! the brightness/contrast/saturation sliders.

use crate::error::{EditError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ADJUSTMENT_MIN: i32 = -50;
pub const ADJUSTMENT_MAX: i32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Adjustment {
    Brightness,
    Contrast,
    Saturation,
}

impl Adjustment {
    /// Order in which clauses are emitted.
    pub const ALL: [Adjustment; 3] = [
        Adjustment::Brightness,
        Adjustment::Contrast,
        Adjustment::Saturation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Adjustment::Brightness => "brightness",
            Adjustment::Contrast => "contrast",
            Adjustment::Saturation => "saturation",
        }
    }
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentSet {
    brightness: i32,
    contrast: i32,
    saturation: i32,
}

impl AdjustmentSet {
    pub fn new(brightness: i32, contrast: i32, saturation: i32) -> Result<Self> {
        let mut set = Self::default();
        for (adjustment, value) in Adjustment::ALL
            .into_iter()
            .zip([brightness, contrast, saturation])
        {
            if !(ADJUSTMENT_MIN..=ADJUSTMENT_MAX).contains(&value) {
                return Err(EditError::ValidationError(format!(
                    "{} must be between {} and {}, got {}",
                    adjustment, ADJUSTMENT_MIN, ADJUSTMENT_MAX, value
                )));
            }
            set.set(adjustment, value);
        }
        Ok(set)
    }

    pub fn get(&self, adjustment: Adjustment) -> i32 {
        match adjustment {
            Adjustment::Brightness => self.brightness,
            Adjustment::Contrast => self.contrast,
            Adjustment::Saturation => self.saturation,
        }
    }

    /// Slider input; values outside the range are clamped.
    pub fn set(&mut self, adjustment: Adjustment, value: i32) {
        let value = value.clamp(ADJUSTMENT_MIN, ADJUSTMENT_MAX);
        match adjustment {
            Adjustment::Brightness => self.brightness = value,
            Adjustment::Contrast => self.contrast = value,
            Adjustment::Saturation => self.saturation = value,
        }
    }

    pub fn with(mut self, adjustment: Adjustment, value: i32) -> Self {
        self.set(adjustment, value);
        self
    }

    pub fn is_neutral(&self) -> bool {
        Adjustment::ALL.iter().all(|a| self.get(*a) == 0)
    }

    /// One clause per non-zero adjustment, in fixed order.
    pub fn clauses(&self) -> Vec<String> {
        Adjustment::ALL
            .iter()
            .filter_map(|adjustment| {
                let value = self.get(*adjustment);
                let verb = match value.signum() {
                    1 => "increase",
                    -1 => "decrease",
                    _ => return None,
                };
                Some(format!("{} {} by {}%", verb, adjustment, value.abs()))
            })
            .collect()
    }
}

impl fmt::Display for AdjustmentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let signed = |v: i32| if v > 0 { format!("+{}", v) } else { v.to_string() };
        write!(
            f,
            "brightness {}, contrast {}, saturation {}",
            signed(self.brightness),
            signed(self.contrast),
            signed(self.saturation)
        )
    }
}

/// Appends the adjustment clauses to the instruction. A neutral set leaves it untouched.
pub fn compose(instruction: &str, adjustments: &AdjustmentSet) -> String {
    let clauses = adjustments.clauses();
    if clauses.is_empty() {
        return instruction.to_string();
    }
    format!(
        "{}. Additionally, please apply the following adjustments: {}.",
        instruction,
        clauses.join(", ")
    )
}
