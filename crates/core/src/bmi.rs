//! Body-mass-index calculation and classification.
//!
//! The classifier is a pure function of height (cm) and weight (kg). It never fails:
//! callers must only invoke it with positive inputs, see [`BmiReading::for_measurements`].

use api_shared::BmiStatus;

/// Lower bound of the normal range.
pub const NORMAL_FROM: f64 = 18.5;
/// Lower bound of the overweight range.
pub const OVERWEIGHT_FROM: f64 = 25.0;
/// Lower bound of the obese range.
pub const OBESE_FROM: f64 = 30.0;

/// A computed BMI and its category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BmiReading {
    /// BMI rounded to one decimal place.
    pub bmi: f64,
    pub status: BmiStatus,
}

impl BmiReading {
    /// Computes the reading for a height in centimetres and a weight in kilograms.
    ///
    /// The category is taken from the unrounded value so that, for example, 24.96 is
    /// still `Normal` even though it is stored as 25.0.
    pub fn compute(height_cm: f64, weight_kg: f64) -> Self {
        let height_m = height_cm / 100.0;
        let raw = weight_kg / (height_m * height_m);
        Self {
            bmi: round_one_decimal(raw),
            status: classify(raw),
        }
    }

    /// Computes the reading only when both measurements are positive.
    pub fn for_measurements(height_cm: f64, weight_kg: f64) -> Option<Self> {
        (height_cm > 0.0 && weight_kg > 0.0).then(|| Self::compute(height_cm, weight_kg))
    }
}

/// Maps a BMI value onto its category. Intervals are closed below and open above.
pub fn classify(bmi: f64) -> BmiStatus {
    if bmi < NORMAL_FROM {
        BmiStatus::Underweight
    } else if bmi < OVERWEIGHT_FROM {
        BmiStatus::Normal
    } else if bmi < OBESE_FROM {
        BmiStatus::Overweight
    } else {
        BmiStatus::Obese
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
