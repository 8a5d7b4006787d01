//! Stateless range checks for a health profile and the BMI summary built on
//! top of them.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Age,
    Weight,
    Height,
}

impl Field {
    /// Closed interval of plausible values.
    pub const fn bounds(self) -> (f64, f64) {
        match self {
            Self::Age => (0.0, 120.0),
            Self::Weight => (20.0, 300.0),
            Self::Height => (50.0, 250.0),
        }
    }

    const fn accepted(self) -> &'static str {
        match self {
            Self::Age => {
                "Age validated. Now please ask the user for their weight in kilograms (kg)."
            }
            Self::Weight => {
                "Weight validated. Now please ask the user for their height in centimeters (cm)."
            }
            Self::Height => "Height validated. You can now calculate the user's BMI.",
        }
    }

    const fn rejected(self) -> &'static str {
        match self {
            Self::Age => "That age seems outside the normal human range. Please ask the user to confirm their age or provide a valid age.",
            Self::Weight => "That weight seems unusual. Please ask the user to confirm their weight in kilograms or provide a valid weight.",
            Self::Height => "That height seems unusual. Please ask the user to confirm their height in centimeters or provide a valid height.",
        }
    }
}

/// Outcome of a range check. Out-of-range is a soft warning: the caller is
/// asked to re-confirm, nothing is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Valid(Field),
    OutOfRange(Field),
}

impl Validation {
    pub fn is_valid(self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Self::Valid(field) => field.accepted(),
            Self::OutOfRange(field) => field.rejected(),
        }
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.instruction())
    }
}

pub fn in_range(value: f64, low: f64, high: f64) -> bool {
    !(value < low || value > high)
}

pub fn validate(field: Field, value: f64) -> Validation {
    let (low, high) = field.bounds();
    if in_range(value, low, high) {
        Validation::Valid(field)
    } else {
        Validation::OutOfRange(field)
    }
}

pub fn validate_age(age: i64) -> Validation {
    validate(Field::Age, age as f64)
}

pub fn validate_weight(weight_kg: f64) -> Validation {
    validate(Field::Weight, weight_kg)
}

pub fn validate_height(height_cm: f64) -> Validation {
    validate(Field::Height, height_cm)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn classify(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Underweight => "underweight",
            Self::Normal => "normal weight",
            Self::Overweight => "overweight",
            Self::Obese => "obese",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn body_mass_index(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BmiReport {
    pub age: i64,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub bmi: f64,
    pub category: BmiCategory,
}

impl BmiReport {
    /// BMI as shown to the user, one decimal place.
    pub fn display_bmi(&self) -> String {
        format!("{:.1}", self.bmi)
    }
}

impl fmt::Display for BmiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "All information has been collected successfully:")?;
        writeln!(f, "- Age: {} years", self.age)?;
        writeln!(f, "- Weight: {} kg", self.weight_kg)?;
        writeln!(f, "- Height: {} cm", self.height_cm)?;
        writeln!(f, "- BMI: {} ({})", self.display_bmi(), self.category)?;
        writeln!(f)?;
        write!(
            f,
            "Please thank the user for providing their information and share these results with them."
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Summary {
    Report(BmiReport),
    /// Height failed its own range check; no BMI was computed.
    HeightOutOfRange,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Report(report) => fmt::Display::fmt(report, f),
            Self::HeightOutOfRange => {
                fmt::Display::fmt(&Validation::OutOfRange(Field::Height), f)
            }
        }
    }
}

/// Computes the BMI summary. Height is re-checked here with the same bounds
/// as [`validate_height`] because callers may skip the individual checks.
/// Age and weight are reported as given.
pub fn finalize(age: i64, weight_kg: f64, height_cm: f64) -> Summary {
    if !validate_height(height_cm).is_valid() {
        return Summary::HeightOutOfRange;
    }
    let bmi = body_mass_index(weight_kg, height_cm);
    Summary::Report(BmiReport {
        age,
        weight_kg,
        height_cm,
        bmi,
        category: BmiCategory::classify(bmi),
    })
}
