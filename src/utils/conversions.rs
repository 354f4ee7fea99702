//! Kitchen unit conversions and recipe scaling
//!
//! Everything here is pure. Weight conversions go through grams, volume
//! conversions through milliliters, and results are rounded to two decimal
//! places except when source and target units are the same.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{CompanionError, Result};

/// Measurement units understood by the converter and by recipe ingredients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    G,
    Kg,
    Oz,
    Lb,
    Ml,
    L,
    Cup,
    Tbsp,
    Tsp,
    Whole,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::G => "g",
            Unit::Kg => "kg",
            Unit::Oz => "oz",
            Unit::Lb => "lb",
            Unit::Ml => "ml",
            Unit::L => "l",
            Unit::Cup => "cup",
            Unit::Tbsp => "tbsp",
            Unit::Tsp => "tsp",
            Unit::Whole => "whole",
        }
    }

    /// Grams per unit, if this is a weight unit
    pub fn grams(&self) -> Option<f64> {
        match self {
            Unit::G => Some(1.0),
            Unit::Kg => Some(1000.0),
            Unit::Oz => Some(28.3495),
            Unit::Lb => Some(453.592),
            _ => None,
        }
    }

    /// Milliliters per unit, if this is a volume unit
    pub fn milliliters(&self) -> Option<f64> {
        match self {
            Unit::Ml => Some(1.0),
            Unit::L => Some(1000.0),
            Unit::Cup => Some(236.588),
            Unit::Tbsp => Some(14.787),
            Unit::Tsp => Some(4.929),
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = CompanionError;

    fn from_str(s: &str) -> Result<Self> {
        let unit = match s.trim().to_ascii_lowercase().as_str() {
            "g" => Unit::G,
            "kg" => Unit::Kg,
            "oz" => Unit::Oz,
            "lb" => Unit::Lb,
            "ml" => Unit::Ml,
            "l" => Unit::L,
            "cup" => Unit::Cup,
            "tbsp" => Unit::Tbsp,
            "tsp" => Unit::Tsp,
            "whole" => Unit::Whole,
            other => return Err(CompanionError::unsupported(other, "any known unit")),
        };
        Ok(unit)
    }
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn celsius_to_fahrenheit(celsius: f64) -> i64 {
    (celsius * 9.0 / 5.0 + 32.0).round() as i64
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> i64 {
    ((fahrenheit - 32.0) * 5.0 / 9.0).round() as i64
}

fn convert_with(
    amount: f64,
    from: Unit,
    to: Unit,
    factor: impl Fn(&Unit) -> Option<f64>,
) -> Result<f64> {
    if from == to {
        return Ok(amount);
    }

    match (factor(&from), factor(&to)) {
        (Some(from_factor), Some(to_factor)) => Ok(round2(amount * from_factor / to_factor)),
        _ => Err(CompanionError::unsupported(from, to)),
    }
}

pub fn convert_weight(amount: f64, from: Unit, to: Unit) -> Result<f64> {
    convert_with(amount, from, to, Unit::grams)
}

pub fn convert_volume(amount: f64, from: Unit, to: Unit) -> Result<f64> {
    convert_with(amount, from, to, Unit::milliliters)
}

/// Convert within whichever table holds both units. Never crosses between
/// weight and volume.
pub fn convert(amount: f64, from: Unit, to: Unit) -> Result<f64> {
    if from.grams().is_some() && to.grams().is_some() {
        return convert_weight(amount, from, to);
    }
    if from.milliliters().is_some() && to.milliliters().is_some() {
        return convert_volume(amount, from, to);
    }
    Err(CompanionError::unsupported(from, to))
}

pub fn scale_recipe(amount: f64, factor: f64) -> f64 {
    round2(amount * factor)
}

const INGREDIENT_GRAMS_PER_CUP: &[(&str, u32)] = &[
    ("all-purpose flour", 125),
    ("bread flour", 130),
    ("cake flour", 115),
    ("whole wheat flour", 120),
    ("granulated sugar", 200),
    ("brown sugar", 220),
    ("powdered sugar", 120),
    ("butter", 227),
    ("butter (melted)", 227),
    ("oil", 218),
    ("milk", 240),
    ("water", 240),
    ("cocoa powder", 85),
    ("chocolate chips", 170),
    ("rolled oats", 90),
    ("honey", 340),
    ("maple syrup", 320),
    ("sour cream", 240),
    ("greek yogurt", 245),
];

/// Grams per cup for a known ingredient, matched case-insensitively
pub fn grams_per_cup(ingredient: &str) -> Option<u32> {
    let ingredient = ingredient.trim();
    INGREDIENT_GRAMS_PER_CUP
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(ingredient))
        .map(|(_, grams)| *grams)
}

/// Estimate the weight of `cups` of an ingredient. `None` means the
/// ingredient is unknown and the caller should fall back to manual scaling.
pub fn cups_to_grams(ingredient: &str, cups: f64) -> Option<i64> {
    grams_per_cup(ingredient).map(|grams| (cups * grams as f64).round() as i64)
}

/// Multiplier to apply to a recipe when moving it between pans of the given
/// areas
pub fn pan_adjustment(from_area: f64, to_area: f64) -> Result<f64> {
    if !(from_area > 0.0 && to_area > 0.0) {
        return Err(CompanionError::InvalidQuantity(format!(
            "pan areas must be positive (got {} and {})",
            from_area, to_area
        )));
    }
    Ok(from_area / to_area)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f64, expected: f64, tolerance: f64) -> bool {
        (actual - expected).abs() < tolerance
    }

    #[test]
    fn temperature_calibration_points() {
        assert_eq!(celsius_to_fahrenheit(0.0), 32);
        assert_eq!(celsius_to_fahrenheit(100.0), 212);
        assert_eq!(celsius_to_fahrenheit(175.0), 347);
        assert_eq!(celsius_to_fahrenheit(-40.0), -40);

        assert_eq!(fahrenheit_to_celsius(32.0), 0);
        assert_eq!(fahrenheit_to_celsius(212.0), 100);
        assert_eq!(fahrenheit_to_celsius(347.0), 175);
        assert_eq!(fahrenheit_to_celsius(-40.0), -40);
        assert_eq!(fahrenheit_to_celsius(350.0), 177);
    }

    #[test]
    fn weight_conversions() {
        assert!(close(convert_weight(100.0, Unit::G, Unit::Oz).unwrap(), 3.53, 0.1));
        assert!(close(convert_weight(1.0, Unit::Lb, Unit::G).unwrap(), 453.59, 0.01));
        assert!(close(convert_weight(1.0, Unit::Kg, Unit::Lb).unwrap(), 2.20, 0.01));
        assert_eq!(convert_weight(123.456, Unit::G, Unit::G).unwrap(), 123.456);
    }

    #[test]
    fn volume_conversions() {
        assert!(close(convert_volume(236.588, Unit::Ml, Unit::Cup).unwrap(), 1.0, 0.01));
        assert!(close(convert_volume(1.0, Unit::Cup, Unit::Ml).unwrap(), 236.59, 0.01));
        assert!(close(convert_volume(1.0, Unit::Tbsp, Unit::Tsp).unwrap(), 3.0, 0.1));
        assert_eq!(convert_volume(1.0, Unit::L, Unit::Ml).unwrap(), 1000.0);
    }

    #[test]
    fn weight_table_rejects_volume_units() {
        let err = convert_weight(1.0, Unit::Cup, Unit::G).unwrap_err();
        assert!(matches!(err, CompanionError::UnsupportedUnit { .. }));
    }

    #[test]
    fn generic_convert_never_crosses_domains() {
        assert!(close(convert(2.0, Unit::Kg, Unit::G).unwrap(), 2000.0, 1e-9));
        assert!(close(convert(3.0, Unit::Tsp, Unit::Tbsp).unwrap(), 1.0, 0.01));
        assert!(convert(1.0, Unit::Cup, Unit::G).is_err());
        assert!(convert(1.0, Unit::Whole, Unit::Whole).is_err());
    }

    #[test]
    fn unit_parsing() {
        assert_eq!("Cup".parse::<Unit>().unwrap(), Unit::Cup);
        assert_eq!(" tbsp ".parse::<Unit>().unwrap(), Unit::Tbsp);
        assert!("pinch".parse::<Unit>().is_err());
    }

    #[test]
    fn recipe_scaling() {
        assert_eq!(scale_recipe(100.0, 2.0), 200.0);
        assert_eq!(scale_recipe(1.5, 2.0), 3.0);
        assert_eq!(scale_recipe(3.0, 0.5), 1.5);
        assert_eq!(scale_recipe(0.0, 7.0), 0.0);
        assert_eq!(scale_recipe(0.25, 2.0), 0.5);
        assert_eq!(scale_recipe(1.0 / 3.0, 1.0), 0.33);
    }

    #[test]
    fn cup_estimates_are_case_insensitive() {
        assert_eq!(cups_to_grams("All-Purpose Flour", 2.0), Some(250));
        assert_eq!(cups_to_grams("butter", 0.5), Some(114));
        assert_eq!(cups_to_grams("saffron", 1.0), None);
    }

    #[test]
    fn pan_adjustment_requires_positive_areas() {
        assert!(close(pan_adjustment(81.0, 64.0).unwrap(), 1.265625, 1e-9));
        assert!(pan_adjustment(64.0, 0.0).is_err());
    }
}
