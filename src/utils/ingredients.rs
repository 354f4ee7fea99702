//! Best-effort scaling of free-text ingredient lines
//!
//! Only a leading number is understood (`2 cups flour`, `1.5 tsp salt`,
//! `3 eggs`). Anything else is handed back with a manual-scaling notice.

use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_QUANTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)\s*([a-zA-Z]+)?\s+(.+)$").expect("quantity pattern is valid")
});

fn display_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{}", amount)
    } else {
        format!("{:.1}", amount)
    }
}

/// Scale the leading quantity of an ingredient line by `factor`
pub fn scale_ingredient_line(line: &str, factor: f64) -> String {
    if factor == 1.0 {
        return line.to_string();
    }

    if let Some(caps) = LEADING_QUANTITY.captures(line) {
        if let Ok(amount) = caps[1].parse::<f64>() {
            let scaled = display_amount(amount * factor);
            let rest = &caps[3];
            return match caps.get(2) {
                Some(unit) => format!("{} {} {}", scaled, unit.as_str(), rest),
                None => format!("{} {}", scaled, rest),
            };
        }
    }

    format!("{} (scale manually: {}×)", line, factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_factor_leaves_line_alone() {
        assert_eq!(scale_ingredient_line("pinch of salt", 1.0), "pinch of salt");
        assert_eq!(scale_ingredient_line("2 cups flour", 1.0), "2 cups flour");
    }

    #[test]
    fn scales_leading_quantity_with_unit() {
        assert_eq!(scale_ingredient_line("2 cups flour", 2.0), "4 cups flour");
        assert_eq!(scale_ingredient_line("1.5 tsp vanilla", 3.0), "4.5 tsp vanilla");
        assert_eq!(scale_ingredient_line("250g butter", 0.5), "125 g butter");
    }

    #[test]
    fn scales_bare_counts() {
        assert_eq!(scale_ingredient_line("3 eggs", 2.0), "6 eggs");
    }

    #[test]
    fn non_numeric_lines_get_a_notice() {
        assert_eq!(
            scale_ingredient_line("salt to taste", 0.5),
            "salt to taste (scale manually: 0.5×)"
        );
    }
}
