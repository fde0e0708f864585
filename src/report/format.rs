//! Significant-figure formatting of values and uncertainties
//!
//! Numbers are rounded in decimal, half to even, starting from the exact
//! binary value of the `f64` (so `0.0355` is really `0.03549999…`).
//!
//! With an uncertainty, the uncertainty is rounded to `sig_figs`
//! significant figures (or by the Particle Data Group 3-5-4 rule) and the
//! value to the same decimal place. Rounding can carry into a new leading
//! digit (`999.999 ± 123.456` → `1000 ± 120`), which changes the target
//! place, so the pair is rounded a second time from the first result.
//!
//! # Example
//!
//! ```
//! use bondtime::report::format::{format_value, format_value_with_uncertainty};
//!
//! assert_eq!(format_value(1234.5678, 2), "1200");
//! assert_eq!(format_value_with_uncertainty(1234.5678, 12.345, 2, false), "1235 ± 12");
//! assert_eq!(format_value_with_uncertainty(123.45632, 0.987, 2, true), "123.5 ± 1.0");
//! ```

use std::cmp::Ordering;

/// Enough digits to print any `f64` exactly
const EXACT_DIGITS: usize = 800;

/// Finite decimal `digits · 10^exponent`
#[derive(Debug, Clone, PartialEq, Eq)]
struct Decimal {
    negative: bool,
    /// No leading zeros; empty for zero
    digits: Vec<u8>,
    exponent: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Number {
    Finite(Decimal),
    NaN,
    Infinite { negative: bool },
}

impl Decimal {
    fn from_f64(x: f64) -> Self {
        let text = format!("{:.*e}", EXACT_DIGITS, x.abs());
        let (mantissa, exp) = text.split_once('e').unwrap_or((text.as_str(), "0"));
        let exp: i32 = exp.parse().unwrap_or(0);
        let digits: Vec<u8> = mantissa
            .bytes()
            .filter(u8::is_ascii_digit)
            .map(|b| b - b'0')
            .collect();
        let mut d = Self {
            negative: x.is_sign_negative(),
            digits,
            exponent: exp - EXACT_DIGITS as i32,
        };
        d.strip_leading_zeros();
        // Trailing zeros carry no information for an exact value
        while d.digits.last() == Some(&0) {
            d.digits.pop();
            d.exponent += 1;
        }
        if d.digits.is_empty() {
            d.exponent = 0;
        }
        d
    }

    fn strip_leading_zeros(&mut self) {
        let nz = self
            .digits
            .iter()
            .position(|&d| d != 0)
            .unwrap_or(self.digits.len());
        self.digits.drain(..nz);
    }

    fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    /// Decimal place of the most significant digit (0 for zero)
    fn top_place(&self) -> i32 {
        if self.is_zero() {
            0
        } else {
            self.digits.len() as i32 + self.exponent - 1
        }
    }

    /// First three significant digits as an integer in 100..=999
    fn top_three_digits(&self) -> u32 {
        (0..3).fold(0, |acc, i| acc * 10 + *self.digits.get(i).unwrap_or(&0) as u32)
    }

    /// Round half to even so that the last kept digit sits at `10^place`
    fn round_to_place(&self, place: i32) -> Self {
        if self.exponent >= place {
            let mut digits = self.digits.clone();
            if !digits.is_empty() {
                digits.extend(std::iter::repeat(0).take((self.exponent - place) as usize));
            }
            return Self {
                negative: self.negative,
                digits,
                exponent: place,
            };
        }

        let drop = (place - self.exponent) as usize;
        let keep = self.digits.len().saturating_sub(drop);
        let mut kept = self.digits[..keep].to_vec();
        let dropped = &self.digits[keep..];

        let round_up = if drop > self.digits.len() {
            // Everything dropped is below half a unit of the target place
            false
        } else {
            match dropped[0].cmp(&5) {
                Ordering::Greater => true,
                Ordering::Less => false,
                Ordering::Equal => {
                    dropped[1..].iter().any(|&d| d != 0)
                        || kept.last().map_or(false, |d| d % 2 == 1)
                }
            }
        };

        if round_up {
            let mut carry = true;
            for d in kept.iter_mut().rev() {
                if *d == 9 {
                    *d = 0;
                } else {
                    *d += 1;
                    carry = false;
                    break;
                }
            }
            if carry {
                kept.insert(0, 1);
            }
        }

        let mut out = Self {
            negative: self.negative,
            digits: kept,
            exponent: place,
        };
        out.strip_leading_zeros();
        out
    }

    /// Fixed-point text, like Python's `format(Decimal, "f")`
    fn to_fixed(&self) -> String {
        let sign = if self.negative { "-" } else { "" };
        let body = if self.is_zero() {
            if self.exponent >= 0 {
                "0".to_string()
            } else {
                format!("0.{}", "0".repeat((-self.exponent) as usize))
            }
        } else {
            let digits: String = self.digits.iter().map(|d| char::from(b'0' + d)).collect();
            if self.exponent >= 0 {
                format!("{}{}", digits, "0".repeat(self.exponent as usize))
            } else {
                let point = digits.len() as i32 + self.exponent;
                if point > 0 {
                    format!("{}.{}", &digits[..point as usize], &digits[point as usize..])
                } else {
                    format!("0.{}{}", "0".repeat((-point) as usize), digits)
                }
            }
        };
        format!("{}{}", sign, body)
    }
}

impl Number {
    fn from_f64(x: f64) -> Self {
        if x.is_nan() {
            Number::NaN
        } else if x.is_infinite() {
            Number::Infinite {
                negative: x < 0.0,
            }
        } else {
            Number::Finite(Decimal::from_f64(x))
        }
    }

    fn to_fixed(&self) -> String {
        match self {
            Number::Finite(d) => d.to_fixed(),
            Number::NaN => "NaN".to_string(),
            Number::Infinite { negative: false } => "Infinity".to_string(),
            Number::Infinite { negative: true } => "-Infinity".to_string(),
        }
    }
}

/// Decimal place of the last significant digit when keeping `sig_figs`
fn sig_fig_place(num: &Decimal, sig_figs: u32) -> i32 {
    num.top_place() - (sig_figs.max(1) as i32 - 1)
}

/// Decimal place by the PDG rule on the leading three digits
///
/// 100–354: two significant digits; 355–949: one; 950–999: one, which
/// rounds up to `10…` and so shows as two.
fn pdg_place(num: &Decimal) -> i32 {
    let top = num.top_place();
    match num.top_three_digits() {
        100..=354 => top - 1,
        _ => top,
    }
}

fn round_pair(value: &Number, error: &Number, sig_figs: u32, pdg: bool) -> (Number, Number) {
    match (value, error) {
        (_, Number::Finite(err)) if !err.is_zero() => {
            let place = if pdg {
                pdg_place(err)
            } else {
                sig_fig_place(err, sig_figs)
            };
            let value = match value {
                Number::Finite(v) => Number::Finite(v.round_to_place(place)),
                other => other.clone(),
            };
            (value, Number::Finite(err.round_to_place(place)))
        }
        (Number::Finite(v), _) => {
            let place = sig_fig_place(v, sig_figs);
            (Number::Finite(v.round_to_place(place)), error.clone())
        }
        _ => (value.clone(), error.clone()),
    }
}

/// Round `value` to `sig_figs` significant figures
pub fn format_value(value: f64, sig_figs: u32) -> String {
    match Number::from_f64(value) {
        Number::Finite(d) => d.round_to_place(sig_fig_place(&d, sig_figs)).to_fixed(),
        other => other.to_fixed(),
    }
}

/// Round a value and its uncertainty to a common decimal place
///
/// Returns the rounded value and uncertainty as text. A zero or non-finite
/// uncertainty leaves the uncertainty untouched and rounds the value to
/// `sig_figs` significant figures.
pub fn round_value_with_uncertainty(
    value: f64,
    error: f64,
    sig_figs: u32,
    pdg_rounding: bool,
) -> (String, String) {
    let value = Number::from_f64(value);
    let error = Number::from_f64(error);
    let (v1, e1) = round_pair(&value, &error, sig_figs, pdg_rounding);
    let (v2, e2) = round_pair(&v1, &e1, sig_figs, pdg_rounding);
    (v2.to_fixed(), e2.to_fixed())
}

/// `"value ± error"` with both rounded to a common decimal place
pub fn format_value_with_uncertainty(
    value: f64,
    error: f64,
    sig_figs: u32,
    pdg_rounding: bool,
) -> String {
    let (v, e) = round_value_with_uncertainty(value, error, sig_figs, pdg_rounding);
    format!("{} ± {}", v, e)
}
