//! Integer-degree angle tables, precomputed once so trig is a table lookup
//! and therefore identical across peers regardless of libm quirks at the
//! call site.

use crate::fixed::Fixed;
use std::sync::OnceLock;

pub const FULL_CIRCLE: i32 = 360;
pub const HALF_CIRCLE: i32 = 180;

struct Tables {
    sin: [Fixed; FULL_CIRCLE as usize],
    cos: [Fixed; FULL_CIRCLE as usize],
}

fn tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut sin = [Fixed::ZERO; FULL_CIRCLE as usize];
        let mut cos = [Fixed::ZERO; FULL_CIRCLE as usize];
        for deg in 0..FULL_CIRCLE {
            let rad = (deg as f64).to_radians();
            sin[deg as usize] = Fixed::from_fraction((rad.sin() * 65536.0).round() as i32, 65536);
            cos[deg as usize] = Fixed::from_fraction((rad.cos() * 65536.0).round() as i32, 65536);
        }
        Tables { sin, cos }
    })
}

#[inline]
pub fn normalize_degrees(deg: i32) -> i32 {
    deg.rem_euclid(FULL_CIRCLE)
}

pub fn sin_deg(deg: i32) -> Fixed {
    tables().sin[normalize_degrees(deg) as usize]
}

pub fn cos_deg(deg: i32) -> Fixed {
    tables().cos[normalize_degrees(deg) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sin_cos_at_quadrants() {
        assert_eq!(sin_deg(0), Fixed::ZERO);
        assert!((cos_deg(0) - Fixed::ONE).abs().to_int() == 0);
        // sin(90) should round to 1.0 within table precision.
        assert!((sin_deg(90) - Fixed::ONE).abs().raw().abs() <= 1);
    }

    #[test]
    fn normalize_wraps_negative() {
        assert_eq!(normalize_degrees(-10), 350);
        assert_eq!(normalize_degrees(370), 10);
    }

    #[test]
    fn table_is_stable_across_calls() {
        assert_eq!(sin_deg(47), sin_deg(47));
        assert_eq!(sin_deg(47), sin_deg(47 + FULL_CIRCLE));
    }
}
