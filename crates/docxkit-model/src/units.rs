//! Unit constants and conversions
//!
//! WordprocessingML mixes several measurement units:
//! - twips (1/1440 inch) for spacing, indentation, margins and page size
//! - half-points for font sizes
//! - EMUs (1/914400 inch) for drawing extents
//!
//! These constants are part of the wire contract and must not change.

/// Twips per inch
pub const TWIPS_PER_INCH: i64 = 1440;

/// Twips per point
pub const TWIPS_PER_POINT: i64 = 20;

/// EMUs per inch
pub const EMU_PER_INCH: i64 = 914_400;

/// EMUs per pixel at 96 DPI
pub const EMU_PER_PIXEL: i64 = 9525;

/// EMUs per point
pub const EMU_PER_POINT: i64 = 12_700;

/// Pixels per inch assumed for raster images
pub const PIXELS_PER_INCH: f64 = 96.0;

/// Largest magnitude accepted for indentation, spacing and page geometry (22 inches)
pub const MAX_TWIPS: i32 = 31_680;

/// Smallest font size in half-points
pub const MIN_HALF_POINTS: u16 = 2;

/// Largest font size in half-points
pub const MAX_HALF_POINTS: u16 = 3276;

/// Convert inches to twips
pub fn inches_to_twips(inches: f64) -> i32 {
    (inches * TWIPS_PER_INCH as f64).round() as i32
}

/// Convert points to twips
pub fn points_to_twips(points: f64) -> i32 {
    (points * TWIPS_PER_POINT as f64).round() as i32
}

/// Convert twips to inches
pub fn twips_to_inches(twips: i32) -> f64 {
    twips as f64 / TWIPS_PER_INCH as f64
}

/// Convert points to half-points
pub fn points_to_half_points(points: f64) -> u16 {
    (points * 2.0).round() as u16
}

/// Convert pixels to EMUs at 96 DPI
pub fn pixels_to_emu(pixels: i64) -> i64 {
    pixels * EMU_PER_PIXEL
}

/// Convert EMUs to pixels at 96 DPI
pub fn emu_to_pixels(emu: i64) -> i64 {
    (emu as f64 / EMU_PER_PIXEL as f64).round() as i64
}

/// Convert inches to EMUs
pub fn inches_to_emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH as f64).round() as i64
}

/// Convert EMUs to inches
pub fn emu_to_inches(emu: i64) -> f64 {
    emu as f64 / EMU_PER_INCH as f64
}

/// Check that a twip value lies within `±MAX_TWIPS`
pub(crate) fn check_twips(field: &'static str, value: i32) -> crate::Result<()> {
    if !(-MAX_TWIPS..=MAX_TWIPS).contains(&value) {
        return Err(crate::DocxError::validation(
            field,
            format!("{value} twips is outside ±{MAX_TWIPS}"),
        ));
    }
    Ok(())
}

/// Check that a twip value lies within `0..=MAX_TWIPS`
pub(crate) fn check_positive_twips(field: &'static str, value: i32) -> crate::Result<()> {
    if !(0..=MAX_TWIPS).contains(&value) {
        return Err(crate::DocxError::validation(
            field,
            format!("{value} twips is outside 0..={MAX_TWIPS}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emu_to_pixels() {
        // 914400 EMUs = 1 inch = 96 pixels at 96 DPI
        assert_eq!(emu_to_pixels(914_400), 96);
    }

    #[test]
    fn test_pixels_to_emu() {
        assert_eq!(pixels_to_emu(96), 914_400);
    }

    #[test]
    fn test_twips() {
        assert_eq!(inches_to_twips(1.0), 1440);
        assert_eq!(points_to_twips(12.0), 240);
        assert_eq!(points_to_half_points(16.0), 32);
        assert!((twips_to_inches(720) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_twip_bounds() {
        assert!(check_twips("indent", MAX_TWIPS).is_ok());
        assert!(check_twips("indent", -MAX_TWIPS).is_ok());
        assert!(check_twips("indent", MAX_TWIPS + 1).is_err());
        assert!(check_positive_twips("spacing", -1).is_err());
    }
}
