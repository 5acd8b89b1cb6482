/// Converts polar coordinates (radians, normalized radius) to cartesian.
///
/// The magnitude of the projected point equals the input radius; consumers
/// rely on that contract when laying targets out on a display.
pub fn polar_to_cartesian(bearing: f64, radius: f64) -> (f64, f64) {
    (radius * bearing.cos(), radius * bearing.sin())
}
