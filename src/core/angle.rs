// Joint angle primitive for landmark-based checks

/// Interior angle in degrees at vertex `b`, between rays b→a and b→c.
///
/// Always returns a finite value in [0, 180]. Coincident points give 0.0
/// (`atan2(0, 0)` is 0), and non-finite input is mapped to 0.0 as well.
///
/// Not used by the current posture rules; kept for neck and knee checks.
pub fn calculate_angle(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f64 {
    let (ax, ay) = (a.0 as f64, a.1 as f64);
    let (bx, by) = (b.0 as f64, b.1 as f64);
    let (cx, cy) = (c.0 as f64, c.1 as f64);

    let radians = (cy - by).atan2(cx - bx) - (ay - by).atan2(ax - bx);
    let mut angle = radians.to_degrees().abs();

    if !angle.is_finite() {
        return 0.0;
    }

    if angle > 180.0 {
        angle = 360.0 - angle;
    }

    angle
}
