//! Great-circle distance and locate-mode scoring.

/// Mean Earth radius used for all distance scoring.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Full score awarded per locate prompt.
pub const LOCATE_MAX_SCORE: u32 = 100;

/// Distance up to which a guess earns the full score.
pub const LOCATE_FULL_SCORE_KM: f64 = 100.0;

/// Distance beyond which a guess earns nothing.
pub const LOCATE_ZERO_SCORE_KM: f64 = 500.0;

/// Haversine distance in kilometres between two points given in degrees.
#[must_use]
pub fn haversine_km(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    let phi_a = lat_a.to_radians();
    let phi_b = lat_b.to_radians();
    let d_phi = (lat_b - lat_a).to_radians();
    let d_lambda = (lon_b - lon_a).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi_a.cos() * phi_b.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Points for a locate guess at the given distance from the nearest capital:
/// 100 within 100 km, `floor((500 - d) / 4)` out to 500 km, 0 beyond.
#[must_use]
pub fn locate_score(distance_km: f64) -> u32 {
    if distance_km <= LOCATE_FULL_SCORE_KM {
        LOCATE_MAX_SCORE
    } else if distance_km <= LOCATE_ZERO_SCORE_KM {
        let decayed = ((LOCATE_ZERO_SCORE_KM - distance_km) / 4.0).floor();
        // Non-negative by the branch guard.
        decayed as u32
    } else {
        0
    }
}
