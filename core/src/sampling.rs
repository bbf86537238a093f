//! Sampling routines.

use crate::common::*;
use crate::geometry::*;

/// Build an orthonormal coordinate system around a unit vector.
///
/// * `v1` - The (normalized) primary axis.
pub fn coordinate_system(v1: &Vector3f) -> (Vector3f, Vector3f) {
    let v2 = if v1.x.abs() > v1.y.abs() {
        Vector3f::new(-v1.z, 0.0, v1.x) / (v1.x * v1.x + v1.z * v1.z).sqrt()
    } else {
        Vector3f::new(0.0, v1.z, -v1.y) / (v1.y * v1.y + v1.z * v1.z).sqrt()
    };
    let v3 = v1.cross(&v2);
    (v2, v3)
}

/// Map a uniform sample in `[0, 1)^2` to the unit disk, preserving relative
/// area (concentric mapping).
///
/// * `u` - The uniform sample.
pub fn concentric_sample_disk(u: Point2f) -> Point2f {
    // Map to [-1, 1]^2 and handle degeneracy at the origin.
    let ox = 2.0 * u.x - 1.0;
    let oy = 2.0 * u.y - 1.0;
    if ox == 0.0 && oy == 0.0 {
        return Point2f::new(0.0, 0.0);
    }

    let (r, theta) = if ox.abs() > oy.abs() {
        (ox, PI_OVER_FOUR * (oy / ox))
    } else {
        (oy, PI_OVER_TWO - PI_OVER_FOUR * (ox / oy))
    };
    Point2f::new(r * theta.cos(), r * theta.sin())
}

/// Map a uniform sample to a cosine-weighted direction on the hemisphere
/// around the given normal.
///
/// * `n` - The (normalized) hemisphere axis.
/// * `u` - The uniform sample.
pub fn cosine_sample_hemisphere(n: &Vector3f, u: Point2f) -> Vector3f {
    let d = concentric_sample_disk(u);
    let z = max(0.0, 1.0 - d.x * d.x - d.y * d.y).sqrt();
    let (t, b) = coordinate_system(n);
    t * d.x + b * d.y + *n * z
}

/// Returns the pdf of a cosine-weighted hemisphere sample for a direction
/// making angle cosine `cos_theta` with the axis.
///
/// * `cos_theta` - Cosine against the hemisphere axis.
#[inline(always)]
pub fn cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    if cos_theta > 0.0 {
        cos_theta * INV_PI
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_samples_lie_in_hemisphere() {
        let n = Vector3f::new(0.0, 1.0, 0.0);
        let mut rng = crate::rng::Rng::new(3);
        for _ in 0..1000 {
            let w = cosine_sample_hemisphere(&n, rng.uniform_2d());
            assert!(n.dot(&w) >= 0.0);
            assert!((w.length() - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn disk_samples_lie_in_unit_disk() {
        let mut rng = crate::rng::Rng::new(5);
        for _ in 0..1000 {
            let d = concentric_sample_disk(rng.uniform_2d());
            assert!(d.x * d.x + d.y * d.y <= 1.0 + 1e-5);
        }
    }
}
