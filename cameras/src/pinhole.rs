//! Pinhole camera.

use bidir_core::camera::Camera;
use bidir_core::common::*;
use bidir_core::geometry::*;

/// An ideal pinhole camera. The film plane sits at unit distance along the
/// viewing direction; importance is normalized over the film's physical
/// area there.
pub struct PinholeCamera {
    /// Camera position.
    position: Point3f,

    /// Unit viewing direction.
    forward: Vector3f,

    /// Unit film-plane right axis.
    right: Vector3f,

    /// Unit film-plane up axis.
    up: Vector3f,

    /// Physical film width at unit distance.
    film_width: Float,

    /// Physical film height at unit distance.
    film_height: Float,

    /// Image width in pixels.
    width: usize,

    /// Image height in pixels.
    height: usize,
}

impl PinholeCamera {
    /// Create a new `PinholeCamera`.
    ///
    /// * `position` - Camera position.
    /// * `look_at`  - Point the camera faces.
    /// * `up_hint`  - Approximate up direction used to build the film basis.
    /// * `fov`      - Horizontal field of view in radians.
    /// * `width`    - Image width in pixels.
    /// * `height`   - Image height in pixels.
    pub fn new(
        position: Point3f,
        look_at: Point3f,
        up_hint: Vector3f,
        fov: Float,
        width: usize,
        height: usize,
    ) -> Self {
        let forward = (look_at - position).normalize();
        let right = forward.cross(&up_hint).normalize();
        let up = right.cross(&forward);

        let film_width = 2.0 * (fov * 0.5).tan();
        let film_height = film_width * height as Float / width as Float;

        Self {
            position,
            forward,
            right,
            up,
            film_width,
            film_height,
            width,
            height,
        }
    }

    /// Cosine between a camera-leaving direction and the viewing axis, or
    /// `None` if the direction points behind the film plane.
    ///
    /// * `d` - The (normalized) direction.
    fn facing_cosine(&self, d: &Vector3f) -> Option<Float> {
        let cos_theta = d.dot(&self.forward);
        (cos_theta > 0.0).then_some(cos_theta)
    }
}

impl Camera for PinholeCamera {
    fn ray_from_pixel(&self, x: usize, y: usize, jitter: Point2f, _lens: Point2f) -> Ray {
        let sx = ((x as Float + jitter.x) / self.width as Float - 0.5) * self.film_width;
        let sy = (0.5 - (y as Float + jitter.y) / self.height as Float) * self.film_height;
        let d = (self.forward + self.right * sx + self.up * sy).normalize();
        Ray::new(self.position, d)
    }

    fn pixel_from_ray(&self, ray: &Ray) -> Option<(usize, usize)> {
        let d = ray.d.normalize();
        let cos_theta = self.facing_cosine(&d)?;

        // Scale to the film plane at unit distance along the view axis.
        let sx = d.dot(&self.right) / cos_theta;
        let sy = d.dot(&self.up) / cos_theta;

        let fx = (sx / self.film_width + 0.5) * self.width as Float;
        let fy = (0.5 - sy / self.film_height) * self.height as Float;
        if fx < 0.0 || fy < 0.0 {
            return None;
        }
        let (x, y) = (fx as usize, fy as usize);
        (x < self.width && y < self.height).then_some((x, y))
    }

    fn film_area(&self) -> Float {
        self.film_width * self.film_height
    }

    fn sample_aperture(&self, _u: Float, _v: Float) -> Point2f {
        // Ideal pinhole; the aperture is a point.
        Point2f::new(0.0, 0.0)
    }

    fn we(&self, ray: &Ray) -> Float {
        match self.facing_cosine(&ray.d.normalize()) {
            // 1 / (A * cos^4): one cosine pair for the distance to the film
            // plane, one for the projected pixel area.
            Some(cos_theta) => {
                let c2 = cos_theta * cos_theta;
                1.0 / (self.film_area() * c2 * c2)
            }
            None => 0.0,
        }
    }

    fn pdf_we(&self, ray: &Ray) -> (Float, Float) {
        match self.facing_cosine(&ray.d.normalize()) {
            Some(cos_theta) => (1.0, 1.0 / (self.film_area() * cos_theta * cos_theta * cos_theta)),
            None => (0.0, 0.0),
        }
    }

    fn resolution(&self) -> (usize, usize) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use super::*;

    fn camera() -> PinholeCamera {
        PinholeCamera::new(
            Point3f::new(0.0, 1.0, -4.0),
            Point3f::new(0.0, 1.0, 0.0),
            Vector3f::new(0.0, 1.0, 0.0),
            PI / 3.0,
            64,
            48,
        )
    }

    #[test]
    fn pixel_projection_inverts_ray_generation() {
        let cam = camera();
        let center = Point2f::new(0.5, 0.5);
        for (x, y) in [(0, 0), (31, 23), (63, 47), (10, 40)] {
            let ray = cam.ray_from_pixel(x, y, center, Point2f::new(0.0, 0.0));
            let (px, py) = cam.pixel_from_ray(&ray).unwrap();
            assert_eq!((px, py), (x, y));
        }
    }

    #[test]
    fn rays_behind_the_film_do_not_project() {
        let cam = camera();
        let backward = Ray::new(Point3f::new(0.0, 1.0, -4.0), Vector3f::new(0.0, 0.0, -1.0));
        assert!(cam.pixel_from_ray(&backward).is_none());
    }

    #[test]
    fn on_axis_importance_is_inverse_film_area() {
        let cam = camera();
        let axis = Ray::new(Point3f::new(0.0, 1.0, -4.0), Vector3f::new(0.0, 0.0, 1.0));
        assert!(approx_eq!(
            Float,
            cam.we(&axis),
            1.0 / cam.film_area(),
            epsilon = 1e-5
        ));
        let (pos_pdf, dir_pdf) = cam.pdf_we(&axis);
        assert!(approx_eq!(Float, pos_pdf, 1.0, epsilon = 1e-6));
        assert!(approx_eq!(Float, dir_pdf, 1.0 / cam.film_area(), epsilon = 1e-5));
    }

    #[test]
    fn off_axis_importance_falls_off_with_cosine() {
        let cam = camera();
        let tilted = Ray::new(
            Point3f::new(0.0, 1.0, -4.0),
            Vector3f::new(0.3, 0.0, 1.0).normalize(),
        );
        let cos_theta = tilted.d.dot(&Vector3f::new(0.0, 0.0, 1.0));
        let expected = 1.0 / (cam.film_area() * cos_theta.powi(4));
        assert!(approx_eq!(Float, cam.we(&tilted), expected, epsilon = 1e-4));
    }
}
