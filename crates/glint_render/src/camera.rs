//! Camera for ray generation.

use glint_math::{Mat4, Vec3};

/// Camera driven by a world transform (rotation + translation).
///
/// Camera space looks down -Z with +Y up; the transform carries that frame
/// into the world.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub transform: Mat4,
}

impl Camera {
    pub fn new(transform: Mat4) -> Self {
        Self { transform }
    }

    /// Camera position in world space.
    pub fn position(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }

    /// Normalized world-space view direction.
    pub fn look_dir(&self) -> Vec3 {
        self.transform
            .transform_vector3(Vec3::new(0.0, 0.0, -1.0))
            .normalize()
    }

    /// Screen basis: (forward, right, up).
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = self.look_dir();
        let up = self.transform.transform_vector3(Vec3::Y).normalize();
        let right = forward.cross(up);
        (forward, right, up)
    }

    /// Turntable camera for frame `frame` of `frame_count`: orbits `center`
    /// at the given radius and height, always looking at `center`.
    pub fn orbit(frame: u32, frame_count: u32, radius: f32, height: f32, center: Vec3) -> Self {
        let phi = std::f32::consts::TAU * frame as f32 / frame_count.max(1) as f32;
        let eye = center + Vec3::new(radius * phi.sin(), height, radius * phi.cos());

        let forward = (center - eye).normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);

        let transform = Mat4::from_cols(
            right.extend(0.0),
            up.extend(0.0),
            (-forward).extend(0.0),
            eye.extend(1.0),
        );
        Self { transform }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_camera() {
        let camera = Camera::new(Mat4::IDENTITY);

        assert_eq!(camera.position(), Vec3::ZERO);
        assert!((camera.look_dir() - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);

        let (forward, right, up) = camera.basis();
        assert!((forward - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
        assert!((right - Vec3::X).length() < 1e-6);
        assert!((up - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_translated_camera() {
        let mut transform = Mat4::IDENTITY;
        transform.w_axis = Vec3::new(1.0, 2.0, 3.0).extend(1.0);
        let camera = Camera::new(transform);

        assert_eq!(camera.position(), Vec3::new(1.0, 2.0, 3.0));
        // Translation leaves the view direction alone.
        assert!((camera.look_dir() - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn test_orbit_looks_at_center() {
        let center = Vec3::new(0.0, 0.5, 0.0);
        for frame in 0..8 {
            let camera = Camera::orbit(frame, 8, 5.0, 1.0, center);
            let to_center = (center - camera.position()).normalize();
            assert!((camera.look_dir() - to_center).length() < 1e-5);

            let (forward, right, up) = camera.basis();
            // The basis stays orthonormal around the orbit.
            assert!(forward.dot(right).abs() < 1e-5);
            assert!(forward.dot(up).abs() < 1e-5);
            assert!(right.dot(up).abs() < 1e-5);
        }
    }

    #[test]
    fn test_orbit_frame_zero_position() {
        let camera = Camera::orbit(0, 16, 3.0, 1.0, Vec3::ZERO);
        assert!((camera.position() - Vec3::new(0.0, 1.0, 3.0)).length() < 1e-5);
    }
}
