//! Perspective projection state.

use glam::Mat4;

/// Vertical field of view, in degrees.
pub const FOV_Y_DEGREES: f32 = 45.0;
/// Near clipping plane.
pub const Z_NEAR: f32 = 0.1;
/// Far clipping plane.
pub const Z_FAR: f32 = 100.0;

/// The projection half of the view-projection pair.
///
/// Derives a perspective matrix from the viewport dimensions and the fixed
/// field-of-view and clip-plane constants above. The matrix is recomputed
/// only when the viewport changes; between recomputations it is immutable.
/// Owned by the [`Renderer`](crate::Renderer), which uploads it as the
/// `projection_matrix` uniform each frame.
#[derive(Clone, Copy, Debug)]
pub struct Projection {
    matrix: Mat4,
}

impl Projection {
    /// Create a projection for the given initial viewport.
    pub fn new(width: u32, height: u32) -> Self {
        let mut projection = Self {
            matrix: Mat4::IDENTITY,
        };
        projection.set_perspective(width, height);
        projection
    }

    /// Recompute the perspective matrix for a new viewport.
    ///
    /// Called at startup and on every viewport resize. Zero dimensions are
    /// ignored, leaving the previous matrix in place; they only occur while
    /// the window is minimized.
    ///
    /// The matrix is right-handed with a zero-to-one depth range, matching
    /// wgpu clip space.
    pub fn set_perspective(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            let aspect = width as f32 / height as f32;
            self.matrix = Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect, Z_NEAR, Z_FAR);
        }
    }

    /// The current projection matrix.
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_ratio_is_encoded() {
        for (w, h) in [(800u32, 600u32), (1920, 1080), (1, 1), (333, 777)] {
            let projection = Projection::new(w, h);
            let m = projection.matrix();
            // m[0][0] = m[1][1] / aspect, so their ratio recovers h/w.
            let ratio = m.col(0).x / m.col(1).y;
            let expected = h as f32 / w as f32;
            assert!(
                (ratio - expected).abs() < 1e-5,
                "viewport {w}x{h}: got ratio {ratio}, expected {expected}"
            );
        }
    }

    #[test]
    fn resize_keeps_only_the_latest_viewport() {
        let mut projection = Projection::new(800, 600);
        let first = projection.matrix();
        projection.set_perspective(1920, 1080);

        let fresh = Projection::new(1920, 1080);
        assert_eq!(projection.matrix(), fresh.matrix());
        assert_ne!(projection.matrix(), first);
    }

    #[test]
    fn zero_viewport_is_ignored() {
        let mut projection = Projection::new(800, 600);
        let before = projection.matrix();
        projection.set_perspective(0, 600);
        projection.set_perspective(800, 0);
        assert_eq!(projection.matrix(), before);
    }
}
