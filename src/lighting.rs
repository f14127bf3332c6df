//! Directional lighting parameters, uploaded through the program's
//! uniform contract.

use glam::Vec3;

use crate::program::{Program, UniformValue};

/// A single directional light.
///
/// `direction` is the way the light travels through the scene; before
/// upload it is normalized and negated so the shader's dot product against
/// a surface normal comes out positive on lit faces. The color is uploaded
/// as-is. Both go through [`Program::set_uniform`] only — unknown uniform
/// names (a program with no lighting support) are logged and ignored, the
/// uniforms being optional by contract.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.25, -0.25, -1.0),
            color: Vec3::new(0.8, 0.8, 0.8),
        }
    }
}

impl DirectionalLight {
    pub fn new(direction: Vec3, color: Vec3) -> Self {
        Self { direction, color }
    }

    /// The direction as it is uploaded: normalized and negated.
    pub fn adjusted_direction(&self) -> Vec3 {
        -self.direction.normalize_or_zero()
    }

    /// Upload both lighting uniforms to the program.
    pub fn apply(&self, program: &mut Program) {
        let uniforms = [
            ("lighting_direction", UniformValue::Vec3(self.adjusted_direction())),
            ("directional_color", UniformValue::Vec3(self.color)),
        ];
        for (name, value) in uniforms {
            if let Err(err) = program.set_uniform(name, value) {
                log::warn!("lighting uniform skipped: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_is_normalized_and_negated() {
        let light = DirectionalLight::new(Vec3::new(0.0, 0.0, 2.0), Vec3::ONE);
        assert_eq!(light.adjusted_direction(), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn zero_direction_stays_zero() {
        let light = DirectionalLight::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(light.adjusted_direction(), Vec3::ZERO);
    }

    #[test]
    fn adjusted_direction_is_unit_length() {
        let light = DirectionalLight::new(Vec3::new(-0.25, -0.25, -1.0), Vec3::ONE);
        assert!((light.adjusted_direction().length() - 1.0).abs() < 1e-6);
    }
}
