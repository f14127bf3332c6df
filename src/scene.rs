//! The scene: an insertion-ordered collection of geometry.
//!
//! There is no hierarchy here — every object is independently transformed
//! and the draw order is simply the order objects were added. Depth
//! testing makes that order irrelevant to the final image; it only
//! matters for overdraw.

use glam::Mat4;

use crate::geometry::Geometry;
use crate::texture::TextureId;

/// One geometry scheduled for drawing this frame.
///
/// The draw list is composed CPU-side before any GPU binding happens,
/// which is also what makes frame composition testable without a device:
/// counting draw calls is counting entries.
pub struct DrawCall<'a> {
    pub geometry: &'a Geometry,
    pub model: Mat4,
    pub texture: Option<TextureId>,
}

/// Insertion-ordered geometry list owned by the renderer.
#[derive(Default)]
pub struct Scene {
    geometries: Vec<Geometry>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a geometry. O(1); draw order is append order.
    pub fn add(&mut self, geometry: Geometry) {
        self.geometries.push(geometry);
    }

    /// Number of objects in the scene.
    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Geometry> {
        self.geometries.iter_mut()
    }

    /// Compose this frame's draw calls, in scene order.
    ///
    /// Objects without enough data to draw are skipped rather than
    /// aborting the frame; one bad object must not take the loop down.
    pub fn draw_list(&self) -> Vec<DrawCall<'_>> {
        let calls: Vec<DrawCall<'_>> = self
            .geometries
            .iter()
            .filter(|g| g.is_drawable())
            .map(|g| DrawCall {
                geometry: g,
                model: g.model_matrix(),
                texture: g.texture(),
            })
            .collect();

        let skipped = self.geometries.len() - calls.len();
        if skipped > 0 {
            log::debug!("skipping {skipped} geometry object(s) with no drawable data");
        }
        calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn block_at(z: f32) -> Geometry {
        let mut g = Geometry::block();
        g.set_translate(0.0, 0.0, z);
        g
    }

    #[test]
    fn k_objects_make_k_draw_calls() {
        let mut scene = Scene::new();
        for i in 0..7 {
            scene.add(block_at(i as f32));
        }
        assert_eq!(scene.draw_list().len(), 7);
    }

    #[test]
    fn draw_order_is_insertion_order() {
        let mut scene = Scene::new();
        scene.add(block_at(0.0));
        scene.add(block_at(2.0));
        scene.add(block_at(4.0));

        let list = scene.draw_list();
        for (i, call) in list.iter().enumerate() {
            let origin = call.model * Vec4::new(0.0, 0.0, 0.0, 1.0);
            assert_eq!(origin.z, (i * 2) as f32);
        }
    }

    #[test]
    fn undrawable_objects_are_skipped_not_fatal() {
        let mut scene = Scene::new();
        scene.add(block_at(0.0));
        scene.add(Geometry::new());
        scene.add(block_at(2.0));

        assert_eq!(scene.len(), 3);
        assert_eq!(scene.draw_list().len(), 2);
    }
}
