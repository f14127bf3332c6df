//! GPU texture resources with asynchronous file loading.
//!
//! Textures are shared, read-only resources: many geometries may reference
//! the same texture by [`TextureId`], and a texture is never mutated after
//! its pixels land on the GPU.
//!
//! [`Texture::load`] is the one genuinely asynchronous operation in the
//! engine. The image decode runs on a worker thread while a 1×1 black
//! placeholder is bound in the texture's place, so geometry referencing a
//! loading texture renders black until the upload completes — the frame
//! loop never blocks on a decode. The renderer drives completion by
//! calling [`Texture::poll`] once per frame; the single-threaded tick
//! ordering guarantees the upload is visible before any draw that samples
//! it. A failed load parks the texture in [`TextureState::Failed`] on its
//! placeholder permanently; there is no retry, cancellation, or timeout.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::error::TextureError;
use crate::gpu::GpuContext;

/// Handle to a texture registered with the renderer.
///
/// Plain index into the renderer's texture registry; the newtype keeps it
/// from being confused with other indices at compile time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureId(pub(crate) usize);

/// Lifecycle of a texture's pixel data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureState {
    /// A decode is in flight; the placeholder is bound.
    Pending,
    /// Pixels are on the GPU.
    Ready,
    /// The decode failed; the placeholder stays bound permanently.
    Failed,
}

/// An in-flight image decode, GPU-free so the channel plumbing can be
/// exercised without a device.
struct ImageLoad {
    path: PathBuf,
    rx: Receiver<Result<image::RgbaImage, image::ImageError>>,
}

impl ImageLoad {
    fn spawn(path: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel();
        let worker_path = path.clone();
        thread::spawn(move || {
            let result = image::open(&worker_path).map(|img| img.to_rgba8());
            // The receiver may already be gone if the texture was dropped.
            let _ = tx.send(result);
        });
        Self { path, rx }
    }

    /// Check for a completed decode without blocking.
    fn try_complete(&mut self) -> Option<Result<image::RgbaImage, TextureError>> {
        match self.rx.try_recv() {
            Ok(Ok(img)) => Some(Ok(img)),
            Ok(Err(source)) => Some(Err(TextureError::Load {
                path: self.path.clone(),
                source,
            })),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(TextureError::WorkerLost {
                path: self.path.clone(),
            })),
        }
    }
}

/// A GPU-resident image that can be bound to the scene pipeline.
pub struct Texture {
    texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
    state: TextureState,
    inflight: Option<ImageLoad>,
}

impl Texture {
    /// Create a texture from raw RGBA8 pixels, immediately ready.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], width: u32, height: u32, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Repeat addressing: block texture coordinates run past 1.0 to tile
        // a face, and the floor tiles its texture a hundred times over.
        // Nearest filtering keeps the blocks crisp.
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} Sampler")),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
            state: TextureState::Ready,
            inflight: None,
        }
    }

    /// Begin loading a texture from an image file.
    ///
    /// Returns immediately with a 1×1 black placeholder bound; the decode
    /// runs on a worker thread and is committed by [`poll`](Self::poll).
    pub fn load(gpu: &GpuContext, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let label = path.display().to_string();

        let mut texture = Self::from_rgba(gpu, &[0, 0, 0, 255], 1, 1, &label);
        texture.state = TextureState::Pending;
        texture.inflight = Some(ImageLoad::spawn(path));
        texture
    }

    /// Commit a completed decode, if any. Called by the renderer once per
    /// frame; cheap when nothing is in flight.
    pub fn poll(&mut self, gpu: &GpuContext) {
        let Some(load) = &mut self.inflight else {
            return;
        };
        let Some(result) = load.try_complete() else {
            return;
        };
        let path = load.path.clone();
        self.inflight = None;

        match result {
            Ok(img) => {
                let (width, height) = img.dimensions();
                let label = path.display().to_string();
                let uploaded = Self::from_rgba(gpu, &img, width, height, &label);
                self.texture = uploaded.texture;
                self.view = uploaded.view;
                self.sampler = uploaded.sampler;
                self.width = width;
                self.height = height;
                self.state = TextureState::Ready;
                log::debug!("texture '{}' uploaded ({width}x{height})", path.display());
            }
            Err(err) => {
                self.state = TextureState::Failed;
                log::error!("{err}");
            }
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TextureState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for(load: &mut ImageLoad) -> Result<image::RgbaImage, TextureError> {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(result) = load.try_complete() {
                return result;
            }
            assert!(Instant::now() < deadline, "decode worker never finished");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn missing_file_reports_load_error() {
        let mut load = ImageLoad::spawn(PathBuf::from("definitely/not/here.png"));
        match wait_for(&mut load) {
            Err(TextureError::Load { path, .. }) => {
                assert_eq!(path, PathBuf::from("definitely/not/here.png"));
            }
            other => panic!("expected a load error, got {other:?}"),
        }
    }

    #[test]
    fn valid_image_decodes_to_rgba() {
        let path = std::env::temp_dir().join("phalanx_texture_roundtrip.png");
        let mut img = image::RgbaImage::new(2, 2);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.save(&path).unwrap();

        let mut load = ImageLoad::spawn(path.clone());
        let decoded = wait_for(&mut load).unwrap();
        assert_eq!(decoded.dimensions(), (2, 2));
        assert_eq!(decoded.get_pixel(0, 0), &image::Rgba([255, 0, 0, 255]));

        let _ = std::fs::remove_file(path);
    }
}
