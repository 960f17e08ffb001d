/// Startup configuration for the slab scene
use crate::error::{GlowslabError, GlowslabResult};
use crate::projection::Camera;
use crate::timer::FRAME_TIMER_CAPACITY;

pub const DEFAULT_VIEWPORT: u32 = 512;
pub const DEFAULT_LAYER_COUNT: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Number of translucent quads in the slab
    pub layer_count: usize,
    /// Vertical field of view in degrees
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Frame durations averaged for the FPS readout
    pub timer_samples: usize,
    /// Width-to-height ratio of a single output pixel (terminal cells are tall)
    pub pixel_aspect: f32,
}

impl SceneConfig {
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    pub fn with_layer_count(mut self, layer_count: usize) -> Self {
        self.layer_count = layer_count;
        self
    }

    pub fn with_pixel_aspect(mut self, pixel_aspect: f32) -> Self {
        self.pixel_aspect = pixel_aspect;
        self
    }

    /// Aspect ratio of the rendered image
    pub fn aspect(&self) -> f32 {
        self.viewport_width as f32 * self.pixel_aspect / self.viewport_height as f32
    }

    pub fn validate(&self) -> GlowslabResult<()> {
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(GlowslabError::InvalidConfig(format!(
                "viewport {}x{} has no area",
                self.viewport_width, self.viewport_height
            )));
        }
        if self.layer_count < 2 {
            return Err(GlowslabError::InvalidConfig(format!(
                "volume needs at least 2 layers, got {}",
                self.layer_count
            )));
        }
        if self.timer_samples == 0 {
            return Err(GlowslabError::InvalidConfig(
                "frame timer needs at least one sample slot".to_string(),
            ));
        }
        if !(self.pixel_aspect.is_finite() && self.pixel_aspect > 0.0) {
            return Err(GlowslabError::InvalidConfig(format!(
                "pixel aspect {} must be positive",
                self.pixel_aspect
            )));
        }
        Ok(())
    }

    /// Camera for this viewport
    pub fn camera(&self) -> Camera {
        let mut camera = Camera::default().with_aspect(self.aspect());
        camera.fov = self.fov_y_degrees;
        camera.near = self.near;
        camera.far = self.far;
        camera
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            viewport_width: DEFAULT_VIEWPORT,
            viewport_height: DEFAULT_VIEWPORT,
            layer_count: DEFAULT_LAYER_COUNT,
            fov_y_degrees: 40.0,
            near: 0.01,
            far: 10.0,
            timer_samples: FRAME_TIMER_CAPACITY,
            pixel_aspect: 1.0,
        }
    }
}
