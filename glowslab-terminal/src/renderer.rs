/// Software rasterizer implementing the graphics backend for terminal output
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use glowslab_core::{
    check_draw_request, GlowslabError, GlowslabResult, GraphicsBackend, IndexWidth, Matrix4x4, Mesh, MeshHandle,
    ProgramHandle, RasterState, Transform, UniformSlot, Vertex,
};
use log::debug;
use nalgebra::Vector4;
use std::io::Write;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Reject vertices this close to the camera plane instead of clipping them
const MIN_CLIP_W: f32 = 1e-4;

/// A vertex after projection to the framebuffer
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    depth: f32,
    color: [f32; 4],
}

/// Rasterizes meshes into an RGB framebuffer with depth testing,
/// back-face culling and source-over blending
pub struct SoftwareBackend {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    color_buffer: Vec<[f32; 3]>,
    front_buffer: Vec<[f32; 3]>,
    meshes: Vec<Mesh>,
    programs: u64,
    raster: RasterState,
    blend: bool,
    world: Matrix4x4,
    view_projection: Matrix4x4,
    presented_frames: u64,
}

impl SoftwareBackend {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![1.0; size],
            color_buffer: vec![[0.0; 3]; size],
            front_buffer: vec![[0.0; 3]; size],
            meshes: Vec::new(),
            programs: 0,
            raster: RasterState::default(),
            blend: false,
            world: Transform::identity(),
            view_projection: Transform::identity(),
            presented_frames: 0,
        }
    }

    pub fn presented_frames(&self) -> u64 {
        self.presented_frames
    }

    /// Color of a pixel in the last presented frame
    pub fn pixel(&self, x: usize, y: usize) -> [f32; 3] {
        self.front_buffer[y * self.width + x]
    }

    fn project(&self, mvp: &Matrix4x4, vertex: &Vertex) -> Option<ScreenVertex> {
        let [x, y, z] = vertex.position;
        let clip = mvp * Vector4::new(x, y, z, 1.0);
        if clip.w < MIN_CLIP_W {
            return None;
        }
        let ndc = clip.xyz() / clip.w;

        Some(ScreenVertex {
            x: (ndc.x + 1.0) * 0.5 * self.width as f32,
            y: (1.0 - ndc.y) * 0.5 * self.height as f32,
            depth: ndc.z * 0.5 + 0.5,
            color: vertex.color,
        })
    }

    fn rasterize_triangle(&mut self, v: [ScreenVertex; 3]) {
        // Screen Y points down, so counter-clockwise triangles have negative area here
        let area = (v[1].x - v[0].x) * (v[2].y - v[0].y) - (v[2].x - v[0].x) * (v[1].y - v[0].y);
        if self.raster.cull_back_faces && area >= 0.0 {
            return;
        }

        // Bounding box clipped to screen bounds
        let min_x = v[0].x.min(v[1].x).min(v[2].x).floor().max(0.0) as i32;
        let max_x = (v[0].x.max(v[1].x).max(v[2].x).ceil() as i32).min(self.width as i32 - 1);
        let min_y = v[0].y.min(v[1].y).min(v[2].y).floor().max(0.0) as i32;
        let max_y = (v[0].y.max(v[1].y).max(v[2].y).ceil() as i32).min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) = barycentric(
                    (v[0].x, v[0].y),
                    (v[1].x, v[1].y),
                    (v[2].x, v[2].y),
                    (px, py),
                ) else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v[0].depth + w1 * v[1].depth + w2 * v[2].depth;
                let idx = y as usize * self.width + x as usize;
                if self.raster.depth_test && depth >= self.depth_buffer[idx] {
                    continue;
                }
                self.depth_buffer[idx] = depth;

                let mut src = [0.0f32; 4];
                for (c, channel) in src.iter_mut().enumerate() {
                    *channel = w0 * v[0].color[c] + w1 * v[1].color[c] + w2 * v[2].color[c];
                }
                let dst = &mut self.color_buffer[idx];
                if self.blend {
                    let alpha = src[3];
                    for c in 0..3 {
                        dst[c] = src[c] * alpha + dst[c] * (1.0 - alpha);
                    }
                } else {
                    dst.copy_from_slice(&src[..3]);
                }
            }
        }
    }

    /// Write the last presented frame as shaded characters
    pub fn write_frame<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let [r, g, b] = self.pixel(x, y);
                let luminance = (0.2126 * r + 0.7152 * g + 0.0722 * b).clamp(0.0, 1.0);
                let char_index = (luminance * (LUMINOSITY_RAMP.len() - 1) as f32).round() as usize;
                // Keep dim but non-black pixels visible
                let character = if char_index == 0 && (r + g + b) > 0.05 {
                    LUMINOSITY_RAMP[1]
                } else {
                    LUMINOSITY_RAMP[char_index.min(LUMINOSITY_RAMP.len() - 1)]
                };

                writer.queue(SetForegroundColor(Color::Rgb {
                    r: to_byte(r),
                    g: to_byte(g),
                    b: to_byte(b),
                }))?;
                writer.queue(Print(character))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl GraphicsBackend for SoftwareBackend {
    fn compile_and_link_program(&mut self, vertex_src: &str, fragment_src: &str) -> GlowslabResult<ProgramHandle> {
        // Only the fixed flat-color pipeline is supported; check the sources
        // declare what it feeds them.
        for (stage, src) in [("vertex", vertex_src), ("fragment", fragment_src)] {
            if !src.contains("void main") {
                return Err(GlowslabError::ShaderCompile(format!(
                    "{} shader has no entry point",
                    stage
                )));
            }
        }
        for slot in [UniformSlot::World, UniformSlot::ViewProjection] {
            if !vertex_src.contains(slot.name()) {
                return Err(GlowslabError::ProgramLink(format!(
                    "uniform {} not declared",
                    slot.name()
                )));
            }
        }

        self.programs += 1;
        debug!("Software pipeline linked as program {}", self.programs);
        Ok(ProgramHandle(self.programs))
    }

    fn set_raster_state(&mut self, state: RasterState) {
        self.raster = state;
    }

    fn upload_mesh(&mut self, mesh: &Mesh) -> GlowslabResult<MeshHandle> {
        self.meshes.push(mesh.clone());
        Ok(MeshHandle(self.meshes.len() as u64 - 1))
    }

    fn set_uniform_matrix(&mut self, slot: UniformSlot, matrix: &Matrix4x4) {
        match slot {
            UniformSlot::World => self.world = *matrix,
            UniformSlot::ViewProjection => self.view_projection = *matrix,
        }
    }

    fn set_blend_enabled(&mut self, enabled: bool) {
        self.blend = enabled;
    }

    fn clear(&mut self) {
        self.depth_buffer.fill(1.0);
        self.color_buffer.fill([0.0; 3]);
    }

    fn draw(&mut self, mesh: MeshHandle, index_count: usize, index_width: IndexWidth) -> GlowslabResult<()> {
        let Some(stored) = self.meshes.get(mesh.0 as usize) else {
            return Err(GlowslabError::Draw(format!("unknown mesh {:?}", mesh)));
        };
        check_draw_request(
            mesh,
            stored.index_count(),
            stored.index_width(),
            index_count,
            index_width,
        )?;

        let mvp = Transform::multiply(&self.view_projection, &self.world);
        let mut triangles = Vec::with_capacity(index_count / 3);
        for [a, b, c] in stored.triangles().take(index_count / 3) {
            let projected = [
                self.project(&mvp, a),
                self.project(&mvp, b),
                self.project(&mvp, c),
            ];
            // Triangle is clipped
            if let [Some(a), Some(b), Some(c)] = projected {
                triangles.push([a, b, c]);
            }
        }
        for triangle in triangles {
            self.rasterize_triangle(triangle);
        }
        Ok(())
    }

    fn present(&mut self) -> GlowslabResult<()> {
        self.front_buffer.copy_from_slice(&self.color_buffer);
        self.presented_frames += 1;
        Ok(())
    }
}

fn to_byte(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glowslab_core::shader::{FRAGMENT_SHADER, VERTEX_SHADER};
    use glowslab_core::{build_plane, build_volume, SceneConfig};

    fn backend_with_camera(size: usize) -> SoftwareBackend {
        let mut backend = SoftwareBackend::new(size, size);
        let vp = SceneConfig::default().camera().view_projection().unwrap();
        backend.set_uniform_matrix(UniformSlot::ViewProjection, &vp);
        backend
    }

    fn draw_mesh(backend: &mut SoftwareBackend, mesh: &Mesh) {
        let handle = backend.upload_mesh(mesh).unwrap();
        backend
            .draw(handle, mesh.index_count(), mesh.index_width())
            .unwrap();
    }

    #[test]
    fn test_accepts_core_shaders() {
        let mut backend = SoftwareBackend::new(4, 4);
        assert!(backend.compile_and_link_program(VERTEX_SHADER, FRAGMENT_SHADER).is_ok());
        assert!(matches!(
            backend.compile_and_link_program("", FRAGMENT_SHADER),
            Err(GlowslabError::ShaderCompile(_))
        ));
        assert!(matches!(
            backend.compile_and_link_program("void main() {}", FRAGMENT_SHADER),
            Err(GlowslabError::ProgramLink(_))
        ));
    }

    #[test]
    fn test_plane_fills_center_with_dark_blue() {
        let mut backend = backend_with_camera(32);
        backend.clear();
        draw_mesh(&mut backend, &build_plane());
        backend.present().unwrap();

        let center = backend.pixel(16, 16);
        assert!((center[2] - 0.3).abs() < 1e-5);
        assert_eq!(backend.pixel(0, 0), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_back_faces_are_culled() {
        let mut backend = backend_with_camera(32);
        let plane = Mesh::new(build_plane().vertices().to_vec(), vec![0, 2, 1, 3, 1, 2]).unwrap();
        backend.clear();
        draw_mesh(&mut backend, &plane);
        backend.present().unwrap();
        assert_eq!(backend.pixel(16, 16), [0.0, 0.0, 0.0]);

        backend.set_raster_state(RasterState {
            depth_test: true,
            cull_back_faces: false,
        });
        backend.clear();
        draw_mesh(&mut backend, &plane);
        backend.present().unwrap();
        assert!(backend.pixel(16, 16)[2] > 0.0);
    }

    #[test]
    fn test_slab_brightens_plane_when_blended() {
        let mut backend = backend_with_camera(32);
        backend.clear();
        backend.set_blend_enabled(false);
        draw_mesh(&mut backend, &build_plane());
        backend.set_blend_enabled(true);
        draw_mesh(&mut backend, &build_volume(200).unwrap());
        backend.present().unwrap();

        let center = backend.pixel(16, 16);
        // Only the half of the slab in front of the plane passes the depth test
        assert!(center[0] > 0.2 && center[0] < 0.5);
        assert!(center[2] > center[0]);
    }

    #[test]
    fn test_present_keeps_previous_frame_until_next() {
        let mut backend = backend_with_camera(16);
        backend.clear();
        draw_mesh(&mut backend, &build_plane());
        backend.present().unwrap();
        backend.clear();
        assert!(backend.pixel(8, 8)[2] > 0.0);
        assert_eq!(backend.presented_frames(), 1);
    }

    #[test]
    fn test_draw_rejects_bad_requests() {
        let mut backend = backend_with_camera(8);
        let handle = backend.upload_mesh(&build_volume(100).unwrap()).unwrap();
        assert!(backend.draw(MeshHandle(9), 6, IndexWidth::U8).is_err());
        assert!(backend.draw(handle, 601, IndexWidth::U16).is_err());
        assert!(backend.draw(handle, 600, IndexWidth::U8).is_err());
        assert!(backend.draw(handle, 600, IndexWidth::U32).is_err());
        assert!(backend.draw(handle, 600, IndexWidth::U16).is_ok());
    }

    #[test]
    fn test_partial_draw_covers_leading_triangles_only() {
        let mut backend = backend_with_camera(32);
        let mut vertices = build_plane().vertices().to_vec();
        vertices.extend_from_slice(&vertices.clone());
        // First quad reversed (culled), second quad front-facing
        let mesh = Mesh::new(vertices, vec![0, 2, 1, 3, 1, 2, 4, 5, 6, 7, 6, 5]).unwrap();
        let handle = backend.upload_mesh(&mesh).unwrap();

        backend.clear();
        backend.draw(handle, 6, IndexWidth::U8).unwrap();
        backend.present().unwrap();
        assert_eq!(backend.pixel(16, 16), [0.0, 0.0, 0.0]);

        backend.clear();
        backend.draw(handle, 12, IndexWidth::U8).unwrap();
        backend.present().unwrap();
        assert!(backend.pixel(16, 16)[2] > 0.0);
    }

    #[test]
    fn test_draw_writes_shaded_characters() {
        let mut backend = backend_with_camera(8);
        backend.clear();
        draw_mesh(&mut backend, &build_plane());
        backend.present().unwrap();

        let mut out = Vec::new();
        backend.write_frame(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("\r\n").count(), 7);
        assert!(text.contains('.'));
    }
}
