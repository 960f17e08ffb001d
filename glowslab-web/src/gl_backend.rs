/// WebGL 2 implementation of the graphics backend
use glowslab_core::shader::{COLOR_ATTRIBUTE, POSITION_ATTRIBUTE};
use glowslab_core::{
    check_draw_request, GlowslabError, GlowslabResult, GraphicsBackend, IndexWidth, Matrix4x4, Mesh, MeshHandle,
    ProgramHandle, RasterState, UniformSlot, Vertex,
};
use log::debug;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    HtmlCanvasElement, WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlShader,
    WebGlUniformLocation, WebGlVertexArrayObject,
};

/// Mesh buffers bound to a vertex array object
struct GpuMesh {
    vao: WebGlVertexArrayObject,
    // Held so the buffers live as long as the VAO that references them
    _vertex_buffer: WebGlBuffer,
    _index_buffer: WebGlBuffer,
    index_count: usize,
    index_width: IndexWidth,
}

pub struct WebGlBackend {
    gl: Gl,
    program: Option<WebGlProgram>,
    world_location: Option<WebGlUniformLocation>,
    view_projection_location: Option<WebGlUniformLocation>,
    meshes: Vec<GpuMesh>,
    programs: u64,
}

impl WebGlBackend {
    /// Acquire a WebGL 2 context from `canvas` and size the viewport to it
    pub fn from_canvas(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let gl = canvas
            .get_context("webgl2")?
            .ok_or_else(|| JsValue::from_str("WebGL 2 is not supported by this browser"))?
            .dyn_into::<Gl>()
            .map_err(|_| JsValue::from_str("context is not a WebGL2RenderingContext"))?;
        gl.viewport(0, 0, canvas.width() as i32, canvas.height() as i32);

        Ok(Self {
            gl,
            program: None,
            world_location: None,
            view_projection_location: None,
            meshes: Vec::new(),
            programs: 0,
        })
    }

    fn compile_shader(&self, kind: u32, source: &str) -> GlowslabResult<WebGlShader> {
        let shader = self
            .gl
            .create_shader(kind)
            .ok_or_else(|| GlowslabError::ShaderCompile("unable to create shader object".to_string()))?;
        self.gl.shader_source(&shader, source);
        self.gl.compile_shader(&shader);

        let compiled = self
            .gl
            .get_shader_parameter(&shader, Gl::COMPILE_STATUS)
            .as_bool()
            .unwrap_or(false);
        if compiled {
            Ok(shader)
        } else {
            let log = self.gl.get_shader_info_log(&shader).unwrap_or_default();
            self.gl.delete_shader(Some(&shader));
            Err(GlowslabError::ShaderCompile(log))
        }
    }

    fn attribute(&self, program: &WebGlProgram, name: &str) -> GlowslabResult<u32> {
        let location = self.gl.get_attrib_location(program, name);
        u32::try_from(location)
            .map_err(|_| GlowslabError::MeshUpload(format!("attribute {} not found", name)))
    }

    fn create_buffer(&self, target: u32, data: &[u8]) -> GlowslabResult<WebGlBuffer> {
        let buffer = self
            .gl
            .create_buffer()
            .ok_or_else(|| GlowslabError::MeshUpload("unable to create buffer".to_string()))?;
        self.gl.bind_buffer(target, Some(&buffer));
        self.gl.buffer_data_with_u8_array(target, data, Gl::STATIC_DRAW);
        Ok(buffer)
    }
}

fn gl_index_type(width: IndexWidth) -> u32 {
    match width {
        IndexWidth::U8 => Gl::UNSIGNED_BYTE,
        IndexWidth::U16 => Gl::UNSIGNED_SHORT,
        IndexWidth::U32 => Gl::UNSIGNED_INT,
    }
}

impl GraphicsBackend for WebGlBackend {
    fn compile_and_link_program(&mut self, vertex_src: &str, fragment_src: &str) -> GlowslabResult<ProgramHandle> {
        let vertex_shader = self.compile_shader(Gl::VERTEX_SHADER, vertex_src)?;
        let fragment_shader = self.compile_shader(Gl::FRAGMENT_SHADER, fragment_src)?;

        let program = self
            .gl
            .create_program()
            .ok_or_else(|| GlowslabError::ProgramLink("unable to create program object".to_string()))?;
        self.gl.attach_shader(&program, &vertex_shader);
        self.gl.attach_shader(&program, &fragment_shader);
        self.gl.link_program(&program);

        let linked = self
            .gl
            .get_program_parameter(&program, Gl::LINK_STATUS)
            .as_bool()
            .unwrap_or(false);
        if !linked {
            let log = self.gl.get_program_info_log(&program).unwrap_or_default();
            self.gl.delete_program(Some(&program));
            return Err(GlowslabError::ProgramLink(log));
        }

        let world = self.gl.get_uniform_location(&program, UniformSlot::World.name());
        let view_projection = self
            .gl
            .get_uniform_location(&program, UniformSlot::ViewProjection.name());
        if world.is_none() || view_projection.is_none() {
            return Err(GlowslabError::ProgramLink(
                "program is missing its matrix uniforms".to_string(),
            ));
        }

        self.gl.use_program(Some(&program));
        self.world_location = world;
        self.view_projection_location = view_projection;
        self.program = Some(program);
        self.programs += 1;
        debug!("Linked WebGL program {}", self.programs);
        Ok(ProgramHandle(self.programs))
    }

    fn set_raster_state(&mut self, state: RasterState) {
        if state.depth_test {
            self.gl.enable(Gl::DEPTH_TEST);
            self.gl.depth_func(Gl::LESS);
        } else {
            self.gl.disable(Gl::DEPTH_TEST);
        }
        if state.cull_back_faces {
            self.gl.enable(Gl::CULL_FACE);
            self.gl.cull_face(Gl::BACK);
        } else {
            self.gl.disable(Gl::CULL_FACE);
        }
    }

    fn upload_mesh(&mut self, mesh: &Mesh) -> GlowslabResult<MeshHandle> {
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| GlowslabError::MeshUpload("no program linked".to_string()))?;
        let position = self.attribute(program, POSITION_ATTRIBUTE)?;
        let color = self.attribute(program, COLOR_ATTRIBUTE)?;

        let vao = self
            .gl
            .create_vertex_array()
            .ok_or_else(|| GlowslabError::MeshUpload("unable to create vertex array".to_string()))?;
        self.gl.bind_vertex_array(Some(&vao));

        let vertex_buffer = self.create_buffer(Gl::ARRAY_BUFFER, mesh.vertex_bytes())?;
        let stride = Vertex::STRIDE as i32;
        self.gl.enable_vertex_attrib_array(position);
        self.gl
            .vertex_attrib_pointer_with_i32(position, 3, Gl::FLOAT, false, stride, 0);
        self.gl.enable_vertex_attrib_array(color);
        self.gl.vertex_attrib_pointer_with_i32(
            color,
            4,
            Gl::FLOAT,
            false,
            stride,
            Vertex::COLOR_OFFSET as i32,
        );

        let index_buffer = self.create_buffer(Gl::ELEMENT_ARRAY_BUFFER, &mesh.index_bytes())?;
        self.gl.bind_vertex_array(None);

        self.meshes.push(GpuMesh {
            vao,
            _vertex_buffer: vertex_buffer,
            _index_buffer: index_buffer,
            index_count: mesh.index_count(),
            index_width: mesh.index_width(),
        });
        Ok(MeshHandle(self.meshes.len() as u64 - 1))
    }

    fn set_uniform_matrix(&mut self, slot: UniformSlot, matrix: &Matrix4x4) {
        let location = match slot {
            UniformSlot::World => self.world_location.as_ref(),
            UniformSlot::ViewProjection => self.view_projection_location.as_ref(),
        };
        self.gl
            .uniform_matrix4fv_with_f32_array(location, false, matrix.as_slice());
    }

    fn set_blend_enabled(&mut self, enabled: bool) {
        if enabled {
            self.gl.enable(Gl::BLEND);
            self.gl.blend_func(Gl::SRC_ALPHA, Gl::ONE_MINUS_SRC_ALPHA);
        } else {
            self.gl.disable(Gl::BLEND);
        }
    }

    fn clear(&mut self) {
        self.gl.clear_color(0.0, 0.0, 0.0, 1.0);
        self.gl.clear_depth(1.0);
        self.gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
    }

    fn draw(&mut self, mesh: MeshHandle, index_count: usize, index_width: IndexWidth) -> GlowslabResult<()> {
        let gpu_mesh = self
            .meshes
            .get(mesh.0 as usize)
            .ok_or_else(|| GlowslabError::Draw(format!("unknown mesh {:?}", mesh)))?;
        check_draw_request(
            mesh,
            gpu_mesh.index_count,
            gpu_mesh.index_width,
            index_count,
            index_width,
        )?;

        self.gl.bind_vertex_array(Some(&gpu_mesh.vao));
        self.gl.draw_elements_with_i32(
            Gl::TRIANGLES,
            index_count as i32,
            gl_index_type(index_width),
            0,
        );
        self.gl.bind_vertex_array(None);

        match self.gl.get_error() {
            Gl::NO_ERROR => Ok(()),
            code => Err(GlowslabError::Draw(format!("WebGL error 0x{:04x}", code))),
        }
    }

    fn present(&mut self) -> GlowslabResult<()> {
        self.gl.flush();
        if self.gl.is_context_lost() {
            return Err(GlowslabError::Present("WebGL context lost".to_string()));
        }
        Ok(())
    }
}
