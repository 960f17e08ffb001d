/// Geometry primitives and procedural meshes for the slab scene
use bytemuck::{Pod, Zeroable};

use crate::error::{GlowslabError, GlowslabResult};

/// Half extent of the opaque plane
pub const PLANE_HALF_EXTENT: f32 = 1.2;
/// Opaque dark blue
pub const PLANE_COLOR: [f32; 4] = [0.0, 0.0, 0.3, 1.0];
/// Half extent of each volume layer
pub const LAYER_HALF_EXTENT: f32 = 1.0;
/// Near-fully-transparent white; many layers add up to a visible glow
pub const LAYER_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0 / 255.0];

/// Two triangles sharing the (-,+)/(+,-) diagonal, counter-clockwise seen from -Z
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 3, 2, 1];

/// A vertex with position and RGBA color, laid out for direct upload
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    /// Bytes between consecutive vertices
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();
    /// Byte offset of the color attribute
    pub const COLOR_OFFSET: usize = std::mem::size_of::<[f32; 3]>();

    pub fn new(x: f32, y: f32, z: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y, z],
            color,
        }
    }
}

/// Element width of an index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexWidth {
    U8,
    U16,
    U32,
}

impl IndexWidth {
    /// Narrowest width able to address `vertex_count` distinct vertices
    pub fn for_vertex_count(vertex_count: usize) -> Self {
        if vertex_count <= u8::MAX as usize + 1 {
            IndexWidth::U8
        } else if vertex_count <= u16::MAX as usize + 1 {
            IndexWidth::U16
        } else {
            IndexWidth::U32
        }
    }

    pub fn bytes(&self) -> usize {
        match self {
            IndexWidth::U8 => 1,
            IndexWidth::U16 => 2,
            IndexWidth::U32 => 4,
        }
    }
}

/// An indexed triangle mesh.
///
/// Every index addresses a vertex and the index width always matches the
/// vertex count; [`Mesh::new`] is the only way in.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    index_width: IndexWidth,
}

impl Mesh {
    /// Build a mesh, picking the narrowest index width for its vertex count
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> GlowslabResult<Self> {
        if indices.len() % 3 != 0 {
            return Err(GlowslabError::InvalidConfig(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(GlowslabError::InvalidConfig(format!(
                "index {} out of range for {} vertices",
                bad,
                vertices.len()
            )));
        }
        let index_width = IndexWidth::for_vertex_count(vertices.len());

        Ok(Self {
            vertices,
            indices,
            index_width,
        })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn index_width(&self) -> IndexWidth {
        self.index_width
    }

    /// Vertex data as raw bytes
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index data encoded little-endian at the mesh's index width
    pub fn index_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.indices.len() * self.index_width.bytes());
        for &index in &self.indices {
            match self.index_width {
                IndexWidth::U8 => bytes.push(index as u8),
                IndexWidth::U16 => bytes.extend_from_slice(&(index as u16).to_le_bytes()),
                IndexWidth::U32 => bytes.extend_from_slice(&index.to_le_bytes()),
            }
        }
        bytes
    }

    /// Triangles as vertex triples, in submission order
    pub fn triangles(&self) -> impl Iterator<Item = [&Vertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                &self.vertices[tri[0] as usize],
                &self.vertices[tri[1] as usize],
                &self.vertices[tri[2] as usize],
            ]
        })
    }
}

/// Quad corners in (-,-), (-,+), (+,-), (+,+) order
fn quad_corners(half_extent: f32, z: f32, color: [f32; 4]) -> [Vertex; 4] {
    let mut corners = [Vertex::zeroed(); 4];
    for (v, corner) in corners.iter_mut().enumerate() {
        let x = if (v >> 1) & 1 == 1 { half_extent } else { -half_extent };
        let y = if v & 1 == 1 { half_extent } else { -half_extent };
        *corner = Vertex::new(x, y, z, color);
    }
    corners
}

/// The opaque plane at z = 0
pub fn build_plane() -> Mesh {
    Mesh {
        vertices: quad_corners(PLANE_HALF_EXTENT, 0.0, PLANE_COLOR).to_vec(),
        indices: QUAD_INDICES.to_vec(),
        index_width: IndexWidth::for_vertex_count(4),
    }
}

/// Depth of each volume layer, from z = +1 down to z = -1.
///
/// With the camera on the -Z side this is far-to-near, which is the order the
/// layers must be submitted in for source-over blending to composite correctly.
pub fn volume_layer_depths(layer_count: usize) -> GlowslabResult<impl Iterator<Item = f32>> {
    if layer_count < 2 {
        return Err(GlowslabError::InvalidConfig(format!(
            "volume needs at least 2 layers, got {}",
            layer_count
        )));
    }
    let last = (layer_count - 1) as f32;
    Ok((0..layer_count).map(move |i| 1.0 - 2.0 * i as f32 / last))
}

/// Stack of `layer_count` translucent quads spanning z in [-1, 1]
pub fn build_volume(layer_count: usize) -> GlowslabResult<Mesh> {
    let depths = volume_layer_depths(layer_count)?;
    let too_many = || {
        GlowslabError::InvalidConfig(format!(
            "{} layers exceed the addressable vertex range",
            layer_count
        ))
    };
    let vertex_count = layer_count
        .checked_mul(4)
        .filter(|&n| n <= u32::MAX as usize)
        .ok_or_else(too_many)?;
    let index_count = layer_count
        .checked_mul(QUAD_INDICES.len())
        .ok_or_else(too_many)?;

    let mut vertices = Vec::with_capacity(vertex_count);
    let mut indices = Vec::with_capacity(index_count);
    for z in depths {
        let base = vertices.len() as u32;
        vertices.extend_from_slice(&quad_corners(LAYER_HALF_EXTENT, z, LAYER_COLOR));
        indices.extend(QUAD_INDICES.iter().map(|i| base + i));
    }

    Mesh::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_area_xy(tri: [&Vertex; 3]) -> f32 {
        let [a, b, c] = tri;
        (b.position[0] - a.position[0]) * (c.position[1] - a.position[1])
            - (c.position[0] - a.position[0]) * (b.position[1] - a.position[1])
    }

    #[test]
    fn test_plane_counts() {
        let plane = build_plane();
        assert_eq!(plane.vertex_count(), 4);
        assert_eq!(plane.index_count(), 6);
        assert_eq!(plane.triangle_count(), 2);
        assert_eq!(plane.index_width(), IndexWidth::U8);
        assert!(plane.vertices().iter().all(|v| v.color == PLANE_COLOR));
        assert!(plane.vertices().iter().all(|v| v.position[2] == 0.0));
    }

    #[test]
    fn test_plane_triangles_share_winding() {
        let plane = build_plane();
        let areas: Vec<f32> = plane.triangles().map(signed_area_xy).collect();
        // Both triangles face the same way, so culling keeps or drops them together
        assert!(areas[0] * areas[1] > 0.0);
    }

    #[test]
    fn test_volume_counts_for_various_layer_counts() {
        for n in [2usize, 3, 17, 200] {
            let volume = build_volume(n).unwrap();
            assert_eq!(volume.vertex_count(), 4 * n);
            assert_eq!(volume.index_count(), 6 * n);
        }
    }

    #[test]
    fn test_volume_layers_span_depth_evenly() {
        let n = 200;
        let volume = build_volume(n).unwrap();
        let first_z = volume.vertices()[0].position[2];
        let last_z = volume.vertices()[4 * n - 1].position[2];
        assert!((first_z - 1.0).abs() < 1e-6);
        assert!((last_z + 1.0).abs() < 1e-6);

        let step = 2.0 / (n - 1) as f32;
        for layer in 1..n {
            let dz = volume.vertices()[4 * (layer - 1)].position[2] - volume.vertices()[4 * layer].position[2];
            assert!((dz - step).abs() < 1e-5);
        }
    }

    #[test]
    fn test_volume_layer_vertices_share_depth_and_color() {
        let volume = build_volume(5).unwrap();
        for layer in volume.vertices().chunks_exact(4) {
            assert!(layer.iter().all(|v| v.position[2] == layer[0].position[2]));
            assert!(layer.iter().all(|v| v.color == LAYER_COLOR));
        }
    }

    #[test]
    fn test_volume_indices_stay_within_layer() {
        let volume = build_volume(4).unwrap();
        for (layer, tri_pair) in volume.indices().chunks_exact(6).enumerate() {
            let base = 4 * layer as u32;
            assert_eq!(tri_pair, &[base, base + 1, base + 2, base + 3, base + 2, base + 1]);
        }
    }

    #[test]
    fn test_volume_index_width_needs_sixteen_bits() {
        let volume = build_volume(200).unwrap();
        assert_eq!(volume.index_width(), IndexWidth::U16);
        assert_eq!(volume.index_bytes().len(), 1200 * 2);
        assert!(volume.indices().iter().all(|&i| i <= u16::MAX as u32));
        // 64 layers is exactly the 8-bit limit
        assert_eq!(build_volume(64).unwrap().index_width(), IndexWidth::U8);
        assert_eq!(build_volume(65).unwrap().index_width(), IndexWidth::U16);
    }

    #[test]
    fn test_volume_rejects_too_few_layers() {
        assert!(matches!(build_volume(0), Err(GlowslabError::InvalidConfig(_))));
        assert!(matches!(build_volume(1), Err(GlowslabError::InvalidConfig(_))));
    }

    #[test]
    fn test_volume_rejects_overflowing_layer_count() {
        assert!(matches!(build_volume(usize::MAX), Err(GlowslabError::InvalidConfig(_))));
        assert!(matches!(
            build_volume(usize::MAX / 4 + 1),
            Err(GlowslabError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_vertex_layout() {
        assert_eq!(Vertex::STRIDE, 28);
        assert_eq!(Vertex::COLOR_OFFSET, 12);
        assert_eq!(build_plane().vertex_bytes().len(), 4 * 28);
    }

    #[test]
    fn test_mesh_new_validates_indices() {
        let verts = quad_corners(1.0, 0.0, PLANE_COLOR).to_vec();
        assert!(Mesh::new(verts.clone(), vec![0, 1]).is_err());
        assert!(Mesh::new(verts.clone(), vec![0, 1, 4]).is_err());
        let mesh = Mesh::new(verts, QUAD_INDICES.to_vec()).unwrap();
        assert_eq!(mesh.index_width(), IndexWidth::U8);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_mesh_rejects_indices_past_plane_vertices() {
        let plane = build_plane();
        let err = Mesh::new(plane.vertices().to_vec(), vec![0, 1, 9]).unwrap_err();
        assert!(matches!(err, GlowslabError::InvalidConfig(_)));
    }

    #[test]
    fn test_mesh_width_follows_grown_vertex_count() {
        // 304 vertices no longer fit 8-bit indices
        let mut vertices = build_plane().vertices().to_vec();
        vertices.extend(build_volume(75).unwrap().vertices());
        let mesh = Mesh::new(vertices, vec![299, 298, 297]).unwrap();
        assert_eq!(mesh.vertex_count(), 304);
        assert_eq!(mesh.index_width(), IndexWidth::U16);

        let bytes = mesh.index_bytes();
        assert_eq!(bytes.len(), 6);
        assert_eq!(u16::from_le_bytes([bytes[0], bytes[1]]), 299);
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), 297);
    }

    #[test]
    fn test_index_bytes_are_little_endian() {
        let volume = build_volume(100).unwrap();
        let bytes = volume.index_bytes();
        let last = volume.indices()[volume.index_count() - 1];
        let n = bytes.len();
        assert_eq!(u16::from_le_bytes([bytes[n - 2], bytes[n - 1]]) as u32, last);
    }
}
