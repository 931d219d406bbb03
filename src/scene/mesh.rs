use glam::{Vec2, Vec3, Vec4};
use image::RgbaImage;

use crate::scene::skeleton::SkinBinding;

/// Texture referenced by a material. `image` is `None` when the pixels were
/// never loaded onto the CPU.
#[derive(Debug, Clone)]
pub struct Texture {
    pub name: String,
    pub image: Option<RgbaImage>,
}

impl Texture {
    #[must_use]
    pub fn new(name: &str, image: RgbaImage) -> Self {
        Self {
            name: name.to_string(),
            image: Some(image),
        }
    }

    /// A texture whose pixel data is not available.
    #[must_use]
    pub fn unloaded(name: &str) -> Self {
        Self {
            name: name.to_string(),
            image: None,
        }
    }
}

/// Minimal metallic-roughness material description.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub base_color: Vec4,
    pub base_color_texture: Option<Texture>,
}

impl Material {
    #[must_use]
    pub fn new(name: &str, base_color: Vec4) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            base_color_texture: None,
        }
    }

    #[must_use]
    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.base_color_texture = Some(texture);
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new("Default", Vec4::ONE)
    }
}

/// Triangle mesh geometry attached to a node.
///
/// Attribute arrays are per vertex; `indices` holds triangle triples.
/// `readable` mirrors whether the geometry has a CPU-side copy; unreadable
/// meshes cannot be exported.
#[derive(Debug, Clone)]
pub struct Mesh<H> {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub readable: bool,
    pub material: Option<Material>,
    pub skin: Option<SkinBinding<H>>,
}

impl<H> Mesh<H> {
    #[must_use]
    pub fn new(name: &str, positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            name: name.to_string(),
            positions,
            normals: Vec::new(),
            uvs: Vec::new(),
            indices,
            readable: true,
            material: None,
            skin: None,
        }
    }

    #[must_use]
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = normals;
        self
    }

    #[must_use]
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = uvs;
        self
    }

    #[must_use]
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    #[must_use]
    pub fn with_skin(mut self, skin: SkinBinding<H>) -> Self {
        self.skin = Some(skin);
        self
    }

    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}
