use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use glam::{Quat, Vec3};
use gltf::json;
use gltf::json::validation::Checked::Valid;
use gltf::json::validation::USize64;
use gltf::json::Index;
use serde_json::{Value, json as value};

use crate::assets::exporters::{
    ENCODER_IO_FAILED, ENCODER_OK, ENCODER_SERIALIZE_FAILED, ExportAnimation, ExportFormat, ExportMaterial, ExportMesh,
    ExportNode, ExportSkin, SceneEncoder,
};
use crate::scene::UNUSED_JOINT;

const GENERATOR: &str = concat!("myth-mocap ", env!("CARGO_PKG_VERSION"));

// ============================================================================
// 1. Binary buffer builder
// ============================================================================

/// Packs accessor data into the single glTF buffer, keeping every view
/// 4-byte aligned.
#[derive(Default)]
struct BufferBuilder {
    data: Vec<u8>,
}

impl BufferBuilder {
    fn push(&mut self, bytes: &[u8]) -> (usize, usize) {
        while self.data.len() % 4 != 0 {
            self.data.push(0);
        }
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);
        (offset, bytes.len())
    }
}

fn f32_bytes(values: impl IntoIterator<Item = f32>) -> Vec<u8> {
    values.into_iter().flat_map(f32::to_le_bytes).collect()
}

fn vec3_bytes(values: &[Vec3]) -> Vec<u8> {
    f32_bytes(values.iter().flat_map(|v| v.to_array()))
}

fn quat_bytes(values: &[Quat]) -> Vec<u8> {
    f32_bytes(values.iter().flat_map(|q| q.to_array()))
}

/// Component-wise bounds, as glTF wants them for positions and sampler input.
fn bounds<const N: usize>(items: impl Iterator<Item = [f32; N]>) -> Option<(Value, Value)> {
    let mut min = [f32::INFINITY; N];
    let mut max = [f32::NEG_INFINITY; N];
    let mut any = false;
    for item in items {
        any = true;
        for i in 0..N {
            min[i] = min[i].min(item[i]);
            max[i] = max[i].max(item[i]);
        }
    }
    any.then(|| (value!(min.to_vec()), value!(max.to_vec())))
}

fn push<T>(list: &mut Vec<T>, item: T) -> Index<T> {
    let index = Index::new(list.len() as u32);
    list.push(item);
    index
}

// ============================================================================
// 2. Encoder
// ============================================================================

/// glTF 2.0 writer: `.glb` for [`ExportFormat::Binary`], `.gltf` with an
/// embedded base64 buffer for [`ExportFormat::Text`].
pub struct GltfEncoder {
    format: ExportFormat,
    root: json::Root,
    buffer: BufferBuilder,
    top_level: Vec<Index<json::Node>>,
    last_error: Option<String>,
}

impl Default for GltfEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl GltfEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: ExportFormat::Binary,
            root: json::Root::default(),
            buffer: BufferBuilder::default(),
            top_level: Vec::new(),
            last_error: None,
        }
    }

    /// The document built so far.
    #[must_use]
    pub fn document(&self) -> &json::Root {
        &self.root
    }

    fn push_view(&mut self, bytes: &[u8], target: Option<json::buffer::Target>) -> Index<json::buffer::View> {
        let (offset, length) = self.buffer.push(bytes);
        push(
            &mut self.root.buffer_views,
            json::buffer::View {
                buffer: Index::new(0),
                byte_length: USize64::from(length),
                byte_offset: Some(USize64::from(offset)),
                byte_stride: None,
                extensions: Default::default(),
                extras: Default::default(),
                name: None,
                target: target.map(Valid),
            },
        )
    }

    fn push_accessor(
        &mut self,
        bytes: &[u8],
        count: usize,
        component_type: json::accessor::ComponentType,
        type_: json::accessor::Type,
        target: Option<json::buffer::Target>,
        min_max: Option<(Value, Value)>,
    ) -> Index<json::Accessor> {
        let view = self.push_view(bytes, target);
        let (min, max) = min_max.map_or((None, None), |(min, max)| (Some(min), Some(max)));
        push(
            &mut self.root.accessors,
            json::Accessor {
                buffer_view: Some(view),
                byte_offset: Some(USize64(0)),
                count: USize64::from(count),
                component_type: Valid(json::accessor::GenericComponentType(component_type)),
                extensions: Default::default(),
                extras: Default::default(),
                type_: Valid(type_),
                min,
                max,
                name: None,
                normalized: false,
                sparse: None,
            },
        )
    }

    fn push_vec3s(&mut self, values: &[Vec3], target: Option<json::buffer::Target>, with_bounds: bool) -> Index<json::Accessor> {
        let min_max = if with_bounds {
            bounds(values.iter().map(|v| v.to_array()))
        } else {
            None
        };
        self.push_accessor(
            &vec3_bytes(values),
            values.len(),
            json::accessor::ComponentType::F32,
            json::accessor::Type::Vec3,
            target,
            min_max,
        )
    }

    fn push_material(&mut self, material: &ExportMaterial) -> Index<json::Material> {
        let base_color_texture = material.texture_png.as_deref().map(|png| {
            let view = self.push_view(png, None);
            let image = push(
                &mut self.root.images,
                json::Image {
                    buffer_view: Some(view),
                    mime_type: Some(json::image::MimeType(String::from("image/png"))),
                    name: Some(format!("{}_baseColor", material.name)),
                    uri: None,
                    extensions: Default::default(),
                    extras: Default::default(),
                },
            );
            let texture = push(
                &mut self.root.textures,
                json::Texture {
                    name: None,
                    sampler: None,
                    source: image,
                    extensions: Default::default(),
                    extras: Default::default(),
                },
            );
            json::texture::Info {
                index: texture,
                tex_coord: 0,
                extensions: Default::default(),
                extras: Default::default(),
            }
        });

        push(
            &mut self.root.materials,
            json::Material {
                name: Some(material.name.clone()),
                pbr_metallic_roughness: json::material::PbrMetallicRoughness {
                    base_color_factor: json::material::PbrBaseColorFactor(material.base_color.to_array()),
                    base_color_texture,
                    metallic_factor: json::material::StrengthFactor(0.0),
                    roughness_factor: json::material::StrengthFactor(1.0),
                    metallic_roughness_texture: None,
                    extensions: Default::default(),
                    extras: Default::default(),
                },
                ..Default::default()
            },
        )
    }

    fn push_skin(
        &mut self,
        skin: &ExportSkin,
        attributes: &mut BTreeMap<json::validation::Checked<json::mesh::Semantic>, Index<json::Accessor>>,
    ) -> Index<json::Skin> {
        // glTF joints are unsigned; an unused slot is joint 0 with weight 0.
        let joints: Vec<u8> = skin
            .influences
            .iter()
            .flat_map(|inf| inf.joints.map(|j| if j == UNUSED_JOINT { 0 } else { j as u16 }))
            .flat_map(u16::to_le_bytes)
            .collect();
        let weights = f32_bytes(skin.influences.iter().flat_map(|inf| inf.weights));
        let count = skin.influences.len();

        let joints_accessor = self.push_accessor(
            &joints,
            count,
            json::accessor::ComponentType::U16,
            json::accessor::Type::Vec4,
            Some(json::buffer::Target::ArrayBuffer),
            None,
        );
        let weights_accessor = self.push_accessor(
            &weights,
            count,
            json::accessor::ComponentType::F32,
            json::accessor::Type::Vec4,
            Some(json::buffer::Target::ArrayBuffer),
            None,
        );
        attributes.insert(Valid(json::mesh::Semantic::Joints(0)), joints_accessor);
        attributes.insert(Valid(json::mesh::Semantic::Weights(0)), weights_accessor);

        let matrices = f32_bytes(skin.inverse_bind_matrices.iter().flat_map(|m| m.to_cols_array()));
        let ibm = self.push_accessor(
            &matrices,
            skin.inverse_bind_matrices.len(),
            json::accessor::ComponentType::F32,
            json::accessor::Type::Mat4,
            None,
            None,
        );

        push(
            &mut self.root.skins,
            json::Skin {
                extensions: Default::default(),
                extras: Default::default(),
                inverse_bind_matrices: Some(ibm),
                joints: skin.joints.iter().map(|&j| Index::new(j as u32)).collect(),
                name: None,
                skeleton: None,
            },
        )
    }

    fn write(&mut self, path: &Path) -> Result<(), (i32, String)> {
        if !self.buffer.data.is_empty() {
            let uri = match self.format {
                ExportFormat::Binary => None,
                ExportFormat::Text => Some(format!(
                    "data:application/octet-stream;base64,{}",
                    STANDARD.encode(&self.buffer.data)
                )),
            };
            self.root.buffers = vec![json::Buffer {
                byte_length: USize64::from(self.buffer.data.len()),
                extensions: Default::default(),
                extras: Default::default(),
                name: None,
                uri,
            }];
        }

        let scene = push(
            &mut self.root.scenes,
            json::Scene {
                extensions: Default::default(),
                extras: Default::default(),
                name: None,
                nodes: self.top_level.clone(),
            },
        );
        self.root.scene = Some(scene);
        self.root.asset.generator = Some(String::from(GENERATOR));

        let bytes = match self.format {
            ExportFormat::Binary => self.to_glb()?,
            ExportFormat::Text => {
                serde_json::to_vec_pretty(&self.root).map_err(|e| (ENCODER_SERIALIZE_FAILED, e.to_string()))?
            }
        };
        fs::write(path, bytes).map_err(|e| (ENCODER_IO_FAILED, format!("{}: {e}", path.display())))
    }

    fn to_glb(&self) -> Result<Vec<u8>, (i32, String)> {
        let mut json_bytes = serde_json::to_vec(&self.root).map_err(|e| (ENCODER_SERIALIZE_FAILED, e.to_string()))?;
        while json_bytes.len() % 4 != 0 {
            json_bytes.push(b' ');
        }
        let mut bin = self.buffer.data.clone();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }

        // 12-byte header, 8-byte header per chunk.
        let length = 12 + 8 + json_bytes.len() + if bin.is_empty() { 0 } else { 8 + bin.len() };
        let glb = gltf::binary::Glb {
            header: gltf::binary::Header {
                magic: *b"glTF",
                version: 2,
                length: length as u32,
            },
            json: Cow::Owned(json_bytes),
            bin: (!bin.is_empty()).then_some(Cow::Owned(bin)),
        };
        glb.to_vec().map_err(|e| (ENCODER_SERIALIZE_FAILED, e.to_string()))
    }
}

impl SceneEncoder for GltfEncoder {
    fn is_supported(&self, _format: ExportFormat) -> bool {
        // No filesystem to write to.
        !cfg!(target_arch = "wasm32")
    }

    fn begin(&mut self, format: ExportFormat) {
        *self = Self::new();
        self.format = format;
    }

    fn add_node(&mut self, node: ExportNode) -> usize {
        let index = push(
            &mut self.root.nodes,
            json::Node {
                camera: None,
                children: None,
                extensions: Default::default(),
                extras: Default::default(),
                matrix: None,
                mesh: None,
                name: Some(node.name),
                rotation: Some(json::scene::UnitQuaternion(node.rotation.to_array())),
                scale: Some(node.scale.to_array()),
                translation: Some(node.translation.to_array()),
                skin: None,
                weights: None,
            },
        );

        match node.parent.and_then(|p| self.root.nodes.get_mut(p)) {
            Some(parent) => parent.children.get_or_insert_with(Vec::new).push(index),
            None => self.top_level.push(index),
        }
        index.value()
    }

    fn add_mesh(&mut self, node: usize, mesh: ExportMesh) {
        let mut attributes = BTreeMap::new();

        let positions = self.push_vec3s(&mesh.positions, Some(json::buffer::Target::ArrayBuffer), true);
        attributes.insert(Valid(json::mesh::Semantic::Positions), positions);

        if !mesh.normals.is_empty() {
            let normals = self.push_vec3s(&mesh.normals, Some(json::buffer::Target::ArrayBuffer), false);
            attributes.insert(Valid(json::mesh::Semantic::Normals), normals);
        }
        if !mesh.uvs.is_empty() {
            let uvs = self.push_accessor(
                &f32_bytes(mesh.uvs.iter().flat_map(|uv| uv.to_array())),
                mesh.uvs.len(),
                json::accessor::ComponentType::F32,
                json::accessor::Type::Vec2,
                Some(json::buffer::Target::ArrayBuffer),
                None,
            );
            attributes.insert(Valid(json::mesh::Semantic::TexCoords(0)), uvs);
        }

        let indices = (!mesh.indices.is_empty()).then(|| {
            let bytes: Vec<u8> = mesh.indices.iter().flat_map(|i| i.to_le_bytes()).collect();
            self.push_accessor(
                &bytes,
                mesh.indices.len(),
                json::accessor::ComponentType::U32,
                json::accessor::Type::Scalar,
                Some(json::buffer::Target::ElementArrayBuffer),
                None,
            )
        });

        let material = mesh.material.as_ref().map(|m| self.push_material(m));
        let skin = mesh.skin.as_ref().map(|s| self.push_skin(s, &mut attributes));

        let mesh_index = push(
            &mut self.root.meshes,
            json::Mesh {
                extensions: Default::default(),
                extras: Default::default(),
                name: Some(mesh.name),
                primitives: vec![json::mesh::Primitive {
                    attributes,
                    extensions: Default::default(),
                    extras: Default::default(),
                    indices,
                    material,
                    mode: Valid(json::mesh::Mode::Triangles),
                    targets: None,
                }],
                weights: None,
            },
        );

        if let Some(target) = self.root.nodes.get_mut(node) {
            target.mesh = Some(mesh_index);
            target.skin = skin;
        }
    }

    fn add_animation(&mut self, animation: ExportAnimation) {
        if animation.channels.is_empty() {
            return;
        }

        let input = self.push_accessor(
            &f32_bytes(animation.timestamps.iter().copied()),
            animation.timestamps.len(),
            json::accessor::ComponentType::F32,
            json::accessor::Type::Scalar,
            None,
            bounds(animation.timestamps.iter().map(|&t| [t])),
        );

        let mut samplers = Vec::with_capacity(animation.channels.len() * 3);
        let mut channels = Vec::with_capacity(animation.channels.len() * 3);

        for channel in &animation.channels {
            let outputs = [
                (
                    json::animation::Property::Translation,
                    self.push_vec3s(&channel.translations, None, false),
                ),
                (
                    json::animation::Property::Rotation,
                    self.push_accessor(
                        &quat_bytes(&channel.rotations),
                        channel.rotations.len(),
                        json::accessor::ComponentType::F32,
                        json::accessor::Type::Vec4,
                        None,
                        None,
                    ),
                ),
                (json::animation::Property::Scale, self.push_vec3s(&channel.scales, None, false)),
            ];

            for (property, output) in outputs {
                let sampler = push(
                    &mut samplers,
                    json::animation::Sampler {
                        extensions: Default::default(),
                        extras: Default::default(),
                        input,
                        interpolation: Valid(json::animation::Interpolation::Linear),
                        output,
                    },
                );
                channels.push(json::animation::Channel {
                    sampler,
                    target: json::animation::Target {
                        extensions: Default::default(),
                        extras: Default::default(),
                        node: Index::new(channel.node as u32),
                        path: Valid(property),
                    },
                    extensions: Default::default(),
                    extras: Default::default(),
                });
            }
        }

        self.root.animations.push(json::Animation {
            extensions: Default::default(),
            extras: Default::default(),
            channels,
            name: Some(animation.name),
            samplers,
        });
    }

    fn finish(&mut self, path: &Path) -> i32 {
        match self.write(path) {
            Ok(()) => {
                self.last_error = None;
                log::debug!("Wrote {:?} glTF to {}", self.format, path.display());
                ENCODER_OK
            }
            Err((code, message)) => {
                self.last_error = Some(message);
                code
            }
        }
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
