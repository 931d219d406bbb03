//! Scene export
//!
//! [`SceneExporter`] turns a live hierarchy plus an [`AnimationData`] into an
//! interchange file. It owns every semantic step of the conversion:
//!
//! - depth-first node tree below the export root (the root itself is the
//!   coordinate reference and is not emitted)
//! - handedness mirroring about X for translations, rotations, vertices and
//!   normals, with triangle winding reversed; scale and UVs are untouched
//! - the uniform `model_scale` on every length
//! - bind-pose reconstruction and bone remapping for skins
//! - track-to-node resolution and consistency checks for the animation
//!
//! The result is handed to a [`SceneEncoder`] as plain export-space records.
//! Encoders only serialize; [`GltfEncoder`] writes glTF 2.0.
//!
//! Export is best-effort: a bad mesh, an unmapped bone or a mismatched track
//! is logged and skipped, and the rest of the scene is still written. Only
//! an unsupported target or a failing encoder fails the whole call.

pub mod gltf;

use std::io::Cursor;
use std::path::Path;

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::animation::AnimationData;
use crate::errors::{MotionError, Result};
use crate::math;
use crate::scene::{BoneInfluence, MAX_INFLUENCES, Material, Mesh, SceneGraph, SkinBinding, UNUSED_JOINT};

pub use self::gltf::GltfEncoder;

/// `finish` result code for a successful write.
pub const ENCODER_OK: i32 = 0;
/// The document could not be serialized.
pub const ENCODER_SERIALIZE_FAILED: i32 = 1;
/// The destination could not be written.
pub const ENCODER_IO_FAILED: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportFormat {
    /// Single compact binary file (`.glb`).
    #[default]
    Binary,
    /// Human-readable JSON with the binary buffer embedded as base64 (`.gltf`).
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// Uniform factor applied to every exported length.
    pub model_scale: f32,
    /// Name of the exported animation; the clip's own name when `None`.
    pub animation_name: Option<String>,
    pub export_meshes: bool,
    pub export_materials: bool,
    pub export_skins: bool,
    pub export_animation: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Binary,
            model_scale: 1.0,
            animation_name: None,
            export_meshes: true,
            export_materials: true,
            export_skins: true,
            export_animation: true,
        }
    }
}

/// What an export produced and what it had to leave out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub nodes: usize,
    pub meshes: usize,
    pub materials: usize,
    pub skins: usize,
    pub animation_channels: usize,
    pub skipped_meshes: usize,
    pub skipped_bones: usize,
    pub skipped_tracks: usize,
    pub missing_textures: usize,
    /// Frames dropped because they repeat the previous frame's timestamp.
    pub duplicate_frames: usize,
}

// ============================================================================
// Export-space records
// ============================================================================

/// A node in export space. `parent` indexes earlier nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportNode {
    pub name: String,
    pub parent: Option<usize>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportMaterial {
    pub name: String,
    pub base_color: Vec4,
    /// PNG-encoded base colour texture.
    pub texture_png: Option<Vec<u8>>,
}

/// Skin in export space.
///
/// `joints` are exported node indices. Influence joints index into
/// `joints`; unused slots carry [`UNUSED_JOINT`] and a zero weight.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSkin {
    pub joints: Vec<usize>,
    pub inverse_bind_matrices: Vec<Mat4>,
    pub influences: Vec<BoneInfluence>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportMesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub material: Option<ExportMaterial>,
    pub skin: Option<ExportSkin>,
}

/// Per-frame samples for one node, aligned to [`ExportAnimation::timestamps`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExportChannel {
    pub node: usize,
    pub translations: Vec<Vec3>,
    pub rotations: Vec<Quat>,
    pub scales: Vec<Vec3>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportAnimation {
    pub name: String,
    pub timestamps: Vec<f32>,
    pub channels: Vec<ExportChannel>,
}

// ============================================================================
// Encoder boundary
// ============================================================================

/// Serializer for an interchange format.
///
/// Calls arrive in order: `begin`, every `add_node`, then meshes, then at
/// most one animation, then `finish`.
pub trait SceneEncoder {
    /// Whether `format` can be produced on this platform.
    fn is_supported(&self, format: ExportFormat) -> bool;

    /// Discards any previous document and starts a new one.
    fn begin(&mut self, format: ExportFormat);

    /// Appends a node and returns its index.
    fn add_node(&mut self, node: ExportNode) -> usize;

    /// Attaches a mesh (and its skin) to an already added node.
    fn add_mesh(&mut self, node: usize, mesh: ExportMesh);

    fn add_animation(&mut self, animation: ExportAnimation);

    /// Writes the document. Returns [`ENCODER_OK`] or a non-zero code.
    fn finish(&mut self, path: &Path) -> i32;

    /// Description of the last non-zero `finish` result.
    fn last_error(&self) -> Option<&str>;
}

// ============================================================================
// Exporter
// ============================================================================

pub struct SceneExporter<E: SceneEncoder = GltfEncoder> {
    encoder: E,
    pub options: ExportOptions,
}

impl SceneExporter<GltfEncoder> {
    #[must_use]
    pub fn gltf(options: ExportOptions) -> Self {
        Self::new(GltfEncoder::new(), options)
    }
}

impl<E: SceneEncoder> SceneExporter<E> {
    #[must_use]
    pub fn new(encoder: E, options: ExportOptions) -> Self {
        Self { encoder, options }
    }

    #[must_use]
    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    pub fn into_encoder(self) -> E {
        self.encoder
    }

    /// Exports everything below `root` plus `data` to `path`.
    pub fn export<S: SceneGraph>(
        &mut self,
        scene: &S,
        root: S::Handle,
        data: Option<&AnimationData>,
        path: impl AsRef<Path>,
    ) -> Result<ExportSummary> {
        let path = path.as_ref();
        let format = self.options.format;

        if !self.encoder.is_supported(format) {
            log::error!("{format:?} export is not supported on this platform");
            return Err(MotionError::ExportUnsupported(format!("{format:?}")));
        }
        if !scene.contains(root) {
            log::error!("Export root {root:?} is not part of the scene");
            return Err(MotionError::NodeNotFound(format!("{root:?}")));
        }

        let mut summary = ExportSummary::default();
        self.encoder.begin(format);

        let (order, index_map) = self.export_nodes(scene, root);
        summary.nodes = order.len();

        if self.options.export_meshes {
            for &handle in &order {
                let (Some(mesh), Some(&node_index)) = (scene.mesh(handle), index_map.get(&handle)) else {
                    continue;
                };
                match self.convert_mesh(scene, mesh, &index_map, &mut summary) {
                    Ok(converted) => {
                        summary.meshes += 1;
                        summary.materials += usize::from(converted.material.is_some());
                        summary.skins += usize::from(converted.skin.is_some());
                        self.encoder.add_mesh(node_index, converted);
                    }
                    Err(err) => {
                        log::warn!("Skipping mesh on node '{}': {err}", scene.name(handle).unwrap_or_default());
                        summary.skipped_meshes += 1;
                    }
                }
            }
        }

        if self.options.export_animation
            && let Some(data) = data
            && !data.is_empty()
        {
            let animation = self.convert_animation(scene, root, data, &index_map, &mut summary);
            summary.animation_channels = animation.channels.len() * 3;
            self.encoder.add_animation(animation);
        }

        let code = self.encoder.finish(path);
        if code != ENCODER_OK {
            let message = self.encoder.last_error().unwrap_or("unknown error").to_string();
            log::error!("Export to {} failed with code {code}: {message}", path.display());
            return Err(MotionError::EncoderFailed { code, message });
        }

        log::info!(
            "Exported {} nodes, {} meshes, {} animation channels to {}",
            summary.nodes,
            summary.meshes,
            summary.animation_channels,
            path.display()
        );
        Ok(summary)
    }

    // ========================================================================
    // Node pass
    // ========================================================================

    fn export_nodes<S: SceneGraph>(
        &mut self,
        scene: &S,
        root: S::Handle,
    ) -> (Vec<S::Handle>, FxHashMap<S::Handle, usize>) {
        let scale = self.options.model_scale;
        let mut order = Vec::new();
        let mut index_map = FxHashMap::default();

        let mut stack: Vec<S::Handle> = scene.children(root).iter().rev().copied().collect();
        while let Some(handle) = stack.pop() {
            let Some(local) = scene.local_transform(handle) else {
                continue;
            };
            let parent = scene
                .parent(handle)
                .filter(|&p| p != root)
                .and_then(|p| index_map.get(&p).copied());

            let index = self.encoder.add_node(ExportNode {
                name: scene.name(handle).unwrap_or_default().to_string(),
                parent,
                translation: math::mirror_vec3(local.position) * scale,
                rotation: math::mirror_quat(local.rotation),
                scale: local.scale,
            });
            index_map.insert(handle, index);
            order.push(handle);

            stack.extend(scene.children(handle).iter().rev().copied());
        }

        (order, index_map)
    }

    // ========================================================================
    // Mesh pass
    // ========================================================================

    fn convert_mesh<S: SceneGraph>(
        &self,
        scene: &S,
        mesh: &Mesh<S::Handle>,
        index_map: &FxHashMap<S::Handle, usize>,
        summary: &mut ExportSummary,
    ) -> Result<ExportMesh> {
        if !mesh.readable {
            return Err(MotionError::MeshNotReadable(mesh.name.clone()));
        }

        let scale = self.options.model_scale;
        if mesh.indices.len() % 3 != 0 {
            log::warn!(
                "Mesh '{}' has {} indices, dropping the trailing partial triangle",
                mesh.name,
                mesh.indices.len()
            );
        }

        let material = match (&mesh.material, self.options.export_materials) {
            (Some(material), true) => Some(convert_material(&mesh.name, material, summary)?),
            _ => None,
        };

        let skin = match (&mesh.skin, self.options.export_skins) {
            (Some(skin), true) => self.convert_skin(scene, mesh, skin, index_map, summary),
            _ => None,
        };

        Ok(ExportMesh {
            name: mesh.name.clone(),
            positions: mesh.positions.iter().map(|&p| math::mirror_vec3(p) * scale).collect(),
            normals: mesh.normals.iter().map(|&n| math::mirror_vec3(n)).collect(),
            uvs: mesh.uvs.clone(),
            indices: mesh
                .indices
                .chunks_exact(3)
                .flat_map(|tri| [tri[2], tri[1], tri[0]])
                .collect(),
            material,
            skin,
        })
    }

    fn convert_skin<S: SceneGraph>(
        &self,
        scene: &S,
        mesh: &Mesh<S::Handle>,
        skin: &SkinBinding<S::Handle>,
        index_map: &FxHashMap<S::Handle, usize>,
        summary: &mut ExportSummary,
    ) -> Option<ExportSkin> {
        if skin.influences.len() != mesh.vertex_count() {
            log::warn!(
                "Skin of mesh '{}' has {} influences for {} vertices, exporting it unskinned",
                mesh.name,
                skin.influences.len(),
                mesh.vertex_count()
            );
            return None;
        }

        let scale = self.options.model_scale;
        let mut joints = Vec::with_capacity(skin.bones.len());
        let mut inverse_bind_matrices = Vec::with_capacity(skin.bones.len());
        // Source bone slot -> exported joint slot.
        let mut remap: Vec<Option<i32>> = Vec::with_capacity(skin.bones.len());

        for (slot, &bone) in skin.bones.iter().enumerate() {
            let Some(&node_index) = index_map.get(&bone) else {
                let err = MotionError::BoneNotMapped(scene.name(bone).map_or_else(|| format!("{bone:?}"), str::to_string));
                log::warn!("Mesh '{}': {err}", mesh.name);
                summary.skipped_bones += 1;
                remap.push(None);
                continue;
            };

            let bind_matrix = skin.bind_matrices.get(slot).copied().unwrap_or_else(|| {
                log::warn!("Mesh '{}': bone slot {slot} has no bind matrix, using identity", mesh.name);
                Mat4::IDENTITY
            });
            let (t, r, s) = math::decompose(&bind_matrix.inverse());
            let bind_pose = math::compose(math::mirror_vec3(t) * scale, math::mirror_quat(r), s);

            remap.push(Some(joints.len() as i32));
            joints.push(node_index);
            inverse_bind_matrices.push(bind_pose.inverse());
        }

        if joints.is_empty() {
            log::warn!("Mesh '{}': no skin bone is part of the export, exporting it unskinned", mesh.name);
            return None;
        }

        let influences = skin
            .influences
            .iter()
            .map(|influence| remap_influence(influence, &remap))
            .collect();

        Some(ExportSkin {
            joints,
            inverse_bind_matrices,
            influences,
        })
    }

    // ========================================================================
    // Animation pass
    // ========================================================================

    fn convert_animation<S: SceneGraph>(
        &self,
        scene: &S,
        root: S::Handle,
        data: &AnimationData,
        index_map: &FxHashMap<S::Handle, usize>,
        summary: &mut ExportSummary,
    ) -> ExportAnimation {
        let scale = self.options.model_scale;
        let frames = data.frame_count();
        let mut channels = Vec::with_capacity(data.track_count());

        // Sampler input must be strictly increasing: keep the first frame of
        // each run of equal timestamps.
        let mut kept = Vec::with_capacity(frames);
        for (frame, &time) in data.timeline().iter().enumerate() {
            let repeated = kept.last().is_some_and(|&prev| time <= data.timeline()[prev]);
            if !repeated {
                kept.push(frame);
            }
        }
        if kept.len() < frames {
            summary.duplicate_frames = frames - kept.len();
            log::warn!(
                "Animation '{}' repeats timestamps, dropping {} frames",
                data.name,
                summary.duplicate_frames
            );
        }

        for track in data.tracks() {
            if track.poses.len() != frames {
                log::warn!(
                    "Track '{}' has {} poses for {frames} timestamps, skipping",
                    track.node_path,
                    track.poses.len()
                );
                summary.skipped_tracks += 1;
                continue;
            }
            let Some(node) = scene
                .find_by_path(root, &track.node_path)
                .and_then(|handle| index_map.get(&handle).copied())
            else {
                log::warn!("Track '{}' has no exported node, skipping", track.node_path);
                summary.skipped_tracks += 1;
                continue;
            };

            let poses = || kept.iter().map(|&frame| &track.poses[frame]);
            channels.push(ExportChannel {
                node,
                translations: poses().map(|p| math::mirror_vec3(p.translation) * scale).collect(),
                rotations: poses().map(|p| math::mirror_quat(p.rotation)).collect(),
                scales: poses().map(|p| p.scale).collect(),
            });
        }

        ExportAnimation {
            name: self.options.animation_name.clone().unwrap_or_else(|| data.name.clone()),
            timestamps: kept.iter().map(|&frame| data.timeline()[frame]).collect(),
            channels,
        }
    }
}

fn convert_material(mesh_name: &str, material: &Material, summary: &mut ExportSummary) -> Result<ExportMaterial> {
    let texture_png = match &material.base_color_texture {
        None => None,
        Some(texture) => match &texture.image {
            Some(pixels) => {
                let mut png = Cursor::new(Vec::new());
                pixels.write_to(&mut png, image::ImageFormat::Png)?;
                Some(png.into_inner())
            }
            None => {
                let err = MotionError::TextureMissing(texture.name.clone());
                log::warn!("Mesh '{mesh_name}': {err}, exporting material untextured");
                summary.missing_textures += 1;
                None
            }
        },
    };

    Ok(ExportMaterial {
        name: material.name.clone(),
        base_color: material.base_color,
        texture_png,
    })
}

/// Re-targets an influence at exported joint slots, dropping unmapped bones
/// and renormalizing what is left.
fn remap_influence(influence: &BoneInfluence, remap: &[Option<i32>]) -> BoneInfluence {
    let mut pairs = [(UNUSED_JOINT, 0.0f32); MAX_INFLUENCES];
    let mut used = 0;

    for (&joint, &weight) in influence.joints.iter().zip(&influence.weights) {
        if joint == UNUSED_JOINT || weight <= 0.0 {
            continue;
        }
        let Some(Some(mapped)) = usize::try_from(joint).ok().and_then(|j| remap.get(j)) else {
            continue;
        };
        pairs[used] = (*mapped, weight);
        used += 1;
    }

    let total: f32 = pairs[..used].iter().map(|&(_, w)| w).sum();
    if total > 0.0 {
        for pair in &mut pairs[..used] {
            pair.1 /= total;
        }
    }
    BoneInfluence::from_pairs(&pairs[..used])
}
