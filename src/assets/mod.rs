pub mod exporters;
pub mod storage;

pub use exporters::{
    ExportAnimation, ExportChannel, ExportFormat, ExportMaterial, ExportMesh, ExportNode, ExportOptions, ExportSkin,
    ExportSummary, GltfEncoder, SceneEncoder, SceneExporter,
};
pub use storage::{load_clip, save_clip};
