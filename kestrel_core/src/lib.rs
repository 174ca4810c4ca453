pub use glam;

pub mod cache;
pub mod error;
pub mod mesh;
pub mod model;
pub mod node;
pub mod shader;
pub mod standard_shader;
pub mod texture;

pub use error::{Error, Result};
pub use mesh::{Mesh, Vertex};
pub use model::Model;
pub use node::Node;
pub use shader::{Shader, ShaderStage, ShaderStageKind};
pub use texture::{Texture, TextureRole};
