mod diagnostics;
mod mesh;
mod pipelines;
mod renderer;
mod shaders;
mod shadow;
mod uniforms;

pub use renderer::{OverlayTarget, Renderer};
