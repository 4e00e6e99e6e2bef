//! Building blocks of the shadow viewer.
//!
//! Scene state, input handling and frame orchestration are plain data and
//! can be driven without a window, which is how the headless mode and the
//! tests use them. The wgpu renderer and the egui panel only consume what
//! those modules produce.

pub mod camera;
pub mod config;
pub mod controls;
pub mod error;
pub mod frame;
pub mod input;
pub mod light;
pub mod obj;
pub mod panel;
pub mod render;
pub mod scene;
pub mod ship;
pub mod state;

pub use camera::{Camera, CameraMode, CameraRig, LookAngles, MoveDirection};
pub use config::{ViewerOptions, WindowSize};
pub use controls::ControlEffect;
pub use error::ViewerError;
pub use frame::{FrameOrchestrator, FramePlan, FrameRecorder, RenderBackend, RenderMode};
pub use input::{InputState, Key};
pub use light::{DirectionalLight, LightSelection, PointLight};
pub use obj::{load_obj_file, load_obj_from_str, MeshData, Vertex};
pub use panel::PanelOverlay;
pub use render::Renderer;
pub use scene::{LoadedMesh, MeshRole, SceneDescription};
pub use ship::{Levitation, ShipTransform};
pub use state::{FrameSnapshot, SceneState};
