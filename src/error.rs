use std::path::PathBuf;

use thiserror::Error;

/// Failures the binary branches on. Everything else travels as `anyhow::Error`.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Window or GPU context could not be created. Fatal unless the run was
    /// headless to begin with.
    #[error("window initialisation failed during {stage}: {message}")]
    WindowInit { stage: &'static str, message: String },
    #[error("failed to load asset {}: {message}", path.display())]
    Asset { path: PathBuf, message: String },
    #[error("{0}")]
    Options(String),
}

impl ViewerError {
    pub fn window_init(stage: &'static str, err: impl std::fmt::Display) -> Self {
        Self::WindowInit {
            stage,
            message: err.to_string(),
        }
    }

    pub fn asset(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        Self::Asset {
            path: path.into(),
            message: format!("{err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_stage_and_path() {
        let err = ViewerError::window_init("surface", "no adapter");
        assert_eq!(
            err.to_string(),
            "window initialisation failed during surface: no adapter"
        );
        let inner = anyhow::anyhow!("bad face").context("failed to parse ship.obj");
        let err = ViewerError::asset("meshes/ship.obj", &inner);
        assert_eq!(
            err.to_string(),
            "failed to load asset meshes/ship.obj: failed to parse ship.obj: bad face"
        );
    }

    #[test]
    fn window_init_survives_anyhow_round_trip() {
        let err: anyhow::Error = ViewerError::window_init("event loop", "denied").into();
        assert!(matches!(
            err.downcast_ref::<ViewerError>(),
            Some(ViewerError::WindowInit { stage: "event loop", .. })
        ));
    }
}
