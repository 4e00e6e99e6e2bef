use glam::{Mat4, Vec2, Vec3};

/// Discrete translation commands understood by [`Camera::moved`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
}

/// Look-at camera whose look direction and position are updated separately.
///
/// Mouse look replaces `front` through [`Camera::set_front`], movement keys
/// translate `position` through [`Camera::apply_move`]. The same type serves
/// the free-fly edit camera and the ride-along camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Look target supplied at construction. The view matrix follows `front`.
    pub target: Vec3,
    pub front: Vec3,
    pub up: Vec3,
}

impl Camera {
    /// Front direction every camera starts with until a look update arrives.
    pub const INITIAL_FRONT: Vec3 = Vec3::new(0.0, 0.0, -3.0);

    pub fn new(position: Vec3, target: Vec3, up: Vec3) -> Self {
        Self {
            position,
            target,
            front: Self::INITIAL_FRONT,
            up,
        }
    }

    /// Right-handed look-at matrix from `position` towards `position + front`.
    ///
    /// The result is undefined when `front` is zero or parallel to `up`.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Unit strafe axis, recomputed from the current `front` on every call.
    pub fn right(&self) -> Vec3 {
        self.front.cross(self.up).normalize()
    }

    /// Returns the camera translated one step in `direction`.
    pub fn moved(self, direction: MoveDirection, speed: f32) -> Self {
        let offset = match direction {
            MoveDirection::Forward => self.front * speed,
            MoveDirection::Backward => -self.front * speed,
            MoveDirection::Left => -self.right() * speed,
            MoveDirection::Right => self.right() * speed,
        };
        Self {
            position: self.position + offset,
            ..self
        }
    }

    pub fn apply_move(&mut self, direction: MoveDirection, speed: f32) {
        *self = self.moved(direction, speed);
    }

    /// Replaces the look direction. Callers pass a normalized vector.
    pub fn set_front(&mut self, front: Vec3) {
        self.front = front;
    }
}

/// Yaw/pitch pair (degrees) driving one camera's look direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngles {
    pub yaw: f32,
    pub pitch: f32,
    anchor: Option<Vec2>,
}

impl LookAngles {
    pub const PITCH_LIMIT: f32 = 89.0;

    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self {
            yaw,
            pitch: pitch.clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT),
            anchor: None,
        }
    }

    /// Applies a look offset (already in "up is positive" convention) and
    /// returns the new normalized front vector.
    pub fn rotate(&mut self, dx: f32, dy: f32, sensitivity: f32) -> Vec3 {
        self.yaw += dx * sensitivity;
        self.pitch = (self.pitch + dy * sensitivity).clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
        self.front()
    }

    /// Feeds an absolute cursor position. The first sample after a reset only
    /// anchors the cursor and yields no rotation.
    pub fn track_cursor(&mut self, position: Vec2, sensitivity: f32) -> Option<Vec3> {
        let Some(last) = self.anchor.replace(position) else {
            return None;
        };
        // screen y grows downwards
        Some(self.rotate(position.x - last.x, last.y - position.y, sensitivity))
    }

    pub fn reset_anchor(&mut self) {
        self.anchor = None;
    }

    pub fn front(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }
}

/// Control scheme selecting which camera is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraMode {
    /// Free-fly camera, visible cursor, control panel shown.
    Edit,
    /// Camera riding with the ship, cursor captured.
    Ride,
}

impl CameraMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Edit => Self::Ride,
            Self::Ride => Self::Edit,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Ride => "ride",
        }
    }
}

/// Both cameras with their independent look state.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    edit: Camera,
    ride: Camera,
    edit_look: LookAngles,
    ride_look: LookAngles,
    mode: CameraMode,
}

impl Default for CameraRig {
    fn default() -> Self {
        let edit = Camera::new(Vec3::new(0.0, 2.0, 5.5), Vec3::ZERO, Vec3::Y);
        let mut ride = Camera::new(
            Vec3::new(0.0, 1.0, -2.0),
            Vec3::new(0.0, 1.0, -3.0),
            Vec3::Y,
        );
        ride.set_front(Vec3::Z);
        Self {
            edit,
            ride,
            edit_look: LookAngles::new(-90.0, 0.0),
            ride_look: LookAngles::new(90.0, 0.0),
            mode: CameraMode::Edit,
        }
    }
}

impl CameraRig {
    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CameraMode) {
        if self.mode != mode {
            self.mode = mode;
            self.look_mut().reset_anchor();
        }
    }

    /// Swaps the active camera. The inactive camera keeps its state.
    pub fn toggle_mode(&mut self) -> CameraMode {
        self.set_mode(self.mode.toggled());
        self.mode
    }

    pub fn active(&self) -> &Camera {
        self.camera(self.mode)
    }

    pub fn active_mut(&mut self) -> &mut Camera {
        match self.mode {
            CameraMode::Edit => &mut self.edit,
            CameraMode::Ride => &mut self.ride,
        }
    }

    pub fn camera(&self, mode: CameraMode) -> &Camera {
        match mode {
            CameraMode::Edit => &self.edit,
            CameraMode::Ride => &self.ride,
        }
    }

    pub fn look(&self, mode: CameraMode) -> &LookAngles {
        match mode {
            CameraMode::Edit => &self.edit_look,
            CameraMode::Ride => &self.ride_look,
        }
    }

    fn look_mut(&mut self) -> &mut LookAngles {
        match self.mode {
            CameraMode::Edit => &mut self.edit_look,
            CameraMode::Ride => &mut self.ride_look,
        }
    }

    /// Absolute cursor sample for the active mode.
    pub fn look_at_cursor(&mut self, position: Vec2, sensitivity: f32) {
        if let Some(front) = self.look_mut().track_cursor(position, sensitivity) {
            self.active_mut().set_front(front);
        }
    }

    /// Raw pointer motion for the active mode (captured cursor).
    pub fn look_by(&mut self, delta: Vec2, sensitivity: f32) {
        let front = self.look_mut().rotate(delta.x, -delta.y, sensitivity);
        self.active_mut().set_front(front);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn view_matrix_matches_look_at_golden() {
        let mut camera = Camera::new(Vec3::new(0.0, 2.0, 5.5), Vec3::ZERO, Vec3::Y);
        camera.set_front(Vec3::new(0.0, 0.0, -3.0));
        let expected = Mat4::look_at_rh(
            Vec3::new(0.0, 2.0, 5.5),
            Vec3::new(0.0, 2.0, 2.5),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert!(camera.view_matrix().abs_diff_eq(expected, EPS));
    }

    #[test]
    fn view_matrix_places_eye_at_origin() {
        let camera = Camera::new(Vec3::new(3.0, -1.0, 2.0), Vec3::ZERO, Vec3::Y);
        let eye = camera.view_matrix().transform_point3(camera.position);
        assert!(eye.abs_diff_eq(Vec3::ZERO, EPS));
        let ahead = camera
            .view_matrix()
            .transform_point3(camera.position + camera.front.normalize());
        assert!(ahead.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), EPS));
    }

    #[test]
    fn strafe_left_then_right_returns_home() {
        let mut camera = Camera::new(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y);
        camera.set_front(Vec3::new(0.3, -0.2, -0.9).normalize());
        let start = camera.position;
        camera.apply_move(MoveDirection::Left, 0.37);
        assert!(!camera.position.abs_diff_eq(start, EPS));
        camera.apply_move(MoveDirection::Right, 0.37);
        assert!(camera.position.abs_diff_eq(start, EPS));
    }

    #[test]
    fn forward_moves_along_unnormalized_front() {
        let camera = Camera::new(Vec3::ZERO, Vec3::ZERO, Vec3::Y);
        let moved = camera.moved(MoveDirection::Forward, 0.1);
        assert!(moved.position.abs_diff_eq(Vec3::new(0.0, 0.0, -0.3), EPS));
        let back = moved.moved(MoveDirection::Backward, 0.1);
        assert!(back.position.abs_diff_eq(Vec3::ZERO, EPS));
    }

    #[test]
    fn strafe_uses_current_front() {
        let mut camera = Camera::new(Vec3::ZERO, Vec3::ZERO, Vec3::Y);
        camera.set_front(Vec3::X);
        let moved = camera.moved(MoveDirection::Right, 1.0);
        assert!(moved.position.abs_diff_eq(Vec3::Z, EPS));
    }

    #[test]
    fn pitch_never_leaves_limits() {
        let mut look = LookAngles::new(-90.0, 0.0);
        for _ in 0..500 {
            look.rotate(3.0, 40.0, 0.1);
            assert!(look.pitch <= LookAngles::PITCH_LIMIT);
        }
        assert_eq!(look.pitch, LookAngles::PITCH_LIMIT);
        for _ in 0..1000 {
            look.rotate(-1.0, -55.0, 0.1);
            assert!(look.pitch >= -LookAngles::PITCH_LIMIT);
        }
        assert_eq!(look.pitch, -LookAngles::PITCH_LIMIT);
    }

    #[test]
    fn first_cursor_sample_only_anchors() {
        let mut look = LookAngles::new(-90.0, 0.0);
        assert!(look.track_cursor(Vec2::new(400.0, 300.0), 0.1).is_none());
        let front = look
            .track_cursor(Vec2::new(410.0, 280.0), 0.1)
            .expect("second sample rotates");
        assert!((look.yaw - -89.0).abs() < EPS);
        assert!((look.pitch - 2.0).abs() < EPS);
        assert!((front.length() - 1.0).abs() < EPS);
    }

    #[test]
    fn initial_look_angles_match_initial_fronts() {
        let rig = CameraRig::default();
        let edit = rig.look(CameraMode::Edit).front();
        assert!(edit.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), EPS));
        let ride = rig.look(CameraMode::Ride).front();
        assert!(ride.abs_diff_eq(rig.camera(CameraMode::Ride).front, EPS));
    }

    #[test]
    fn toggling_mode_preserves_inactive_camera() {
        let mut rig = CameraRig::default();
        let edit_before = *rig.camera(CameraMode::Edit);
        assert_eq!(rig.toggle_mode(), CameraMode::Ride);
        rig.active_mut().apply_move(MoveDirection::Forward, 0.5);
        rig.look_by(Vec2::new(25.0, -10.0), 0.1);
        assert_eq!(*rig.camera(CameraMode::Edit), edit_before);
        assert_eq!(rig.toggle_mode(), CameraMode::Edit);
        assert_eq!(*rig.active(), edit_before);
        assert!((rig.look(CameraMode::Ride).yaw - 92.5).abs() < EPS);
        assert!((rig.look(CameraMode::Edit).yaw - -90.0).abs() < EPS);
    }

    #[test]
    fn mode_switch_resets_cursor_anchor() {
        let mut rig = CameraRig::default();
        rig.look_at_cursor(Vec2::new(100.0, 100.0), 0.1);
        rig.toggle_mode();
        rig.toggle_mode();
        let front_before = rig.active().front;
        rig.look_at_cursor(Vec2::new(900.0, 100.0), 0.1);
        assert_eq!(rig.active().front, front_before);
    }
}
