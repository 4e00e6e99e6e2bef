use log::{debug, info};

use crate::camera::{CameraMode, MoveDirection};
use crate::config::{CAMERA_SPEED, LOOK_SENSITIVITY};
use crate::input::{Command, InputState, Key, LookEvent};
use crate::light::LightSelection;
use crate::ship::TURN_STEP;
use crate::state::SceneState;

const LIGHT_STEP: f32 = 0.01;
const LIGHT_ROTATION_STEP: f32 = 1.0;

/// Consequences of input the window layer or the orchestrator must act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEffect {
    Quit,
    /// Grab and hide the cursor (`true`) or release it.
    CursorCapture(bool),
    ToggleRenderMode,
    Wireframe(bool),
}

/// Applies one tick of input to the scene: queued commands, then look
/// samples, then held keys.
pub fn process(state: &mut SceneState, input: &mut InputState) -> Vec<ControlEffect> {
    let mut effects = Vec::new();
    for command in input.drain_commands() {
        apply_command(state, command, &mut effects);
    }
    for event in input.drain_look() {
        apply_look(state, event);
    }
    apply_held_keys(state, input);
    effects
}

fn apply_command(state: &mut SceneState, command: Command, effects: &mut Vec<ControlEffect>) {
    match command {
        Command::Quit => effects.push(ControlEffect::Quit),
        Command::SwitchMode => {
            let mode = state.cameras.toggle_mode();
            info!("switched to {} mode", mode.name());
            effects.push(ControlEffect::CursorCapture(mode == CameraMode::Ride));
        }
        Command::ToggleDepthDebug => effects.push(ControlEffect::ToggleRenderMode),
        Command::ToggleLightSelection => {
            state.selection = state.selection.toggled();
            debug!("light keys now adjust the {} light", state.selection.name());
        }
        Command::Wireframe(enabled) => {
            state.wireframe = enabled;
            effects.push(ControlEffect::Wireframe(enabled));
        }
    }
}

fn apply_look(state: &mut SceneState, event: LookEvent) {
    match (state.mode(), event) {
        (CameraMode::Edit, LookEvent::Cursor(position)) => {
            state.cameras.look_at_cursor(position, LOOK_SENSITIVITY)
        }
        (CameraMode::Ride, LookEvent::Motion(delta)) => {
            state.cameras.look_by(delta, LOOK_SENSITIVITY)
        }
        _ => {}
    }
}

fn adjust_light_height(state: &mut SceneState, delta: f32) {
    let height = match state.selection {
        LightSelection::Directional => &mut state.directional.direction.y,
        LightSelection::Point => &mut state.point.position.y,
    };
    *height = (*height + delta).max(0.0);
}

fn adjust_light_lateral(state: &mut SceneState, delta: f32) {
    match state.selection {
        LightSelection::Directional => state.directional.direction.x += delta,
        LightSelection::Point => state.point.position.x += delta,
    }
}

fn apply_held_keys(state: &mut SceneState, input: &InputState) {
    let riding = !state.edit_mode();
    let held = |key| input.is_held(key);

    if held(Key::U) {
        state.directional.rotation_deg -= LIGHT_ROTATION_STEP;
    }
    if held(Key::O) {
        state.directional.rotation_deg += LIGHT_ROTATION_STEP;
    }

    if held(Key::I) {
        if riding {
            state.ship.euler_deg.x -= TURN_STEP;
        } else {
            adjust_light_height(state, LIGHT_STEP);
        }
    }
    if held(Key::K) {
        if riding {
            state.ship.euler_deg.x += TURN_STEP;
        } else {
            adjust_light_height(state, -LIGHT_STEP);
        }
    }
    if held(Key::J) {
        adjust_light_lateral(state, -LIGHT_STEP);
    }
    if held(Key::L) {
        adjust_light_lateral(state, LIGHT_STEP);
    }

    if held(Key::W) {
        if riding {
            state.ship.position.z += CAMERA_SPEED;
        }
        state
            .cameras
            .active_mut()
            .apply_move(MoveDirection::Forward, CAMERA_SPEED);
    }
    if held(Key::S) {
        if riding {
            state.ship.position.z -= CAMERA_SPEED;
        }
        state
            .cameras
            .active_mut()
            .apply_move(MoveDirection::Backward, CAMERA_SPEED);
    }
    if held(Key::A) {
        if riding {
            state.ship.position.x += CAMERA_SPEED;
            state.ship.bank_left();
        }
        state
            .cameras
            .active_mut()
            .apply_move(MoveDirection::Left, CAMERA_SPEED);
    } else if riding {
        state.ship.recover_left_bank();
    }
    if held(Key::D) {
        if riding {
            state.ship.position.x -= CAMERA_SPEED;
            state.ship.bank_right();
        }
        state
            .cameras
            .active_mut()
            .apply_move(MoveDirection::Right, CAMERA_SPEED);
    } else if riding {
        state.ship.recover_right_bank();
    }

    if riding && held(Key::Q) {
        state.ship.euler_deg.y += TURN_STEP;
    }
    if riding && held(Key::E) {
        state.ship.euler_deg.y -= TURN_STEP;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneDescription;
    use crate::ship::{BANK_MAX, BANK_MIN};
    use glam::{Vec2, Vec3};

    const EPS: f32 = 1e-4;

    fn state() -> SceneState {
        SceneState::new(&SceneDescription::default(), (1280, 720))
    }

    fn ride_state(input: &mut InputState) -> SceneState {
        let mut state = state();
        input.key_down(Key::Enter);
        let effects = process(&mut state, input);
        assert_eq!(effects, vec![ControlEffect::CursorCapture(true)]);
        input.key_up(Key::Enter);
        state
    }

    #[test]
    fn commands_produce_effects() {
        let mut state = state();
        let mut input = InputState::new();
        for key in [Key::M, Key::Z, Key::P, Key::Escape] {
            input.key_down(key);
        }
        let effects = process(&mut state, &mut input);
        assert_eq!(
            effects,
            vec![
                ControlEffect::ToggleRenderMode,
                ControlEffect::Wireframe(true),
                ControlEffect::Quit,
            ]
        );
        assert!(state.wireframe);
        assert_eq!(state.selection, LightSelection::Point);
    }

    #[test]
    fn edit_mode_moves_camera_only() {
        let mut state = state();
        let mut input = InputState::new();
        input.key_down(Key::W);
        process(&mut state, &mut input);
        let camera = state.cameras.active();
        assert!(camera
            .position
            .abs_diff_eq(Vec3::new(0.0, 2.0, 5.5) + Vec3::new(0.0, 0.0, -0.3), EPS));
        assert_eq!(state.ship.position, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn ride_mode_moves_ship_with_camera() {
        let mut input = InputState::new();
        let mut state = ride_state(&mut input);
        input.key_down(Key::W);
        for _ in 0..10 {
            process(&mut state, &mut input);
        }
        assert!((state.ship.position.z - 1.0).abs() < EPS);
        assert!(state
            .cameras
            .active()
            .position
            .abs_diff_eq(Vec3::new(0.0, 1.0, -1.0), EPS));
        assert!(state
            .cameras
            .camera(CameraMode::Edit)
            .position
            .abs_diff_eq(Vec3::new(0.0, 2.0, 5.5), EPS));
    }

    #[test]
    fn ride_banking_is_clamped_and_recovers() {
        let mut input = InputState::new();
        let mut state = ride_state(&mut input);
        input.key_down(Key::A);
        for _ in 0..40 {
            process(&mut state, &mut input);
            assert!(state.ship.euler_deg.z >= BANK_MIN);
        }
        assert_eq!(state.ship.euler_deg.z, BANK_MIN);
        input.key_up(Key::A);
        process(&mut state, &mut input);
        assert_eq!(state.ship.euler_deg.z, BANK_MIN + 2.0);

        input.key_down(Key::D);
        for _ in 0..60 {
            process(&mut state, &mut input);
            assert!(state.ship.euler_deg.z <= BANK_MAX);
        }
        assert_eq!(state.ship.euler_deg.z, BANK_MAX);
    }

    #[test]
    fn light_keys_follow_selection() {
        let mut state = state();
        let mut input = InputState::new();
        input.key_down(Key::K);
        for _ in 0..250 {
            process(&mut state, &mut input);
        }
        assert_eq!(state.directional.direction.y, 0.0);
        input.key_up(Key::K);

        input.key_down(Key::P);
        input.key_down(Key::L);
        process(&mut state, &mut input);
        assert!((state.point.position.x - 1.01).abs() < EPS);
        assert_eq!(state.directional.direction.x, 0.0);

        input.key_down(Key::O);
        process(&mut state, &mut input);
        assert_eq!(state.directional.rotation_deg, 1.0);
    }

    #[test]
    fn i_and_k_pitch_ship_while_riding() {
        let mut input = InputState::new();
        let mut state = ride_state(&mut input);
        let light_before = state.directional;
        input.key_down(Key::I);
        process(&mut state, &mut input);
        process(&mut state, &mut input);
        assert_eq!(state.ship.euler_deg.x, -1.0);
        assert_eq!(state.directional, light_before);
    }

    #[test]
    fn look_events_route_by_mode() {
        let mut state = state();
        let mut input = InputState::new();
        let front = state.cameras.active().front;
        input.push_motion(Vec2::new(50.0, 0.0));
        input.push_cursor(Vec2::new(100.0, 100.0));
        process(&mut state, &mut input);
        assert_eq!(state.cameras.active().front, front);

        input.push_cursor(Vec2::new(150.0, 100.0));
        process(&mut state, &mut input);
        assert!((state.cameras.look(CameraMode::Edit).yaw - -85.0).abs() < EPS);
    }
}
