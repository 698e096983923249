use bevy::prelude::*;
use leafwing_input_manager::prelude::*;
use runner::{InputFrame, TurnDirection};

#[derive(Reflect, Actionlike, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunnerAction {
    TurnLeft,
    TurnRight,
    Jump,
    Slide,
    #[actionlike(Axis)]
    Strafe,
    Restart,
}

/// Commands seen since the last fixed tick.
///
/// Presses are latched here every frame and handed to the simulation once, so a press
/// is neither lost nor repeated when frames and fixed ticks do not line up.
#[derive(Resource, Default, Debug)]
pub struct PendingInput(InputFrame);

impl PendingInput {
    pub fn take(&mut self) -> InputFrame {
        let strafe = self.0.strafe;
        let frame = std::mem::take(&mut self.0);
        self.0.strafe = strafe;
        frame
    }
}

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(InputManagerPlugin::<RunnerAction>::default());

    app.register_type::<RunnerAction>();

    let mut input_map = InputMap::<RunnerAction>::default();
    input_map.insert(RunnerAction::TurnLeft, KeyCode::KeyQ);
    input_map.insert(RunnerAction::TurnLeft, KeyCode::ArrowLeft);
    input_map.insert(RunnerAction::TurnRight, KeyCode::KeyE);
    input_map.insert(RunnerAction::TurnRight, KeyCode::ArrowRight);
    input_map.insert(RunnerAction::Jump, KeyCode::Space);
    input_map.insert(RunnerAction::Jump, KeyCode::ArrowUp);
    input_map.insert(RunnerAction::Slide, KeyCode::KeyS);
    input_map.insert(RunnerAction::Slide, KeyCode::ArrowDown);
    input_map.insert_axis(RunnerAction::Strafe, VirtualAxis::ad());
    input_map.insert(RunnerAction::Restart, KeyCode::KeyR);
    app.insert_resource(input_map);
    app.insert_resource(ActionState::<RunnerAction>::default());

    app.init_resource::<PendingInput>();
    app.add_systems(PreUpdate, latch_input.after(InputManagerSystem::Update));
}

fn latch_input(actions: Res<ActionState<RunnerAction>>, mut pending: ResMut<PendingInput>) {
    let frame = &mut pending.0;
    if actions.just_pressed(&RunnerAction::TurnLeft) {
        frame.turn = Some(TurnDirection::Left);
    }
    if actions.just_pressed(&RunnerAction::TurnRight) {
        frame.turn = Some(TurnDirection::Right);
    }
    frame.jump |= actions.just_pressed(&RunnerAction::Jump);
    frame.slide |= actions.just_pressed(&RunnerAction::Slide);
    frame.strafe = actions.value(&RunnerAction::Strafe);
}
