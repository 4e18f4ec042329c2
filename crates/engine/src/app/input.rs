#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    KeyW,
    KeyA,
    KeyS,
    KeyD,
    KeyE,
    Space,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    Interact,
    Skip,
    Quit,
}

const ACTION_COUNT: usize = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub fn any_movement(&self) -> bool {
        InputAction::MOVEMENT.iter().any(|action| self.is_down(*action))
    }

    pub fn clear(&mut self) {
        self.down = [false; ACTION_COUNT];
    }
}

impl InputAction {
    pub const MOVEMENT: [InputAction; 4] = [
        InputAction::MoveForward,
        InputAction::MoveBackward,
        InputAction::MoveLeft,
        InputAction::MoveRight,
    ];

    pub fn from_key(code: KeyCode) -> Self {
        match code {
            KeyCode::KeyW => InputAction::MoveForward,
            KeyCode::KeyS => InputAction::MoveBackward,
            KeyCode::KeyA => InputAction::MoveLeft,
            KeyCode::KeyD => InputAction::MoveRight,
            KeyCode::KeyE => InputAction::Interact,
            KeyCode::Space => InputAction::Skip,
            KeyCode::Escape => InputAction::Quit,
        }
    }

    const fn index(self) -> usize {
        match self {
            InputAction::MoveForward => 0,
            InputAction::MoveBackward => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Interact => 4,
            InputAction::Skip => 5,
            InputAction::Quit => 6,
        }
    }
}

/// Discrete input gathered for one frame. Key edges are kept in arrival
/// order so a press and release inside the same frame both reach the game.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    quit_requested: bool,
    key_downs: Vec<KeyCode>,
    key_ups: Vec<KeyCode>,
    new_game_pressed: bool,
    load_pressed: bool,
    save_pressed: bool,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn key_downs(&self) -> &[KeyCode] {
        &self.key_downs
    }

    pub fn key_ups(&self) -> &[KeyCode] {
        &self.key_ups
    }

    pub fn new_game_pressed(&self) -> bool {
        self.new_game_pressed
    }

    pub fn load_pressed(&self) -> bool {
        self.load_pressed
    }

    pub fn save_pressed(&self) -> bool {
        self.save_pressed
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    pub fn with_key_down(mut self, code: KeyCode) -> Self {
        self.key_downs.push(code);
        if code == KeyCode::Escape {
            self.quit_requested = true;
        }
        self
    }

    pub fn with_key_up(mut self, code: KeyCode) -> Self {
        self.key_ups.push(code);
        self
    }

    pub fn with_new_game_pressed(mut self, new_game_pressed: bool) -> Self {
        self.new_game_pressed = new_game_pressed;
        self
    }

    pub fn with_load_pressed(mut self, load_pressed: bool) -> Self {
        self.load_pressed = load_pressed;
        self
    }

    pub fn with_save_pressed(mut self, save_pressed: bool) -> Self {
        self.save_pressed = save_pressed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_keys_map_to_movement_actions() {
        let mut states = ActionStates::default();
        assert!(!states.any_movement());
        states.set(InputAction::from_key(KeyCode::KeyA), true);
        assert!(states.is_down(InputAction::MoveLeft));
        assert!(states.any_movement());
        states.set(InputAction::from_key(KeyCode::KeyE), true);
        states.set(InputAction::MoveLeft, false);
        assert!(!states.any_movement());
    }

    #[test]
    fn escape_edge_requests_quit() {
        let snapshot = InputSnapshot::empty().with_key_down(KeyCode::Escape);
        assert!(snapshot.quit_requested());
        assert_eq!(snapshot.key_downs(), &[KeyCode::Escape]);
    }
}
