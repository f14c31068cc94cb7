// --- File: controls.rs ---
// Keyboard bindings and left-button painting, kept free of window handles so
// the mapping can be tested directly.
use crate::renderer::cell_at_pixel;
use glam::{UVec2, Vec2};
use winit::keyboard::KeyCode;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    PlayPause,
    StepForward,
    Randomise,
    Reset,
    FasterFps,
    SlowerFps,
    Exit,
}

pub fn command_for_key(key: KeyCode) -> Option<Command> {
    match key {
        KeyCode::Space => Some(Command::PlayPause),
        KeyCode::ArrowRight | KeyCode::KeyN => Some(Command::StepForward),
        KeyCode::KeyR => Some(Command::Randomise),
        KeyCode::KeyC | KeyCode::Backspace => Some(Command::Reset),
        KeyCode::ArrowUp => Some(Command::FasterFps),
        KeyCode::ArrowDown => Some(Command::SlowerFps),
        KeyCode::Escape => Some(Command::Exit),
        _ => None,
    }
}

/// Turns cursor movement into cell coordinates while the left button is held.
///
/// Each drag paints a cell at most once until the cursor leaves it.
#[derive(Debug, Clone, Default)]
pub struct MousePainter {
    cursor: Option<Vec2>,
    pressed: bool,
    last_painted: Option<(usize, usize)>,
}

impl MousePainter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn cursor_left(&mut self) {
        self.cursor = None;
        self.last_painted = None;
    }

    pub fn cursor_moved(
        &mut self,
        position: Vec2,
        viewport: UVec2,
        grid: (usize, usize),
    ) -> Option<(usize, usize)> {
        self.cursor = Some(position);
        self.paint_target(viewport, grid)
    }

    pub fn button_changed(
        &mut self,
        pressed: bool,
        viewport: UVec2,
        grid: (usize, usize),
    ) -> Option<(usize, usize)> {
        self.pressed = pressed;
        if !pressed {
            self.last_painted = None;
            return None;
        }
        self.paint_target(viewport, grid)
    }

    fn paint_target(&mut self, viewport: UVec2, grid: (usize, usize)) -> Option<(usize, usize)> {
        if !self.pressed {
            return None;
        }
        let cell = cell_at_pixel(self.cursor?, viewport, grid)?;
        if self.last_painted == Some(cell) {
            return None;
        }
        self.last_painted = Some(cell);
        Some(cell)
    }
}
// --- End of File: controls.rs ---
