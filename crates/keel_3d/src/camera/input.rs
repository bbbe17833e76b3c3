//! Pointer input state machine

use super::OrbitController;
use keel_core::Vec2;

/// Pointer buttons, numbered like DOM `MouseEvent.button`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
    Other(u8),
}

impl PointerButton {
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => PointerButton::Primary,
            1 => PointerButton::Middle,
            2 => PointerButton::Secondary,
            n => PointerButton::Other(n),
        }
    }
}

/// Which press notification a `Down` event came from
///
/// Browsers report one physical press twice: as a mouse press and as a
/// generic pointer-down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PressStage {
    #[default]
    Press,
    PointerDown,
}

/// Input events the camera reacts to
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down { button: PointerButton, stage: PressStage },
    Up { button: PointerButton },
    /// Pointer moved by `delta` pixels
    Move { delta: Vec2 },
    /// Wheel scrolled, positive zooms in
    Wheel { delta: f32 },
    /// Synthesized click of a non-primary button
    AuxClick { button: PointerButton },
    ContextMenu,
    /// The render surface lost pointer capture (release happened elsewhere)
    LostCapture,
}

/// What the host should do with the native event
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventResponse {
    /// Cancel the platform's default handling
    pub prevent_default: bool,
}

impl EventResponse {
    const PASS: EventResponse = EventResponse {
        prevent_default: false,
    };
    const PREVENT: EventResponse = EventResponse {
        prevent_default: true,
    };
}

/// Current gesture
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Idle,
    /// Pan-only gesture: rotate and zoom off, camera height frozen
    Panning,
    Rotating,
}

/// Button assignment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputBindings {
    pub rotate: PointerButton,
    /// Reserved exclusively for panning
    pub pan: PointerButton,
    /// Swallowed at every stage
    pub suppressed: PointerButton,
}

impl Default for InputBindings {
    fn default() -> Self {
        Self {
            rotate: PointerButton::Primary,
            pan: PointerButton::Secondary,
            suppressed: PointerButton::Middle,
        }
    }
}

/// Routes pointer events to an [`OrbitController`]
///
/// ```text
/// Idle --rotate down--> Rotating --rotate up--> Idle
/// Idle/Rotating --pan down--> Panning --pan up / lost capture--> Idle
/// ```
#[derive(Clone, Debug, Default)]
pub struct InputController {
    mode: InputMode,
    bindings: InputBindings,
}

impl InputController {
    pub fn new(bindings: InputBindings) -> Self {
        Self {
            mode: InputMode::Idle,
            bindings,
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn bindings(&self) -> InputBindings {
        self.bindings
    }

    /// Feed one event, updating `orbit`
    pub fn handle(&mut self, event: PointerEvent, orbit: &mut OrbitController) -> EventResponse {
        let b = self.bindings;
        match event {
            PointerEvent::Down { button, .. } if button == b.suppressed => EventResponse::PREVENT,
            PointerEvent::Down { button, .. } if button == b.pan => {
                if self.mode != InputMode::Panning {
                    self.mode = InputMode::Panning;
                    orbit.begin_pan();
                    tracing::trace!("pan gesture started");
                }
                EventResponse::PREVENT
            }
            PointerEvent::Down { button, .. } if button == b.rotate => {
                if self.mode == InputMode::Idle {
                    self.mode = InputMode::Rotating;
                }
                EventResponse::PASS
            }
            PointerEvent::Down { .. } => EventResponse::PASS,

            PointerEvent::Up { button } if button == b.suppressed => EventResponse::PREVENT,
            PointerEvent::Up { button } if button == b.pan => {
                if self.mode == InputMode::Panning {
                    self.release(orbit);
                }
                EventResponse::PREVENT
            }
            PointerEvent::Up { button } if button == b.rotate => {
                if self.mode == InputMode::Rotating {
                    self.mode = InputMode::Idle;
                }
                EventResponse::PASS
            }
            PointerEvent::Up { .. } => EventResponse::PASS,

            PointerEvent::Move { delta } => {
                match self.mode {
                    InputMode::Panning => orbit.pan(delta),
                    InputMode::Rotating => orbit.rotate(delta),
                    InputMode::Idle => {}
                }
                EventResponse::PASS
            }
            PointerEvent::Wheel { delta } => {
                if self.mode != InputMode::Panning {
                    orbit.zoom(delta);
                }
                EventResponse::PREVENT
            }
            PointerEvent::AuxClick { button } if button == b.suppressed => EventResponse::PREVENT,
            PointerEvent::AuxClick { .. } => EventResponse::PASS,
            PointerEvent::ContextMenu => EventResponse::PREVENT,
            PointerEvent::LostCapture => {
                if self.mode == InputMode::Panning {
                    tracing::debug!("pointer capture lost while panning");
                    self.release(orbit);
                }
                self.mode = InputMode::Idle;
                EventResponse::PASS
            }
        }
    }

    fn release(&mut self, orbit: &mut OrbitController) {
        self.mode = InputMode::Idle;
        orbit.end_pan();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down(button: PointerButton) -> PointerEvent {
        PointerEvent::Down {
            button,
            stage: PressStage::Press,
        }
    }

    fn drag(dx: f32, dy: f32) -> PointerEvent {
        PointerEvent::Move {
            delta: Vec2::new(dx, dy),
        }
    }

    #[test]
    fn test_pan_drag_keeps_camera_height() {
        let mut input = InputController::default();
        let mut orbit = OrbitController::default();
        let height = orbit.position.y;

        input.handle(down(PointerButton::Secondary), &mut orbit);
        input.handle(
            PointerEvent::Down {
                button: PointerButton::Secondary,
                stage: PressStage::PointerDown,
            },
            &mut orbit,
        );
        assert_eq!(input.mode(), InputMode::Panning);

        for i in 0..50 {
            input.handle(drag(13.0, if i % 2 == 0 { 40.0 } else { -25.0 }), &mut orbit);
            input.handle(PointerEvent::Wheel { delta: 2.0 }, &mut orbit);
            orbit.update();
            assert!((orbit.position.y - height).abs() < 1e-4);
        }

        input.handle(PointerEvent::Up { button: PointerButton::Secondary }, &mut orbit);
        assert_eq!(input.mode(), InputMode::Idle);
        assert!(orbit.rotate_enabled);
        assert!(orbit.zoom_enabled);
    }

    #[test]
    fn test_rotate_is_ignored_while_panning() {
        let mut input = InputController::default();
        let mut orbit = OrbitController::default();
        input.handle(down(PointerButton::Secondary), &mut orbit);
        input.handle(down(PointerButton::Primary), &mut orbit);
        assert_eq!(input.mode(), InputMode::Panning);
        input.handle(PointerEvent::Up { button: PointerButton::Primary }, &mut orbit);
        assert_eq!(input.mode(), InputMode::Panning);
    }

    #[test]
    fn test_pan_takes_over_rotation() {
        let mut input = InputController::default();
        let mut orbit = OrbitController::default();
        input.handle(down(PointerButton::Primary), &mut orbit);
        assert_eq!(input.mode(), InputMode::Rotating);
        input.handle(down(PointerButton::Secondary), &mut orbit);
        assert_eq!(input.mode(), InputMode::Panning);
        assert!(!orbit.rotate_enabled);
    }

    #[test]
    fn test_middle_button_suppressed_everywhere() {
        let mut input = InputController::default();
        let mut orbit = OrbitController::default();
        let middle = PointerButton::Middle;
        for event in [
            down(middle),
            PointerEvent::Down {
                button: middle,
                stage: PressStage::PointerDown,
            },
            PointerEvent::AuxClick { button: middle },
            PointerEvent::Up { button: middle },
        ] {
            assert!(input.handle(event, &mut orbit).prevent_default, "{event:?}");
            assert_eq!(input.mode(), InputMode::Idle);
        }
        assert!(input.handle(PointerEvent::ContextMenu, &mut orbit).prevent_default);
    }

    #[test]
    fn test_lost_capture_unsticks_panning() {
        let mut input = InputController::default();
        let mut orbit = OrbitController::default();
        input.handle(down(PointerButton::Secondary), &mut orbit);
        input.handle(PointerEvent::LostCapture, &mut orbit);
        assert_eq!(input.mode(), InputMode::Idle);
        assert!(!orbit.is_panning());
        assert!(orbit.rotate_enabled);

        let before = orbit.spherical();
        input.handle(down(PointerButton::Primary), &mut orbit);
        input.handle(drag(30.0, 0.0), &mut orbit);
        assert_ne!(orbit.spherical().2, before.2);
    }

    #[test]
    fn test_button_indices() {
        assert_eq!(PointerButton::from_index(0), PointerButton::Primary);
        assert_eq!(PointerButton::from_index(1), PointerButton::Middle);
        assert_eq!(PointerButton::from_index(2), PointerButton::Secondary);
        assert_eq!(PointerButton::from_index(4), PointerButton::Other(4));
    }
}
