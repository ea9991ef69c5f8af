//! Application main loop
//!
//! Translates winit events into controller input and keeps the window
//! title in sync with the viewer status.

use anyhow::Result;
use app_ui::components::{DialogState, EditorMode, FilterPhase};
use app_ui::input::{translate_key, translate_mouse_button, translate_wheel};
use app_ui::{Controller, NamedKey, RawInput};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::Handle;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

/// Events posted to the loop from controller listeners
#[derive(Debug, Clone, Copy)]
enum UserEvent {
    Refresh,
}

/// What a key press means to the open modal
#[derive(Debug, Clone, PartialEq, Eq)]
enum DialogKey {
    /// No modal claims keys; run the keymap
    Pass,
    /// Swallowed by the modal
    Ignore,
    Confirm(bool),
    GotoText(String),
    GotoSubmit(String),
    GotoCancel,
    FilterToggle(String),
    FilterExecute,
    FilterCancel,
    EditorText(String),
}

/// Route a key press to whichever modal is open.
///
/// The tag editor only claims typing in text mode; its other keys go
/// through the controller.
fn dialog_key(state: &DialogState, input: &RawInput) -> DialogKey {
    if state.confirm.is_open() {
        return match input {
            RawInput::Named(NamedKey::Enter) => DialogKey::Confirm(true),
            RawInput::Named(NamedKey::Escape) => DialogKey::Confirm(false),
            RawInput::Char(c) if c.eq_ignore_ascii_case("y") => DialogKey::Confirm(true),
            RawInput::Char(c) if c.eq_ignore_ascii_case("n") => DialogKey::Confirm(false),
            _ => DialogKey::Ignore,
        };
    }

    if state.goto.is_open() {
        return match input {
            RawInput::Named(NamedKey::Enter) => DialogKey::GotoSubmit(state.goto.value().to_string()),
            RawInput::Named(NamedKey::Escape) => DialogKey::GotoCancel,
            RawInput::Char(c) if c.chars().all(|ch| ch.is_ascii_digit() || ch == '-') => {
                DialogKey::GotoText(format!("{}{}", state.goto.value(), c))
            }
            _ => DialogKey::Ignore,
        };
    }

    match state.filter.phase() {
        FilterPhase::Open => {
            return match input {
                RawInput::Named(NamedKey::Enter) => DialogKey::FilterExecute,
                RawInput::Named(NamedKey::Escape) => DialogKey::FilterCancel,
                // 1-9 toggle the listed tags
                RawInput::Char(c) => c
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n >= 1)
                    .and_then(|n| state.filter.available().get(n - 1))
                    .map(|tag| DialogKey::FilterToggle(tag.clone()))
                    .unwrap_or(DialogKey::Ignore),
                _ => DialogKey::Ignore,
            };
        }
        FilterPhase::Loading => {
            return match input {
                RawInput::Named(NamedKey::Escape) => DialogKey::FilterCancel,
                _ => DialogKey::Ignore,
            };
        }
        FilterPhase::Closed => {}
    }

    let editor = &state.editor;
    if editor.is_open() && !editor.is_loading() && editor.mode() == EditorMode::Text {
        if let RawInput::Char(c) = input {
            return DialogKey::EditorText(format!("{}{}", editor.text(), c));
        }
    }

    DialogKey::Pass
}

/// Main application state for the event loop
struct App {
    controller: Arc<Controller>,
    runtime: Handle,
    proxy: EventLoopProxy<UserEvent>,
    window: Option<Arc<Window>>,
    subscribed: bool,
    left_down: bool,
    last_cursor: Option<PhysicalPosition<f64>>,
}

impl App {
    fn new(controller: Arc<Controller>, runtime: Handle, proxy: EventLoopProxy<UserEvent>) -> Self {
        Self {
            controller,
            runtime,
            proxy,
            window: None,
            subscribed: false,
            left_down: false,
            last_cursor: None,
        }
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title(self.controller.status().title())
            .with_inner_size(winit::dpi::LogicalSize::new(1280.0, 800.0));
        let window = Arc::new(event_loop.create_window(attributes)?);
        self.window = Some(window);

        if !self.subscribed {
            // Listeners may fire on runtime worker threads
            let proxy = Mutex::new(self.proxy.clone());
            self.controller.subscribe(move || {
                let _ = proxy.lock().send_event(UserEvent::Refresh);
            });
            self.subscribed = true;
        }

        tracing::info!("Window created");
        Ok(())
    }

    fn refresh(&self) {
        if let Some(window) = &self.window {
            let status = self.controller.status();
            window.set_title(&status.title());
            if let Some(message) = &status.message {
                tracing::debug!("Toast: {}", message);
            }
            window.request_redraw();
        }
    }

    fn on_key_pressed(&mut self, input: RawInput) {
        let routed = self.controller.dialogs().read(|s| dialog_key(s, &input));
        tracing::trace!("Key {:?} routed as {:?}", input, routed);

        let controller = self.controller.clone();
        match routed {
            DialogKey::Pass => {
                self.controller.handle_input(input);
            }
            DialogKey::Ignore => {}
            DialogKey::Confirm(accepted) => {
                self.runtime.spawn(async move {
                    controller.confirm(accepted).await;
                });
            }
            DialogKey::GotoText(text) => self.controller.dialogs().set_goto_value(text),
            DialogKey::GotoSubmit(text) => {
                self.controller.submit_goto(&text);
            }
            DialogKey::GotoCancel => self.controller.cancel_goto(),
            DialogKey::FilterToggle(tag) => {
                self.controller.toggle_filter_tag(&tag);
            }
            DialogKey::FilterExecute => {
                self.runtime.spawn(async move {
                    if let Err(e) = controller.execute_filter().await {
                        tracing::warn!("Filter failed: {}", e);
                    }
                });
            }
            DialogKey::FilterCancel => self.controller.cancel_filter(),
            DialogKey::EditorText(text) => self.controller.editor_set_text(&text),
        }
    }

    fn on_dropped(&self, path: std::path::PathBuf) {
        let controller = self.controller.clone();
        let path = path.to_string_lossy().into_owned();
        self.runtime.spawn(async move {
            let added = controller.drop_paths([path]).await;
            tracing::info!("Dropped {} new images", added);
        });
    }

    fn on_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        if self.left_down {
            if let Some(last) = self.last_cursor {
                let dx = (position.x - last.x) as f32;
                let dy = (position.y - last.y) as f32;
                self.controller.drag(dx, dy);
            }
        }
        self.last_cursor = Some(position);
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init_window(event_loop) {
                tracing::error!("Failed to initialize window: {}", e);
                event_loop.exit();
            }
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::Refresh => self.refresh(),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let Some(input) = translate_key(&event.logical_key) else {
                    return;
                };
                match event.state {
                    ElementState::Pressed => self.on_key_pressed(input),
                    ElementState::Released => self.controller.key_up(&input),
                }
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                self.controller.sync_modifiers(modifiers.state());
            }

            WindowEvent::Focused(false) => {
                // Releases are not delivered while unfocused
                self.controller.reset_modifiers();
                self.left_down = false;
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.left_down = state == ElementState::Pressed;
                }
                if state == ElementState::Pressed {
                    if let Some(input) = translate_mouse_button(button) {
                        self.on_key_pressed(input);
                    }
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(input) = translate_wheel(delta) {
                    self.on_key_pressed(input);
                }
            }

            WindowEvent::CursorMoved { position, .. } => self.on_cursor_moved(position),

            WindowEvent::CursorLeft { .. } => self.last_cursor = None,

            WindowEvent::DroppedFile(path) => self.on_dropped(path),

            WindowEvent::RedrawRequested => {}

            _ => {}
        }
    }
}

/// Run the application
pub fn run(controller: Arc<Controller>, runtime: Handle) -> Result<()> {
    let event_loop = EventLoop::<UserEvent>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(controller, runtime, event_loop.create_proxy());
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn noop_confirm() -> app_ui::components::ConfirmCallback {
        Box::new(|_| async {}.boxed())
    }

    #[test]
    fn test_no_modal_passes_keys() {
        let state = DialogState::default();
        assert_eq!(dialog_key(&state, &RawInput::char("x")), DialogKey::Pass);
    }

    #[test]
    fn test_confirm_keys() {
        let mut state = DialogState::default();
        state.confirm.open("Delete?", noop_confirm());
        assert_eq!(dialog_key(&state, &RawInput::char("Y")), DialogKey::Confirm(true));
        assert_eq!(
            dialog_key(&state, &RawInput::Named(NamedKey::Escape)),
            DialogKey::Confirm(false)
        );
        assert_eq!(dialog_key(&state, &RawInput::char("x")), DialogKey::Ignore);
    }

    #[test]
    fn test_goto_typing_and_submit() {
        let mut state = DialogState::default();
        state.goto.open(10, Box::new(|_| {}));
        state.goto.set_value("1");
        assert_eq!(
            dialog_key(&state, &RawInput::char("2")),
            DialogKey::GotoText("12".to_string())
        );
        assert_eq!(
            dialog_key(&state, &RawInput::Named(NamedKey::Enter)),
            DialogKey::GotoSubmit("1".to_string())
        );
        assert_eq!(dialog_key(&state, &RawInput::char("a")), DialogKey::Ignore);
    }

    #[test]
    fn test_filter_number_toggles_listed_tag() {
        let mut state = DialogState::default();
        let generation = state.filter.begin_open();
        assert_eq!(dialog_key(&state, &RawInput::char("1")), DialogKey::Ignore);

        state
            .filter
            .finish_open(generation, vec!["sea".to_string(), "sky".to_string()]);
        assert_eq!(
            dialog_key(&state, &RawInput::char("2")),
            DialogKey::FilterToggle("sky".to_string())
        );
        assert_eq!(dialog_key(&state, &RawInput::char("3")), DialogKey::Ignore);
        assert_eq!(
            dialog_key(&state, &RawInput::Named(NamedKey::Enter)),
            DialogKey::FilterExecute
        );
    }

    #[test]
    fn test_editor_text_mode_claims_typing() {
        let mut state = DialogState::default();
        let generation = state.editor.begin_open("/p/a.png");
        state.editor.finish_open(generation, vec!["a".to_string()], vec![]);
        // Chip mode keys go through the controller
        assert_eq!(dialog_key(&state, &RawInput::char("b")), DialogKey::Pass);

        state.editor.focus_text();
        assert_eq!(
            dialog_key(&state, &RawInput::char("b")),
            DialogKey::EditorText("ab".to_string())
        );
        assert_eq!(
            dialog_key(&state, &RawInput::Named(NamedKey::Enter)),
            DialogKey::Pass
        );
    }
}
