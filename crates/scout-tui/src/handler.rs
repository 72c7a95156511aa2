use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use scout_core::SessionHandle;

use crate::app::App;
use crate::tui::AppEvent;

const PAGE: u16 = 10;

pub fn handle_event(app: &mut App, session: &SessionHandle, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key, |input| session.submit(input)),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Session(snapshot) => app.apply_snapshot(snapshot),
    }
}

/// `submit` returns whether the session accepted the text.
fn handle_key(app: &mut App, key: KeyEvent, submit: impl FnOnce(String) -> bool) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => {
            if !app.is_busy() && !app.input.trim().is_empty() {
                // Keep the text around if the session turned it down
                if submit(app.input.clone()) {
                    app.clear_input();
                    app.scroll_to_bottom();
                }
            }
        }
        KeyCode::PageUp => app.scroll_up(PAGE),
        KeyCode::PageDown => app.scroll_down(PAGE),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        // Editing is disabled while an exchange runs
        _ if app.is_busy() => {}
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_up(3),
        MouseEventKind::ScrollDown => app.scroll_down(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use scout_core::{Config, Phase, SessionState};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_key(app, key(KeyCode::Char(c)), |_| panic!("no submit while typing"));
        }
    }

    #[test]
    fn test_enter_submits_and_clears_input() {
        let mut app = App::new(&Config::default());
        type_text(&mut app, "weather today");

        let mut submitted = None;
        handle_key(&mut app, key(KeyCode::Enter), |input| {
            submitted = Some(input);
            true
        });

        assert_eq!(submitted.as_deref(), Some("weather today"));
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn test_rejected_submission_keeps_input() {
        let mut app = App::new(&Config::default());
        type_text(&mut app, "weather today");

        handle_key(&mut app, key(KeyCode::Enter), |_| false);

        assert_eq!(app.input, "weather today");
    }

    #[test]
    fn test_blank_input_is_not_submitted() {
        let mut app = App::new(&Config::default());
        type_text(&mut app, "   ");

        handle_key(&mut app, key(KeyCode::Enter), |_| panic!("blank input submitted"));
    }

    #[test]
    fn test_input_disabled_while_busy() {
        let mut app = App::new(&Config::default());
        type_text(&mut app, "next");
        app.apply_snapshot(SessionState {
            phase: Phase::AwaitingCompletion,
            ..SessionState::new()
        });

        type_text(&mut app, " question");
        handle_key(&mut app, key(KeyCode::Backspace), |_| unreachable!());
        handle_key(&mut app, key(KeyCode::Enter), |_| panic!("submitted while busy"));

        assert_eq!(app.input, "next");
    }

    #[test]
    fn test_quit_keys() {
        let mut app = App::new(&Config::default());
        handle_key(&mut app, key(KeyCode::Esc), |_| false);
        assert!(app.should_quit);

        let mut app = App::new(&Config::default());
        let ctrl_c = KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..key(KeyCode::Char('c'))
        };
        handle_key(&mut app, ctrl_c, |_| false);
        assert!(app.should_quit);
        assert!(app.input.is_empty());
    }
}
