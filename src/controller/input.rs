//! Key event handling

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::model::UiMode;
use super::AppController;

impl AppController {
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        // Global keys win regardless of the UI mode
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.volume_up();
                return;
            }
            KeyCode::Char('-') => {
                self.volume_down();
                return;
            }
            KeyCode::Char(' ') => {
                self.toggle_playback();
                return;
            }
            KeyCode::Char('m') | KeyCode::Char('M') => {
                self.cycle_mode();
                return;
            }
            KeyCode::Tab => {
                self.ui_mode = self.ui_mode.toggle();
                return;
            }
            _ => {}
        }

        match self.ui_mode {
            UiMode::Menu => self.handle_menu_key(key),
            UiMode::Playing => self.handle_playing_key(key),
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.move_up(),
            KeyCode::Down | KeyCode::Char('j') => self.move_down(),
            KeyCode::PageUp | KeyCode::Char('[') => self.prev_page(),
            KeyCode::PageDown | KeyCode::Char(']') => self.next_page(),
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => self.activate_selected(),
            KeyCode::Esc | KeyCode::Left | KeyCode::Backspace | KeyCode::Char('h') => self.go_back(),
            KeyCode::Char('n') => self.next_track(),
            KeyCode::Char('b') => self.previous_track(),
            _ => {}
        }
    }

    fn handle_playing_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('n') => self.next_track(),
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('b') => self.previous_track(),
            KeyCode::Esc | KeyCode::Backspace => self.ui_mode = UiMode::Menu,
            _ => {}
        }
    }
}
