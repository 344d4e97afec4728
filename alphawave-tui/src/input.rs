//! Keyboard input dispatch: overlays → global keys → view keys.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{AppState, Destination, Overlay, ViewMode};

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Overlays consume input first.
    match &app.overlay {
        Overlay::Welcome => {
            app.overlay = Overlay::None;
            return;
        }
        Overlay::Help => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.overlay = Overlay::None;
            }
            return;
        }
        Overlay::ErrorHistory => {
            handle_error_overlay(app, key);
            return;
        }
        Overlay::None => {}
    }

    // 2. Global keys.
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.running = false;
            return;
        }
        KeyCode::Char(c @ '1'..='4') => {
            let idx = c as usize - '1' as usize;
            if let Some(dest) = Destination::from_index(idx) {
                app.go_to(dest);
            }
            return;
        }
        KeyCode::Tab => {
            let dest = if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.destination.prev()
            } else {
                app.destination.next()
            };
            app.go_to(dest);
            return;
        }
        KeyCode::BackTab => {
            app.go_to(app.destination.prev());
            return;
        }
        KeyCode::Char('?') => {
            app.overlay = Overlay::Help;
            return;
        }
        KeyCode::Char('e') => {
            app.overlay = Overlay::ErrorHistory;
            app.error_scroll = 0;
            return;
        }
        KeyCode::Char('d') => {
            app.request_report();
            return;
        }
        _ => {}
    }

    // 3. Market view keys.
    if let Some(market) = app.destination.market() {
        match key.code {
            KeyCode::Char('v') => {
                app.view_mode = app.view_mode.toggle();
                app.chart_cursor = 0;
            }
            KeyCode::Char('l') | KeyCode::Right if app.view_mode == ViewMode::Analysis => {
                app.panel = app.panel.next();
                app.chart_cursor = 0;
            }
            KeyCode::Char('h') | KeyCode::Left if app.view_mode == ViewMode::Analysis => {
                app.panel = app.panel.prev();
                app.chart_cursor = 0;
            }
            KeyCode::Char('j') | KeyCode::Down => app.move_chart_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => app.move_chart_cursor(-1),
            KeyCode::Char('r') => app.request_load(market, true),
            _ => {}
        }
    } else if key.code == KeyCode::Char('r') {
        app.request_file_scan();
    }
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}
