//! Keyboard input dispatch: text fields, then overlays, then global keys,
//! then panel-specific handlers.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use twtrend_core::trend::Horizon;

use crate::app::{next_horizon, prev_horizon, AppState, InputField, Overlay, Panel};

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Windows sends both Press and Release.
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.running = false;
        return;
    }

    if let Some(field) = app.editing {
        handle_edit(app, field, key);
        return;
    }

    if app.overlay == Overlay::Warnings {
        handle_warnings_overlay(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char(c @ '1'..='4') => {
            if let Some(p) = c.to_digit(10).and_then(|d| Panel::from_index(d as usize - 1)) {
                app.active_panel = p;
            }
            return;
        }
        KeyCode::Tab => {
            app.active_panel = app.active_panel.next();
            return;
        }
        KeyCode::BackTab => {
            app.active_panel = app.active_panel.prev();
            return;
        }
        KeyCode::Char('r') => {
            app.request_refresh();
            return;
        }
        KeyCode::Char('e') => {
            app.export_quotes();
            return;
        }
        KeyCode::Char('v') => {
            app.overlay = Overlay::Warnings;
            app.warning_scroll = 0;
            return;
        }
        _ => {}
    }

    match app.active_panel {
        Panel::Quotes => handle_quotes_key(app, key),
        Panel::Charts => handle_charts_key(app, key),
        Panel::Lookup => handle_lookup_key(app, key),
        Panel::Help => {}
    }
}

fn handle_edit(app: &mut AppState, field: InputField, key: KeyEvent) {
    let buf = match field {
        InputField::Codes => &mut app.codes_input,
        InputField::Date => &mut app.date_input,
    };
    match key.code {
        KeyCode::Esc => app.editing = None,
        KeyCode::Enter => {
            app.editing = None;
            match field {
                InputField::Codes => app.request_refresh(),
                InputField::Date => app.request_lookup(),
            }
        }
        KeyCode::Backspace => {
            buf.pop();
        }
        KeyCode::Char(c) => buf.push(c),
        _ => {}
    }
}

fn handle_warnings_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('v') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.warning_scroll + 1 < app.warnings.len() {
                app.warning_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.warning_scroll = app.warning_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

fn handle_quotes_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('i') | KeyCode::Char('/') | KeyCode::Enter => {
            app.editing = Some(InputField::Codes);
        }
        _ => {}
    }
}

fn handle_charts_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('l') | KeyCode::Right => app.horizon = next_horizon(app.horizon),
        KeyCode::Char('h') | KeyCode::Left => app.horizon = prev_horizon(app.horizon),
        KeyCode::Char('w') => app.horizon = Horizon::Weekly,
        KeyCode::Char('m') => app.horizon = Horizon::Monthly,
        KeyCode::Char('y') => app.horizon = Horizon::Yearly,
        _ => {}
    }
}

fn handle_lookup_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('i') | KeyCode::Char('/') => app.editing = Some(InputField::Date),
        KeyCode::Enter => app.request_lookup(),
        _ => {}
    }
}
