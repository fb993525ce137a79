use crate::application::{App, AppMode, AuthKind, Route};
use crate::domain::DealField;
use crossterm::event::{KeyCode, KeyModifiers};

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        match app.mode {
            AppMode::Browse => Self::handle_browse_mode(app, key),
            AppMode::Search => Self::handle_search_mode(app, key),
            AppMode::Auth => Self::handle_auth_mode(app, key, modifiers),
            AppMode::Admin => Self::handle_admin_mode(app, key),
            AppMode::DealForm => Self::handle_deal_form_mode(app, key),
            AppMode::Help => Self::handle_help_mode(app, key),
        }
    }

    /// Whether `q` should quit in the current mode rather than being typed.
    pub fn quits(app: &App, key: KeyCode) -> bool {
        key == KeyCode::Char('q') && matches!(app.mode, AppMode::Browse | AppMode::Admin)
    }

    fn handle_browse_mode(app: &mut App, key: KeyCode) {
        app.status_message = None;

        match key {
            KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => app.select_next(),
            KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => app.previous_category(),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => app.next_category(),
            KeyCode::Char('/') => app.start_search(),
            KeyCode::Char('a') => app.navigate(Route::Admin),
            KeyCode::Char('i') if !app.snapshot().is_authenticated() => {
                app.open_auth(AuthKind::Login, None);
            }
            KeyCode::Char('s') if !app.snapshot().is_authenticated() => {
                app.open_auth(AuthKind::Signup, None);
            }
            KeyCode::Char('o') if app.snapshot().is_authenticated() => app.logout(),
            KeyCode::Char('v') => app.resend_verification(),
            KeyCode::F(1) | KeyCode::Char('?') => app.open_help(),
            KeyCode::Esc => {
                if app.criteria.has_search() {
                    app.set_search_query(String::new());
                }
            }
            _ => {}
        }
    }

    fn handle_search_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => app.finish_search(),
            KeyCode::Esc => app.cancel_search(),
            KeyCode::Backspace => app.search_backspace(),
            KeyCode::Delete => app.search_delete(),
            KeyCode::Left => app.search_cursor_left(),
            KeyCode::Right => app.search_cursor_right(),
            KeyCode::Home => app.search_cursor_home(),
            KeyCode::End => app.search_cursor_end(),
            KeyCode::Down => app.select_next(),
            KeyCode::Up => app.select_previous(),
            KeyCode::Char(c) => app.search_insert(c),
            _ => {}
        }
    }

    fn handle_auth_mode(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        if key == KeyCode::Esc {
            app.close_auth();
            return;
        }
        if key == KeyCode::Enter {
            app.submit_auth();
            return;
        }
        let Some(form) = app.auth_form.as_mut() else {
            return;
        };
        if modifiers.contains(KeyModifiers::CONTROL) {
            if key == KeyCode::Char('t') {
                form.toggle_kind();
            }
            return;
        }
        match key {
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_previous(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) => form.insert_char(c),
            _ => {}
        }
    }

    fn handle_admin_mode(app: &mut App, key: KeyCode) {
        app.status_message = None;

        match key {
            KeyCode::Up | KeyCode::Char('k') => app.admin_select_previous(),
            KeyCode::Down | KeyCode::Char('j') => app.admin_select_next(),
            KeyCode::Char('n') => app.start_new_deal(),
            KeyCode::Enter | KeyCode::Char('e') => app.start_edit_deal(),
            KeyCode::Delete | KeyCode::Char('d') => app.delete_selected_deal(),
            KeyCode::Char('o') => app.logout(),
            KeyCode::F(1) | KeyCode::Char('?') => app.open_help(),
            KeyCode::Esc | KeyCode::Char('b') => app.navigate(Route::Home),
            _ => {}
        }
    }

    fn handle_deal_form_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => {
                app.submit_deal_form();
                return;
            }
            KeyCode::Esc => {
                app.cancel_deal_form();
                return;
            }
            _ => {}
        }
        let Some(form) = app.deal_form.as_mut() else {
            return;
        };
        let on_category = form.focused_field() == DealField::Category;
        match key {
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_previous(),
            KeyCode::Left if on_category => form.cycle_category(false),
            KeyCode::Right if on_category => form.cycle_category(true),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) => form.insert_char(c),
            _ => {}
        }
    }

    fn handle_help_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q') => {
                app.close_help();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.help_scroll = app.help_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll += 1;
            }
            KeyCode::PageUp => {
                app.help_scroll = app.help_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                app.help_scroll += 5;
            }
            KeyCode::Home => {
                app.help_scroll = 0;
            }
            _ => {}
        }
    }
}
