use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use aichat_core::export::first_code_block;
use crate::app::{char_to_byte_index, App, Focus, Popup};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    Ok(())
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL {
        app.should_quit = true;
        return Ok(());
    }

    if app.popup.is_some() {
        handle_popup(app, key);
        return Ok(());
    }

    // One command at a time: while a reply is pending only quit is accepted
    if app.is_busy() {
        if key.code == KeyCode::Char('q') && key.modifiers == KeyModifiers::CONTROL {
            app.should_quit = true;
        }
        return Ok(());
    }

    if handle_command(app, key).await {
        return Ok(());
    }

    match app.focus {
        Focus::Prompt => handle_prompt_editing(app, key),
        Focus::Response => handle_response_keys(app, key),
    }
    Ok(())
}

/// Hotkeys available from either pane. Returns true when the key was consumed.
async fn handle_command(app: &mut App, key: KeyEvent) -> bool {
    let ctrl_alt = KeyModifiers::CONTROL | KeyModifiers::ALT;

    if key.modifiers == ctrl_alt {
        match key.code {
            KeyCode::Char('v') | KeyCode::Char('V') => app.toggle_playback().await,
            KeyCode::Char('c') | KeyCode::Char('C') => copy_code(app),
            _ => return false,
        }
        return true;
    }

    if key.code == KeyCode::F(1) {
        app.popup = Some(Popup::Help);
        return true;
    }

    if key.modifiers != KeyModifiers::CONTROL {
        return false;
    }

    match key.code {
        KeyCode::Char('g') => app.submit(),
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('h') => app.popup = Some(Popup::Help),
        KeyCode::Char('f') => {
            app.popup = Some(Popup::Find {
                input: String::new(),
                cursor: 0,
            })
        }
        KeyCode::Char('n') => app.find_next(),
        KeyCode::Char('e') => app.export(),
        KeyCode::Char('l') => app.view_log(),
        KeyCode::Char('k') => app.popup = Some(Popup::ConfirmClear),
        KeyCode::Char('o') => app.edit_config_requested = true,
        _ => return false,
    }
    true
}

fn handle_popup(app: &mut App, key: KeyEvent) {
    let Some(popup) = app.popup.take() else {
        return;
    };

    match popup {
        Popup::Notice { .. } | Popup::Help => {
            // Any of these dismisses, everything else keeps the popup up
            if !matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                app.popup = Some(popup);
            }
        }
        Popup::ConfirmClear => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.clear(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Enter => {}
            _ => app.popup = Some(popup),
        },
        Popup::Find { mut input, mut cursor } => match key.code {
            KeyCode::Esc => {}
            KeyCode::Enter => app.find(&input),
            KeyCode::Backspace => {
                if cursor > 0 {
                    cursor -= 1;
                    input.remove(char_to_byte_index(&input, cursor));
                }
                app.popup = Some(Popup::Find { input, cursor });
            }
            KeyCode::Left => {
                cursor = cursor.saturating_sub(1);
                app.popup = Some(Popup::Find { input, cursor });
            }
            KeyCode::Right => {
                cursor = (cursor + 1).min(input.chars().count());
                app.popup = Some(Popup::Find { input, cursor });
            }
            KeyCode::Char(c) => {
                input.insert(char_to_byte_index(&input, cursor), c);
                cursor += 1;
                app.popup = Some(Popup::Find { input, cursor });
            }
            _ => app.popup = Some(Popup::Find { input, cursor }),
        },
    }
}

fn handle_prompt_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Tab | KeyCode::Esc => app.focus = Focus::Response,
        KeyCode::Enter => app.insert_char('\n'),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::PageDown => app.scroll_down(app.page_size()),
        KeyCode::PageUp => app.scroll_up(app.page_size()),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => app.insert_char(c),
        _ => {}
    }
}

fn handle_response_keys(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Tab | KeyCode::Char('i') => app.focus = Focus::Prompt,
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::PageDown | KeyCode::Char(' ') => app.scroll_down(app.page_size()),
        KeyCode::PageUp => app.scroll_up(app.page_size()),
        KeyCode::Char('g') | KeyCode::Home => app.response_scroll = 0,
        KeyCode::Char('G') | KeyCode::End => app.scroll_down(u16::MAX),
        KeyCode::Char('/') => {
            app.popup = Some(Popup::Find {
                input: String::new(),
                cursor: 0,
            })
        }
        KeyCode::Char('n') => app.find_next(),
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}

fn copy_code(app: &mut App) {
    copy_code_with(app, cli_clipboard::set_contents);
}

/// Put the first fenced block of the response on the clipboard via `set`.
fn copy_code_with<E, F>(app: &mut App, set: F)
where
    E: std::fmt::Display,
    F: FnOnce(String) -> Result<(), E>,
{
    match first_code_block(&app.response) {
        Some(code) => match set(code) {
            Ok(()) => app.notify("Code", "Copied to clipboard"),
            Err(e) => {
                tracing::warn!(error = %e, "clipboard write failed");
                app.notify("Code", format!("Could not reach the clipboard: {}", e));
            }
        },
        None => app.notify("Code", "No text found between triple back-ticks."),
    }
}
