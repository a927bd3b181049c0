use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone)]
pub enum AppAction {
    Quit,
    MoveUp,
    MoveDown,
    OpenSelected,
    Refresh,
    CycleFilter,
    ToggleShowDeleted,
    NextPage,
    PrevPage,
    OpenInBrowser,
    ShowHelp,
    HideHelp,
    // Edit view actions
    BackToList,
    NextField,
    PrevField,
    EditChar(char),
    EditBackspace,
    EditNewline,
    Save,
    ToggleDelete,
}

pub fn handle_key_event(key: KeyEvent, edit_active: bool, show_help: bool) -> Option<AppAction> {
    // If help is showing, any key closes it
    if show_help {
        return Some(AppAction::HideHelp);
    }

    // Edit view: control chords act, everything else types
    if edit_active {
        return match (key.code, key.modifiers) {
            (KeyCode::Char('s'), KeyModifiers::CONTROL) => Some(AppAction::Save),
            (KeyCode::Char('d'), KeyModifiers::CONTROL) => Some(AppAction::ToggleDelete),
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(AppAction::Quit),
            (KeyCode::Esc, _) => Some(AppAction::BackToList),
            (KeyCode::Tab, _) => Some(AppAction::NextField),
            (KeyCode::BackTab, _) => Some(AppAction::PrevField),
            (KeyCode::Backspace, _) => Some(AppAction::EditBackspace),
            (KeyCode::Enter, _) => Some(AppAction::EditNewline),
            (KeyCode::Char(c), _) => Some(AppAction::EditChar(c)),
            _ => None,
        };
    }

    // List view
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => Some(AppAction::Quit),
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(AppAction::Quit),

        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(AppAction::MoveDown),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(AppAction::MoveUp),

        (KeyCode::Enter, _) => Some(AppAction::OpenSelected),

        (KeyCode::Char('r'), _) => Some(AppAction::Refresh),
        (KeyCode::Char('f'), _) => Some(AppAction::CycleFilter),
        (KeyCode::Char('x'), _) => Some(AppAction::ToggleShowDeleted),
        (KeyCode::Char('n'), _) => Some(AppAction::NextPage),
        (KeyCode::Char('p'), _) => Some(AppAction::PrevPage),
        (KeyCode::Char('o'), _) => Some(AppAction::OpenInBrowser),

        (KeyCode::Char('?'), _) => Some(AppAction::ShowHelp),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn list_keys_map_to_list_actions() {
        assert!(matches!(
            handle_key_event(key(KeyCode::Char('j'), KeyModifiers::NONE), false, false),
            Some(AppAction::MoveDown)
        ));
        assert!(matches!(
            handle_key_event(key(KeyCode::Enter, KeyModifiers::NONE), false, false),
            Some(AppAction::OpenSelected)
        ));
        assert!(matches!(
            handle_key_event(key(KeyCode::Char('x'), KeyModifiers::NONE), false, false),
            Some(AppAction::ToggleShowDeleted)
        ));
    }

    #[test]
    fn edit_mode_types_instead_of_navigating() {
        assert!(matches!(
            handle_key_event(key(KeyCode::Char('j'), KeyModifiers::NONE), true, false),
            Some(AppAction::EditChar('j'))
        ));
        assert!(matches!(
            handle_key_event(key(KeyCode::Char('s'), KeyModifiers::CONTROL), true, false),
            Some(AppAction::Save)
        ));
        assert!(matches!(
            handle_key_event(key(KeyCode::Char('d'), KeyModifiers::CONTROL), true, false),
            Some(AppAction::ToggleDelete)
        ));
        assert!(matches!(
            handle_key_event(key(KeyCode::Esc, KeyModifiers::NONE), true, false),
            Some(AppAction::BackToList)
        ));
    }

    #[test]
    fn any_key_dismisses_help() {
        assert!(matches!(
            handle_key_event(key(KeyCode::Char('z'), KeyModifiers::NONE), false, true),
            Some(AppAction::HideHelp)
        ));
    }
}
