//! Main menu

use crate::assets::ButtonConfig;
use crate::ui::button::{Button, ButtonId};

/// What the menu asks the app to do once a click lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    StartGame,
    OpenSettings,
    Exit,
}

#[derive(Debug)]
pub struct MainMenu {
    start: Button,
    settings: Button,
    exit: Button,
    /// Button group opacity (faded while a scene loads)
    fade: f32,
}

impl MainMenu {
    pub fn new(button: &ButtonConfig) -> Self {
        Self {
            start: Button::new(ButtonId::Start, "Start", button),
            settings: Button::new(ButtonId::Settings, "Settings", button),
            exit: Button::new(ButtonId::Exit, "Exit", button),
            fade: 1.0,
        }
    }

    pub fn press(&mut self, id: ButtonId) -> bool {
        match id {
            ButtonId::Start => self.start.press(),
            ButtonId::Settings => self.settings.press(),
            ButtonId::Exit => self.exit.press(),
            _ => false,
        }
    }

    pub fn fade(&self) -> f32 {
        self.fade
    }

    pub fn set_fade(&mut self, value: f32) {
        self.fade = value.clamp(0.0, 1.0);
    }

    /// Advance button feedback; at most one action per frame, in button order
    pub fn tick(&mut self, dt: f32) -> Option<MenuAction> {
        let start = self.start.tick(dt);
        let settings = self.settings.tick(dt);
        let exit = self.exit.tick(dt);
        if start {
            Some(MenuAction::StartGame)
        } else if settings {
            Some(MenuAction::OpenSettings)
        } else if exit {
            Some(MenuAction::Exit)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_maps_to_action() {
        let mut menu = MainMenu::new(&ButtonConfig::default());
        assert!(menu.press(ButtonId::Settings));
        let mut action = None;
        for _ in 0..30 {
            if let Some(a) = menu.tick(1.0 / 60.0) {
                action = Some(a);
            }
        }
        assert_eq!(action, Some(MenuAction::OpenSettings));
    }

    #[test]
    fn test_foreign_buttons_ignored() {
        let mut menu = MainMenu::new(&ButtonConfig::default());
        assert!(!menu.press(ButtonId::ClosePopup));
    }
}
