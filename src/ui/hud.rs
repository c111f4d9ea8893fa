//! Game screen buttons

use crate::assets::ButtonConfig;
use crate::ui::button::{Button, ButtonId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HudAction {
    OpenSettings,
    Back,
}

/// Settings and Back buttons shown over the carousel
#[derive(Debug)]
pub struct GameHud {
    settings: Button,
    back: Button,
}

impl GameHud {
    pub fn new(button: &ButtonConfig) -> Self {
        Self {
            settings: Button::new(ButtonId::Settings, "Settings", button),
            back: Button::new(ButtonId::Back, "Back", button),
        }
    }

    pub fn press(&mut self, id: ButtonId) -> bool {
        match id {
            ButtonId::Settings => self.settings.press(),
            ButtonId::Back => self.back.press(),
            _ => false,
        }
    }

    pub fn settings_button(&self) -> &Button {
        &self.settings
    }

    pub fn back_button(&self) -> &Button {
        &self.back
    }

    pub fn tick(&mut self, dt: f32) -> Option<HudAction> {
        let settings = self.settings.tick(dt);
        let back = self.back.tick(dt);
        if back {
            Some(HudAction::Back)
        } else if settings {
            Some(HudAction::OpenSettings)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(hud: &mut GameHud) -> Option<HudAction> {
        let mut action = None;
        for _ in 0..30 {
            if let Some(a) = hud.tick(1.0 / 60.0) {
                action = Some(a);
            }
        }
        action
    }

    #[test]
    fn test_back_and_settings_actions() {
        let mut hud = GameHud::new(&ButtonConfig::default());
        assert!(hud.press(ButtonId::Back));
        assert_eq!(run(&mut hud), Some(HudAction::Back));
        assert!(hud.press(ButtonId::Settings));
        assert_eq!(run(&mut hud), Some(HudAction::OpenSettings));
    }

    #[test]
    fn test_menu_buttons_ignored() {
        let mut hud = GameHud::new(&ButtonConfig::default());
        assert!(!hud.press(ButtonId::Start));
        assert!(!hud.press(ButtonId::Exit));
        assert_eq!(run(&mut hud), None);
    }
}
