//! Application root
//!
//! Builds every service by hand and routes each frame's input to the
//! active screen.

use std::cell::RefCell;
use std::rc::Rc;

use crate::assets::GameAssets;
use crate::audio::{AudioBackend, AudioManager, SoundEffects};
use crate::error::Result;
use crate::game::{FrameInput, GameConfig, GameEvent, GameScreen};
use crate::settings::PreferenceStore;
use crate::ui::{ButtonId, GameHud, HudAction, MainMenu, MenuAction, SettingsBinding, SettingsPopup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    MainMenu,
    Game,
}

#[derive(Debug)]
pub struct App {
    config: GameConfig,
    assets: GameAssets,
    screen: Screen,
    game: Option<GameScreen>,
    menu: MainMenu,
    hud: GameHud,
    settings: SettingsPopup,
    _settings_binding: SettingsBinding,
    audio: Rc<RefCell<AudioManager>>,
    events: Vec<GameEvent>,
    quit: bool,
}

impl App {
    pub fn new(
        config: GameConfig,
        assets: GameAssets,
        backend: Box<dyn AudioBackend>,
        store: Box<dyn PreferenceStore>,
    ) -> Self {
        let mut audio = AudioManager::new(backend, assets.audio.clone(), store, config.seed);
        audio.start();
        let audio = Rc::new(RefCell::new(audio));

        let settings = SettingsPopup::new(&assets.popup, &assets.button);
        let settings_binding = SettingsBinding::bind(&settings, &audio);
        let menu = MainMenu::new(&assets.button);
        let hud = GameHud::new(&assets.button);

        log::info!("Scratch ticket app started");
        Self {
            config,
            assets,
            screen: Screen::MainMenu,
            game: None,
            menu,
            hud,
            settings,
            _settings_binding: settings_binding,
            audio,
            events: Vec::new(),
            quit: false,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn game(&self) -> Option<&GameScreen> {
        self.game.as_ref()
    }

    pub fn game_mut(&mut self) -> Option<&mut GameScreen> {
        self.game.as_mut()
    }

    pub fn menu(&self) -> &MainMenu {
        &self.menu
    }

    pub fn hud(&self) -> &GameHud {
        &self.hud
    }

    pub fn settings(&self) -> &SettingsPopup {
        &self.settings
    }

    pub fn audio(&self) -> Rc<RefCell<AudioManager>> {
        Rc::clone(&self.audio)
    }

    /// Exit was clicked
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Game events gathered since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance one frame
    pub fn tick(&mut self, input: &FrameInput, dt: f32) {
        if self.settings.popup.is_interactable() {
            if let Some(id) = input.button {
                self.settings.popup.press(id);
            }
            if let Some(value) = input.music_slider {
                self.settings.drag_music(value);
            }
            if let Some(value) = input.effects_slider {
                self.settings.drag_effects(value);
            }
        } else if let Some(id) = input.button {
            match self.screen {
                Screen::MainMenu => {
                    self.menu.press(id);
                }
                Screen::Game => {
                    self.hud.press(id);
                }
            }
        }

        if let Some(action) = self.menu.tick(dt) {
            self.on_menu_action(action);
        }
        if let Some(action) = self.hud.tick(dt) {
            match action {
                HudAction::OpenSettings => self.open_settings(),
                HudAction::Back => self.return_to_menu(),
            }
        }
        self.settings.tick(dt);

        if let Some(game) = self.game.as_mut() {
            let popup_open = self.settings.popup.is_interactable();
            let game_input = if popup_open { FrameInput::default() } else { *input };
            game.tick(&game_input, dt, &mut *self.audio.borrow_mut());
            self.events.extend(game.drain_events());
            if game.redirect_requested() {
                self.return_to_menu();
            }
        }

        self.audio.borrow_mut().tick(dt);
    }

    fn on_menu_action(&mut self, action: MenuAction) {
        match action {
            MenuAction::StartGame => {
                if let Err(e) = self.start_game() {
                    log::error!("Failed to start game: {}", e);
                }
            }
            MenuAction::OpenSettings => self.open_settings(),
            MenuAction::Exit => {
                log::info!("Exit requested");
                self.quit = true;
            }
        }
    }

    /// Enter the game screen with a fresh session
    pub fn start_game(&mut self) -> Result<()> {
        let game = GameScreen::new(&self.config, &self.assets)?;
        self.game = Some(game);
        self.screen = Screen::Game;
        self.menu.set_fade(0.0);
        log::info!("Entered game screen");
        Ok(())
    }

    pub fn open_settings(&mut self) {
        let (music, effects) = {
            let audio = self.audio.borrow();
            (audio.music_volume(), audio.effects_volume())
        };
        self.settings.show(music, effects);
        self.audio.borrow_mut().play_popup_sound();
    }

    /// Tear the game screen down and show the menu again
    pub fn return_to_menu(&mut self) {
        self.game = None;
        self.screen = Screen::MainMenu;
        self.menu.set_fade(1.0);
        log::info!("Returned to main menu");
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.game = None;
        self.audio.borrow_mut().dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{PlaybackJournal, RecordingBackend};
    use crate::consts::MUSIC_VOLUME_KEY;
    use crate::economy::{CurrencyConfig, InsufficientFundsPolicy};
    use crate::settings::MemoryStore;

    const DT: f32 = 1.0 / 60.0;

    fn app(config: GameConfig) -> (App, Rc<RefCell<PlaybackJournal>>) {
        let backend = RecordingBackend::new(2);
        let journal = backend.journal();
        let app = App::new(
            config,
            GameAssets::builtin(),
            Box::new(backend),
            Box::new(MemoryStore::default()),
        );
        (app, journal)
    }

    fn click(app: &mut App, id: ButtonId) {
        app.tick(&FrameInput::click(id), DT);
        for _ in 0..30 {
            app.tick(&FrameInput::default(), DT);
        }
    }

    #[test]
    fn test_start_enters_game() {
        let (mut app, _) = app(GameConfig::default());
        assert_eq!(app.screen(), Screen::MainMenu);
        click(&mut app, ButtonId::Start);
        assert_eq!(app.screen(), Screen::Game);
        assert_eq!(app.game().unwrap().currency_text(), "100");
        assert_eq!(app.menu().fade(), 0.0);
    }

    #[test]
    fn test_settings_popup_controls_volume() {
        let (mut app, journal) = app(GameConfig::default());
        click(&mut app, ButtonId::Settings);
        assert!(app.settings().popup.is_interactable());
        assert!(journal.borrow().effects_played.iter().any(|(_, clip)| clip == "popup"));

        app.tick(
            &FrameInput {
                music_slider: Some(0.3),
                ..Default::default()
            },
            DT,
        );
        assert_eq!(app.audio().borrow().music_volume(), 0.3);
        assert_eq!(app.audio().borrow().store().get_f32(MUSIC_VOLUME_KEY), Some(0.3));

        // Menu buttons are blocked behind the popup
        click(&mut app, ButtonId::Start);
        assert_eq!(app.screen(), Screen::MainMenu);

        click(&mut app, ButtonId::ClosePopup);
        assert!(!app.settings().popup.is_interactable());
    }

    #[test]
    fn test_exit_sets_quit() {
        let (mut app, _) = app(GameConfig::default());
        click(&mut app, ButtonId::Exit);
        assert!(app.should_quit());
    }

    #[test]
    fn test_music_starts_after_fade() {
        let (mut app, journal) = app(GameConfig::default());
        for _ in 0..180 {
            app.tick(&FrameInput::default(), DT);
        }
        assert_eq!(journal.borrow().music_started.len(), 1);
    }

    #[test]
    fn test_back_button_leaves_game() {
        let (mut app, _) = app(GameConfig::default());
        click(&mut app, ButtonId::Start);
        assert_eq!(app.screen(), Screen::Game);

        click(&mut app, ButtonId::Back);
        assert_eq!(app.screen(), Screen::MainMenu);
        assert!(app.game().is_none());
        assert_eq!(app.menu().fade(), 1.0);

        // Back means nothing on the menu
        click(&mut app, ButtonId::Back);
        assert_eq!(app.screen(), Screen::MainMenu);
    }

    #[test]
    fn test_settings_from_game_blocks_tickets() {
        let (mut app, journal) = app(GameConfig::default());
        click(&mut app, ButtonId::Start);
        click(&mut app, ButtonId::Settings);
        assert!(app.settings().popup.is_interactable());
        assert_eq!(app.screen(), Screen::Game);
        assert!(journal.borrow().effects_played.iter().any(|(_, clip)| clip == "popup"));

        let slot = app.game().unwrap().carousel().center_slot_id();
        click(&mut app, ButtonId::Buy(slot));
        assert_eq!(app.game().unwrap().currency_text(), "100");
        assert!(!app.game().unwrap().is_purchase_active());

        click(&mut app, ButtonId::ClosePopup);
        assert!(!app.settings().popup.is_interactable());
        click(&mut app, ButtonId::Buy(slot));
        assert!(app.game().unwrap().is_purchase_active());
    }

    #[test]
    fn test_reset_policy_returns_to_menu() {
        let config = GameConfig {
            funds_policy: InsufficientFundsPolicy::ResetAndRedirect,
            currency: CurrencyConfig { currency: 5 },
            ..Default::default()
        };
        let (mut app, _) = app(config);
        click(&mut app, ButtonId::Start);
        let slot = app.game().unwrap().carousel().center_slot_id();

        click(&mut app, ButtonId::Buy(slot));
        assert_eq!(app.screen(), Screen::MainMenu);
        assert!(app.game().is_none());
        assert!(app.drain_events().contains(&GameEvent::RedirectToMenu));
        assert_eq!(app.menu().fade(), 1.0);
    }
}
