//! Popups and the settings popup
//!
//! Interactivity flips immediately on show/hide; the animation only drives
//! the visuals.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec4;

use crate::anim::{AnimationStates, Pose, Sequence, Track};
use crate::assets::{ButtonConfig, PopupConfig, PopupStateParams};
use crate::audio::AudioManager;
use crate::signal::{Signal, Subscription};
use crate::ui::button::{Button, ButtonId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopupState {
    Hidden,
    Shown,
}

fn popup_sequence(p: &PopupStateParams) -> Sequence {
    Sequence::new(p.params)
        .with_track(Track::scale(p.scale_target).starting_at(Vec4::splat(p.scale_from)))
        .with_track(Track::fade(p.root_fade_from, p.root_fade_target))
        .with_track(Track::color(p.bg_color_target).starting_at(p.bg_color_from))
}

#[derive(Debug)]
pub struct PopupView {
    anim: AnimationStates<PopupState>,
    interactable: bool,
    close: Button,
}

impl PopupView {
    pub fn new(config: &PopupConfig, button: &ButtonConfig) -> Self {
        let hidden_pose = Pose {
            scale: config.hide.scale_target,
            alpha: config.hide.root_fade_target,
            color: config.hide.bg_color_target,
            ..Pose::default()
        };
        let anim = AnimationStates::builder(PopupState::Hidden)
            .state(PopupState::Shown, popup_sequence(&config.show))
            .state(PopupState::Hidden, popup_sequence(&config.hide))
            .pose(hidden_pose)
            .build();
        Self {
            anim,
            interactable: false,
            close: Button::new(ButtonId::ClosePopup, "Close", button),
        }
    }

    pub fn show(&mut self) {
        self.interactable = true;
        self.anim.play(PopupState::Shown);
    }

    pub fn hide(&mut self) {
        self.interactable = false;
        self.anim.play(PopupState::Hidden);
    }

    /// Accepts pointer input (the show animation may still be running)
    pub fn is_interactable(&self) -> bool {
        self.interactable
    }

    pub fn state(&self) -> PopupState {
        self.anim.current()
    }

    pub fn pose(&self) -> &Pose {
        self.anim.pose()
    }

    pub fn close_button(&mut self) -> &mut Button {
        &mut self.close
    }

    /// Route a click; only the close button lives on a bare popup
    pub fn press(&mut self, id: ButtonId) -> bool {
        if self.interactable && id == ButtonId::ClosePopup {
            return self.close.press();
        }
        false
    }

    pub fn tick(&mut self, dt: f32) {
        if self.close.tick(dt) {
            self.hide();
        }
        self.anim.tick(dt);
    }
}

/// Value slider in [0, 1]
#[derive(Debug)]
pub struct Slider {
    value: f32,
    changed: Signal<f32>,
}

impl Slider {
    pub fn new(value: f32) -> Self {
        Self {
            value: value.clamp(0.0, 1.0),
            changed: Signal::new(),
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Move the handle; listeners hear about actual changes only
    pub fn set_value(&mut self, value: f32) {
        let value = value.clamp(0.0, 1.0);
        if (value - self.value).abs() > f32::EPSILON {
            self.value = value;
            self.changed.emit(&value);
        }
    }

    /// Move the handle without notifying (initial sync)
    pub fn set_value_silently(&mut self, value: f32) {
        self.value = value.clamp(0.0, 1.0);
    }

    pub fn on_changed(&self, listener: impl FnMut(&f32) + 'static) -> Subscription {
        self.changed.subscribe(listener)
    }
}

/// Settings popup with the two volume sliders
#[derive(Debug)]
pub struct SettingsPopup {
    pub popup: PopupView,
    pub music: Slider,
    pub effects: Slider,
}

impl SettingsPopup {
    pub fn new(config: &PopupConfig, button: &ButtonConfig) -> Self {
        Self {
            popup: PopupView::new(config, button),
            music: Slider::new(crate::consts::DEFAULT_VOLUME),
            effects: Slider::new(crate::consts::DEFAULT_VOLUME),
        }
    }

    /// Open the popup, syncing slider handles to the current volumes
    pub fn show(&mut self, music: f32, effects: f32) {
        self.music.set_value_silently(music);
        self.effects.set_value_silently(effects);
        self.popup.show();
    }

    pub fn drag_music(&mut self, value: f32) {
        if self.popup.is_interactable() {
            self.music.set_value(value);
        }
    }

    pub fn drag_effects(&mut self, value: f32) {
        if self.popup.is_interactable() {
            self.effects.set_value(value);
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.popup.tick(dt);
    }
}

/// Keeps the sliders wired to the audio manager for as long as it lives
#[derive(Debug)]
pub struct SettingsBinding {
    _music: Subscription,
    _effects: Subscription,
}

impl SettingsBinding {
    pub fn bind(popup: &SettingsPopup, audio: &Rc<RefCell<AudioManager>>) -> Self {
        let a = Rc::clone(audio);
        let music = popup.music.on_changed(move |v| a.borrow_mut().set_music_volume(*v));
        let a = Rc::clone(audio);
        let effects = popup
            .effects
            .on_changed(move |v| a.borrow_mut().set_effects_volume(*v));
        Self {
            _music: music,
            _effects: effects,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioManager, RecordingBackend};
    use crate::assets::AudioConfig;
    use crate::settings::MemoryStore;

    fn settings_popup() -> SettingsPopup {
        SettingsPopup::new(&PopupConfig::default(), &ButtonConfig::default())
    }

    #[test]
    fn test_show_hide_toggles_interactivity() {
        let mut popup = PopupView::new(&PopupConfig::default(), &ButtonConfig::default());
        assert!(!popup.is_interactable());
        popup.show();
        assert!(popup.is_interactable());
        assert_eq!(popup.state(), PopupState::Shown);
        for _ in 0..30 {
            popup.tick(1.0 / 60.0);
        }
        assert!((popup.pose().alpha - 1.0).abs() < 1e-3);

        popup.hide();
        assert!(!popup.is_interactable());
        for _ in 0..30 {
            popup.tick(1.0 / 60.0);
        }
        assert!(popup.pose().alpha.abs() < 1e-3);
    }

    #[test]
    fn test_close_button_hides_after_feedback() {
        let mut popup = PopupView::new(&PopupConfig::default(), &ButtonConfig::default());
        popup.show();
        assert!(popup.press(ButtonId::ClosePopup));
        for _ in 0..30 {
            popup.tick(1.0 / 60.0);
        }
        assert_eq!(popup.state(), PopupState::Hidden);
    }

    #[test]
    fn test_sliders_drive_audio_volumes() {
        let audio = Rc::new(RefCell::new(AudioManager::new(
            Box::new(RecordingBackend::new(2)),
            AudioConfig::default(),
            Box::new(MemoryStore::default()),
            7,
        )));
        let mut popup = settings_popup();
        let binding = SettingsBinding::bind(&popup, &audio);

        // Closed popup ignores drags
        popup.drag_music(0.2);
        assert_eq!(audio.borrow().music_volume(), 1.0);

        popup.show(1.0, 1.0);
        popup.drag_music(0.25);
        popup.drag_effects(1.5);
        assert_eq!(audio.borrow().music_volume(), 0.25);
        assert_eq!(audio.borrow().effects_volume(), 1.0);
        popup.drag_effects(0.5);
        assert_eq!(audio.borrow().effects_volume(), 0.5);

        drop(binding);
        popup.drag_music(0.9);
        assert_eq!(audio.borrow().music_volume(), 0.25);
    }
}
