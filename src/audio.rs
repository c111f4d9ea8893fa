//! Audio system
//!
//! One music source plus a small pool of effect sources behind the
//! `AudioBackend` trait. Track changes fade the music out, swap the clip and
//! fade back in, stepped once per frame from `AudioManager::tick`.

use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::assets::AudioConfig;
use crate::consts::{EFFECTS_VOLUME_KEY, MUSIC_FADE_DURATION, MUSIC_VOLUME_KEY};
use crate::settings::{PreferenceStore, Settings};

/// Output device: one music source, N effect sources
pub trait AudioBackend: Debug {
    fn music_volume(&self) -> f32;
    fn set_music_volume(&mut self, volume: f32);
    /// Swap the music clip and start playing it
    fn play_music(&mut self, clip: &str);
    fn effect_source_count(&self) -> usize;
    fn set_effect_volume(&mut self, source: usize, volume: f32);
    fn play_effect(&mut self, source: usize, clip: &str);
}

/// UI feedback sounds
pub trait SoundEffects {
    fn play_click_sound(&mut self);
    fn play_popup_sound(&mut self);
}

/// Everything a `RecordingBackend` was asked to do
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackJournal {
    pub music_volume: f32,
    pub music_clip: Option<String>,
    pub music_started: Vec<String>,
    pub effect_volumes: Vec<f32>,
    pub effects_played: Vec<(usize, String)>,
}

/// Silent backend that records playback (headless runs and tests)
#[derive(Debug, Clone)]
pub struct RecordingBackend {
    journal: Rc<RefCell<PlaybackJournal>>,
}

impl RecordingBackend {
    pub fn new(effect_sources: usize) -> Self {
        let journal = PlaybackJournal {
            effect_volumes: vec![0.0; effect_sources],
            ..Default::default()
        };
        Self {
            journal: Rc::new(RefCell::new(journal)),
        }
    }

    /// Shared handle to the journal, still readable after the backend is boxed
    pub fn journal(&self) -> Rc<RefCell<PlaybackJournal>> {
        Rc::clone(&self.journal)
    }
}

impl AudioBackend for RecordingBackend {
    fn music_volume(&self) -> f32 {
        self.journal.borrow().music_volume
    }

    fn set_music_volume(&mut self, volume: f32) {
        self.journal.borrow_mut().music_volume = volume;
    }

    fn play_music(&mut self, clip: &str) {
        let mut j = self.journal.borrow_mut();
        j.music_clip = Some(clip.to_string());
        j.music_started.push(clip.to_string());
    }

    fn effect_source_count(&self) -> usize {
        self.journal.borrow().effect_volumes.len()
    }

    fn set_effect_volume(&mut self, source: usize, volume: f32) {
        if let Some(v) = self.journal.borrow_mut().effect_volumes.get_mut(source) {
            *v = volume;
        }
    }

    fn play_effect(&mut self, source: usize, clip: &str) {
        self.journal.borrow_mut().effects_played.push((source, clip.to_string()));
    }
}

/// HTML audio elements; clips resolve to `audio/<name>.ogg`
#[cfg(target_arch = "wasm32")]
#[derive(Debug)]
pub struct WebAudioBackend {
    music: Option<web_sys::HtmlAudioElement>,
    effects: Vec<web_sys::HtmlAudioElement>,
}

#[cfg(target_arch = "wasm32")]
impl WebAudioBackend {
    pub fn new(effect_sources: usize) -> Self {
        let music = web_sys::HtmlAudioElement::new().ok();
        if let Some(music) = &music {
            music.set_loop(true);
        } else {
            log::warn!("Failed to create music element - music disabled");
        }
        let effects = (0..effect_sources)
            .filter_map(|_| web_sys::HtmlAudioElement::new().ok())
            .collect();
        Self { music, effects }
    }

    fn clip_url(clip: &str) -> String {
        format!("audio/{}.ogg", clip)
    }
}

#[cfg(target_arch = "wasm32")]
impl AudioBackend for WebAudioBackend {
    fn music_volume(&self) -> f32 {
        self.music.as_ref().map_or(0.0, |m| m.volume() as f32)
    }

    fn set_music_volume(&mut self, volume: f32) {
        if let Some(music) = &self.music {
            music.set_volume(volume.clamp(0.0, 1.0) as f64);
        }
    }

    fn play_music(&mut self, clip: &str) {
        if let Some(music) = &self.music {
            music.set_src(&Self::clip_url(clip));
            // Rejected promises mean the browser blocked autoplay
            let _ = music.play();
        }
    }

    fn effect_source_count(&self) -> usize {
        self.effects.len()
    }

    fn set_effect_volume(&mut self, source: usize, volume: f32) {
        if let Some(effect) = self.effects.get(source) {
            effect.set_volume(volume.clamp(0.0, 1.0) as f64);
        }
    }

    fn play_effect(&mut self, source: usize, clip: &str) {
        if let Some(effect) = self.effects.get(source) {
            effect.set_src(&Self::clip_url(clip));
            let _ = effect.play();
        }
    }
}

/// Cooperative cancellation flag shared with a running fade
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FadePhase {
    Out,
    In,
}

/// Fade out, swap clip, fade back in
#[derive(Debug)]
struct MusicFade {
    clip: String,
    phase: FadePhase,
    token: CancelToken,
}

impl MusicFade {
    /// One frame of the fade. Returns false once finished or cancelled.
    fn step(&mut self, backend: &mut dyn AudioBackend, dt: f32, duration: f32, target: f32) -> bool {
        if self.token.is_cancelled() {
            log::debug!("Music fade to '{}' cancelled", self.clip);
            return false;
        }

        let delta = dt / duration.max(f32::EPSILON);
        if self.phase == FadePhase::Out {
            let volume = backend.music_volume();
            if volume > 0.0 {
                backend.set_music_volume((volume - delta).max(0.0));
                return true;
            }
            backend.play_music(&self.clip);
            self.phase = FadePhase::In;
        }

        let volume = backend.music_volume();
        if volume >= target {
            return false;
        }
        let volume = (volume + delta).min(target);
        backend.set_music_volume(volume);
        volume < target
    }
}

#[derive(Debug)]
pub struct AudioManager {
    backend: Box<dyn AudioBackend>,
    config: AudioConfig,
    store: Box<dyn PreferenceStore>,
    settings: Settings,
    fade_duration: f32,
    current_music: usize,
    current_effect_source: usize,
    fade: Option<MusicFade>,
    rng: Pcg32,
}

impl AudioManager {
    /// Create the manager and apply the persisted volumes
    pub fn new(
        backend: Box<dyn AudioBackend>,
        config: AudioConfig,
        store: Box<dyn PreferenceStore>,
        seed: u64,
    ) -> Self {
        let settings = Settings::load(store.as_ref());
        let mut audio = Self {
            backend,
            config,
            store,
            settings,
            fade_duration: MUSIC_FADE_DURATION,
            current_music: 0,
            current_effect_source: 0,
            fade: None,
            rng: Pcg32::seed_from_u64(seed),
        };
        audio.backend.set_music_volume(settings.music_volume);
        audio.apply_effects_volume();
        log::info!(
            "Audio ready: music {:.2}, effects {:.2}, {} effect sources",
            settings.music_volume,
            settings.effects_volume,
            audio.backend.effect_source_count()
        );
        audio
    }

    pub fn with_fade_duration(mut self, seconds: f32) -> Self {
        self.fade_duration = seconds;
        self
    }

    /// Start a random background track
    pub fn start(&mut self) {
        let count = self.config.music_clips.len();
        if count == 0 {
            log::warn!("No music clips configured");
            return;
        }
        self.current_music = self.rng.random_range(0..count);
        self.play_background_music();
    }

    /// Cross-fade to the current track, cancelling any fade in flight
    pub fn play_background_music(&mut self) {
        if let Some(fade) = self.fade.take() {
            fade.token.cancel();
        }
        let Some(clip) = self.config.music_clips.get(self.current_music) else {
            return;
        };
        log::debug!("Fading to music track '{}'", clip);
        self.fade = Some(MusicFade {
            clip: clip.clone(),
            phase: FadePhase::Out,
            token: CancelToken::new(),
        });
    }

    pub fn play_next_music_track(&mut self) {
        let count = self.config.music_clips.len();
        if count == 0 {
            return;
        }
        self.current_music = (self.current_music + 1) % count;
        self.play_background_music();
    }

    pub fn current_music_index(&self) -> usize {
        self.current_music
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Token of the running fade, if any
    pub fn fade_token(&self) -> Option<CancelToken> {
        self.fade.as_ref().map(|f| f.token.clone())
    }

    /// Advance the music fade one frame
    pub fn tick(&mut self, dt: f32) {
        let target = self.settings.music_volume;
        let running = match self.fade.as_mut() {
            Some(fade) => fade.step(self.backend.as_mut(), dt, self.fade_duration, target),
            None => return,
        };
        if !running {
            self.fade = None;
        }
    }

    /// Cancel any running fade
    pub fn dispose(&mut self) {
        if let Some(fade) = self.fade.take() {
            fade.token.cancel();
        }
    }

    pub fn music_volume(&self) -> f32 {
        self.settings.music_volume
    }

    pub fn effects_volume(&self) -> f32 {
        self.settings.effects_volume
    }

    pub fn set_music_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.settings.music_volume = volume;
        self.backend.set_music_volume(volume);
        self.persist(MUSIC_VOLUME_KEY, volume);
    }

    pub fn set_effects_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.settings.effects_volume = volume;
        self.apply_effects_volume();
        self.persist(EFFECTS_VOLUME_KEY, volume);
    }

    pub fn store(&self) -> &dyn PreferenceStore {
        self.store.as_ref()
    }

    fn apply_effects_volume(&mut self) {
        for source in 0..self.backend.effect_source_count() {
            self.backend.set_effect_volume(source, self.settings.effects_volume);
        }
    }

    fn persist(&mut self, key: &str, value: f32) {
        if let Err(e) = self.store.set_f32(key, value) {
            log::warn!("Failed to save {}: {}", key, e);
        }
    }

    /// Play on the next effect source in rotation
    fn play_effect(&mut self, clip: &str) {
        let count = self.backend.effect_source_count();
        if count == 0 {
            log::warn!("No effect sources, dropping '{}'", clip);
            return;
        }
        let source = self.current_effect_source % count;
        self.backend.play_effect(source, clip);
        self.current_effect_source = (source + 1) % count;
    }
}

impl SoundEffects for AudioManager {
    fn play_click_sound(&mut self) {
        let clip = self.config.click_sound.clone();
        self.play_effect(&clip);
    }

    fn play_popup_sound(&mut self) {
        let clip = self.config.popup_sound.clone();
        self.play_effect(&clip);
    }
}

/// Sounds that go nowhere
#[derive(Debug, Clone, Copy, Default)]
pub struct Silence;

impl SoundEffects for Silence {
    fn play_click_sound(&mut self) {}
    fn play_popup_sound(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemoryStore;

    const DT: f32 = 1.0 / 60.0;

    fn manager(store: MemoryStore) -> (AudioManager, Rc<RefCell<PlaybackJournal>>) {
        let backend = RecordingBackend::new(3);
        let journal = backend.journal();
        let audio = AudioManager::new(Box::new(backend), AudioConfig::default(), Box::new(store), 3);
        (audio, journal)
    }

    fn run(audio: &mut AudioManager, frames: usize) {
        for _ in 0..frames {
            audio.tick(DT);
        }
    }

    #[test]
    fn test_loads_persisted_volumes() {
        let mut store = MemoryStore::default();
        store.set_f32(MUSIC_VOLUME_KEY, 0.5).unwrap();
        store.set_f32(EFFECTS_VOLUME_KEY, 0.25).unwrap();
        let (audio, journal) = manager(store);

        assert_eq!(audio.music_volume(), 0.5);
        assert_eq!(audio.effects_volume(), 0.25);
        let j = journal.borrow();
        assert_eq!(j.music_volume, 0.5);
        assert_eq!(j.effect_volumes, vec![0.25; 3]);
    }

    #[test]
    fn test_fade_swaps_clip_then_restores_volume() {
        let mut store = MemoryStore::default();
        store.set_f32(MUSIC_VOLUME_KEY, 0.5).unwrap();
        let (mut audio, journal) = manager(store);
        audio.start();
        let expected = AudioConfig::default().music_clips[audio.current_music_index()].clone();

        // Halfway through the fade-out nothing has switched yet
        run(&mut audio, 10);
        assert!(journal.borrow().music_clip.is_none());
        assert!(journal.borrow().music_volume < 0.5);

        run(&mut audio, 120);
        assert!(!audio.is_fading());
        let j = journal.borrow();
        assert_eq!(j.music_started, vec![expected]);
        assert!((j.music_volume - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_new_fade_cancels_previous() {
        let (mut audio, journal) = manager(MemoryStore::default());
        audio.play_background_music();
        let first = audio.fade_token().unwrap();
        run(&mut audio, 5);

        audio.play_next_music_track();
        assert!(first.is_cancelled());
        assert!(!audio.fade_token().unwrap().is_cancelled());

        run(&mut audio, 240);
        assert_eq!(journal.borrow().music_started, vec!["theme_b".to_string()]);
    }

    #[test]
    fn test_external_cancel_stops_fade() {
        let (mut audio, journal) = manager(MemoryStore::default());
        audio.play_background_music();
        audio.fade_token().unwrap().cancel();
        run(&mut audio, 240);
        assert!(!audio.is_fading());
        assert!(journal.borrow().music_started.is_empty());
    }

    #[test]
    fn test_next_track_wraps() {
        let (mut audio, _) = manager(MemoryStore::default());
        audio.play_next_music_track();
        assert_eq!(audio.current_music_index(), 1);
        audio.play_next_music_track();
        assert_eq!(audio.current_music_index(), 0);
    }

    #[test]
    fn test_no_music_clips() {
        let backend = RecordingBackend::new(1);
        let config = AudioConfig {
            music_clips: Vec::new(),
            ..Default::default()
        };
        let mut audio = AudioManager::new(Box::new(backend), config, Box::new(MemoryStore::default()), 0);
        audio.start();
        audio.play_next_music_track();
        assert!(!audio.is_fading());
    }

    #[test]
    fn test_effects_round_robin() {
        let (mut audio, journal) = manager(MemoryStore::default());
        for _ in 0..4 {
            audio.play_click_sound();
        }
        audio.play_popup_sound();
        let played: Vec<_> = journal.borrow().effects_played.iter().map(|(s, _)| *s).collect();
        assert_eq!(played, vec![0, 1, 2, 0, 1]);
        assert_eq!(journal.borrow().effects_played[4].1, "popup");
    }

    #[test]
    fn test_volume_setters_clamp_and_persist() {
        let (mut audio, journal) = manager(MemoryStore::default());
        audio.set_music_volume(1.7);
        audio.set_effects_volume(-0.2);
        assert_eq!(audio.music_volume(), 1.0);
        assert_eq!(audio.effects_volume(), 0.0);
        assert_eq!(audio.store().get_f32(EFFECTS_VOLUME_KEY), Some(0.0));
        assert_eq!(audio.store().get_f32(MUSIC_VOLUME_KEY), Some(1.0));
        assert_eq!(journal.borrow().effect_volumes, vec![0.0; 3]);
    }
}
