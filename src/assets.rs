//! Authoring-time data
//!
//! Ticket configs, animation parameter sets and the audio clip list are
//! read-only records loaded once at startup (from JSON, or built in code).
//! Art and clips are referenced by name; the renderer and audio backend own
//! the actual resources. Scratch covers are the exception: their pixels are
//! gameplay state, so the cover bitmaps live in a [`TextureLibrary`].

use std::collections::HashMap;

use glam::Vec4;
use serde::{Deserialize, Serialize};

use crate::anim::{Ease, TweenParams};
use crate::consts::LOCKED_SPIN_DURATION;
use crate::reward::{RewardEntry, RewardTable};
use crate::scratch::Texture;

/// One ticket design shown in the carousel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketConfig {
    pub title: String,
    pub price: i64,
    pub art: String,
    pub scratch_frame: String,
    /// Name of the cover bitmap in the [`TextureLibrary`]
    pub scratch_center: String,
    pub rewards: RewardTable,
}

/// Look of a ticket in one animation state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TicketSettings {
    pub frame_color: Vec4,
    pub scale_factor: f32,
    pub params: TweenParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TicketAnimationsConfig {
    pub normal: TicketSettings,
    pub selected: TicketSettings,
    /// One spin of the lock icons; loops while the locked overlay is shown
    #[serde(default = "default_locked_spin")]
    pub locked_spin: TweenParams,
}

fn default_locked_spin() -> TweenParams {
    TweenParams::new(LOCKED_SPIN_DURATION, 0.0, Ease::Linear)
}

impl Default for TicketAnimationsConfig {
    fn default() -> Self {
        let params = TweenParams::new(0.25, 0.0, Ease::OutQuad);
        Self {
            normal: TicketSettings {
                frame_color: Vec4::new(0.8, 0.8, 0.8, 1.0),
                scale_factor: 1.0,
                params,
            },
            selected: TicketSettings {
                frame_color: Vec4::new(1.0, 0.85, 0.2, 1.0),
                scale_factor: 1.05,
                params,
            },
            locked_spin: default_locked_spin(),
        }
    }
}

/// Click feedback of a button
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ButtonConfig {
    pub bg_color: Vec4,
    pub scale_factor: f32,
    pub params: TweenParams,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            bg_color: Vec4::new(0.85, 0.85, 0.85, 1.0),
            scale_factor: 0.9,
            params: TweenParams::new(0.1, 0.0, Ease::OutQuad),
        }
    }
}

/// Show or hide animation of a popup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopupStateParams {
    pub bg_color_from: Vec4,
    pub bg_color_target: Vec4,
    pub root_fade_from: f32,
    pub root_fade_target: f32,
    pub scale_from: f32,
    pub scale_target: f32,
    pub params: TweenParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopupConfig {
    pub show: PopupStateParams,
    pub hide: PopupStateParams,
}

impl Default for PopupConfig {
    fn default() -> Self {
        let clear = Vec4::new(0.0, 0.0, 0.0, 0.0);
        let dim = Vec4::new(0.0, 0.0, 0.0, 0.6);
        Self {
            show: PopupStateParams {
                bg_color_from: clear,
                bg_color_target: dim,
                root_fade_from: 0.0,
                root_fade_target: 1.0,
                scale_from: 0.8,
                scale_target: 1.0,
                params: TweenParams::new(0.3, 0.0, Ease::OutBack),
            },
            hide: PopupStateParams {
                bg_color_from: dim,
                bg_color_target: clear,
                root_fade_from: 1.0,
                root_fade_target: 0.0,
                scale_from: 1.0,
                scale_target: 0.8,
                params: TweenParams::new(0.2, 0.0, Ease::InQuad),
            },
        }
    }
}

/// Clip names handed to the audio backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    pub music_clips: Vec<String>,
    pub click_sound: String,
    pub popup_sound: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            music_clips: vec!["theme_a".into(), "theme_b".into()],
            click_sound: "click".into(),
            popup_sound: "popup".into(),
        }
    }
}

/// Scratch cover bitmaps by name
#[derive(Debug, Clone, Default)]
pub struct TextureLibrary {
    textures: HashMap<String, Texture>,
}

impl TextureLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, texture: Texture) {
        self.textures.insert(name.into(), texture);
    }

    pub fn get(&self, name: &str) -> Option<&Texture> {
        self.textures.get(name)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}

/// Everything loaded at startup
#[derive(Debug, Clone)]
pub struct GameAssets {
    pub tickets: Vec<TicketConfig>,
    pub ticket_animations: TicketAnimationsConfig,
    pub button: ButtonConfig,
    pub popup: PopupConfig,
    pub audio: AudioConfig,
    pub covers: TextureLibrary,
    pub brush: Texture,
}

/// JSON shape of the static records (bitmaps are supplied separately)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetManifest {
    pub tickets: Vec<TicketConfig>,
    #[serde(default)]
    pub ticket_animations: Option<TicketAnimationsConfig>,
    #[serde(default)]
    pub button: Option<ButtonConfig>,
    #[serde(default)]
    pub popup: Option<PopupConfig>,
    #[serde(default)]
    pub audio: Option<AudioConfig>,
}

impl GameAssets {
    /// Build from a JSON manifest plus the cover bitmaps and brush
    pub fn from_json(json: &str, covers: TextureLibrary, brush: Texture) -> serde_json::Result<Self> {
        let manifest: AssetManifest = serde_json::from_str(json)?;
        log::info!("Loaded {} ticket configs", manifest.tickets.len());
        Ok(Self {
            tickets: manifest.tickets,
            ticket_animations: manifest.ticket_animations.unwrap_or_default(),
            button: manifest.button.unwrap_or_default(),
            popup: manifest.popup.unwrap_or_default(),
            audio: manifest.audio.unwrap_or_default(),
            covers,
            brush,
        })
    }

    /// Built-in set of three tickets with solid covers
    pub fn builtin() -> Self {
        let mut covers = TextureLibrary::new();
        covers.insert("cover_silver", Texture::solid(64, 64, [192, 192, 192, 255]));
        covers.insert("cover_gold", Texture::solid(64, 64, [212, 175, 55, 255]));

        let tickets = vec![
            TicketConfig {
                title: "Lucky Clover".into(),
                price: 10,
                art: "art_clover".into(),
                scratch_frame: "frame_green".into(),
                scratch_center: "cover_silver".into(),
                rewards: RewardTable::new(vec![
                    RewardEntry::new(5, 40.0),
                    RewardEntry::new(20, 20.0),
                    RewardEntry::new(100, 2.0),
                ]),
            },
            TicketConfig {
                title: "Gold Rush".into(),
                price: 30,
                art: "art_gold".into(),
                scratch_frame: "frame_gold".into(),
                scratch_center: "cover_gold".into(),
                rewards: RewardTable::new(vec![
                    RewardEntry::new(15, 45.0),
                    RewardEntry::new(60, 20.0),
                    RewardEntry::new(300, 3.0),
                ]),
            },
            TicketConfig {
                title: "Devil's Deal".into(),
                price: 50,
                art: "art_devil".into(),
                scratch_frame: "frame_red".into(),
                scratch_center: "cover_silver".into(),
                rewards: RewardTable::new(vec![
                    RewardEntry::new(80, 60.0),
                    RewardEntry::new(250, 10.0),
                ])
                .with_negation(crate::consts::NEGATE_CHANCE),
            },
        ];

        Self {
            tickets,
            ticket_animations: TicketAnimationsConfig::default(),
            button: ButtonConfig::default(),
            popup: PopupConfig::default(),
            audio: AudioConfig::default(),
            covers,
            brush: Texture::round_brush(16),
        }
    }
}
