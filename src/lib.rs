//! Scratch Ticket - a scratch-off ticket mini-game
//!
//! Core modules:
//! - `economy`: Currency ledger with change notification
//! - `reward`: Weighted reward tables
//! - `scratch`: Scratch-off erasure surfaces
//! - `carousel`: Infinite ticket carousel with hidden configs
//! - `purchase`: Buy → scratch → reward flow for one carousel slot
//! - `game`: Game screen composition and per-frame tick
//! - `app`: Screen switching and startup wiring
//! - `audio`, `settings`: Volumes, music fades and persisted preferences
//! - `anim`, `ui`: Data-driven animation states and UI view models

pub mod anim;
pub mod app;
pub mod assets;
pub mod audio;
pub mod carousel;
pub mod economy;
pub mod error;
pub mod game;
pub mod purchase;
pub mod reward;
pub mod scratch;
pub mod settings;
pub mod signal;
pub mod ticket;
pub mod ui;

pub use app::{App, Screen};
pub use economy::{InsufficientFundsPolicy, Ledger};
pub use error::{GameError, Result};
pub use game::{FrameInput, GameConfig, GameScreen};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Minimum horizontal drag (screen units) that turns a release into a swipe
    pub const SWIPE_THRESHOLD: f32 = 100.0;
    /// Horizontal distance between neighbouring carousel slots
    pub const SLOT_SPACING: f32 = 850.0;
    /// Vertical offset of the centre slot
    pub const CENTER_SLOT_Y: f32 = -50.0;
    /// Scale of the centre slot (others are 1.0)
    pub const CENTER_SLOT_SCALE: f32 = 1.2;
    /// Seconds for slots to glide back to rest
    pub const CAROUSEL_MOVE_DURATION: f32 = 1.0;
    /// Default visible slot count
    pub const DEFAULT_SLOT_COUNT: usize = 3;
    /// Seconds for one spin of the lock icons
    pub const LOCKED_SPIN_DURATION: f32 = 2.0;

    /// Erased fraction that completes a scratch (0.80 in older builds)
    pub const ERASE_THRESHOLD: f32 = 0.90;
    pub const DEFAULT_BRUSH_SCALE: f32 = 1.0;
    /// On-screen size of a ticket's scratch area
    pub const SCRATCH_AREA_SIZE: f32 = 400.0;

    /// Chance of the "bad outcome" sign flip on a reward
    pub const NEGATE_CHANCE: f32 = 0.34;

    /// Starting balance
    pub const DEFAULT_BALANCE: i64 = 100;

    /// Seconds for a full music fade (out or in)
    pub const MUSIC_FADE_DURATION: f32 = 1.0;
    /// Effect sources cycled round-robin
    pub const EFFECT_SOURCE_COUNT: usize = 3;
    /// Default volume for both channels
    pub const DEFAULT_VOLUME: f32 = 1.0;

    /// Preference keys
    pub const MUSIC_VOLUME_KEY: &str = "MusicVolume";
    pub const EFFECTS_VOLUME_KEY: &str = "EffectsVolume";
}
