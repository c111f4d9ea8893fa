//! Headless UI view models
//!
//! These hold what a renderer would draw (labels, visibility, animated
//! poses) and turn raw clicks into actions once their feedback animation
//! has played.

pub mod button;
pub mod currency;
pub mod hud;
pub mod menu;
pub mod popup;

pub use button::{Button, ButtonId};
pub use currency::CurrencyView;
pub use hud::{GameHud, HudAction};
pub use menu::{MainMenu, MenuAction};
pub use popup::{PopupState, PopupView, SettingsBinding, SettingsPopup, Slider};
