//! Buttons with click feedback
//!
//! A press plays the click animation first; the click is delivered when the
//! animation finishes.

use glam::Vec4;

use crate::anim::{Pose, Sequence, Track};
use crate::assets::ButtonConfig;
use crate::carousel::SlotId;
use crate::signal::{Signal, Subscription};

/// Which button was hit by the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    Start,
    Settings,
    Exit,
    ClosePopup,
    /// Game screen back to the main menu
    Back,
    Buy(SlotId),
}

#[derive(Debug)]
pub struct Button {
    id: ButtonId,
    label: String,
    visible: bool,
    click: Sequence,
    pose: Pose,
    pending: bool,
    clicked: Signal<ButtonId>,
}

impl Button {
    pub fn new(id: ButtonId, label: impl Into<String>, config: &ButtonConfig) -> Self {
        let click = Sequence::new(config.params)
            .with_track(
                Track::scale(config.scale_factor)
                    .starting_at(Vec4::ONE)
                    .yoyo(),
            )
            .with_track(Track::color(config.bg_color).yoyo());
        Self {
            id,
            label: label.into(),
            visible: true,
            click,
            pose: Pose::default(),
            pending: false,
            clicked: Signal::new(),
        }
    }

    pub fn id(&self) -> ButtonId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Hiding a button rewinds its feedback and drops a pending click
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible && !visible {
            self.click.rewind(&mut self.pose);
            self.pending = false;
        }
        self.visible = visible;
    }

    /// Pointer clicked the button. Hidden buttons ignore presses.
    pub fn press(&mut self) -> bool {
        if !self.visible {
            return false;
        }
        self.click.restart(&self.pose);
        self.pending = true;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn on_clicked(&self, listener: impl FnMut(&ButtonId) + 'static) -> Subscription {
        self.clicked.subscribe(listener)
    }

    pub fn click_listeners(&self) -> usize {
        self.clicked.listener_count()
    }

    /// Advance the feedback. Returns `true` on the frame the click lands.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.click.tick(dt, &mut self.pose) && self.pending {
            self.pending = false;
            self.clicked.emit(&self.id);
            return true;
        }
        false
    }
}
