//! One on-screen ticket
//!
//! The carousel owns a fixed set of these and repopulates them from ticket
//! configs whenever it rotates.

use glam::{Vec2, Vec4};

use crate::anim::{AnimationStates, Pose, Sequence, Track, TweenParams};
use crate::assets::{ButtonConfig, TicketAnimationsConfig, TicketConfig, TicketSettings, TextureLibrary};
use crate::carousel::SlotId;
use crate::scratch::{DisplayRect, ErasureSurface, ScratchSettings, Texture};
use crate::ui::button::{Button, ButtonId};

/// Visual states of a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketState {
    Normal,
    Selected,
    SelectedLocked,
    Locked,
}

fn ticket_sequence(settings: &TicketSettings) -> Sequence {
    Sequence::new(settings.params)
        .with_track(Track::scale(settings.scale_factor))
        .with_track(Track::color(settings.frame_color))
}

/// Lock icons over the prize area. The frame icon spins clockwise and the
/// centre icon counter-clockwise, looping while the overlay is shown.
#[derive(Debug)]
pub struct LockedOverlay {
    visible: bool,
    frame_spin: Sequence,
    center_spin: Sequence,
    frame_pose: Pose,
    center_pose: Pose,
}

impl LockedOverlay {
    pub fn new(params: TweenParams) -> Self {
        let frame_pose = Pose::default();
        let center_pose = Pose::default();
        let mut frame_spin = Sequence::new(params).with_track(Track::rotation(0.0, 360.0).yoyo());
        let mut center_spin = Sequence::new(params).with_track(Track::rotation(0.0, -360.0).yoyo());
        frame_spin.restart(&frame_pose);
        center_spin.restart(&center_pose);
        Self {
            visible: true,
            frame_spin,
            center_spin,
            frame_pose,
            center_pose,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Hiding pauses the spin, showing resumes it
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.frame_spin.resume();
            self.center_spin.resume();
        } else {
            self.frame_spin.pause();
            self.center_spin.pause();
        }
    }

    pub fn frame_rotation(&self) -> f32 {
        self.frame_pose.rotation
    }

    pub fn center_rotation(&self) -> f32 {
        self.center_pose.rotation
    }

    pub fn tick(&mut self, dt: f32) {
        if !self.visible {
            return;
        }
        if self.frame_spin.tick(dt, &mut self.frame_pose) {
            self.frame_spin.restart(&self.frame_pose);
        }
        if self.center_spin.tick(dt, &mut self.center_pose) {
            self.center_spin.restart(&self.center_pose);
        }
    }
}

/// View model of a ticket slot
#[derive(Debug)]
pub struct TicketView {
    id: SlotId,
    title: String,
    reward_label: String,
    art: String,
    frame: String,
    /// Config currently shown, if any
    config_index: Option<usize>,
    price: i64,
    /// Prize rolled when the slot was last populated
    reward: i64,
    /// Locked overlay covering the prize area until the ticket is bought
    locked: LockedOverlay,
    buy_button: Button,
    scratch: ErasureSurface,
    anim: AnimationStates<TicketState>,
    /// Layout position relative to the carousel centre
    pub position: Vec2,
    /// Layout scale (the centre slot is enlarged)
    pub scale: f32,
    /// Draw order, higher is on top
    pub sibling_order: usize,
}

impl TicketView {
    pub fn new(
        id: SlotId,
        animations: &TicketAnimationsConfig,
        button: &ButtonConfig,
        brush: Texture,
        scratch: ScratchSettings,
        scratch_size: Vec2,
    ) -> Self {
        let anim = AnimationStates::builder(TicketState::Normal)
            .state(TicketState::Normal, ticket_sequence(&animations.normal))
            .state(TicketState::Selected, ticket_sequence(&animations.selected))
            .pose(Pose {
                scale: animations.normal.scale_factor,
                alpha: 1.0,
                color: animations.normal.frame_color,
                ..Pose::default()
            })
            .build();

        Self {
            id,
            title: String::new(),
            reward_label: String::new(),
            art: String::new(),
            frame: String::new(),
            config_index: None,
            price: 0,
            reward: 0,
            locked: LockedOverlay::new(animations.locked_spin),
            buy_button: Button::new(ButtonId::Buy(id), "", button),
            scratch: ErasureSurface::new(DisplayRect::new(Vec2::ZERO, scratch_size), brush, scratch),
            anim,
            position: Vec2::ZERO,
            scale: 1.0,
            sibling_order: 0,
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn reward_label(&self) -> &str {
        &self.reward_label
    }

    pub fn art(&self) -> &str {
        &self.art
    }

    pub fn frame(&self) -> &str {
        &self.frame
    }

    pub fn price_label(&self) -> &str {
        self.buy_button.label()
    }

    pub fn config_index(&self) -> Option<usize> {
        self.config_index
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    pub fn reward(&self) -> i64 {
        self.reward
    }

    /// Show `config` in this slot with a freshly rolled `reward`
    pub fn populate(&mut self, index: usize, config: &TicketConfig, reward: i64, covers: &TextureLibrary) {
        self.config_index = Some(index);
        self.price = config.price;
        self.reward = reward;
        self.title = config.title.clone();
        self.reward_label = reward.to_string();
        self.art = config.art.clone();
        self.frame = config.scratch_frame.clone();
        self.buy_button.set_label(config.price.to_string());

        match covers.get(&config.scratch_center) {
            Some(cover) => {
                if !self.scratch.set_texture(cover) {
                    log::warn!("Ticket '{}' has an unusable cover, keeping previous cover", config.title);
                }
            }
            None => log::warn!(
                "Ticket '{}' references missing cover '{}', keeping previous cover",
                config.title,
                config.scratch_center
            ),
        }
    }

    pub fn is_locked_visible(&self) -> bool {
        self.locked.is_visible()
    }

    pub fn set_locked(&mut self, visible: bool) {
        self.locked.set_visible(visible);
    }

    pub fn locked_overlay(&self) -> &LockedOverlay {
        &self.locked
    }

    pub fn is_buy_visible(&self) -> bool {
        self.buy_button.is_visible()
    }

    pub fn set_buy_button(&mut self, visible: bool) {
        self.buy_button.set_visible(visible);
    }

    pub fn buy_button(&self) -> &Button {
        &self.buy_button
    }

    pub fn buy_button_mut(&mut self) -> &mut Button {
        &mut self.buy_button
    }

    pub fn scratch(&self) -> &ErasureSurface {
        &self.scratch
    }

    pub fn scratch_mut(&mut self) -> &mut ErasureSurface {
        &mut self.scratch
    }

    pub fn play_animation(&mut self, state: TicketState) {
        self.anim.play(state);
    }

    pub fn animation_state(&self) -> TicketState {
        self.anim.current()
    }

    pub fn frame_color(&self) -> Vec4 {
        self.anim.pose().color
    }

    /// Combined layout and animation scale
    pub fn display_scale(&self) -> f32 {
        self.scale * self.anim.pose().scale
    }

    /// Per-frame update: button feedback, state animation, scratch rect
    /// following the slot. Returns whether the buy click landed.
    pub fn tick(&mut self, dt: f32) -> bool {
        let clicked = self.buy_button.tick(dt);
        self.anim.tick(dt);
        self.locked.tick(dt);
        let mut rect = self.scratch.rect();
        rect.center = self.position;
        self.scratch.set_rect(rect);
        clicked
    }
}
