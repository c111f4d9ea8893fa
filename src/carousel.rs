//! Infinite ticket carousel
//!
//! A fixed ring of visible slots (3 or 5) slides over a circular list of
//! ticket configs. The centre slot shows the current config, its neighbours
//! the previous/next visible configs. Hidden configs are skipped but stay in
//! the list.
//!
//! A drag moves every slot with the pointer; on release a horizontal
//! displacement beyond the swipe threshold rotates the ring one step, then
//! the slots glide back to their rest layout.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::anim::Ease;
use crate::assets::{TextureLibrary, TicketConfig};
use crate::consts::*;
use crate::error::{GameError, Result};
use crate::signal::{Signal, Subscription};
use crate::ticket::{TicketState, TicketView};

/// Stable identity of an on-screen ticket (survives rotation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub usize);

/// Direction the ring rotated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    /// Dragged right: the last slot wraps to the front, previous config centred
    Left,
    /// Dragged left: the first slot wraps to the back, next config centred
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselSettings {
    /// Visible slots, 3 or 5
    pub slot_count: usize,
    pub spacing: f32,
    pub swipe_threshold: f32,
    pub move_duration: f32,
}

impl Default for CarouselSettings {
    fn default() -> Self {
        Self {
            slot_count: DEFAULT_SLOT_COUNT,
            spacing: SLOT_SPACING,
            swipe_threshold: SWIPE_THRESHOLD,
            move_duration: CAROUSEL_MOVE_DURATION,
        }
    }
}

/// Slots easing back to rest after a release
#[derive(Debug, Clone)]
struct Glide {
    elapsed: f32,
    from: Vec<(Vec2, f32)>,
}

#[derive(Debug)]
pub struct Carousel {
    configs: Vec<TicketConfig>,
    covers: TextureLibrary,
    hidden: BTreeSet<usize>,
    /// Config shown in the centre slot (never hidden)
    current_index: usize,
    /// Ring order, left to right
    slots: Vec<TicketView>,
    settings: CarouselSettings,
    swipe_locked: bool,
    drag_start: Option<Vec2>,
    glide: Option<Glide>,
    /// Bumped on every content refresh
    generation: u64,
    rng: Pcg32,
    center_changed: Signal<usize>,
}

impl Carousel {
    /// Build the ring, creating one view per slot with `make_view`
    pub fn new(
        settings: CarouselSettings,
        configs: Vec<TicketConfig>,
        covers: TextureLibrary,
        seed: u64,
        mut make_view: impl FnMut(SlotId) -> TicketView,
    ) -> Result<Self> {
        if settings.slot_count != 3 && settings.slot_count != 5 {
            return Err(GameError::InvalidSlotCount(settings.slot_count));
        }
        if configs.is_empty() {
            return Err(GameError::EmptyCarousel);
        }

        let slots = (0..settings.slot_count).map(|i| make_view(SlotId(i))).collect();
        let mut carousel = Self {
            configs,
            covers,
            hidden: BTreeSet::new(),
            current_index: 0,
            slots,
            settings,
            swipe_locked: false,
            drag_start: None,
            glide: None,
            generation: 0,
            rng: Pcg32::seed_from_u64(seed),
            center_changed: Signal::new(),
        };

        carousel.refresh_content()?;
        carousel.arrange();
        carousel.update_states();
        Ok(carousel)
    }

    pub fn settings(&self) -> CarouselSettings {
        self.settings
    }

    pub fn configs(&self) -> &[TicketConfig] {
        &self.configs
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_config(&self) -> &TicketConfig {
        &self.configs[self.current_index]
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn slots(&self) -> &[TicketView] {
        &self.slots
    }

    pub fn slot(&self, id: SlotId) -> Option<&TicketView> {
        self.slots.iter().find(|s| s.id() == id)
    }

    pub fn slot_mut(&mut self, id: SlotId) -> Option<&mut TicketView> {
        self.slots.iter_mut().find(|s| s.id() == id)
    }

    pub fn slots_mut(&mut self) -> impl Iterator<Item = &mut TicketView> {
        self.slots.iter_mut()
    }

    #[inline]
    fn center_position(&self) -> usize {
        self.slots.len() / 2
    }

    pub fn center_slot(&self) -> &TicketView {
        &self.slots[self.center_position()]
    }

    pub fn center_slot_id(&self) -> SlotId {
        self.center_slot().id()
    }

    pub fn is_hidden(&self, index: usize) -> bool {
        self.hidden.contains(&index)
    }

    pub fn visible_config_count(&self) -> usize {
        self.configs.len() - self.hidden.len()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_start.is_some()
    }

    pub fn is_gliding(&self) -> bool {
        self.glide.is_some()
    }

    /// Observe centre changes (receives the centred config index)
    pub fn on_center_changed(&self, listener: impl FnMut(&usize) + 'static) -> Subscription {
        self.center_changed.subscribe(listener)
    }

    pub fn notify_center_changed(&self) {
        self.center_changed.emit(&self.current_index);
    }

    fn ensure_some_visible(&self) -> Result<usize> {
        let len = self.configs.len();
        if len == 0 {
            return Err(GameError::EmptyCarousel);
        }
        if self.hidden.len() >= len {
            log::error!("All {} ticket configs are hidden", len);
            return Err(GameError::AllConfigsHidden);
        }
        Ok(len)
    }

    /// First visible config at or after `start`, wrapping around
    pub fn next_visible_config_index(&self, start: usize) -> Result<usize> {
        let len = self.ensure_some_visible()?;
        let mut index = start % len;
        while self.hidden.contains(&index) {
            index = (index + 1) % len;
        }
        Ok(index)
    }

    /// First visible config at or before `start`, wrapping around
    pub fn prev_visible_config_index(&self, start: usize) -> Result<usize> {
        let len = self.ensure_some_visible()?;
        let mut index = start % len;
        while self.hidden.contains(&index) {
            index = (index + len - 1) % len;
        }
        Ok(index)
    }

    /// Exclude a config from rotation. The last visible config cannot be
    /// hidden.
    pub fn hide_config(&mut self, index: usize) -> Result<()> {
        let len = self.configs.len();
        if index >= len {
            return Err(GameError::ConfigOutOfRange { index, len });
        }
        if self.hidden.contains(&index) {
            return Ok(());
        }
        if self.visible_config_count() <= 1 {
            return Err(GameError::LastVisibleConfig { index });
        }

        self.hidden.insert(index);
        log::info!("Hid ticket config {} ('{}')", index, self.configs[index].title);

        let recenter = index == self.current_index;
        if recenter {
            self.current_index = self.next_visible_config_index(index)?;
        }
        self.refresh_content()?;
        if recenter {
            self.notify_center_changed();
        }
        Ok(())
    }

    /// Put a hidden config back into rotation
    pub fn unhide_config(&mut self, index: usize) -> Result<()> {
        let len = self.configs.len();
        if index >= len {
            return Err(GameError::ConfigOutOfRange { index, len });
        }
        if self.hidden.remove(&index) {
            self.refresh_content()?;
        }
        Ok(())
    }

    /// Repopulate every slot around the current config and roll fresh
    /// reward previews.
    pub fn refresh_content(&mut self) -> Result<()> {
        let len = self.configs.len();
        let n = self.slots.len();
        let centre = self.center_position();

        let mut indices = vec![0; n];
        indices[centre] = self.next_visible_config_index(self.current_index)?;
        for p in (0..centre).rev() {
            indices[p] = self.prev_visible_config_index((indices[p + 1] + len - 1) % len)?;
        }
        for p in centre + 1..n {
            indices[p] = self.next_visible_config_index((indices[p - 1] + 1) % len)?;
        }

        // Every slot re-rolls, unchanged configs included; the bumped
        // generation then rebinds every coordinator to the new prizes.
        for (slot, &index) in self.slots.iter_mut().zip(&indices) {
            let config = &self.configs[index];
            let reward = config.rewards.roll(&mut self.rng);
            slot.populate(index, config, reward, &self.covers);
        }

        self.generation += 1;
        log::debug!("Carousel content refreshed (generation {})", self.generation);
        Ok(())
    }

    pub fn is_swipe_locked(&self) -> bool {
        self.swipe_locked
    }

    /// Lock or unlock swiping. Locking mid-drag abandons the drag.
    pub fn set_swipe_locked(&mut self, locked: bool) {
        self.swipe_locked = locked;
        if locked && self.drag_start.take().is_some() {
            self.smooth_move_to_center();
        }
    }

    fn rest_position(&self, i: usize) -> Vec2 {
        let centre = self.center_position();
        let x = (i as f32 - centre as f32) * self.settings.spacing;
        let y = if i == centre { CENTER_SLOT_Y } else { 0.0 };
        Vec2::new(x, y)
    }

    fn rest_scale(&self, i: usize) -> f32 {
        if i == self.center_position() {
            CENTER_SLOT_SCALE
        } else {
            1.0
        }
    }

    /// Centre slot drawn on top, others in ring order
    fn update_sibling_order(&mut self) {
        let centre = self.center_position();
        let top = self.slots.len() - 1;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.sibling_order = if i == centre { top } else if i > centre { i - 1 } else { i };
        }
    }

    /// Snap every slot to its rest layout
    fn arrange(&mut self) {
        for i in 0..self.slots.len() {
            let (pos, scale) = (self.rest_position(i), self.rest_scale(i));
            let slot = &mut self.slots[i];
            slot.position = pos;
            slot.scale = scale;
        }
        self.update_sibling_order();
    }

    fn update_states(&mut self) {
        let centre = self.center_position();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let state = if i == centre {
                TicketState::Selected
            } else {
                TicketState::Normal
            };
            slot.play_animation(state);
        }
    }

    pub fn begin_drag(&mut self, pointer: Vec2) {
        if self.swipe_locked {
            return;
        }
        self.drag_start = Some(pointer);
        self.glide = None;
    }

    /// Slots follow the pointer horizontally
    pub fn drag(&mut self, pointer: Vec2) {
        if self.swipe_locked {
            return;
        }
        let Some(start) = self.drag_start else { return };
        let dx = pointer.x - start.x;
        for i in 0..self.slots.len() {
            let x = self.rest_position(i).x + dx;
            self.slots[i].position.x = x;
        }
    }

    /// Release: rotate when the drag was long enough, then glide to rest
    pub fn end_drag(&mut self, pointer: Vec2) -> Result<Option<SwipeDirection>> {
        if self.swipe_locked {
            self.drag_start = None;
            return Ok(None);
        }
        let Some(start) = self.drag_start.take() else {
            return Ok(None);
        };

        let dx = pointer.x - start.x;
        let mut swiped = None;
        if dx.abs() > self.settings.swipe_threshold {
            let direction = if dx > 0.0 {
                SwipeDirection::Left
            } else {
                SwipeDirection::Right
            };
            self.rotate(direction)?;
            swiped = Some(direction);
        }

        self.smooth_move_to_center();
        Ok(swiped)
    }

    fn rotate(&mut self, direction: SwipeDirection) -> Result<()> {
        let len = self.configs.len();
        match direction {
            SwipeDirection::Left => {
                self.current_index = self.prev_visible_config_index((self.current_index + len - 1) % len)?;
                self.slots.rotate_right(1);
            }
            SwipeDirection::Right => {
                self.current_index = self.next_visible_config_index((self.current_index + 1) % len)?;
                self.slots.rotate_left(1);
            }
        }
        log::debug!("Carousel swiped {:?}, centre config {}", direction, self.current_index);
        self.refresh_content()?;
        self.notify_center_changed();
        Ok(())
    }

    /// Start gliding every slot back to its rest layout
    pub fn smooth_move_to_center(&mut self) {
        self.glide = Some(Glide {
            elapsed: 0.0,
            from: self.slots.iter().map(|s| (s.position, s.scale)).collect(),
        });
        self.update_sibling_order();
    }

    /// Per-frame update. Returns the slots whose buy click landed.
    pub fn tick(&mut self, dt: f32) -> Vec<SlotId> {
        if let Some(mut glide) = self.glide.take() {
            glide.elapsed += dt;
            let t = (glide.elapsed / self.settings.move_duration.max(f32::EPSILON)).min(1.0);
            let k = Ease::OutQuad.apply(t);
            for (i, (from_pos, from_scale)) in glide.from.iter().enumerate() {
                let (pos, scale) = (self.rest_position(i), self.rest_scale(i));
                let slot = &mut self.slots[i];
                slot.position = from_pos.lerp(pos, k);
                slot.scale = from_scale + (scale - from_scale) * k;
            }
            if t < 1.0 {
                self.glide = Some(glide);
            } else {
                self.update_states();
            }
        }

        self.slots
            .iter_mut()
            .filter_map(|slot| slot.tick(dt).then(|| slot.id()))
            .collect()
    }
}
