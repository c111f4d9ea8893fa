//! Game screen
//!
//! Owns the session ledger, the carousel and one purchase coordinator per
//! slot, and advances them together once per frame.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::assets::GameAssets;
use crate::audio::SoundEffects;
use crate::carousel::{Carousel, CarouselSettings, SlotId};
use crate::consts::*;
use crate::economy::{CurrencyConfig, InsufficientFundsPolicy, Ledger};
use crate::error::{GameError, Result};
use crate::purchase::{PurchaseContext, PurchaseCoordinator, PurchaseOutcome};
use crate::scratch::ScratchSettings;
use crate::signal::Subscription;
use crate::ticket::TicketView;
use crate::ui::{ButtonId, CurrencyView};

/// Tunables for a game session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub carousel: CarouselSettings,
    pub scratch: ScratchSettings,
    /// Display size of each ticket's scratch area
    pub scratch_area: Vec2,
    pub funds_policy: InsufficientFundsPolicy,
    pub currency: CurrencyConfig,
    /// Seed for reward rolls and the starting music track
    pub seed: u64,
    pub effect_sources: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            carousel: CarouselSettings::default(),
            scratch: ScratchSettings::default(),
            scratch_area: Vec2::splat(SCRATCH_AREA_SIZE),
            funds_policy: InsufficientFundsPolicy::default(),
            currency: CurrencyConfig::default(),
            seed: 0x5eed,
            effect_sources: EFFECT_SOURCE_COUNT,
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Pointer state and button hits for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Pointer position in screen space
    pub pointer: Vec2,
    /// Went down this frame
    pub pressed: bool,
    pub held: bool,
    /// Went up this frame
    pub released: bool,
    /// Button under the pointer when it went down
    pub button: Option<ButtonId>,
    /// Settings slider drags (0.0 - 1.0)
    pub music_slider: Option<f32>,
    pub effects_slider: Option<f32>,
}

impl FrameInput {
    pub fn click(button: ButtonId) -> Self {
        Self {
            button: Some(button),
            ..Default::default()
        }
    }

    /// Pointer held at `pointer`, `pressed` on the first frame
    pub fn hold(pointer: Vec2, pressed: bool) -> Self {
        Self {
            pointer,
            pressed,
            held: true,
            ..Default::default()
        }
    }

    pub fn release(pointer: Vec2) -> Self {
        Self {
            pointer,
            released: true,
            ..Default::default()
        }
    }
}

/// Things that happened during a game tick
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PurchaseStarted { slot: SlotId, price: i64 },
    PurchaseCompleted { slot: SlotId, reward: i64 },
    /// A ticket was taken away mid-scratch; its price went back to the ledger
    PurchaseInterrupted { slot: SlotId, price: i64 },
    PurchaseFailed(GameError),
    CenterChanged(usize),
    RedirectToMenu,
}

#[derive(Debug)]
pub struct GameScreen {
    ledger: Ledger,
    carousel: Carousel,
    currency_view: CurrencyView,
    coordinators: Vec<PurchaseCoordinator>,
    bound_generation: u64,
    centre_changes: Rc<RefCell<Vec<usize>>>,
    redirect: Rc<Cell<bool>>,
    redirect_pending: bool,
    _center_subscription: Subscription,
    _redirect_subscription: Subscription,
    events: Vec<GameEvent>,
}

impl GameScreen {
    pub fn new(config: &GameConfig, assets: &GameAssets) -> Result<Self> {
        let ledger = Ledger::from_config(&config.currency, config.funds_policy);
        let carousel = Carousel::new(
            config.carousel,
            assets.tickets.clone(),
            assets.covers.clone(),
            config.seed,
            |id| {
                TicketView::new(
                    id,
                    &assets.ticket_animations,
                    &assets.button,
                    assets.brush.clone(),
                    config.scratch,
                    config.scratch_area,
                )
            },
        )?;

        let centre_changes = Rc::new(RefCell::new(Vec::new()));
        let changes = Rc::clone(&centre_changes);
        let center_subscription = carousel.on_center_changed(move |i| changes.borrow_mut().push(*i));

        let redirect = Rc::new(Cell::new(false));
        let flag = Rc::clone(&redirect);
        let redirect_subscription = ledger.on_redirect(move |_| flag.set(true));

        let currency_view = CurrencyView::bind(&ledger);
        let mut screen = Self {
            ledger,
            carousel,
            currency_view,
            coordinators: Vec::new(),
            bound_generation: 0,
            centre_changes,
            redirect,
            redirect_pending: false,
            _center_subscription: center_subscription,
            _redirect_subscription: redirect_subscription,
            events: Vec::new(),
        };
        screen.rebind();
        screen.carousel.notify_center_changed();
        screen.collect_signals();

        log::info!(
            "Game screen ready: {} tickets, {} slots, balance {}",
            screen.carousel.configs().len(),
            screen.carousel.slots().len(),
            screen.ledger.balance()
        );
        Ok(screen)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn carousel(&self) -> &Carousel {
        &self.carousel
    }

    pub fn currency_text(&self) -> String {
        self.currency_view.text()
    }

    pub fn coordinators(&self) -> &[PurchaseCoordinator] {
        &self.coordinators
    }

    pub fn is_purchase_active(&self) -> bool {
        self.coordinators.iter().any(PurchaseCoordinator::is_scratching)
    }

    /// The ledger asked to return to the main menu
    pub fn redirect_requested(&self) -> bool {
        self.redirect_pending
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Take a ticket config out of rotation
    pub fn hide_config(&mut self, index: usize) -> Result<()> {
        self.carousel.hide_config(index)?;
        self.rebind_if_stale();
        self.collect_signals();
        Ok(())
    }

    /// Drop every binding and bind each slot to what it shows now.
    /// A purchase cut short here is refunded.
    fn rebind(&mut self) {
        let mut interrupted = Vec::new();
        for mut coordinator in self.coordinators.drain(..) {
            if coordinator.dispose(&mut self.carousel) {
                interrupted.push((coordinator.slot(), coordinator.price()));
            }
        }
        for (slot, price) in interrupted {
            log::info!("Refunding {} for the interrupted purchase on {:?}", price, slot);
            self.ledger.add_currency(price);
            self.events.push(GameEvent::PurchaseInterrupted { slot, price });
        }
        let carousel = &self.carousel;
        self.coordinators = carousel
            .slots()
            .iter()
            .filter_map(|view| match PurchaseCoordinator::bind_view(view, carousel) {
                Ok(coordinator) => Some(coordinator),
                Err(e) => {
                    log::error!("Skipping slot {:?}: {}", view.id(), e);
                    None
                }
            })
            .collect();
        self.bound_generation = self.carousel.generation();
    }

    fn rebind_if_stale(&mut self) {
        if self.carousel.generation() != self.bound_generation {
            self.rebind();
        }
    }

    /// Advance one frame
    pub fn tick(&mut self, input: &FrameInput, dt: f32, sounds: &mut dyn SoundEffects) {
        if let Some(ButtonId::Buy(slot)) = input.button {
            self.press_buy(slot);
        }

        if input.pressed && input.button.is_none() {
            self.carousel.begin_drag(input.pointer);
        }
        if input.held {
            self.carousel.drag(input.pointer);
            for view in self.carousel.slots_mut() {
                view.scratch_mut().poll(input.pointer, true);
            }
        }
        if input.released {
            if let Err(e) = self.carousel.end_drag(input.pointer) {
                log::error!("Swipe failed: {}", e);
            }
        }

        self.carousel.tick(dt);

        let mut completed = false;
        for coordinator in self.coordinators.iter_mut() {
            let mut ctx = PurchaseContext {
                ledger: &mut self.ledger,
                carousel: &mut self.carousel,
                sounds: &mut *sounds,
            };
            match coordinator.process(&mut ctx) {
                Ok(outcomes) => {
                    for outcome in outcomes {
                        self.events.push(match outcome {
                            PurchaseOutcome::Started { slot, price } => GameEvent::PurchaseStarted { slot, price },
                            PurchaseOutcome::Completed { slot, reward } => {
                                completed = true;
                                GameEvent::PurchaseCompleted { slot, reward }
                            }
                        });
                    }
                }
                Err(e) => {
                    log::info!("Purchase failed: {}", e);
                    self.events.push(GameEvent::PurchaseFailed(e));
                }
            }
        }

        if completed {
            if let Err(e) = self.carousel.refresh_content() {
                log::error!("Carousel refresh failed: {}", e);
            }
        }
        self.rebind_if_stale();
        self.collect_signals();
    }

    /// Turn queued centre changes and redirect requests into events
    fn collect_signals(&mut self) {
        let changes: Vec<usize> = self.centre_changes.borrow_mut().drain(..).collect();
        self.events.extend(changes.into_iter().map(GameEvent::CenterChanged));

        if self.redirect.take() {
            self.redirect_pending = true;
            self.events.push(GameEvent::RedirectToMenu);
        }
    }

    /// Buy clicks only start feedback while no other ticket is being scratched
    fn press_buy(&mut self, slot: SlotId) {
        if self.is_purchase_active() {
            log::debug!("Buy on {:?} ignored, a purchase is in progress", slot);
            return;
        }
        match self.carousel.slot_mut(slot) {
            Some(view) => {
                view.buy_button_mut().press();
            }
            None => log::warn!("Buy pressed on unknown slot {:?}", slot),
        }
    }
}

impl Drop for GameScreen {
    fn drop(&mut self) {
        for coordinator in self.coordinators.iter_mut() {
            coordinator.dispose(&mut self.carousel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{TextureLibrary, TicketConfig};
    use crate::audio::Silence;
    use crate::reward::{RewardEntry, RewardTable};
    use crate::scratch::Texture;

    const DT: f32 = 1.0 / 60.0;

    fn ticket(title: &str, price: i64, reward: i64) -> TicketConfig {
        TicketConfig {
            title: title.into(),
            price,
            art: String::new(),
            scratch_frame: String::new(),
            scratch_center: "cover".into(),
            rewards: RewardTable::new(vec![RewardEntry::new(reward, 100.0)]),
        }
    }

    fn assets(tickets: Vec<TicketConfig>) -> GameAssets {
        let mut covers = TextureLibrary::new();
        covers.insert("cover", Texture::solid(4, 4, [10, 10, 10, 255]));
        GameAssets {
            tickets,
            covers,
            brush: Texture::solid(4, 4, [255, 255, 255, 255]),
            ..GameAssets::builtin()
        }
    }

    fn config(balance: i64, policy: InsufficientFundsPolicy) -> GameConfig {
        GameConfig {
            currency: CurrencyConfig { currency: balance },
            funds_policy: policy,
            scratch_area: Vec2::splat(100.0),
            ..Default::default()
        }
    }

    fn idle(screen: &mut GameScreen, frames: usize) {
        for _ in 0..frames {
            screen.tick(&FrameInput::default(), DT, &mut Silence);
        }
    }

    fn buy_centre(screen: &mut GameScreen) -> SlotId {
        let slot = screen.carousel().center_slot_id();
        screen.tick(&FrameInput::click(ButtonId::Buy(slot)), DT, &mut Silence);
        idle(screen, 30);
        slot
    }

    #[test]
    fn test_buy_then_scratch_end_to_end() {
        let mut screen = GameScreen::new(
            &config(100, InsufficientFundsPolicy::Reject),
            &assets(vec![ticket("A", 30, 50)]),
        )
        .unwrap();
        assert_eq!(screen.drain_events(), vec![GameEvent::CenterChanged(0)]);

        let slot = buy_centre(&mut screen);
        assert_eq!(screen.ledger().balance(), 70);
        assert_eq!(screen.currency_text(), "70");
        assert!(screen.carousel().is_swipe_locked());
        assert!(screen.is_purchase_active());
        assert!(
            screen
                .drain_events()
                .contains(&GameEvent::PurchaseStarted { slot, price: 30 })
        );

        let at = screen.carousel().slot(slot).unwrap().position;
        let generation = screen.carousel().generation();
        screen.tick(&FrameInput::hold(at, true), DT, &mut Silence);
        screen.tick(&FrameInput::release(at), DT, &mut Silence);

        assert_eq!(screen.ledger().balance(), 120);
        assert_eq!(screen.currency_text(), "120");
        assert!(!screen.carousel().is_swipe_locked());
        assert!(!screen.is_purchase_active());
        assert!(screen.carousel().generation() > generation);
        assert!(
            screen
                .drain_events()
                .contains(&GameEvent::PurchaseCompleted { slot, reward: 50 })
        );

        let view = screen.carousel().slot(slot).unwrap();
        assert!(view.is_buy_visible());
        assert!(view.is_locked_visible());
        assert_eq!(view.scratch().transparent_count(), 0);
        assert_eq!(view.buy_button().click_listeners(), 1);
    }

    #[test]
    fn test_insufficient_funds_reported() {
        let mut screen = GameScreen::new(
            &config(20, InsufficientFundsPolicy::Reject),
            &assets(vec![ticket("A", 30, 50)]),
        )
        .unwrap();
        buy_centre(&mut screen);

        assert_eq!(screen.ledger().balance(), 20);
        assert!(!screen.carousel().is_swipe_locked());
        assert!(
            screen
                .drain_events()
                .contains(&GameEvent::PurchaseFailed(GameError::InsufficientFunds {
                    balance: 20,
                    price: 30
                }))
        );
        assert!(!screen.redirect_requested());
    }

    #[test]
    fn test_reset_policy_requests_menu() {
        let mut screen = GameScreen::new(
            &config(20, InsufficientFundsPolicy::ResetAndRedirect),
            &assets(vec![ticket("A", 30, 50)]),
        )
        .unwrap();
        buy_centre(&mut screen);

        assert_eq!(screen.ledger().balance(), 0);
        assert!(screen.redirect_requested());
        let events = screen.drain_events();
        assert_eq!(events.iter().filter(|e| **e == GameEvent::RedirectToMenu).count(), 1);
    }

    #[test]
    fn test_swipe_rebinds_every_slot() {
        let mut screen = GameScreen::new(
            &config(100, InsufficientFundsPolicy::Reject),
            &assets(vec![ticket("A", 10, 1), ticket("B", 20, 2), ticket("C", 30, 3)]),
        )
        .unwrap();
        screen.drain_events();

        screen.tick(&FrameInput::hold(Vec2::ZERO, true), DT, &mut Silence);
        screen.tick(&FrameInput::hold(Vec2::new(-300.0, 0.0), false), DT, &mut Silence);
        screen.tick(&FrameInput::release(Vec2::new(-300.0, 0.0)), DT, &mut Silence);

        assert_eq!(screen.carousel().current_index(), 1);
        assert_eq!(screen.drain_events(), vec![GameEvent::CenterChanged(1)]);
        assert_eq!(screen.coordinators().len(), 3);
        for view in screen.carousel().slots() {
            assert_eq!(view.buy_button().click_listeners(), 1);
        }
        let centre = screen.carousel().center_slot_id();
        let bound = screen.coordinators().iter().find(|c| c.slot() == centre).unwrap();
        assert_eq!((bound.price(), bound.reward()), (20, 2));
    }

    #[test]
    fn test_swipe_blocked_during_purchase() {
        let mut screen = GameScreen::new(
            &config(100, InsufficientFundsPolicy::Reject),
            &assets(vec![ticket("A", 10, 1), ticket("B", 20, 2)]),
        )
        .unwrap();
        buy_centre(&mut screen);

        // Start the drag away from the scratch area
        let far = Vec2::new(2000.0, 2000.0);
        screen.tick(&FrameInput::hold(far, true), DT, &mut Silence);
        screen.tick(&FrameInput::release(far - Vec2::new(500.0, 0.0)), DT, &mut Silence);
        assert_eq!(screen.carousel().current_index(), 0);

        // A second buy is ignored while scratching
        let other = screen.carousel().slots()[0].id();
        screen.tick(&FrameInput::click(ButtonId::Buy(other)), DT, &mut Silence);
        idle(&mut screen, 30);
        assert_eq!(screen.ledger().balance(), 90);
    }

    #[test]
    fn test_hiding_config_mid_purchase_releases_lock() {
        let mut screen = GameScreen::new(
            &config(100, InsufficientFundsPolicy::Reject),
            &assets(vec![ticket("A", 10, 1), ticket("B", 20, 2)]),
        )
        .unwrap();
        let slot = buy_centre(&mut screen);
        assert!(screen.carousel().is_swipe_locked());
        assert_eq!(screen.ledger().balance(), 90);
        screen.drain_events();

        screen.hide_config(0).unwrap();
        assert!(!screen.carousel().is_swipe_locked());
        assert!(!screen.is_purchase_active());
        assert_eq!(screen.carousel().current_index(), 1);
        assert_eq!(screen.ledger().balance(), 100);
        assert_eq!(screen.currency_text(), "100");
        assert_eq!(
            screen.drain_events(),
            vec![
                GameEvent::PurchaseInterrupted { slot, price: 10 },
                GameEvent::CenterChanged(1)
            ]
        );
    }

    #[test]
    fn test_hiding_idle_config_refunds_nothing() {
        let mut screen = GameScreen::new(
            &config(100, InsufficientFundsPolicy::Reject),
            &assets(vec![ticket("A", 10, 1), ticket("B", 20, 2)]),
        )
        .unwrap();
        screen.drain_events();
        screen.hide_config(1).unwrap();
        assert_eq!(screen.ledger().balance(), 100);
        assert!(
            !screen
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::PurchaseInterrupted { .. }))
        );
    }

    #[test]
    fn test_config_from_json_fills_defaults() {
        let config = GameConfig::from_json(r#"{ "seed": 9, "funds_policy": "ResetAndRedirect" }"#).unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.funds_policy, InsufficientFundsPolicy::ResetAndRedirect);
        assert_eq!(config.carousel.slot_count, DEFAULT_SLOT_COUNT);
        assert_eq!(config.currency.currency, DEFAULT_BALANCE);
    }
}
