//! Purchase cycle for one carousel slot
//!
//! A coordinator is bound per slot whenever the carousel refreshes its
//! content, capturing that slot's price and rolled prize. Signal handlers
//! only queue triggers; [`PurchaseCoordinator::process`] applies them with
//! mutable access to the ledger and carousel.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::audio::SoundEffects;
use crate::carousel::{Carousel, SlotId};
use crate::economy::Ledger;
use crate::error::{GameError, Result};
use crate::signal::Subscription;
use crate::ticket::TicketView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Buy,
    EraseCompleted,
}

type Inbox = Rc<RefCell<VecDeque<Trigger>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseState {
    /// Waiting for the buy click
    Idle,
    /// Ticket bought, cover not yet scratched off
    Scratching,
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Started { slot: SlotId, price: i64 },
    Completed { slot: SlotId, reward: i64 },
}

/// Everything a purchase step touches
pub struct PurchaseContext<'a> {
    pub ledger: &'a mut Ledger,
    pub carousel: &'a mut Carousel,
    pub sounds: &'a mut dyn SoundEffects,
}

#[derive(Debug)]
pub struct PurchaseCoordinator {
    slot: SlotId,
    price: i64,
    reward: i64,
    state: PurchaseState,
    inbox: Inbox,
    buy_subscription: Option<Subscription>,
    erase_subscription: Option<Subscription>,
}

impl PurchaseCoordinator {
    /// Wire the slot's buy button. Fails if the slot is not in the carousel.
    pub fn bind(slot: SlotId, price: i64, reward: i64, carousel: &Carousel) -> Result<Self> {
        let Some(view) = carousel.slot(slot) else {
            log::error!("Cannot bind purchase: slot {:?} is not in the carousel", slot);
            return Err(GameError::MissingSlot(slot));
        };

        let inbox: Inbox = Rc::new(RefCell::new(VecDeque::new()));
        let queue = Rc::clone(&inbox);
        let buy_subscription = view
            .buy_button()
            .on_clicked(move |_| queue.borrow_mut().push_back(Trigger::Buy));

        Ok(Self {
            slot,
            price,
            reward,
            state: PurchaseState::Idle,
            inbox,
            buy_subscription: Some(buy_subscription),
            erase_subscription: None,
        })
    }

    /// Bind to a slot using the price and prize it currently shows
    pub fn bind_view(view: &TicketView, carousel: &Carousel) -> Result<Self> {
        Self::bind(view.id(), view.price(), view.reward(), carousel)
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn price(&self) -> i64 {
        self.price
    }

    pub fn reward(&self) -> i64 {
        self.reward
    }

    pub fn state(&self) -> PurchaseState {
        self.state
    }

    pub fn is_scratching(&self) -> bool {
        self.state == PurchaseState::Scratching
    }

    /// Apply queued triggers in arrival order.
    ///
    /// A failed spend drops the remaining triggers and is returned as
    /// [`GameError::InsufficientFunds`].
    pub fn process(&mut self, ctx: &mut PurchaseContext<'_>) -> Result<Vec<PurchaseOutcome>> {
        let mut outcomes = Vec::new();
        loop {
            let next = self.inbox.borrow_mut().pop_front();
            let Some(trigger) = next else { break };
            let outcome = match trigger {
                Trigger::Buy => self.on_buy(ctx)?,
                Trigger::EraseCompleted => self.on_erase_completed(ctx)?,
            };
            outcomes.extend(outcome);
        }
        Ok(outcomes)
    }

    fn on_buy(&mut self, ctx: &mut PurchaseContext<'_>) -> Result<Option<PurchaseOutcome>> {
        if self.state != PurchaseState::Idle {
            log::debug!("Ignoring buy on slot {:?} in state {:?}", self.slot, self.state);
            return Ok(None);
        }
        if ctx.carousel.slot(self.slot).is_none() {
            return Err(GameError::MissingSlot(self.slot));
        }

        ctx.sounds.play_click_sound();

        let balance = ctx.ledger.balance();
        if !ctx.ledger.spend_currency(self.price) {
            self.inbox.borrow_mut().clear();
            return Err(GameError::InsufficientFunds {
                balance,
                price: self.price,
            });
        }

        ctx.carousel.set_swipe_locked(true);
        let view = ctx
            .carousel
            .slot_mut(self.slot)
            .ok_or(GameError::MissingSlot(self.slot))?;
        view.set_locked(false);
        view.set_buy_button(false);
        view.scratch_mut().set_active(true);

        let queue = Rc::clone(&self.inbox);
        self.erase_subscription = Some(
            view.scratch()
                .on_completed(move |_| queue.borrow_mut().push_back(Trigger::EraseCompleted)),
        );
        self.state = PurchaseState::Scratching;

        log::info!("Bought ticket on slot {:?} for {}", self.slot, self.price);
        Ok(Some(PurchaseOutcome::Started {
            slot: self.slot,
            price: self.price,
        }))
    }

    fn on_erase_completed(&mut self, ctx: &mut PurchaseContext<'_>) -> Result<Option<PurchaseOutcome>> {
        if self.state != PurchaseState::Scratching {
            return Ok(None);
        }

        ctx.sounds.play_click_sound();
        match self.reward {
            r if r > 0 => ctx.ledger.add_currency(r),
            r if r < 0 => {
                ctx.ledger.forfeit(-r);
            }
            _ => {}
        }

        ctx.carousel.set_swipe_locked(false);
        if let Some(view) = ctx.carousel.slot_mut(self.slot) {
            restore_view(view);
        }
        ctx.carousel.smooth_move_to_center();

        self.erase_subscription = None;
        self.state = PurchaseState::Idle;

        log::info!("Slot {:?} scratched, prize {}", self.slot, self.reward);
        Ok(Some(PurchaseOutcome::Completed {
            slot: self.slot,
            reward: self.reward,
        }))
    }

    /// Release every subscription. If a purchase was in progress the swipe
    /// lock is released and the slot restored; returns whether that happened.
    pub fn dispose(&mut self, carousel: &mut Carousel) -> bool {
        self.buy_subscription = None;
        self.erase_subscription = None;
        self.inbox.borrow_mut().clear();

        let interrupted = self.state == PurchaseState::Scratching;
        self.state = PurchaseState::Disposed;
        if interrupted {
            log::warn!("Purchase on slot {:?} interrupted", self.slot);
            carousel.set_swipe_locked(false);
            if let Some(view) = carousel.slot_mut(self.slot) {
                restore_view(view);
            }
        }
        interrupted
    }
}

fn restore_view(view: &mut TicketView) {
    view.set_locked(true);
    view.set_buy_button(true);
    let scratch = view.scratch_mut();
    scratch.reset_texture();
    scratch.set_active(false);
}
