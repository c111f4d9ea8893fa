//! Currency ledger
//!
//! Holds the player's balance for a game-screen session. Every change is
//! pushed to subscribers of [`Ledger::on_change`].

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_BALANCE;
use crate::signal::{Signal, Subscription};

/// What happens when a spend exceeds the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InsufficientFundsPolicy {
    /// Leave the balance untouched and report failure
    #[default]
    Reject,
    /// Zero the balance and ask the app to return to the main menu
    ResetAndRedirect,
}

/// Starting balance for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    pub currency: i64,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            currency: DEFAULT_BALANCE,
        }
    }
}

/// Integer balance with change notification
#[derive(Debug)]
pub struct Ledger {
    balance: i64,
    policy: InsufficientFundsPolicy,
    on_change: Signal<i64>,
    on_redirect: Signal<()>,
}

impl Ledger {
    pub fn new(initial_balance: i64, policy: InsufficientFundsPolicy) -> Self {
        Self {
            balance: initial_balance,
            policy,
            on_change: Signal::new(),
            on_redirect: Signal::new(),
        }
    }

    pub fn from_config(config: &CurrencyConfig, policy: InsufficientFundsPolicy) -> Self {
        Self::new(config.currency, policy)
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn policy(&self) -> InsufficientFundsPolicy {
        self.policy
    }

    /// Observe balance changes (receives the new balance)
    pub fn on_change(&self, listener: impl FnMut(&i64) + 'static) -> Subscription {
        self.on_change.subscribe(listener)
    }

    /// Observe redirect-to-menu requests raised under
    /// [`InsufficientFundsPolicy::ResetAndRedirect`]
    pub fn on_redirect(&self, listener: impl FnMut(&()) + 'static) -> Subscription {
        self.on_redirect.subscribe(listener)
    }

    pub fn add_currency(&mut self, amount: i64) {
        if amount <= 0 {
            log::warn!("add_currency called with non-positive amount {}", amount);
            return;
        }
        self.balance += amount;
        self.on_change.emit(&self.balance);
    }

    /// Spend `amount` if the balance covers it.
    ///
    /// Returns `false` when funds are short; what happens to the balance then
    /// depends on the configured [`InsufficientFundsPolicy`].
    pub fn spend_currency(&mut self, amount: i64) -> bool {
        if amount <= 0 {
            log::warn!("spend_currency called with non-positive amount {}", amount);
            return false;
        }

        if self.balance >= amount {
            self.balance -= amount;
            self.on_change.emit(&self.balance);
            return true;
        }

        match self.policy {
            InsufficientFundsPolicy::Reject => {
                log::info!(
                    "Spend of {} rejected, balance is {}",
                    amount,
                    self.balance
                );
            }
            InsufficientFundsPolicy::ResetAndRedirect => {
                log::info!(
                    "Spend of {} exceeds balance {}, resetting and returning to menu",
                    amount,
                    self.balance
                );
                self.balance = 0;
                self.on_change.emit(&self.balance);
                self.on_redirect.emit(&());
            }
        }
        false
    }

    /// Take a negative prize. Never drives the balance below zero and never
    /// triggers the insufficient-funds policy.
    pub fn forfeit(&mut self, amount: i64) -> i64 {
        if amount <= 0 {
            log::warn!("forfeit called with non-positive amount {}", amount);
            return 0;
        }
        let taken = amount.min(self.balance);
        if taken > 0 {
            self.balance -= taken;
            self.on_change.emit(&self.balance);
        }
        taken
    }
}
