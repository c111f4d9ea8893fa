//! Balance label

use std::cell::RefCell;
use std::rc::Rc;

use crate::economy::Ledger;
use crate::signal::Subscription;

/// Text showing the current balance, kept in sync with a ledger
#[derive(Debug)]
pub struct CurrencyView {
    text: Rc<RefCell<String>>,
    _subscription: Subscription,
}

impl CurrencyView {
    pub fn bind(ledger: &Ledger) -> Self {
        let text = Rc::new(RefCell::new(ledger.balance().to_string()));
        let t = Rc::clone(&text);
        let subscription = ledger.on_change(move |balance| *t.borrow_mut() = balance.to_string());
        Self {
            text,
            _subscription: subscription,
        }
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::InsufficientFundsPolicy;

    #[test]
    fn test_label_follows_ledger() {
        let mut ledger = Ledger::new(100, InsufficientFundsPolicy::Reject);
        let view = CurrencyView::bind(&ledger);
        assert_eq!(view.text(), "100");
        ledger.spend_currency(30);
        assert_eq!(view.text(), "70");
        ledger.add_currency(5);
        assert_eq!(view.text(), "75");
    }

    #[test]
    fn test_dropped_view_unsubscribes() {
        let mut ledger = Ledger::new(10, InsufficientFundsPolicy::Reject);
        let view = CurrencyView::bind(&ledger);
        drop(view);
        ledger.add_currency(1);
        assert_eq!(ledger.balance(), 11);
    }
}
