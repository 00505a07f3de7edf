use std::fmt;

use crate::maneuver::PlanId;
use crate::model::BodyId;

/// Something observers may want to re-render after.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// One simulation step happened (bodies moved).
    Ticked,
    FreezeChanged(bool),
    ShowDeltaVChanged(bool),
    TargetAngleChanged(f64),
    BodyChanged(BodyId),
    /// A node was registered, and wants its delta-v controls shown.
    PlanRegistered(PlanId),
    PlanUpdated(PlanId),
    PlanAborted(PlanId),
    BurnStarted(PlanId),
    BurnCompleted(PlanId),
    PlansRemoved(Vec<PlanId>),
}

pub type Listener = Box<dyn FnMut(&Notification)>;

/// Synchronous observer list. Listeners run in the order they were added.
#[derive(Default)]
pub struct Dispatcher {
    listeners: Vec<Listener>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: impl FnMut(&Notification) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn dispatch(&mut self, notification: Notification) {
        for listener in self.listeners.iter_mut() {
            listener(&notification);
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_registration_order() {
        let log = Rc::new(RefCell::new(vec![]));
        let mut dispatcher = Dispatcher::new();

        for tag in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            dispatcher.add_listener(move |n| log.borrow_mut().push((tag, n.clone())));
        }
        assert_eq!(dispatcher.len(), 3);

        dispatcher.dispatch(Notification::FreezeChanged(false));
        dispatcher.dispatch(Notification::PlanUpdated(PlanId(4)));

        let log = log.borrow();
        let tags: Vec<&str> = log.iter().map(|(tag, _)| *tag).collect();
        assert_eq!(tags, vec!["first", "second", "third", "first", "second", "third"]);
        assert_eq!(log[0].1, Notification::FreezeChanged(false));
        assert_eq!(log[5].1, Notification::PlanUpdated(PlanId(4)));
    }
}
