//! Event-kind → handler table.

use std::collections::HashMap;

use log::trace;

use crate::session::{self, Session};
use crate::types::{EventKind, ServerEvent};

pub type Handler = fn(&mut Session, ServerEvent);

/// Routes each [`ServerEvent`] to the handler registered for its kind.
///
/// Events whose kind has no handler are dropped.
#[derive(Default, Clone)]
pub struct Dispatcher {
    handlers: HashMap<EventKind, Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`, replacing any previous one.
    pub fn on(mut self, kind: EventKind, handler: Handler) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    /// The dashboard's table: every kind goes to its [`Session`] handler.
    pub fn standard() -> Self {
        Self::new()
            .on(EventKind::EegData, session::on_eeg_data)
            .on(EventKind::Status, session::on_status)
            .on(EventKind::Error, session::on_error)
            .on(EventKind::LinkUp, session::on_link_up)
            .on(EventKind::LinkDown, session::on_link_down)
    }

    /// Run the handler for `event`.  Returns `false` when none is registered.
    pub fn dispatch(&self, session: &mut Session, event: ServerEvent) -> bool {
        let kind = event.kind();
        match self.handlers.get(&kind) {
            Some(handler) => {
                handler(session, event);
                true
            }
            None => {
                trace!("no handler for {kind:?}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashConfig;
    use crate::session::NoticeLevel;
    use crate::types::EegUpdate;

    #[test]
    fn standard_table_routes_all_kinds() {
        let d = Dispatcher::standard();
        let mut s = Session::new(&DashConfig::default());

        assert!(d.dispatch(&mut s, ServerEvent::LinkUp));
        assert!(s.link_up());

        let update = EegUpdate {
            raw_data: [("TP9", 0.1)].into_iter().collect(),
            ..EegUpdate::default()
        };
        assert!(d.dispatch(&mut s, ServerEvent::EegData(update)));
        assert_eq!(s.history().len(), 1);

        assert!(d.dispatch(&mut s, ServerEvent::Error("boom".into())));
        let last = s.notifications().last().map(|n| (n.level, n.message.clone()));
        assert_eq!(last, Some((NoticeLevel::Error, "Server error: boom".into())));

        assert!(d.dispatch(&mut s, ServerEvent::LinkDown));
        assert!(!s.link_up());
    }

    #[test]
    fn unregistered_kind_is_dropped() {
        let d = Dispatcher::new().on(EventKind::LinkUp, |s, _| s.wipe_history());
        let mut s = Session::new(&DashConfig::default());
        assert!(!d.dispatch(&mut s, ServerEvent::Status("hi".into())));
        assert_eq!(s.notifications().count(), 0);
    }

    #[test]
    fn later_registration_wins() {
        fn noop(_: &mut Session, _: ServerEvent) {}
        let d = Dispatcher::standard().on(EventKind::EegData, noop);
        let mut s = Session::new(&DashConfig::default());
        let update = EegUpdate {
            raw_data: [("TP9", 0.1)].into_iter().collect(),
            ..EegUpdate::default()
        };
        d.dispatch(&mut s, ServerEvent::EegData(update));
        assert!(s.history().is_empty());
    }
}
