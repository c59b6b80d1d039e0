//! Enable/disable contract around the injector and the scanner
//!
//! Content-script lifecycle:
//! 1. [`DarkMode::preload`] at document start (stylesheet first, no flash)
//! 2. [`DarkMode::apply_flag`] once the stored flag is read
//! 3. [`DarkMode::handle_message`] for every live toggle from the popup
//! 4. [`DarkMode::dispatch`] for every host callback

use crate::config::ScanSchedule;
use crate::error::MessageError;
use crate::host::{Host, Wakeup};
use crate::injector;
use crate::scanner::Session;
use crate::toggle::RuntimeMessage;
use tracing::{debug, info, trace};

pub struct DarkMode<H: Host> {
    host: H,
    schedule: ScanSchedule,
    session: Option<Session<H::Node>>,
    /// Activated while the document was still loading
    start_pending: bool,
}

impl<H: Host> DarkMode<H> {
    pub fn new(host: H, schedule: ScanSchedule) -> Self {
        Self {
            host,
            schedule,
            session: None,
            start_pending: false,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn session(&self) -> Option<&Session<H::Node>> {
        self.session.as_ref()
    }

    /// Scanner running or waiting for DOM-ready
    pub fn is_active(&self) -> bool {
        self.session.is_some() || self.start_pending
    }

    /// Inject the stylesheet ahead of the flag read
    pub fn preload(&mut self) {
        injector::inject(&mut self.host);
    }

    pub fn apply_flag(&mut self, enabled: bool) {
        info!(enabled, "Stored flag read");
        if enabled {
            self.activate();
        } else {
            self.deactivate();
        }
    }

    /// Inject the stylesheet and start the scanner; no-op while active
    pub fn activate(&mut self) {
        injector::inject(&mut self.host);
        if self.is_active() {
            trace!("Already active");
            return;
        }
        if self.host.is_loading() {
            debug!("Document loading, scanner deferred to DOM ready");
            self.start_pending = true;
            self.host.request_dom_ready();
        } else {
            self.start();
        }
    }

    /// Stop the scanner, restore inline styles and remove the stylesheet
    pub fn deactivate(&mut self) {
        self.start_pending = false;
        if let Some(session) = self.session.take() {
            session.stop(&mut self.host);
        }
        injector::remove(&mut self.host);
    }

    /// Apply a raw runtime message; non-toggle actions are ignored
    pub fn handle_message(&mut self, raw: &str) -> Result<(), MessageError> {
        match RuntimeMessage::parse(raw)? {
            RuntimeMessage::Toggle { enabled } => {
                info!(enabled, "Toggle received");
                if enabled {
                    self.activate();
                } else {
                    self.deactivate();
                }
            }
            RuntimeMessage::Other => debug!(raw, "Ignoring runtime message"),
        }
        Ok(())
    }

    pub fn dispatch(&mut self, wakeup: Wakeup<H::Node>) {
        match wakeup {
            Wakeup::DomReady => {
                if self.start_pending {
                    self.start_pending = false;
                    self.start();
                }
            }
            other => match self.session.as_mut() {
                Some(session) => session.handle(&mut self.host, other),
                None => trace!(?other, "Wakeup after deactivation ignored"),
            },
        }
    }

    fn start(&mut self) {
        let session = Session::start(&mut self.host, self.schedule.clone());
        self.session = Some(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StyleProperty;
    use crate::host::TimerId;
    use crate::sim::{ElementSpec, MemoryHost, PageFixture};
    use crate::theme::colors;

    const URL: &str = "https://www.espn.com/nfl/boxscore/_/gameId/401";

    fn page() -> ElementSpec {
        ElementSpec::new("html").child(
            ElementSpec::new("body")
                .id("body")
                .background("#ffffff")
                .child(ElementSpec::new("div").id("feed").background("#f4f4f4"))
                .child(ElementSpec::new("div").id("promo")),
        )
    }

    fn active() -> DarkMode<MemoryHost> {
        let mut dm = DarkMode::new(MemoryHost::new(page(), URL), ScanSchedule::default());
        dm.activate();
        dm
    }

    fn pending(dm: &DarkMode<MemoryHost>) -> usize {
        dm.session().map_or(0, |s| s.pending_timers())
    }

    #[test]
    fn activation_sweeps_and_schedules() {
        let dm = active();
        assert_eq!(dm.host().stylesheet_count(), 1);
        let body = dm.host().find_by_id("body").unwrap();
        assert_eq!(
            dm.host().inline(body, StyleProperty::BackgroundColor),
            Some(colors::BG_0)
        );
        // 11 back-off timeouts, the periodic interval and the navigation poll
        assert_eq!(pending(&dm), 13);
        assert_eq!(dm.host().pending_timer_count(), 13);
        assert!(dm.host().is_observing());
    }

    #[test]
    fn activate_twice_is_a_no_op() {
        let mut dm = active();
        dm.activate();
        assert_eq!(dm.host().stylesheet_count(), 1);
        assert_eq!(dm.host().observer_connects(), 1);
        assert_eq!(pending(&dm), 13);
    }

    #[test]
    fn periodic_sweeps_stop_after_configured_ticks() {
        let mut dm = active();
        let settle = dm.schedule.settle_time_ms();
        dm.advance(settle);

        let session = dm.session().unwrap();
        assert_eq!(session.periodic_runs(), 15);
        // Only the navigation poll is left
        assert_eq!(session.pending_timers(), 1);
        assert_eq!(dm.host().pending_timer_count(), 1);

        dm.advance(10_000);
        assert_eq!(dm.session().unwrap().periodic_runs(), 15);
    }

    #[test]
    fn navigation_schedules_resweeps() {
        let mut dm = active();
        let settle = dm.schedule.settle_time_ms();
        dm.advance(settle);

        dm.advance(500);
        assert_eq!(pending(&dm), 1);

        dm.host_mut().navigate("https://www.espn.com/nfl/scoreboard");
        dm.advance(500);
        // The zero-delay sweep already ran
        assert_eq!(pending(&dm), 6);
        dm.advance(4_000);
        assert_eq!(pending(&dm), 1);
    }

    #[test]
    fn inserted_subtree_is_swept_with_followup() {
        let mut dm = active();
        let settle = dm.schedule.settle_time_ms();
        dm.advance(settle);
        let feed = dm.host().find_by_id("feed").unwrap();
        let before = pending(&dm);

        let card = dm.host_mut().append(
            feed,
            ElementSpec::new("section")
                .id("card")
                .background("#eeeeee")
                .child(ElementSpec::new("p").id("blurb").background("#e8e8e8")),
        );
        dm.settle();

        let blurb = dm.host().find_by_id("blurb").unwrap();
        assert!(dm.host().inline(card, StyleProperty::BackgroundColor).is_some());
        assert!(dm.host().inline(blurb, StyleProperty::BackgroundColor).is_some());
        assert_eq!(pending(&dm), before + 1);

        dm.advance(100);
        assert_eq!(pending(&dm), before);
    }

    #[test]
    fn page_restyle_is_corrected() {
        let mut dm = active();
        let promo = dm.host().find_by_id("promo").unwrap();
        assert_eq!(dm.host().inline(promo, StyleProperty::BackgroundColor), None);

        dm.host_mut().set_class(promo, "Card");
        dm.host_mut().set_background(promo, "#fdfdfd");
        dm.settle();
        assert_eq!(
            dm.host().inline(promo, StyleProperty::BackgroundColor),
            Some(colors::BG_1)
        );
    }

    #[test]
    fn deactivation_restores_page() {
        let mut dm = active();
        let feed = dm.host().find_by_id("feed").unwrap();
        let list = dm.host_mut().append(feed, ElementSpec::new("ul").background("#ffffff"));
        for _ in 0..3 {
            dm.host_mut().append(
                list,
                ElementSpec::new("li")
                    .background("#fafafa")
                    .child(ElementSpec::new("span").color("#111111")),
            );
        }
        dm.advance(3_000);
        assert!(dm.host().overridden_count() > 5);

        dm.deactivate();
        assert!(!dm.is_active());
        assert_eq!(dm.host().overridden_count(), 0);
        assert_eq!(dm.host().stylesheet_count(), 0);
        assert_eq!(dm.host().pending_timer_count(), 0);
        assert!(!dm.host().is_observing());

        let body = dm.host().find_by_id("body").unwrap();
        dm.host_mut().append(body, ElementSpec::new("div").background("#ffffff"));
        assert_eq!(dm.advance(60_000), 0);
        assert_eq!(dm.host().overridden_count(), 0);
    }

    #[test]
    fn start_waits_for_dom_ready() {
        let mut dm = DarkMode::new(MemoryHost::loading(page(), URL), ScanSchedule::default());
        dm.preload();
        dm.apply_flag(true);
        assert!(dm.is_active());
        assert!(dm.session().is_none());
        assert_eq!(dm.host().stylesheet_count(), 1);

        dm.settle();
        assert!(dm.session().is_none());

        dm.host_mut().finish_loading();
        dm.settle();
        assert!(dm.session().is_some());
        assert_eq!(dm.host().observer_connects(), 1);
    }

    #[test]
    fn disable_before_dom_ready_cancels_start() {
        let mut dm = DarkMode::new(MemoryHost::loading(page(), URL), ScanSchedule::default());
        dm.activate();
        dm.deactivate();
        dm.host_mut().finish_loading();
        dm.settle();
        assert!(dm.session().is_none());
        assert_eq!(dm.host().overridden_count(), 0);
    }

    #[test]
    fn stored_flag_off_leaves_page_alone() {
        let mut dm = DarkMode::new(MemoryHost::new(page(), URL), ScanSchedule::default());
        dm.preload();
        dm.apply_flag(false);
        assert_eq!(dm.host().stylesheet_count(), 0);
        assert_eq!(dm.host().overridden_count(), 0);
        assert!(!dm.is_active());
    }

    #[test]
    fn toggle_messages() {
        let mut dm = active();
        dm.handle_message(r#"{"action":"toggle","enabled":false}"#).unwrap();
        assert!(!dm.is_active());
        assert_eq!(dm.host().stylesheet_count(), 0);

        dm.handle_message(r#"{"action":"toggle","enabled":true}"#).unwrap();
        assert!(dm.session().is_some());
        assert_eq!(dm.host().observer_connects(), 2);

        dm.handle_message(r#"{"action":"refresh"}"#).unwrap();
        assert!(dm.is_active());
        assert!(dm.handle_message("{").is_err());
    }

    #[test]
    fn stale_wakeups_are_ignored() {
        let mut dm = active();
        dm.dispatch(Wakeup::Timer(TimerId(9_999)));
        assert_eq!(pending(&dm), 13);

        dm.deactivate();
        dm.dispatch(Wakeup::Timer(TimerId(1)));
        dm.dispatch(Wakeup::DomReady);
        assert!(dm.session().is_none());
    }

    #[test]
    fn replays_boxscore_fixture() {
        let fixture = PageFixture::from_json(include_str!("../demos/boxscore.json")).unwrap();
        let mut dm = DarkMode::new(fixture.into_host(), ScanSchedule::default());
        dm.preload();
        dm.activate();
        let settle = dm.schedule.settle_time_ms();
        dm.advance(settle);

        let host = dm.host();
        let first = |class: &str| host.find_by_class(class)[0];
        let bg = |class: &str| host.inline(first(class), StyleProperty::BackgroundColor);

        assert_eq!(bg("Card__Header"), Some(colors::BG_1));
        assert_eq!(
            host.inline(first("Card__Header"), StyleProperty::BackgroundImage),
            Some("none")
        );
        assert_eq!(bg("BoxscoreItem__TeamName"), Some(colors::BG_1));
        assert_eq!(bg("Table__TH"), Some(colors::BG_2));
        assert_eq!(bg("Table__TR--totals"), Some(colors::BG_2));
        assert_eq!(bg("Table__TD"), Some("transparent"));
        assert_eq!(bg("ScoreCell"), Some(colors::BG_2));
        assert_eq!(bg("global-nav"), Some(colors::BG_1));
        assert_eq!(bg("logo"), None);
        assert_eq!(
            host.inline(first("sidebar"), StyleProperty::BorderColor),
            Some(colors::BORDER)
        );
        assert!(host.report().iter().all(|r| r.tag != "PATH" && r.tag != "SVG"));
    }
}
