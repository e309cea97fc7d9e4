//! Driving an embedded PDF renderer to a page and highlighting text
//!
//! The renderer mounts on its own schedule, so navigation is a small state
//! machine: poll readiness at a fixed interval up to a bounded number of
//! checks, navigate once, wait for the text layer, then ask for the text
//! highlight. [`NavigationTask`] is sans-IO and returns how long to wait
//! before the next step; callers supply the timer. Starting a new navigation
//! supersedes any older one still waiting.

use crate::config::NavigationConfig;
use crate::error::Degradation;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The subset of a PDF renderer this crate drives
pub trait PdfSurface {
    fn is_ready(&self) -> bool;

    fn go_to_page(&self, page: u32);

    /// Highlight matches of `text` on the current page; `false` if nothing matched
    fn highlight_text(&self, text: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavigationOutcome {
    /// Page shown and search text highlighted
    Highlighted { page: u32 },
    /// Page shown, nothing highlighted
    Navigated {
        page: u32,
        degradation: Option<Degradation>,
    },
    /// Renderer never became ready
    Abandoned { page: u32, checks: u32 },
    /// A newer navigation took over
    Superseded,
}

impl NavigationOutcome {
    pub fn degradation(&self) -> Option<Degradation> {
        match self {
            Self::Navigated { degradation, .. } => *degradation,
            Self::Abandoned { .. } => Some(Degradation::RendererNotReady),
            Self::Highlighted { .. } | Self::Superseded => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationStep {
    /// Call `step` again after this delay
    Wait(Duration),
    Done(NavigationOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Stage {
    AwaitingRenderer,
    AwaitingTextLayer,
    Done(NavigationOutcome),
}

#[derive(Debug, Clone)]
pub struct NavigationTask {
    generation: u64,
    page: u32,
    search_text: Option<String>,
    ready_checks: u32,
    stage: Stage,
}

impl NavigationTask {
    pub fn new(page: u32, search_text: Option<&str>) -> Self {
        Self {
            generation: 0,
            page,
            search_text: search_text
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            ready_checks: 0,
            stage: Stage::AwaitingRenderer,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn ready_checks(&self) -> u32 {
        self.ready_checks
    }

    pub fn is_done(&self) -> bool {
        matches!(self.stage, Stage::Done(_))
    }

    /// Advance by one event. Once done, keeps returning the same outcome.
    pub fn step<S: PdfSurface + ?Sized>(
        &mut self,
        surface: &S,
        config: &NavigationConfig,
    ) -> NavigationStep {
        match &self.stage {
            Stage::Done(outcome) => NavigationStep::Done(outcome.clone()),
            Stage::AwaitingRenderer => {
                self.ready_checks += 1;
                if !surface.is_ready() {
                    if self.ready_checks >= config.max_ready_checks.max(1) {
                        warn!(
                            page = self.page,
                            checks = self.ready_checks,
                            "PDF renderer never became ready; navigation abandoned"
                        );
                        return self.finish(NavigationOutcome::Abandoned {
                            page: self.page,
                            checks: self.ready_checks,
                        });
                    }
                    return NavigationStep::Wait(config.retry_interval);
                }

                surface.go_to_page(self.page);
                if self.search_text.is_none() {
                    return self.finish(NavigationOutcome::Navigated {
                        page: self.page,
                        degradation: None,
                    });
                }
                self.stage = Stage::AwaitingTextLayer;
                NavigationStep::Wait(config.highlight_delay)
            }
            Stage::AwaitingTextLayer => {
                let text = self.search_text.as_deref().unwrap_or_default();
                if surface.highlight_text(text) {
                    info!(page = self.page, "Evidence highlighted in PDF");
                    self.finish(NavigationOutcome::Highlighted { page: self.page })
                } else {
                    debug!(page = self.page, text, "Search text not found in PDF text layer");
                    self.finish(NavigationOutcome::Navigated {
                        page: self.page,
                        degradation: Some(Degradation::SearchTextNotFound),
                    })
                }
            }
        }
    }

    fn finish(&mut self, outcome: NavigationOutcome) -> NavigationStep {
        self.stage = Stage::Done(outcome.clone());
        NavigationStep::Done(outcome)
    }
}

/// Hands out navigation tasks and tracks which one is current.
/// Clones share the same generation counter.
#[derive(Debug, Clone, Default)]
pub struct PdfNavigationBridge {
    config: NavigationConfig,
    generation: Arc<AtomicU64>,
}

impl PdfNavigationBridge {
    pub fn new(config: NavigationConfig) -> Self {
        Self {
            config,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    /// Start a navigation, superseding any in progress
    pub fn begin(&self, page: u32, search_text: Option<&str>) -> NavigationTask {
        let mut task = NavigationTask::new(page, search_text);
        task.generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        task
    }

    /// Supersede any navigation in progress without starting a new one.
    /// Called whenever the highlight it was started for is replaced.
    pub fn cancel(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Pending navigation cancelled");
    }

    pub fn is_current(&self, task: &NavigationTask) -> bool {
        self.generation.load(Ordering::SeqCst) == task.generation
    }

    /// One step of `task`, or `Superseded` without touching the surface
    pub fn advance<S: PdfSurface + ?Sized>(
        &self,
        task: &mut NavigationTask,
        surface: &S,
    ) -> NavigationStep {
        if !task.is_done() && !self.is_current(task) {
            debug!(page = task.page, "Navigation superseded");
            return task.finish(NavigationOutcome::Superseded);
        }
        task.step(surface, &self.config)
    }

    /// Navigate `surface` to `page` and highlight `search_text`, waiting for
    /// the renderer with tokio timers
    #[cfg(feature = "server")]
    pub async fn go_to_and_highlight<S: PdfSurface + ?Sized>(
        &self,
        surface: &S,
        page: u32,
        search_text: Option<&str>,
    ) -> NavigationOutcome {
        let mut task = self.begin(page, search_text);
        loop {
            match self.advance(&mut task, surface) {
                NavigationStep::Wait(delay) => tokio::time::sleep(delay).await,
                NavigationStep::Done(outcome) => return outcome,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::{Cell, RefCell};

    /// Becomes ready after `ready_after` checks; highlights only `known` text
    struct FakeRenderer {
        ready_after: u32,
        checks: Cell<u32>,
        pages: RefCell<Vec<u32>>,
        searches: RefCell<Vec<String>>,
        known: &'static str,
    }

    impl FakeRenderer {
        fn new(ready_after: u32) -> Self {
            Self {
                ready_after,
                checks: Cell::new(0),
                pages: RefCell::new(vec![]),
                searches: RefCell::new(vec![]),
                known: "claimant name",
            }
        }
    }

    impl PdfSurface for FakeRenderer {
        fn is_ready(&self) -> bool {
            self.checks.set(self.checks.get() + 1);
            self.checks.get() > self.ready_after
        }

        fn go_to_page(&self, page: u32) {
            self.pages.borrow_mut().push(page);
        }

        fn highlight_text(&self, text: &str) -> bool {
            self.searches.borrow_mut().push(text.to_string());
            text == self.known
        }
    }

    fn config() -> NavigationConfig {
        NavigationConfig {
            retry_interval: Duration::from_millis(100),
            highlight_delay: Duration::from_millis(250),
            max_ready_checks: 5,
        }
    }

    #[test]
    fn test_ready_on_second_check_navigates_once() {
        let renderer = FakeRenderer::new(1);
        let mut task = NavigationTask::new(2, Some("claimant name"));

        assert_eq!(task.step(&renderer, &config()), NavigationStep::Wait(Duration::from_millis(100)));
        assert!(renderer.pages.borrow().is_empty());

        assert_eq!(task.step(&renderer, &config()), NavigationStep::Wait(Duration::from_millis(250)));
        assert_eq!(*renderer.pages.borrow(), vec![2]);

        assert_eq!(
            task.step(&renderer, &config()),
            NavigationStep::Done(NavigationOutcome::Highlighted { page: 2 })
        );
        assert_eq!(*renderer.pages.borrow(), vec![2]);
        assert_eq!(*renderer.searches.borrow(), vec!["claimant name".to_string()]);
    }

    #[test]
    fn test_gives_up_after_max_checks() {
        let renderer = FakeRenderer::new(u32::MAX);
        let mut task = NavigationTask::new(3, Some("x"));

        let mut waits = 0;
        let outcome = loop {
            match task.step(&renderer, &config()) {
                NavigationStep::Wait(_) => waits += 1,
                NavigationStep::Done(outcome) => break outcome,
            }
        };
        assert_eq!(outcome, NavigationOutcome::Abandoned { page: 3, checks: 5 });
        assert_eq!(outcome.degradation(), Some(Degradation::RendererNotReady));
        assert_eq!(waits, 4);
        assert!(renderer.pages.borrow().is_empty());
    }

    #[test]
    fn test_missing_text_is_silent_navigation() {
        let renderer = FakeRenderer::new(0);
        let mut task = NavigationTask::new(1, Some("AB9999"));
        task.step(&renderer, &config());
        let step = task.step(&renderer, &config());
        assert_eq!(
            step,
            NavigationStep::Done(NavigationOutcome::Navigated {
                page: 1,
                degradation: Some(Degradation::SearchTextNotFound),
            })
        );
    }

    #[test]
    fn test_no_search_text_skips_highlight() {
        let renderer = FakeRenderer::new(0);
        let mut task = NavigationTask::new(4, Some("  "));
        assert_eq!(
            task.step(&renderer, &config()),
            NavigationStep::Done(NavigationOutcome::Navigated { page: 4, degradation: None })
        );
        assert!(renderer.searches.borrow().is_empty());
    }

    #[test]
    fn test_newer_task_supersedes_older() {
        let bridge = PdfNavigationBridge::new(config());
        let renderer = FakeRenderer::new(3);

        let mut first = bridge.begin(1, Some("a"));
        assert!(matches!(bridge.advance(&mut first, &renderer), NavigationStep::Wait(_)));

        let mut second = bridge.begin(5, Some("claimant name"));
        assert_eq!(
            bridge.advance(&mut first, &renderer),
            NavigationStep::Done(NavigationOutcome::Superseded)
        );
        assert!(bridge.is_current(&second));
        assert!(matches!(bridge.advance(&mut second, &renderer), NavigationStep::Wait(_)));
    }

    #[test]
    fn test_cancel_supersedes_waiting_task() {
        let bridge = PdfNavigationBridge::new(config());
        let renderer = FakeRenderer::new(1);

        let mut task = bridge.begin(2, Some("claimant name"));
        assert!(matches!(bridge.advance(&mut task, &renderer), NavigationStep::Wait(_)));

        bridge.clone().cancel();
        assert!(!bridge.is_current(&task));
        assert_eq!(
            bridge.advance(&mut task, &renderer),
            NavigationStep::Done(NavigationOutcome::Superseded)
        );
        assert!(renderer.pages.borrow().is_empty());
        assert!(renderer.searches.borrow().is_empty());
    }

    #[test]
    fn test_done_task_repeats_outcome() {
        let renderer = FakeRenderer::new(0);
        let mut task = NavigationTask::new(2, None);
        let first = task.step(&renderer, &config());
        assert_eq!(task.step(&renderer, &config()), first);
        assert_eq!(*renderer.pages.borrow(), vec![2]);
    }
}
