//! Exclusive arbitration over physical controls.
//!
//! Several unrelated UI elements may want sole ownership of the same
//! physical button (both want to render "press B"). Each registers an
//! [`ExclusiveClaim`] naming the controls it wants; the arbiter recomputes
//! ownership on every registration and destruction so that exactly one
//! live claim owns any contested control. Highest priority wins; on a
//! priority tie the claim registered first wins.

use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::logging::{event_with_fields, json_kv, LogLevel, Logger};
use crate::metrics::FrameMetrics;

use super::virtual_device::PhysicalControl;

/// Ordered claim strength, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClaimPriority {
    Minimum,
    Low,
    Normal,
    High,
    Maximum,
}

type ClaimSeq = u64;

struct ClaimRecord {
    seq: ClaimSeq,
    label: String,
    priority: ClaimPriority,
    wanted: Vec<PhysicalControl>,
    active: Vec<PhysicalControl>,
}

struct ArbiterState {
    next_seq: ClaimSeq,
    claims: Vec<ClaimRecord>,
    passes: u64,
    logger: Logger,
    metrics: Option<Arc<Mutex<FrameMetrics>>>,
}

impl ArbiterState {
    fn record_index(&self, seq: ClaimSeq) -> Option<usize> {
        self.claims.iter().position(|c| c.seq == seq)
    }

    /// One arbitration pass: O(claims * controls-per-claim).
    ///
    /// Claims are stored in registration order, so keeping the incumbent
    /// on an equal-priority comparison yields the first-registered
    /// tie-break for free.
    fn rearbitrate(&mut self) {
        self.passes = self.passes.saturating_add(1);
        if let Some(metrics) = &self.metrics {
            let mut guard = metrics.lock().unwrap_or_else(|e| e.into_inner());
            guard.record_arbitration();
        }

        let mut winners: Vec<(PhysicalControl, usize)> = Vec::new();
        for (index, claim) in self.claims.iter().enumerate() {
            for control in &claim.wanted {
                match winners.iter_mut().find(|(c, _)| c == control) {
                    None => winners.push((*control, index)),
                    Some((_, best)) => {
                        if claim.priority > self.claims[*best].priority {
                            *best = index;
                        }
                    }
                }
            }
        }

        for claim in self.claims.iter_mut() {
            claim.active.clear();
        }
        for (control, index) in winners {
            self.claims[index].active.push(control);
        }
    }

    fn log_lifecycle(&self, action: &str, label: &str, priority: ClaimPriority) {
        let _ = self.logger.log_event(event_with_fields(
            LogLevel::Debug,
            "ui::arbiter",
            action,
            [
                json_kv("claim", label),
                json_kv("priority", format!("{priority:?}")),
                json_kv("live_claims", json!(self.claims.len())),
            ],
        ));
    }
}

/// Shared arbitration table. Cloning hands out another handle to the same
/// table, so claims created from any clone contend with each other.
#[derive(Clone)]
pub struct BindingArbiter {
    inner: Arc<Mutex<ArbiterState>>,
}

impl BindingArbiter {
    pub fn new() -> Self {
        Self::with_logger(Logger::noop())
    }

    pub fn with_logger(logger: Logger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ArbiterState {
                next_seq: 0,
                claims: Vec::new(),
                passes: 0,
                logger,
                metrics: None,
            })),
        }
    }

    /// Accumulate arbitration passes into a shared counter set, the same
    /// handle `RootConfig` carries.
    pub fn with_metrics(self, metrics: Arc<Mutex<FrameMetrics>>) -> Self {
        {
            let mut state = self.lock();
            state.metrics = Some(metrics);
        }
        self
    }

    /// Register a claim over a set of physical controls and re-run
    /// arbitration. The returned handle releases the claim when dropped.
    pub fn claim(
        &self,
        label: impl Into<String>,
        priority: ClaimPriority,
        controls: Vec<PhysicalControl>,
    ) -> ExclusiveClaim {
        let label = label.into();
        let mut state = self.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.claims.push(ClaimRecord {
            seq,
            label: label.clone(),
            priority,
            wanted: controls,
            active: Vec::new(),
        });
        state.rearbitrate();
        state.log_lifecycle("claim_registered", &label, priority);
        ExclusiveClaim {
            seq,
            arbiter: Arc::clone(&self.inner),
        }
    }

    /// Number of live claims.
    pub fn claim_count(&self) -> usize {
        self.lock().claims.len()
    }

    /// Arbitration passes run so far.
    pub fn passes(&self) -> u64 {
        self.lock().passes
    }

    /// Label of the claim currently owning a control, if any.
    pub fn owner_of(&self, control: PhysicalControl) -> Option<String> {
        let state = self.lock();
        state
            .claims
            .iter()
            .find(|c| c.active.contains(&control))
            .map(|c| c.label.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ArbiterState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for BindingArbiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Live claim handle. Dropping it un-registers the claim and re-runs
/// arbitration so the next-highest contender inherits the controls.
pub struct ExclusiveClaim {
    seq: ClaimSeq,
    arbiter: Arc<Mutex<ArbiterState>>,
}

impl ExclusiveClaim {
    fn lock(&self) -> std::sync::MutexGuard<'_, ArbiterState> {
        self.arbiter.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The claim currently owns at least one of its wanted controls.
    pub fn is_active(&self) -> bool {
        let state = self.lock();
        match state.record_index(self.seq) {
            Some(index) => !state.claims[index].active.is_empty(),
            None => false,
        }
    }

    /// The claim currently owns this specific control.
    pub fn owns(&self, control: PhysicalControl) -> bool {
        let state = self.lock();
        match state.record_index(self.seq) {
            Some(index) => state.claims[index].active.contains(&control),
            None => false,
        }
    }

    /// Controls this claim owns right now, for prompt rendering.
    pub fn active_controls(&self) -> Vec<PhysicalControl> {
        let state = self.lock();
        match state.record_index(self.seq) {
            Some(index) => state.claims[index].active.clone(),
            None => Vec::new(),
        }
    }

    pub fn label(&self) -> String {
        let state = self.lock();
        match state.record_index(self.seq) {
            Some(index) => state.claims[index].label.clone(),
            None => String::new(),
        }
    }

    pub fn priority(&self) -> Option<ClaimPriority> {
        let state = self.lock();
        state
            .record_index(self.seq)
            .map(|index| state.claims[index].priority)
    }
}

impl Drop for ExclusiveClaim {
    fn drop(&mut self) {
        let mut state = self.lock();
        if let Some(index) = state.record_index(self.seq) {
            let record = state.claims.remove(index);
            state.rearbitrate();
            state.log_lifecycle("claim_released", &record.label, record.priority);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(index: u16) -> PhysicalControl {
        PhysicalControl::button(1, index)
    }

    #[test]
    fn single_claim_owns_its_controls() {
        let arbiter = BindingArbiter::new();
        let claim = arbiter.claim("jump_prompt", ClaimPriority::Normal, vec![button(0)]);
        assert!(claim.is_active());
        assert!(claim.owns(button(0)));
        assert_eq!(arbiter.owner_of(button(0)).as_deref(), Some("jump_prompt"));
    }

    #[test]
    fn higher_priority_steals_contested_control() {
        let arbiter = BindingArbiter::new();
        let low = arbiter.claim("hud", ClaimPriority::Low, vec![button(0)]);
        assert!(low.is_active());

        let high = arbiter.claim("modal", ClaimPriority::High, vec![button(0)]);
        assert!(high.owns(button(0)));
        assert!(!low.is_active());
    }

    #[test]
    fn ties_go_to_the_first_registered() {
        let arbiter = BindingArbiter::new();
        let first = arbiter.claim("first", ClaimPriority::Normal, vec![button(3)]);
        let second = arbiter.claim("second", ClaimPriority::Normal, vec![button(3)]);
        assert!(first.owns(button(3)));
        assert!(!second.is_active());
    }

    #[test]
    fn dropping_the_winner_promotes_the_next_claim() {
        let arbiter = BindingArbiter::new();
        let low = arbiter.claim("hud", ClaimPriority::Low, vec![button(0)]);
        let high = arbiter.claim("modal", ClaimPriority::Maximum, vec![button(0)]);
        assert!(!low.is_active());

        drop(high);
        assert!(low.owns(button(0)));
        assert_eq!(arbiter.claim_count(), 1);
    }

    #[test]
    fn disjoint_claims_never_contend() {
        let arbiter = BindingArbiter::new();
        let a = arbiter.claim("a", ClaimPriority::Minimum, vec![button(0)]);
        let b = arbiter.claim("b", ClaimPriority::Maximum, vec![button(1)]);
        assert!(a.owns(button(0)));
        assert!(b.owns(button(1)));
    }

    #[test]
    fn partial_overlap_splits_ownership() {
        let arbiter = BindingArbiter::new();
        let wide = arbiter.claim(
            "wide",
            ClaimPriority::Low,
            vec![button(0), button(1)],
        );
        let narrow = arbiter.claim("narrow", ClaimPriority::High, vec![button(1)]);

        assert!(wide.owns(button(0)));
        assert!(!wide.owns(button(1)));
        assert!(narrow.owns(button(1)));
        assert_eq!(wide.active_controls(), vec![button(0)]);
    }

    #[test]
    fn passes_accumulate_into_shared_metrics() {
        use std::time::Duration;

        let metrics = Arc::new(Mutex::new(FrameMetrics::new()));
        let arbiter = BindingArbiter::new().with_metrics(Arc::clone(&metrics));
        let a = arbiter.claim("a", ClaimPriority::Normal, vec![button(0)]);
        let b = arbiter.claim("b", ClaimPriority::High, vec![button(0)]);
        drop(a);
        drop(b);

        assert_eq!(arbiter.passes(), 4);
        let snap = metrics.lock().unwrap().snapshot(Duration::ZERO);
        assert_eq!(snap.arbitration_passes, 4);
    }

    #[test]
    fn arbitration_runs_once_per_lifecycle_event() {
        let arbiter = BindingArbiter::new();
        let a = arbiter.claim("a", ClaimPriority::Normal, vec![button(0)]);
        let b = arbiter.claim("b", ClaimPriority::Normal, vec![button(0)]);
        assert_eq!(arbiter.passes(), 2);
        drop(a);
        drop(b);
        assert_eq!(arbiter.passes(), 4);
    }
}
