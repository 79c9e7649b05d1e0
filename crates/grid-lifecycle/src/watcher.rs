//! Polling watcher that drives a reservation through its lifecycle.
//!
//! Each poll, including a cancellation it triggers, completes before the next
//! one starts. A watcher holds no mutable state of its own; independent
//! reservations can be watched concurrently by separate calls.

use std::sync::Arc;

use grid_core::{NextAction, Reservation, ReservationId, ReservationService, WorkloadResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::WatchConfig;
use crate::error::{LifecycleError, Result};
use crate::report::{FailureKind, FailureReport};
use crate::state::LifecycleState;

/// A reservation whose every workload posted a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Reservation concerned.
    pub reservation_id: ReservationId,
    /// Results as of the final poll.
    pub results: Vec<WorkloadResult>,
    /// States the watcher went through, ending in `FINISHED`.
    pub history: Vec<LifecycleState>,
}

/// Per-call progress of one watch.
struct Watch {
    id: ReservationId,
    state: Option<LifecycleState>,
    history: Vec<LifecycleState>,
    fetch_failures: u32,
    last_seen: Option<Reservation>,
}

impl Watch {
    const fn new(id: ReservationId) -> Self {
        Self {
            id,
            state: None,
            history: Vec::new(),
            fetch_failures: 0,
            last_seen: None,
        }
    }

    fn enter(&mut self, state: LifecycleState) {
        info!(reservation_id = %self.id, state = %state, "watching reservation");
        self.state = Some(state);
        self.history.push(state);
    }

    fn transition(&mut self, to: LifecycleState) -> Result<()> {
        match self.state {
            Some(from) if from.can_transition_to(&to) => {
                info!(reservation_id = %self.id, from = %from, to = %to, "state transition");
                self.state = Some(to);
                self.history.push(to);
                Ok(())
            }
            Some(from) => Err(LifecycleError::InvalidTransition { from, to }),
            None => {
                self.enter(to);
                Ok(())
            }
        }
    }
}

/// Watches reservations on a [`ReservationService`].
pub struct ReservationWatcher<R, C = SystemClock> {
    reservations: Arc<R>,
    clock: C,
    config: WatchConfig,
}

impl<R: ReservationService> ReservationWatcher<R, SystemClock> {
    /// Create a watcher using the system clock.
    pub fn new(reservations: Arc<R>, config: WatchConfig) -> Self {
        Self::with_clock(reservations, SystemClock, config)
    }
}

impl<R: ReservationService, C: Clock> ReservationWatcher<R, C> {
    /// Create a watcher reading time from `clock`.
    pub fn with_clock(reservations: Arc<R>, clock: C, config: WatchConfig) -> Self {
        Self {
            reservations,
            clock,
            config,
        }
    }

    /// The watcher configuration.
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Wait for payment if needed, then for deployment.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::NotActive`] if the reservation is neither waiting for
    /// payment nor deploying, [`LifecycleError::ReservationExpired`] or
    /// [`LifecycleError::ReservationFailed`] after cancelling it.
    pub async fn run(&self, id: ReservationId) -> Result<Deployment> {
        let mut watch = Watch::new(id);
        let reservation = self.fetch(&mut watch).await?;
        let entry = Self::entry_state(&reservation)?;
        watch.enter(entry);

        let reservation = match entry {
            LifecycleState::PaymentPending => self.await_payment(&mut watch, reservation).await?,
            _ => reservation,
        };
        self.await_deployment(&mut watch, reservation).await
    }

    /// Wait until the reservation leaves `PAY`.
    ///
    /// Returns the first snapshot showing the payment went through. A
    /// reservation already deploying is returned as is.
    ///
    /// # Errors
    ///
    /// As [`Self::run`]; expiry before payment cancels the reservation.
    pub async fn wait_for_payment(&self, id: ReservationId) -> Result<Reservation> {
        let mut watch = Watch::new(id);
        let reservation = self.fetch(&mut watch).await?;
        match Self::entry_state(&reservation)? {
            LifecycleState::PaymentPending => {
                watch.enter(LifecycleState::PaymentPending);
                self.await_payment(&mut watch, reservation).await
            }
            _ => Ok(reservation),
        }
    }

    /// Wait for a paid reservation to deploy.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::NotActive`] unless the reservation is deploying;
    /// otherwise as [`Self::run`].
    pub async fn wait_for_deployment(&self, id: ReservationId) -> Result<Deployment> {
        let mut watch = Watch::new(id);
        let reservation = self.fetch(&mut watch).await?;
        if reservation.next_action != NextAction::Deploy {
            return Err(LifecycleError::NotActive {
                reservation_id: id,
                next_action: reservation.next_action,
            });
        }
        watch.enter(LifecycleState::Provisioning);
        self.await_deployment(&mut watch, reservation).await
    }

    fn entry_state(reservation: &Reservation) -> Result<LifecycleState> {
        LifecycleState::from_next_action(reservation.next_action).ok_or(LifecycleError::NotActive {
            reservation_id: reservation.id,
            next_action: reservation.next_action,
        })
    }

    async fn await_payment(&self, watch: &mut Watch, mut reservation: Reservation) -> Result<Reservation> {
        loop {
            if reservation.next_action != NextAction::Pay {
                watch.transition(LifecycleState::Provisioning)?;
                return Ok(reservation);
            }
            if reservation.is_expired(self.clock.now_epoch()) {
                return Err(self.give_up(watch, &reservation, FailureKind::Expired).await);
            }
            reservation = self.refetch(watch).await?;
        }
    }

    async fn await_deployment(&self, watch: &mut Watch, mut reservation: Reservation) -> Result<Deployment> {
        loop {
            let expected = reservation.expected_result_count();
            debug!(
                reservation_id = %watch.id,
                results = reservation.results.len(),
                expected,
                "provisioning poll"
            );

            if reservation.has_failed() {
                return Err(self.give_up(watch, &reservation, FailureKind::Failed).await);
            }
            if reservation.is_deployed() {
                watch.transition(LifecycleState::Finished)?;
                return Ok(Deployment {
                    reservation_id: watch.id,
                    results: reservation.results,
                    history: std::mem::take(&mut watch.history),
                });
            }
            if reservation.is_expired(self.clock.now_epoch()) {
                return Err(self.give_up(watch, &reservation, FailureKind::Expired).await);
            }
            reservation = self.refetch(watch).await?;
        }
    }

    /// Move to the failure state, cancel once, and build the report.
    async fn give_up(&self, watch: &mut Watch, reservation: &Reservation, kind: FailureKind) -> LifecycleError {
        let state = match kind {
            FailureKind::Expired => LifecycleState::Expired,
            FailureKind::Failed => LifecycleState::Failed,
        };
        if let Err(e) = watch.transition(state) {
            return e;
        }

        let errors: Vec<WorkloadResult> = reservation.error_results().cloned().collect();
        warn!(
            reservation_id = %watch.id,
            state = %state,
            errors = errors.len(),
            "cancelling reservation"
        );
        // The reservation is abandoned either way.
        if let Err(e) = self.reservations.cancel_reservation(watch.id).await {
            warn!(reservation_id = %watch.id, error = %e, "cancellation failed");
        }
        if let Err(e) = watch.transition(LifecycleState::Cancelled) {
            return e;
        }

        let report = Box::new(FailureReport {
            reservation_id: watch.id,
            kind,
            errors,
            link: self.config.reservation_link(watch.id),
            history: std::mem::take(&mut watch.history),
        });
        match kind {
            FailureKind::Expired => LifecycleError::ReservationExpired(report),
            FailureKind::Failed => LifecycleError::ReservationFailed(report),
        }
    }

    async fn refetch(&self, watch: &mut Watch) -> Result<Reservation> {
        tokio::time::sleep(self.config.poll_interval).await;
        self.fetch(watch).await
    }

    /// Fetch the reservation, retrying failures every poll interval.
    ///
    /// While fetches fail, the deadline of the last snapshot seen still
    /// applies: once it passes the reservation expires.
    async fn fetch(&self, watch: &mut Watch) -> Result<Reservation> {
        loop {
            match self.reservations.get_reservation(watch.id).await {
                Ok(reservation) => {
                    watch.fetch_failures = 0;
                    watch.last_seen = Some(reservation.clone());
                    return Ok(reservation);
                }
                Err(e) => {
                    watch.fetch_failures += 1;
                    warn!(
                        reservation_id = %watch.id,
                        attempt = watch.fetch_failures,
                        error = %e,
                        "failed to fetch reservation"
                    );
                    let now = self.clock.now_epoch();
                    let expired = watch
                        .last_seen
                        .clone()
                        .filter(|last| watch.state.is_some() && last.is_expired(now));
                    if let Some(last) = expired {
                        return Err(self.give_up(watch, &last, FailureKind::Expired).await);
                    }
                    if self
                        .config
                        .max_fetch_failures
                        .is_some_and(|max| watch.fetch_failures >= max)
                    {
                        return Err(e.into());
                    }
                }
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}
