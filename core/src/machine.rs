use chrono::TimeDelta;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::*;

/// Handle returned by the observer registrations, used to unsubscribe.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type StateObserver = Box<dyn FnMut(StateChange)>;
type RevealObserver = Box<dyn FnMut(&FortuneMessage)>;

/// Drives one fortune-cookie cycle: availability check, taps, crack, unroll, reveal.
///
/// The presentation layer calls the transition methods and watches the notifications; the
/// machine itself knows nothing of animation timing.
pub struct GameStateMachine<S, C> {
    catalog: MessageCatalog,
    availability: DailyAvailabilityStore<S>,
    clock: C,
    rules: Rules,
    rng: SmallRng,
    state: GameState,
    current_message: Option<FortuneMessage>,
    tap_count: u32,
    next_subscription: u64,
    state_observers: Vec<(SubscriptionId, StateObserver)>,
    reveal_observers: Vec<(SubscriptionId, RevealObserver)>,
}

impl<S: SaveStore, C: Clock> GameStateMachine<S, C> {
    /// Starts in [`GameState::Waiting`]; call [`Self::check_availability`] once observers are in
    /// place.
    pub fn new(
        catalog: MessageCatalog,
        availability: DailyAvailabilityStore<S>,
        clock: C,
        rules: Rules,
        seed: u64,
    ) -> Self {
        Self {
            catalog,
            availability,
            clock,
            rules,
            rng: SmallRng::seed_from_u64(seed),
            state: GameState::default(),
            current_message: None,
            tap_count: 0,
            next_subscription: 0,
            state_observers: Vec::new(),
            reveal_observers: Vec::new(),
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    /// Fortune drawn for the current cycle, if any.
    pub fn current_message(&self) -> Option<&FortuneMessage> {
        self.current_message.as_ref()
    }

    pub fn tap_count(&self) -> u32 {
        self.tap_count
    }

    pub fn taps_required(&self) -> u32 {
        self.rules.taps_required
    }

    pub fn availability(&self) -> &DailyAvailabilityStore<S> {
        &self.availability
    }

    /// Settings toggles go through here; the reveal record does not.
    pub fn availability_mut(&mut self) -> &mut DailyAvailabilityStore<S> {
        &mut self.availability
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn time_until_next(&self) -> TimeDelta {
        self.availability.time_until_next(self.clock.now())
    }

    pub fn on_state_changed(&mut self, observer: impl FnMut(StateChange) + 'static) -> SubscriptionId {
        let id = self.next_subscription_id();
        self.state_observers.push((id, Box::new(observer)));
        id
    }

    pub fn on_message_revealed(
        &mut self,
        observer: impl FnMut(&FortuneMessage) + 'static,
    ) -> SubscriptionId {
        let id = self.next_subscription_id();
        self.reveal_observers.push((id, Box::new(observer)));
        id
    }

    /// Removes an observer of either kind. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.state_observers.len() + self.reveal_observers.len();
        self.state_observers.retain(|(observer_id, _)| *observer_id != id);
        self.reveal_observers.retain(|(observer_id, _)| *observer_id != id);
        before != self.state_observers.len() + self.reveal_observers.len()
    }

    /// Moves to [`GameState::CookieAvailable`] when the daily cookie is unlocked, drawing its
    /// fortune, or to [`GameState::Waiting`] otherwise.
    ///
    /// A cycle already past the taps (cracking or rolled) is left alone, since its fortune is
    /// drawn but not yet recorded.
    pub fn check_availability(&mut self) -> Result<GameState> {
        use GameState::*;

        if matches!(self.state, Cracking | MessageRolled) {
            log::debug!("Cycle in progress ({:?}), availability unchanged", self.state);
            return Ok(self.state);
        }

        if self.availability.is_available(self.clock.now()) {
            if self.state != CookieAvailable || self.current_message.is_none() {
                let message = self
                    .catalog
                    .select(self.availability.seen_message_ids(), &mut self.rng)?
                    .clone();
                log::debug!("Drew fortune {}", message.id);
                self.current_message = Some(message);
                self.tap_count = 0;
            }
            self.set_state(CookieAvailable);
        } else {
            self.current_message = None;
            self.tap_count = 0;
            self.set_state(Waiting);
        }
        Ok(self.state)
    }

    /// Counts a tap while the cookie is tappable, cracking it once enough taps were made.
    pub fn tap_cookie(&mut self) -> TapOutcome {
        if !self.state.accepts_taps() {
            return TapOutcome::Ignored;
        }

        self.tap_count = self.tap_count.saturating_add(1);
        if self.tap_count >= self.rules.taps_required {
            self.set_state(GameState::Cracking);
            TapOutcome::Cracked
        } else {
            TapOutcome::Counted(self.tap_count)
        }
    }

    /// The break animation finished.
    pub fn on_crack_animation_complete(&mut self) -> TransitionOutcome {
        if self.state != GameState::Cracking {
            return TransitionOutcome::NoChange;
        }
        self.tap_count = 0;
        self.set_state(GameState::MessageRolled);
        TransitionOutcome::Changed
    }

    /// The unroll gesture completed; records the reveal and notifies reveal observers.
    pub fn on_message_fully_unrolled(&mut self) -> TransitionOutcome {
        if self.state != GameState::MessageRolled {
            return TransitionOutcome::NoChange;
        }
        let Some(message) = self.current_message.clone() else {
            log::warn!("Message unrolled without a drawn fortune");
            return TransitionOutcome::NoChange;
        };

        self.set_state(GameState::MessageRevealed);
        self.availability.record_opened(self.clock.now(), &message);
        log::info!("Revealed fortune {}", message.id);
        for (_, observer) in self.reveal_observers.iter_mut() {
            observer(&message);
        }
        TransitionOutcome::Changed
    }

    /// Abandons the current cycle and re-evaluates availability from scratch.
    pub fn reset_for_next_day(&mut self) -> Result<GameState> {
        self.current_message = None;
        self.tap_count = 0;
        self.set_state(GameState::Waiting);
        self.check_availability()
    }

    fn set_state(&mut self, state: GameState) {
        if self.state == state {
            return;
        }
        let change = StateChange {
            from: self.state,
            to: state,
        };
        self.state = state;
        log::debug!("State {:?} -> {:?}", change.from, change.to);
        for (_, observer) in self.state_observers.iter_mut() {
            observer(change);
        }
    }

    fn next_subscription_id(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        id
    }
}
