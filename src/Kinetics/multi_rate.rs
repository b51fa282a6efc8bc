//! Evaluator registries: all rate laws of one kind are copied into a flat store
//! and evaluated in one pass sharing per-condition data.
//!
//! A front-end rate law and its copy in the store are connected by a [`RateLink`]
//! holding the registry id, the slot and the sending end of the registry's update
//! channel. Setters of a linked rate law apply the change to themselves and send
//! the same update to the registry, which applies pending updates before the
//! next evaluation pass. Linking a rate law into another registry sends a retire
//! message to the one it leaves, so a rate law occupies one active slot at most.
//!
//! ```
//! use KiTheRates::Kinetics::arrhenius::ArrheniusRate;
//! use KiTheRates::Kinetics::multi_rate::MultiRate;
//! use KiTheRates::Kinetics::rate_api::RateLaw;
//! let mut registry: MultiRate<ArrheniusRate> = MultiRate::new();
//! let mut rate = ArrheniusRate::new(1.0e10, 0.5, 4.0e7);
//! let slot = registry.link(&mut rate);
//! rate.set_pre_exponential_factor(2.0e10);
//! let k = registry.evaluate_all(1000.0, 101325.0);
//! assert_eq!(k[slot], ArrheniusRate::new(2.0e10, 0.5, 4.0e7).eval_at(1000.0, 101325.0));
//! ```
use crate::Kinetics::arrhenius::ArrheniusRate;
use crate::Kinetics::chebyshev::ChebyshevRate;
use crate::Kinetics::custom_rate::CustomFuncRate;
use crate::Kinetics::plog::PlogRate;
use crate::Kinetics::rate_api::{RateKind, RateLaw, ReactionRate};
use crate::Kinetics::rate_data::RateData;
use crate::Kinetics::rate_errors::RateError;
use log::{debug, warn};
use prettytable::{Cell, Row, Table};
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};

/// Identity of one evaluator registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistryId(u64);

impl RegistryId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        RegistryId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Message from front-end rate laws to their registry.
#[derive(Debug, Clone)]
pub enum SlotMessage<U> {
    Update(usize, U),
    /// the rate law of this slot was linked elsewhere
    Retire(usize),
}

/// Association of a front-end rate law with its slot in a registry.
/// Clones of a linked rate law share the link.
#[derive(Debug, Clone)]
pub enum RateLink<U> {
    Unlinked,
    Linked {
        registry: RegistryId,
        slot: usize,
        updates: Sender<SlotMessage<U>>,
    },
}

impl<U> Default for RateLink<U> {
    fn default() -> Self {
        RateLink::Unlinked
    }
}

impl<U> RateLink<U> {
    /// slot of the rate law in its registry
    pub fn index(&self) -> Result<usize, RateError> {
        match self {
            RateLink::Linked { slot, .. } => Ok(*slot),
            RateLink::Unlinked => Err(RateError::Linkage(
                "rate is not linked to a rate evaluator".to_string(),
            )),
        }
    }
    pub fn registry(&self) -> Option<RegistryId> {
        match self {
            RateLink::Linked { registry, .. } => Some(*registry),
            RateLink::Unlinked => None,
        }
    }
    pub fn is_linked(&self) -> bool {
        matches!(self, RateLink::Linked { .. })
    }
    /// forwards an update already applied to the front end to the registry copy
    pub fn propagate(&self, update: U) {
        if let RateLink::Linked {
            registry,
            slot,
            updates,
        } = self
        {
            if updates.send(SlotMessage::Update(*slot, update)).is_err() {
                warn!(
                    "registry {} was dropped, update for slot {} is lost",
                    registry, slot
                );
            }
        }
    }
    /// asks the registry to deactivate the slot on its next sync
    fn retire(&self) {
        if let RateLink::Linked {
            registry,
            slot,
            updates,
        } = self
        {
            if updates.send(SlotMessage::Retire(*slot)).is_err() {
                debug!("registry {} was dropped before slot {} was retired", registry, slot);
            }
        }
    }
}

/// A rate law that can be stored in a [`MultiRate`] and evaluated in batches.
pub trait BatchRate: Clone + Debug {
    /// per-condition data shared by all rates of this kind
    type Data: RateData;
    /// mutation message sent from the front end to the registry copy
    type Update: Clone + Debug + Send + 'static;
    const KIND: RateKind;

    fn eval(&self, data: &Self::Data) -> f64;
    fn apply_update(&mut self, update: Self::Update);
    fn rate_link(&self) -> &RateLink<Self::Update>;
    fn rate_link_mut(&mut self) -> &mut RateLink<Self::Update>;
}

/// Kind-homogeneous store of rate-law copies with shared evaluation data.
/// Retired slots (released or re-linked) are not reused and evaluate to NaN.
#[derive(Debug)]
pub struct MultiRate<R: BatchRate> {
    id: RegistryId,
    rates: Vec<R>,
    active: Vec<bool>,
    shared: R::Data,
    sender: Sender<SlotMessage<R::Update>>,
    receiver: Receiver<SlotMessage<R::Update>>,
}

impl<R: BatchRate> Default for MultiRate<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: BatchRate> MultiRate<R> {
    pub fn new() -> Self {
        let (sender, receiver) = channel();
        Self {
            id: RegistryId::next(),
            rates: Vec::new(),
            active: Vec::new(),
            shared: R::Data::empty(),
            sender,
            receiver,
        }
    }
    pub fn id(&self) -> RegistryId {
        self.id
    }
    /// number of slots, retired ones included
    pub fn len(&self) -> usize {
        self.rates.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|a| **a).count()
    }
    pub fn is_active(&self, slot: usize) -> bool {
        self.active.get(slot).copied().unwrap_or(false)
    }

    /// Stores a copy of the rate's current state and links the rate to the new slot.
    /// A previous link is overwritten and its slot retired: at once if it pointed into
    /// this registry, on the next sync of the other registry otherwise.
    pub fn link(&mut self, rate: &mut R) -> usize {
        if let RateLink::Linked { registry, slot, .. } = rate.rate_link() {
            if *registry == self.id {
                self.active[*slot] = false;
                debug!("{} rate relinked in registry {}, slot {} retired", R::KIND, self.id, slot);
            } else {
                warn!("{} rate moves from registry {} to {}", R::KIND, registry, self.id);
                rate.rate_link().retire();
            }
        }
        let mut copy = rate.clone();
        *copy.rate_link_mut() = RateLink::Unlinked;
        let slot = self.rates.len();
        self.rates.push(copy);
        self.active.push(true);
        *rate.rate_link_mut() = RateLink::Linked {
            registry: self.id,
            slot,
            updates: self.sender.clone(),
        };
        debug!("{} rate linked to registry {} at slot {}", R::KIND, self.id, slot);
        slot
    }

    /// Unlinks the rate and retires its slot. Unlinked rates are left alone.
    pub fn release(&mut self, rate: &mut R) -> Result<(), RateError> {
        let (registry, slot) = match rate.rate_link() {
            RateLink::Unlinked => return Ok(()),
            RateLink::Linked { registry, slot, .. } => (*registry, *slot),
        };
        if registry != self.id {
            return Err(RateError::Linkage(format!(
                "rate is linked to registry {}, not to {}",
                registry, self.id
            )));
        }
        self.active[slot] = false;
        *rate.rate_link_mut() = RateLink::Unlinked;
        debug!("{} rate released from registry {}, slot {}", R::KIND, self.id, slot);
        Ok(())
    }

    /// internal copy of an active slot
    pub fn rate(&self, slot: usize) -> Option<&R> {
        if self.is_active(slot) {
            self.rates.get(slot)
        } else {
            None
        }
    }
    pub(crate) fn rate_at(&mut self, slot: usize) -> Option<&mut R> {
        if self.is_active(slot) {
            self.rates.get_mut(slot)
        } else {
            None
        }
    }

    /// Applies pending front-end messages in the order they were sent; returns how many
    /// updates were applied.
    pub fn sync(&mut self) -> usize {
        let id = self.id;
        let mut applied = 0;
        while let Ok(message) = self.receiver.try_recv() {
            match message {
                SlotMessage::Update(slot, update) => match self.rate_at(slot) {
                    Some(rate) => {
                        rate.apply_update(update);
                        applied += 1;
                    }
                    None => debug!("dropping update for retired slot {} of registry {}", slot, id),
                },
                SlotMessage::Retire(slot) => {
                    if let Some(active) = self.active.get_mut(slot) {
                        *active = false;
                        debug!("{} rate left registry {}, slot {} retired", R::KIND, id, slot);
                    }
                }
            }
        }
        applied
    }

    pub fn shared_data(&self) -> &R::Data {
        &self.shared
    }

    /// one value per slot, in slot order
    pub fn evaluate_all(&mut self, temperature: f64, pressure: f64) -> Vec<f64> {
        self.sync();
        self.shared.update(temperature, pressure);
        self.rates
            .iter()
            .zip(&self.active)
            .map(|(rate, active)| {
                if *active {
                    rate.eval(&self.shared)
                } else {
                    f64::NAN
                }
            })
            .collect()
    }
}

/// Rate constants of one batch pass, grouped by kind and indexed by slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateValues {
    pub arrhenius: Vec<f64>,
    pub plog: Vec<f64>,
    pub chebyshev: Vec<f64>,
    pub custom: Vec<f64>,
}

impl RateValues {
    pub fn by_kind(&self, kind: RateKind) -> &[f64] {
        match kind {
            RateKind::Arrhenius => &self.arrhenius,
            RateKind::PressureDependentArrhenius => &self.plog,
            RateKind::Chebyshev => &self.chebyshev,
            RateKind::CustomFunction => &self.custom,
        }
    }
    /// value computed for a linked rate law
    pub fn value_of(&self, rate: &ReactionRate) -> Result<f64, RateError> {
        let slot = rate.index()?;
        self.by_kind(rate.kind()).get(slot).copied().ok_or_else(|| {
            RateError::Linkage(format!(
                "slot {} of {} rates was not evaluated in this pass",
                slot,
                rate.kind()
            ))
        })
    }
}

/// One registry per kind of rate law.
#[derive(Debug, Default)]
pub struct RateEvaluators {
    pub arrhenius: MultiRate<ArrheniusRate>,
    pub plog: MultiRate<PlogRate>,
    pub chebyshev: MultiRate<ChebyshevRate>,
    pub custom: MultiRate<CustomFuncRate>,
}

impl RateEvaluators {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn link(&mut self, rate: &mut ReactionRate) -> usize {
        match rate {
            ReactionRate::Arrhenius(r) => self.arrhenius.link(r),
            ReactionRate::Plog(r) => self.plog.link(r),
            ReactionRate::Chebyshev(r) => self.chebyshev.link(r),
            ReactionRate::Custom(r) => self.custom.link(r),
        }
    }
    pub fn release(&mut self, rate: &mut ReactionRate) -> Result<(), RateError> {
        match rate {
            ReactionRate::Arrhenius(r) => self.arrhenius.release(r),
            ReactionRate::Plog(r) => self.plog.release(r),
            ReactionRate::Chebyshev(r) => self.chebyshev.release(r),
            ReactionRate::Custom(r) => self.custom.release(r),
        }
    }
    pub fn evaluate_all(&mut self, temperature: f64, pressure: f64) -> RateValues {
        let values = RateValues {
            arrhenius: self.arrhenius.evaluate_all(temperature, pressure),
            plog: self.plog.evaluate_all(temperature, pressure),
            chebyshev: self.chebyshev.evaluate_all(temperature, pressure),
            custom: self.custom.evaluate_all(temperature, pressure),
        };
        debug!(
            "evaluated {} rates at T = {} K, P = {} Pa",
            values.arrhenius.len() + values.plog.len() + values.chebyshev.len() + values.custom.len(),
            temperature,
            pressure
        );
        values
    }

    /// table of rate constants of all active slots
    pub fn rate_table(&mut self, temperature: f64, pressure: f64) -> Table {
        let values = self.evaluate_all(temperature, pressure);
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::new("type"),
            Cell::new("slot"),
            Cell::new(&format!("k(T = {} K, P = {} Pa)", temperature, pressure)),
        ]));
        let groups = [
            (RateKind::Arrhenius, &self.arrhenius.active),
            (RateKind::PressureDependentArrhenius, &self.plog.active),
            (RateKind::Chebyshev, &self.chebyshev.active),
            (RateKind::CustomFunction, &self.custom.active),
        ];
        for (kind, active) in groups {
            for (slot, k) in values.by_kind(kind).iter().enumerate() {
                if active[slot] {
                    table.add_row(Row::new(vec![
                        Cell::new(&kind.to_string()),
                        Cell::new(&slot.to_string()),
                        Cell::new(&format!("{:e}", k)),
                    ]));
                }
            }
        }
        table
    }
    pub fn pretty_print(&mut self, temperature: f64, pressure: f64) {
        self.rate_table(temperature, pressure).printstd();
    }
}
