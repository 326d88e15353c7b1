//! Front-end state around the pure command layer.

use tracing::{info, warn};

use fueltrack_core::{
    is_blank, route_filename, sort_newest_first, voyage_filename, Cruise, CruiseId,
    EquipmentKey, EquipmentValues, Leg, ReadingSide, Time,
};

use crate::carry_over::{self, CarryOverTarget, PhaseEndSnapshot, ResolutionFailure};
use crate::commands::{self, Command, Effect, Notice};
use crate::error::CommandError;

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Voyage list
    #[default]
    List,
    /// Editing the active voyage
    Edit,
}

/// Outcome of asking the user for a voyage directory.
#[derive(Debug)]
pub enum DirectoryChoice<T> {
    /// A directory was picked and read
    Chosen(T),
    /// The picker was dismissed
    Cancelled,
    /// Reading the directory failed
    Failed(String),
}

/// Details entered for a new voyage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVoyage {
    /// `YYYY-MM-DD`
    pub start_date: String,
    /// Departure port of the first leg
    pub from_port: String,
    /// Arrival port of the first leg
    pub to_port: String,
}

impl NewVoyage {
    /// "`from` to `to`"
    pub fn name(&self) -> String {
        format!("{} to {}", self.from_port.trim(), self.to_port.trim())
    }
}

/// What happened after [`Session::new_voyage`].
#[derive(Debug, Clone, PartialEq)]
pub enum NewVoyageStep {
    /// The voyage is open for editing
    Ready,
    /// Counters from the last voyage may be imported first
    ImportOffered {
        /// END readings of the last voyage's closing phase
        counters: EquipmentValues,
    },
}

/// Editor state: the active voyage, the voyage list, and what the engineer
/// is in the middle of.
#[derive(Debug, Default)]
pub struct Session {
    view: View,
    active: Option<Cruise>,
    voyages: Vec<Cruise>,
    directory_open: bool,
    recovery: Option<Cruise>,
    pending_new: Option<Cruise>,
    last_edited: Option<PhaseEndSnapshot>,
}

impl Session {
    /// Fresh session with no directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Screen to show.
    pub fn view(&self) -> View {
        self.view
    }

    /// Voyage being edited.
    pub fn active(&self) -> Option<&Cruise> {
        self.active.as_ref()
    }

    /// Voyages in the open directory, newest first.
    pub fn voyages(&self) -> &[Cruise] {
        &self.voyages
    }

    /// Whether a voyage directory has been chosen.
    pub fn directory_open(&self) -> bool {
        self.directory_open
    }

    /// Phase tracked for carry-over.
    pub fn last_edited(&self) -> Option<&PhaseEndSnapshot> {
        self.last_edited.as_ref()
    }

    // === Recovery ===

    /// Offer a recovered draft. Ignored once a directory is open.
    pub fn offer_recovery(&mut self, candidate: Option<Cruise>) {
        if self.directory_open {
            return;
        }
        self.recovery = candidate;
    }

    /// Pending recovery offer.
    pub fn recovery(&self) -> Option<&Cruise> {
        self.recovery.as_ref()
    }

    /// Open the offered draft in the editor.
    pub fn recover(&mut self) -> Option<&Cruise> {
        let cruise = self.recovery.take()?;
        info!(cruise = %cruise.id, "voyage recovered from backup");
        self.activate(cruise);
        self.active.as_ref()
    }

    /// Drop the offer. Returns the backup id the caller must delete.
    pub fn dismiss_recovery(&mut self) -> Option<CruiseId> {
        self.recovery.take().map(|cruise| cruise.id)
    }

    // === Directory ===

    /// Handle the result of choosing a directory.
    ///
    /// Cancelling changes nothing and reports nothing. A failure is returned
    /// as a notice.
    pub fn directory_chosen(&mut self, choice: DirectoryChoice<Vec<Cruise>>) -> Option<Notice> {
        match choice {
            DirectoryChoice::Chosen(mut voyages) => {
                sort_newest_first(&mut voyages);
                let message = format!("Loaded {} voyages", voyages.len());
                self.voyages = voyages;
                self.directory_open = true;
                self.recovery = None;
                Some(Notice::success(message))
            }
            DirectoryChoice::Cancelled => None,
            DirectoryChoice::Failed(reason) => {
                warn!(%reason, "failed to load voyage directory");
                Some(Notice::warning("Failed to load voyage directory"))
            }
        }
    }

    /// Open a listed voyage.
    pub fn open(&mut self, id: CruiseId) -> Result<&Cruise, CommandError> {
        let cruise = self
            .voyages
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| CommandError::NotFound(id.to_string()))?;
        self.activate(cruise);
        self.active.as_ref().ok_or(CommandError::NoActiveVoyage)
    }

    /// Leave the editor.
    pub fn close(&mut self) {
        self.active = None;
        self.last_edited = None;
        self.view = View::List;
    }

    fn activate(&mut self, mut cruise: Cruise) {
        if cruise.filename.is_none() {
            cruise.filename = Some(voyage_filename(&cruise));
        }
        self.active = Some(cruise);
        self.last_edited = None;
        self.pending_new = None;
        self.view = View::Edit;
    }

    // === New voyage ===

    /// Start a new voyage.
    ///
    /// With other voyages listed, the engineer is first offered the closing
    /// counters of the newest one.
    pub fn new_voyage(&mut self, details: &NewVoyage) -> NewVoyageStep {
        let mut cruise = Cruise::new();
        cruise.name = details.name();
        cruise.start_date = details.start_date.clone();
        cruise.filename = Some(route_filename(
            &details.start_date,
            &details.from_port,
            &details.to_port,
        ));

        let counters = self
            .voyages
            .first()
            .and_then(|last| last.legs.last())
            .map(Leg::closing_counters);

        match counters {
            Some(counters) if !self.voyages.is_empty() => {
                self.pending_new = Some(cruise);
                NewVoyageStep::ImportOffered { counters }
            }
            _ => {
                self.activate(cruise);
                NewVoyageStep::Ready
            }
        }
    }

    /// Create the pending voyage without imported counters.
    pub fn start_fresh(&mut self) -> Option<&Cruise> {
        let cruise = self.pending_new.take()?;
        self.activate(cruise);
        self.active.as_ref()
    }

    /// Create the pending voyage with one leg whose first departure phase
    /// starts from the selected counters. Keys without a value are skipped.
    pub fn import_counters(
        &mut self,
        counters: &EquipmentValues,
        selection: &[EquipmentKey],
    ) -> Option<(&Cruise, usize)> {
        let mut cruise = self.pending_new.take()?;
        let mut leg = Leg::new();
        let mut imported = 0;
        if let Some(first) = leg.departure.phases.get_mut(0) {
            for key in selection {
                if let Some(value) = counters.get(key).filter(|v| !is_blank(v)) {
                    first
                        .equipment
                        .set_reading(*key, ReadingSide::Start, value.clone());
                    imported += 1;
                }
            }
        }
        cruise.legs.push(leg);
        self.activate(cruise);
        self.active.as_ref().map(|c| (c, imported))
    }

    // === Editing ===

    /// Apply a command to the active voyage.
    ///
    /// On success the active voyage and its list entry are replaced and the
    /// carry-over tracking is updated. Returns the effects the caller still
    /// has to carry out.
    pub fn apply(&mut self, command: Command, now: Time) -> Result<Vec<Effect>, CommandError> {
        let current = self.active.as_ref().ok_or(CommandError::NoActiveVoyage)?;
        let outcome = commands::apply(current, command, now)?;
        let cruise = outcome.cruise;

        self.last_edited = self
            .last_edited
            .as_ref()
            .and_then(|snapshot| snapshot.refresh(&cruise));
        for effect in &outcome.effects {
            match effect {
                Effect::PhaseEdited(at) => {
                    if let Some(snapshot) = PhaseEndSnapshot::capture(&cruise, *at) {
                        self.last_edited = Some(snapshot);
                    }
                }
                Effect::CarryOverApplied => self.last_edited = None,
                _ => {}
            }
        }

        if let Some(entry) = self.voyages.iter_mut().find(|c| c.id == cruise.id) {
            *entry = cruise.clone();
        }
        self.active = Some(cruise);
        Ok(outcome.effects)
    }

    /// The phase the tracked END readings would go to.
    pub fn carry_over_candidate(&self) -> Result<CarryOverTarget, ResolutionFailure> {
        let cruise = self.active.as_ref().ok_or(ResolutionFailure::NothingEdited)?;
        carry_over::resolve(cruise, self.last_edited.as_ref())
    }

    /// Carry the tracked END readings over for the selected keys.
    pub fn confirm_carry_over(
        &mut self,
        keys: &[EquipmentKey],
        now: Time,
    ) -> Result<Vec<Effect>, CommandError> {
        let target = match self.carry_over_candidate() {
            Ok(target) => target,
            Err(failure) => return Ok(vec![Effect::Notify(Notice::warning(failure.to_string()))]),
        };
        let source = self
            .last_edited
            .clone()
            .ok_or(CommandError::NoActiveVoyage)?;
        self.apply(
            Command::CarryOver {
                source,
                target: target.at,
                keys: keys.to_vec(),
            },
            now,
        )
    }
}
