//! Pure voyage commands: `(Cruise, Command) -> (Cruise, Effects)`.
//!
//! Every accepted command yields a fresh cruise stamped with the commit time
//! and asks for a save. Refused commands leave the cruise untouched.

use tracing::debug;

use fueltrack_core::{
    is_sane_density, Cruise, DensityTable, EquipmentKey, FuelType, Leg, ModelError, Phase,
    ReadingSide, Report, ReportKind, Time, VoyageReport,
};

use crate::carry_over::{self, PhaseEndSnapshot, PhaseRef};
use crate::error::CommandError;
use crate::lifecycle::{self, Completion};

/// An edit requested by the front end.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Replace the whole cruise
    Replace(Box<Cruise>),
    /// Voyage header fields; `None` leaves a field as is
    SetInfo {
        /// Voyage name
        name: Option<String>,
        /// Vessel name
        vessel: Option<String>,
        /// `YYYY-MM-DD`
        start_date: Option<String>,
        /// `YYYY-MM-DD`
        end_date: Option<String>,
    },
    /// Append a leg seeded from the previous leg's closing counters
    AddLeg,
    /// Replace one leg
    UpdateLeg {
        /// Leg index
        index: usize,
        /// Replacement
        leg: Box<Leg>,
    },
    /// Remove one leg
    DeleteLeg {
        /// Leg index
        index: usize,
    },
    /// Replace one report; its kind is kept
    UpdateReport {
        /// Leg index
        leg: usize,
        /// Which report
        kind: ReportKind,
        /// Replacement
        report: Box<Report>,
    },
    /// Navigation data of a leg
    SetVoyageReport {
        /// Leg index
        leg: usize,
        /// Navigation data
        report: VoyageReport,
    },
    /// Add an operational phase before standby
    AddPhase {
        /// Leg index
        leg: usize,
        /// Which report
        kind: ReportKind,
    },
    /// Remove an operational phase
    DeletePhase(PhaseRef),
    /// Rename a phase
    RenamePhase {
        /// Phase address
        at: PhaseRef,
        /// New name
        name: String,
    },
    /// Phase remarks
    SetRemarks {
        /// Phase address
        at: PhaseRef,
        /// Remarks text
        remarks: String,
    },
    /// One counter reading
    SetReading {
        /// Phase address
        at: PhaseRef,
        /// Counter
        key: EquipmentKey,
        /// Start or end
        side: ReadingSide,
        /// Reading as entered
        value: String,
    },
    /// Fuel of one counter
    SetFuel {
        /// Phase address
        at: PhaseRef,
        /// Counter
        key: EquipmentKey,
        /// New fuel
        fuel: FuelType,
    },
    /// Override one density
    SetDensity {
        /// Fuel overridden
        fuel: FuelType,
        /// t/m3
        density: f64,
    },
    /// Replace the density table
    SetDensities(DensityTable),
    /// Confirmed carry-over with the engineer's key selection
    CarryOver {
        /// Tracked END readings
        source: PhaseEndSnapshot,
        /// Phase receiving them
        target: PhaseRef,
        /// Counters to write
        keys: Vec<EquipmentKey>,
    },
    /// Close the voyage
    Complete(Completion),
    /// Back to draft
    Reopen,
}

impl Command {
    fn allowed_when_completed(&self) -> bool {
        matches!(self, Command::Reopen)
    }
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Neutral
    Info,
    /// An action went through
    Success,
    /// Needs the engineer's attention
    Warning,
}

/// A message for the engineer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Text shown
    pub message: String,
}

impl Notice {
    /// Informational notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    /// Success notice.
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    /// Warning notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }
}

/// Side effects the caller must carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// (Re)start the autosave debounce
    ScheduleSave,
    /// Show a message
    Notify(Notice),
    /// A phase was edited; track it for carry-over
    PhaseEdited(PhaseRef),
    /// A carry-over was applied; forget the tracked phase
    CarryOverApplied,
}

/// Result of an accepted command.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// The new cruise, stamped
    pub cruise: Cruise,
    /// What the caller must do next
    pub effects: Vec<Effect>,
}

impl Outcome {
    fn new(cruise: Cruise, now: Time) -> Self {
        Self {
            cruise: cruise.committed(now),
            effects: vec![Effect::ScheduleSave],
        }
    }

    fn notify(mut self, notice: Notice) -> Self {
        self.effects.push(Effect::Notify(notice));
        self
    }

    fn edited(mut self, at: PhaseRef) -> Self {
        self.effects.push(Effect::PhaseEdited(at));
        self
    }
}

fn edit_phase(
    cruise: &Cruise,
    at: PhaseRef,
    f: impl FnOnce(&mut Phase),
) -> Result<Cruise, ModelError> {
    cruise.with_leg(at.leg, |leg| {
        leg.with_report(at.report, |report| report.with_phase(at.phase, f))
    })
}

/// Counter fuels a replacement report must still respect.
fn check_report(report: &Report) -> Result<(), ModelError> {
    for phase in report.phases.iter() {
        for (key, counter) in phase.equipment.iter() {
            if !key.allowed_fuels().contains(&counter.fuel) {
                return Err(ModelError::FuelNotAllowed {
                    key,
                    fuel: counter.fuel,
                });
            }
        }
    }
    Ok(())
}

fn check_leg(leg: &Leg) -> Result<(), ModelError> {
    check_report(&leg.departure)?;
    check_report(&leg.arrival)
}

fn check_densities(table: &DensityTable) -> Result<(), ModelError> {
    match table.entries().find(|(_, density)| !is_sane_density(*density)) {
        Some((fuel, density)) => Err(ModelError::InvalidDensity { fuel, density }),
        None => Ok(()),
    }
}

/// Apply a command to a cruise.
pub fn apply(cruise: &Cruise, command: Command, now: Time) -> Result<Outcome, CommandError> {
    if cruise.is_completed() && !command.allowed_when_completed() {
        return Err(CommandError::ReadOnly);
    }

    let outcome = match command {
        Command::Replace(next) => {
            check_densities(&next.densities)?;
            next.legs.iter().try_for_each(check_leg)?;
            let mut next = *next;
            // never stamp older than the cruise being replaced
            next.last_modified = next.last_modified.max(cruise.last_modified);
            Outcome::new(next, now)
        }

        Command::SetInfo {
            name,
            vessel,
            start_date,
            end_date,
        } => {
            let mut next = cruise.clone();
            if let Some(name) = name {
                next.name = name;
            }
            if let Some(vessel) = vessel {
                next.vessel = vessel;
            }
            if let Some(start_date) = start_date {
                next.start_date = start_date;
            }
            if let Some(end_date) = end_date {
                next.end_date = end_date;
            }
            Outcome::new(next, now)
        }

        Command::AddLeg => {
            let previous = cruise.legs.last();
            let mut next = cruise.clone();
            next.legs.push(Leg::following(previous));
            let message = if previous.is_some() {
                "New leg added with counters from previous leg"
            } else {
                "New leg added"
            };
            Outcome::new(next, now).notify(Notice::success(message))
        }

        Command::UpdateLeg { index, leg } => {
            check_leg(&leg)?;
            let next = cruise.with_leg(index, |_| Ok(*leg))?;
            Outcome::new(next, now)
        }

        Command::DeleteLeg { index } => {
            cruise.leg(index)?;
            let mut next = cruise.clone();
            next.legs.remove(index);
            Outcome::new(next, now).notify(Notice::info("Leg deleted"))
        }

        Command::UpdateReport { leg, kind, report } => {
            check_report(&report)?;
            let next = cruise.with_leg(leg, |l| {
                l.with_report(kind, |_| Ok(Report { kind, ..*report }))
            })?;
            Outcome::new(next, now)
        }

        Command::SetVoyageReport { leg, report } => {
            let next = cruise.with_leg(leg, |l| {
                Ok(Leg {
                    voyage_report: Some(report),
                    ..l.clone()
                })
            })?;
            Outcome::new(next, now)
        }

        Command::AddPhase { leg, kind } => {
            let mut added = None;
            let next = cruise.with_leg(leg, |l| {
                l.with_report(kind, |report| {
                    let (report, phase) = report.with_added_phase();
                    added = report
                        .phases
                        .position(phase.id)
                        .map(|index| PhaseRef::new(leg, kind, index));
                    Ok(report)
                })
            })?;
            let outcome = Outcome::new(next, now);
            match added {
                Some(at) => outcome.edited(at),
                None => outcome,
            }
        }

        Command::DeletePhase(at) => {
            let next = cruise.with_leg(at.leg, |leg| {
                leg.with_report(at.report, |report| report.without_phase(at.phase))
            })?;
            Outcome::new(next, now)
        }

        Command::RenamePhase { at, name } => {
            let next = edit_phase(cruise, at, |phase| phase.name = name)?;
            Outcome::new(next, now).edited(at)
        }

        Command::SetRemarks { at, remarks } => {
            let next = edit_phase(cruise, at, |phase| phase.remarks = remarks)?;
            Outcome::new(next, now).edited(at)
        }

        Command::SetReading {
            at,
            key,
            side,
            value,
        } => {
            let next = edit_phase(cruise, at, |phase| {
                phase.equipment.set_reading(key, side, value)
            })?;
            Outcome::new(next, now).edited(at)
        }

        Command::SetFuel { at, key, fuel } => {
            let mut result = Ok(());
            let next = edit_phase(cruise, at, |phase| {
                result = phase.equipment.set_fuel(key, fuel);
            })?;
            result?;
            Outcome::new(next, now).edited(at)
        }

        Command::SetDensity { fuel, density } => {
            let mut next = cruise.clone();
            next.densities.set(fuel, density)?;
            Outcome::new(next, now)
        }

        Command::SetDensities(table) => {
            let mut next = cruise.clone();
            for (fuel, density) in table.entries() {
                next.densities.set(fuel, density)?;
            }
            Outcome::new(next, now)
        }

        Command::CarryOver {
            source,
            target,
            keys,
        } => {
            let (next, written) = carry_over::apply(cruise, &source, target, &keys)?;
            let mut outcome = Outcome::new(next, now)
                .notify(Notice::success(format!("{} counter(s) carried over", written)));
            outcome.effects.push(Effect::CarryOverApplied);
            outcome
        }

        Command::Complete(completion) => {
            let next = lifecycle::complete(cruise, completion, now)?;
            Outcome::new(next, now).notify(Notice::success("Voyage completed successfully!"))
        }

        Command::Reopen => {
            let next = lifecycle::reopen(cruise)?;
            Outcome::new(next, now).notify(Notice::info("Voyage reopened for editing"))
        }
    };

    debug!(cruise = %outcome.cruise.id, "command applied");
    Ok(outcome)
}
