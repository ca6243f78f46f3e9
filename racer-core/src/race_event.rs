use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::lap_info::{CheckpointOrder, LapNumber, RacePhase};
use crate::AgentID;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub enum RaceEvent {
    PhaseChanged {
        from: RacePhase,
        to: RacePhase,
    },
    CountdownTick {
        remaining: u32,
    },
    Go,
    CheckpointCrossed {
        order: CheckpointOrder,
        next_expected: CheckpointOrder,
    },
    CheckpointRejected {
        order: Option<CheckpointOrder>,
        reason: String,
    },
    LapCompleted {
        lap: LapNumber,
    },
    RaceFinished {
        laps: LapNumber,
    },
    AbilityActivated {
        agent: AgentID,
        position: DVec2,
    },
    StuckRecovery {
        agent: AgentID,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RaceEventKind {
    PhaseChanged,
    CountdownTick,
    Go,
    CheckpointCrossed,
    CheckpointRejected,
    LapCompleted,
    RaceFinished,
    AbilityActivated,
    StuckRecovery,
}

impl RaceEvent {
    pub fn kind(&self) -> RaceEventKind {
        match self {
            RaceEvent::PhaseChanged { .. } => RaceEventKind::PhaseChanged,
            RaceEvent::CountdownTick { .. } => RaceEventKind::CountdownTick,
            RaceEvent::Go => RaceEventKind::Go,
            RaceEvent::CheckpointCrossed { .. } => RaceEventKind::CheckpointCrossed,
            RaceEvent::CheckpointRejected { .. } => RaceEventKind::CheckpointRejected,
            RaceEvent::LapCompleted { .. } => RaceEventKind::LapCompleted,
            RaceEvent::RaceFinished { .. } => RaceEventKind::RaceFinished,
            RaceEvent::AbilityActivated { .. } => RaceEventKind::AbilityActivated,
            RaceEvent::StuckRecovery { .. } => RaceEventKind::StuckRecovery,
        }
    }
}
