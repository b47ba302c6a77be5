//! Legacy unit migration state machine.
//!
//! ```text
//! Legacy ──ShadowStarted──▶ ShadowActive ──ShadowExited──▶ Stopped
//!   │                           │                             │
//!   └──ReconfigureSkipped──▶ Retired ◀──ShadowRemoved─────────┘
//!                               ▲
//!                               └───ShadowRemoved (poll budget spent)
//! ```

use std::time::Duration;

use serde::Serialize;
use ssm_common::ServiceType;

/// Where a legacy unit is in its migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    Legacy,
    ShadowActive,
    Stopped,
    Retired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationEvent {
    ShadowStarted,
    ShadowExited,
    ShadowRemoved,
    /// No shadow is used for this unit (query units, or no reconfigure support).
    ReconfigureSkipped,
}

impl MigrationState {
    /// Next state, or `None` if `event` is not valid here.
    #[must_use]
    pub fn next(self, event: MigrationEvent) -> Option<Self> {
        use MigrationEvent as E;
        match (self, event) {
            (Self::Legacy, E::ShadowStarted) => Some(Self::ShadowActive),
            (Self::ShadowActive, E::ShadowExited) => Some(Self::Stopped),
            (Self::ShadowActive | Self::Stopped, E::ShadowRemoved)
            | (Self::Legacy, E::ReconfigureSkipped) => Some(Self::Retired),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Retired
    }
}

/// Bounded fixed-interval retry for waiting on a shadow unit to exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(50),
            max_attempts: 100,
        }
    }
}

/// Record of one unit's migration, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitMigration {
    pub unit: String,
    pub service_type: ServiceType,
    pub state: MigrationState,
    /// Active before the upgrade began.
    pub was_active: bool,
    /// The shadow was seen to exit within the poll budget.
    pub shadow_exited: bool,
    pub poll_attempts: u32,
}

impl UnitMigration {
    #[must_use]
    pub fn new(unit: &str, service_type: ServiceType, was_active: bool) -> Self {
        Self {
            unit: unit.to_string(),
            service_type,
            state: MigrationState::Legacy,
            was_active,
            shadow_exited: false,
            poll_attempts: 0,
        }
    }

    /// Apply `event`. Invalid events leave the state unchanged and return `false`.
    pub fn apply(&mut self, event: MigrationEvent) -> bool {
        match self.state.next(event) {
            Some(next) => {
                if event == MigrationEvent::ShadowExited {
                    self.shadow_exited = true;
                }
                self.state = next;
                true
            }
            None => false,
        }
    }
}
