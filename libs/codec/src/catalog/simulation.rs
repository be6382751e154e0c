//! Simulation clock control

use num_enum::{IntoPrimitive, TryFromPrimitive};
use rust_decimal::Decimal;
use types::{ScenarioId, Ticks, ValidationError};

use crate::addressing::{AddressChain, ScenarioKey};
use crate::error::ProtocolResult;
use crate::header::TransmissionHeader;
use crate::kinds::TransmissionKind;
use crate::reader::TransmissionReader;
use crate::registry::TypeRegistry;
use crate::transmission::{Transmission, TransmissionType, TransmissionTypeId};
use crate::version::{history, VersionBranch, VersionLadder};
use crate::writer::TransmissionWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(i32)]
pub enum SimulationAction {
    Play = 0,
    Pause = 1,
    Stop = 2,
    StepForward = 3,
    Reset = 4,
}

crate::impl_wire_enum!(SimulationAction);

impl SimulationAction {
    /// Pause and stop only freeze the clock; every other action moves scenario state
    pub fn advances_state(self) -> bool {
        !matches!(self, SimulationAction::Pause | SimulationAction::Stop)
    }
}

/// Drive a scenario's simulation clock
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationControlT {
    header: TransmissionHeader,
    pub scenario: ScenarioKey,
    pub action: SimulationAction,
    /// Clock position the action applies at
    pub clock: Ticks,
    /// Simulated seconds per wall-clock second
    pub speed: Decimal,
}

impl SimulationControlT {
    const BRANCHES: &'static [VersionBranch<Self>] = &[VersionBranch {
        since: history::INITIAL,
        decode: Self::decode_initial,
    }];
    const LADDER: VersionLadder<Self> = VersionLadder::new(Self::NAME, Self::BRANCHES);

    pub fn new(header: TransmissionHeader, scenario: ScenarioKey, action: SimulationAction, clock: Ticks) -> Self {
        Self {
            header,
            scenario,
            action,
            clock,
            speed: Decimal::ONE,
        }
    }

    pub fn with_speed(mut self, speed: Decimal) -> Self {
        self.speed = speed;
        self
    }

    fn decode_initial(r: &mut TransmissionReader<'_>, t: &mut Self) -> ProtocolResult<()> {
        t.action = r.read_enum()?;
        t.clock = r.read_ticks()?;
        t.speed = r.read_decimal()?;
        Ok(())
    }
}

impl Transmission for SimulationControlT {
    crate::transmission_identity!();

    fn encode_body(&self, writer: &mut TransmissionWriter) {
        self.scenario.write_chain(writer);
        writer.write_enum(self.action);
        writer.write_ticks(self.clock);
        writer.write_decimal(self.speed);
    }

    fn mutates_scenario(&self) -> bool {
        self.action.advances_state()
    }

    fn scenario_id(&self) -> Option<ScenarioId> {
        Some(self.scenario.scenario_id())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.scenario.validate()?;
        if self.speed < Decimal::ZERO {
            return Err(ValidationError::NegativeValue { field: "speed" });
        }
        Ok(())
    }
}

impl TransmissionType for SimulationControlT {
    const TYPE_ID: TransmissionTypeId = TransmissionKind::SimulationControl as TransmissionTypeId;
    const NAME: &'static str = "SimulationControlT";
    const SCENARIO_SCOPED: bool = true;

    fn decode_body(
        header: TransmissionHeader,
        reader: &mut TransmissionReader<'_>,
        _registry: &TypeRegistry,
    ) -> ProtocolResult<Self> {
        let scenario = ScenarioKey::read_chain(reader)?;
        let mut control = Self::new(header, scenario, SimulationAction::Pause, Ticks::EPOCH);
        Self::LADDER.decode(reader, &mut control)?;
        Ok(control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use types::UserId;

    fn control(action: SimulationAction) -> SimulationControlT {
        SimulationControlT::new(
            TransmissionHeader::new(UserId::new(4)),
            ScenarioKey::new(ScenarioId::new(2)),
            action,
            Ticks::new(1_000),
        )
    }

    #[test]
    fn test_pause_does_not_mutate() {
        assert!(!control(SimulationAction::Pause).mutates_scenario());
        assert!(!control(SimulationAction::Stop).mutates_scenario());
        assert!(control(SimulationAction::StepForward).mutates_scenario());
    }

    #[test]
    fn test_negative_speed_rejected() {
        let control = control(SimulationAction::Play).with_speed(dec!(-2));
        assert_eq!(
            control.validate(),
            Err(ValidationError::NegativeValue { field: "speed" })
        );
        assert!(control.clone().with_speed(Decimal::ZERO).validate().is_ok());
    }
}
