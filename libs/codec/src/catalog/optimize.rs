//! Optimize rule maintenance

use rust_decimal::Decimal;
use types::{ScenarioId, ValidationError};

use crate::addressing::{AddressChain, ScenarioKey};
use crate::error::ProtocolResult;
use crate::header::TransmissionHeader;
use crate::kinds::TransmissionKind;
use crate::reader::TransmissionReader;
use crate::registry::TypeRegistry;
use crate::transmission::{Transmission, TransmissionType, TransmissionTypeId};
use crate::version::{history, VersionBranch, VersionLadder};
use crate::wire::{WireDecode, WireEncode};
use crate::writer::TransmissionWriter;

/// Weighted scoring factor of an optimize rule
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeFactor {
    pub name: String,
    pub weight: Decimal,
    pub enabled: bool,
}

impl OptimizeFactor {
    pub fn new(name: impl Into<String>, weight: Decimal) -> Self {
        Self {
            name: name.into(),
            weight,
            enabled: true,
        }
    }
}

impl WireEncode for OptimizeFactor {
    fn encode(&self, writer: &mut TransmissionWriter) {
        writer.write_string(&self.name);
        writer.write_decimal(self.weight);
        writer.write_bool(self.enabled);
    }
}

impl WireDecode for OptimizeFactor {
    fn decode(reader: &mut TransmissionReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            name: reader.read_string()?,
            weight: reader.read_decimal()?,
            enabled: reader.read_bool()?,
        })
    }
}

/// Replace the factor set of a named optimize rule
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeRuleUpdateT {
    header: TransmissionHeader,
    pub scenario: ScenarioKey,
    pub rule_name: String,
    pub factors: Vec<OptimizeFactor>,
    /// Span (ticks) after the clock inside which the optimizer must not move work
    pub frozen_span: i64,
}

impl OptimizeRuleUpdateT {
    const BRANCHES: &'static [VersionBranch<Self>] = &[
        VersionBranch {
            since: history::OPTIMIZE_RULE_FROZEN_SPAN,
            decode: Self::decode_with_frozen_span,
        },
        VersionBranch {
            since: history::INITIAL,
            decode: Self::decode_initial,
        },
    ];
    const LADDER: VersionLadder<Self> = VersionLadder::new(Self::NAME, Self::BRANCHES);

    pub fn new(header: TransmissionHeader, scenario: ScenarioKey, rule_name: impl Into<String>) -> Self {
        Self {
            header,
            scenario,
            rule_name: rule_name.into(),
            factors: Vec::new(),
            frozen_span: 0,
        }
    }

    pub fn with_factor(mut self, factor: OptimizeFactor) -> Self {
        self.factors.push(factor);
        self
    }

    pub fn with_frozen_span(mut self, span: i64) -> Self {
        self.frozen_span = span;
        self
    }

    fn decode_with_frozen_span(r: &mut TransmissionReader<'_>, t: &mut Self) -> ProtocolResult<()> {
        t.rule_name = r.read_string()?;
        t.factors = r.read_seq()?;
        t.frozen_span = r.read_i64()?;
        Ok(())
    }

    fn decode_initial(r: &mut TransmissionReader<'_>, t: &mut Self) -> ProtocolResult<()> {
        t.rule_name = r.read_string()?;
        t.factors = r.read_seq()?;
        Ok(())
    }
}

impl Transmission for OptimizeRuleUpdateT {
    crate::transmission_identity!();

    fn encode_body(&self, writer: &mut TransmissionWriter) {
        self.scenario.write_chain(writer);
        writer.write_string(&self.rule_name);
        writer.write_seq(&self.factors);
        writer.write_i64(self.frozen_span);
    }

    fn scenario_id(&self) -> Option<ScenarioId> {
        Some(self.scenario.scenario_id())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.scenario.validate()?;
        if self.rule_name.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "rule_name" });
        }
        if self.frozen_span < 0 {
            return Err(ValidationError::NegativeValue { field: "frozen_span" });
        }
        for factor in &self.factors {
            if factor.name.trim().is_empty() {
                return Err(ValidationError::EmptyField { field: "factor.name" });
            }
            if factor.weight < Decimal::ZERO {
                return Err(ValidationError::NegativeValue { field: "factor.weight" });
            }
        }
        Ok(())
    }
}

impl TransmissionType for OptimizeRuleUpdateT {
    const TYPE_ID: TransmissionTypeId = TransmissionKind::OptimizeRuleUpdate as TransmissionTypeId;
    const NAME: &'static str = "OptimizeRuleUpdateT";
    const SCENARIO_SCOPED: bool = true;

    fn decode_body(
        header: TransmissionHeader,
        reader: &mut TransmissionReader<'_>,
        _registry: &TypeRegistry,
    ) -> ProtocolResult<Self> {
        let scenario = ScenarioKey::read_chain(reader)?;
        let mut update = Self::new(header, scenario, String::new());
        Self::LADDER.decode(reader, &mut update)?;
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::to_bytes;
    use crate::version::SchemaVersion;
    use rust_decimal_macros::dec;
    use types::UserId;

    fn update() -> OptimizeRuleUpdateT {
        OptimizeRuleUpdateT::new(
            TransmissionHeader::new(UserId::new(5)),
            ScenarioKey::new(ScenarioId::new(1)),
            "Due date first",
        )
        .with_factor(OptimizeFactor::new("lateness", dec!(10)))
        .with_factor(OptimizeFactor::new("setup", dec!(2.5)))
        .with_frozen_span(36_000_000_000)
    }

    #[test]
    fn test_current_round_trip() {
        let registry = TypeRegistry::with_catalog().unwrap();
        let original = update();
        let decoded = registry
            .decode_as::<OptimizeRuleUpdateT>(&to_bytes(&original).unwrap(), SchemaVersion::CURRENT)
            .unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_rule_name_over_string_limit_does_not_encode() {
        let mut oversized = update();
        oversized.rule_name = "x".repeat(config::protocol::limits::MAX_STRING_BYTES + 1);
        assert!(matches!(
            to_bytes(&oversized),
            Err(crate::ProtocolError::EncodeLimit { length, .. })
                if length == config::protocol::limits::MAX_STRING_BYTES + 1
        ));

        oversized.rule_name.pop();
        let bytes = to_bytes(&oversized).unwrap();
        let registry = TypeRegistry::with_catalog().unwrap();
        let decoded = registry
            .decode_as::<OptimizeRuleUpdateT>(&bytes, SchemaVersion::CURRENT)
            .unwrap();
        assert_eq!(decoded.rule_name.len(), config::protocol::limits::MAX_STRING_BYTES);
    }

    #[test]
    fn test_pre_frozen_span_stream() {
        let registry = TypeRegistry::with_catalog().unwrap();
        let original = update();

        // Hand-build what a writer before the cutover produced
        let mut writer = TransmissionWriter::new();
        writer.write_i32(OptimizeRuleUpdateT::TYPE_ID);
        original.header().encode(&mut writer);
        original.scenario.write_chain(&mut writer);
        writer.write_string(&original.rule_name);
        writer.write_seq(&original.factors);
        let bytes = writer.into_bytes();

        let version = SchemaVersion::new(history::OPTIMIZE_RULE_FROZEN_SPAN - 1);
        let decoded = registry.decode_as::<OptimizeRuleUpdateT>(&bytes, version).unwrap();
        assert_eq!(decoded.factors, original.factors);
        assert_eq!(decoded.frozen_span, 0);
    }

    #[test]
    fn test_validation() {
        let mut bad = update();
        bad.factors[1].weight = dec!(-1);
        assert_eq!(
            bad.validate(),
            Err(ValidationError::NegativeValue { field: "factor.weight" })
        );
        assert!(update().validate().is_ok());
    }
}
