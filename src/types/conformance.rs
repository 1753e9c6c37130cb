// Sun Oct 18 2026 - Alex

use crate::memory::Address;
use crate::metadata::{ConformanceFlags, ConformanceRecord};
use crate::types::Protocol;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// A resolved conformance of a type to a protocol.
#[derive(Debug, Clone)]
pub struct Conformance {
    protocol: Arc<Protocol>,
    record: Address,
    flags: ConformanceFlags,
    declared_in: String,
}

impl Conformance {
    pub fn new(protocol: Arc<Protocol>, record: &ConformanceRecord, declared_in: impl Into<String>) -> Self {
        Self {
            protocol,
            record: record.address,
            flags: record.flags,
            declared_in: declared_in.into(),
        }
    }

    pub fn protocol(&self) -> &Arc<Protocol> {
        &self.protocol
    }

    /// Address of the conformance record this was read from.
    pub fn record_address(&self) -> Address {
        self.record
    }

    pub fn flags(&self) -> ConformanceFlags {
        self.flags
    }

    pub fn is_retroactive(&self) -> bool {
        self.flags.contains(ConformanceFlags::IS_RETROACTIVE)
    }

    pub fn num_conditional_requirements(&self) -> u8 {
        self.flags.num_conditional_requirements()
    }

    /// Name of the image holding the conformance record.
    pub fn declared_in(&self) -> &str {
        &self.declared_in
    }
}

impl fmt::Display for Conformance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.protocol.path())
    }
}

impl Serialize for Conformance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Conformance", 4)?;
        state.serialize_field("protocol", &self.protocol.full_name())?;
        state.serialize_field("record", &self.record)?;
        state.serialize_field("retroactive", &self.is_retroactive())?;
        state.serialize_field("declared_in", &self.declared_in)?;
        state.end()
    }
}
