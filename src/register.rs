// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

use crate::attributes::Attributes;
use crate::datatype::Datatype;
use crate::error::SchemaError;
use crate::field::Field;

/// A fixed-address, fixed-width hardware storage word.
///
/// Registers are immutable schema facts. Two registers describe the same
/// location when both their address and datatype agree; a register table
/// keeps a single entry per location.
///
/// ```rust
/// use regfld::{Attributes, Datatype, Register};
///
/// const STATUS: Register = Register::new(0x10, 0x80, Datatype::U8)
///     .with_attributes(Attributes::READONLY);
///
/// assert_eq!(STATUS.width(), 8);
/// assert_eq!(STATUS.mask(), 0xff);
/// assert!(STATUS.attributes().is_readonly());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Register {
    address: u64,
    reset_value: u64,
    datatype: Datatype,
    attributes: Attributes,
}

impl Register {
    /// Describes a register, rejecting a signed storage datatype or a reset
    /// value that does not fit the datatype.
    pub const fn try_new(
        address: u64,
        reset_value: u64,
        datatype: Datatype,
    ) -> Result<Self, SchemaError> {
        if datatype.is_signed() {
            return Err(SchemaError::SignedRegister { address });
        }
        if reset_value & !datatype.value_mask() != 0 {
            return Err(SchemaError::ResetValueOutOfRange {
                address,
                reset_value,
                datatype,
            });
        }
        Ok(Self {
            address,
            reset_value,
            datatype,
            attributes: Attributes::NONE,
        })
    }

    /// Like [`Register::try_new`], but panics on an ill-formed description;
    /// in a const item this is a compile error.
    #[must_use]
    pub const fn new(address: u64, reset_value: u64, datatype: Datatype) -> Self {
        match Self::try_new(address, reset_value, datatype) {
            Ok(register) => register,
            Err(err) => panic!("{}", err.message()),
        }
    }

    /// Adds access restrictions to the register.
    #[must_use]
    pub const fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = self.attributes.union(attributes);
        self
    }

    #[must_use]
    pub const fn address(&self) -> u64 {
        self.address
    }

    #[must_use]
    pub const fn reset_value(&self) -> u64 {
        self.reset_value
    }

    #[must_use]
    pub const fn datatype(&self) -> Datatype {
        self.datatype
    }

    #[must_use]
    pub const fn attributes(&self) -> Attributes {
        self.attributes
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.datatype.bits()
    }

    #[must_use]
    pub const fn mask(&self) -> u64 {
        self.datatype.value_mask()
    }

    /// Whether both registers describe the same location, i.e. share the
    /// address and storage datatype.
    #[must_use]
    pub const fn same_location(&self, other: &Self) -> bool {
        self.address == other.address && self.datatype as u8 == other.datatype as u8
    }
}

impl Field for Register {
    fn width(&self) -> u32 {
        Self::width(self)
    }

    fn mask(&self) -> u64 {
        Self::mask(self)
    }

    fn datatype(&self) -> Datatype {
        self.datatype
    }

    fn attributes(&self) -> Attributes {
        self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_facts() {
        let reg = Register::new(0x2a, 42, Datatype::U32);
        assert_eq!(reg.address(), 0x2a);
        assert_eq!(reg.reset_value(), 42);
        assert_eq!(reg.width(), 32);
        assert_eq!(reg.mask(), 0xffff_ffff);
        assert_eq!(Field::offset(&reg), 0);
        assert!(!Field::is_readonly(&reg));
    }

    #[test]
    fn reset_value_must_fit() {
        assert_eq!(
            Register::try_new(1, 0x100, Datatype::U8),
            Err(SchemaError::ResetValueOutOfRange {
                address: 1,
                reset_value: 0x100,
                datatype: Datatype::U8,
            })
        );
        assert!(Register::try_new(1, 0xff, Datatype::U8).is_ok());
        assert!(Register::try_new(1, u64::MAX, Datatype::U64).is_ok());
    }

    #[test]
    fn storage_must_be_unsigned() {
        assert_eq!(
            Register::try_new(3, 0, Datatype::I16),
            Err(SchemaError::SignedRegister { address: 3 })
        );
    }

    #[test]
    #[should_panic(expected = "reset value exceeds datatype range")]
    fn new_panics_on_oversized_reset_value() {
        let _ = Register::new(1, 0x1_0000, Datatype::U16);
    }

    #[test]
    fn attributes_accumulate() {
        let reg = Register::new(1, 0, Datatype::U8)
            .with_attributes(Attributes::READONLY)
            .with_attributes(Attributes::RESERVED);
        assert!(reg.attributes().is_readonly());
        assert!(reg.attributes().is_reserved());
        assert!(!reg.attributes().is_writeonly());
    }

    #[test]
    fn location_identity() {
        let a = Register::new(1, 0, Datatype::U8);
        let b = Register::new(1, 5, Datatype::U8);
        let c = Register::new(1, 0, Datatype::U16);
        assert!(a.same_location(&b));
        assert!(!a.same_location(&c));
    }
}
