// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

use core::fmt;

use crate::datatype::Datatype;

/// An ill-formed register, field or register set description.
///
/// Schema errors are definition-time failures: the const constructors panic
/// with [`SchemaError::message`] (a compile error when evaluated in a const
/// item), while the `try_*` constructors return them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchemaError {
    ZeroWidth,
    WidthTooLarge {
        width: u32,
    },
    SignedRegister {
        address: u64,
    },
    ResetValueOutOfRange {
        address: u64,
        reset_value: u64,
        datatype: Datatype,
    },
    FieldExceedsDatatype {
        offset: u32,
        width: u32,
        datatype: Datatype,
    },
    DatatypeExceedsRegister {
        address: u64,
        datatype: Datatype,
        register: Datatype,
    },
    EmptyMultiRegister,
    DuplicateMemberRegister {
        address: u64,
    },
    MixedDatatypes {
        address: u64,
        expected: Datatype,
        found: Datatype,
    },
    ConflictingRegister {
        address: u64,
    },
    UnsortedRegisters {
        address: u64,
    },
    RegisterNotInTable {
        address: u64,
    },
    AddressOutOfRange {
        address: u64,
        datatype: Datatype,
    },
    ValueOutOfRange {
        width: u32,
        signed: bool,
    },
}

impl SchemaError {
    /// A short description naming the violated invariant.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::ZeroWidth => "field width must be non-zero",
            Self::WidthTooLarge { .. } => "field width exceeds 64 bits",
            Self::SignedRegister { .. } => "register datatype must be unsigned",
            Self::ResetValueOutOfRange { .. } => "reset value exceeds datatype range",
            Self::FieldExceedsDatatype { .. } => "field does not fit into its datatype",
            Self::DatatypeExceedsRegister { .. } => "datatype does not fit into the register",
            Self::EmptyMultiRegister => "multi-register field has no members",
            Self::DuplicateMemberRegister { .. } => {
                "multi-register field members must be drawn from distinct registers"
            }
            Self::MixedDatatypes { .. } => "registers must not have different datatypes",
            Self::ConflictingRegister { .. } => {
                "register is defined more than once with different properties"
            }
            Self::UnsortedRegisters { .. } => {
                "registers must be sorted by strictly ascending address"
            }
            Self::RegisterNotInTable { .. } => "register is not part of the register table",
            Self::AddressOutOfRange { .. } => "address does not fit into the address type",
            Self::ValueOutOfRange { .. } => "value does not fit into its field",
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = self.message();
        match self {
            Self::ZeroWidth | Self::EmptyMultiRegister => f.write_str(msg),
            Self::WidthTooLarge { width } => write!(f, "{msg} (width {width})"),
            Self::SignedRegister { address }
            | Self::DuplicateMemberRegister { address }
            | Self::ConflictingRegister { address }
            | Self::UnsortedRegisters { address }
            | Self::RegisterNotInTable { address } => write!(f, "{msg} (address {address:#x})"),
            Self::ResetValueOutOfRange {
                address,
                reset_value,
                datatype,
            } => write!(
                f,
                "{msg} (address {address:#x}: {reset_value:#x} does not fit {datatype})"
            ),
            Self::FieldExceedsDatatype {
                offset,
                width,
                datatype,
            } => write!(
                f,
                "{msg} (offset {offset} + width {width} exceeds {} bits of {datatype})",
                datatype.bits()
            ),
            Self::DatatypeExceedsRegister {
                address,
                datatype,
                register,
            } => write!(
                f,
                "{msg} ({datatype} is wider than {register} register at {address:#x})"
            ),
            Self::MixedDatatypes {
                address,
                expected,
                found,
            } => write!(
                f,
                "{msg} (register at {address:#x} is {found}, expected {expected})"
            ),
            Self::AddressOutOfRange { address, datatype } => {
                write!(f, "{msg} ({address:#x} does not fit {datatype})")
            }
            Self::ValueOutOfRange { width, signed } => {
                let kind = if *signed { "signed" } else { "unsigned" };
                write!(f, "{msg} ({kind} field of width {width})")
            }
        }
    }
}

impl core::error::Error for SchemaError {}

/// A field access that violates the field's declared access direction or
/// the shape of the raw register buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessError {
    /// The field (or its register) is write-only and cannot be read.
    WriteOnly,
    /// The field (or its register) is read-only and cannot be written.
    ReadOnly,
    /// The requested value type does not match the field's datatype.
    DatatypeMismatch {
        field: Datatype,
        requested: Datatype,
    },
    /// The raw buffer's element type does not match the register datatype.
    WordMismatch {
        register: Datatype,
        word: Datatype,
    },
    /// The raw buffer does not hold exactly one word per table register.
    BufferLength {
        expected: usize,
        actual: usize,
    },
    /// A register of the field is not part of the register table.
    RegisterNotInTable {
        address: u64,
    },
    /// A custom representation is not the size of the field's datatype.
    ReprSize {
        datatype: Datatype,
        size: usize,
    },
    /// The field's bit pattern is not valid for its custom representation.
    InvalidBits(u64),
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteOnly => f.write_str("field is write-only and cannot be read"),
            Self::ReadOnly => f.write_str("field is read-only and cannot be written"),
            Self::DatatypeMismatch { field, requested } => {
                write!(f, "field of datatype {field} accessed as {requested}")
            }
            Self::WordMismatch { register, word } => {
                write!(f, "{register} registers accessed through a buffer of {word}")
            }
            Self::BufferLength { expected, actual } => write!(
                f,
                "register buffer holds {actual} words, table has {expected} registers"
            ),
            Self::RegisterNotInTable { address } => {
                write!(f, "register at {address:#x} is not part of the register table")
            }
            Self::ReprSize { datatype, size } => write!(
                f,
                "representation of {size} bytes does not match datatype {datatype}"
            ),
            Self::InvalidBits(bits) => {
                write!(f, "bit pattern {bits:#x} is invalid for the representation")
            }
        }
    }
}

impl core::error::Error for AccessError {}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::string::ToString;

    use super::*;

    #[test]
    fn display_names_the_invariant() {
        let err = SchemaError::FieldExceedsDatatype {
            offset: 6,
            width: 4,
            datatype: Datatype::U8,
        };
        assert_eq!(
            err.to_string(),
            "field does not fit into its datatype (offset 6 + width 4 exceeds 8 bits of u8)"
        );
        let err = SchemaError::ResetValueOutOfRange {
            address: 0x10,
            reset_value: 0x100,
            datatype: Datatype::U8,
        };
        assert!(err.to_string().starts_with("reset value exceeds datatype range"));
    }

    #[test]
    fn access_errors_display() {
        assert_eq!(
            AccessError::WriteOnly.to_string(),
            "field is write-only and cannot be read"
        );
        assert_eq!(
            AccessError::ReadOnly.to_string(),
            "field is read-only and cannot be written"
        );
    }
}
