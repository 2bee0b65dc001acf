// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Fixed-width integer datatypes of registers and field values.

use core::fmt;

/// One of the fixed-width integer types a register is stored as or a field
/// value is interpreted as.
///
/// Registers are always stored as one of the unsigned kinds. Fields default
/// to the smallest unsigned kind holding their width, but may be declared
/// with a signed kind, in which case extraction sign-extends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Datatype {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
}

impl Datatype {
    /// Size of the datatype in bytes.
    #[must_use]
    pub const fn bytes(self) -> u32 {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 => 4,
            Self::U64 | Self::I64 => 8,
        }
    }

    /// Size of the datatype in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.bytes() * 8
    }

    #[must_use]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// All-ones pattern covering every bit of the datatype.
    #[must_use]
    pub const fn value_mask(self) -> u64 {
        low_mask(self.bits())
    }

    /// The unsigned datatype of the same size.
    #[must_use]
    pub const fn to_unsigned(self) -> Self {
        match self {
            Self::U8 | Self::I8 => Self::U8,
            Self::U16 | Self::I16 => Self::U16,
            Self::U32 | Self::I32 => Self::U32,
            Self::U64 | Self::I64 => Self::U64,
        }
    }

    /// The smallest unsigned datatype holding `width` bits, if any.
    #[must_use]
    pub const fn smallest_unsigned(width: u32) -> Option<Self> {
        match width {
            1..=8 => Some(Self::U8),
            9..=16 => Some(Self::U16),
            17..=32 => Some(Self::U32),
            33..=64 => Some(Self::U64),
            _ => None,
        }
    }

    /// The smallest signed datatype holding `width` bits, if any.
    #[must_use]
    pub const fn smallest_signed(width: u32) -> Option<Self> {
        match width {
            1..=8 => Some(Self::I8),
            9..=16 => Some(Self::I16),
            17..=32 => Some(Self::I32),
            33..=64 => Some(Self::I64),
            _ => None,
        }
    }

    /// The Rust spelling of the datatype (e.g., `"u16"`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A run of `width` ones starting at bit 0.
pub(crate) const fn low_mask(width: u32) -> u64 {
    if width >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Sign-extends a `width`-bit pattern up to the full size of `datatype`.
///
/// Unsigned datatypes and fields already spanning the whole datatype are
/// returned unchanged.
pub(crate) const fn sign_extend(value: u64, width: u32, datatype: Datatype) -> u64 {
    if !datatype.is_signed() || width == 0 || width >= datatype.bits() {
        return value;
    }
    if (value >> (width - 1)) & 1 == 0 {
        return value;
    }
    value | (!low_mask(width) & datatype.value_mask())
}

/// Implemented by the integer types a field value may be read as or written
/// from.
pub trait Primitive: Copy + fmt::Debug + private::Sealed {
    /// The datatype this Rust type corresponds to.
    const DATATYPE: Datatype;

    /// Reinterprets the low bits of `bits` as this type.
    #[doc(hidden)]
    fn from_bits(bits: u64) -> Self;

    /// The bit pattern of the value, zero-extended to 64 bits.
    #[doc(hidden)]
    fn to_bits(self) -> u64;
}

/// Implemented by the unsigned integral types that registers are stored as,
/// i.e., the legal element types of a raw register buffer.
pub trait Unsigned: Primitive {}

macro_rules! impl_primitive {
    ($($ty:ty => $unsigned:ty, $datatype:ident;)*) => {
        $(
            impl Primitive for $ty {
                const DATATYPE: Datatype = Datatype::$datatype;

                #[inline]
                #[allow(clippy::cast_possible_truncation)]
                fn from_bits(bits: u64) -> Self {
                    <$ty>::from_ne_bytes((bits as $unsigned).to_ne_bytes())
                }

                #[inline]
                fn to_bits(self) -> u64 {
                    u64::from(<$unsigned>::from_ne_bytes(self.to_ne_bytes()))
                }
            }
        )*
    };
}

impl_primitive! {
    u8 => u8, U8;
    u16 => u16, U16;
    u32 => u32, U32;
    u64 => u64, U64;
    i8 => u8, I8;
    i16 => u16, I16;
    i32 => u32, I32;
    i64 => u64, I64;
}

impl Unsigned for u8 {}
impl Unsigned for u16 {}
impl Unsigned for u32 {}
impl Unsigned for u64 {}

// Ensures that no type outside of regfld can implement these traits.
mod private {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
    impl Sealed for i8 {}
    impl Sealed for i16 {}
    impl Sealed for i32 {}
    impl Sealed for i64 {}
}
