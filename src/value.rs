// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

use crate::codec;
use crate::content::AnyContent;
use crate::datatype::{Unsigned, low_mask};
use crate::error::{AccessError, SchemaError};
use crate::table::RegisterTable;

/// A literal annotated with the field it belongs to, e.g. a named mode or
/// command code.
///
/// The literal is checked on construction to be representable in the
/// field's width: as an unsigned number, or in two's complement for
/// [`Value::try_new_signed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Value<'a> {
    field: AnyContent<'a>,
    bits: u64,
}

impl<'a> Value<'a> {
    pub const fn try_new(field: AnyContent<'a>, value: u64) -> Result<Self, SchemaError> {
        let width = field.width();
        if value & !low_mask(width) != 0 {
            return Err(SchemaError::ValueOutOfRange {
                width,
                signed: false,
            });
        }
        Ok(Self { field, bits: value })
    }

    #[must_use]
    pub const fn new(field: AnyContent<'a>, value: u64) -> Self {
        match Self::try_new(field, value) {
            Ok(value) => value,
            Err(err) => panic!("{}", err.message()),
        }
    }

    /// Annotates a signed literal, which must lie within
    /// `[-2^(width-1), 2^(width-1))`. The stored bit pattern is the low
    /// `width` bits of its two's complement.
    #[allow(clippy::cast_sign_loss)]
    pub const fn try_new_signed(field: AnyContent<'a>, value: i64) -> Result<Self, SchemaError> {
        let width = field.width();
        if width < i64::BITS {
            let bound = 1i64 << (width - 1);
            if value < -bound || value >= bound {
                return Err(SchemaError::ValueOutOfRange {
                    width,
                    signed: true,
                });
            }
        }
        Ok(Self {
            field,
            bits: (value as u64) & low_mask(width),
        })
    }

    #[must_use]
    pub const fn new_signed(field: AnyContent<'a>, value: i64) -> Self {
        match Self::try_new_signed(field, value) {
            Ok(value) => value,
            Err(err) => panic!("{}", err.message()),
        }
    }

    #[must_use]
    pub const fn field(&self) -> AnyContent<'a> {
        self.field
    }

    /// The literal's bit pattern, `width` bits wide.
    #[must_use]
    pub const fn bits(&self) -> u64 {
        self.bits
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.field.width()
    }

    /// Writes the literal into its field of `raw`.
    pub fn apply<W: Unsigned>(
        &self,
        table: &RegisterTable<'_>,
        raw: &mut [W],
    ) -> Result<(), AccessError> {
        codec::set_bits(table, &self.field, self.bits, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Content;
    use crate::datatype::Datatype;
    use crate::register::Register;

    const REG: Register = Register::new(1, 0, Datatype::U8);

    #[test]
    fn unsigned_range() {
        let field = AnyContent::from(Content::new(&REG, 4, 3));
        assert_eq!(Value::try_new(field, 7).map(|v| v.bits()), Ok(7));
        assert_eq!(
            Value::try_new(field, 8),
            Err(SchemaError::ValueOutOfRange {
                width: 3,
                signed: false,
            })
        );
    }

    #[test]
    fn signed_range() {
        let field = AnyContent::from(Content::new(&REG, 0, 4).with_datatype(Datatype::I8));
        assert_eq!(Value::new_signed(field, -1).bits(), 0b1111);
        assert_eq!(Value::new_signed(field, -8).bits(), 0b1000);
        assert_eq!(Value::new_signed(field, 7).bits(), 0b0111);
        assert!(Value::try_new_signed(field, 8).is_err());
        assert!(Value::try_new_signed(field, -9).is_err());
    }

    #[test]
    fn full_width_signed() {
        const WIDE: Register = Register::new(2, 0, Datatype::U64);
        let field = AnyContent::from(Content::whole(&WIDE).with_datatype(Datatype::I64));
        assert_eq!(Value::new_signed(field, i64::MIN).bits(), 1 << 63);
        assert_eq!(Value::new_signed(field, -1).bits(), u64::MAX);
    }

    #[test]
    fn apply_writes_the_literal() {
        let field = AnyContent::from(Content::new(&REG, 4, 3));
        let table = RegisterTable::build([field]).unwrap();
        let mut raw = [0x0fu8];
        Value::new(field, 5).apply(&table, &mut raw).unwrap();
        assert_eq!(raw, [0x5f]);
    }
}
