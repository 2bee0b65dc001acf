// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Reading and writing field values against raw register buffers.
//!
//! A raw buffer holds one word per register of a [`RegisterTable`], in table
//! order, with the table's storage datatype as its element type. Reads fail
//! for write-only fields and writes fail for read-only fields; every other
//! invariant has already been established when the schema was defined.

use zerocopy::{Immutable, IntoBytes, TryFromBytes};

use crate::content::{AnyContent, Content};
use crate::datatype::{Primitive, Unsigned, low_mask, sign_extend};
use crate::error::AccessError;
use crate::table::RegisterTable;
use crate::value::Value;

fn check_shape<W: Unsigned>(table: &RegisterTable<'_>, len: usize) -> Result<(), AccessError> {
    if len != table.len() {
        return Err(AccessError::BufferLength {
            expected: table.len(),
            actual: len,
        });
    }
    if let Some(register) = table.datatype()
        && register != W::DATATYPE
    {
        return Err(AccessError::WordMismatch {
            register,
            word: W::DATATYPE,
        });
    }
    Ok(())
}

fn slot(table: &RegisterTable<'_>, content: &Content<'_>) -> Result<usize, AccessError> {
    table
        .index_of(content.register())
        .ok_or(AccessError::RegisterNotInTable {
            address: content.address(),
        })
}

// Assumes a buffer of the table's shape.
fn read_bits<W: Unsigned>(
    table: &RegisterTable<'_>,
    field: &AnyContent<'_>,
    raw: &[W],
) -> Result<u64, AccessError> {
    if field.attributes().is_writeonly() {
        return Err(AccessError::WriteOnly);
    }
    match field {
        AnyContent::Content(content) => {
            let word = raw[slot(table, content)?].to_bits();
            Ok(content.extract_bits(word))
        }
        AnyContent::Multi(multi) => {
            let mut bits = 0;
            for (shift, member) in multi.parts() {
                let word = raw[slot(table, member)?].to_bits();
                bits |= member.extract_unsigned(word) << shift;
            }
            Ok(sign_extend(bits, multi.width(), multi.datatype()))
        }
    }
}

// Assumes a buffer of the table's shape. Nothing is written unless every
// register of the field is in the table.
fn write_bits<W: Unsigned>(
    table: &RegisterTable<'_>,
    field: &AnyContent<'_>,
    value: u64,
    raw: &mut [W],
) -> Result<(), AccessError> {
    if field.attributes().is_readonly() {
        return Err(AccessError::ReadOnly);
    }
    match field {
        AnyContent::Content(content) => {
            let index = slot(table, content)?;
            raw[index] = W::from_bits(content.insert_bits(raw[index].to_bits(), value));
        }
        AnyContent::Multi(multi) => {
            for member in multi.members() {
                slot(table, member)?;
            }
            for (shift, member) in multi.parts() {
                let index = slot(table, member)?;
                let part = (value >> shift) & low_mask(member.width());
                raw[index] = W::from_bits(member.insert_bits(raw[index].to_bits(), part));
            }
        }
    }
    Ok(())
}

fn check_datatype<T: Primitive>(field: &AnyContent<'_>) -> Result<(), AccessError> {
    if field.datatype() == T::DATATYPE {
        Ok(())
    } else {
        Err(AccessError::DatatypeMismatch {
            field: field.datatype(),
            requested: T::DATATYPE,
        })
    }
}

/// Extracts the bit pattern of `field` from `raw`, sign-extended to the
/// field's datatype if it is signed.
pub fn extract_bits<'f, W: Unsigned>(
    table: &RegisterTable<'_>,
    field: impl Into<AnyContent<'f>>,
    raw: &[W],
) -> Result<u64, AccessError> {
    check_shape::<W>(table, raw.len())?;
    read_bits(table, &field.into(), raw)
}

/// Extracts the value of `field` from `raw` as `T`, which must be the
/// field's datatype.
///
/// ```rust
/// use regfld::{Content, Datatype, MultiRegisterContent, Register, RegisterTable, codec};
///
/// const LO: Register = Register::new(1, 0, Datatype::U8);
/// const HI: Register = Register::new(2, 0, Datatype::U8);
/// const MEMBERS: [Content; 2] = [Content::whole(&LO), Content::new(&HI, 4, 2)];
/// const COUNT: MultiRegisterContent = MultiRegisterContent::new(&MEMBERS);
///
/// let table = RegisterTable::build([COUNT])?;
/// let raw = [0xaau8, 0x6f];
/// assert_eq!(codec::extract::<u16, _>(&table, COUNT, &raw), Ok(0x2aa));
/// # Ok::<(), regfld::SchemaError>(())
/// ```
pub fn extract<'f, T: Primitive, W: Unsigned>(
    table: &RegisterTable<'_>,
    field: impl Into<AnyContent<'f>>,
    raw: &[W],
) -> Result<T, AccessError> {
    let field = field.into();
    check_datatype::<T>(&field)?;
    extract_bits(table, field, raw).map(T::from_bits)
}

/// Writes the low `width` bits of `value` into `field` of `raw`, leaving all
/// other bits untouched.
pub fn set_bits<'f, W: Unsigned>(
    table: &RegisterTable<'_>,
    field: impl Into<AnyContent<'f>>,
    value: u64,
    raw: &mut [W],
) -> Result<(), AccessError> {
    check_shape::<W>(table, raw.len())?;
    write_bits(table, &field.into(), value, raw)
}

/// Writes `value`, which must be of the field's datatype, into `field` of
/// `raw`.
pub fn set<'f, T: Primitive, W: Unsigned>(
    table: &RegisterTable<'_>,
    field: impl Into<AnyContent<'f>>,
    value: T,
    raw: &mut [W],
) -> Result<(), AccessError> {
    let field = field.into();
    check_datatype::<T>(&field)?;
    set_bits(table, field, value.to_bits(), raw)
}

impl Content<'_> {
    /// Extracts the field from the raw word of its register directly, without
    /// a register table.
    pub fn extract_word<W: Unsigned>(&self, word: W) -> Result<u64, AccessError> {
        self.check_word::<W>()?;
        if self.attributes().is_writeonly() {
            return Err(AccessError::WriteOnly);
        }
        Ok(self.extract_bits(word.to_bits()))
    }

    /// Writes the low `width` bits of `value` into the raw word of the
    /// field's register directly, without a register table.
    pub fn set_word<W: Unsigned>(&self, word: &mut W, value: u64) -> Result<(), AccessError> {
        self.check_word::<W>()?;
        if self.attributes().is_readonly() {
            return Err(AccessError::ReadOnly);
        }
        *word = W::from_bits(self.insert_bits(word.to_bits(), value));
        Ok(())
    }

    fn check_word<W: Unsigned>(&self) -> Result<(), AccessError> {
        let register = self.register().datatype();
        if register == W::DATATYPE {
            Ok(())
        } else {
            Err(AccessError::WordMismatch {
                register,
                word: W::DATATYPE,
            })
        }
    }
}

// Byte range of the low `size` bytes within a native-endian u64.
fn low_bytes(size: usize) -> core::ops::Range<usize> {
    let start = if cfg!(target_endian = "big") {
        size_of::<u64>() - size
    } else {
        0
    };
    start..start + size
}

fn check_repr_size(field: &AnyContent<'_>, size: usize) -> Result<(), AccessError> {
    let datatype = field.datatype();
    if u32::try_from(size) == Ok(datatype.bytes()) {
        Ok(())
    } else {
        Err(AccessError::ReprSize { datatype, size })
    }
}

fn decode_repr<R: TryFromBytes>(field: &AnyContent<'_>, bits: u64) -> Result<R, AccessError> {
    check_repr_size(field, size_of::<R>())?;
    let bytes = bits.to_ne_bytes();
    R::try_read_from_bytes(&bytes[low_bytes(size_of::<R>())])
        .map_err(|_| AccessError::InvalidBits(bits))
}

fn encode_repr<R: IntoBytes + Immutable>(
    field: &AnyContent<'_>,
    value: &R,
) -> Result<u64, AccessError> {
    let bytes = value.as_bytes();
    check_repr_size(field, bytes.len())?;
    let mut word = [0u8; size_of::<u64>()];
    word[low_bytes(bytes.len())].copy_from_slice(bytes);
    Ok(u64::from_ne_bytes(word))
}

/// A read-only view of a raw buffer through a register table.
///
/// The buffer's shape (one word per table register, of the table's storage
/// datatype) is checked once, on construction.
#[derive(Clone, Copy, Debug)]
pub struct RegisterView<'t, 'b, W: Unsigned> {
    table: &'t RegisterTable<'t>,
    raw: &'b [W],
}

impl<'t, 'b, W: Unsigned> RegisterView<'t, 'b, W> {
    pub fn new(table: &'t RegisterTable<'t>, raw: &'b [W]) -> Result<Self, AccessError> {
        check_shape::<W>(table, raw.len())?;
        Ok(Self { table, raw })
    }

    #[must_use]
    pub fn table(&self) -> &'t RegisterTable<'t> {
        self.table
    }

    #[must_use]
    pub fn raw(&self) -> &'b [W] {
        self.raw
    }

    pub fn get_bits<'f>(&self, field: impl Into<AnyContent<'f>>) -> Result<u64, AccessError> {
        read_bits(self.table, &field.into(), self.raw)
    }

    pub fn get<'f, T: Primitive>(&self, field: impl Into<AnyContent<'f>>) -> Result<T, AccessError> {
        let field = field.into();
        check_datatype::<T>(&field)?;
        read_bits(self.table, &field, self.raw).map(T::from_bits)
    }

    /// Reads the field as a custom representation of the field's datatype
    /// size (see [`field_repr`](crate::field_repr)).
    pub fn get_repr<'f, R: TryFromBytes>(
        &self,
        field: impl Into<AnyContent<'f>>,
    ) -> Result<R, AccessError> {
        let field = field.into();
        let bits = read_bits(self.table, &field, self.raw)?;
        decode_repr(&field, bits)
    }
}

/// A read-write view of a raw buffer through a register table.
#[derive(Debug)]
pub struct RegisterViewMut<'t, 'b, W: Unsigned> {
    table: &'t RegisterTable<'t>,
    raw: &'b mut [W],
}

impl<'t, 'b, W: Unsigned> RegisterViewMut<'t, 'b, W> {
    pub fn new(table: &'t RegisterTable<'t>, raw: &'b mut [W]) -> Result<Self, AccessError> {
        check_shape::<W>(table, raw.len())?;
        Ok(Self { table, raw })
    }

    #[must_use]
    pub fn as_view(&self) -> RegisterView<'t, '_, W> {
        RegisterView {
            table: self.table,
            raw: &*self.raw,
        }
    }

    #[must_use]
    pub fn raw(&self) -> &[W] {
        &*self.raw
    }

    pub fn get_bits<'f>(&self, field: impl Into<AnyContent<'f>>) -> Result<u64, AccessError> {
        self.as_view().get_bits(field)
    }

    pub fn get<'f, T: Primitive>(&self, field: impl Into<AnyContent<'f>>) -> Result<T, AccessError> {
        self.as_view().get(field)
    }

    pub fn get_repr<'f, R: TryFromBytes>(
        &self,
        field: impl Into<AnyContent<'f>>,
    ) -> Result<R, AccessError> {
        self.as_view().get_repr(field)
    }

    pub fn set_bits<'f>(
        &mut self,
        field: impl Into<AnyContent<'f>>,
        value: u64,
    ) -> Result<(), AccessError> {
        write_bits(self.table, &field.into(), value, self.raw)
    }

    pub fn set<'f, T: Primitive>(
        &mut self,
        field: impl Into<AnyContent<'f>>,
        value: T,
    ) -> Result<(), AccessError> {
        let field = field.into();
        check_datatype::<T>(&field)?;
        write_bits(self.table, &field, value.to_bits(), self.raw)
    }

    /// Writes a custom representation of the field's datatype size.
    #[allow(clippy::needless_pass_by_value)]
    pub fn set_repr<'f, R: IntoBytes + Immutable>(
        &mut self,
        field: impl Into<AnyContent<'f>>,
        value: R,
    ) -> Result<(), AccessError> {
        let field = field.into();
        let bits = encode_repr(&field, &value)?;
        write_bits(self.table, &field, bits, self.raw)
    }

    /// Writes an annotated literal into its field.
    pub fn apply(&mut self, value: &Value<'_>) -> Result<(), AccessError> {
        write_bits(self.table, &value.field(), value.bits(), self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attributes;
    use crate::content::MultiRegisterContent;
    use crate::datatype::Datatype;
    use crate::register::Register;

    const REG1: Register = Register::new(1, 0, Datatype::U8);
    const REG2: Register = Register::new(2, 0, Datatype::U8);
    const CONTENT1: Content = Content::whole(&REG1);
    const CONTENT2: Content = Content::new(&REG2, 0, 4);
    const CONTENT3: Content = Content::new(&REG2, 4, 2);

    fn table() -> RegisterTable<'static> {
        RegisterTable::build([CONTENT1, CONTENT2, CONTENT3]).unwrap()
    }

    #[test]
    fn single_register_extraction() {
        let table = table();
        let raw = [0xaau8, 0x6f];
        assert_eq!(extract::<u8, _>(&table, CONTENT1, &raw), Ok(0xaa));
        assert_eq!(extract::<u8, _>(&table, CONTENT2, &raw), Ok(0xf));
        assert_eq!(extract::<u8, _>(&table, CONTENT3, &raw), Ok(2));
    }

    #[test]
    fn signed_extraction() {
        let table = table();
        let raw = [0xaau8, 0x6f];
        let low = CONTENT2.with_datatype(Datatype::I8);
        let high = Content::new(&REG2, 4, 4).with_datatype(Datatype::I8);
        let full = CONTENT1.with_datatype(Datatype::I8);
        assert_eq!(extract::<i8, _>(&table, low, &raw), Ok(-1));
        assert_eq!(extract::<i8, _>(&table, high, &raw), Ok(6));
        assert_eq!(extract::<i8, _>(&table, full, &raw), Ok(-86));
    }

    #[test]
    fn multi_register_packing() {
        let table = table();
        let raw = [0xaau8, 0x6f];
        let c1c3 = [CONTENT1, CONTENT3];
        let c2c1 = [CONTENT2, CONTENT1];
        let forward = MultiRegisterContent::new(&c1c3);
        let reversed = MultiRegisterContent::new(&c2c1);
        assert_eq!(extract::<u16, _>(&table, forward, &raw), Ok(0x2aa));
        assert_eq!(extract::<u16, _>(&table, reversed, &raw), Ok(0xaaf));
        let signed = forward.with_datatype(Datatype::I16);
        assert_eq!(extract::<i16, _>(&table, signed, &raw), Ok(-342));
    }

    #[test]
    fn setting_preserves_neighbours() {
        let table = table();
        let mut raw = [0u8; 2];
        set(&table, CONTENT1, 0xffu8, &mut raw).unwrap();
        set(&table, CONTENT3, 2u8, &mut raw).unwrap();
        assert_eq!(raw, [0xff, 0x20]);
        set(&table, CONTENT2, 0xau8, &mut raw).unwrap();
        assert_eq!(raw, [0xff, 0x2a]);
        assert_eq!(extract::<u8, _>(&table, CONTENT3, &raw), Ok(2));
    }

    #[test]
    fn multi_register_setting() {
        let table = table();
        let members = [CONTENT1, CONTENT3];
        let multi = MultiRegisterContent::new(&members);
        let mut raw = [0u8; 2];
        set(&table, multi, 0x2aau16, &mut raw).unwrap();
        assert_eq!(raw, [0xaa, 0x20]);

        let signed = multi.with_datatype(Datatype::I16);
        let mut raw = [0u8, 0xcf];
        set(&table, signed, -1i16, &mut raw).unwrap();
        assert_eq!(raw, [0xff, 0xff]);
        assert_eq!(extract::<i16, _>(&table, signed, &raw), Ok(-1));
    }

    #[test]
    fn access_direction() {
        const RO: Register =
            Register::new(1, 0, Datatype::U8).with_attributes(Attributes::READONLY);
        const WO: Content = Content::new(&REG2, 0, 4).with_attributes(Attributes::WRITEONLY);
        let ro = Content::whole(&RO);
        let table = RegisterTable::build([ro, WO]).unwrap();
        let mut raw = [0x12u8, 0x34];

        assert_eq!(set_bits(&table, ro, 1, &mut raw), Err(AccessError::ReadOnly));
        assert_eq!(extract_bits(&table, ro, &raw), Ok(0x12));
        assert_eq!(extract_bits(&table, WO, &raw), Err(AccessError::WriteOnly));
        assert_eq!(set_bits(&table, WO, 0xf, &mut raw), Ok(()));
        assert_eq!(raw, [0x12, 0x3f]);

        let members = [WO, ro];
        let multi = MultiRegisterContent::new(&members);
        assert_eq!(extract_bits(&table, multi, &raw), Err(AccessError::WriteOnly));
        assert_eq!(set_bits(&table, multi, 0, &mut raw), Err(AccessError::ReadOnly));
        assert_eq!(raw, [0x12, 0x3f]);
    }

    #[test]
    fn reserved_does_not_block_the_codec() {
        let reserved = CONTENT3.with_attributes(Attributes::RESERVED);
        let table = table();
        let mut raw = [0u8; 2];
        assert_eq!(set_bits(&table, reserved, 3, &mut raw), Ok(()));
        assert_eq!(extract_bits(&table, reserved, &raw), Ok(3));
    }

    #[test]
    fn buffer_shape_is_checked() {
        let table = table();
        assert_eq!(
            extract_bits(&table, CONTENT1, &[0u8]),
            Err(AccessError::BufferLength {
                expected: 2,
                actual: 1,
            })
        );
        assert_eq!(
            extract_bits(&table, CONTENT1, &[0u16, 0]),
            Err(AccessError::WordMismatch {
                register: Datatype::U8,
                word: Datatype::U16,
            })
        );
        assert_eq!(
            extract::<u16, _>(&table, CONTENT1, &[0u8, 0]),
            Err(AccessError::DatatypeMismatch {
                field: Datatype::U8,
                requested: Datatype::U16,
            })
        );
    }

    #[test]
    fn foreign_registers_are_reported_before_writing() {
        const REG3: Register = Register::new(3, 0, Datatype::U8);
        let table = table();
        let members = [CONTENT1, Content::whole(&REG3)];
        let multi = MultiRegisterContent::new(&members);
        let mut raw = [0u8; 2];
        assert_eq!(
            set_bits(&table, multi, 0xffff, &mut raw),
            Err(AccessError::RegisterNotInTable { address: 3 })
        );
        assert_eq!(raw, [0, 0]);
    }

    #[test]
    fn single_words() {
        let mut word = 0x6fu8;
        assert_eq!(CONTENT3.extract_word(word), Ok(2));
        CONTENT3.set_word(&mut word, 0).unwrap();
        assert_eq!(word, 0x4f);
        assert_eq!(
            CONTENT3.extract_word(0u32),
            Err(AccessError::WordMismatch {
                register: Datatype::U8,
                word: Datatype::U32,
            })
        );
    }

    #[test]
    fn views() {
        let table = table();
        let mut raw = table.reset_buffer::<u8>().unwrap();
        let mut view = RegisterViewMut::new(&table, &mut raw).unwrap();
        view.set(CONTENT2, 9u8).unwrap();
        view.set_bits(CONTENT1, 0x1ff).unwrap();
        assert_eq!(view.get::<u8>(CONTENT1), Ok(0xff));
        assert_eq!(view.get_bits(CONTENT2), Ok(9));
        assert_eq!(raw, [0xff, 0x09]);

        let view = RegisterView::new(&table, &raw).unwrap();
        assert_eq!(view.get::<u8>(CONTENT2), Ok(9));
        assert!(RegisterView::new(&table, &raw[..1]).is_err());
    }

    #[test]
    fn representations() {
        let table = table();
        let mut raw = [0u8; 2];
        let mut view = RegisterViewMut::new(&table, &mut raw).unwrap();
        view.set_repr(CONTENT2, 0x5u8).unwrap();
        assert_eq!(view.get_repr::<u8>(CONTENT2), Ok(5));
        assert_eq!(
            view.get_repr::<u16>(CONTENT2),
            Err(AccessError::ReprSize {
                datatype: Datatype::U8,
                size: 2,
            })
        );
        assert_eq!(view.get_repr::<bool>(CONTENT2), Err(AccessError::InvalidBits(5)));
    }

    #[test]
    fn literals() {
        let table = table();
        let mut raw = [0u8; 2];
        let mut view = RegisterViewMut::new(&table, &mut raw).unwrap();
        view.apply(&Value::new(CONTENT3.into(), 3)).unwrap();
        assert_eq!(raw, [0, 0x30]);
    }
}
