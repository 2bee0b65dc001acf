// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Bitfields within one register and bitfields spanning several.

use crate::attributes::Attributes;
use crate::datatype::{Datatype, low_mask, sign_extend};
use crate::error::SchemaError;
use crate::field::Field;
use crate::register::Register;

/// A bitfield: a run of `width` bits starting at bit `offset` of exactly one
/// register.
///
/// The datatype defaults to the smallest unsigned integer holding `width`
/// bits and may be overridden (e.g., with a signed type, making extraction
/// sign-extend). The field must fit within its datatype, i.e.
/// `offset + width` may not exceed the datatype's bit size, and the datatype
/// may not be wider than the register's.
///
/// ```rust
/// use regfld::{Content, Datatype, Register};
///
/// const CTRL: Register = Register::new(0x02, 0x00, Datatype::U8);
/// const GAIN: Content = Content::new(&CTRL, 4, 4).with_datatype(Datatype::I8);
///
/// assert_eq!(GAIN.mask(), 0xf0);
/// assert_eq!(GAIN.extract_bits(0x6f), 0x06);
/// assert_eq!(GAIN.extract_bits(0xf0), 0xff);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Content<'a> {
    register: &'a Register,
    offset: u32,
    width: u32,
    datatype: Datatype,
    attributes: Attributes,
}

impl<'a> Content<'a> {
    /// Describes the bits `[offset + width - 1 : offset]` of `register`, with
    /// the smallest unsigned datatype holding `width` bits.
    pub const fn try_new(
        register: &'a Register,
        offset: u32,
        width: u32,
    ) -> Result<Self, SchemaError> {
        let Some(datatype) = Datatype::smallest_unsigned(width) else {
            return Err(if width == 0 {
                SchemaError::ZeroWidth
            } else {
                SchemaError::WidthTooLarge { width }
            });
        };
        Self::try_new_as(register, offset, width, datatype)
    }

    /// Like [`Content::try_new`], but panics on an ill-formed description;
    /// in a const item this is a compile error.
    #[must_use]
    pub const fn new(register: &'a Register, offset: u32, width: u32) -> Self {
        match Self::try_new(register, offset, width) {
            Ok(content) => content,
            Err(err) => panic!("{}", err.message()),
        }
    }

    /// The whole register as a single field, read as the register's datatype.
    #[must_use]
    pub const fn whole(register: &'a Register) -> Self {
        Self {
            register,
            offset: 0,
            width: register.width(),
            datatype: register.datatype(),
            attributes: Attributes::NONE,
        }
    }

    /// Reinterprets the field as `datatype`.
    pub const fn try_with_datatype(self, datatype: Datatype) -> Result<Self, SchemaError> {
        match Self::try_new_as(self.register, self.offset, self.width, datatype) {
            Ok(content) => Ok(content.with_attributes(self.attributes)),
            Err(err) => Err(err),
        }
    }

    /// Like [`Content::try_with_datatype`], but panics if the field does not
    /// fit `datatype`.
    #[must_use]
    pub const fn with_datatype(self, datatype: Datatype) -> Self {
        match self.try_with_datatype(datatype) {
            Ok(content) => content,
            Err(err) => panic!("{}", err.message()),
        }
    }

    /// Adds access restrictions to the field itself.
    #[must_use]
    pub const fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = self.attributes.union(attributes);
        self
    }

    /// Describes the bits `[offset + width - 1 : offset]` of `register`,
    /// read as `datatype`.
    pub const fn try_new_as(
        register: &'a Register,
        offset: u32,
        width: u32,
        datatype: Datatype,
    ) -> Result<Self, SchemaError> {
        if width == 0 {
            return Err(SchemaError::ZeroWidth);
        }
        if width > u64::BITS {
            return Err(SchemaError::WidthTooLarge { width });
        }
        if datatype.bytes() > register.datatype().bytes() {
            return Err(SchemaError::DatatypeExceedsRegister {
                address: register.address(),
                datatype,
                register: register.datatype(),
            });
        }
        if offset > datatype.bits() || width > datatype.bits() - offset {
            return Err(SchemaError::FieldExceedsDatatype {
                offset,
                width,
                datatype,
            });
        }
        Ok(Self {
            register,
            offset,
            width,
            datatype,
            attributes: Attributes::NONE,
        })
    }

    /// Like [`Content::try_new_as`], but panics on an ill-formed
    /// description.
    #[must_use]
    pub const fn new_as(
        register: &'a Register,
        offset: u32,
        width: u32,
        datatype: Datatype,
    ) -> Self {
        match Self::try_new_as(register, offset, width, datatype) {
            Ok(content) => content,
            Err(err) => panic!("{}", err.message()),
        }
    }

    #[must_use]
    pub const fn register(&self) -> &'a Register {
        self.register
    }

    #[must_use]
    pub const fn address(&self) -> u64 {
        self.register.address()
    }

    #[must_use]
    pub const fn offset(&self) -> u32 {
        self.offset
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn mask(&self) -> u64 {
        low_mask(self.width) << self.offset
    }

    #[must_use]
    pub const fn datatype(&self) -> Datatype {
        self.datatype
    }

    /// The restrictions declared on the field itself.
    #[must_use]
    pub const fn declared_attributes(&self) -> Attributes {
        self.attributes
    }

    /// The effective restrictions: the field's own unioned with its
    /// register's.
    #[must_use]
    pub const fn attributes(&self) -> Attributes {
        self.attributes.union(self.register.attributes())
    }

    /// The field's bits of `raw`, shifted down to bit 0, without sign
    /// extension.
    #[must_use]
    pub const fn extract_unsigned(&self, raw: u64) -> u64 {
        (raw & self.mask()) >> self.offset
    }

    /// The field's bits of `raw`, shifted down to bit 0 and sign-extended to
    /// the full datatype if the datatype is signed.
    #[must_use]
    pub const fn extract_bits(&self, raw: u64) -> u64 {
        sign_extend(self.extract_unsigned(raw), self.width, self.datatype)
    }

    /// `raw` with the field's bits replaced by the low `width` bits of
    /// `value`; all other bits are preserved.
    #[must_use]
    pub const fn insert_bits(&self, raw: u64, value: u64) -> u64 {
        (raw & !self.mask()) | ((value << self.offset) & self.mask())
    }
}

impl Field for Content<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn offset(&self) -> u32 {
        self.offset
    }

    fn datatype(&self) -> Datatype {
        self.datatype
    }

    fn attributes(&self) -> Attributes {
        Self::attributes(self)
    }
}

/// A single logical value assembled from bitfields of several distinct
/// registers.
///
/// Members are concatenated in declaration order: the first member supplies
/// the least-significant bits, and each subsequent member sits above all the
/// members before it, regardless of its physical offset within its own
/// register.
///
/// ```rust
/// use regfld::{Content, Datatype, MultiRegisterContent, Register};
///
/// const LO: Register = Register::new(1, 0, Datatype::U8);
/// const HI: Register = Register::new(2, 0, Datatype::U8);
/// const MEMBERS: [Content; 2] = [Content::whole(&LO), Content::new(&HI, 4, 2)];
/// const COUNT: MultiRegisterContent = MultiRegisterContent::new(&MEMBERS);
///
/// assert_eq!(COUNT.width(), 10);
/// assert_eq!(COUNT.datatype(), Datatype::U16);
/// assert_eq!(COUNT.shift_of(1), Some(8));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MultiRegisterContent<'a> {
    members: &'a [Content<'a>],
    width: u32,
    datatype: Datatype,
    attributes: Attributes,
}

impl<'a> MultiRegisterContent<'a> {
    /// Concatenates `members`, with the smallest unsigned datatype holding
    /// the sum of their widths.
    pub const fn try_new(members: &'a [Content<'a>]) -> Result<Self, SchemaError> {
        if members.is_empty() {
            return Err(SchemaError::EmptyMultiRegister);
        }
        let storage = members[0].register().datatype();
        let mut width = 0u32;
        let mut i = 0;
        while i < members.len() {
            let member = &members[i];
            let register = member.register();
            if register.datatype() as u8 != storage as u8 {
                return Err(SchemaError::MixedDatatypes {
                    address: register.address(),
                    expected: storage,
                    found: register.datatype(),
                });
            }
            let mut j = 0;
            while j < i {
                if members[j].address() == register.address() {
                    return Err(SchemaError::DuplicateMemberRegister {
                        address: register.address(),
                    });
                }
                j += 1;
            }
            width += member.width();
            if width > u64::BITS {
                return Err(SchemaError::WidthTooLarge { width });
            }
            i += 1;
        }
        let Some(datatype) = Datatype::smallest_unsigned(width) else {
            return Err(SchemaError::WidthTooLarge { width });
        };
        Ok(Self {
            members,
            width,
            datatype,
            attributes: Attributes::NONE,
        })
    }

    /// Like [`MultiRegisterContent::try_new`], but panics on an ill-formed
    /// description; in a const item this is a compile error.
    #[must_use]
    pub const fn new(members: &'a [Content<'a>]) -> Self {
        match Self::try_new(members) {
            Ok(content) => content,
            Err(err) => panic!("{}", err.message()),
        }
    }

    /// Reinterprets the logical value as `datatype`.
    pub const fn try_with_datatype(mut self, datatype: Datatype) -> Result<Self, SchemaError> {
        if self.width > datatype.bits() {
            return Err(SchemaError::FieldExceedsDatatype {
                offset: 0,
                width: self.width,
                datatype,
            });
        }
        self.datatype = datatype;
        Ok(self)
    }

    /// Like [`MultiRegisterContent::try_with_datatype`], but panics if the
    /// value does not fit `datatype`.
    #[must_use]
    pub const fn with_datatype(self, datatype: Datatype) -> Self {
        match self.try_with_datatype(datatype) {
            Ok(content) => content,
            Err(err) => panic!("{}", err.message()),
        }
    }

    /// Adds access restrictions to the logical value itself.
    #[must_use]
    pub const fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = self.attributes.union(attributes);
        self
    }

    #[must_use]
    pub const fn members(&self) -> &'a [Content<'a>] {
        self.members
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn mask(&self) -> u64 {
        low_mask(self.width)
    }

    #[must_use]
    pub const fn datatype(&self) -> Datatype {
        self.datatype
    }

    /// The restrictions declared on the logical value itself.
    #[must_use]
    pub const fn declared_attributes(&self) -> Attributes {
        self.attributes
    }

    /// The effective restrictions: the value's own unioned with those of
    /// every member.
    #[must_use]
    pub const fn attributes(&self) -> Attributes {
        let mut attributes = self.attributes;
        let mut i = 0;
        while i < self.members.len() {
            attributes = attributes.union(self.members[i].attributes());
            i += 1;
        }
        attributes
    }

    /// Bit position of member `index` within the logical value: the sum of
    /// the widths of all members before it.
    #[must_use]
    pub const fn shift_of(&self, index: usize) -> Option<u32> {
        if index >= self.members.len() {
            return None;
        }
        let mut shift = 0;
        let mut i = 0;
        while i < index {
            shift += self.members[i].width();
            i += 1;
        }
        Some(shift)
    }

    /// Members paired with their bit position within the logical value.
    pub fn parts(&self) -> impl Iterator<Item = (u32, &'a Content<'a>)> + use<'a> {
        self.members.iter().scan(0u32, |shift, member| {
            let part = (*shift, member);
            *shift += member.width();
            Some(part)
        })
    }
}

impl Field for MultiRegisterContent<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn datatype(&self) -> Datatype {
        self.datatype
    }

    fn attributes(&self) -> Attributes {
        Self::attributes(self)
    }
}

/// Either kind of field: a bitfield within one register or a multi-register
/// bitfield. This is what register tables are built from and what the codec
/// accesses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnyContent<'a> {
    Content(Content<'a>),
    Multi(MultiRegisterContent<'a>),
}

impl<'a> AnyContent<'a> {
    #[must_use]
    pub const fn width(&self) -> u32 {
        match self {
            Self::Content(content) => content.width(),
            Self::Multi(multi) => multi.width(),
        }
    }

    #[must_use]
    pub const fn offset(&self) -> u32 {
        match self {
            Self::Content(content) => content.offset(),
            Self::Multi(_) => 0,
        }
    }

    #[must_use]
    pub const fn mask(&self) -> u64 {
        match self {
            Self::Content(content) => content.mask(),
            Self::Multi(multi) => multi.mask(),
        }
    }

    #[must_use]
    pub const fn datatype(&self) -> Datatype {
        match self {
            Self::Content(content) => content.datatype(),
            Self::Multi(multi) => multi.datatype(),
        }
    }

    #[must_use]
    pub const fn attributes(&self) -> Attributes {
        match self {
            Self::Content(content) => content.attributes(),
            Self::Multi(multi) => multi.attributes(),
        }
    }

    /// Every register the field draws bits from, in member order.
    pub fn registers(&self) -> impl Iterator<Item = &'a Register> + use<'a> {
        let (single, members): (Option<&'a Register>, &'a [Content<'a>]) = match *self {
            Self::Content(content) => (Some(content.register()), &[]),
            Self::Multi(multi) => (None, multi.members()),
        };
        single
            .into_iter()
            .chain(members.iter().map(Content::register))
    }
}

impl<'a> From<Content<'a>> for AnyContent<'a> {
    fn from(content: Content<'a>) -> Self {
        Self::Content(content)
    }
}

impl<'a> From<&Content<'a>> for AnyContent<'a> {
    fn from(content: &Content<'a>) -> Self {
        Self::Content(*content)
    }
}

impl<'a> From<MultiRegisterContent<'a>> for AnyContent<'a> {
    fn from(multi: MultiRegisterContent<'a>) -> Self {
        Self::Multi(multi)
    }
}

impl<'a> From<&MultiRegisterContent<'a>> for AnyContent<'a> {
    fn from(multi: &MultiRegisterContent<'a>) -> Self {
        Self::Multi(*multi)
    }
}

impl<'a> From<&AnyContent<'a>> for AnyContent<'a> {
    fn from(field: &AnyContent<'a>) -> Self {
        *field
    }
}

impl Field for AnyContent<'_> {
    fn width(&self) -> u32 {
        Self::width(self)
    }

    fn offset(&self) -> u32 {
        Self::offset(self)
    }

    fn mask(&self) -> u64 {
        Self::mask(self)
    }

    fn datatype(&self) -> Datatype {
        Self::datatype(self)
    }

    fn attributes(&self) -> Attributes {
        Self::attributes(self)
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use alloc::vec::Vec;

    use super::*;

    const REG1: Register = Register::new(1, 0, Datatype::U8);
    const REG2: Register = Register::new(2, 0, Datatype::U8);
    const REG32: Register = Register::new(3, 0, Datatype::U32);

    #[test]
    fn single_bit_content() {
        let bit = Content::new(&REG1, 3, 1);
        assert_eq!(bit.width(), 1);
        assert_eq!(bit.offset(), 3);
        assert_eq!(bit.mask(), 1 << 3);
        assert_eq!(bit.datatype(), Datatype::U8);
        assert_eq!(bit.address(), 1);
    }

    #[test]
    fn whole_register_content() {
        let whole = Content::whole(&REG32);
        assert_eq!(whole.width(), 32);
        assert_eq!(whole.mask(), 0xffff_ffff);
        assert_eq!(whole.datatype(), Datatype::U32);
    }

    #[test]
    fn content_must_fit_datatype() {
        assert_eq!(Content::try_new(&REG1, 0, 0), Err(SchemaError::ZeroWidth));
        assert_eq!(
            Content::try_new(&REG1, 6, 4),
            Err(SchemaError::FieldExceedsDatatype {
                offset: 6,
                width: 4,
                datatype: Datatype::U8,
            })
        );
        assert!(Content::try_new(&REG1, 4, 4).is_ok());
        // A narrow field high in a wide register needs a wide datatype.
        assert!(Content::try_new(&REG32, 28, 4).is_err());
        let high = Content::new_as(&REG32, 28, 4, Datatype::U32);
        assert_eq!(high.mask(), 0xf000_0000);
        assert_eq!(high.extract_bits(0x8000_0000), 0x8);
    }

    #[test]
    fn datatype_must_fit_register() {
        assert_eq!(
            Content::new(&REG1, 0, 4).try_with_datatype(Datatype::U16),
            Err(SchemaError::DatatypeExceedsRegister {
                address: 1,
                datatype: Datatype::U16,
                register: Datatype::U8,
            })
        );
    }

    #[test]
    fn signed_extraction() {
        let nibble = Content::new(&REG2, 0, 4).with_datatype(Datatype::I8);
        assert_eq!(nibble.extract_bits(0b1111), 0xff);
        assert_eq!(nibble.extract_bits(0b0111), 0b0111);
        assert_eq!(nibble.extract_bits(0x6f), 0xff);
        let high = Content::new(&REG2, 4, 4).with_datatype(Datatype::I8);
        assert_eq!(high.extract_bits(0x6f), 6);
        let full = Content::whole(&REG1).with_datatype(Datatype::I8);
        assert_eq!(full.extract_bits(0xaa), 0xaa);
    }

    #[test]
    fn insertion_preserves_other_bits() {
        let field = Content::new(&REG2, 4, 2);
        assert_eq!(field.insert_bits(0xff, 0), 0xcf);
        assert_eq!(field.insert_bits(0x00, 0b10), 0x20);
        // Bits beyond the width are dropped.
        assert_eq!(field.insert_bits(0x00, 0xff), 0x30);
    }

    #[test]
    fn attributes_union_with_register() {
        let ro = Register::new(4, 0, Datatype::U8).with_attributes(Attributes::READONLY);
        let field = Content::new(&ro, 0, 1).with_attributes(Attributes::RESERVED);
        assert!(field.attributes().is_readonly());
        assert!(field.attributes().is_reserved());
        assert_eq!(field.declared_attributes(), Attributes::RESERVED);
    }

    #[test]
    fn multi_register_widths_and_shifts() {
        let members = [Content::whole(&REG1), Content::new(&REG2, 4, 2)];
        let multi = MultiRegisterContent::new(&members);
        assert_eq!(multi.width(), 10);
        assert_eq!(multi.mask(), 0x3ff);
        assert_eq!(multi.datatype(), Datatype::U16);
        assert_eq!(multi.shift_of(0), Some(0));
        assert_eq!(multi.shift_of(1), Some(8));
        assert_eq!(multi.shift_of(2), None);
        let shifts: Vec<u32> = multi.parts().map(|(shift, _)| shift).collect();
        assert_eq!(shifts, [0, 8]);
    }

    #[test]
    fn multi_register_rejects_duplicates_and_empties() {
        let members = [Content::new(&REG1, 0, 4), Content::new(&REG1, 4, 4)];
        assert_eq!(
            MultiRegisterContent::try_new(&members),
            Err(SchemaError::DuplicateMemberRegister { address: 1 })
        );
        assert_eq!(
            MultiRegisterContent::try_new(&[]),
            Err(SchemaError::EmptyMultiRegister)
        );
        let mixed = [Content::whole(&REG1), Content::whole(&REG32)];
        assert!(matches!(
            MultiRegisterContent::try_new(&mixed),
            Err(SchemaError::MixedDatatypes { address: 3, .. })
        ));
    }

    #[test]
    fn multi_register_datatype_override() {
        let members = [Content::whole(&REG1), Content::new(&REG2, 4, 2)];
        let multi = MultiRegisterContent::new(&members);
        assert!(multi.try_with_datatype(Datatype::I16).is_ok());
        assert_eq!(
            multi.try_with_datatype(Datatype::I8),
            Err(SchemaError::FieldExceedsDatatype {
                offset: 0,
                width: 10,
                datatype: Datatype::I8,
            })
        );
    }

    #[test]
    fn multi_register_attributes_propagate() {
        let ro = Register::new(5, 0, Datatype::U8).with_attributes(Attributes::READONLY);
        let members = [Content::whole(&ro), Content::whole(&REG2)];
        let multi = MultiRegisterContent::new(&members);
        assert!(multi.attributes().is_readonly());
        assert!(Field::is_readonly(&multi));

        let members = [Content::new(&REG2, 0, 1).with_attributes(Attributes::WRITEONLY)];
        assert!(MultiRegisterContent::new(&members).attributes().is_writeonly());

        let members = [Content::whole(&REG2)];
        let multi = MultiRegisterContent::new(&members).with_attributes(Attributes::READONLY);
        assert!(multi.attributes().is_readonly());
    }

    #[test]
    fn any_content_registers() {
        let members = [Content::whole(&REG2), Content::whole(&REG1)];
        let multi = AnyContent::from(MultiRegisterContent::new(&members));
        let addresses: Vec<u64> = multi.registers().map(Register::address).collect();
        assert_eq!(addresses, [2, 1]);

        let single = AnyContent::from(Content::new(&REG1, 0, 3));
        assert_eq!(single.registers().count(), 1);
        assert_eq!(single.mask(), 0b111);
    }

    #[test]
    #[should_panic(expected = "field does not fit into its datatype")]
    fn new_panics_on_overflowing_field() {
        let _ = Content::new(&REG1, 6, 4);
    }

    #[test]
    #[should_panic(expected = "multi-register field members must be drawn from distinct registers")]
    fn multi_new_panics_on_shared_register() {
        let members = [Content::new(&REG2, 0, 4), Content::new(&REG2, 4, 4)];
        let _ = MultiRegisterContent::new(&members);
    }
}
