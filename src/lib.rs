// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

#![no_std]

//! `regfld` is a no-std crate for describing memory-mapped hardware registers
//! and the bitfields within (and across) them, and for reading and writing
//! field values against a buffer of raw register words. The imagined user is
//! a driver author transcribing a device's register map out of a datasheet,
//! who would like the two classic register bugs - touching bits outside of a
//! field and accessing a field against its declared direction - to be
//! impossible, or at least loudly reported.
//!
//! A schema is made of [`Register`]s, [`Content`]s (a bitfield within one
//! register) and [`MultiRegisterContent`]s (a logical value concatenated out
//! of bitfields in several registers). Every schema element is validated
//! eagerly by a `const` constructor, so an ill-formed description in a
//! `const` item is a compile error. A [`RegisterTable`] derived from a set of
//! fields fixes where each register's word lives in a raw buffer, and the
//! [`codec`] reads and writes field values against such a buffer.
//!
//! The [`register_map!`] procedural macro offers a compact DSL for the whole
//! of this, with invariant violations reported as spanned compile errors. The
//! [`zerocopy`][zerocopy] crate is further leveraged for safe transmutation
//! between field values and custom field representations.
//!
//! ## Features
//!
//! * Const-validated registers, bitfields and multi-register bitfields, with
//!   derived masks, offsets, widths and datatypes;
//! * Signed fields, sign-extended on extraction;
//! * Access restrictions (`readonly`, `writeonly`, `reserved`) that only ever
//!   accumulate from registers to the fields drawn from them;
//! * Deterministic, deduplicated, address-sorted register tables, with
//!   contiguous-address grouping for burst transfers;
//! * Checked extraction and insertion against raw buffers, with reads of
//!   write-only fields and writes of read-only fields reported as errors;
//! * Custom field representations without any boilerplate;
//! * Optional [`defmt`](https://docs.rs/defmt) support behind the `defmt`
//!   feature.
//!
//! ## Example
//!
//! ```rust
//! use regfld::{codec::RegisterViewMut, field_repr, register_map};
//!
//! #[field_repr(u8)]
//! pub enum Mode {
//!     Sleep = 0,
//!     Idle = 3,
//!     Run = 5,
//! }
//!
//! register_map!({
//!     pub mod imu<u8>;
//!     {
//!         #[readonly]
//!         static STATUS: Register<0x01, u8> = 0x00;
//!         static CTRL: Register<0x02, u8> = 0x30;
//!         static COUNT_LO: Register<0x10, u8> = 0x00;
//!         static COUNT_HI: Register<0x11, u8> = 0x00;
//!
//!         let ready: Bit<STATUS, 0>;
//!         let mode: Bits<CTRL, 6, 4>;
//!         let gain: Bits<CTRL, 3, 0, i8>;
//!         let count: Concat<COUNT_LO, COUNT_HI>;
//!
//!         const MODE_IDLE: Value<mode> = 3;
//!     }
//! });
//!
//! assert_eq!(imu::ADDRESSES, [0x01, 0x02, 0x10, 0x11]);
//!
//! let mut raw = imu::REGISTER_TABLE.reset_buffer::<u8>()?;
//! let mut regs = RegisterViewMut::new(&imu::REGISTER_TABLE, &mut raw)?;
//! regs.set(imu::GAIN, -2i8)?;
//! regs.set(imu::COUNT, 0x1234u16)?;
//! regs.apply(&imu::MODE_IDLE)?;
//! assert_eq!(regs.get::<i8>(imu::GAIN)?, -2);
//! assert_eq!(regs.get_repr::<Mode>(imu::MODE)?, Mode::Idle);
//! assert!(regs.set(imu::READY, 1u8).is_err());
//! assert_eq!(raw, [0x00, 0x3e, 0x34, 0x12]);
//! # Ok::<(), regfld::AccessError>(())
//! ```
//!
//! [zerocopy]: https://docs.rs/zerocopy/latest/zerocopy/

extern crate alloc;

mod attributes;
pub mod codec;
mod content;
mod datatype;
mod error;
mod field;
mod register;
mod table;
mod value;

pub use attributes::Attributes;
pub use content::{AnyContent, Content, MultiRegisterContent};
pub use datatype::{Datatype, Primitive, Unsigned};
pub use error::{AccessError, SchemaError};
pub use field::Field;
pub use register::Register;
pub use table::{ContiguousGroup, RegisterTable};
pub use value::Value;

/// Specifies a register map: registers, the fields within and across them,
/// and named field values.
///
/// # Syntax
///
/// To keep the DSL intuitive and formattable, we co-opt a few familiar Rust
/// syntax elements:
///
/// <blockquote>
///     <em>RegisterMap</em>:
///     <br>
///     &nbsp;&nbsp;
///         <code>{</code>
///             <em>MapModule</em>
///             <code>{</code>
///                 <em>Entry</em>
///                 <sup>*</sup>
///             <code>}</code>
///         <code>}</code>
///     <br>
///     <br>
///     <em>MapModule</em>:
///     <br>
///     &nbsp;&nbsp;
///         <em>
///             <a href="https://doc.rust-lang.org/reference/attributes.html">OuterAttribute </a>
///         </em>
///         <sup>*</sup>
///         <em>
///             <a href="https://doc.rust-lang.org/reference/visibility-and-privacy.html">Visibility </a>
///         </em>
///         <sup>?</sup>
///         <code>mod</code>
///         <a href="https://doc.rust-lang.org/reference/identifiers.html">IDENTIFIER </a>
///         <code>&lt;</code>
///             <em>AddressType</em>
///         <code>&gt;</code>
///         <code>;</code>
///     <br>
///     <br>
///     <em>Entry</em>:
///     <br>
///     &nbsp;&nbsp;&nbsp;&nbsp;
///         <em>Register</em>
///         &nbsp;|&nbsp;
///         <em>Field</em>
///         &nbsp;|&nbsp;
///         <em>FieldValue</em>
///     <br>
///     <br>
///     <em>Register</em>:
///     <br>
///     &nbsp;&nbsp;
///         <em>AccessAttribute</em>
///         <sup>*</sup>
///         <code>static</code>
///         <a href="https://doc.rust-lang.org/reference/identifiers.html">IDENTIFIER </a>
///         <code>: Register&lt;</code>
///         <a href="https://doc.rust-lang.org/reference/tokens.html#integer-literals">INTEGER_LITERAL </a>
///         <code>,</code>
///         <em>UnsignedType</em>
///         <code>&gt; =</code>
///         <a href="https://doc.rust-lang.org/reference/tokens.html#integer-literals">INTEGER_LITERAL </a>
///         <code>;</code>
///     <br>
///     <br>
///     <em>Field</em>:
///     <br>
///     &nbsp;&nbsp;
///         <em>AccessAttribute</em>
///         <sup>*</sup>
///         <code>let</code>
///         <a href="https://doc.rust-lang.org/reference/identifiers.html">IDENTIFIER </a>
///         <code>:</code>
///         <em>FieldRange</em>
///         <code>;</code>
///     <br>
///     <br>
///     <em>FieldRange</em>:
///     <br>
///     &nbsp;&nbsp;&nbsp;&nbsp;
///         <code>Bit&lt;</code>
///         <em>REGISTER</em>
///         <code>,</code>
///         <a href="https://doc.rust-lang.org/reference/tokens.html#integer-literals">INTEGER_LITERAL </a>
///         (<code>,</code> <em>IntegerType</em>)
///         <sup>?</sup>
///         <code>&gt;</code>
///     <br>
///     &nbsp;&nbsp;|&nbsp;
///         <code>Bits&lt;</code>
///         <em>REGISTER</em>
///         <code>,</code>
///         <a href="https://doc.rust-lang.org/reference/tokens.html#integer-literals">INTEGER_LITERAL </a>
///         <code>,</code>
///         <a href="https://doc.rust-lang.org/reference/tokens.html#integer-literals">INTEGER_LITERAL </a>
///         (<code>,</code> <em>IntegerType</em>)
///         <sup>?</sup>
///         <code>&gt;</code>
///     <br>
///     &nbsp;&nbsp;|&nbsp;
///         <code>Concat&lt;</code>
///         <em>MEMBER</em>
///         (<code>,</code> <em>MEMBER</em>)
///         <sup>*</sup>
///         (<code>,</code> <em>IntegerType</em>)
///         <sup>?</sup>
///         <code>&gt;</code>
///     <br>
///     <br>
///     <em>FieldValue</em>:
///     <br>
///     &nbsp;&nbsp;
///         <code>const</code>
///         <a href="https://doc.rust-lang.org/reference/identifiers.html">IDENTIFIER </a>
///         <code>: Value&lt;</code>
///         <em>FIELD</em>
///         <code>&gt; =</code>
///         <code>-</code><sup>?</sup>
///         <a href="https://doc.rust-lang.org/reference/tokens.html#integer-literals">INTEGER_LITERAL </a>
///         <code>;</code>
///     <br>
///     <br>
///     <em>AccessAttribute</em>:
///         <code>#[readonly]</code> |
///         <code>#[writeonly]</code> |
///         <code>#[reserved]</code>
///     <br>
///     <em>AddressType</em>, <em>UnsignedType</em>:
///             <code>u8</code> |
///             <code>u16</code> |
///             <code>u32</code> |
///             <code>u64</code>
///     <br>
///     <em>IntegerType</em>:
///             <em>UnsignedType</em> |
///             <code>i8</code> |
///             <code>i16</code> |
///             <code>i32</code> |
///             <code>i64</code>
///     <br>
///     <br>
/// </blockquote>
///
/// Doc comments are permitted on every entry and are forwarded.
///
/// # Guiding example
///
/// Consider the following:
/// ```rust
/// use regfld::register_map;
///
/// register_map!({
///     /// A made-up accelerometer.
///     pub mod accel<u16>;
///     {
///         #[readonly]
///         static STATUS: Register<0x100, u8> = 0x00;
///         #[writeonly]
///         static CMD: Register<0x101, u8> = 0x00;
///         static OUT_LO: Register<0x110, u8> = 0x00;
///         static OUT_HI: Register<0x111, u8> = 0x00;
///
///         let ready: Bit<STATUS, 0>;
///         let overrun: Bit<STATUS, 1>;
///         let command: Bits<CMD, 7, 0>;
///         let out_low: Bits<OUT_LO, 7, 4>;
///         let out: Concat<out_low, OUT_HI, i16>;
///
///         const CMD_RESET: Value<command> = 0xb6;
///         const OUT_MIN: Value<out> = -2048;
///     }
/// });
/// ```
///
/// This translates to the following:
///
/// ## The module
///
/// A module `accel` (with the given attributes and visibility) holding one
/// `pub const` per entry plus a handful of derived constants. All paths in
/// the expansion are absolute, so the module needs no imports.
///
/// ## Registers
///
/// Each `static` entry yields a [`Register`] constant of the same name, e.g.
/// `accel::STATUS`. The pseudo-type `Register<$address, $datatype>` gives the
/// address and storage datatype, and the initializer gives the reset value.
/// Storage datatypes must be unsigned and shared by all registers of the map,
/// every address must fit the address type and be unique, and every reset
/// value must fit the storage datatype.
///
/// ## Fields
///
/// Each `let` entry yields a field constant, named as the upper-cased field
/// name (e.g., `accel::OUT_LOW`):
///
/// * `Bit<$REGISTER, $bit (, $datatype)?>` and `Bits<$REGISTER, $high, $low (, $datatype)?>`
///   give a [`Content`] over the inclusive bit range of the named register.
///   The datatype defaults to the smallest unsigned integer holding the
///   field's width; like any datatype it must be able to hold bit `$high` and
///   be no wider than the register.
/// * `Concat<$member, ... (, $datatype)?>` gives a [`MultiRegisterContent`].
///   Members are single-register fields or registers (standing for all of
///   their bits) from distinct registers, and the first member supplies the
///   least-significant bits. `accel::OUT` is thus the 12-bit signed value
///   `out_low | OUT_HI << 4`.
///
/// ## Access restrictions
///
/// `#[readonly]`, `#[writeonly]` and `#[reserved]` may annotate registers and
/// fields. A field's effective restrictions are its own together with those
/// of every register it draws from: `accel::READY` is read-only and
/// `accel::COMMAND` write-only.
///
/// ## Values
///
/// Each `const` entry yields a [`Value`] of its field. The literal must be
/// representable in the field's width, in two's complement if the field's
/// datatype is signed.
///
/// ## Derived constants
///
/// * `FIELDS: [AnyContent<'static>; N]` - every field, in declaration order;
/// * `REGISTERS: [Register; M]` - the registers the fields draw from, in
///   ascending address order (registers no field draws from are left out);
/// * `ADDRESSES: [$address_type; M]` - the addresses of `REGISTERS`;
/// * `static REGISTER_TABLE: RegisterTable<'static>` - the register table
///   over `REGISTERS`, and thus over `FIELDS`.
///
/// ```rust
/// # use regfld::register_map;
/// # register_map!({
/// #     pub mod accel<u16>;
/// #     {
/// #         #[readonly]
/// #         static STATUS: Register<0x100, u8> = 0x00;
/// #         #[writeonly]
/// #         static CMD: Register<0x101, u8> = 0x00;
/// #         static OUT_LO: Register<0x110, u8> = 0x00;
/// #         static OUT_HI: Register<0x111, u8> = 0x00;
/// #         let ready: Bit<STATUS, 0>;
/// #         let overrun: Bit<STATUS, 1>;
/// #         let command: Bits<CMD, 7, 0>;
/// #         let out_low: Bits<OUT_LO, 7, 4>;
/// #         let out: Concat<out_low, OUT_HI, i16>;
/// #         const CMD_RESET: Value<command> = 0xb6;
/// #         const OUT_MIN: Value<out> = -2048;
/// #     }
/// # });
/// assert_eq!(accel::ADDRESSES, [0x100, 0x101, 0x110, 0x111]);
/// assert_eq!(accel::OUT.width(), 12);
/// assert!(accel::READY.attributes().is_readonly());
/// assert_eq!(accel::OUT_MIN.bits(), 0x800);
///
/// let groups = accel::REGISTER_TABLE.group_contiguous();
/// assert_eq!(groups.len(), 2);
/// assert_eq!(groups[1].first_address(), 0x110);
/// ```
///
/// ## Errors
///
/// Every violated invariant is reported as a compile error spanning the
/// offending entry; all of them are reported, not only the first.
pub use regfld_macro::register_map;

/// Syntax sugar for defining a custom field representation, deriving the
/// traits [`RegisterView::get_repr`](codec::RegisterView::get_repr) and
/// [`RegisterViewMut::set_repr`](codec::RegisterViewMut::set_repr) require.
///
/// In particular, `#[field_repr(...)]` translates to
/// ```text
/// #[repr(...)]
/// #[derive(
///     Clone,
///     Copy,
///     Debug,
///     Eq,
///     PartialEq,
///     ::zerocopy::Immutable,
///     ::zerocopy::IntoBytes,
///     ::zerocopy::TryFromBytes,
/// )]
/// ```
///
/// The representation must be the size of the field's datatype, and not all
/// bit patterns need be valid: reading an invalid one yields
/// [`AccessError::InvalidBits`].
pub use regfld_macro::field_repr;
