// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

use regfld::codec::RegisterViewMut;
use regfld::{field_repr, register_map};

// Output data rates of a made-up magnetometer.
#[field_repr(u8)]
pub enum MagMode {
    PowerDown = 0b0_0000,
    Single = 0b0_0001,
    Continuous10Hz = 0b0_0010, // 10 Hz
    Continuous100Hz = 0b0_1000, // 100 Hz
    SelfTest = 0b1_0000,
    // All others are reserved.
}

register_map!({
    pub mod mag<u8>;
    {
        static CNTL2: Register<0x31, u8> = 0x00;
        let mode: Bits<CNTL2, 4, 0>;
    }
});

fn main() {
    let mut raw = mag::REGISTER_TABLE
        .reset_buffer::<u8>()
        .expect("table of u8 registers");
    let mut regs =
        RegisterViewMut::new(&mag::REGISTER_TABLE, &mut raw).expect("buffer sized to table");

    regs.set_repr(mag::MODE, MagMode::Continuous100Hz).expect("CNTL2 is writable");
    println!("{:#?}", regs.get_repr::<MagMode>(mag::MODE));

    regs.set_bits(mag::MODE, 0b0_0011).expect("CNTL2 is writable");
    println!("{:?}", regs.get_repr::<MagMode>(mag::MODE));
}
