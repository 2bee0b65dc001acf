// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

use regfld::codec::RegisterViewMut;
use regfld::register_map;

// A slice of the register map of a made-up 6-axis IMU.
register_map!({
    pub mod imu<u8>;
    {
        #[readonly]
        static WHO_AM_I: Register<0x0f, u8> = 0x6a;
        static CTRL1_XL: Register<0x10, u8> = 0x00;
        static CTRL2_G: Register<0x11, u8> = 0x00;
        #[readonly]
        static OUTX_L_A: Register<0x28, u8> = 0x00;
        #[readonly]
        static OUTX_H_A: Register<0x29, u8> = 0x00;
        #[writeonly]
        static RESET: Register<0x2f, u8> = 0x00;

        let id: Bits<WHO_AM_I, 7, 0>;
        let odr_xl: Bits<CTRL1_XL, 7, 4>;
        let fs_xl: Bits<CTRL1_XL, 3, 2>;
        let odr_g: Bits<CTRL2_G, 7, 4>;
        let accel_x: Concat<OUTX_L_A, OUTX_H_A, i16>;
        let soft_reset: Bits<RESET, 7, 0>;

        const ODR_104HZ: Value<odr_xl> = 0b0100;
        const RESET_ALL: Value<soft_reset> = 0xb6;
    }
});

fn main() {
    let table = &imu::REGISTER_TABLE;
    for group in table.group_contiguous() {
        let addresses: Vec<_> = group.addresses().map(|a| format!("{a:#04x}")).collect();
        println!("burst: {}", addresses.join(", "));
    }

    let mut raw = table.reset_buffer::<u8>().expect("table of u8 registers");
    {
        let mut regs = RegisterViewMut::new(table, &mut raw).expect("buffer sized to table");
        regs.apply(&imu::ODR_104HZ).expect("CTRL1_XL is writable");
        regs.set(imu::FS_XL, 0b10u8).expect("CTRL1_XL is writable");
        regs.set(imu::ODR_G, 0b0100u8).expect("CTRL2_G is writable");
        regs.apply(&imu::RESET_ALL).expect("RESET is writable");

        // Pretend the device reported a sample.
        if let Err(err) = regs.set(imu::ACCEL_X, -1000i16) {
            println!("cannot set accel_x: {err}");
        }

        println!("id: {:#x}", regs.get::<u8>(imu::ID).expect("WHO_AM_I is readable"));
        println!("fs_xl: {:#b}", regs.get::<u8>(imu::FS_XL).expect("CTRL1_XL is readable"));
        match regs.get::<u8>(imu::SOFT_RESET) {
            Ok(value) => println!("reset: {value:#x}"),
            Err(err) => println!("cannot read reset: {err}"),
        }
    }
    println!("raw: {raw:02x?}");
}
