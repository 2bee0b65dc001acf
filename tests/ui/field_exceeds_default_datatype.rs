use regfld::register_map;

register_map!({
    mod regs<u8>;
    {
        static CTRL: Register<0x20, u16> = 0x00;
        let mode: Bits<CTRL, 15, 12>;
    }
});

fn main() {}
