use regfld::register_map;

register_map!({
    mod regs<u8>;
    {
        static CTRL1: Register<0x20, u8> = 0x100;
        static CTRL2: Register<0x20, u8> = 0x00;
        let mode: Bits<CTRL2, 3, 0, u16>;
    }
});

fn main() {}
