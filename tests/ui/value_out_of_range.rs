use regfld::register_map;

register_map!({
    mod regs<u8>;
    {
        static CTRL: Register<0x20, u8> = 0x00;
        let mode: Bits<CTRL, 6, 4>;
        const MODE_FAST: Value<mode> = 0x10;
    }
});

fn main() {}
