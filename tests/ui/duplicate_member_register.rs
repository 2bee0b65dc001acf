use regfld::register_map;

register_map!({
    mod regs<u8>;
    {
        static CTRL: Register<0x20, u8> = 0x00;
        let low: Bits<CTRL, 3, 0>;
        let high: Bits<CTRL, 7, 4>;
        let both: Concat<low, high>;
    }
});

fn main() {}
