use regfld::register_map;

register_map!({
    mod regs<u8>;
    {
        static LO: Register<0x20, u64> = 0x00;
        static HI: Register<0x21, u64> = 0x00;
        let wide: Concat<LO, HI>;
    }
});

fn main() {}
