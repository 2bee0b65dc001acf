use regfld::register_map;

register_map!({
    mod regs<u8>;
    {
        static STATUS: Register<0x01, u8> = 0x100;
    }
});

fn main() {}
