use regfld::register_map;

register_map!({
    mod regs<u8>;
    {
        static CTRL: Register<0x120, u8> = 0x00;
    }
});

fn main() {}
