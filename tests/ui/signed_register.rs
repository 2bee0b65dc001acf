use regfld::register_map;

register_map!({
    mod regs<u8>;
    {
        static CTRL: Register<0x20, i8> = 0x00;
    }
});

fn main() {}
