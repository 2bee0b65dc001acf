use regfld::register_map;

register_map!({
    mod regs<u8>;
    {
        static CTRL: Register<0x20, u8> = 0x00;
        static DATA: Register<0x21, u16> = 0x00;
    }
});

fn main() {}
